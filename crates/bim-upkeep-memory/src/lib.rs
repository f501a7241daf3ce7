// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIM-Upkeep Memory - In-memory host document
//!
//! This crate implements every trait in `bim-upkeep-model` over a plain
//! element table. It stands in for a live host when running maintenance
//! logic outside the host application, and is the host the engine's tests
//! run against.
//!
//! # Features
//!
//! - **Snapshot transactions** - rollback restores the exact prior state
//! - **Host-like collectors** - built-in types only reachable by class
//! - **Cascading deletes** - deleting a type removes its instances
//! - **Failure injection** - make deletes, edits, begin or commit fail
//! - **JSON fixtures** - load and save documents with `serde_json`
//!
//! # Example
//!
//! ```ignore
//! use bim_upkeep_memory::{MemoryDocument, StoredElement};
//! use bim_upkeep_model::Category;
//!
//! let doc = MemoryDocument::builder()
//!     .with_title("Project")
//!     .element(StoredElement::system_type(10, "Generic 200", Category::Walls, "Basic Wall"))
//!     .element(StoredElement::instance(1, "Wall", Category::Walls, 10))
//!     .build();
//! ```

mod document;
mod element;
mod error;

pub use document::{
    DocumentFixture, FailureInjection, MemoryDocument, MemoryDocumentBuilder, TransactionEvent,
};
pub use element::StoredElement;
pub use error::FixtureError;
