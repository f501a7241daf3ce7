// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BIM-Upkeep Model - Host trait definitions and shared types
//!
//! This crate describes the live document a maintenance run operates on,
//! without depending on any particular host application. A host (the CAD/BIM
//! application's object model, or the in-memory backend used in tests)
//! implements the traits here and the engine works against them.
//!
//! # Architecture
//!
//! - [`ElementQuery`] - Read-only element lookup and collectors
//! - [`ElementEditor`] - Element mutation (parameters, moves, deletion)
//! - [`TransactionHost`] - Transaction primitives guarding every mutation
//! - [`WarningSource`] - Enumeration of host-detected warnings
//! - [`Document`] - The full host document, combining all of the above
//!
//! # Example
//!
//! ```ignore
//! use bim_upkeep_model::{Category, Document, ElementQuery};
//!
//! fn count_doors(doc: &dyn Document) -> usize {
//!     doc.elements_by_category(&Category::Doors).len()
//! }
//! ```

pub mod error;
pub mod traits;
pub mod types;
pub mod warning;

pub use error::*;
pub use traits::*;
pub use types::*;
pub use warning::{WarningGuid, WarningInstance};
