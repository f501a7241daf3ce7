// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BIM Upkeep Engine
//!
//! Model maintenance for BIM documents: warning cleanup and unused-element
//! purging. The engine only talks to the host through the traits of
//! `bim-upkeep-model`, so any document implementing [`Document`] can be
//! maintained.
//!
//! ## Overview
//!
//! - **Outcome**: status, message log and element payload of every run
//! - **Transactions**: every mutation runs inside a committed or rolled back
//!   host transaction
//! - **Filters**: predicate filters combined with all/any chains
//! - **Warnings**: a registry routing host warnings to solvers by type,
//!   stoppable through a cancel flag
//! - **Purge**: mark-and-sweep detection and deletion of unused types, or
//!   delete-and-observe purging of anything the analysis cannot reach
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bim_upkeep_engine::{PurgeAction, PurgeCategory, PurgeRunner, SolverRegistry};
//! use bim_upkeep_model::Category;
//!
//! let report = SolverRegistry::with_default_solvers().solve_model(&mut doc);
//! println!("{}", report);
//!
//! let report = PurgeRunner::with_default_actions().purge_to_fixed_point(&mut doc);
//!
//! let patterns = PurgeAction::for_category(PurgeCategory::for_category(
//!     "Fill Pattern(s)",
//!     Category::parse("OST_FillPatterns"),
//! ));
//! let report = PurgeRunner::new(Vec::new()).purge_by_delete(&mut doc, &patterns);
//! ```
//!
//! [`Document`]: bim_upkeep_model::Document

pub mod error;
pub mod filter;
pub mod outcome;
pub mod purge;
pub mod transaction;
pub mod warnings;

// Re-export main types
pub use error::{Result, UpkeepError};
pub use outcome::{to_json, Outcome};
pub use transaction::TransactionExecutor;

pub use filter::{ElementFilter, FilterChain, FilterMode, PredicateFilter};
pub use purge::{
    Dependent, PurgeAction, PurgeCategory, PurgeConfig, PurgeEngine, PurgeRunner, UnusedSet,
};
pub use warnings::{
    DuplicateMarkSolver, OverlapStrategy, SeparationLinesOverlapSolver, SolverRegistry,
    TagOutsideOwnerSolver, WarningSolver, CANCELLED,
};

/// Progress callback: (stage, percent 0-100)
pub type ProgressCallback = Box<dyn Fn(&str, f32) + Send>;
