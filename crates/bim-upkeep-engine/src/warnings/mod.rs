// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Warning resolution
//!
//! - [`SolverRegistry`] routes host warnings to [`WarningSolver`]s
//! - [`TagOutsideOwnerSolver`], [`DuplicateMarkSolver`] and
//!   [`SeparationLinesOverlapSolver`] are the stock solvers
//! - [`grouping`] has helpers for slicing warning lists

mod duplicate_mark;
pub mod grouping;
mod registry;
mod separation_lines;
mod tag_outside_owner;

pub use duplicate_mark::{DuplicateMarkSolver, MARK_PARAMETER};
pub use registry::{SolverRegistry, WarningSolver, CANCELLED};
pub use separation_lines::{OverlapStrategy, SeparationLinesOverlapSolver};
pub use tag_outside_owner::TagOutsideOwnerSolver;
