// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unused element purge
//!
//! [`PurgeEngine`] finds unused types, [`PurgeAction`] names one purgeable
//! category and [`PurgeRunner`] deletes through the transaction executor.

mod action;
mod engine;
mod runner;

pub use action::{default_actions, IdGetter, PurgeAction};
pub use engine::{
    get_unused_type_ids, instances_of_category, nothing, types_of_category, types_of_class,
    unused_type_ids, Collector, Dependent, PurgeCategory, PurgeEngine, UnusedSet,
};
pub use runner::{PurgeConfig, PurgeRunner};
