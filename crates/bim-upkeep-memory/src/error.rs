// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixture loading errors

use bim_upkeep_model::ElementId;
use thiserror::Error;

/// Errors raised while loading or saving a document fixture
#[derive(Error, Debug)]
pub enum FixtureError {
    /// Malformed JSON
    #[error("Invalid fixture: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Two elements share an id
    #[error("Duplicate element {0} in fixture")]
    DuplicateElement(ElementId),
}
