// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for maintenance runs

use bim_upkeep_model::{HostError, WarningGuid};
use thiserror::Error;

/// Engine result type
pub type Result<T> = std::result::Result<T, UpkeepError>;

/// Maintenance engine errors
///
/// Most of these never leave the engine: they are folded into an
/// [`Outcome`](crate::Outcome) message at the element level.
#[derive(Error, Debug)]
pub enum UpkeepError {
    /// Host document error
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// A mutation inside a transaction failed
    #[error("Mutation failed: {0}")]
    Mutation(String),

    /// No solver is registered for a warning type
    #[error("No solver registered for warning type: {0}")]
    UnregisteredWarningType(WarningGuid),

    /// A solver for this warning type is already registered
    #[error("A solver for warning type {0} is already registered")]
    DuplicateSolver(WarningGuid),

    /// Purge action and host purge removed different elements
    #[error(
        "Purge verification failed for '{action}': engine removed {engine} element(s), host purge removed {native}"
    )]
    VerificationMismatch {
        action: String,
        engine: usize,
        native: usize,
    },

    /// A transaction could not be started; the document is unusable
    #[error("Failed to start transaction '{name}': {source}")]
    TransactionBegin {
        name: String,
        #[source]
        source: HostError,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UpkeepError {
    /// Create a mutation error
    pub fn mutation(msg: impl Into<String>) -> Self {
        UpkeepError::Mutation(msg.into())
    }

    /// Create a transaction begin error
    pub fn transaction_begin(name: impl Into<String>, source: HostError) -> Self {
        UpkeepError::TransactionBegin {
            name: name.into(),
            source,
        }
    }
}
