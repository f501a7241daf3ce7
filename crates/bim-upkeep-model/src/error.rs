// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for host document operations

use crate::ElementId;
use thiserror::Error;

/// Result type alias for host operations
pub type Result<T> = std::result::Result<T, HostError>;

/// Errors a host document can report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// Element not found
    #[error("Element {0} not found")]
    ElementNotFound(ElementId),

    /// Parameter not present on the element
    #[error("Parameter '{name}' not found on element {element}")]
    ParameterNotFound { element: ElementId, name: String },

    /// Parameter exists but cannot be written
    #[error("Parameter '{name}' on element {element} is read-only")]
    ReadOnlyParameter { element: ElementId, name: String },

    /// A mutation was attempted outside a transaction
    #[error("No open transaction")]
    NoOpenTransaction,

    /// A transaction was started while another one is open
    #[error("Transaction '{0}' is already open")]
    TransactionAlreadyOpen(String),

    /// The document cannot be modified (read-only, closed, ...)
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// The host refused to delete an element
    #[error("Failed to delete element {element}: {message}")]
    DeleteFailed { element: ElementId, message: String },

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl HostError {
    /// Create a new parameter-not-found error
    pub fn parameter_not_found(element: ElementId, name: impl Into<String>) -> Self {
        HostError::ParameterNotFound {
            element,
            name: name.into(),
        }
    }

    /// Create a new read-only parameter error
    pub fn read_only(element: ElementId, name: impl Into<String>) -> Self {
        HostError::ReadOnlyParameter {
            element,
            name: name.into(),
        }
    }

    /// Create a new delete error
    pub fn delete_failed(element: ElementId, msg: impl Into<String>) -> Self {
        HostError::DeleteFailed {
            element,
            message: msg.into(),
        }
    }

    /// Create an invalid model error
    pub fn invalid_model(msg: impl Into<String>) -> Self {
        HostError::InvalidModel(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        HostError::Other(msg.into())
    }
}
