// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transaction Executor - the only place documents are mutated
//!
//! Wraps an action in a named host transaction. Either every change made
//! by the action is committed, or the document is rolled back to its state
//! before the call.

use crate::{Outcome, Result, UpkeepError};
use bim_upkeep_model::{Document, TransactionHost};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Runs actions inside host transactions
pub struct TransactionExecutor;

impl TransactionExecutor {
    /// Run `action` in a transaction named `description`
    ///
    /// A failed begin is reported as a failed outcome; nothing is committed
    /// or rolled back in that case. An action error or panic rolls back.
    pub fn run<F>(doc: &mut dyn Document, description: &str, action: F) -> Outcome
    where
        F: FnOnce(&mut dyn Document) -> Result<Outcome>,
    {
        match Self::try_run(doc, description, action) {
            Ok(outcome) => outcome,
            Err(UpkeepError::TransactionBegin { source, .. }) => {
                Outcome::failure(format!("Failed to start transaction: {}", source))
            }
            Err(e) => Outcome::failure(format!("Failed with exception: {}", e)),
        }
    }

    /// Like [`run`](Self::run), but a failed begin is returned as
    /// [`UpkeepError::TransactionBegin`] so batch drivers can stop
    pub fn try_run<F>(doc: &mut dyn Document, description: &str, action: F) -> Result<Outcome>
    where
        F: FnOnce(&mut dyn Document) -> Result<Outcome>,
    {
        doc.begin_transaction(description)
            .map_err(|e| UpkeepError::transaction_begin(description, e))?;
        log::debug!("[Transaction] Started '{}'", description);

        let result = match panic::catch_unwind(AssertUnwindSafe(|| action(&mut *doc))) {
            Ok(result) => result,
            Err(payload) => Err(UpkeepError::mutation(panic_message(payload.as_ref()))),
        };

        match result {
            Ok(outcome) => match doc.commit_transaction() {
                Ok(()) => {
                    log::debug!("[Transaction] Committed '{}'", description);
                    Ok(outcome)
                }
                Err(e) => {
                    roll_back(doc, description, &e.to_string());
                    Ok(Outcome::failure(format!("Failed with exception: {}", e)))
                }
            },
            Err(e) => {
                roll_back(doc, description, &e.to_string());
                Ok(Outcome::failure(format!("Failed with exception: {}", e)))
            }
        }
    }

    /// Run `action` in a transaction that is always rolled back
    ///
    /// Used to observe what a mutation would do without keeping it. Generic
    /// over the document so host-specific commands can run inside the dry run.
    /// A panic inside `action` is rolled back too and returned as
    /// [`UpkeepError::Mutation`].
    pub fn dry_run<D, T, F>(doc: &mut D, description: &str, action: F) -> Result<T>
    where
        D: Document + ?Sized,
        F: FnOnce(&mut D) -> Result<T>,
    {
        doc.begin_transaction(description)
            .map_err(|e| UpkeepError::transaction_begin(description, e))?;
        log::debug!("[Transaction] Started dry run '{}'", description);

        let result = match panic::catch_unwind(AssertUnwindSafe(|| action(&mut *doc))) {
            Ok(result) => result,
            Err(payload) => Err(UpkeepError::mutation(panic_message(payload.as_ref()))),
        };
        doc.rollback_transaction()?;
        log::debug!("[Transaction] Rolled back dry run '{}'", description);
        result
    }
}

fn roll_back(doc: &mut dyn Document, description: &str, reason: &str) {
    log::warn!("[Transaction] Rolling back '{}': {}", description, reason);
    if let Err(e) = doc.rollback_transaction() {
        log::error!("[Transaction] Rollback of '{}' failed: {}", description, e);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_string()
    }
}
