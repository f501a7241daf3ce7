// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outcome - aggregated status report of a maintenance operation
//!
//! Every public entry point of the engine returns exactly one [`Outcome`].
//! Sub-operations are folded into a running aggregate so a caller sees one
//! status and one message log for a whole batch.

use crate::Result;
use bim_upkeep_model::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status, message log and element payload of an operation
///
/// A fresh outcome is a vacuous success: `status == true`, no message and
/// no payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Overall success
    pub status: bool,
    /// Newline separated log, in processing order
    pub message: String,
    /// Elements the operation produced or acted on
    pub payload: Vec<ElementId>,
}

impl Default for Outcome {
    fn default() -> Self {
        Self::new()
    }
}

impl Outcome {
    /// Create an empty, successful outcome
    pub fn new() -> Self {
        Self {
            status: true,
            message: String::new(),
            payload: Vec::new(),
        }
    }

    /// Create a successful outcome with a message
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: true,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    /// Create a failed outcome with a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: false,
            message: message.into(),
            payload: Vec::new(),
        }
    }

    /// Attach a payload
    pub fn with_payload(mut self, payload: Vec<ElementId>) -> Self {
        self.payload = payload;
        self
    }

    /// Append a line to the message log
    pub fn append_message(&mut self, message: impl AsRef<str>) {
        let message = message.as_ref();
        if self.message.is_empty() {
            self.message.push_str(message);
        } else {
            self.message.push('\n');
            self.message.push_str(message);
        }
    }

    /// Fold a sub-operation's outcome into this one
    ///
    /// Status is AND-ed, a non-empty message is appended and the payload is
    /// extended.
    pub fn update(&mut self, other: Outcome) {
        if !other.message.is_empty() {
            self.append_message(&other.message);
        }
        self.status &= other.status;
        self.payload.extend(other.payload);
    }

    /// Set the status to exactly `status` and append a message
    ///
    /// Used for local judgments ("skipped by filter", "nothing to do") that
    /// are reported independently of prior sub-results.
    pub fn update_sep(&mut self, status: bool, message: impl AsRef<str>) {
        self.append_message(message);
        self.status = status;
    }

    /// AND a status into this outcome
    pub fn update_status(&mut self, status: bool) {
        self.status &= status;
    }

    /// Message lines, in order
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.message.lines()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "message:")?;
        for line in self.message.lines() {
            writeln!(f, "...{}", line)?;
        }
        writeln!(f, "status: [{}]", self.status)?;
        let ids: Vec<String> = self.payload.iter().map(|id| id.to_string()).collect();
        write!(f, "result: [{}]", ids.join(", "))
    }
}

/// Serialize any report value to pretty JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_vacuous_success() {
        let outcome = Outcome::default();
        assert!(outcome.status);
        assert!(outcome.message.is_empty());
        assert!(outcome.payload.is_empty());
    }

    #[test]
    fn test_update_ands_status_and_keeps_order() {
        for (a, b) in [(true, true), (true, false), (false, true), (false, false)] {
            let mut first = Outcome {
                status: a,
                message: "first".into(),
                payload: vec![ElementId(1)],
            };
            let second = Outcome {
                status: b,
                message: "second".into(),
                payload: vec![ElementId(2)],
            };
            first.update(second);
            assert_eq!(first.status, a && b);
            assert_eq!(first.message, "first\nsecond");
            assert_eq!(first.payload, vec![ElementId(1), ElementId(2)]);
        }
    }

    #[test]
    fn test_update_skips_empty_message() {
        let mut outcome = Outcome::success("only");
        outcome.update(Outcome::new());
        assert_eq!(outcome.message, "only");
    }

    #[test]
    fn test_update_is_associative() {
        let a = Outcome::success("a");
        let b = Outcome::failure("b").with_payload(vec![ElementId(3)]);
        let c = Outcome::success("c");

        let mut left = a.clone();
        left.update(b.clone());
        left.update(c.clone());

        let mut bc = b;
        bc.update(c);
        let mut right = a;
        right.update(bc);

        assert_eq!(left, right);
    }

    #[test]
    fn test_update_sep_sets_status_exactly() {
        let mut outcome = Outcome::failure("broken");
        outcome.update_sep(true, "skipped");
        assert!(outcome.status);
        assert_eq!(outcome.message, "broken\nskipped");

        outcome.update_sep(false, "bad");
        assert!(!outcome.status);
    }

    #[test]
    fn test_display_indents_lines() {
        let mut outcome = Outcome::success("one");
        outcome.append_message("two");
        outcome.payload.push(ElementId(7));
        assert_eq!(
            outcome.to_string(),
            "message:\n...one\n...two\nstatus: [true]\nresult: [[id:7]]"
        );
    }

    #[test]
    fn test_to_json() {
        let json = to_json(&Outcome::failure("x").with_payload(vec![ElementId(4)])).unwrap();
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert!(!back.status);
        assert_eq!(back.payload, vec![ElementId(4)]);
    }
}
