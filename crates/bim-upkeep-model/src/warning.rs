// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host warnings
//!
//! A warning is a consistency issue detected by the host, tagged with the
//! GUID of its failure definition and the elements it implicates.

use crate::ElementId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a host warning type (failure definition GUID)
///
/// Stored lowercased, since hosts are not consistent about GUID casing
/// between API versions. Deserialized values are normalized the same way.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct WarningGuid(String);

impl WarningGuid {
    /// Create a new warning GUID
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into().trim().to_lowercase())
    }

    /// Get the normalized GUID string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WarningGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WarningGuid {
    fn from(s: &str) -> Self {
        WarningGuid::new(s)
    }
}

impl From<String> for WarningGuid {
    fn from(s: String) -> Self {
        WarningGuid::new(s)
    }
}

impl From<WarningGuid> for String {
    fn from(guid: WarningGuid) -> Self {
        guid.0
    }
}

/// A single warning reported by the host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WarningInstance {
    /// Warning type
    pub type_guid: WarningGuid,
    /// Human readable warning text
    #[serde(default)]
    pub description: String,
    /// Elements implicated by this warning, in host order
    pub failing_element_ids: Vec<ElementId>,
}

impl WarningInstance {
    /// Create a new warning
    pub fn new(
        type_guid: impl Into<WarningGuid>,
        description: impl Into<String>,
        failing_element_ids: Vec<ElementId>,
    ) -> Self {
        Self {
            type_guid: type_guid.into(),
            description: description.into(),
            failing_element_ids,
        }
    }
}

/// Failure definition GUIDs of warnings with stock solvers
pub mod guids {
    /// "Elements have duplicate 'Mark' values."
    pub const DUPLICATE_MARK_VALUE: &str = "6e1efefe-c8e0-483d-8482-150b9f1da21a";

    /// "Tag is outside of its host." (tag placed away from the element it annotates)
    pub const TAG_OUTSIDE_OF_OWNER: &str = "4f0bba25-e17f-480a-a763-d97d184be18a";

    /// "Area separation lines overlap."
    pub const AREA_SEPARATION_LINES_OVERLAP: &str = "374d8e5c-64e3-4e21-a1ab-5a2e1b7c1d8b";

    /// "Room separation lines overlap."
    pub const ROOM_SEPARATION_LINES_OVERLAP: &str = "2a1c5e8f-2bb1-4a94-b1a6-6e2c0c5bd0a4";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_guid_is_case_insensitive() {
        let a = WarningGuid::new("6E1EFEFE-C8E0-483D-8482-150B9F1DA21A");
        let b = WarningGuid::from(guids::DUPLICATE_MARK_VALUE);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_deserialized_guid_is_normalized() {
        let json = r#"{
            "type_guid": " 6E1EFEFE-C8E0-483D-8482-150B9F1DA21A",
            "failing_element_ids": [1, 2]
        }"#;
        let warning: WarningInstance = serde_json::from_str(json).unwrap();
        assert_eq!(warning.type_guid.as_str(), guids::DUPLICATE_MARK_VALUE);
        assert_eq!(warning.type_guid.to_string(), guids::DUPLICATE_MARK_VALUE);
        assert!(warning.description.is_empty());

        let back = serde_json::to_string(&warning.type_guid).unwrap();
        assert_eq!(back, format!("\"{}\"", guids::DUPLICATE_MARK_VALUE));
    }

    #[test]
    fn test_warning_keeps_host_order() {
        let warning = WarningInstance::new(
            guids::DUPLICATE_MARK_VALUE,
            "Elements have duplicate 'Mark' values.",
            vec![ElementId(9), ElementId(2)],
        );
        assert_eq!(warning.failing_element_ids, vec![ElementId(9), ElementId(2)]);
        assert_eq!(warning.type_guid.as_str(), guids::DUPLICATE_MARK_VALUE);
    }
}
