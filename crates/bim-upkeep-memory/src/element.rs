// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stored element records

use bim_upkeep_model::{
    Category, ElementClass, ElementId, ElementInfo, LineSegment, ParameterValue, Xyz,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// An element as held by [`MemoryDocument`](crate::MemoryDocument)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredElement {
    /// Collector-facing record
    #[serde(flatten)]
    pub info: ElementInfo,
    /// Named parameters
    #[serde(default)]
    pub parameters: FxHashMap<String, ParameterValue>,
    /// Parameters the host refuses to write
    #[serde(default)]
    pub read_only: FxHashSet<String>,
    /// Anchor point, for placed elements
    #[serde(default)]
    pub location: Option<Xyz>,
    /// Geometry, for line-based elements
    #[serde(default)]
    pub curve: Option<LineSegment>,
}

impl StoredElement {
    /// Wrap an element record
    pub fn new(info: ElementInfo) -> Self {
        Self {
            info,
            parameters: FxHashMap::default(),
            read_only: FxHashSet::default(),
            location: None,
            curve: None,
        }
    }

    /// A built-in type (only reachable through class collectors)
    pub fn system_type(id: i64, name: &str, category: Category, family: &str) -> Self {
        Self::new(
            ElementInfo::new(ElementId(id), name, category, ElementClass::Type).with_family(family),
        )
    }

    /// A loadable family symbol
    pub fn symbol(id: i64, name: &str, category: Category, family: &str) -> Self {
        Self::new(
            ElementInfo::new(ElementId(id), name, category, ElementClass::Symbol)
                .with_family(family),
        )
    }

    /// A placed instance of a type
    pub fn instance(id: i64, name: &str, category: Category, type_id: i64) -> Self {
        Self::new(
            ElementInfo::new(ElementId(id), name, category, ElementClass::Instance)
                .with_type(ElementId(type_id)),
        )
    }

    /// Set a parameter value
    pub fn with_parameter(mut self, name: impl Into<String>, value: ParameterValue) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Mark a parameter read-only
    pub fn read_only(mut self, name: impl Into<String>) -> Self {
        self.read_only.insert(name.into());
        self
    }

    /// Place the element
    pub fn at(mut self, location: Xyz) -> Self {
        self.location = Some(location);
        self
    }

    /// Give the element straight line geometry
    pub fn along(mut self, start: Xyz, end: Xyz) -> Self {
        self.curve = Some(LineSegment::new(start, end));
        self
    }

    /// Set the annotated element of a tag
    pub fn owned_by(mut self, owner: i64) -> Self {
        self.info.owner_id = Some(ElementId(owner));
        self
    }

    /// Put the element inside a group definition
    pub fn in_group(mut self, group: i64) -> Self {
        self.info.group_id = Some(ElementId(group));
        self
    }

    /// Element id
    pub fn id(&self) -> ElementId {
        self.info.id
    }

    /// Check whether this element is a type or symbol
    pub fn is_type(&self) -> bool {
        matches!(
            self.info.class,
            ElementClass::Type | ElementClass::Symbol | ElementClass::GroupType
        )
    }
}
