// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for host document data
//!
//! This module defines the value types exchanged between a host document and
//! the maintenance engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type-safe element identifier
///
/// Wraps the host's integer element id. Ids have no meaning outside the
/// document that issued them.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ElementId(pub i64);

impl ElementId {
    /// The host's "no element" id
    pub const INVALID: ElementId = ElementId(-1);

    /// Check whether this id can refer to an element at all
    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for ElementId {
    fn default() -> Self {
        ElementId::INVALID
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[id:{}]", self.0)
    }
}

impl From<i64> for ElementId {
    fn from(id: i64) -> Self {
        ElementId(id)
    }
}

impl From<ElementId> for i64 {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

/// Host element category
///
/// Covers the categories maintenance actions commonly act on. Unknown
/// categories keep their original host name.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    // ========================================================================
    // Model elements
    // ========================================================================
    Walls,
    Doors,
    Windows,
    Floors,
    Ceilings,
    Roofs,
    Stairs,
    Railings,
    Columns,
    StructuralColumns,
    GenericModel,
    Furniture,
    PlumbingFixtures,
    Rooms,

    // ========================================================================
    // Datum elements
    // ========================================================================
    Levels,
    LevelHeads,
    Grids,
    GridHeads,

    // ========================================================================
    // Annotation
    // ========================================================================
    Dimensions,
    SpotElevations,
    SpotElevationSymbols,
    TextNotes,
    Tags,
    GenericAnnotation,
    ArrowHeads,
    DetailComponents,
    FilledRegions,

    // ========================================================================
    // Boundary lines
    // ========================================================================
    RoomSeparationLines,
    AreaSchemeLines,

    // ========================================================================
    // Groups
    // ========================================================================
    ModelGroups,
    DetailGroups,

    /// Any category not listed above
    Unknown(String),
}

impl Category {
    /// Parse a host category name
    ///
    /// Accepts both the built-in form (`OST_Walls`) and the bare form
    /// (`Walls`), case-insensitively.
    pub fn parse(s: &str) -> Self {
        let upper = s.trim().to_uppercase();
        let bare = upper.strip_prefix("OST_").unwrap_or(&upper);
        match bare {
            "WALLS" => Category::Walls,
            "DOORS" => Category::Doors,
            "WINDOWS" => Category::Windows,
            "FLOORS" => Category::Floors,
            "CEILINGS" => Category::Ceilings,
            "ROOFS" => Category::Roofs,
            "STAIRS" => Category::Stairs,
            "RAILINGS" | "STAIRSRAILING" => Category::Railings,
            "COLUMNS" => Category::Columns,
            "STRUCTURALCOLUMNS" => Category::StructuralColumns,
            "GENERICMODEL" => Category::GenericModel,
            "FURNITURE" => Category::Furniture,
            "PLUMBINGFIXTURES" => Category::PlumbingFixtures,
            "ROOMS" => Category::Rooms,
            "LEVELS" => Category::Levels,
            "LEVELHEADS" => Category::LevelHeads,
            "GRIDS" => Category::Grids,
            "GRIDHEADS" => Category::GridHeads,
            "DIMENSIONS" => Category::Dimensions,
            "SPOTELEVATIONS" => Category::SpotElevations,
            "SPOTELEVSYMBOLS" | "SPOTELEVATIONSYMBOLS" => Category::SpotElevationSymbols,
            "TEXTNOTES" => Category::TextNotes,
            "TAGS" | "MULTICATEGORYTAGS" => Category::Tags,
            "GENERICANNOTATION" => Category::GenericAnnotation,
            "ARROWHEADS" => Category::ArrowHeads,
            "DETAILCOMPONENTS" => Category::DetailComponents,
            "FILLEDREGIONS" | "DETAILREGIONS" => Category::FilledRegions,
            "ROOMSEPARATIONLINES" => Category::RoomSeparationLines,
            "AREASCHEMELINES" => Category::AreaSchemeLines,
            "IOSMODELGROUPS" | "MODELGROUPS" => Category::ModelGroups,
            "IOSDETAILGROUPS" | "DETAILGROUPS" => Category::DetailGroups,
            _ => Category::Unknown(s.to_string()),
        }
    }

    /// Get the host's built-in category name
    pub fn name(&self) -> &str {
        match self {
            Category::Walls => "OST_Walls",
            Category::Doors => "OST_Doors",
            Category::Windows => "OST_Windows",
            Category::Floors => "OST_Floors",
            Category::Ceilings => "OST_Ceilings",
            Category::Roofs => "OST_Roofs",
            Category::Stairs => "OST_Stairs",
            Category::Railings => "OST_StairsRailing",
            Category::Columns => "OST_Columns",
            Category::StructuralColumns => "OST_StructuralColumns",
            Category::GenericModel => "OST_GenericModel",
            Category::Furniture => "OST_Furniture",
            Category::PlumbingFixtures => "OST_PlumbingFixtures",
            Category::Rooms => "OST_Rooms",
            Category::Levels => "OST_Levels",
            Category::LevelHeads => "OST_LevelHeads",
            Category::Grids => "OST_Grids",
            Category::GridHeads => "OST_GridHeads",
            Category::Dimensions => "OST_Dimensions",
            Category::SpotElevations => "OST_SpotElevations",
            Category::SpotElevationSymbols => "OST_SpotElevSymbols",
            Category::TextNotes => "OST_TextNotes",
            Category::Tags => "OST_MultiCategoryTags",
            Category::GenericAnnotation => "OST_GenericAnnotation",
            Category::ArrowHeads => "OST_ArrowHeads",
            Category::DetailComponents => "OST_DetailComponents",
            Category::FilledRegions => "OST_DetailRegions",
            Category::RoomSeparationLines => "OST_RoomSeparationLines",
            Category::AreaSchemeLines => "OST_AreaSchemeLines",
            Category::ModelGroups => "OST_IOSModelGroups",
            Category::DetailGroups => "OST_IOSDetailGroups",
            Category::Unknown(s) => s,
        }
    }
}

impl Default for Category {
    fn default() -> Self {
        Category::Unknown(String::new())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Broad element class, used by class-based collectors
///
/// Built-in type classes are only reachable through a class query, while
/// loaded family symbols are only reachable through a category query.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementClass {
    /// A placed element
    #[default]
    Instance,
    /// A built-in (system family) type
    Type,
    /// A loadable family symbol
    Symbol,
    /// A group definition
    GroupType,
    /// Anything else (views, settings, ...)
    Other,
}

/// Element record yielded by collectors
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    /// Element id
    pub id: ElementId,
    /// Display name
    pub name: String,
    /// Host category
    pub category: Category,
    /// Element class
    #[serde(default)]
    pub class: ElementClass,
    /// Type of a placed instance
    #[serde(default)]
    pub type_id: Option<ElementId>,
    /// Element annotated by a tag
    #[serde(default)]
    pub owner_id: Option<ElementId>,
    /// Family name of a type or symbol
    #[serde(default)]
    pub family_name: Option<String>,
    /// Group definition this element belongs to
    #[serde(default)]
    pub group_id: Option<ElementId>,
}

impl ElementInfo {
    /// Create a new element record
    pub fn new(
        id: ElementId,
        name: impl Into<String>,
        category: Category,
        class: ElementClass,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category,
            class,
            type_id: None,
            owner_id: None,
            family_name: None,
            group_id: None,
        }
    }

    /// Set the instance's type
    pub fn with_type(mut self, type_id: ElementId) -> Self {
        self.type_id = Some(type_id);
        self
    }

    /// Set the element annotated by this tag
    pub fn with_owner(mut self, owner_id: ElementId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Set the family name
    pub fn with_family(mut self, family_name: impl Into<String>) -> Self {
        self.family_name = Some(family_name.into());
        self
    }

    /// Place this element inside a group definition
    pub fn in_group(mut self, group_id: ElementId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Name and id, as used in report messages
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.id)
    }
}

/// Parameter value stored on an element
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterValue {
    /// No value assigned
    #[default]
    None,
    /// Text value
    Text(String),
    /// Integer value
    Integer(i64),
    /// Floating point value (internal units)
    Double(f64),
    /// Reference to another element
    ElementId(ElementId),
}

impl ParameterValue {
    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as element reference, ignoring invalid ids
    pub fn as_element_id(&self) -> Option<ElementId> {
        match self {
            ParameterValue::ElementId(id) if id.is_valid() => Some(*id),
            _ => None,
        }
    }

    /// Try to get as float
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParameterValue::Double(d) => Some(*d),
            ParameterValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Check whether the value is absent or blank text
    pub fn is_empty(&self) -> bool {
        match self {
            ParameterValue::None => true,
            ParameterValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// A point or vector in model coordinates
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    /// Create a new point
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise sum
    pub fn offset(&self, by: &Xyz) -> Xyz {
        Xyz::new(self.x + by.x, self.y + by.y, self.z + by.z)
    }
}

impl From<[f64; 3]> for Xyz {
    fn from(v: [f64; 3]) -> Self {
        Xyz::new(v[0], v[1], v[2])
    }
}

impl fmt::Display for Xyz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A straight model line, the geometry of a separation line
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Xyz,
    pub end: Xyz,
}

impl LineSegment {
    /// Create a line from two end points
    pub fn new(start: Xyz, end: Xyz) -> Self {
        Self { start, end }
    }

    /// Distance between the end points
    pub fn length(&self) -> f64 {
        let (dx, dy, dz) = (
            self.end.x - self.start.x,
            self.end.y - self.start.y,
            self.end.z - self.start.z,
        );
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for LineSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
