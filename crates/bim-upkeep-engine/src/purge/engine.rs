// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Purge Engine - mark-and-sweep detection of unused types
//!
//! A type is used when at least one placed instance refers to it. Declared
//! types come from two collectors, because loaded family symbols are only
//! reachable by category while built-in types are only reachable by class.
//!
//! Dependent categories (arrow heads referenced by dimension types, for
//! example) count a symbol as used only when a *used* parent type refers to
//! it, so symbols referenced solely by unused parents are reported too.
//!
//! Members of an unplaced group definition are still reported by the host's
//! instance collectors, so types used only inside such a group are never
//! detected as unused. Place one instance of every group, or accept these
//! false negatives.

use crate::Outcome;
use bim_upkeep_model::{Category, ElementClass, ElementId, ElementInfo, ElementQuery};
use rustc_hash::FxHashSet;

/// Element collector: a query against the document
pub type Collector = Box<dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo> + Send + Sync>;

/// Types and symbols of a category, as the category collector sees them
pub fn types_of_category(category: Category) -> Collector {
    Box::new(move |query| {
        query
            .elements_by_category(&category)
            .into_iter()
            .filter(|e| e.class != ElementClass::Instance)
            .collect()
    })
}

/// Elements of a class belonging to a category
pub fn types_of_class(class: ElementClass, category: Category) -> Collector {
    Box::new(move |query| {
        query
            .elements_by_class(&class)
            .into_iter()
            .filter(|e| e.category == category)
            .collect()
    })
}

/// Placed instances of a category
pub fn instances_of_category(category: Category) -> Collector {
    Box::new(move |query| {
        query
            .elements_by_category(&category)
            .into_iter()
            .filter(|e| e.class == ElementClass::Instance)
            .collect()
    })
}

/// Collector that never returns anything
pub fn nothing() -> Collector {
    Box::new(|_| Vec::new())
}

/// Union of two collectors' ids, first-seen order, no duplicates
fn declared_ids(
    query: &dyn ElementQuery,
    by_category: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
    by_class: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
) -> Vec<ElementId> {
    let mut seen = FxHashSet::default();
    by_category(query)
        .into_iter()
        .chain(by_class(query))
        .map(|e| e.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Type ids of placed instances
fn used_type_ids(
    query: &dyn ElementQuery,
    instances: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
) -> FxHashSet<ElementId> {
    instances(query)
        .into_iter()
        .filter_map(|e| e.type_id)
        .collect()
}

/// Declared types no placed instance refers to
///
/// Order follows the category collector, then the class collector.
pub fn unused_type_ids(
    query: &dyn ElementQuery,
    by_category: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
    by_class: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
    instances: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
) -> Vec<ElementId> {
    let used = used_type_ids(query, instances);
    declared_ids(query, by_category, by_class)
        .into_iter()
        .filter(|id| !used.contains(id))
        .collect()
}

/// [`unused_type_ids`] reported as an outcome, ids in the payload
pub fn get_unused_type_ids(
    query: &dyn ElementQuery,
    by_category: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
    by_class: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
    instances: &dyn Fn(&dyn ElementQuery) -> Vec<ElementInfo>,
) -> Outcome {
    let unused = unused_type_ids(query, by_category, by_class, instances);
    Outcome::success(format!("Found {} unused type(s)", unused.len())).with_payload(unused)
}

/// A category whose symbols are referenced through parent type parameters
pub struct Dependent {
    /// The dependent category
    pub category: PurgeCategory,
    /// Parameters of parent types holding references to it
    pub via_parameters: Vec<String>,
}

impl Dependent {
    /// Create a dependent category reached through the given parameters
    pub fn new(category: PurgeCategory, via_parameters: &[&str]) -> Self {
        Self {
            category,
            via_parameters: via_parameters.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Declarative description of one purgeable category
pub struct PurgeCategory {
    name: String,
    by_category: Collector,
    by_class: Collector,
    instances: Collector,
    dependents: Vec<Dependent>,
    retain_one_per_family: bool,
}

impl PurgeCategory {
    /// Create a category with empty collectors
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_category: nothing(),
            by_class: nothing(),
            instances: nothing(),
            dependents: Vec::new(),
            retain_one_per_family: false,
        }
    }

    /// Category with the stock collectors for a host category
    ///
    /// Declared types come from the category (symbols) and the `Type` class
    /// (built-in types); instances are the placed elements of the category.
    pub fn for_category(name: impl Into<String>, category: Category) -> Self {
        Self::new(name)
            .by_category(types_of_category(category.clone()))
            .by_class(types_of_class(ElementClass::Type, category.clone()))
            .instances(instances_of_category(category))
    }

    /// Set the category collector
    pub fn by_category(mut self, collector: Collector) -> Self {
        self.by_category = collector;
        self
    }

    /// Set the class collector
    pub fn by_class(mut self, collector: Collector) -> Self {
        self.by_class = collector;
        self
    }

    /// Set the instance collector
    pub fn instances(mut self, collector: Collector) -> Self {
        self.instances = collector;
        self
    }

    /// Add a dependent category
    pub fn dependent(mut self, dependent: Dependent) -> Self {
        self.dependents.push(dependent);
        self
    }

    /// Never report every type of a family as unused
    ///
    /// Hosts refuse to delete the last type of a system family.
    pub fn retain_one_per_family(mut self, retain: bool) -> Self {
        self.retain_one_per_family = retain;
        self
    }

    /// Category name, used in reports
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependent categories
    pub fn dependents(&self) -> &[Dependent] {
        &self.dependents
    }

    /// Every declared id of this category and its dependents
    pub fn declared_ids(&self, query: &dyn ElementQuery) -> Vec<ElementId> {
        let mut seen = FxHashSet::default();
        let mut ids = Vec::new();
        self.collect_declared(query, &mut seen, &mut ids);
        ids
    }

    fn collect_declared(
        &self,
        query: &dyn ElementQuery,
        seen: &mut FxHashSet<ElementId>,
        ids: &mut Vec<ElementId>,
    ) {
        for id in declared_ids(query, &*self.by_category, &*self.by_class) {
            if seen.insert(id) {
                ids.push(id);
            }
        }
        for dependent in &self.dependents {
            dependent.category.collect_declared(query, seen, ids);
        }
    }
}

/// Unused ids found for one category
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnusedSet {
    pub category: String,
    pub ids: Vec<ElementId>,
}

/// Runs unused detection over a [`PurgeCategory`] tree
pub struct PurgeEngine;

impl PurgeEngine {
    /// Unused ids of the category and of every dependent, root first
    pub fn unused_by_category(query: &dyn ElementQuery, category: &PurgeCategory) -> Vec<UnusedSet> {
        let mut sets = Vec::new();
        Self::visit(query, category, &FxHashSet::default(), &mut sets);
        sets
    }

    /// Every unused id of the category tree, without duplicates
    pub fn unused_ids(query: &dyn ElementQuery, category: &PurgeCategory) -> Vec<ElementId> {
        let mut seen = FxHashSet::default();
        Self::unused_by_category(query, category)
            .into_iter()
            .flat_map(|set| set.ids)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Detect unused types of one category
    ///
    /// `referenced` holds ids a used parent type refers to; they count as
    /// used here.
    fn visit(
        query: &dyn ElementQuery,
        category: &PurgeCategory,
        referenced: &FxHashSet<ElementId>,
        sets: &mut Vec<UnusedSet>,
    ) {
        let declared = declared_ids(query, &*category.by_category, &*category.by_class);
        let mut used = used_type_ids(query, &*category.instances);
        used.extend(referenced.iter().copied());

        let mut unused: Vec<ElementId> = declared
            .iter()
            .copied()
            .filter(|id| !used.contains(id))
            .collect();
        if category.retain_one_per_family {
            // A kept type still holds references to dependent symbols
            let kept = retain_family_survivors(query, &declared, &used, &mut unused);
            used.extend(kept);
        }
        log::debug!(
            "[Purge] {}: {} declared, {} unused",
            category.name,
            declared.len(),
            unused.len()
        );
        sets.push(UnusedSet {
            category: category.name.clone(),
            ids: unused,
        });

        for dependent in &category.dependents {
            let referenced = referenced_by(query, &used, &dependent.via_parameters);
            Self::visit(query, &dependent.category, &referenced, sets);
        }
    }
}

/// Ids referenced through the given parameters of the given types
fn referenced_by(
    query: &dyn ElementQuery,
    types: &FxHashSet<ElementId>,
    parameters: &[String],
) -> FxHashSet<ElementId> {
    types
        .iter()
        .flat_map(|id| {
            parameters
                .iter()
                .filter_map(move |name| query.parameter(*id, name))
        })
        .filter_map(|value| value.as_element_id())
        .collect()
}

/// Keep the first declared type of every system family that would lose all
/// of its types; returns the kept ids
///
/// Loadable symbols are not affected.
fn retain_family_survivors(
    query: &dyn ElementQuery,
    declared: &[ElementId],
    used: &FxHashSet<ElementId>,
    unused: &mut Vec<ElementId>,
) -> Vec<ElementId> {
    let family_of = |id: ElementId| {
        query
            .element(id)
            .filter(|e| e.class == ElementClass::Type)
            .and_then(|e| e.family_name)
    };

    let mut alive: FxHashSet<String> = declared
        .iter()
        .filter(|id| used.contains(id))
        .filter_map(|id| family_of(*id))
        .collect();

    let mut kept = Vec::new();
    for id in unused.iter() {
        if let Some(family) = family_of(*id) {
            if alive.insert(family) {
                kept.push(*id);
            }
        }
    }
    unused.retain(|id| !kept.contains(id));
    kept
}
