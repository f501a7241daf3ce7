// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element filters
//!
//! A filter decides whether an element may be touched. Leaf filters pair a
//! predicate with a list of values; chains combine filters with AND/OR
//! semantics and short-circuit evaluation. Filters never mutate anything.

use bim_upkeep_model::{Category, ElementId, ElementQuery};

/// Predicate over a single element
pub trait ElementFilter: Send + Sync {
    /// Check whether the element passes
    fn evaluate(&self, query: &dyn ElementQuery, id: ElementId) -> bool;
}

/// Predicate function used by [`PredicateFilter`]
pub type Predicate<V> = Box<dyn Fn(&dyn ElementQuery, ElementId, &[V]) -> bool + Send + Sync>;

/// Leaf filter: a predicate plus the values it tests against
pub struct PredicateFilter<V> {
    predicate: Predicate<V>,
    values: Vec<V>,
}

impl<V: Send + Sync> PredicateFilter<V> {
    /// Create a filter from a predicate and its values
    pub fn new<F>(predicate: F, values: Vec<V>) -> Self
    where
        F: Fn(&dyn ElementQuery, ElementId, &[V]) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Box::new(predicate),
            values,
        }
    }

    /// Values passed to the predicate
    pub fn values(&self) -> &[V] {
        &self.values
    }
}

impl<V: Send + Sync> ElementFilter for PredicateFilter<V> {
    fn evaluate(&self, query: &dyn ElementQuery, id: ElementId) -> bool {
        (self.predicate)(query, id, &self.values)
    }
}

/// How a [`FilterChain`] combines its members
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    /// Every member must pass; stops at the first failure
    All,
    /// One member must pass; stops at the first success
    Any,
}

/// Composite filter
///
/// An empty `All` chain passes everything, an empty `Any` chain passes
/// nothing.
pub struct FilterChain {
    mode: FilterMode,
    filters: Vec<Box<dyn ElementFilter>>,
}

impl FilterChain {
    /// Create an empty chain
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            filters: Vec::new(),
        }
    }

    /// Chain whose members must all pass
    pub fn and(filters: Vec<Box<dyn ElementFilter>>) -> Self {
        Self {
            mode: FilterMode::All,
            filters,
        }
    }

    /// Chain of which one member must pass
    pub fn or(filters: Vec<Box<dyn ElementFilter>>) -> Self {
        Self {
            mode: FilterMode::Any,
            filters,
        }
    }

    /// Add a member
    pub fn push(mut self, filter: impl ElementFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Combination mode
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check whether the chain has no members
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl ElementFilter for FilterChain {
    fn evaluate(&self, query: &dyn ElementQuery, id: ElementId) -> bool {
        match self.mode {
            FilterMode::All => self.filters.iter().all(|f| f.evaluate(query, id)),
            FilterMode::Any => self.filters.iter().any(|f| f.evaluate(query, id)),
        }
    }
}

// ============================================================================
// Stock predicates
// ============================================================================

/// Passes elements of any of the given categories
pub fn is_of_category(categories: Vec<Category>) -> PredicateFilter<Category> {
    PredicateFilter::new(
        |query, id, categories| {
            query
                .element(id)
                .is_some_and(|e| categories.contains(&e.category))
        },
        categories,
    )
}

/// Passes elements of none of the given categories
///
/// Missing elements do not pass.
pub fn is_not_of_category(categories: Vec<Category>) -> PredicateFilter<Category> {
    PredicateFilter::new(
        |query, id, categories| {
            query
                .element(id)
                .is_some_and(|e| !categories.contains(&e.category))
        },
        categories,
    )
}

/// Passes elements whose name contains any of the given fragments
pub fn name_contains_any(fragments: Vec<String>) -> PredicateFilter<String> {
    PredicateFilter::new(
        |query, id, fragments| {
            query
                .element(id)
                .is_some_and(|e| fragments.iter().any(|f| e.name.contains(f.as_str())))
        },
        fragments,
    )
}

/// Passes elements whose name contains none of the given fragments
pub fn name_contains_none(fragments: Vec<String>) -> PredicateFilter<String> {
    PredicateFilter::new(
        |query, id, fragments| {
            query
                .element(id)
                .is_some_and(|e| !fragments.iter().any(|f| e.name.contains(f.as_str())))
        },
        fragments,
    )
}

/// Passes types and symbols of the given families
pub fn family_name_is_any(families: Vec<String>) -> PredicateFilter<String> {
    PredicateFilter::new(
        |query, id, families| {
            query
                .element(id)
                .and_then(|e| e.family_name)
                .is_some_and(|name| families.iter().any(|f| f == &name))
        },
        families,
    )
}

/// Passes everything
pub fn always_true() -> PredicateFilter<()> {
    PredicateFilter::new(|_, _, _| true, Vec::new())
}
