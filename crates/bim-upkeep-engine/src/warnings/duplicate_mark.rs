// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solver for duplicate identifier ("Mark") warnings
//!
//! Clears the identifier on every element that passes the caller's filter.

use super::WarningSolver;
use crate::filter::{ElementFilter, PredicateFilter};
use crate::{Outcome, Result};
use bim_upkeep_model::{
    warning::guids, Document, ElementEditor, ElementId, ElementQuery, ElementQueryExt,
    ParameterValue, WarningGuid, WarningInstance,
};

/// Default identifier parameter
pub const MARK_PARAMETER: &str = "Mark";

/// Clears duplicate identifiers
pub struct DuplicateMarkSolver {
    guid: WarningGuid,
    parameter: String,
    filter: Box<dyn ElementFilter>,
    ignored_descriptions: Vec<String>,
}

impl DuplicateMarkSolver {
    /// Create a solver; elements failing `filter` keep their mark
    pub fn new(filter: impl ElementFilter + 'static) -> Self {
        Self {
            guid: WarningGuid::new(guids::DUPLICATE_MARK_VALUE),
            parameter: MARK_PARAMETER.to_string(),
            filter: Box::new(filter),
            ignored_descriptions: vec!["Type Mark".to_string()],
        }
    }

    /// Create a solver from a predicate and its values
    pub fn with_predicate<V, F>(predicate: F, values: Vec<V>) -> Self
    where
        V: Send + Sync + 'static,
        F: Fn(&dyn ElementQuery, ElementId, &[V]) -> bool + Send + Sync + 'static,
    {
        Self::new(PredicateFilter::new(predicate, values))
    }

    /// Clear a different text parameter
    pub fn with_parameter(mut self, name: impl Into<String>) -> Self {
        self.parameter = name.into();
        self
    }

    /// Ignore warnings whose description contains any of these phrases
    pub fn with_ignored_descriptions(mut self, phrases: Vec<String>) -> Self {
        self.ignored_descriptions = phrases;
        self
    }

    /// Handle a different warning type
    pub fn with_guid(mut self, guid: impl Into<WarningGuid>) -> Self {
        self.guid = guid.into();
        self
    }
}

impl WarningSolver for DuplicateMarkSolver {
    fn guid(&self) -> &WarningGuid {
        &self.guid
    }

    fn name(&self) -> &str {
        "Duplicate mark value."
    }

    fn filter(&self) -> Option<&dyn ElementFilter> {
        Some(self.filter.as_ref())
    }

    fn accepts(&self, warning: &WarningInstance) -> bool {
        !self
            .ignored_descriptions
            .iter()
            .any(|phrase| warning.description.contains(phrase.as_str()))
    }

    fn transaction_name(&self) -> String {
        format!("Updating {} value to empty", self.parameter.to_lowercase())
    }

    fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
        let name = doc.as_query().element_or_err(id)?.name;

        let current = doc.parameter(id, &self.parameter);
        if current.as_ref().map_or(true, ParameterValue::is_empty) {
            return Ok(Outcome::success(format!(
                "{}: Element has no mark value: {}",
                self.name(),
                name
            )));
        }

        doc.set_parameter(id, &self.parameter, ParameterValue::Text(String::new()))?;
        Ok(Outcome::success(format!("Updated mark on: {} {}", name, id)).with_payload(vec![id]))
    }
}
