// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MemoryDocument - in-memory host document
//!
//! Transactions are implemented by snapshotting the element table on
//! `begin_transaction` and restoring it on rollback.

use crate::element::StoredElement;
use crate::error::FixtureError;
use bim_upkeep_model::{
    Category, Document, ElementClass, ElementEditor, ElementId, ElementInfo, ElementQuery,
    HostError, LineSegment, ParameterValue, Result, TransactionHost, WarningInstance,
    WarningSource, Xyz,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Something that happened to a transaction, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionEvent {
    Committed(String),
    RolledBack(String),
}

/// Host failures to simulate
#[derive(Clone, Debug, Default)]
pub struct FailureInjection {
    /// Deleting any of these fails the whole delete call
    pub delete: FxHashSet<ElementId>,
    /// Writing a parameter on any of these fails
    pub set_parameter: FxHashSet<ElementId>,
    /// Moving any of these fails
    pub move_element: FxHashSet<ElementId>,
    /// Changing the geometry of any of these fails
    pub set_curve: FxHashSet<ElementId>,
    /// Every `begin_transaction` fails
    pub begin: bool,
    /// Every `commit_transaction` fails
    pub commit: bool,
}

/// Serialized form of a document
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DocumentFixture {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub elements: Vec<StoredElement>,
    #[serde(default)]
    pub warnings: Vec<WarningInstance>,
}

struct Snapshot {
    name: String,
    elements: FxHashMap<ElementId, StoredElement>,
    order: Vec<ElementId>,
}

/// In-memory document implementing every host trait
pub struct MemoryDocument {
    title: String,
    elements: FxHashMap<ElementId, StoredElement>,
    /// Host (collector) order
    order: Vec<ElementId>,
    warnings: Vec<WarningInstance>,
    open: Option<Snapshot>,
    failures: FailureInjection,
    log: Vec<TransactionEvent>,
}

impl MemoryDocument {
    /// Start building a document
    pub fn builder() -> MemoryDocumentBuilder {
        MemoryDocumentBuilder::default()
    }

    /// Load a document from a JSON fixture
    pub fn from_json(json: &str) -> std::result::Result<Self, FixtureError> {
        let fixture: DocumentFixture = serde_json::from_str(json)?;
        Self::from_fixture(fixture)
    }

    /// Load a document from a JSON fixture file
    pub fn from_file(path: impl AsRef<Path>) -> std::result::Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Build a document from an already parsed fixture
    pub fn from_fixture(fixture: DocumentFixture) -> std::result::Result<Self, FixtureError> {
        let mut builder = Self::builder().with_title(fixture.title);
        for element in fixture.elements {
            builder = builder.element(element);
        }
        for warning in fixture.warnings {
            builder = builder.warning(warning);
        }
        builder.try_build()
    }

    /// Serialize the current state as a fixture
    pub fn to_json(&self) -> std::result::Result<String, FixtureError> {
        let fixture = DocumentFixture {
            title: self.title.clone(),
            elements: self.stored_in_order().cloned().collect(),
            warnings: self.warnings.clone(),
        };
        Ok(serde_json::to_string_pretty(&fixture)?)
    }

    /// Mutable access to the simulated host failures
    pub fn failures_mut(&mut self) -> &mut FailureInjection {
        &mut self.failures
    }

    /// Every transaction closed so far
    pub fn transaction_log(&self) -> &[TransactionEvent] {
        &self.log
    }

    /// Names of committed transactions, in order
    pub fn committed(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter_map(|e| match e {
                TransactionEvent::Committed(name) => Some(name.as_str()),
                TransactionEvent::RolledBack(_) => None,
            })
            .collect()
    }

    /// Number of elements in the document
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check whether the document has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Full stored record of an element
    pub fn stored(&self, id: ElementId) -> Option<&StoredElement> {
        self.elements.get(&id)
    }

    /// The host's own purge command
    ///
    /// Removes, in one pass, every type or symbol that no instance is placed
    /// from and no element references through a parameter. The last type of a
    /// system family is never removed. Requires an open transaction.
    pub fn purge_unused_types(&mut self) -> Result<Vec<ElementId>> {
        self.require_transaction()?;

        let mut used: FxHashSet<ElementId> = FxHashSet::default();
        for element in self.elements.values() {
            if let Some(type_id) = element.info.type_id {
                used.insert(type_id);
            }
            for value in element.parameters.values() {
                if let Some(id) = value.as_element_id() {
                    used.insert(id);
                }
            }
        }

        let mut surviving_families: FxHashSet<(Category, String)> = FxHashSet::default();
        let mut candidates = Vec::new();
        for element in self.stored_in_order() {
            if !element.is_type() {
                continue;
            }
            let family_key = element
                .info
                .family_name
                .clone()
                .map(|family| (element.info.category.clone(), family));
            if used.contains(&element.id()) {
                if let Some(key) = family_key {
                    surviving_families.insert(key);
                }
            } else {
                candidates.push((element.id(), family_key, element.info.class));
            }
        }

        let mut purge = Vec::new();
        for (id, family_key, class) in candidates {
            if class == ElementClass::Type {
                if let Some(key) = family_key {
                    if surviving_families.insert(key) {
                        continue;
                    }
                }
            }
            purge.push(id);
        }

        if purge.is_empty() {
            return Ok(purge);
        }
        self.delete_elements(&purge)
    }

    fn stored_in_order(&self) -> impl Iterator<Item = &StoredElement> {
        self.order.iter().filter_map(|id| self.elements.get(id))
    }

    fn require_transaction(&self) -> Result<()> {
        if self.open.is_none() {
            return Err(HostError::NoOpenTransaction);
        }
        Ok(())
    }

    fn stored_mut(&mut self, id: ElementId) -> Result<&mut StoredElement> {
        self.elements
            .get_mut(&id)
            .ok_or(HostError::ElementNotFound(id))
    }

    /// Close the open transaction, recording how
    fn close(&mut self, event: fn(String) -> TransactionEvent) -> Result<Snapshot> {
        let snapshot = self.open.take().ok_or(HostError::NoOpenTransaction)?;
        self.log.push(event(snapshot.name.clone()));
        Ok(snapshot)
    }
}

impl ElementQuery for MemoryDocument {
    fn element(&self, id: ElementId) -> Option<ElementInfo> {
        self.elements.get(&id).map(|e| e.info.clone())
    }

    fn elements_by_category(&self, category: &Category) -> Vec<ElementInfo> {
        // Built-in types are invisible to category collectors
        self.stored_in_order()
            .filter(|e| &e.info.category == category && e.info.class != ElementClass::Type)
            .map(|e| e.info.clone())
            .collect()
    }

    fn elements_by_class(&self, class: &ElementClass) -> Vec<ElementInfo> {
        self.stored_in_order()
            .filter(|e| &e.info.class == class)
            .map(|e| e.info.clone())
            .collect()
    }

    fn all_ids(&self) -> Vec<ElementId> {
        self.stored_in_order().map(|e| e.id()).collect()
    }

    fn parameter(&self, id: ElementId, name: &str) -> Option<ParameterValue> {
        self.elements.get(&id)?.parameters.get(name).cloned()
    }

    fn location(&self, id: ElementId) -> Option<Xyz> {
        self.elements.get(&id)?.location
    }

    fn curve(&self, id: ElementId) -> Option<LineSegment> {
        self.elements.get(&id)?.curve
    }
}

impl ElementEditor for MemoryDocument {
    fn set_parameter(&mut self, id: ElementId, name: &str, value: ParameterValue) -> Result<()> {
        self.require_transaction()?;
        if self.failures.set_parameter.contains(&id) {
            return Err(HostError::other(format!(
                "Host rejected change of '{}' on {}",
                name, id
            )));
        }
        let element = self.stored_mut(id)?;
        if element.read_only.contains(name) {
            return Err(HostError::read_only(id, name));
        }
        match element.parameters.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(HostError::parameter_not_found(id, name)),
        }
    }

    fn move_element(&mut self, id: ElementId, by: Xyz) -> Result<()> {
        self.require_transaction()?;
        if self.failures.move_element.contains(&id) {
            return Err(HostError::other(format!("Host rejected move of {}", id)));
        }
        let element = self.stored_mut(id)?;
        match element.location.as_mut() {
            Some(location) => {
                *location = location.offset(&by);
                Ok(())
            }
            None => Err(HostError::other(format!("Element {} has no location", id))),
        }
    }

    fn set_curve(&mut self, id: ElementId, curve: LineSegment) -> Result<()> {
        self.require_transaction()?;
        if self.failures.set_curve.contains(&id) {
            return Err(HostError::other(format!(
                "Host rejected geometry change of {}",
                id
            )));
        }
        let element = self.stored_mut(id)?;
        match element.curve.as_mut() {
            Some(slot) => {
                *slot = curve;
                Ok(())
            }
            None => Err(HostError::other(format!("Element {} is not line based", id))),
        }
    }

    fn delete_elements(&mut self, ids: &[ElementId]) -> Result<Vec<ElementId>> {
        self.require_transaction()?;
        for id in ids {
            if self.failures.delete.contains(id) {
                return Err(HostError::delete_failed(*id, "element is in use by the host"));
            }
            if !self.elements.contains_key(id) {
                return Err(HostError::ElementNotFound(*id));
            }
        }

        // Deleting a type, owner or group takes its dependents along
        let mut doomed: FxHashSet<ElementId> = ids.iter().copied().collect();
        loop {
            let before = doomed.len();
            for element in self.elements.values() {
                let depends = [element.info.type_id, element.info.owner_id, element.info.group_id]
                    .iter()
                    .flatten()
                    .any(|parent| doomed.contains(parent));
                if depends {
                    doomed.insert(element.id());
                }
            }
            if doomed.len() == before {
                break;
            }
        }

        let removed: Vec<ElementId> = self
            .order
            .iter()
            .copied()
            .filter(|id| doomed.contains(id))
            .collect();
        for id in &removed {
            self.elements.remove(id);
        }
        self.order.retain(|id| !doomed.contains(id));
        log::debug!("[MemoryDocument] Deleted {} element(s)", removed.len());
        Ok(removed)
    }
}

impl TransactionHost for MemoryDocument {
    fn begin_transaction(&mut self, name: &str) -> Result<()> {
        if self.failures.begin {
            return Err(HostError::invalid_model(format!(
                "{} cannot be modified",
                self.title
            )));
        }
        if let Some(open) = &self.open {
            return Err(HostError::TransactionAlreadyOpen(open.name.clone()));
        }
        self.open = Some(Snapshot {
            name: name.to_string(),
            elements: self.elements.clone(),
            order: self.order.clone(),
        });
        Ok(())
    }

    fn commit_transaction(&mut self) -> Result<()> {
        self.require_transaction()?;
        if self.failures.commit {
            return Err(HostError::other("Host rejected the transaction"));
        }
        self.close(TransactionEvent::Committed)?;
        Ok(())
    }

    fn rollback_transaction(&mut self) -> Result<()> {
        let snapshot = self.close(TransactionEvent::RolledBack)?;
        self.elements = snapshot.elements;
        self.order = snapshot.order;
        Ok(())
    }

    fn has_open_transaction(&self) -> bool {
        self.open.is_some()
    }
}

impl WarningSource for MemoryDocument {
    /// Warnings whose elements are all gone are no longer reported
    fn warnings(&self) -> Vec<WarningInstance> {
        self.warnings
            .iter()
            .filter_map(|w| {
                let ids: Vec<ElementId> = w
                    .failing_element_ids
                    .iter()
                    .copied()
                    .filter(|id| self.elements.contains_key(id))
                    .collect();
                if ids.is_empty() {
                    None
                } else {
                    Some(WarningInstance {
                        failing_element_ids: ids,
                        ..w.clone()
                    })
                }
            })
            .collect()
    }
}

impl Document for MemoryDocument {
    fn title(&self) -> &str {
        &self.title
    }

    fn as_query(&self) -> &dyn ElementQuery {
        self
    }
}

/// Builder for [`MemoryDocument`]
#[derive(Default)]
pub struct MemoryDocumentBuilder {
    title: String,
    elements: Vec<StoredElement>,
    warnings: Vec<WarningInstance>,
    failures: FailureInjection,
}

impl MemoryDocumentBuilder {
    /// Set the document title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add an element (collector order follows insertion order)
    pub fn element(mut self, element: StoredElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Add several elements
    pub fn elements(mut self, elements: impl IntoIterator<Item = StoredElement>) -> Self {
        self.elements.extend(elements);
        self
    }

    /// Add a host warning
    pub fn warning(mut self, warning: WarningInstance) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Make deleting an element fail
    pub fn fail_delete_of(mut self, id: i64) -> Self {
        self.failures.delete.insert(ElementId(id));
        self
    }

    /// Make writing parameters of an element fail
    pub fn fail_set_parameter_of(mut self, id: i64) -> Self {
        self.failures.set_parameter.insert(ElementId(id));
        self
    }

    /// Make moving an element fail
    pub fn fail_move_of(mut self, id: i64) -> Self {
        self.failures.move_element.insert(ElementId(id));
        self
    }

    /// Make changing the geometry of an element fail
    pub fn fail_set_curve_of(mut self, id: i64) -> Self {
        self.failures.set_curve.insert(ElementId(id));
        self
    }

    /// Make every transaction fail to start
    pub fn fail_begin(mut self) -> Self {
        self.failures.begin = true;
        self
    }

    /// Make every commit fail
    pub fn fail_commit(mut self) -> Self {
        self.failures.commit = true;
        self
    }

    /// Build the document, rejecting duplicate ids
    pub fn try_build(self) -> std::result::Result<MemoryDocument, FixtureError> {
        let mut elements = FxHashMap::default();
        let mut order = Vec::with_capacity(self.elements.len());
        for element in self.elements {
            let id = element.id();
            if elements.insert(id, element).is_some() {
                return Err(FixtureError::DuplicateElement(id));
            }
            order.push(id);
        }
        Ok(MemoryDocument {
            title: self.title,
            elements,
            order,
            warnings: self.warnings,
            open: None,
            failures: self.failures,
            log: Vec::new(),
        })
    }

    /// Build the document; a later duplicate id replaces the earlier element
    pub fn build(self) -> MemoryDocument {
        let mut elements: FxHashMap<ElementId, StoredElement> = FxHashMap::default();
        let mut order = Vec::with_capacity(self.elements.len());
        for element in self.elements {
            let id = element.id();
            if elements.insert(id, element).is_none() {
                order.push(id);
            }
        }
        MemoryDocument {
            title: self.title,
            elements,
            order,
            warnings: self.warnings,
            open: None,
            failures: self.failures,
            log: Vec::new(),
        }
    }
}
