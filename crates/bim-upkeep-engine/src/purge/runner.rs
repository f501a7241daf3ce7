// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Purge Runner - deletes unused elements action by action
//!
//! Every action deletes its candidates in one transaction. Deleting a parent
//! type can leave dependent symbols unreferenced, so
//! [`PurgeRunner::purge_to_fixed_point`] repeats the whole run until a pass
//! deletes nothing.
//!
//! [`PurgeRunner::purge_by_delete`] needs no usage analysis at all: it tries
//! to delete every element of an action and keeps only the deletes that
//! take nothing else along.

use super::action::{default_actions, PurgeAction};
use crate::{Outcome, Result, TransactionExecutor, UpkeepError};
use bim_upkeep_model::{Document, ElementEditor, ElementId, ElementQueryExt};
use rustc_hash::FxHashSet;
use std::time::Instant;

/// Purge run configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurgeConfig {
    /// List every deleted element and retry failed bulk deletes one by one
    pub debug: bool,
    /// Upper bound on passes of [`PurgeRunner::purge_to_fixed_point`]
    pub max_passes: usize,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_passes: 10,
        }
    }
}

impl PurgeConfig {
    /// Enable or disable debug reporting
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Set the pass limit (at least one pass always runs)
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.max(1);
        self
    }
}

/// Runs purge actions against a document
pub struct PurgeRunner {
    actions: Vec<PurgeAction>,
    config: PurgeConfig,
}

impl PurgeRunner {
    /// Create a runner with the default configuration
    pub fn new(actions: Vec<PurgeAction>) -> Self {
        Self {
            actions,
            config: PurgeConfig::default(),
        }
    }

    /// Create a runner with the stock action catalogue
    pub fn with_default_actions() -> Self {
        Self::new(default_actions())
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: PurgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an action, run after the existing ones
    pub fn push(&mut self, action: PurgeAction) {
        self.actions.push(action);
    }

    /// Registered actions, in run order
    pub fn actions(&self) -> &[PurgeAction] {
        &self.actions
    }

    /// Current configuration
    pub fn config(&self) -> &PurgeConfig {
        &self.config
    }

    /// Run every action once
    ///
    /// The payload lists every element removed, cascades included.
    pub fn purge_unused(&self, doc: &mut dyn Document) -> Outcome {
        let started = Instant::now();
        let mut outcome = match self.pass(doc) {
            Ok(outcome) => outcome,
            Err(outcome) => outcome,
        };
        outcome.append_message(format!("purge duration: {:.2?}", started.elapsed()));
        outcome
    }

    /// Run every action until a pass deletes nothing
    pub fn purge_to_fixed_point(&self, doc: &mut dyn Document) -> Outcome {
        let started = Instant::now();
        let mut outcome = Outcome::new();

        let mut settled = false;
        for number in 1..=self.config.max_passes {
            let pass = match self.pass(doc) {
                Ok(pass) => pass,
                Err(aborted) => {
                    outcome.update(aborted);
                    settled = true;
                    break;
                }
            };
            if pass.payload.is_empty() {
                outcome.update(pass);
                outcome.append_message(format!("Pass {}: nothing left to purge", number));
                settled = true;
                break;
            }
            log::info!("[Purge] Pass {} removed {} element(s)", number, pass.payload.len());
            let removed = pass.payload.len();
            outcome.update(pass);
            outcome.append_message(format!("Pass {}: {} element(s) removed", number, removed));
        }
        if !settled {
            log::warn!("[Purge] No fixed point after {} pass(es)", self.config.max_passes);
            outcome.append_message(format!(
                "Purge stopped after {} pass(es) without reaching a fixed point",
                self.config.max_passes
            ));
        }

        outcome.append_message(format!("purge duration: {:.2?}", started.elapsed()));
        outcome
    }

    /// One run over every action; `Err` carries the report of an aborted run
    fn pass(&self, doc: &mut dyn Document) -> std::result::Result<Outcome, Outcome> {
        let mut outcome = Outcome::new();
        for action in &self.actions {
            match self.purge_action(doc, action) {
                Ok(action_outcome) => outcome.update(action_outcome),
                Err(e) => {
                    log::error!("[Purge] Aborting: {}", e);
                    outcome.update(Outcome::failure(format!("Purging aborted: {}", e)));
                    return Err(outcome);
                }
            }
        }
        Ok(outcome)
    }

    /// Delete the candidates of one action
    ///
    /// Only a failed transaction begin is returned as an error.
    fn purge_action(&self, doc: &mut dyn Document, action: &PurgeAction) -> Result<Outcome> {
        let started = Instant::now();
        let header = action.report_header();
        let ids = action.candidate_ids(doc.as_query());
        log::debug!("[Purge] {}: {} candidate(s)", action.name(), ids.len());

        let mut outcome = Outcome::new();
        if ids.is_empty() {
            outcome.append_message(format!("{}: 0 Element(s) purged.", header));
        } else {
            let labels: Vec<String> = ids
                .iter()
                .map(|id| format!("{} {}", id, doc.as_query().display_name(*id)))
                .collect();

            let bulk = delete(doc, &action.transaction_name(), &ids)?;
            if bulk.status {
                outcome.append_message(format!("{}: {} Element(s) purged.", header, ids.len()));
                if self.config.debug {
                    for label in &labels {
                        outcome.append_message(label);
                    }
                }
                outcome.update(bulk);
            } else if self.config.debug {
                log::warn!("[Purge] {}: bulk delete failed, retrying one by one", header);
                outcome.update(bulk);
                outcome.update(self.delete_one_by_one(doc, action, &ids, &labels)?);
            } else {
                outcome.update(bulk);
            }
        }

        outcome.append_message(format!("{}: elapsed {:.2?}", header, started.elapsed()));
        Ok(outcome)
    }

    fn delete_one_by_one(
        &self,
        doc: &mut dyn Document,
        action: &PurgeAction,
        ids: &[ElementId],
        labels: &[String],
    ) -> Result<Outcome> {
        let mut outcome = Outcome::new();
        let mut report = Vec::new();
        for (id, label) in ids.iter().zip(labels) {
            // An earlier delete may have taken this one along
            if !doc.as_query().exists(*id) {
                continue;
            }
            let single = delete(doc, &action.transaction_name(), &[*id])?;
            if single.status {
                report.push(label.clone());
                outcome.update(single);
            } else {
                outcome.update(single);
                outcome.append_message(format!("Failed to delete {}", label));
            }
        }
        outcome.append_message(format!(
            "{}: {} Element(s) purged.",
            action.report_header(),
            report.len()
        ));
        for label in report {
            outcome.append_message(label);
        }
        Ok(outcome)
    }

    /// Purge the elements of an action by trying to delete each one
    ///
    /// Every element the action declares is deleted in a dry run first.
    /// Only when the host removes that element and nothing else is the
    /// delete repeated for real, one transaction per element. Elements whose
    /// delete takes others along, or fails, are kept.
    pub fn purge_by_delete(&self, doc: &mut dyn Document, action: &PurgeAction) -> Outcome {
        let started = Instant::now();
        let mut outcome = Outcome::new();
        if let Err(e) = self.delete_and_observe(doc, action, &mut outcome) {
            log::error!("[Purge] Aborting: {}", e);
            outcome.update(Outcome::failure(format!("Purging aborted: {}", e)));
        }
        outcome.append_message(format!("purge duration: {:.2?}", started.elapsed()));
        outcome
    }

    fn delete_and_observe(
        &self,
        doc: &mut dyn Document,
        action: &PurgeAction,
        outcome: &mut Outcome,
    ) -> Result<()> {
        let header = action.report_header();
        let ids = action.verification_ids(doc.as_query());
        if ids.is_empty() {
            outcome.append_message(format!("{}: No elements found to purge", header));
            return Ok(());
        }

        let mut deleted = Vec::new();
        for &id in &ids {
            let name = doc.as_query().display_name(id);
            let label = format!("{} {}", id, name);
            let transaction = format!("Purge element: {}", name);

            let removed = match TransactionExecutor::dry_run(doc, &transaction, |d| {
                Ok(d.delete_elements(&[id])?)
            }) {
                Ok(removed) => removed,
                Err(e @ UpkeepError::TransactionBegin { .. }) => return Err(e),
                Err(e) => {
                    outcome.append_message(format!("{} could not be deleted: {}", label, e));
                    continue;
                }
            };
            if removed != [id] {
                log::debug!("[Purge] Keeping {}: delete removes {:?}", id, removed);
                if self.config.debug {
                    outcome.append_message(format!(
                        "Kept {}: deleting it removes {} element(s)",
                        label,
                        removed.len()
                    ));
                }
                continue;
            }

            let single = delete(doc, &transaction, &[id])?;
            if single.status {
                deleted.push(label);
            } else {
                outcome.append_message(format!("Failed to delete {}", label));
            }
            outcome.update(single);
        }

        outcome.append_message(format!(
            "{}: Deleted {} unused element(s)",
            header,
            deleted.len()
        ));
        for label in deleted {
            outcome.append_message(label);
        }
        outcome.append_message(format!("{}: elements before purge: {}", header, ids.len()));
        outcome.append_message(format!(
            "{}: elements after purge: {}",
            header,
            action.verification_ids(doc.as_query()).len()
        ));
        Ok(())
    }

    /// Compare every action against the host's own purge
    pub fn verify_all<D, F>(&self, doc: &mut D, native_purge: F) -> Outcome
    where
        D: Document + ?Sized,
        F: Fn(&mut D) -> Result<Vec<ElementId>>,
    {
        let mut outcome = Outcome::new();
        for action in &self.actions {
            outcome.update(Self::verify_action(doc, action, &native_purge));
        }
        outcome
    }

    /// Compare what an action deletes with what the host's purge deletes
    ///
    /// Both run as rolled-back dry runs, so the document is left unchanged.
    /// Only the action's verification ids are compared. On a mismatch the
    /// payload holds the ids removed by one side only.
    pub fn verify_action<D, F>(doc: &mut D, action: &PurgeAction, native_purge: F) -> Outcome
    where
        D: Document + ?Sized,
        F: FnOnce(&mut D) -> Result<Vec<ElementId>>,
    {
        match compare(doc, action, native_purge) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::failure(format!(
                "Verification of '{}' failed: {}",
                action.name(),
                e
            )),
        }
    }
}

/// Delete `ids` in one transaction; the payload lists every removed id
fn delete(doc: &mut dyn Document, transaction: &str, ids: &[ElementId]) -> Result<Outcome> {
    TransactionExecutor::try_run(doc, transaction, |d| {
        let removed = d.delete_elements(ids)?;
        Ok(Outcome::new().with_payload(removed))
    })
}

fn compare<D, F>(doc: &mut D, action: &PurgeAction, native_purge: F) -> Result<Outcome>
where
    D: Document + ?Sized,
    F: FnOnce(&mut D) -> Result<Vec<ElementId>>,
{
    let watched = action.verification_ids(doc.as_query());
    let gone = |d: &D| -> FxHashSet<ElementId> {
        watched
            .iter()
            .copied()
            .filter(|id| !d.as_query().exists(*id))
            .collect()
    };

    let by_engine = TransactionExecutor::dry_run(doc, &action.transaction_name(), |d| {
        let ids = action.candidate_ids(d.as_query());
        if !ids.is_empty() {
            d.delete_elements(&ids)?;
        }
        Ok(gone(&*d))
    })?;
    let by_host = TransactionExecutor::dry_run(doc, "Purge unused (host)", |d| {
        native_purge(d)?;
        Ok(gone(&*d))
    })?;

    if by_engine == by_host {
        return Ok(Outcome::success(format!(
            "{}: verified, {} element(s) removed by both",
            action.name(),
            by_engine.len()
        )));
    }

    let mismatch = UpkeepError::VerificationMismatch {
        action: action.name().to_string(),
        engine: by_engine.len(),
        native: by_host.len(),
    };
    log::warn!("[Purge] {}", mismatch);
    let difference: Vec<ElementId> = watched
        .iter()
        .copied()
        .filter(|id| by_engine.contains(id) != by_host.contains(id))
        .collect();
    Ok(Outcome::failure(mismatch.to_string()).with_payload(difference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::purge::{Dependent, PurgeCategory};
    use bim_upkeep_memory::{MemoryDocument, StoredElement};
    use bim_upkeep_model::{Category, ElementClass, ElementQuery, ParameterValue};

    fn walls() -> MemoryDocument {
        MemoryDocument::builder()
            .element(StoredElement::system_type(10, "Generic 100", Category::Walls, "Basic Wall"))
            .element(StoredElement::system_type(11, "Generic 200", Category::Walls, "Basic Wall"))
            .element(StoredElement::system_type(12, "Generic 300", Category::Walls, "Basic Wall"))
            .element(StoredElement::symbol(13, "In-place A", Category::Walls, "In-place Wall"))
            .element(StoredElement::symbol(14, "In-place B", Category::Walls, "In-place Wall"))
            .element(StoredElement::instance(1, "Wall", Category::Walls, 10))
            .element(StoredElement::instance(2, "Wall", Category::Walls, 12))
            .element(StoredElement::instance(3, "Wall", Category::Walls, 13))
            .build()
    }

    fn wall_action() -> PurgeAction {
        PurgeAction::for_category(PurgeCategory::for_category("Wall Type(s)", Category::Walls))
    }

    #[test]
    fn test_purge_unused_deletes_in_one_transaction() {
        let mut doc = walls();
        let outcome = PurgeRunner::new(vec![wall_action()]).purge_unused(&mut doc);

        assert!(outcome.status);
        assert!(outcome.message.contains("Wall Type(s): 2 Element(s) purged."));
        assert!(outcome.message.contains("Wall Type(s): elapsed"));
        assert!(outcome.message.contains("purge duration:"));
        assert!(!outcome.message.contains("In-place B"));
        assert_eq!(outcome.payload, vec![ElementId(11), ElementId(14)]);
        assert_eq!(doc.committed(), vec!["Delete Wall Type(s) where unused"]);
        assert!(doc.stored(ElementId(11)).is_none());
    }

    #[test]
    fn test_debug_lists_elements() {
        let mut doc = walls();
        let outcome = PurgeRunner::new(vec![wall_action()])
            .with_config(PurgeConfig::default().with_debug(true))
            .purge_unused(&mut doc);
        assert!(outcome.status);
        assert!(outcome.lines().any(|l| l == "[id:11] Generic 200"));
        assert!(outcome.lines().any(|l| l == "[id:14] In-place B"));
    }

    #[test]
    fn test_failed_bulk_delete_keeps_everything() {
        let mut doc = walls();
        doc.failures_mut().delete.insert(ElementId(11));
        let outcome = PurgeRunner::new(vec![wall_action()]).purge_unused(&mut doc);
        assert!(!outcome.status);
        assert!(outcome.message.contains("Failed with exception"));
        assert!(outcome.payload.is_empty());
        assert!(doc.stored(ElementId(14)).is_some());
        assert!(doc.committed().is_empty());
    }

    #[test]
    fn test_debug_retries_one_by_one() {
        let mut doc = walls();
        doc.failures_mut().delete.insert(ElementId(11));
        let outcome = PurgeRunner::new(vec![wall_action()])
            .with_config(PurgeConfig::default().with_debug(true))
            .purge_unused(&mut doc);

        assert!(!outcome.status);
        assert!(outcome.message.contains("Failed to delete [id:11] Generic 200"));
        assert!(outcome.message.contains("Wall Type(s): 1 Element(s) purged."));
        assert!(outcome.lines().any(|l| l == "[id:14] In-place B"));
        assert_eq!(outcome.payload, vec![ElementId(14)]);
        assert!(doc.stored(ElementId(11)).is_some());
        assert!(doc.stored(ElementId(14)).is_none());
        assert_eq!(doc.committed(), vec!["Delete Wall Type(s) where unused"]);
    }

    #[test]
    fn test_begin_failure_aborts() {
        let mut doc = walls();
        doc.failures_mut().begin = true;
        let outcome = PurgeRunner::new(vec![wall_action(), wall_action()]).purge_unused(&mut doc);
        assert!(!outcome.status);
        assert!(outcome.message.contains("Purging aborted"));
        assert_eq!(outcome.lines().filter(|l| l.contains("elapsed")).count(), 0);
        assert!(doc.stored(ElementId(11)).is_some());
    }

    /// Arrow heads count as used while any dimension type refers to them
    fn arrow_action() -> PurgeAction {
        fn by_category(query: &dyn ElementQuery, category: Category) -> Vec<ElementId> {
            query
                .elements_by_class(&ElementClass::Type)
                .into_iter()
                .filter(|e| e.category == category)
                .map(|e| e.id)
                .collect()
        }
        PurgeAction::new(
            "Arrow Head Type(s)",
            Box::new(|query| {
                let referenced: FxHashSet<ElementId> = by_category(query, Category::Dimensions)
                    .into_iter()
                    .filter_map(|id| query.parameter(id, "Tick Mark"))
                    .filter_map(|value| value.as_element_id())
                    .collect();
                by_category(query, Category::ArrowHeads)
                    .into_iter()
                    .filter(|id| !referenced.contains(id))
                    .collect()
            }),
            Box::new(|query| by_category(query, Category::ArrowHeads)),
        )
    }

    fn dimensions() -> MemoryDocument {
        MemoryDocument::builder()
            .element(StoredElement::system_type(30, "Filled 30", Category::ArrowHeads, "Arrowhead"))
            .element(StoredElement::system_type(31, "Dot", Category::ArrowHeads, "Arrowhead"))
            .element(StoredElement::system_type(32, "Tick", Category::ArrowHeads, "Arrowhead"))
            .element(
                StoredElement::system_type(20, "Linear 2.5", Category::Dimensions, "Linear")
                    .with_parameter("Tick Mark", ParameterValue::ElementId(ElementId(30))),
            )
            .element(
                StoredElement::system_type(21, "Linear 5", Category::Dimensions, "Linear")
                    .with_parameter("Tick Mark", ParameterValue::ElementId(ElementId(31))),
            )
            .element(StoredElement::instance(1, "Dim", Category::Dimensions, 20))
            .build()
    }

    fn dimension_runner() -> PurgeRunner {
        PurgeRunner::new(vec![
            arrow_action(),
            PurgeAction::for_category(PurgeCategory::for_category(
                "Dimension Type(s)",
                Category::Dimensions,
            )),
        ])
    }

    #[test]
    fn test_fixed_point_reaches_freed_dependents() {
        let mut doc = dimensions();
        let outcome = dimension_runner().purge_to_fixed_point(&mut doc);

        assert!(outcome.status);
        assert!(outcome.message.contains("Pass 1: 2 element(s) removed"));
        assert!(outcome.message.contains("Pass 2: 1 element(s) removed"));
        assert!(outcome.message.contains("Pass 3: nothing left to purge"));
        assert_eq!(
            outcome.payload,
            vec![ElementId(32), ElementId(21), ElementId(31)]
        );
        assert!(doc.stored(ElementId(30)).is_some());
        assert!(doc.stored(ElementId(20)).is_some());
    }

    #[test]
    fn test_fixed_point_respects_pass_limit() {
        let mut doc = dimensions();
        let outcome = dimension_runner()
            .with_config(PurgeConfig::default().with_max_passes(1))
            .purge_to_fixed_point(&mut doc);
        assert!(outcome.status);
        assert!(outcome.message.contains("without reaching a fixed point"));
        assert!(doc.stored(ElementId(31)).is_some());
    }

    #[test]
    fn test_purge_by_delete_keeps_elements_that_take_others_along() {
        let mut doc = walls();
        let outcome = PurgeRunner::new(Vec::new())
            .with_config(PurgeConfig::default().with_debug(true))
            .purge_by_delete(&mut doc, &wall_action());

        assert!(outcome.status, "{}", outcome);
        // 10, 12 and 13 are placed, so deleting them also removes a wall
        assert_eq!(outcome.payload, vec![ElementId(14), ElementId(11)]);
        assert!(outcome.message.contains("Wall Type(s): Deleted 2 unused element(s)"));
        assert!(outcome
            .message
            .contains("Kept [id:10] Generic 100: deleting it removes 2 element(s)"));
        assert!(outcome.message.contains("Wall Type(s): elements before purge: 5"));
        assert!(outcome.message.contains("Wall Type(s): elements after purge: 3"));
        assert_eq!(
            doc.committed(),
            vec!["Purge element: In-place B", "Purge element: Generic 200"]
        );
        assert!(doc.stored(ElementId(1)).is_some());
        assert!(doc.stored(ElementId(13)).is_some());
    }

    #[test]
    fn test_purge_by_delete_keeps_tagged_owner() {
        let mut doc = MemoryDocument::builder()
            .element(StoredElement::symbol(20, "Chair", Category::Furniture, "Chair"))
            .element(StoredElement::symbol(21, "Desk", Category::Furniture, "Desk"))
            .element(StoredElement::instance(5, "Tag", Category::Tags, 90).owned_by(20))
            .build();
        let action = PurgeAction::for_category(PurgeCategory::for_category(
            "Furniture Type(s)",
            Category::Furniture,
        ));
        let outcome = PurgeRunner::new(Vec::new()).purge_by_delete(&mut doc, &action);

        assert!(outcome.status);
        assert_eq!(outcome.payload, vec![ElementId(21)]);
        assert!(!outcome.message.contains("Kept"));
        assert!(doc.stored(ElementId(20)).is_some());
        assert!(doc.stored(ElementId(5)).is_some());
    }

    #[test]
    fn test_purge_by_delete_reports_failed_delete() {
        let mut doc = walls();
        doc.failures_mut().delete.insert(ElementId(11));
        let outcome = PurgeRunner::new(Vec::new()).purge_by_delete(&mut doc, &wall_action());

        assert!(outcome.message.contains("[id:11] Generic 200 could not be deleted"));
        assert_eq!(outcome.payload, vec![ElementId(14)]);
        assert!(doc.stored(ElementId(11)).is_some());
    }

    #[test]
    fn test_purge_by_delete_aborts_on_begin_failure() {
        let mut doc = walls();
        doc.failures_mut().begin = true;
        let outcome = PurgeRunner::new(Vec::new()).purge_by_delete(&mut doc, &wall_action());
        assert!(!outcome.status);
        assert!(outcome.message.contains("Purging aborted"));
        assert!(!outcome.message.contains("elements before purge"));
        assert_eq!(doc.len(), 8);
    }

    #[test]
    fn test_purge_by_delete_without_elements() {
        let mut doc = walls();
        let action = PurgeAction::for_category(PurgeCategory::for_category(
            "Roof Type(s)",
            Category::Roofs,
        ));
        let outcome = PurgeRunner::new(Vec::new()).purge_by_delete(&mut doc, &action);
        assert!(outcome.status);
        assert!(outcome.message.contains("Roof Type(s): No elements found to purge"));
    }

    #[test]
    fn test_default_actions_on_mixed_model() {
        let group_type = |id: i64, name: &str| {
            StoredElement::new(bim_upkeep_model::ElementInfo::new(
                ElementId(id),
                name,
                Category::ModelGroups,
                ElementClass::GroupType,
            ))
        };
        let mut doc = MemoryDocument::builder()
            .element(StoredElement::system_type(10, "Generic 100", Category::Walls, "Basic Wall"))
            .element(StoredElement::system_type(11, "Generic 200", Category::Walls, "Basic Wall"))
            .element(StoredElement::instance(1, "Wall", Category::Walls, 10))
            .element(StoredElement::system_type(20, "Slab A", Category::Floors, "Floor"))
            .element(StoredElement::system_type(21, "Slab B", Category::Floors, "Floor"))
            .element(group_type(40, "Group A"))
            .element(group_type(42, "Group B"))
            .element(StoredElement::instance(41, "Group A", Category::ModelGroups, 40))
            .element(StoredElement::system_type(60, "Filled 30", Category::ArrowHeads, "Arrowhead"))
            .element(StoredElement::system_type(61, "Dot", Category::ArrowHeads, "Arrowhead"))
            .element(
                StoredElement::system_type(50, "Linear 2.5", Category::Dimensions, "Linear")
                    .with_parameter("Tick Mark", ParameterValue::ElementId(ElementId(60))),
            )
            .element(
                StoredElement::system_type(51, "Linear 5", Category::Dimensions, "Linear")
                    .with_parameter("Tick Mark", ParameterValue::ElementId(ElementId(61))),
            )
            .element(StoredElement::instance(2, "Dim", Category::Dimensions, 50))
            .element(StoredElement::symbol(70, "Target", Category::SpotElevationSymbols, "Target"))
            .element(StoredElement::symbol(80, "North", Category::GenericAnnotation, "North"))
            .element(StoredElement::instance(3, "North", Category::GenericAnnotation, 80))
            .build();

        let runner = PurgeRunner::with_default_actions();
        assert_eq!(runner.actions().len(), 10);
        let outcome = runner.purge_to_fixed_point(&mut doc);

        assert!(outcome.status, "{}", outcome);
        for gone in [11, 21, 42, 51, 61, 70] {
            assert!(doc.stored(ElementId(gone)).is_none(), "{} survived", gone);
        }
        for kept in [10, 20, 40, 50, 60, 80] {
            assert!(doc.stored(ElementId(kept)).is_some(), "{} purged", kept);
        }
        assert!(outcome.message.contains("Stair Type(s): 0 Element(s) purged."));
    }

    #[test]
    fn test_verification_matches_host_purge() {
        let mut doc = walls();
        let outcome = PurgeRunner::verify_action(&mut doc, &wall_action(), |d: &mut MemoryDocument| {
            Ok(d.purge_unused_types()?)
        });
        assert!(outcome.status, "{}", outcome);
        assert_eq!(outcome.message, "Wall Type(s): verified, 2 element(s) removed by both");
        // Dry runs never keep changes
        assert_eq!(doc.len(), 8);
        assert!(doc.committed().is_empty());
    }

    #[test]
    fn test_verification_mismatch_is_reported() {
        // The host keeps one type per system family; this action does not
        let mut doc = MemoryDocument::builder()
            .element(StoredElement::system_type(10, "A", Category::Floors, "Floor"))
            .element(StoredElement::system_type(11, "B", Category::Floors, "Floor"))
            .build();
        let runner = PurgeRunner::new(vec![PurgeAction::for_category(
            PurgeCategory::for_category("Floor Type(s)", Category::Floors),
        )]);
        let outcome = runner.verify_all(&mut doc, |d: &mut MemoryDocument| {
            Ok(d.purge_unused_types()?)
        });

        assert!(!outcome.status);
        assert_eq!(
            outcome.message,
            "Purge verification failed for 'Floor Type(s)': engine removed 2 element(s), host purge removed 1"
        );
        assert_eq!(outcome.payload, vec![ElementId(10)]);
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_verification_with_dependents() {
        let mut doc = MemoryDocument::builder()
            .element(StoredElement::system_type(30, "Filled 30", Category::ArrowHeads, "Arrowhead"))
            .element(StoredElement::system_type(31, "Dot", Category::ArrowHeads, "Arrowhead"))
            .element(
                StoredElement::system_type(20, "Linear 2.5", Category::Dimensions, "Linear")
                    .with_parameter("Tick Mark", ParameterValue::ElementId(ElementId(30))),
            )
            .element(StoredElement::instance(1, "Dim", Category::Dimensions, 20))
            .build();
        let action = PurgeAction::for_category(
            PurgeCategory::for_category("Dimension Type(s)", Category::Dimensions).dependent(
                Dependent::new(
                    PurgeCategory::for_category("Arrow Head Type(s)", Category::ArrowHeads),
                    &["Tick Mark"],
                ),
            ),
        );
        let outcome = PurgeRunner::verify_action(&mut doc, &action, |d: &mut MemoryDocument| {
            Ok(d.purge_unused_types()?)
        });
        assert!(outcome.status, "{}", outcome);
        assert!(outcome.message.contains("1 element(s) removed by both"));
    }
}
