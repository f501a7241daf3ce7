// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solver Registry - dispatch of host warnings to solvers
//!
//! Routes every warning to the solver registered for its type GUID. Each
//! failing element is resolved in its own transaction, so one bad element
//! cannot block the rest of the model. Solvers working on pairs of elements
//! get one transaction per group of related elements instead.

use super::grouping::{group_by_relation, warnings_by_guid};
use crate::filter::ElementFilter;
use crate::{Outcome, ProgressCallback, Result, TransactionExecutor, UpkeepError};
use bim_upkeep_model::{
    Document, ElementId, ElementQueryExt, WarningGuid, WarningInstance, WarningSource,
};
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Message appended when a run is cancelled
pub const CANCELLED: &str = "User cancelled!";

/// Warning solver trait
///
/// A solver fixes one element implicated by a warning of its type. Solvers
/// never open transactions themselves; the registry wraps every `resolve`
/// call in one.
pub trait WarningSolver: Send + Sync {
    /// Warning type handled by this solver
    fn guid(&self) -> &WarningGuid;

    /// Human readable name used in report messages
    fn name(&self) -> &str;

    /// Elements failing this filter are left untouched
    fn filter(&self) -> Option<&dyn ElementFilter> {
        None
    }

    /// Whether this warning instance should be solved at all
    fn accepts(&self, _warning: &WarningInstance) -> bool {
        true
    }

    /// Name of the transaction wrapping `resolve`
    fn transaction_name(&self) -> String {
        format!("Solving warning: {}", self.name())
    }

    /// Fix one element
    ///
    /// # Arguments
    /// * `doc` - The document, with a transaction already open
    /// * `id` - A failing element of the warning
    fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome>;

    /// Whether warnings of this type implicate pairs of elements that must
    /// be fixed together
    ///
    /// When true, the registry joins elements linked by a chain of warnings
    /// into groups and calls [`resolve_related`](Self::resolve_related)
    /// once per group.
    fn solves_related_groups(&self) -> bool {
        false
    }

    /// Fix a group of related elements inside one transaction
    ///
    /// Defaults to resolving each element on its own.
    fn resolve_related(&self, doc: &mut dyn Document, ids: &[ElementId]) -> Result<Outcome> {
        let mut outcome = Outcome::new();
        for &id in ids {
            outcome.update(self.resolve(doc, id)?);
        }
        Ok(outcome)
    }
}

/// Solver registry - routes warnings to solvers
pub struct SolverRegistry {
    /// Registered solvers by warning type
    solvers: FxHashMap<WarningGuid, Arc<dyn WarningSolver>>,
    /// Registration order, for stable reports
    order: Vec<WarningGuid>,
    /// Set from outside to stop a run between transactions
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for SolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverRegistry {
    /// Create a registry without any solvers
    pub fn new() -> Self {
        Self {
            solvers: FxHashMap::default(),
            order: Vec::new(),
            cancel: None,
        }
    }

    /// Stop runs as soon as `flag` is set
    ///
    /// The flag is checked before every transaction, so a change in
    /// progress always completes or rolls back first.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Create a registry with the stock solvers registered
    ///
    /// Registers:
    /// - `TagOutsideOwnerSolver`
    /// - `DuplicateMarkSolver` (no element excluded)
    /// - `SeparationLinesOverlapSolver` for area and room separation lines
    pub fn with_default_solvers() -> Self {
        use super::{DuplicateMarkSolver, SeparationLinesOverlapSolver, TagOutsideOwnerSolver};
        use crate::filter::always_true;

        let mut registry = Self::new();
        registry.insert(Arc::new(TagOutsideOwnerSolver::new()));
        registry.insert(Arc::new(DuplicateMarkSolver::new(always_true())));
        registry.insert(Arc::new(SeparationLinesOverlapSolver::area()));
        registry.insert(Arc::new(SeparationLinesOverlapSolver::room()));
        registry
    }

    /// Register a solver
    ///
    /// Fails if a solver for the same warning type is already registered;
    /// use [`replace`](Self::replace) to swap one out.
    pub fn register(&mut self, solver: Arc<dyn WarningSolver>) -> Result<()> {
        if self.solvers.contains_key(solver.guid()) {
            return Err(UpkeepError::DuplicateSolver(solver.guid().clone()));
        }
        self.insert(solver);
        Ok(())
    }

    /// Register a solver, returning the one it replaces
    pub fn replace(&mut self, solver: Arc<dyn WarningSolver>) -> Option<Arc<dyn WarningSolver>> {
        let previous = self.solvers.remove(solver.guid());
        if let Some(old) = &previous {
            log::info!(
                "[Solver] Replacing '{}' with '{}' for {}",
                old.name(),
                solver.name(),
                solver.guid()
            );
        }
        self.insert(solver);
        previous
    }

    fn insert(&mut self, solver: Arc<dyn WarningSolver>) {
        let guid = solver.guid().clone();
        if !self.order.contains(&guid) {
            self.order.push(guid.clone());
        }
        self.solvers.insert(guid, solver);
    }

    /// Check if a warning type has a registered solver
    pub fn has_solver(&self, guid: &WarningGuid) -> bool {
        self.solvers.contains_key(guid)
    }

    /// Get the solver for a warning type
    pub fn solver(&self, guid: &WarningGuid) -> Option<&Arc<dyn WarningSolver>> {
        self.solvers.get(guid)
    }

    /// Number of registered solvers
    pub fn len(&self) -> usize {
        self.solvers.len()
    }

    /// Check whether no solver is registered
    pub fn is_empty(&self) -> bool {
        self.solvers.is_empty()
    }

    /// Solve every warning the document currently reports
    pub fn solve_model(&self, doc: &mut dyn Document) -> Outcome {
        let warnings = doc.warnings();
        self.solve_all(doc, &warnings)
    }

    /// Solve the given warnings
    ///
    /// Warnings without a registered solver are skipped with a note. A
    /// transaction that cannot be started stops the run, and so does the
    /// cancel flag.
    pub fn solve_all(&self, doc: &mut dyn Document, warnings: &[WarningInstance]) -> Outcome {
        self.solve(doc, warnings, &|_, _| {})
    }

    /// Solve the given warnings, reporting progress per warning type
    pub fn solve_all_with_progress(
        &self,
        doc: &mut dyn Document,
        warnings: &[WarningInstance],
        on_progress: ProgressCallback,
    ) -> Outcome {
        let outcome = self.solve(doc, warnings, &*on_progress);
        on_progress("Done", 100.0);
        outcome
    }

    fn solve(
        &self,
        doc: &mut dyn Document,
        warnings: &[WarningInstance],
        on_progress: &dyn Fn(&str, f32),
    ) -> Outcome {
        let mut outcome = Outcome::new();
        let groups = warnings_by_guid(warnings);
        let total = groups.len().max(1) as f32;

        for (index, (guid, group)) in groups.iter().enumerate() {
            if self.is_cancelled() {
                outcome.append_message(CANCELLED);
                return outcome;
            }
            on_progress(guid.as_str(), index as f32 / total * 100.0);

            let Some(solver) = self.solvers.get(guid) else {
                log::info!("[Solver] No solver for {}", guid);
                outcome.append_message(format!(
                    "{} ({} warning(s) skipped)",
                    UpkeepError::UnregisteredWarningType(guid.clone()),
                    group.len()
                ));
                continue;
            };

            match self.solve_group(doc, solver.as_ref(), group) {
                Ok(group_outcome) => outcome.update(group_outcome),
                Err(e) => {
                    log::error!("[Solver] Aborting: {}", e);
                    outcome.update(Outcome::failure(format!(
                        "Solving warnings aborted: {}",
                        e
                    )));
                    return outcome;
                }
            }
            if self.is_cancelled() {
                return outcome;
            }
        }

        for guid in &self.order {
            if groups.iter().any(|(g, _)| g == guid) {
                continue;
            }
            if let Some(solver) = self.solvers.get(guid) {
                let mut note = Outcome::new();
                note.update_sep(true, format!("No warnings of type: {} in model.", solver.name()));
                outcome.update(note);
            }
        }

        outcome
    }

    /// Resolve every element of one warning type
    ///
    /// Only a failed transaction begin is returned as an error. On
    /// cancellation the group stops early with a note.
    fn solve_group(
        &self,
        doc: &mut dyn Document,
        solver: &dyn WarningSolver,
        group: &[&WarningInstance],
    ) -> Result<Outcome> {
        let mut outcome = Outcome::new();
        let mut accepted = Vec::with_capacity(group.len());
        for warning in group {
            if solver.accepts(warning) {
                accepted.push((*warning).clone());
            } else {
                outcome.append_message(format!(
                    "{}: Warning of type: {} will be ignored.",
                    solver.name(),
                    warning.description
                ));
            }
        }

        // Every unit of work runs in its own transaction
        let units: Vec<Vec<ElementId>> = if solver.solves_related_groups() {
            group_by_relation(&accepted, solver.guid())
                .into_values()
                .collect()
        } else {
            accepted
                .iter()
                .flat_map(|w| w.failing_element_ids.iter().map(|&id| vec![id]))
                .collect()
        };

        let mut processed = 0usize;
        for unit in units {
            if self.is_cancelled() {
                log::info!("[Solver] {} cancelled", solver.name());
                outcome.append_message(CANCELLED);
                break;
            }

            let mut ids = Vec::with_capacity(unit.len());
            for id in unit {
                if let Some(filter) = solver.filter() {
                    if !filter.evaluate(doc.as_query(), id) {
                        let mut note = Outcome::new();
                        note.update_sep(
                            true,
                            format!(
                                "{}: Element removed by filter: {} {}",
                                solver.name(),
                                doc.as_query().display_name(id),
                                id
                            ),
                        );
                        outcome.update(note);
                        continue;
                    }
                }
                ids.push(id);
            }

            if ids.is_empty() {
                continue;
            }
            let resolved = TransactionExecutor::try_run(doc, &solver.transaction_name(), |d| {
                match ids.as_slice() {
                    [id] if !solver.solves_related_groups() => solver.resolve(d, *id),
                    _ => solver.resolve_related(d, &ids),
                }
            })?;
            if !resolved.status {
                log::warn!("[Solver] {} failed on {:?}", solver.name(), ids);
            }
            processed += ids.len();
            outcome.update(resolved);
        }

        log::debug!("[Solver] {} processed {} element(s)", solver.name(), processed);
        outcome.append_message(format!(
            "{}: processed {} element(s)",
            solver.name(),
            processed
        ));
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bim_upkeep_memory::{MemoryDocument, StoredElement};
    use bim_upkeep_model::{Category, ElementEditor, ElementQuery, ParameterValue};
    use std::sync::Mutex;

    /// Clears "Comments"; fails on elements without that parameter
    struct ClearComments {
        guid: WarningGuid,
    }

    impl WarningSolver for ClearComments {
        fn guid(&self) -> &WarningGuid {
            &self.guid
        }

        fn name(&self) -> &str {
            "Clear comments"
        }

        fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
            doc.set_parameter(id, "Comments", ParameterValue::Text(String::new()))?;
            Ok(Outcome::success(format!("Cleared comments on {}", id)))
        }
    }

    fn clear_comments(guid: &str) -> Arc<dyn WarningSolver> {
        Arc::new(ClearComments {
            guid: WarningGuid::new(guid),
        })
    }

    fn doc() -> MemoryDocument {
        MemoryDocument::builder()
            .element(
                StoredElement::instance(1, "Wall A", Category::Walls, 10)
                    .with_parameter("Comments", ParameterValue::Text("x".into())),
            )
            .element(StoredElement::instance(2, "Wall B", Category::Walls, 10))
            .element(
                StoredElement::instance(3, "Wall C", Category::Walls, 10)
                    .with_parameter("Comments", ParameterValue::Text("y".into())),
            )
            .build()
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = SolverRegistry::new();
        registry.register(clear_comments("aaa")).unwrap();
        let err = registry.register(clear_comments("AAA")).unwrap_err();
        assert!(matches!(err, UpkeepError::DuplicateSolver(_)));
        assert_eq!(registry.len(), 1);

        let previous = registry.replace(clear_comments("aaa"));
        assert!(previous.is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_one_failure_does_not_block_next_element() {
        let mut doc = doc();
        let mut registry = SolverRegistry::new();
        registry.register(clear_comments("aaa")).unwrap();

        // Element 2 has no "Comments" parameter, so its resolution fails
        let warnings = vec![
            WarningInstance::new("aaa", "first", vec![ElementId(2)]),
            WarningInstance::new("aaa", "second", vec![ElementId(3)]),
        ];
        let outcome = registry.solve_all(&mut doc, &warnings);

        assert!(!outcome.status);
        assert!(outcome.message.contains("Failed with exception"));
        assert!(outcome.message.contains("Cleared comments on [id:3]"));
        assert!(outcome.message.contains("processed 2 element(s)"));
        assert_eq!(
            doc.parameter(ElementId(3), "Comments"),
            Some(ParameterValue::Text(String::new()))
        );
    }

    #[test]
    fn test_unregistered_type_is_skipped() {
        let mut doc = doc();
        let registry = SolverRegistry::new();
        let warnings = vec![
            WarningInstance::new("zzz", "", vec![ElementId(1)]),
            WarningInstance::new("zzz", "", vec![ElementId(3)]),
        ];
        let outcome = registry.solve_all(&mut doc, &warnings);
        assert!(outcome.status);
        assert_eq!(
            outcome.message,
            "No solver registered for warning type: zzz (2 warning(s) skipped)"
        );
    }

    #[test]
    fn test_registered_type_without_warnings_is_noted() {
        let mut doc = doc();
        let mut registry = SolverRegistry::new();
        registry.register(clear_comments("aaa")).unwrap();
        let outcome = registry.solve_all(&mut doc, &[]);
        assert!(outcome.status);
        assert_eq!(outcome.message, "No warnings of type: Clear comments in model.");
    }

    #[test]
    fn test_filter_exclusion_is_success() {
        struct OnlyWallA(ClearComments, crate::filter::PredicateFilter<String>);
        impl WarningSolver for OnlyWallA {
            fn guid(&self) -> &WarningGuid {
                self.0.guid()
            }
            fn name(&self) -> &str {
                self.0.name()
            }
            fn filter(&self) -> Option<&dyn ElementFilter> {
                Some(&self.1)
            }
            fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
                self.0.resolve(doc, id)
            }
        }

        let mut doc = doc();
        let mut registry = SolverRegistry::new();
        registry
            .register(Arc::new(OnlyWallA(
                ClearComments {
                    guid: WarningGuid::new("aaa"),
                },
                crate::filter::name_contains_any(vec!["Wall A".into()]),
            )))
            .unwrap();

        let warnings = vec![WarningInstance::new("aaa", "", vec![ElementId(2), ElementId(1)])];
        let outcome = registry.solve_all(&mut doc, &warnings);

        assert!(outcome.status);
        assert!(outcome
            .message
            .contains("Clear comments: Element removed by filter: Wall B [id:2]"));
        assert_eq!(
            doc.parameter(ElementId(1), "Comments"),
            Some(ParameterValue::Text(String::new()))
        );
    }

    #[test]
    fn test_begin_failure_aborts_run() {
        let mut doc = MemoryDocument::builder()
            .element(StoredElement::instance(1, "Wall A", Category::Walls, 10))
            .fail_begin()
            .build();
        let mut registry = SolverRegistry::new();
        registry.register(clear_comments("aaa")).unwrap();
        registry.register(clear_comments("bbb")).unwrap();

        let warnings = vec![
            WarningInstance::new("aaa", "", vec![ElementId(1)]),
            WarningInstance::new("bbb", "", vec![ElementId(1)]),
        ];
        let outcome = registry.solve_all(&mut doc, &warnings);
        assert!(!outcome.status);
        assert!(outcome.message.contains("Solving warnings aborted"));
        assert!(!outcome.message.contains("bbb"));
    }

    #[test]
    fn test_progress_reports_each_group() {
        let mut doc = doc();
        let registry = SolverRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let warnings = vec![
            WarningInstance::new("aaa", "", vec![ElementId(1)]),
            WarningInstance::new("bbb", "", vec![ElementId(1)]),
        ];
        registry.solve_all_with_progress(
            &mut doc,
            &warnings,
            Box::new(move |phase, pct| {
                if let Ok(mut seen) = sink.lock() {
                    seen.push((phase.to_string(), pct));
                }
            }),
        );
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0], ("aaa".to_string(), 0.0));
        assert_eq!(seen[1], ("bbb".to_string(), 50.0));
        assert_eq!(seen[2], ("Done".to_string(), 100.0));
    }

    #[test]
    fn test_cancel_stops_between_transactions() {
        /// Clears comments and asks for cancellation after the first element
        struct ClearThenCancel(ClearComments, Arc<AtomicBool>);
        impl WarningSolver for ClearThenCancel {
            fn guid(&self) -> &WarningGuid {
                self.0.guid()
            }
            fn name(&self) -> &str {
                self.0.name()
            }
            fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
                let outcome = self.0.resolve(doc, id);
                self.1.store(true, Ordering::Relaxed);
                outcome
            }
        }

        let flag = Arc::new(AtomicBool::new(false));
        let mut doc = doc();
        let mut registry = SolverRegistry::new().with_cancel_flag(Arc::clone(&flag));
        registry
            .register(Arc::new(ClearThenCancel(
                ClearComments {
                    guid: WarningGuid::new("aaa"),
                },
                Arc::clone(&flag),
            )))
            .unwrap();
        registry.register(clear_comments("bbb")).unwrap();

        let warnings = vec![
            WarningInstance::new("aaa", "", vec![ElementId(1), ElementId(3)]),
            WarningInstance::new("bbb", "", vec![ElementId(3)]),
        ];
        let outcome = registry.solve_all(&mut doc, &warnings);

        assert!(outcome.status, "{}", outcome);
        assert!(outcome.message.contains(CANCELLED));
        assert!(outcome.message.contains("processed 1 element(s)"));
        assert!(!outcome.message.contains("No warnings of type"));
        assert_eq!(doc.committed().len(), 1);
        assert_eq!(
            doc.parameter(ElementId(3), "Comments"),
            Some(ParameterValue::Text("y".into()))
        );
    }

    #[test]
    fn test_cancelled_before_start_touches_nothing() {
        let mut doc = doc();
        let mut registry =
            SolverRegistry::new().with_cancel_flag(Arc::new(AtomicBool::new(true)));
        registry.register(clear_comments("aaa")).unwrap();
        let warnings = vec![WarningInstance::new("aaa", "", vec![ElementId(1)])];
        let outcome = registry.solve_all(&mut doc, &warnings);
        assert_eq!(outcome.message, CANCELLED);
        assert!(doc.transaction_log().is_empty());
    }

    #[test]
    fn test_related_elements_share_one_transaction() {
        struct RecordGroups(WarningGuid, Mutex<Vec<Vec<ElementId>>>);
        impl WarningSolver for RecordGroups {
            fn guid(&self) -> &WarningGuid {
                &self.0
            }
            fn name(&self) -> &str {
                "Record groups"
            }
            fn solves_related_groups(&self) -> bool {
                true
            }
            fn resolve(&self, _doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
                Ok(Outcome::failure(format!("{} resolved alone", id)))
            }
            fn resolve_related(
                &self,
                _doc: &mut dyn Document,
                ids: &[ElementId],
            ) -> Result<Outcome> {
                if let Ok(mut seen) = self.1.lock() {
                    seen.push(ids.to_vec());
                }
                Ok(Outcome::success(format!("{} related element(s)", ids.len())))
            }
        }

        let solver = Arc::new(RecordGroups(WarningGuid::new("aaa"), Mutex::new(Vec::new())));
        let mut registry = SolverRegistry::new();
        registry.register(solver.clone()).unwrap();
        let mut doc = doc();
        let warnings = vec![
            WarningInstance::new("aaa", "", vec![ElementId(3), ElementId(2)]),
            WarningInstance::new("aaa", "", vec![ElementId(5), ElementId(4)]),
            WarningInstance::new("aaa", "", vec![ElementId(1), ElementId(2)]),
        ];
        let outcome = registry.solve_all(&mut doc, &warnings);

        assert!(outcome.status, "{}", outcome);
        assert!(outcome.message.contains("processed 5 element(s)"));
        assert_eq!(doc.committed().len(), 2);
        let seen = solver.1.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                vec![ElementId(1), ElementId(2), ElementId(3)],
                vec![ElementId(4), ElementId(5)],
            ]
        );
    }

    #[test]
    fn test_solve_model_reads_host_warnings() {
        let mut doc = MemoryDocument::builder()
            .element(
                StoredElement::instance(1, "Wall A", Category::Walls, 10)
                    .with_parameter("Comments", ParameterValue::Text("x".into())),
            )
            .warning(WarningInstance::new("aaa", "", vec![ElementId(1)]))
            .build();
        let mut registry = SolverRegistry::new();
        registry.register(clear_comments("aaa")).unwrap();
        let outcome = registry.solve_model(&mut doc);
        assert!(outcome.status);
        assert!(outcome.message.contains("Cleared comments on [id:1]"));
    }
}
