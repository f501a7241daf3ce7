// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Purge actions - one purgeable category each

use super::engine::{Dependent, PurgeCategory, PurgeEngine};
use bim_upkeep_model::{Category, ElementId, ElementQuery};
use std::sync::Arc;

/// Parameters of dimension types referring to arrow heads
const ARROW_HEAD_PARAMETERS: [&str; 3] = ["Tick Mark", "Leader Arrowhead", "Centerline Tick Mark"];

/// Id getter: a query against the document
pub type IdGetter = Box<dyn Fn(&dyn ElementQuery) -> Vec<ElementId> + Send + Sync>;

/// Declarative description of one purgeable category
pub struct PurgeAction {
    name: String,
    report_header: String,
    candidates: IdGetter,
    verification: IdGetter,
}

impl PurgeAction {
    /// Create an action
    ///
    /// # Arguments
    /// * `name` - Category name used in transaction names and reports
    /// * `candidates` - Ids the engine deletes
    /// * `verification` - Ids compared against the host's own purge
    pub fn new(name: impl Into<String>, candidates: IdGetter, verification: IdGetter) -> Self {
        let name = name.into();
        Self {
            report_header: name.clone(),
            name,
            candidates,
            verification,
        }
    }

    /// Action deleting the unused types of a category and its dependents
    pub fn for_category(category: PurgeCategory) -> Self {
        let category = Arc::new(category);
        let name = category.name().to_string();
        let unused = Arc::clone(&category);
        Self::new(
            name,
            Box::new(move |query| PurgeEngine::unused_ids(query, &unused)),
            Box::new(move |query| category.declared_ids(query)),
        )
    }

    /// Use a different header in purge reports
    pub fn with_report_header(mut self, header: impl Into<String>) -> Self {
        self.report_header = header.into();
        self
    }

    /// Category name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Header of report lines
    pub fn report_header(&self) -> &str {
        &self.report_header
    }

    /// Name of the deleting transaction
    pub fn transaction_name(&self) -> String {
        format!("Delete {} where unused", self.name)
    }

    /// Ids the engine would delete right now
    pub fn candidate_ids(&self, query: &dyn ElementQuery) -> Vec<ElementId> {
        (self.candidates)(query)
    }

    /// Ids checked during verification
    pub fn verification_ids(&self, query: &dyn ElementQuery) -> Vec<ElementId> {
        (self.verification)(query)
    }
}

/// The stock purge catalogue, in run order
///
/// Groups go first, since deleting a group definition frees the types its
/// members used. System family types keep one type per family.
pub fn default_actions() -> Vec<PurgeAction> {
    let system = |name: &str, category: Category| {
        PurgeAction::for_category(
            PurgeCategory::for_category(name, category).retain_one_per_family(true),
        )
    };

    vec![
        PurgeAction::for_category(PurgeCategory::for_category(
            "Model Group(s)",
            Category::ModelGroups,
        )),
        PurgeAction::for_category(PurgeCategory::for_category(
            "Detail Group(s)",
            Category::DetailGroups,
        )),
        system("Wall Type(s)", Category::Walls),
        system("Ceiling Type(s)", Category::Ceilings),
        system("Floor Type(s)", Category::Floors),
        system("Roof Type(s)", Category::Roofs),
        system("Stair Type(s)", Category::Stairs),
        PurgeAction::for_category(
            PurgeCategory::for_category("Dimension Type(s)", Category::Dimensions)
                .retain_one_per_family(true)
                .dependent(Dependent::new(
                    PurgeCategory::for_category("Arrow Head Type(s)", Category::ArrowHeads)
                        .retain_one_per_family(true),
                    &ARROW_HEAD_PARAMETERS,
                )),
        ),
        PurgeAction::for_category(PurgeCategory::for_category(
            "Spot Elevation Symbol(s)",
            Category::SpotElevationSymbols,
        )),
        PurgeAction::for_category(PurgeCategory::for_category(
            "Generic Annotation Type(s)",
            Category::GenericAnnotation,
        )),
    ]
}

impl std::fmt::Debug for PurgeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurgeAction")
            .field("name", &self.name)
            .field("report_header", &self.report_header)
            .finish_non_exhaustive()
    }
}
