// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solver for tags placed away from the element they annotate
//!
//! Moves the tag by the vector between its anchor point and its owner's
//! anchor point.

use super::WarningSolver;
use crate::{Outcome, Result, UpkeepError};
use bim_upkeep_model::{
    warning::guids, Document, ElementEditor, ElementId, ElementQuery, ElementQueryExt,
    WarningGuid, Xyz,
};
use nalgebra::{Point3, Vector3};

/// Distances below this are treated as "already on the owner"
const TOLERANCE: f64 = 1e-9;

/// Moves tags back onto their owners
pub struct TagOutsideOwnerSolver {
    guid: WarningGuid,
}

impl Default for TagOutsideOwnerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TagOutsideOwnerSolver {
    /// Create a solver for the host's stock warning type
    pub fn new() -> Self {
        Self {
            guid: WarningGuid::new(guids::TAG_OUTSIDE_OF_OWNER),
        }
    }

    /// Handle a different warning type
    pub fn with_guid(mut self, guid: impl Into<WarningGuid>) -> Self {
        self.guid = guid.into();
        self
    }
}

fn point(xyz: Xyz) -> Point3<f64> {
    Point3::new(xyz.x, xyz.y, xyz.z)
}

fn to_xyz(v: &Vector3<f64>) -> Xyz {
    Xyz::new(v.x, v.y, v.z)
}

impl WarningSolver for TagOutsideOwnerSolver {
    fn guid(&self) -> &WarningGuid {
        &self.guid
    }

    fn name(&self) -> &str {
        "Tag outside of owner"
    }

    fn transaction_name(&self) -> String {
        "Moving tag onto owner".to_string()
    }

    fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
        let tag = doc.as_query().element_or_err(id)?;
        let Some(owner_id) = tag.owner_id else {
            return Ok(Outcome::success(format!(
                "{}: {} has no owner, left unchanged",
                self.name(),
                tag.label()
            )));
        };
        let owner = doc.as_query().element_or_err(owner_id)?;

        let tag_anchor = doc
            .location(id)
            .ok_or_else(|| UpkeepError::mutation(format!("Tag {} has no location", id)))?;
        let owner_anchor = doc
            .location(owner_id)
            .ok_or_else(|| UpkeepError::mutation(format!("Owner {} has no location", owner_id)))?;

        let vector: Vector3<f64> = point(owner_anchor) - point(tag_anchor);
        if vector.norm() < TOLERANCE {
            return Ok(Outcome::success(format!(
                "Tag {} is already on owner {} {}",
                tag.label(),
                owner.name,
                owner_id
            )));
        }

        doc.move_element(id, to_xyz(&vector))?;
        log::debug!("[Solver] Moved tag {} by {:?}", id, vector);
        Ok(Outcome::success(format!(
            "Moved tag {} onto owner {} {}",
            tag.label(),
            owner.name,
            owner_id
        ))
        .with_payload(vec![id]))
    }
}
