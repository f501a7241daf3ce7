// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solver for overlapping area and room separation lines
//!
//! The host reports every overlap as a warning naming two lines. Lines
//! linked by a chain of such warnings are fixed together in one
//! transaction. A line lying within another is deleted. A partial overlap
//! is removed either by lengthening the longer line over the shorter one
//! (and deleting the shorter) or by trimming the shorter line back to the
//! end of the longer one.
//!
//! A line inside a group is only changed together with a line of the same
//! group; lines outside any group can always be changed.

use super::WarningSolver;
use crate::{Outcome, Result};
use bim_upkeep_model::{
    warning::guids, Document, ElementEditor, ElementId, ElementQuery, ElementQueryExt,
    LineSegment, WarningGuid, Xyz,
};
use nalgebra::{Point3, Vector3};

/// Distances below this count as touching
const TOLERANCE: f64 = 1e-6;

/// How a partial overlap is removed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverlapStrategy {
    /// Extend the longer line over the shorter one, then delete the shorter
    #[default]
    Lengthen,
    /// Trim the shorter line back to the end of the longer one
    Shorten,
}

/// Removes overlaps between separation lines
pub struct SeparationLinesOverlapSolver {
    guid: WarningGuid,
    name: &'static str,
    strategy: OverlapStrategy,
}

impl SeparationLinesOverlapSolver {
    /// Solver for the host's area separation line overlap warning
    pub fn area() -> Self {
        Self {
            guid: WarningGuid::new(guids::AREA_SEPARATION_LINES_OVERLAP),
            name: "Area separation lines overlap",
            strategy: OverlapStrategy::default(),
        }
    }

    /// Solver for the host's room separation line overlap warning
    pub fn room() -> Self {
        Self {
            guid: WarningGuid::new(guids::ROOM_SEPARATION_LINES_OVERLAP),
            name: "Room separation lines overlap",
            strategy: OverlapStrategy::default(),
        }
    }

    /// Choose how partial overlaps are removed
    pub fn with_strategy(mut self, strategy: OverlapStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Handle a different warning type
    pub fn with_guid(mut self, guid: impl Into<WarningGuid>) -> Self {
        self.guid = guid.into();
        self
    }
}

impl WarningSolver for SeparationLinesOverlapSolver {
    fn guid(&self) -> &WarningGuid {
        &self.guid
    }

    fn name(&self) -> &str {
        self.name
    }

    fn transaction_name(&self) -> String {
        "Resolving overlapping separation lines".to_string()
    }

    fn solves_related_groups(&self) -> bool {
        true
    }

    fn resolve(&self, doc: &mut dyn Document, id: ElementId) -> Result<Outcome> {
        let line = doc.as_query().element_or_err(id)?;
        Ok(Outcome::success(format!(
            "{}: {} has no overlapping line, left unchanged",
            self.name,
            line.label()
        )))
    }

    fn resolve_related(&self, doc: &mut dyn Document, ids: &[ElementId]) -> Result<Outcome> {
        let mut outcome = Outcome::new();
        let mut lines = Vec::with_capacity(ids.len());
        for &id in ids {
            let info = doc.as_query().element_or_err(id)?;
            match doc.curve(id) {
                Some(curve) => lines.push(Line::new(id, info.group_id, curve)),
                None => outcome.append_message(format!(
                    "{}: {} is not a line, left unchanged",
                    self.name,
                    info.label()
                )),
            }
        }

        let changes = plan(&mut lines, self.strategy);
        if changes.is_empty() {
            let listed: Vec<String> = ids.iter().map(ElementId::to_string).collect();
            outcome.update(Outcome::success(format!(
                "{}: nothing to change on lines {}",
                self.name,
                listed.join(", ")
            )));
            return Ok(outcome);
        }

        let mut deleted = Vec::new();
        let mut amended = Vec::new();
        for change in &changes {
            let message = match *change {
                Change::Deleted { id, within } => {
                    deleted.push(id);
                    format!("Deleted separation line {} lying within {}", id, within)
                }
                Change::Lengthened { id, over } => {
                    amended.push(id);
                    deleted.push(over);
                    format!("Lengthened separation line {} over {}", id, over)
                }
                Change::Shortened { id, against } => {
                    amended.push(id);
                    format!("Shortened separation line {} to the end of {}", id, against)
                }
            };
            outcome.update(Outcome::success(format!("{}: {}", self.name, message)));
        }

        // Lines amended and later deleted have left `lines` already
        let mut payload = Vec::new();
        for line in lines.iter().filter(|l| amended.contains(&l.id)) {
            doc.set_curve(line.id, line.segment())?;
            payload.push(line.id);
        }
        if !deleted.is_empty() {
            payload.extend(doc.delete_elements(&deleted)?);
        }
        log::debug!(
            "[Solver] {} made {} change(s) to {} line(s)",
            self.name,
            changes.len(),
            ids.len()
        );
        outcome.payload.extend(payload);
        Ok(outcome)
    }
}

/// A separation line being planned on
#[derive(Clone, Debug)]
struct Line {
    id: ElementId,
    group: Option<ElementId>,
    start: Point3<f64>,
    end: Point3<f64>,
}

impl Line {
    fn new(id: ElementId, group: Option<ElementId>, curve: LineSegment) -> Self {
        Self {
            id,
            group,
            start: point(curve.start),
            end: point(curve.end),
        }
    }

    fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    fn unit(&self) -> Option<Vector3<f64>> {
        let direction = self.end - self.start;
        let length = direction.norm();
        (length > TOLERANCE).then(|| direction / length)
    }

    /// Position of `p` along this line, if `p` lies on its extension
    fn position_of(&self, p: Point3<f64>) -> Option<f64> {
        let unit = self.unit()?;
        let v = p - self.start;
        let t = v.dot(&unit);
        ((v - unit * t).norm() <= TOLERANCE).then_some(t)
    }

    fn point_at(&self, t: f64) -> Option<Point3<f64>> {
        Some(self.start + self.unit()? * t)
    }

    fn segment(&self) -> LineSegment {
        LineSegment::new(to_xyz(&self.start), to_xyz(&self.end))
    }

    /// Whether this line may be changed because of `other`
    fn may_change_for(&self, other: &Line) -> bool {
        self.group.is_none() || self.group == other.group
    }
}

fn point(xyz: Xyz) -> Point3<f64> {
    Point3::new(xyz.x, xyz.y, xyz.z)
}

fn to_xyz(p: &Point3<f64>) -> Xyz {
    Xyz::new(p.x, p.y, p.z)
}

/// How `other` lies along `line`, in positions along `line`
enum Overlap {
    Apart,
    Contained,
    Partial { from: f64, to: f64 },
}

fn overlap(line: &Line, other: &Line) -> Overlap {
    let (Some(a), Some(b)) = (line.position_of(other.start), line.position_of(other.end)) else {
        return Overlap::Apart;
    };
    let (from, to) = (a.min(b), a.max(b));
    let length = line.length();
    if to <= TOLERANCE || from >= length - TOLERANCE {
        Overlap::Apart
    } else if from >= -TOLERANCE && to <= length + TOLERANCE {
        Overlap::Contained
    } else {
        Overlap::Partial { from, to }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Change {
    Deleted { id: ElementId, within: ElementId },
    Lengthened { id: ElementId, over: ElementId },
    Shortened { id: ElementId, against: ElementId },
}

/// Apply changes to `lines` until no two of them overlap
///
/// Deleted lines are removed from `lines`; amended ones keep their new
/// geometry.
fn plan(lines: &mut Vec<Line>, strategy: OverlapStrategy) -> Vec<Change> {
    let mut changes = Vec::new();
    let limit = lines.len() * lines.len() + 1;
    for _ in 0..limit {
        // Longest first, so `other` never sticks out on both ends
        lines.sort_by(|a, b| b.length().total_cmp(&a.length()).then(a.id.cmp(&b.id)));
        match next_change(lines, strategy) {
            Some(change) => changes.push(change),
            None => break,
        }
    }
    changes
}

fn next_change(lines: &mut Vec<Line>, strategy: OverlapStrategy) -> Option<Change> {
    for i in 0..lines.len() {
        for j in (i + 1)..lines.len() {
            let (keep, other) = (&lines[i], &lines[j]);
            match overlap(keep, other) {
                Overlap::Apart => {}
                Overlap::Contained => {
                    if other.may_change_for(keep) {
                        let change = Change::Deleted {
                            id: other.id,
                            within: keep.id,
                        };
                        lines.remove(j);
                        return Some(change);
                    }
                }
                Overlap::Partial { from, to } => match strategy {
                    OverlapStrategy::Lengthen => {
                        if !(other.may_change_for(keep) && keep.may_change_for(other)) {
                            continue;
                        }
                        let (Some(start), Some(end)) = (
                            keep.point_at(from.min(0.0)),
                            keep.point_at(to.max(keep.length())),
                        ) else {
                            continue;
                        };
                        let change = Change::Lengthened {
                            id: keep.id,
                            over: other.id,
                        };
                        lines[i].start = start;
                        lines[i].end = end;
                        lines.remove(j);
                        return Some(change);
                    }
                    OverlapStrategy::Shorten => {
                        if !other.may_change_for(keep) {
                            continue;
                        }
                        let (s, e) = if from < 0.0 {
                            (from, 0.0)
                        } else {
                            (keep.length(), to)
                        };
                        let (Some(start), Some(end)) = (keep.point_at(s), keep.point_at(e)) else {
                            continue;
                        };
                        let change = Change::Shortened {
                            id: other.id,
                            against: keep.id,
                        };
                        // The trimmed line keeps its own direction
                        let same_way = (other.end - other.start).dot(&(end - start)) >= 0.0;
                        let trimmed = &mut lines[j];
                        if same_way {
                            trimmed.start = start;
                            trimmed.end = end;
                        } else {
                            trimmed.start = end;
                            trimmed.end = start;
                        }
                        return Some(change);
                    }
                },
            }
        }
    }
    None
}
