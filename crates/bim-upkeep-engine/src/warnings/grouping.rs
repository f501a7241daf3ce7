// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Warning grouping helpers

use bim_upkeep_model::{ElementId, WarningGuid, WarningInstance};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Group warnings by type, in order of first appearance
pub fn warnings_by_guid(warnings: &[WarningInstance]) -> Vec<(WarningGuid, Vec<&WarningInstance>)> {
    let mut groups: Vec<(WarningGuid, Vec<&WarningInstance>)> = Vec::new();
    let mut index: FxHashMap<&WarningGuid, usize> = FxHashMap::default();
    for warning in warnings {
        match index.get(&warning.type_guid) {
            Some(&i) => groups[i].1.push(warning),
            None => {
                index.insert(&warning.type_guid, groups.len());
                groups.push((warning.type_guid.clone(), vec![warning]));
            }
        }
    }
    groups
}

/// Warnings of one type
pub fn warnings_of_type<'a>(
    warnings: &'a [WarningInstance],
    guid: &WarningGuid,
) -> Vec<&'a WarningInstance> {
    warnings.iter().filter(|w| &w.type_guid == guid).collect()
}

/// Every element implicated by a warning of the given type, once each
pub fn unique_failing_elements(warnings: &[WarningInstance], guid: &WarningGuid) -> Vec<ElementId> {
    let mut seen = FxHashSet::default();
    warnings_of_type(warnings, guid)
        .into_iter()
        .flat_map(|w| w.failing_element_ids.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Elements of the given type's warnings that implicate exactly one element
pub fn single_failing_elements(warnings: &[WarningInstance], guid: &WarningGuid) -> Vec<ElementId> {
    warnings_of_type(warnings, guid)
        .into_iter()
        .filter_map(|w| match w.failing_element_ids.as_slice() {
            [only] => Some(*only),
            _ => None,
        })
        .collect()
}

/// Group elements related through pairwise warnings
///
/// Only warnings implicating exactly two elements are considered. Elements
/// linked by a chain of such warnings end up in one group, keyed by the
/// lowest id and listed in ascending order (key included).
pub fn group_by_relation(
    warnings: &[WarningInstance],
    guid: &WarningGuid,
) -> BTreeMap<ElementId, Vec<ElementId>> {
    let mut parent: FxHashMap<ElementId, ElementId> = FxHashMap::default();

    fn root(parent: &mut FxHashMap<ElementId, ElementId>, id: ElementId) -> ElementId {
        let mut current = id;
        while let Some(&next) = parent.get(&current) {
            if next == current {
                break;
            }
            current = next;
        }
        // Path compression
        let mut node = id;
        while node != current {
            let next = parent.get(&node).copied().unwrap_or(current);
            parent.insert(node, current);
            node = next;
        }
        current
    }

    for warning in warnings_of_type(warnings, guid) {
        let [a, b] = warning.failing_element_ids.as_slice() else {
            continue;
        };
        parent.entry(*a).or_insert(*a);
        parent.entry(*b).or_insert(*b);
        let (ra, rb) = (root(&mut parent, *a), root(&mut parent, *b));
        if ra != rb {
            // Lowest id becomes the root
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            parent.insert(high, low);
        }
    }

    let ids: Vec<ElementId> = parent.keys().copied().collect();
    let mut groups: BTreeMap<ElementId, Vec<ElementId>> = BTreeMap::new();
    for id in ids {
        let r = root(&mut parent, id);
        groups.entry(r).or_default().push(id);
    }
    for members in groups.values_mut() {
        members.sort();
    }
    groups
}
