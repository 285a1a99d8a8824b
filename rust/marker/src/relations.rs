// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inverse of `IfcRelDefinesByProperties.RelatedObjects`
//!
//! STEP files only store the forward reference, so `IsDefinedBy` is built
//! with one pass over the relationships.

use ifc_marker_core::IfcModel;
use rustc_hash::FxHashMap;

/// IfcRelDefinesByProperties: [0]=GlobalId, [1]=OwnerHistory, [2]=Name,
/// [3]=Description, [4]=RelatedObjects, [5]=RelatingPropertyDefinition
pub const REL_RELATED_OBJECTS: usize = 4;
pub const REL_RELATING_DEFINITION: usize = 5;

/// Element id -> property relationships relating it, in file order
#[derive(Debug, Default, Clone)]
pub struct PropertyRelations {
    by_element: FxHashMap<u32, Vec<u32>>,
}

impl PropertyRelations {
    pub fn build(model: &mut IfcModel) -> Self {
        let mut by_element: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
        let mut skipped = 0usize;

        for rel_id in model.ids_of_type("IFCRELDEFINESBYPROPERTIES") {
            let rel = match model.get(rel_id) {
                Ok(rel) => rel,
                Err(e) => {
                    tracing::warn!(rel_id, error = %e, "Skipping unreadable relationship");
                    skipped += 1;
                    continue;
                }
            };
            for element in rel.get_refs(REL_RELATED_OBJECTS) {
                by_element.entry(element).or_default().push(rel_id);
            }
        }

        tracing::debug!(
            elements = by_element.len(),
            skipped,
            "Built property relationship index"
        );
        Self { by_element }
    }

    /// Relationships defining properties of `element`
    pub fn rels_for(&self, element: u32) -> &[u32] {
        self.by_element
            .get(&element)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Record a relationship created after the index was built
    pub fn add(&mut self, element: u32, rel: u32) {
        self.by_element.entry(element).or_default().push(rel);
    }
}
