// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Match scan: products carrying a selected property value

use crate::error::Result;
use crate::pset_index::{
    PROP_NAME_INDEX, PROP_NOMINAL_VALUE_INDEX, PSET_NAME_INDEX, PSET_PROPERTIES_INDEX,
};
use crate::relations::{PropertyRelations, REL_RELATING_DEFINITION};
use crate::value::display_value;
use ifc_marker_core::{display_type_name, DecodedEntity, IfcModel};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// IfcRoot: [0]=GlobalId, [2]=Name
pub const ROOT_GLOBAL_ID_INDEX: usize = 0;
pub const ROOT_NAME_INDEX: usize = 2;

/// Property set, property and display value to look for
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    pub pset: String,
    pub property: String,
    pub value: String,
}

impl Selection {
    pub fn new(
        pset: impl Into<String>,
        property: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            pset: pset.into(),
            property: property.into(),
            value: value.into(),
        }
    }

    /// `pset.property=value`
    pub fn filter_info(&self) -> String {
        format!("{}.{}={}", self.pset, self.property, self.value)
    }
}

/// One (element, property, pset) hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub element_id: u32,
    pub global_id: String,
    /// Schema spelling, e.g. `IfcWall`
    pub type_name: String,
    pub name: Option<String>,
    pub property: String,
    pub pset: String,
}

impl Match {
    fn from_element(element: &DecodedEntity, selection: &Selection) -> Self {
        Self {
            element_id: element.id,
            global_id: element
                .get_string(ROOT_GLOBAL_ID_INDEX)
                .map(str::to_string)
                .unwrap_or_default(),
            type_name: display_type_name(&element.type_name),
            name: element
                .get_string(ROOT_NAME_INDEX)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            property: selection.property.clone(),
            pset: selection.pset.clone(),
        }
    }

    /// Identity used to de-duplicate; elements without a GlobalId fall back
    /// to their instance id
    pub fn key(&self) -> String {
        if self.global_id.is_empty() {
            format!("#{}", self.element_id)
        } else {
            self.global_id.clone()
        }
    }

    /// Name as shown in tables
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("-")
    }
}

/// Row of the element preview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    pub property: String,
}

/// Result of a match scan, duplicates included
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSet {
    pub selection: Selection,
    pub matches: Vec<Match>,
}

impl MatchSet {
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// First match of every element, in scan order
    pub fn unique(&self) -> Vec<&Match> {
        let mut seen = FxHashSet::default();
        self.matches
            .iter()
            .filter(|m| seen.insert(m.key()))
            .collect()
    }

    pub fn unique_count(&self) -> usize {
        self.unique().len()
    }

    pub fn preview(&self) -> Vec<PreviewRow> {
        self.unique()
            .into_iter()
            .map(|m| PreviewRow {
                type_name: m.type_name.clone(),
                name: m.display_name().to_string(),
                property: m.property.clone(),
            })
            .collect()
    }
}

/// Scan every product for the selected property value
pub fn find_elements(model: &mut IfcModel, selection: &Selection) -> Result<MatchSet> {
    let relations = PropertyRelations::build(model);
    find_elements_with(model, &relations, selection)
}

/// Match scan reusing an existing relationship index
pub fn find_elements_with(
    model: &mut IfcModel,
    relations: &PropertyRelations,
    selection: &Selection,
) -> Result<MatchSet> {
    let mut matches = Vec::new();

    for element_id in model.products() {
        let rels = relations.rels_for(element_id);
        if rels.is_empty() {
            continue;
        }

        let mut element: Option<DecodedEntity> = None;
        for &rel_id in rels {
            let rel = match model.get(rel_id) {
                Ok(rel) => rel,
                Err(e) => {
                    tracing::warn!(rel_id, error = %e, "Skipping unreadable relationship");
                    continue;
                }
            };
            for pset_id in rel.get_refs(REL_RELATING_DEFINITION) {
                let hits = count_hits(model, pset_id, selection);
                if hits == 0 {
                    continue;
                }
                if element.is_none() {
                    element = Some(model.get(element_id)?);
                }
                if let Some(element) = &element {
                    let hit = Match::from_element(element, selection);
                    matches.extend(std::iter::repeat(hit).take(hits));
                }
            }
        }
    }

    tracing::debug!(
        filter = %selection.filter_info(),
        matches = matches.len(),
        "Match scan finished"
    );

    Ok(MatchSet {
        selection: selection.clone(),
        matches,
    })
}

/// Number of single values in a property set matching the selection.
/// Unreadable property sets and properties are skipped, as in the index.
fn count_hits(model: &mut IfcModel, pset_id: u32, selection: &Selection) -> usize {
    let pset = match model.get(pset_id) {
        Ok(pset) => pset,
        Err(e) => {
            tracing::warn!(pset_id, error = %e, "Skipping unreadable property set");
            return 0;
        }
    };
    if !pset.is("IFCPROPERTYSET")
        || pset.get_string(PSET_NAME_INDEX) != Some(selection.pset.as_str())
    {
        return 0;
    }

    let mut hits = 0;
    for prop_id in pset.get_refs(PSET_PROPERTIES_INDEX) {
        let prop = match model.get(prop_id) {
            Ok(prop) => prop,
            Err(e) => {
                tracing::warn!(prop_id, error = %e, "Skipping unreadable property");
                continue;
            }
        };
        if !prop.is("IFCPROPERTYSINGLEVALUE")
            || prop.get_string(PROP_NAME_INDEX) != Some(selection.property.as_str())
        {
            continue;
        }
        if display_value(prop.get(PROP_NOMINAL_VALUE_INDEX)) == selection.value {
            hits += 1;
        }
    }
    hits
}
