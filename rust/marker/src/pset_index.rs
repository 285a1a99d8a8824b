// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property set index
//!
//! One scan over `IfcRelDefinesByProperties` counting
//! `pset -> property -> value -> occurrences`. Only relationships that
//! relate at least one product are counted, and a property set shared by
//! several relationships is counted once per relationship.

use crate::relations::{REL_RELATED_OBJECTS, REL_RELATING_DEFINITION};
use crate::value::display_value;
use ifc_marker_core::IfcModel;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// IfcPropertySet: [2]=Name, [4]=HasProperties
pub const PSET_NAME_INDEX: usize = 2;
pub const PSET_PROPERTIES_INDEX: usize = 4;
/// IfcPropertySingleValue: [0]=Name, [2]=NominalValue
pub const PROP_NAME_INDEX: usize = 0;
pub const PROP_NOMINAL_VALUE_INDEX: usize = 2;

/// Occurrence counts of a property's values, in first-seen order
#[derive(Debug, Default, Clone)]
pub struct ValueCounts {
    entries: Vec<(String, usize)>,
    positions: FxHashMap<String, usize>,
}

impl ValueCounts {
    pub fn increment(&mut self, value: String) {
        match self.positions.get(&value) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.positions.insert(value.clone(), self.entries.len());
                self.entries.push((value, 1));
            }
        }
    }

    pub fn count(&self, value: &str) -> usize {
        self.positions
            .get(value)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values by descending count; equal counts keep first-seen order
    pub fn sorted(&self) -> Vec<ValueCount> {
        let mut values: Vec<ValueCount> = self
            .entries
            .iter()
            .map(|(value, count)| ValueCount::new(value, *count))
            .collect();
        values.sort_by(|a, b| b.count.cmp(&a.count));
        values
    }
}

/// A value with its occurrence count, as offered in the value selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    /// `"value (count)"`
    pub label: String,
}

impl ValueCount {
    fn new(value: &str, count: usize) -> Self {
        Self {
            value: value.to_string(),
            count,
            label: format!("{} ({})", value, count),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
    pub name: String,
    pub values: Vec<ValueCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PsetSummary {
    pub name: String,
    pub properties: Vec<PropertySummary>,
}

/// Index of property sets attached to products
#[derive(Debug, Default, Clone)]
pub struct PsetIndex {
    psets: BTreeMap<String, BTreeMap<String, ValueCounts>>,
}

impl PsetIndex {
    pub fn build(model: &mut IfcModel) -> Self {
        let mut index = PsetIndex::default();
        let mut counted_rels = 0usize;

        for rel_id in model.ids_of_type("IFCRELDEFINESBYPROPERTIES") {
            let rel = match model.get(rel_id) {
                Ok(rel) => rel,
                Err(e) => {
                    tracing::warn!(rel_id, error = %e, "Skipping unreadable relationship");
                    continue;
                }
            };

            if !rel
                .get_refs(REL_RELATED_OBJECTS)
                .into_iter()
                .any(|id| model.is_product(id))
            {
                continue;
            }
            counted_rels += 1;

            for pset_id in rel.get_refs(REL_RELATING_DEFINITION) {
                index.count_pset(model, pset_id);
            }
        }

        tracing::info!(
            relationships = counted_rels,
            psets = index.psets.len(),
            "Built property set index"
        );
        index
    }

    fn count_pset(&mut self, model: &mut IfcModel, pset_id: u32) {
        let pset = match model.get(pset_id) {
            Ok(pset) if pset.is("IFCPROPERTYSET") => pset,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(pset_id, error = %e, "Skipping unreadable property set");
                return;
            }
        };
        let pset_name = match pset.get_string(PSET_NAME_INDEX) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return,
        };

        let properties = self.psets.entry(pset_name).or_default();
        for prop_id in pset.get_refs(PSET_PROPERTIES_INDEX) {
            let prop = match model.get(prop_id) {
                Ok(prop) => prop,
                Err(e) => {
                    tracing::warn!(prop_id, error = %e, "Skipping unreadable property");
                    continue;
                }
            };
            if !prop.is("IFCPROPERTYSINGLEVALUE") {
                continue;
            }
            let prop_name = match prop.get_string(PROP_NAME_INDEX) {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            let value = display_value(prop.get(PROP_NOMINAL_VALUE_INDEX));
            properties.entry(prop_name).or_default().increment(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.psets.is_empty()
    }

    /// Property set names, sorted
    pub fn pset_names(&self) -> Vec<&str> {
        self.psets.keys().map(String::as_str).collect()
    }

    /// Property names of a property set, sorted
    pub fn property_names(&self, pset: &str) -> Vec<&str> {
        self.psets
            .get(pset)
            .map(|props| props.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn counts(&self, pset: &str, property: &str) -> Option<&ValueCounts> {
        self.psets.get(pset)?.get(property)
    }

    /// Values of a property by descending count
    pub fn values(&self, pset: &str, property: &str) -> Vec<ValueCount> {
        self.counts(pset, property)
            .map(ValueCounts::sorted)
            .unwrap_or_default()
    }

    /// Occurrences of one value
    pub fn count(&self, pset: &str, property: &str, value: &str) -> usize {
        self.counts(pset, property)
            .map(|counts| counts.count(value))
            .unwrap_or(0)
    }

    /// Whole index in selector order
    pub fn summary(&self) -> Vec<PsetSummary> {
        self.psets
            .iter()
            .map(|(name, props)| PsetSummary {
                name: name.clone(),
                properties: props
                    .iter()
                    .map(|(prop, counts)| PropertySummary {
                        name: prop.clone(),
                        values: counts.sorted(),
                    })
                    .collect(),
            })
            .collect()
    }
}
