// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `NOSKI_Eksisterende` marker property set

use crate::error::Result;
use crate::matcher::Selection;
use crate::pset_index::{
    PROP_NAME_INDEX, PROP_NOMINAL_VALUE_INDEX, PSET_NAME_INDEX, PSET_PROPERTIES_INDEX,
};
use crate::relations::{PropertyRelations, REL_RELATING_DEFINITION};
use crate::style::PSET_NAME;
use chrono::NaiveDate;
use ifc_marker_core::{new_global_id, AttributeValue, IfcModel};
use serde::{Deserialize, Serialize};

/// IfcLabel is limited to 255 characters; longer values are written as IfcText
const LABEL_MAX_CHARS: usize = 255;

/// Who made the marking, written into every marker property set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIdentity {
    pub author: String,
    pub contact: String,
    pub email: String,
    pub generator: String,
}

impl Default for MarkerIdentity {
    fn default() -> Self {
        Self {
            author: "Skiplum".to_string(),
            contact: "Edvard Granskogen Kjørstad".to_string(),
            email: "egk@skiplum.no".to_string(),
            generator: concat!("ifc-marker ", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Marker properties in the order they are written
pub fn marker_properties(
    colour: &str,
    selection: &Selection,
    date: NaiveDate,
    identity: &MarkerIdentity,
) -> Vec<(&'static str, String)> {
    let filter = selection.filter_info();
    vec![
        ("Info", format!("Farget med \"{}\" basert på {}.", colour, filter)),
        ("Farge", colour.to_string()),
        ("Filter", filter),
        ("MarkeringsDato", date.format("%Y-%m-%d").to_string()),
        ("Laget av", identity.author.clone()),
        ("Kontaktperson", identity.contact.clone()),
        ("Epost", identity.email.clone()),
        ("Generert med", identity.generator.clone()),
    ]
}

/// What `add_marker_pset` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PsetChange {
    /// The element already had the marker set; it was edited
    Updated { pset_id: u32 },
    /// A new property set and relationship were added
    Created { pset_id: u32, rel_id: u32 },
}

/// Write the marker properties to an element's marker property set
pub fn add_marker_pset(
    model: &mut IfcModel,
    relations: &mut PropertyRelations,
    element_id: u32,
    properties: &[(&'static str, String)],
    owner_history: Option<u32>,
) -> Result<PsetChange> {
    if let Some(pset_id) = find_marker_pset(model, relations, element_id)? {
        edit_pset(model, pset_id, properties)?;
        return Ok(PsetChange::Updated { pset_id });
    }

    let owner = owner_history
        .map(AttributeValue::EntityRef)
        .unwrap_or(AttributeValue::Null);

    let prop_ids: Vec<u32> = properties
        .iter()
        .map(|(name, value)| add_single_value(model, name, value))
        .collect();
    let pset_id = model.add(
        "IFCPROPERTYSET",
        vec![
            AttributeValue::String(new_global_id()),
            owner.clone(),
            AttributeValue::String(PSET_NAME.to_string()),
            AttributeValue::Null,
            AttributeValue::ref_list(prop_ids),
        ],
    );
    let rel_id = model.add(
        "IFCRELDEFINESBYPROPERTIES",
        vec![
            AttributeValue::String(new_global_id()),
            owner,
            AttributeValue::Null,
            AttributeValue::Null,
            AttributeValue::ref_list([element_id]),
            AttributeValue::EntityRef(pset_id),
        ],
    );
    relations.add(element_id, rel_id);

    Ok(PsetChange::Created { pset_id, rel_id })
}

/// First `IfcOwnerHistory` in the file
pub fn first_owner_history(model: &IfcModel) -> Option<u32> {
    model.ids_of_type("IFCOWNERHISTORY").into_iter().next()
}

fn find_marker_pset(
    model: &mut IfcModel,
    relations: &PropertyRelations,
    element_id: u32,
) -> Result<Option<u32>> {
    for &rel_id in relations.rels_for(element_id) {
        for pset_id in model.get(rel_id)?.get_refs(REL_RELATING_DEFINITION) {
            let pset = model.get(pset_id)?;
            if pset.is("IFCPROPERTYSET") && pset.get_string(PSET_NAME_INDEX) == Some(PSET_NAME) {
                return Ok(Some(pset_id));
            }
        }
    }
    Ok(None)
}

/// Overwrite existing single values, append missing ones
fn edit_pset(model: &mut IfcModel, pset_id: u32, properties: &[(&'static str, String)]) -> Result<()> {
    let pset = model.get(pset_id)?;
    let mut prop_ids = pset.get_refs(PSET_PROPERTIES_INDEX);

    let mut existing = Vec::with_capacity(prop_ids.len());
    for &prop_id in &prop_ids {
        let prop = model.get(prop_id)?;
        if prop.is("IFCPROPERTYSINGLEVALUE") {
            if let Some(name) = prop.get_string(PROP_NAME_INDEX) {
                existing.push((name.to_string(), prop));
            }
        }
    }

    let mut appended = false;
    for (name, value) in properties {
        match existing.iter_mut().find(|(n, _)| n == name) {
            Some((_, prop)) => {
                let type_name = prop
                    .get(PROP_NOMINAL_VALUE_INDEX)
                    .and_then(AttributeValue::as_typed)
                    .map(|(t, _)| t.to_string());
                let nominal = match type_name {
                    Some(t) if t == "IFCLABEL" || t == "IFCTEXT" || t == "IFCIDENTIFIER" => {
                        AttributeValue::typed(&t, AttributeValue::String(value.clone()))
                    }
                    _ => text_value(value),
                };
                model.set_attribute(prop.id, PROP_NOMINAL_VALUE_INDEX, nominal)?;
            }
            None => {
                prop_ids.push(add_single_value(model, name, value));
                appended = true;
            }
        }
    }

    if appended {
        model.set_attribute(pset_id, PSET_PROPERTIES_INDEX, AttributeValue::ref_list(prop_ids))?;
    }
    Ok(())
}

fn add_single_value(model: &mut IfcModel, name: &str, value: &str) -> u32 {
    model.add(
        "IFCPROPERTYSINGLEVALUE",
        vec![
            AttributeValue::String(name.to_string()),
            AttributeValue::Null,
            text_value(value),
            AttributeValue::Null,
        ],
    )
}

fn text_value(value: &str) -> AttributeValue {
    if value.chars().count() > LABEL_MAX_CHARS {
        AttributeValue::typed("IFCTEXT", AttributeValue::String(value.to_string()))
    } else {
        AttributeValue::label(value)
    }
}
