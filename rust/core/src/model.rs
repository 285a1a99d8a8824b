// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Editable IFC model
//!
//! Wraps the original file content with an overlay of edited and added
//! instances. Reads see the overlay first; writing copies every untouched
//! instance byte-for-byte and re-encodes only what changed.

use crate::attribute::{AttributeValue, DecodedEntity};
use crate::decoder::EntityDecoder;
use crate::error::{Error, Result};
use crate::parser::EntityScanner;
use crate::schema::{is_product, SchemaVersion};
use crate::writer::entity_to_step;
use rustc_hash::FxHashMap;

const MAGIC: &str = "ISO-10303-21;";

/// Location of an instance in the original content
#[derive(Debug, Clone, Copy)]
pub struct EntityLocation<'a> {
    pub id: u32,
    pub type_name: &'a str,
    pub start: usize,
    pub end: usize,
}

/// An IFC file opened for reading and editing
pub struct IfcModel<'a> {
    content: &'a str,
    schema: SchemaVersion,
    /// Byte offset of the DATA section's closing `ENDSEC;`
    data_end: usize,
    decoder: EntityDecoder<'a>,
    /// Instances in file order
    order: Vec<EntityLocation<'a>>,
    positions: FxHashMap<u32, usize>,
    edits: FxHashMap<u32, DecodedEntity>,
    added: Vec<DecodedEntity>,
    added_positions: FxHashMap<u32, usize>,
    product_types: FxHashMap<String, bool>,
    next_id: u32,
}

impl<'a> IfcModel<'a> {
    /// Open a model from the text of a STEP physical file.
    ///
    /// Checks the exchange structure (magic line, HEADER with FILE_SCHEMA,
    /// a DATA section with at least one instance) and indexes the instances.
    /// Instances are decoded lazily.
    pub fn open(content: &'a str) -> Result<Self> {
        let body = content.trim_start_matches('\u{feff}').trim_start();
        if !body.starts_with(MAGIC) {
            return Err(Error::InvalidFile(format!("missing {} line", MAGIC)));
        }

        let header_start = content
            .find("HEADER;")
            .ok_or_else(|| Error::InvalidFile("missing HEADER section".into()))?;
        let header_end = content[header_start..]
            .find("ENDSEC;")
            .map(|i| header_start + i)
            .ok_or_else(|| Error::InvalidFile("unterminated HEADER section".into()))?;
        let schema = parse_file_schema(&content[header_start..header_end])
            .map(SchemaVersion::from_identifier)
            .ok_or_else(|| Error::InvalidFile("missing FILE_SCHEMA".into()))?;

        let data_start = content[header_end..]
            .find("DATA;")
            .map(|i| header_end + i + "DATA;".len())
            .ok_or_else(|| Error::InvalidFile("missing DATA section".into()))?;

        let mut scanner = EntityScanner::with_range(content, data_start, content.len());
        let mut order = Vec::new();
        let mut positions = FxHashMap::default();
        let mut max_id = 0u32;
        let mut last_end = data_start;

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            // Anything after the DATA section's ENDSEC is not an instance
            if content[last_end..start].contains("ENDSEC;") {
                break;
            }
            positions.insert(id, order.len());
            order.push(EntityLocation {
                id,
                type_name,
                start,
                end,
            });
            max_id = max_id.max(id);
            last_end = end;
        }

        if order.is_empty() {
            return Err(Error::InvalidFile("DATA section has no instances".into()));
        }

        let data_end = content[last_end..]
            .find("ENDSEC;")
            .map(|i| last_end + i)
            .ok_or_else(|| Error::InvalidFile("unterminated DATA section".into()))?;

        Ok(Self {
            content,
            schema,
            data_end,
            decoder: EntityDecoder::new(content),
            order,
            positions,
            edits: FxHashMap::default(),
            added: Vec::new(),
            added_positions: FxHashMap::default(),
            product_types: FxHashMap::default(),
            next_id: max_id + 1,
        })
    }

    /// Schema named in the header
    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    /// Original file content
    pub fn content(&self) -> &'a str {
        self.content
    }

    /// Number of instances, including added ones
    pub fn entity_count(&self) -> usize {
        self.order.len() + self.added.len()
    }

    /// Number of original instances that were edited
    pub fn edited_count(&self) -> usize {
        self.edits.len()
    }

    /// Number of instances added since opening
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    /// Type keyword of an instance as written in the file
    pub fn type_name(&self, id: u32) -> Option<&str> {
        if let Some(&pos) = self.added_positions.get(&id) {
            return Some(self.added[pos].type_name.as_str());
        }
        self.positions.get(&id).map(|&pos| self.order[pos].type_name)
    }

    /// Ids of every instance of exactly this type, in file order
    pub fn ids_of_type(&self, type_name: &str) -> Vec<u32> {
        self.order
            .iter()
            .filter(|loc| loc.type_name.eq_ignore_ascii_case(type_name))
            .map(|loc| loc.id)
            .chain(
                self.added
                    .iter()
                    .filter(|e| e.is(type_name))
                    .map(|e| e.id),
            )
            .collect()
    }

    /// Ids of every `IfcProduct` (any subtype), in file order
    pub fn products(&mut self) -> Vec<u32> {
        let mut ids = Vec::new();
        for loc in &self.order {
            let product = match self.product_types.get(loc.type_name) {
                Some(&known) => known,
                None => {
                    let known = is_product(loc.type_name);
                    self.product_types.insert(loc.type_name.to_string(), known);
                    known
                }
            };
            if product {
                ids.push(loc.id);
            }
        }
        ids.extend(
            self.added
                .iter()
                .filter(|e| is_product(&e.type_name))
                .map(|e| e.id),
        );
        ids
    }

    /// Whether an instance is an `IfcProduct`
    pub fn is_product(&self, id: u32) -> bool {
        self.type_name(id).map(is_product).unwrap_or(false)
    }

    /// Decode an instance, seeing edits and additions
    pub fn get(&mut self, id: u32) -> Result<DecodedEntity> {
        if let Some(entity) = self.edits.get(&id) {
            return Ok(entity.clone());
        }
        if let Some(&pos) = self.added_positions.get(&id) {
            return Ok(self.added[pos].clone());
        }
        let &pos = self.positions.get(&id).ok_or(Error::EntityNotFound(id))?;
        let loc = self.order[pos];
        self.decoder.decode_at_with_id(loc.id, loc.start, loc.end)
    }

    /// Decode the instance referenced by an attribute, if any
    pub fn resolve(&mut self, attr: Option<&AttributeValue>) -> Result<Option<DecodedEntity>> {
        match attr.and_then(|a| a.as_entity_ref()) {
            Some(id) => Ok(Some(self.get(id)?)),
            None => Ok(None),
        }
    }

    /// Append a new instance; returns its id
    pub fn add(&mut self, type_name: &str, attributes: Vec<AttributeValue>) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.added_positions.insert(id, self.added.len());
        self.added.push(DecodedEntity::new(id, type_name, attributes));
        id
    }

    /// Replace an existing instance with an edited version
    pub fn replace(&mut self, entity: DecodedEntity) -> Result<()> {
        if let Some(&pos) = self.added_positions.get(&entity.id) {
            self.added[pos] = entity;
            return Ok(());
        }
        if !self.positions.contains_key(&entity.id) {
            return Err(Error::EntityNotFound(entity.id));
        }
        self.decoder.invalidate(entity.id);
        self.edits.insert(entity.id, entity);
        Ok(())
    }

    /// Overwrite one attribute of an instance
    pub fn set_attribute(&mut self, id: u32, index: usize, value: AttributeValue) -> Result<()> {
        let mut entity = self.get(id)?;
        if !entity.set(index, value) {
            return Err(Error::InvalidAttribute { id, index });
        }
        self.replace(entity)
    }

    /// Serialize the model as STEP text
    pub fn to_step_string(&self) -> String {
        let added_len: usize = self.added.len() * 96;
        let mut out = String::with_capacity(self.content.len() + added_len);
        let mut cursor = 0;

        for loc in &self.order {
            out.push_str(&self.content[cursor..loc.start]);
            match self.edits.get(&loc.id) {
                Some(entity) => out.push_str(&entity_to_step(entity)),
                None => out.push_str(&self.content[loc.start..loc.end]),
            }
            cursor = loc.end;
        }

        out.push_str(&self.content[cursor..self.data_end]);
        if !self.added.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for entity in &self.added {
            out.push_str(&entity_to_step(entity));
            out.push('\n');
        }
        out.push_str(&self.content[self.data_end..]);

        out
    }

    /// Write the model as STEP text
    pub fn write<W: std::io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self.to_step_string().as_bytes())?;
        Ok(())
    }
}

/// First schema identifier in `FILE_SCHEMA(('IFC4'))`
fn parse_file_schema(header: &str) -> Option<&str> {
    let at = header.find("FILE_SCHEMA")?;
    let rest = &header[at..];
    let open = rest.find('\'')? + 1;
    let close = rest[open..].find('\'')? + open;
    Some(&rest[open..close])
}
