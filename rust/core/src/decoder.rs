// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Decoder - On-demand entity parsing
//!
//! Lazily decode IFC entities from byte spans without decoding the whole file.
//! The caller owns the span index; the decoder only parses and caches.

use crate::attribute::{AttributeValue, DecodedEntity};
use crate::error::{Error, Result};
use crate::parser::parse_entity;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Lazy decoder over the original file text. Decoded entities are cached
/// behind `Arc` and handed out as clones.
pub struct EntityDecoder<'a> {
    content: &'a str,
    cache: FxHashMap<u32, Arc<DecodedEntity>>,
}

impl<'a> EntityDecoder<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            cache: FxHashMap::default(),
        }
    }

    /// Decode the instance spanning `start..end`
    pub fn decode_at(&mut self, start: usize, end: usize) -> Result<DecodedEntity> {
        let line = self
            .content
            .get(start..end)
            .ok_or_else(|| Error::parse(start, "span outside content"))?;
        let (id, type_name, tokens) = parse_entity(line).map_err(|e| {
            Error::parse(
                start,
                format!("{}, input: {:?}", e, &line[..line.len().min(100)]),
            )
        })?;

        if let Some(entity) = self.cache.get(&id) {
            return Ok(entity.as_ref().clone());
        }

        let attributes = tokens.iter().map(AttributeValue::from_token).collect();
        let entity = DecodedEntity::new(id, type_name, attributes);
        self.cache.insert(id, Arc::new(entity.clone()));
        Ok(entity)
    }

    /// Like `decode_at`, but a cached `id` skips parsing
    pub fn decode_at_with_id(&mut self, id: u32, start: usize, end: usize) -> Result<DecodedEntity> {
        if let Some(entity) = self.cache.get(&id) {
            return Ok(entity.as_ref().clone());
        }
        self.decode_at(start, end)
    }

    /// Drop a cached entity so the next lookup decodes it again
    pub fn invalidate(&mut self, entity_id: u32) {
        self.cache.remove(&entity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::EntityScanner;

    const CONTENT: &str = "\
#1=IFCCOLOURRGB($,1.,0.5,0.4);
#2=IFCSURFACESTYLERENDERING(#1,0.,$,$,$,$,$,$,.METAL.);
#3=IFCSURFACESTYLE('NOSKI_Eksisterende_Rosa',.BOTH.,(#2));
";

    fn span(id: u32) -> (usize, usize) {
        let mut scanner = EntityScanner::new(CONTENT);
        std::iter::from_fn(|| scanner.next_entity())
            .find(|(found, _, _, _)| *found == id)
            .map(|(_, _, start, end)| (start, end))
            .unwrap()
    }

    #[test]
    fn decodes_instance_at_span() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let (start, end) = span(3);
        let style = decoder.decode_at(start, end).unwrap();
        assert_eq!(style.id, 3);
        assert_eq!(style.get_string(0), Some("NOSKI_Eksisterende_Rosa"));
        assert_eq!(style.get_refs(2), vec![2]);
    }

    #[test]
    fn cached_ids_skip_parsing_until_invalidated() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let (start, end) = span(1);
        let colour = decoder.decode_at_with_id(1, start, end).unwrap();

        // An empty span would fail to parse; the cache answers instead
        assert_eq!(decoder.decode_at_with_id(1, 0, 0).unwrap(), colour);

        decoder.invalidate(1);
        assert!(matches!(
            decoder.decode_at_with_id(1, 0, 0),
            Err(Error::Parse { .. })
        ));
    }
}
