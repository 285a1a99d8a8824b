// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded attribute values and entities
//!
//! Owned counterparts of parser tokens. Strings are stored decoded; the
//! writer re-encodes them.

use crate::parser::Token;
use crate::step_string;

/// IFC entity attribute value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    /// Entity reference
    EntityRef(u32),
    /// String value
    String(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enum value (without the dots)
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value such as IFCLABEL('x')
    Typed(String, Vec<AttributeValue>),
    /// Null/undefined
    Null,
    /// Derived value (*)
    Derived,
}

impl AttributeValue {
    /// Convert from Token
    pub fn from_token(token: &Token) -> Self {
        match token {
            Token::EntityRef(id) => AttributeValue::EntityRef(*id),
            Token::String(s) => AttributeValue::String(step_string::decode(s)),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(e) => AttributeValue::Enum(e.to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Self::from_token).collect())
            }
            Token::TypedValue(type_name, args) => AttributeValue::Typed(
                type_name.to_ascii_uppercase(),
                args.iter().map(Self::from_token).collect(),
            ),
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }

    /// Typed value with a single argument, e.g. `IFCLABEL('700')`
    pub fn typed(type_name: &str, value: AttributeValue) -> Self {
        AttributeValue::Typed(type_name.to_ascii_uppercase(), vec![value])
    }

    /// `IFCLABEL('text')`
    pub fn label(text: impl Into<String>) -> Self {
        Self::typed("IFCLABEL", AttributeValue::String(text.into()))
    }

    /// List of entity references
    pub fn ref_list(ids: impl IntoIterator<Item = u32>) -> Self {
        AttributeValue::List(ids.into_iter().map(AttributeValue::EntityRef).collect())
    }

    /// Get as entity reference
    #[inline]
    pub fn as_entity_ref(&self) -> Option<u32> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Get as string
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get typed value parts: (type name, arguments)
    #[inline]
    pub fn as_typed(&self) -> Option<(&str, &[AttributeValue])> {
        match self {
            AttributeValue::Typed(name, args) => Some((name, args)),
            _ => None,
        }
    }

    /// Entity references held by this value: a single reference, or every
    /// reference in a list. Select-typed attributes use either form.
    pub fn entity_refs(&self) -> Vec<u32> {
        match self {
            AttributeValue::EntityRef(id) => vec![*id],
            AttributeValue::List(items) => items.iter().filter_map(|v| v.as_entity_ref()).collect(),
            _ => Vec::new(),
        }
    }
}

/// Decoded IFC entity with attributes
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodedEntity {
    pub id: u32,
    /// Type keyword in upper case, as written to the file
    pub type_name: String,
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Create new decoded entity
    pub fn new(id: u32, type_name: &str, attributes: Vec<AttributeValue>) -> Self {
        Self {
            id,
            type_name: type_name.to_ascii_uppercase(),
            attributes,
        }
    }

    /// Check the entity type, ignoring case
    #[inline]
    pub fn is(&self, type_name: &str) -> bool {
        self.type_name.eq_ignore_ascii_case(type_name)
    }

    /// Get attribute by index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference attribute
    pub fn get_ref(&self, index: usize) -> Option<u32> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string attribute
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Entity references held by an attribute (single or list)
    pub fn get_refs(&self, index: usize) -> Vec<u32> {
        self.get(index).map(|v| v.entity_refs()).unwrap_or_default()
    }

    /// Replace an attribute, returning false when the index is out of range
    pub fn set(&mut self, index: usize, value: AttributeValue) -> bool {
        match self.attributes.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_entity;

    fn decode(line: &str) -> DecodedEntity {
        let (id, type_name, tokens) = parse_entity(line).unwrap();
        DecodedEntity::new(id, type_name, tokens.iter().map(AttributeValue::from_token).collect())
    }

    #[test]
    fn strings_are_decoded() {
        let entity = decode("#5=IfcWall('2O2Fr$t4X7Zf8NOew3FLOH',$,'Vegg s\\X2\\00F8\\X0\\r',$,$,$,$,$);");
        assert_eq!(entity.get_string(2), Some("Vegg sør"));
        assert_eq!(entity.type_name, "IFCWALL");
    }

    #[test]
    fn typed_values_keep_their_type() {
        let entity = decode("#7=IFCPROPERTYSINGLEVALUE('MMI',$,IFCINTEGER(700),$);");
        let (name, args) = entity.get(2).unwrap().as_typed().unwrap();
        assert_eq!(name, "IFCINTEGER");
        assert_eq!(args, &[AttributeValue::Integer(700)]);
    }

    #[test]
    fn entity_refs_accept_single_and_list() {
        let entity = decode("#9=IFCRELDEFINESBYPROPERTIES('g',$,$,$,(#1,#2),#3);");
        assert_eq!(entity.get_refs(4), vec![1, 2]);
        assert_eq!(entity.get_refs(5), vec![3]);
        assert!(entity.get_refs(2).is_empty());
    }

    #[test]
    fn set_replaces_attribute() {
        let mut entity = decode("#11=IFCSTYLEDITEM(#4,(#5),$);");
        assert!(entity.set(1, AttributeValue::ref_list([8])));
        assert_eq!(entity.get_refs(1), vec![8]);
        assert!(!entity.set(9, AttributeValue::Null));
    }
}
