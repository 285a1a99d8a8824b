// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Marker Core
//!
//! STEP/IFC reading and writing built with [nom](https://docs.rs/nom), for
//! tools that edit a handful of instances in an otherwise untouched model.
//!
//! ## Overview
//!
//! - **STEP Tokenization**: Zero-copy parsing of entity instances
//! - **Entity Scanning**: quote-aware instance discovery using [memchr](https://docs.rs/memchr)
//! - **Lazy Decoding**: On-demand attribute parsing with a per-model cache
//! - **Editing**: an overlay of edited and appended instances on top of the
//!   original text, written back byte-for-byte where nothing changed
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_marker_core::{AttributeValue, IfcModel};
//!
//! let mut model = IfcModel::open(&content)?;
//! for id in model.ids_of_type("IFCPROPERTYSET") {
//!     let pset = model.get(id)?;
//!     println!("#{} {:?}", id, pset.get_string(2));
//! }
//!
//! let label = model.add(
//!     "IFCPROPERTYSINGLEVALUE",
//!     vec![
//!         AttributeValue::String("Farge".into()),
//!         AttributeValue::Null,
//!         AttributeValue::label("Rosa"),
//!         AttributeValue::Null,
//!     ],
//! );
//! let output = model.to_step_string();
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization support for decoded data

pub mod attribute;
pub mod decoder;
pub mod error;
pub mod guid;
pub mod model;
pub mod parser;
pub mod schema;
pub mod step_string;
pub mod writer;

pub use attribute::{AttributeValue, DecodedEntity};
pub use decoder::EntityDecoder;
pub use error::{Error, Result};
pub use guid::new_global_id;
pub use model::{EntityLocation, IfcModel};
pub use parser::{parse_entity, EntityScanner, Token};
pub use schema::{display_type_name, is_product, product_type_name, SchemaVersion};
pub use writer::{entity_to_step, format_real};
