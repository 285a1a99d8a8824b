// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Marker
//!
//! Tags IFC elements that carry a chosen property value. Every matching
//! element gets a metallic colour override on its shape representation
//! items and a `NOSKI_Eksisterende` property set describing the marking.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_marker::{mark, output_file_name, IfcModel, MarkOptions, PsetIndex, Selection};
//!
//! let mut model = IfcModel::open(&content)?;
//! let index = PsetIndex::build(&mut model);
//! for pset in index.pset_names() {
//!     println!("{pset}: {:?}", index.property_names(pset));
//! }
//!
//! let selection = Selection::new("Felles", "MMI", "700");
//! let outcome = mark(&content, &selection, "Rosa", &MarkOptions::default(), |p| {
//!     println!("{}% {}", p.percent, p.message);
//! })?;
//! std::fs::write(output_file_name("modell.ifc"), outcome.output)?;
//! ```

pub mod error;
pub mod matcher;
pub mod palette;
pub mod pipeline;
pub mod pset;
pub mod pset_index;
pub mod relations;
pub mod style;
pub mod styled_items;
pub mod value;

pub use error::{MarkError, Result};
pub use matcher::{find_elements, find_elements_with, Match, MatchSet, PreviewRow, Selection};
pub use palette::{find_colour, Colour, PALETTE};
pub use pipeline::{
    mark, mark_elements, output_file_name, ElementReport, MarkOptions, MarkOutcome, MarkReport,
    Progress, ProgressStage,
};
pub use pset::{add_marker_pset, marker_properties, MarkerIdentity, PsetChange};
pub use pset_index::{PropertySummary, PsetIndex, PsetSummary, ValueCount};
pub use relations::PropertyRelations;
pub use style::{get_or_create_style, style_name, StyleHandle, PSET_NAME};
pub use styled_items::{apply_colour, StyledItemIndex};
pub use value::{display_value, NO_VALUE};

pub use ifc_marker_core::{IfcModel, SchemaVersion};
