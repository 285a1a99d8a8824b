// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use ifc_marker::Selection;
use serde::Deserialize;

/// Body of the matches endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequest {
    pub pset: String,
    pub property: String,
    pub value: String,
}

impl MatchRequest {
    pub fn selection(&self) -> Selection {
        Selection::new(&self.pset, &self.property, &self.value)
    }
}

/// Body of the mark endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkRequest {
    #[serde(flatten)]
    pub selection: MatchRequest,
    /// Palette colour name, e.g. `Rosa`.
    pub colour: String,
}
