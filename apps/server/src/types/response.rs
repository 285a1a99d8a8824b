// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use ifc_marker::{MarkReport, PreviewRow, Progress, PsetSummary};
use serde::{Deserialize, Serialize};

/// A palette entry.
#[derive(Debug, Clone, Serialize)]
pub struct ColourInfo {
    pub name: &'static str,
    pub rgb: [f64; 3],
    pub hex: String,
}

/// Uploaded model with its property set index.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    /// SHA256 of the uploaded file, used in later requests.
    pub key: String,
    pub file_name: String,
    pub schema_version: String,
    pub entity_count: usize,
    /// Whether an earlier upload of the same bytes was reused.
    pub reused: bool,
    pub psets: Vec<PsetSummary>,
}

/// Property set index of an uploaded model.
#[derive(Debug, Clone, Serialize)]
pub struct IndexResponse {
    pub key: String,
    pub psets: Vec<PsetSummary>,
}

/// Elements matching a selection.
#[derive(Debug, Clone, Serialize)]
pub struct MatchesResponse {
    /// `pset.property=value`
    pub filter: String,
    /// Occurrences of the value in the index.
    pub index_count: usize,
    /// Matches including duplicates.
    pub total_matches: usize,
    pub unique_elements: usize,
    pub elements: Vec<PreviewRow>,
}

/// Stored outcome of a marking run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkResponse {
    /// Key for the results and downloads endpoints.
    pub result_key: String,
    pub model_key: String,
    /// `<stem>_farget.ifc`
    pub file_name: String,
    pub download_url: String,
    pub output_size: usize,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub report: MarkReport,
}

/// Server-Sent Event types for the streaming mark endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkEvent {
    /// Progress update.
    Progress(Progress),

    /// Run finished and stored.
    Complete { result: MarkResponse },

    /// Run failed.
    Error { message: String, code: String },
}
