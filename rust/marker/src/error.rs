// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for marking operations
pub type Result<T> = std::result::Result<T, MarkError>;

/// Errors that can occur while indexing or marking a model
#[derive(Error, Debug)]
pub enum MarkError {
    #[error(transparent)]
    Core(#[from] ifc_marker_core::Error),

    #[error("Unknown colour: {0}")]
    UnknownColour(String),

    #[error("No elements found with {0}")]
    NoMatches(String),

    #[error("Invalid style: {0}")]
    Style(String),
}
