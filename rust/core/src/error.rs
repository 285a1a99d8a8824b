// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for parsing and editing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading, editing or writing a STEP file
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Invalid IFC file: {0}")]
    InvalidFile(String),

    #[error("Entity #{0} not found")]
    EntityNotFound(u32),

    #[error("Entity #{id} has no attribute {index}")]
    InvalidAttribute { id: u32, index: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a parse error at a byte position
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }
}
