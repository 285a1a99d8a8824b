// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use ifc_marker::MarkerIdentity;

/// Headroom for multipart boundaries and part headers.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory for cache storage.
    pub cache_dir: String,
    /// Maximum file size in MB.
    pub max_file_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Number of uploaded models kept in memory.
    pub max_models: usize,
    /// Identity written into marker property sets.
    pub identity: MarkerIdentity,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = MarkerIdentity::default();

        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .unwrap_or(8080),
            cache_dir: std::env::var("CACHE_DIR").unwrap_or_else(|_| {
                // Docker: /app/cache (created in Dockerfile), local dev: ./.cache
                if std::path::Path::new("/.dockerenv").exists() {
                    "/app/cache".into()
                } else {
                    std::env::current_dir()
                        .ok()
                        .and_then(|dir| dir.join(".cache").to_str().map(|s| s.to_string()))
                        .unwrap_or_else(|| "./.cache".into())
                }
            }),
            max_file_size_mb: std::env::var("MAX_FILE_SIZE_MB")
                .unwrap_or_else(|_| "500".into())
                .parse()
                .unwrap_or(500),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .unwrap_or(300),
            max_models: std::env::var("MAX_MODELS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(16),
            identity: MarkerIdentity {
                author: std::env::var("MARKER_AUTHOR").unwrap_or(defaults.author),
                contact: std::env::var("MARKER_CONTACT").unwrap_or(defaults.contact),
                email: std::env::var("MARKER_EMAIL").unwrap_or(defaults.email),
                generator: std::env::var("MARKER_GENERATOR").unwrap_or(defaults.generator),
            },
        }
    }

    /// Upload limit in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Request body limit: the upload limit plus room for multipart framing,
    /// so a file just over the limit still reaches the size check.
    pub fn max_body_bytes(&self) -> usize {
        self.max_file_size_bytes() + MULTIPART_OVERHEAD_BYTES
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
