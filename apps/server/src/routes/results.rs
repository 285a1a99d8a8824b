// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stored marking results and downloads.

use crate::error::ApiError;
use crate::services::marking::{output_key, report_key};
use crate::types::MarkResponse;
use crate::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};

async fn stored_result(state: &AppState, key: &str) -> Result<MarkResponse, ApiError> {
    match state.cache.get::<MarkResponse>(&report_key(key)).await? {
        Some(result) => {
            tracing::debug!(key = %key, "Cache HIT");
            Ok(result)
        }
        None => {
            tracing::debug!(key = %key, "Cache MISS");
            Err(ApiError::NotFound(format!("Result not found: {}", key)))
        }
    }
}

/// GET /api/v1/results/:key - Report of a marking run.
pub async fn get_result(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<MarkResponse>, ApiError> {
    Ok(Json(stored_result(&state, &key).await?))
}

/// GET /api/v1/downloads/:key - The marked IFC file.
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    let result = stored_result(&state, &key).await?;
    let data = state
        .cache
        .get_bytes(&output_key(&key))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Output not found: {}", key)))?;

    tracing::info!(key = %key, file_name = %result.file_name, size = data.len(), "Download");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, content_disposition(&result.file_name))
        .header(header::CONTENT_LENGTH, data.len())
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

/// `attachment` header with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len() * 3);
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_ascii_and_encodes_utf8() {
        assert_eq!(
            content_disposition("modell_farget.ifc"),
            "attachment; filename=\"modell_farget.ifc\"; filename*=UTF-8''modell_farget.ifc"
        );
        assert_eq!(
            content_disposition("Bygg Ø_farget.ifc"),
            "attachment; filename=\"Bygg __farget.ifc\"; filename*=UTF-8''Bygg%20%C3%98_farget.ifc"
        );
    }
}
