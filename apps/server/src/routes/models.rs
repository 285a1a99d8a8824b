// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model upload, property set index and match preview endpoints.

use crate::error::ApiError;
use crate::services::{DiskCache, ModelSession};
use crate::types::{IndexResponse, MatchRequest, MatchesResponse, ModelResponse};
use crate::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};

/// File taken from a multipart request.
struct UploadedFile {
    file_name: String,
    data: Vec<u8>,
}

/// Extract file data from multipart request.
///
/// A body cut off by the request body limit is reported as `FileTooLarge`.
async fn extract_file(multipart: &mut Multipart, max_mb: usize) -> Result<UploadedFile, ApiError> {
    let too_large = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::FileTooLarge { max_mb }
        } else {
            ApiError::Multipart(e)
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(too_large)? {
        let field_name = field.name().unwrap_or_default().to_string();
        tracing::debug!(field_name = %field_name, "Processing multipart field");

        if field_name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.map_err(too_large)?;
            tracing::debug!(file_name = %file_name, size = bytes.len(), "Extracted file from multipart");
            return Ok(UploadedFile {
                file_name,
                data: bytes.to_vec(),
            });
        }
    }

    tracing::warn!("No 'file' field found in multipart request");
    Err(ApiError::MissingFile)
}

fn is_ifc_name(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("ifc"))
        .unwrap_or(false)
}

async fn model_response(session: &ModelSession, reused: bool) -> Result<ModelResponse, ApiError> {
    let index = session.index().await?;
    Ok(ModelResponse {
        key: session.key.clone(),
        file_name: session.file_name().await,
        schema_version: session.schema.to_string(),
        entity_count: session.entity_count,
        reused,
        psets: index.summary(),
    })
}

/// POST /api/v1/models - Upload an IFC file and index its property sets.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ModelResponse>, ApiError> {
    let upload = extract_file(&mut multipart, state.config.max_file_size_mb).await?;

    if !is_ifc_name(&upload.file_name) {
        return Err(ApiError::UnsupportedFile(upload.file_name));
    }
    if upload.data.len() > state.config.max_file_size_bytes() {
        return Err(ApiError::FileTooLarge {
            max_mb: state.config.max_file_size_mb,
        });
    }

    let key = DiskCache::generate_key(&upload.data);
    if let Some(session) = state.sessions.get(&key).await {
        tracing::info!(key = %key, "Model session HIT");
        session.set_file_name(&upload.file_name).await;
        return Ok(Json(model_response(&session, true).await?));
    }

    tracing::info!(key = %key, file_name = %upload.file_name, size = upload.data.len(), "Opening model");

    let content = String::from_utf8(upload.data)?;
    let file_name = upload.file_name;
    let open_name = file_name.clone();
    let session =
        tokio::task::spawn_blocking(move || ModelSession::open(key, open_name, content)).await??;
    // A concurrent upload of the same bytes may have won the insert
    let session = state.sessions.insert(session).await;
    session.set_file_name(&file_name).await;

    Ok(Json(model_response(&session, false).await?))
}

/// GET /api/v1/models/:key/index - Property set index.
pub async fn index(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<IndexResponse>, ApiError> {
    let session = state.sessions.require(&key).await?;
    let index = session.index().await?;
    Ok(Json(IndexResponse {
        key,
        psets: index.summary(),
    }))
}

/// POST /api/v1/models/:key/matches - Elements carrying a property value.
pub async fn matches(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchesResponse>, ApiError> {
    let session = state.sessions.require(&key).await?;
    let selection = request.selection();

    let index = session.index().await?;
    let set = session.matches(&selection).await?;

    Ok(Json(MatchesResponse {
        filter: selection.filter_info(),
        index_count: index.count(&selection.pset, &selection.property, &selection.value),
        total_matches: set.len(),
        unique_elements: set.unique_count(),
        elements: set.preview(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ifc_names_are_accepted() {
        assert!(is_ifc_name("modell.ifc"));
        assert!(is_ifc_name("Bygg A.IFC"));
        assert!(!is_ifc_name("modell.ifczip"));
        assert!(!is_ifc_name("modell"));
        assert!(!is_ifc_name(""));
    }
}
