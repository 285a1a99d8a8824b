// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marking endpoints.

use crate::error::ApiError;
use crate::services::marking::{execute, execute_streaming, prepare};
use crate::types::{MarkEvent, MarkRequest, MarkResponse};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::StreamExt;
use std::convert::Infallible;

/// POST /api/v1/models/:key/mark - Colour and tag matching elements.
pub async fn mark(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<MarkRequest>,
) -> Result<Json<MarkResponse>, ApiError> {
    let run = prepare(&state, &key, &request).await?;
    tracing::info!(key = %key, colour = %request.colour, elements = run.unique_elements(), "Marking");

    let response = execute(state.cache.clone(), state.config.identity.clone(), run, None).await?;
    Ok(Json(response))
}

/// POST /api/v1/models/:key/mark/stream - Marking with SSE progress.
pub async fn mark_stream(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<MarkRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let run = prepare(&state, &key, &request).await?;
    tracing::info!(key = %key, colour = %request.colour, elements = run.unique_elements(), "Marking (stream)");

    let stream = execute_streaming(state.cache.clone(), state.config.identity.clone(), run).map(
        |event: MarkEvent| {
            let json = serde_json::to_string(&event).unwrap_or_else(|e| {
                format!(r#"{{"type":"error","message":"{}","code":"INTERNAL_ERROR"}}"#, e)
            });
            Ok(Event::default().data(json))
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
