// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Marking runs on uploaded models.
//!
//! A run is validated up front (colour, model, non-empty match set) so that
//! request errors surface as HTTP statuses, then executed on the blocking
//! pool. Outputs and reports are stored in the disk cache under the SHA256
//! of the marked file.

use crate::error::ApiError;
use crate::services::cache::DiskCache;
use crate::services::sessions::ModelSession;
use crate::types::{MarkEvent, MarkRequest, MarkResponse};
use crate::AppState;
use async_stream::stream;
use futures::Stream;
use ifc_marker::{find_colour, mark_elements, output_file_name, MarkOptions, MarkerIdentity, MatchSet, Progress};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Cache key of a marked file.
pub fn output_key(result_key: &str) -> String {
    format!("output:{}", result_key)
}

/// Cache key of a run's report.
pub fn report_key(result_key: &str) -> String {
    format!("report:{}", result_key)
}

/// A validated run, ready to execute.
pub struct PreparedRun {
    session: Arc<ModelSession>,
    matches: Arc<MatchSet>,
    colour: String,
    /// Upload name at the time of the request
    file_name: String,
}

impl PreparedRun {
    pub fn unique_elements(&self) -> usize {
        self.matches.unique_count()
    }
}

/// Check the request against the palette and the model's matches.
pub async fn prepare(
    state: &AppState,
    model_key: &str,
    request: &MarkRequest,
) -> Result<PreparedRun, ApiError> {
    let colour = find_colour(&request.colour)?;
    let session = state.sessions.require(model_key).await?;

    let selection = request.selection.selection();
    let matches = session.matches(&selection).await?;
    if matches.unique_count() == 0 {
        return Err(ApiError::NoMatches(selection.filter_info()));
    }

    let file_name = session.file_name().await;
    Ok(PreparedRun {
        session,
        matches,
        colour: colour.name.to_string(),
        file_name,
    })
}

/// Mark, store the output and return the stored result.
pub async fn execute(
    cache: Arc<DiskCache>,
    identity: MarkerIdentity,
    run: PreparedRun,
    progress: Option<mpsc::UnboundedSender<Progress>>,
) -> Result<MarkResponse, ApiError> {
    let start = std::time::Instant::now();
    let content = run.session.content.clone();
    let matches = run.matches.clone();
    let colour = run.colour.clone();
    let options = MarkOptions::today(identity);

    let outcome = tokio::task::spawn_blocking(move || {
        mark_elements(&content, &matches, &colour, &options, |update| {
            if let Some(tx) = &progress {
                // Receiver gone means the client disconnected; keep going
                let _ = tx.send(update.clone());
            }
        })
    })
    .await??;

    let result_key = DiskCache::generate_key(outcome.output.as_bytes());
    let response = MarkResponse {
        result_key: result_key.clone(),
        model_key: run.session.key.clone(),
        file_name: output_file_name(&run.file_name),
        download_url: format!("/api/v1/downloads/{}", result_key),
        output_size: outcome.output.len(),
        created_at: chrono::Utc::now(),
        report: outcome.report,
    };

    cache
        .set_bytes(&output_key(&result_key), outcome.output.as_bytes())
        .await?;
    cache.set(&report_key(&result_key), &response).await?;

    tracing::info!(
        model_key = %response.model_key,
        result_key = %result_key,
        total = response.report.total,
        coloured = response.report.coloured,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Stored marked model"
    );

    Ok(response)
}

/// Execute a run, yielding progress events and a final result or error.
pub fn execute_streaming(
    cache: Arc<DiskCache>,
    identity: MarkerIdentity,
    run: PreparedRun,
) -> impl Stream<Item = MarkEvent> + Send {
    let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();
    let task = tokio::spawn(execute(cache, identity, run, Some(tx)));

    stream! {
        while let Some(update) = rx.recv().await {
            yield MarkEvent::Progress(update);
        }

        match task.await {
            Ok(Ok(result)) => yield MarkEvent::Complete { result },
            Ok(Err(e)) => {
                let (_, code) = e.status_and_code();
                yield MarkEvent::Error {
                    message: e.to_string(),
                    code: code.to_string(),
                };
            }
            Err(e) => {
                yield MarkEvent::Error {
                    message: format!("Marking task failed: {}", e),
                    code: "TASK_ERROR".to_string(),
                };
            }
        }
    }
}
