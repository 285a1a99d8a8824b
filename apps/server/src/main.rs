// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC Marker Server - marks IFC elements by property value.
//!
//! Upload a model, browse its property sets, preview the elements carrying
//! a value, then colour and tag them and download the marked file.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/palette` - Marking colours
//! - `POST /api/v1/models` - Upload an IFC file (multipart)
//! - `GET /api/v1/models/:key/index` - Property set index
//! - `POST /api/v1/models/:key/matches` - Match preview
//! - `POST /api/v1/models/:key/mark` - Mark matching elements
//! - `POST /api/v1/models/:key/mark/stream` - Mark with progress (SSE)
//! - `GET /api/v1/results/:key` - Stored run report
//! - `GET /api/v1/downloads/:key` - Marked IFC file

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod routes;
mod services;
mod types;

use config::Config;
use services::{DiskCache, ModelStore};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DiskCache>,
    pub config: Arc<Config>,
    pub sessions: Arc<ModelStore>,
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_bytes();
    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        .route("/api/v1/palette", get(routes::palette::list))
        // Model endpoints
        .route("/api/v1/models", post(routes::models::upload))
        .route("/api/v1/models/:key/index", get(routes::models::index))
        .route("/api/v1/models/:key/matches", post(routes::models::matches))
        .route("/api/v1/models/:key/mark", post(routes::mark::mark))
        .route("/api/v1/models/:key/mark/stream", post(routes::mark::mark_stream))
        // Stored results
        .route("/api/v1/results/:key", get(routes::results::get_result))
        .route("/api/v1/downloads/:key", get(routes::results::download))
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,ifc_marker_server=debug".into()),
        )
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        cache_dir = %config.cache_dir,
        max_file_size_mb = config.max_file_size_mb,
        max_models = config.max_models,
        author = %config.identity.author,
        "Starting IFC Marker Server"
    );

    let cache = Arc::new(DiskCache::new(&config.cache_dir).await);
    let sessions = Arc::new(ModelStore::new(config.max_models));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        cache,
        config: Arc::new(config),
        sessions,
    };
    let app = build_router(state);

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const KONTOR: &str = include_str!("../../../rust/marker/tests/fixtures/kontor.ifc");
    const BOUNDARY: &str = "ifc-marker-boundary";

    async fn test_app() -> Router {
        test_app_with_limit(500).await
    }

    async fn test_app_with_limit(max_file_size_mb: usize) -> Router {
        let cache_dir = std::env::temp_dir()
            .join(format!("ifc-marker-server-{}", uuid::Uuid::new_v4()))
            .to_string_lossy()
            .into_owned();
        let config = Config {
            cache_dir: cache_dir.clone(),
            max_file_size_mb,
            max_models: 4,
            ..Config::default()
        };
        build_router(AppState {
            cache: Arc::new(DiskCache::new(&cache_dir).await),
            config: Arc::new(config),
            sessions: Arc::new(ModelStore::new(4)),
        })
    }

    fn multipart_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{n}\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = BOUNDARY,
            n = field,
            f = file_name
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::post("/api/v1/models")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn upload_request(file_name: &str, content: &str) -> Request<Body> {
        multipart_request("file", file_name, content.as_bytes())
    }

    /// KONTOR followed by a STEP comment, `size` bytes in total
    fn padded_kontor(size: usize) -> String {
        let mut content = String::with_capacity(size);
        content.push_str(KONTOR);
        content.push_str("/*");
        while content.len() < size - 2 {
            content.push('x');
        }
        content.push_str("*/");
        content
    }

    fn json_request(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn upload_kontor(app: &Router) -> String {
        let (status, body) = send_json(app, upload_request("kontor.ifc", KONTOR)).await;
        assert_eq!(status, StatusCode::OK);
        body["key"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_and_palette() {
        let app = test_app().await;

        let (status, body) = send_json(&app, Request::get("/api/v1/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send_json(&app, Request::get("/api/v1/palette").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        let colours = body.as_array().unwrap();
        assert_eq!(colours.len(), 9);
        assert!(colours.iter().any(|c| c["name"] == "Rosa"));
    }

    #[tokio::test]
    async fn upload_index_and_matches() {
        let app = test_app().await;

        let (status, body) = send_json(&app, upload_request("kontor.ifc", KONTOR)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["schema_version"], "IFC4");
        assert_eq!(body["reused"], false);
        let key = body["key"].as_str().unwrap().to_string();
        assert!(body["psets"]
            .as_array()
            .unwrap()
            .iter()
            .any(|p| p["name"] == "Felles"));

        let (_, again) = send_json(&app, upload_request("kontor.ifc", KONTOR)).await;
        assert_eq!(again["key"], key.as_str());
        assert_eq!(again["reused"], true);

        let (status, index) = send_json(
            &app,
            Request::get(format!("/api/v1/models/{}/index", key))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(index["key"], key.as_str());

        let (status, matches) = send_json(
            &app,
            json_request(
                &format!("/api/v1/models/{}/matches", key),
                json!({"pset": "Felles", "property": "MMI", "value": "700"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(matches["filter"], "Felles.MMI=700");
        assert_eq!(matches["unique_elements"], 3);
        assert_eq!(matches["elements"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn mark_rejects_bad_requests() {
        let app = test_app().await;
        let key = upload_kontor(&app).await;
        let uri = format!("/api/v1/models/{}/mark", key);

        let (status, body) = send_json(
            &app,
            json_request(&uri, json!({"pset": "Felles", "property": "MMI", "value": "500", "colour": "Rosa"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "NO_MATCHES");
        assert_eq!(body["error"], "No elements found with Felles.MMI=500");

        let (status, body) = send_json(
            &app,
            json_request(&uri, json!({"pset": "Felles", "property": "MMI", "value": "700", "colour": "Svart"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNKNOWN_COLOUR");
    }

    #[tokio::test]
    async fn mark_store_and_download() {
        let app = test_app().await;
        let key = upload_kontor(&app).await;

        let (status, result) = send_json(
            &app,
            json_request(
                &format!("/api/v1/models/{}/mark", key),
                json!({"pset": "Felles", "property": "MMI", "value": "700", "colour": "Rosa"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["file_name"], "kontor_farget.ifc");
        assert_eq!(result["report"]["total"], 3);
        assert_eq!(result["report"]["psets_updated"], 1);
        let result_key = result["result_key"].as_str().unwrap().to_string();

        let (status, stored) = send_json(
            &app,
            Request::get(format!("/api/v1/results/{}", result_key))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["report"], result["report"]);

        let response = app
            .clone()
            .oneshot(
                Request::get(result["download_url"].as_str().unwrap())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("kontor_farget.ifc"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("ISO-10303-21;"));
        assert!(text.contains("'NOSKI_Eksisterende_Rosa'"));
        assert_eq!(text.len(), result["output_size"].as_u64().unwrap() as usize);
    }

    #[tokio::test]
    async fn stream_ends_with_complete_event() {
        let app = test_app().await;
        let key = upload_kontor(&app).await;

        let (status, body) = send(
            &app,
            json_request(
                &format!("/api/v1/models/{}/mark/stream", key),
                json!({"pset": "Felles", "property": "MMI", "value": "700", "colour": "Blå"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let events: Vec<Value> = String::from_utf8(body)
            .unwrap()
            .lines()
            .filter_map(|line| line.strip_prefix("data: "))
            .map(|data| serde_json::from_str(data).unwrap())
            .collect();
        assert_eq!(events.first().unwrap()["type"], "progress");
        assert_eq!(events.first().unwrap()["percent"], 0);
        let last = events.last().unwrap();
        assert_eq!(last["type"], "complete");
        assert_eq!(last["result"]["report"]["total"], 3);
    }

    #[tokio::test]
    async fn oversized_uploads_are_payload_too_large() {
        let app = test_app_with_limit(1).await;
        let limit = 1024 * 1024;

        // Just over the limit: reaches the size check
        let (status, body) = send_json(&app, upload_request("stor.ifc", &padded_kontor(limit + 16))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "FILE_TOO_LARGE");

        // Far over the limit: cut off by the body limit while reading
        let (status, body) = send_json(&app, upload_request("stor.ifc", &padded_kontor(2 * limit))).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["code"], "FILE_TOO_LARGE");

        let (status, _) = send_json(&app, upload_request("kontor.ifc", KONTOR)).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_malformed_uploads() {
        let app = test_app().await;

        let mut latin1 = KONTOR.as_bytes().to_vec();
        latin1.extend_from_slice(b"/* Modellverkt\xF8y */");
        let (status, body) = send_json(&app, multipart_request("file", "latin1.ifc", &latin1)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_UTF8");

        let (status, body) = send_json(&app, multipart_request("vedlegg", "kontor.ifc", KONTOR.as_bytes())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "MISSING_FILE");
    }

    #[tokio::test]
    async fn reupload_under_new_name_updates_download_name() {
        let app = test_app().await;
        let key = upload_kontor(&app).await;

        let (status, body) = send_json(&app, upload_request("kontor_v2.ifc", KONTOR)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["key"], key.as_str());
        assert_eq!(body["reused"], true);
        assert_eq!(body["file_name"], "kontor_v2.ifc");

        let (status, result) = send_json(
            &app,
            json_request(
                &format!("/api/v1/models/{}/mark", key),
                json!({"pset": "Felles", "property": "MMI", "value": "700", "colour": "Gul"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["file_name"], "kontor_v2_farget.ifc");
    }

    #[tokio::test]
    async fn rejects_non_ifc_and_unknown_models() {
        let app = test_app().await;

        let (status, body) = send_json(&app, upload_request("kontor.txt", KONTOR)).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["code"], "UNSUPPORTED_FILE");

        let (status, body) = send_json(&app, upload_request("tom.ifc", "not a step file")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "INVALID_MODEL");

        let (status, body) = send_json(
            &app,
            Request::get("/api/v1/models/unknown/index").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
