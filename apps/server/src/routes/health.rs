// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check and service description endpoints.

use axum::Json;
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/api/v1/health", "Health check endpoint"),
    ("GET", "/api/v1/palette", "Marking colours"),
    ("POST", "/api/v1/models", "Upload an IFC file (multipart field 'file')"),
    ("GET", "/api/v1/models/:key/index", "Property set / property / value index"),
    ("POST", "/api/v1/models/:key/matches", "Elements carrying a property value"),
    ("POST", "/api/v1/models/:key/mark", "Colour and tag matching elements"),
    ("POST", "/api/v1/models/:key/mark/stream", "Marking with progress (Server-Sent Events)"),
    ("GET", "/api/v1/results/:key", "Report of a marking run"),
    ("GET", "/api/v1/downloads/:key", "Download a marked IFC file"),
];

/// GET /api/v1/health - Health check endpoint.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "ifc-marker-server",
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    Json(ApiInfoResponse {
        service: "ifc-marker-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Marks IFC elements that share a property value with a colour and a \
                      NOSKI_Eksisterende property set. Upload a model, pick a property set, \
                      property and value, choose a colour and download the marked file.",
        endpoints: ENDPOINTS
            .iter()
            .map(|&(method, path, description)| EndpointInfo {
                method,
                path,
                description,
            })
            .collect(),
    })
}
