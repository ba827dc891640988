use axum::{
    body::Body,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::{Json, Response},
};
use serde_json::{json, Value};

use crate::build::BuildError;
use crate::upload::{UploadError, UploadForm};
use crate::AppState;

/// Health check
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Upload assets + transform → packaged bundle download
pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, (StatusCode, String)> {
    let form = UploadForm::from_multipart(multipart)
        .await
        .map_err(upload_error)?;

    let bundle = state
        .orchestrator
        .build(form.assets, form.transform)
        .await
        .map_err(build_error)?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, "attachment; filename=\"hat\"")
        .header("x-build-id", bundle.id.as_str())
        .body(Body::from(bundle.bytes))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

fn upload_error(e: UploadError) -> (StatusCode, String) {
    tracing::warn!("Rejected upload: {}", e);
    (StatusCode::BAD_REQUEST, e.to_string())
}

fn build_error(e: BuildError) -> (StatusCode, String) {
    let status = status_for(&e);
    if status.is_server_error() {
        tracing::error!("Build error: {}", e);
    } else {
        tracing::warn!("Build rejected: {}", e);
    }
    (status, e.to_string())
}

/// HTTP status reported for a build failure
pub fn status_for(e: &BuildError) -> StatusCode {
    match e {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        BuildError::Busy => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
