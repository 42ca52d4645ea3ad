use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::{aggregate_scans, extract_client_ip, GeoIpReader, ScanStats};
use crate::config::Config;
use crate::models::{NewQrCode, QrCode};
use crate::qr::{parse_color, render_png_base64, QrRenderError};
use crate::storage::{Storage, StorageError};

pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub geoip: GeoIpReader,
    pub config: Config,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: msg.into() }),
    )
}

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "QR code not found".to_string(),
        }),
    )
}

fn internal(msg: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
}

// Rendering bounds; a QR symbol can be 177 modules wide, so anything past
// these produces images in the hundreds of megapixels.
const MAX_BOX_SIZE: i64 = 32;
const MAX_BORDER: i64 = 16;

#[derive(Debug, Deserialize)]
pub struct CreateQrRequest {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_bg_color")]
    pub bg_color: String,
    #[serde(default = "default_box_size")]
    pub box_size: i64,
    #[serde(default = "default_border")]
    pub border: i64,
}

fn default_color() -> String {
    "black".to_string()
}

fn default_bg_color() -> String {
    "white".to_string()
}

fn default_box_size() -> i64 {
    10
}

fn default_border() -> i64 {
    4
}

#[derive(Debug, Serialize)]
pub struct CreateQrResponse {
    pub qr_id: i64,
    pub qr_image_base64: String,
    pub redirect_url: String,
}

/// Create a new QR code and return its rendered image
pub async fn generate_qr(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateQrRequest>,
) -> Result<Json<CreateQrResponse>, ApiError> {
    let url = payload.url.trim().to_string();
    if url.is_empty() {
        return Err(bad_request("Missing 'url' parameter"));
    }

    if payload.box_size < 1 || payload.box_size > MAX_BOX_SIZE {
        return Err(bad_request(format!(
            "box_size must be between 1 and {}",
            MAX_BOX_SIZE
        )));
    }
    if payload.border < 0 || payload.border > MAX_BORDER {
        return Err(bad_request(format!(
            "border must be between 0 and {}",
            MAX_BORDER
        )));
    }
    if parse_color(&payload.color).is_none() {
        return Err(bad_request(format!("Unrecognized color '{}'", payload.color)));
    }
    if parse_color(&payload.bg_color).is_none() {
        return Err(bad_request(format!(
            "Unrecognized color '{}'",
            payload.bg_color
        )));
    }

    let new = NewQrCode {
        original_url: url.clone(),
        created_at: chrono::Utc::now().timestamp(),
        color: payload.color,
        bg_color: payload.bg_color,
        box_size: payload.box_size,
        border: payload.border,
    };

    let qr = state.storage.create_qr(&new).await.map_err(|e| {
        tracing::error!(error = %e, "failed to create QR code");
        internal("Failed to create QR code")
    })?;

    let redirect_url = state.config.redirect_url_for(qr.id);
    let qr_image_base64 = render_image(&qr, &redirect_url)?;

    tracing::info!(qr_id = qr.id, url = %url, "QR created");

    Ok(Json(CreateQrResponse {
        qr_id: qr.id,
        qr_image_base64,
        redirect_url,
    }))
}

fn render_image(qr: &QrCode, content: &str) -> Result<String, ApiError> {
    render_png_base64(
        content,
        &qr.color,
        &qr.bg_color,
        qr.box_size.clamp(1, MAX_BOX_SIZE) as u32,
        qr.border.clamp(0, MAX_BORDER) as u32,
    )
    .map_err(|e| match e {
        QrRenderError::CapacityExceeded => {
            bad_request("Payload exceeds QR code capacity")
        }
        QrRenderError::InvalidColor(c) => bad_request(format!("Unrecognized color '{}'", c)),
        other => {
            tracing::error!(error = %other, "failed to render QR image");
            internal("Failed to render QR image")
        }
    })
}

fn is_http_url(content: &str) -> bool {
    let lower = content.to_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Follow a QR code: redirect for URLs, render the raw text otherwise.
///
/// Scans are not recorded here; the frontend reports them through
/// /api/record-scan so a single visit produces a single row.
pub async fn follow_redirect(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    match state.storage.get_qr(id).await {
        Ok(Some(qr)) => {
            let content = qr.original_url.trim().to_string();
            if is_http_url(&content) {
                Redirect::temporary(&content).into_response()
            } else {
                Html(format!("<pre>{}</pre>", escape_html(&content))).into_response()
            }
        }
        Ok(None) => (StatusCode::NOT_FOUND, "QR code not found").into_response(),
        Err(e) => {
            tracing::error!(qr_id = id, error = %e, "failed to load QR code");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TargetResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: String,
}

/// Tell the frontend whether a QR code resolves to a URL or plain text
pub async fn classify_target(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<TargetResponse>, ApiError> {
    let qr = state
        .storage
        .get_qr(id)
        .await
        .map_err(|e| {
            tracing::error!(qr_id = id, error = %e, "failed to load QR code");
            internal("Failed to load QR code")
        })?
        .ok_or_else(not_found)?;

    let content = qr.original_url.trim().to_string();
    let kind = if is_http_url(&content) { "url" } else { "text" };

    Ok(Json(TargetResponse { kind, content }))
}

#[derive(Debug, Deserialize)]
pub struct RecordScanRequest {
    pub qr_id: i64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Record one scan event for a QR code
pub async fn record_scan(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<RecordScanRequest>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let ip = extract_client_ip(&headers, addr.ip(), &state.config.trusted_proxy).to_string();

    let user_agent = payload
        .user_agent
        .or_else(|| {
            headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        })
        .unwrap_or_default();

    let timestamp = chrono::Utc::now().timestamp();

    match state
        .storage
        .record_scan(payload.qr_id, &ip, &user_agent, timestamp)
        .await
    {
        Ok(_) => Ok(Json(SuccessResponse {
            message: "Scan recorded".to_string(),
        })),
        Err(StorageError::NotFound) => Err(not_found()),
        Err(StorageError::Other(e)) => {
            tracing::error!(qr_id = payload.qr_id, error = %e, "failed to record scan");
            Err(internal("Failed to record scan"))
        }
    }
}

/// Aggregated statistics for one QR code
pub async fn qr_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ScanStats>, ApiError> {
    let qr = state
        .storage
        .get_qr(id)
        .await
        .map_err(|e| {
            tracing::error!(qr_id = id, error = %e, "failed to load QR code");
            internal("Failed to load QR code")
        })?;

    if qr.is_none() {
        return Err(not_found());
    }

    let scans = state.storage.scans_for(id).await.map_err(|e| {
        tracing::error!(qr_id = id, error = %e, "failed to load scans");
        internal("Failed to load scans")
    })?;

    Ok(Json(aggregate_scans(&scans, &state.geoip)))
}

/// List all QR codes, newest first
pub async fn list_qrcodes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<QrCode>>, ApiError> {
    let codes = state.storage.list_qr().await.map_err(|e| {
        tracing::error!(error = %e, "failed to list QR codes");
        internal("Failed to list QR codes")
    })?;

    Ok(Json(codes))
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    #[serde(default)]
    pub redirect: bool,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub qr_image_base64: String,
}

/// Re-render the image for a stored QR code.
///
/// With `redirect=true` the image encodes the redirect URL; otherwise it
/// encodes the stored payload directly.
pub async fn qrcode_image(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(query): Query<ImageQuery>,
) -> Result<Json<ImageResponse>, ApiError> {
    let qr = state
        .storage
        .get_qr(id)
        .await
        .map_err(|e| {
            tracing::error!(qr_id = id, error = %e, "failed to load QR code");
            internal("Failed to load QR code")
        })?
        .ok_or_else(not_found)?;

    let content = if query.redirect {
        state.config.redirect_url_for(qr.id)
    } else {
        qr.original_url.clone()
    };

    let qr_image_base64 = render_image(&qr, &content)?;

    Ok(Json(ImageResponse { qr_image_base64 }))
}

/// Delete a QR code and all of its scan events
pub async fn delete_qrcode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<SuccessResponse>, ApiError> {
    match state.storage.delete_qr(id).await {
        Ok(()) => {
            tracing::info!(qr_id = id, "QR deleted");
            Ok(Json(SuccessResponse {
                message: "QR code deleted".to_string(),
            }))
        }
        Err(StorageError::NotFound) => Err(not_found()),
        Err(StorageError::Other(e)) => {
            tracing::error!(qr_id = id, error = %e, "failed to delete QR code");
            Err(internal("Failed to delete QR code"))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceConfigResponse {
    pub frontend_base_url: String,
    pub backend_base_url: String,
}

/// Base URLs the frontend needs to build links
pub async fn service_config(State(state): State<Arc<AppState>>) -> Json<ServiceConfigResponse> {
    Json(ServiceConfigResponse {
        frontend_base_url: state.config.frontend_base_url.clone(),
        backend_base_url: state.config.backend_base_url.clone(),
    })
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
