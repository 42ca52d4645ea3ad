use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use super::handlers::{
    classify_target, delete_qrcode, follow_redirect, generate_qr, health_check, list_qrcodes,
    qr_stats, qrcode_image, record_scan, service_config, AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    // The frontend is served from a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/r/{id}", get(follow_redirect))
        .route("/api/generate", post(generate_qr))
        .route("/api/redirect/{id}", get(classify_target))
        .route("/api/record-scan", post(record_scan))
        .route("/api/stats/{id}", get(qr_stats))
        .route("/api/qrcodes", get(list_qrcodes))
        .route("/api/qrcodes/{id}", delete(delete_qrcode))
        .route("/api/qrcode-image/{id}", get(qrcode_image))
        .route("/api/config", get(service_config))
        .layer(cors)
        .with_state(state)
}
