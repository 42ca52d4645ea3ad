use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored QR code definition.
///
/// `original_url` is an arbitrary non-empty string; it may be a URL or free
/// text and is never validated as a well-formed URL after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QrCode {
    pub id: i64,
    pub original_url: String,
    pub created_at: i64,
    pub color: String,
    pub bg_color: String,
    pub box_size: i64,
    pub border: i64,
}

/// Fields for a QR code about to be inserted. The id is store-assigned.
#[derive(Debug, Clone)]
pub struct NewQrCode {
    pub original_url: String,
    pub created_at: i64,
    pub color: String,
    pub bg_color: String,
    pub box_size: i64,
    pub border: i64,
}

/// A single scan event. Append-only; rows are removed only when the owning
/// QR code is deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Scan {
    pub id: i64,
    pub qr_id: i64,
    pub ip_address: String,
    pub user_agent: String,
    pub timestamp: i64,
}
