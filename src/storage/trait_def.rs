use crate::models::{NewQrCode, QrCode, Scan};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("QR code not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables, etc.)
    async fn init(&self) -> Result<()>;

    /// Insert a new QR code and return it with its store-assigned id
    async fn create_qr(&self, new: &NewQrCode) -> Result<QrCode>;

    /// Get a QR code by id
    async fn get_qr(&self, id: i64) -> Result<Option<QrCode>>;

    /// List all QR codes, newest first
    async fn list_qr(&self) -> Result<Vec<QrCode>>;

    /// Delete a QR code and all of its scans.
    /// Returns NotFound if the id does not exist.
    async fn delete_qr(&self, id: i64) -> StorageResult<()>;

    /// Append one scan event for an existing QR code.
    /// Returns NotFound if the QR code does not exist; no row is written
    /// in that case.
    async fn record_scan(
        &self,
        qr_id: i64,
        ip_address: &str,
        user_agent: &str,
        timestamp: i64,
    ) -> StorageResult<Scan>;

    /// Fetch every scan recorded for a QR code
    async fn scans_for(&self, qr_id: i64) -> Result<Vec<Scan>>;
}
