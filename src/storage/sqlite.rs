use crate::models::{NewQrCode, QrCode, Scan};
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;

pub struct SqliteStorage {
    pool: Arc<SqlitePool>,
}

impl SqliteStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        // SQLite does not enforce foreign keys unless asked, and the PRAGMA
        // is per-connection, so it has to go through the connect options
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS qrcodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_url TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                color TEXT NOT NULL DEFAULT 'black',
                bg_color TEXT NOT NULL DEFAULT 'white',
                box_size INTEGER NOT NULL DEFAULT 10,
                border INTEGER NOT NULL DEFAULT 4
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scans (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                qr_id INTEGER NOT NULL REFERENCES qrcodes(id) ON DELETE CASCADE,
                ip_address TEXT NOT NULL,
                user_agent TEXT NOT NULL,
                timestamp INTEGER NOT NULL
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scans_qr_id ON scans(qr_id)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create_qr(&self, new: &NewQrCode) -> Result<QrCode> {
        let qr = sqlx::query_as::<_, QrCode>(
            r#"
            INSERT INTO qrcodes (original_url, created_at, color, bg_color, box_size, border)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, original_url, created_at, color, bg_color, box_size, border
            "#,
        )
        .bind(&new.original_url)
        .bind(new.created_at)
        .bind(&new.color)
        .bind(&new.bg_color)
        .bind(new.box_size)
        .bind(new.border)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(qr)
    }

    async fn get_qr(&self, id: i64) -> Result<Option<QrCode>> {
        let qr = sqlx::query_as::<_, QrCode>(
            r#"
            SELECT id, original_url, created_at, color, bg_color, box_size, border
            FROM qrcodes
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(qr)
    }

    async fn list_qr(&self) -> Result<Vec<QrCode>> {
        let codes = sqlx::query_as::<_, QrCode>(
            r#"
            SELECT id, original_url, created_at, color, bg_color, box_size, border
            FROM qrcodes
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(codes)
    }

    async fn delete_qr(&self, id: i64) -> StorageResult<()> {
        // Scans go with the parent via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM qrcodes WHERE id = ?")
            .bind(id)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn record_scan(
        &self,
        qr_id: i64,
        ip_address: &str,
        user_agent: &str,
        timestamp: i64,
    ) -> StorageResult<Scan> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM qrcodes WHERE id = ?")
            .bind(qr_id)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| StorageError::Other(e.into()))?;

        if exists == 0 {
            return Err(StorageError::NotFound);
        }

        let scan = sqlx::query_as::<_, Scan>(
            r#"
            INSERT INTO scans (qr_id, ip_address, user_agent, timestamp)
            VALUES (?, ?, ?, ?)
            RETURNING id, qr_id, ip_address, user_agent, timestamp
            "#,
        )
        .bind(qr_id)
        .bind(ip_address)
        .bind(user_agent)
        .bind(timestamp)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(scan)
    }

    async fn scans_for(&self, qr_id: i64) -> Result<Vec<Scan>> {
        let scans = sqlx::query_as::<_, Scan>(
            r#"
            SELECT id, qr_id, ip_address, user_agent, timestamp
            FROM scans
            WHERE qr_id = ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(qr_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(scans)
    }
}
