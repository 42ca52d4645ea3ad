//! Integration tests for the storage module
//!
//! These run against in-memory SQLite; the PostgreSQL backend exposes the
//! same trait surface and the same statements modulo placeholders.

use qrtrail::models::NewQrCode;
use qrtrail::storage::{SqliteStorage, Storage, StorageError};
use std::sync::Arc;

/// Helper to create SQLite test storage
///
/// A single connection keeps every statement on the same in-memory database.
async fn create_sqlite_storage() -> Arc<dyn Storage> {
    let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
    storage.init().await.unwrap();
    Arc::new(storage)
}

fn new_qr(url: &str, created_at: i64) -> NewQrCode {
    NewQrCode {
        original_url: url.to_string(),
        created_at,
        color: "black".to_string(),
        bg_color: "white".to_string(),
        box_size: 10,
        border: 4,
    }
}

#[tokio::test]
async fn test_create_and_get_qr() {
    let storage = create_sqlite_storage().await;

    let qr = storage
        .create_qr(&new_qr("https://example.com", 1_769_904_000))
        .await
        .unwrap();
    assert!(qr.id > 0);
    assert_eq!(qr.original_url, "https://example.com");
    assert_eq!(qr.box_size, 10);
    assert_eq!(qr.border, 4);

    let fetched = storage.get_qr(qr.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, qr.id);
    assert_eq!(fetched.original_url, qr.original_url);

    assert!(storage.get_qr(qr.id + 1000).await.unwrap().is_none());
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let storage = create_sqlite_storage().await;

    let old = storage
        .create_qr(&new_qr("https://old.example.com", 1_000))
        .await
        .unwrap();
    let newer = storage
        .create_qr(&new_qr("https://new.example.com", 2_000))
        .await
        .unwrap();

    let listed = storage.list_qr().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[1].id, old.id);
}

#[tokio::test]
async fn test_list_ties_broken_by_id() {
    let storage = create_sqlite_storage().await;

    // Same created_at second; the later insert must still come first
    let first = storage
        .create_qr(&new_qr("https://a.example", 5_000))
        .await
        .unwrap();
    let second = storage
        .create_qr(&new_qr("https://b.example", 5_000))
        .await
        .unwrap();

    let listed = storage.list_qr().await.unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[tokio::test]
async fn test_record_scan_for_existing_qr() {
    let storage = create_sqlite_storage().await;

    let qr = storage
        .create_qr(&new_qr("https://example.com", 1_769_904_000))
        .await
        .unwrap();

    let scan = storage
        .record_scan(qr.id, "203.0.113.7", "Mozilla/5.0", 1_769_904_100)
        .await
        .unwrap();
    assert_eq!(scan.qr_id, qr.id);
    assert_eq!(scan.ip_address, "203.0.113.7");
    assert_eq!(scan.timestamp, 1_769_904_100);

    let scans = storage.scans_for(qr.id).await.unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0].id, scan.id);
}

#[tokio::test]
async fn test_record_scan_missing_qr_writes_nothing() {
    let storage = create_sqlite_storage().await;

    let err = storage
        .record_scan(42, "203.0.113.7", "Mozilla/5.0", 1_769_904_100)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));

    // No orphan row may exist
    let scans = storage.scans_for(42).await.unwrap();
    assert!(scans.is_empty());
}

#[tokio::test]
async fn test_scans_are_ordered_by_timestamp() {
    let storage = create_sqlite_storage().await;

    let qr = storage
        .create_qr(&new_qr("https://example.com", 1_769_904_000))
        .await
        .unwrap();

    storage.record_scan(qr.id, "10.0.0.1", "ua", 300).await.unwrap();
    storage.record_scan(qr.id, "10.0.0.2", "ua", 100).await.unwrap();
    storage.record_scan(qr.id, "10.0.0.3", "ua", 200).await.unwrap();

    let scans = storage.scans_for(qr.id).await.unwrap();
    let timestamps: Vec<i64> = scans.iter().map(|s| s.timestamp).collect();
    assert_eq!(timestamps, vec![100, 200, 300]);
}

#[tokio::test]
async fn test_delete_qr_cascades_to_scans() {
    let storage = create_sqlite_storage().await;

    let qr = storage
        .create_qr(&new_qr("https://example.com", 1_769_904_000))
        .await
        .unwrap();
    storage
        .record_scan(qr.id, "203.0.113.7", "Mozilla/5.0", 1_769_904_100)
        .await
        .unwrap();
    storage
        .record_scan(qr.id, "203.0.113.8", "Mozilla/5.0", 1_769_904_200)
        .await
        .unwrap();

    storage.delete_qr(qr.id).await.unwrap();

    assert!(storage.get_qr(qr.id).await.unwrap().is_none());
    let scans = storage.scans_for(qr.id).await.unwrap();
    assert!(scans.is_empty(), "no orphan scan rows may remain");
}

#[tokio::test]
async fn test_delete_missing_qr_is_not_found() {
    let storage = create_sqlite_storage().await;

    let err = storage.delete_qr(99).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test]
async fn test_delete_leaves_other_qrcodes_alone() {
    let storage = create_sqlite_storage().await;

    let keep = storage
        .create_qr(&new_qr("https://keep.example.com", 1_000))
        .await
        .unwrap();
    let gone = storage
        .create_qr(&new_qr("https://drop.example.com", 2_000))
        .await
        .unwrap();
    storage.record_scan(keep.id, "10.0.0.1", "ua", 1_100).await.unwrap();
    storage.record_scan(gone.id, "10.0.0.2", "ua", 2_100).await.unwrap();

    storage.delete_qr(gone.id).await.unwrap();

    assert!(storage.get_qr(keep.id).await.unwrap().is_some());
    assert_eq!(storage.scans_for(keep.id).await.unwrap().len(), 1);
}
