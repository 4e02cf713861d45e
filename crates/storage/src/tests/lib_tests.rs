use super::*;

#[tokio::test]
async fn migrated_database_passes_schema_check() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.verify_schema().await.expect("schema");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn unmigrated_database_reports_missing_table() {
    let storage = Storage::connect("sqlite::memory:").await.expect("db");
    let err = storage.verify_schema().await.expect_err("no table yet");
    assert!(matches!(err, SchemaError::MissingTable { ref table } if table == "notifications"));
}

#[tokio::test]
async fn legacy_table_is_reported_not_repaired() {
    let storage = Storage::connect("sqlite::memory:").await.expect("db");
    sqlx::query(
        "CREATE TABLE notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipient TEXT NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
    )
    .execute(storage.pool())
    .await
    .expect("legacy table");

    let err = storage.verify_schema().await.expect_err("sent_at missing");
    match err {
        SchemaError::MissingColumns { columns, .. } => assert_eq!(columns, vec!["sent_at"]),
        other => panic!("unexpected error: {other}"),
    }

    // The check must not have altered anything.
    let err = storage.verify_schema().await.expect_err("still missing");
    assert!(matches!(err, SchemaError::MissingColumns { .. }));
}

#[tokio::test]
async fn unsent_notifications_come_back_oldest_first() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let first = storage
        .enqueue_notification("parish:st-anne", "Rosary tonight", "7pm in the chapel")
        .await
        .expect("first");
    let second = storage
        .enqueue_notification("ministry:choir", "Practice moved", "Thursday at 6pm")
        .await
        .expect("second");

    let unsent = storage.fetch_unsent(10).await.expect("unsent");
    let ids: Vec<NotificationId> = unsent.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(unsent.iter().all(|n| n.sent_at.is_none()));

    let limited = storage.fetch_unsent(1).await.expect("limited");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].id, first);
}

#[tokio::test]
async fn mark_sent_is_one_shot() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let id = storage
        .enqueue_notification("parish:st-anne", "Adoration", "First Friday")
        .await
        .expect("enqueue");

    assert!(storage.mark_sent(id).await.expect("mark"));
    assert!(!storage.mark_sent(id).await.expect("second mark"));
    assert!(!storage
        .mark_sent(NotificationId(9_999))
        .await
        .expect("unknown id"));

    let stored = storage
        .notification(id)
        .await
        .expect("load")
        .expect("exists");
    assert!(stored.sent_at.is_some());
    assert!(storage.fetch_unsent(10).await.expect("unsent").is_empty());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("notifications.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}

#[test]
fn memory_urls_have_no_filesystem_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/app.db?mode=rwc"),
        Some(PathBuf::from("./data/app.db"))
    );
}
