//! Database initialization on first run and on reopen

use shelf_common::db::init_database;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("shelf.db");

    let result = init_database(&db_path).await;
    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shelf.db");

    let first = init_database(&db_path).await.expect("first init");
    sqlx::query("INSERT INTO books (id, user_id, title) VALUES ('b1', 'u1', 'Middlemarch')")
        .execute(&first)
        .await
        .unwrap();
    first.close().await;

    let second = init_database(&db_path).await.expect("reopen");
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&second)
        .await
        .unwrap();
    assert_eq!(count, 1, "Existing rows must survive re-initialization");
}

#[tokio::test]
async fn test_every_pooled_connection_enforces_foreign_keys() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shelf.db");
    let pool = init_database(&db_path).await.expect("init");

    // hold several connections so the insert below runs on more than one
    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(pool.acquire().await.unwrap());
    }

    for conn in held.iter_mut() {
        let enabled: i64 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&mut **conn)
            .await
            .unwrap();
        assert_eq!(enabled, 1);

        let orphan = sqlx::query(
            "INSERT INTO provenance_entries (book_id, owner_name) VALUES ('missing', 'Nobody')",
        )
        .execute(&mut **conn)
        .await;
        assert!(orphan.is_err(), "Child row without a book must be rejected");
    }
}
