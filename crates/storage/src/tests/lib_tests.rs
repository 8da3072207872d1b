use super::*;

async fn temp_storage() -> (tempfile::TempDir, Storage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!("sqlite://{}", dir.path().join("client.db").display());
    let storage = Storage::new(&database_url).await.expect("open storage");
    (dir, storage)
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let (_dir, storage) = temp_storage().await;
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn load_missing_credential_returns_none() {
    let (_dir, storage) = temp_storage().await;
    let loaded = storage
        .load_credential(SESSION_TOKEN_KEY)
        .await
        .expect("load");
    assert_eq!(loaded, None);
}

#[tokio::test]
async fn stored_credential_round_trips_and_overwrites() {
    let (_dir, storage) = temp_storage().await;

    storage
        .store_credential(SESSION_TOKEN_KEY, "token-one")
        .await
        .expect("store");
    assert_eq!(
        storage
            .load_credential(SESSION_TOKEN_KEY)
            .await
            .expect("load"),
        Some("token-one".to_string())
    );

    storage
        .store_credential(SESSION_TOKEN_KEY, "token-two")
        .await
        .expect("overwrite");
    assert_eq!(
        storage
            .load_credential(SESSION_TOKEN_KEY)
            .await
            .expect("reload"),
        Some("token-two".to_string())
    );
}

#[tokio::test]
async fn cleared_credential_is_gone_after_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!("sqlite://{}", dir.path().join("client.db").display());

    {
        let storage = Storage::new(&database_url).await.expect("open storage");
        storage
            .store_credential(SESSION_TOKEN_KEY, "token")
            .await
            .expect("store");
        storage
            .clear_credential(SESSION_TOKEN_KEY)
            .await
            .expect("clear");
    }

    let reopened = Storage::new(&database_url).await.expect("reopen storage");
    assert_eq!(
        reopened
            .load_credential(SESSION_TOKEN_KEY)
            .await
            .expect("load"),
        None
    );
}

#[tokio::test]
async fn credential_survives_process_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let database_url = format!("sqlite://{}", dir.path().join("client.db").display());

    {
        let storage = Storage::new(&database_url).await.expect("open storage");
        storage
            .store_credential(SESSION_TOKEN_KEY, "durable-token")
            .await
            .expect("store");
    }

    let reopened = Storage::new(&database_url).await.expect("reopen storage");
    assert_eq!(
        reopened
            .load_credential(SESSION_TOKEN_KEY)
            .await
            .expect("load"),
        Some("durable-token".to_string())
    );
}

#[test]
fn sqlite_path_ignores_memory_and_foreign_urls() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(sqlite_path("postgres://localhost/db"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/client.db"),
        Some(PathBuf::from("./data/client.db"))
    );
    assert_eq!(
        sqlite_path("sqlite://./data/client.db?mode=rwc"),
        Some(PathBuf::from("./data/client.db"))
    );
}
