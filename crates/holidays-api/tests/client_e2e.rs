//! Drives a real server over TCP with the synchronized client.

use std::sync::Arc;

use holidays_api::{create_router, ApiConfig, AppState};
use holidays_client::{ClientError, HttpClient, LoadState, RecordsApi, SyncedRecords};
use holidays_db::Database;
use tokio::net::TcpListener;

async fn spawn_server() -> (String, AppState) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let state = AppState::new(db).unwrap();
    let app = create_router(state.clone(), &ApiConfig::default());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), state)
}

#[tokio::test]
async fn test_client_round_trip() {
    let (url, state) = spawn_server().await;
    let synced = SyncedRecords::new(HttpClient::new(&url));

    synced.load().await.unwrap();
    assert_eq!(synced.state(), LoadState::Loaded);
    assert!(synced.records().is_empty());

    // Mutations fail until signed in, and leave the mirror alone
    let err = synced.create("Diwali").await.unwrap_err();
    assert!(matches!(err, ClientError::Authentication));
    assert!(synced.records().is_empty());

    let account = synced.api().register("ann", "pw1").await.unwrap();
    assert_eq!(account.username, "ann");
    synced.api().sign_in("ann", "pw1").await.unwrap();
    assert_eq!(synced.api().current_user().as_deref(), Some("ann"));

    let created = synced.create("Diwali").await.unwrap();
    assert!(!created.completed);
    assert_eq!(created.popularity, 0);

    let toggled = synced.toggle(&created.id).await.unwrap();
    assert!(toggled.completed);
    assert!(state.db.records().get(&created.id).unwrap().completed);

    let liked = synced.like(&created.id).await.unwrap();
    assert_eq!(liked.popularity, 1);

    synced.delete(&created.id).await.unwrap();
    assert!(synced.get(&created.id).is_none());

    synced.refetch().await.unwrap();
    assert!(synced.records().is_empty());
}

#[tokio::test]
async fn test_client_error_classification() {
    let (url, _) = spawn_server().await;
    let client = HttpClient::new(&url);

    client.register("ann", "pw1").await.unwrap();
    let err = client.register("ann", "pw2").await.unwrap_err();
    assert!(matches!(err, ClientError::Conflict(_)));

    let err = client.sign_in("ann", "wrong").await.unwrap_err();
    assert!(matches!(err, ClientError::Authentication));
    assert!(client.token().is_none());

    client.sign_in("ann", "pw1").await.unwrap();
    let synced = SyncedRecords::new(client);
    synced.load().await.unwrap();

    let err = synced.create("   ").await.unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)));
}

#[tokio::test]
async fn test_delete_of_record_gone_on_server() {
    let (url, state) = spawn_server().await;
    let client = HttpClient::new(&url);
    client.register("ann", "pw1").await.unwrap();
    client.sign_in("ann", "pw1").await.unwrap();

    let synced = SyncedRecords::new(client);
    synced.load().await.unwrap();
    let created = synced.create("Holi").await.unwrap();

    state.db.records().delete(&created.id).unwrap();

    let err = synced.delete(&created.id).await.unwrap_err();
    assert!(matches!(err, ClientError::NotFound(_)));
    // Still present locally until a refetch says otherwise
    assert!(synced.get(&created.id).is_some());

    synced.refetch().await.unwrap();
    assert!(synced.get(&created.id).is_none());
}

#[tokio::test]
async fn test_sign_out_ends_session_server_side() {
    let (url, state) = spawn_server().await;
    let client = HttpClient::new(&url);
    client.register("ann", "pw1").await.unwrap();
    let token = client.sign_in("ann", "pw1").await.unwrap();
    assert_eq!(state.sessions.active_sessions(), 1);

    client.sign_out().await.unwrap();
    assert!(client.token().is_none());
    assert_eq!(state.sessions.active_sessions(), 0);

    // The old token is dead for anyone still holding it
    let stale = HttpClient::new(&url).with_token(token);
    let err = stale.create("Eid").await.unwrap_err();
    assert!(matches!(err, ClientError::Authentication));
}
