//! Account flow against a live account service
//!
//! Starts the axum service on an ephemeral port over an in-memory database
//! and drives it through the reqwest client and the auth controller.

use account_service::{AppState, SqliteUserRepository};
use app_core::auth::AuthController;
use app_core::CoreError;
use app_state::SessionContext;
use networking::{AccountApi, AccountClient, ApiError, ClientConfig, RegisterRequest, UpdateUserRequest};
use std::sync::Arc;
use storage::{KvStore, LocalStore, SqliteDatabase};
use tokio::net::TcpListener;

async fn spawn_service() -> AccountClient {
    let db = SqliteDatabase::in_memory().await.unwrap();
    let users = SqliteUserRepository::open(db).await.unwrap();
    let state = AppState::new(Arc::new(users), 4);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(account_service::run(listener, state, std::future::pending()));

    AccountClient::new(ClientConfig::new(format!("http://{address}"))).unwrap()
}

fn registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Siti Aminah".to_string(),
        email: email.to_string(),
        phone: "081234567890".to_string(),
        password: "rahasia1".to_string(),
    }
}

#[tokio::test]
async fn test_duplicate_email_in_any_case_is_rejected() {
    let client = spawn_service().await;

    let user = client.register(&registration("siti@example.com")).await.unwrap();
    assert_eq!(user.email, "siti@example.com");

    let error = client.register(&registration("SITI@Example.COM")).await.unwrap_err();
    assert_eq!(error.status(), Some(400));

    let users = client.list_users().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0], user);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let client = spawn_service().await;
    client.register(&registration("siti@example.com")).await.unwrap();

    let login = networking::LoginRequest {
        email: "siti@example.com".to_string(),
        password: "salah123".to_string(),
    };
    let error = client.login(&login).await.unwrap_err();
    assert!(error.is_unauthorized());
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let client = spawn_service().await;
    let error = client.get_user("tidak-ada").await.unwrap_err();
    assert!(matches!(error, ApiError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_auth_controller_round_trip() {
    let client = spawn_service().await;
    let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
    let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);
    let auth = AuthController::new(Arc::new(client), Arc::clone(&store), Arc::clone(&session));

    let registered = auth.register(registration("siti@example.com")).await.unwrap();
    assert!(session.is_logged_in());

    // The cached user is the public view; no password or hash reaches the device
    let cached = store.get_item("currentUser").await.unwrap().unwrap();
    assert!(!cached.contains("password"));
    assert!(!cached.contains("rahasia1"));
    assert!(!cached.contains("$2"));

    auth.logout().await.unwrap();
    assert!(!session.is_logged_in());

    let wrong = auth.login("siti@example.com", "salah123").await;
    assert!(matches!(wrong, Err(CoreError::Remote(ref e)) if e.is_unauthorized()));
    assert!(!session.is_logged_in());

    let user = auth.login("Siti@Example.com", "rahasia1").await.unwrap();
    assert_eq!(user, registered);
    assert_eq!(auth.known_users().await.len(), 1);

    auth.delete_account().await.unwrap();
    assert!(!session.is_logged_in());
    assert!(auth.login("siti@example.com", "rahasia1").await.is_err());
}

#[tokio::test]
async fn test_changed_password_with_spaces_still_logs_in() {
    let client = spawn_service().await;
    let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
    let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);
    let auth = AuthController::new(Arc::new(client), Arc::clone(&store), Arc::clone(&session));

    auth.register(registration("siti@example.com")).await.unwrap();
    let changes = UpdateUserRequest { password: Some("baru1234 ".to_string()), ..Default::default() };
    auth.sync_profile(changes).await.unwrap();
    auth.logout().await.unwrap();

    // Surrounding whitespace is part of the password
    let trimmed = auth.login("siti@example.com", "baru1234").await;
    assert!(matches!(trimmed, Err(CoreError::Remote(ref e)) if e.is_unauthorized()));

    auth.login("siti@example.com", "baru1234 ").await.unwrap();
    assert!(session.is_logged_in());
}
