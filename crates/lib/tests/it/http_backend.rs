//! The manager against a real HTTP server on a local port.

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use movy::{AuthManager, Config, InMemoryStore, Severity};
use serde_json::json;
use url::Url;

use crate::helpers::RecordingPresenter;

/// Serve `router` under `/api` on an ephemeral port and return the API URL.
async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, Router::new().nest("/api", router))
            .await
            .unwrap();
    });
    Url::parse(&format!("http://{addr}/api")).unwrap()
}

fn manager(api_url: Url, presenter: Arc<RecordingPresenter>) -> AuthManager {
    AuthManager::from_config(
        Config::with_api_url(api_url),
        Arc::new(InMemoryStore::new()),
    )
    .unwrap()
    .with_presenter(presenter)
}

/// A reverse proxy whose upstream is down.
fn bad_gateway() -> Router {
    let page = || async { (StatusCode::BAD_GATEWAY, Html("<html><h1>502 Bad Gateway</h1></html>")) };
    Router::new()
        .route("/health", get(page))
        .route("/auth/signup", post(page))
        .route("/auth/login", post(page))
}

#[tokio::test]
async fn signup_behind_failing_gateway_goes_offline() {
    let presenter = Arc::new(RecordingPresenter::default());
    let manager = manager(serve(bad_gateway()).await, presenter.clone());

    let session = manager
        .sign_up("Ada", "ada@x.com", "secret1")
        .await
        .expect("signup falls back to a local account");

    assert!(session.is_offline());
    assert!(manager.is_logged_in());
    assert_eq!(manager.pending_accounts().unwrap().len(), 1);
    assert_eq!(
        presenter.last_alert().unwrap().title(),
        "Offline Account Created"
    );

    manager.log_out().unwrap();
    let again = manager.log_in("ada@x.com", "secret1").await.unwrap();
    assert_eq!(again.user_id, session.user_id);
    assert_eq!(presenter.last_alert().unwrap().title(), "Offline Mode");

    assert!(!manager.check_connectivity().await);
}

#[tokio::test]
async fn backend_rejection_is_shown_not_queued() {
    let router = Router::new().route(
        "/auth/signup",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Password too short" })),
            )
        }),
    );
    let presenter = Arc::new(RecordingPresenter::default());
    let manager = manager(serve(router).await, presenter.clone());

    let err = manager.sign_up("Ada", "ada@x.com", "x").await.unwrap_err();

    assert_eq!(err.to_string(), "Password too short");
    assert!(manager.pending_accounts().unwrap().is_empty());
    assert!(!manager.is_logged_in());
    assert_eq!(presenter.last_severity(), Some(Severity::Error));
}

#[tokio::test]
async fn pending_account_reaches_recovered_backend() {
    let router = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/auth/signup",
            post(|| async {
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "token": "jwt-1",
                        "user": { "id": 1, "name": "Ada", "email": "ada@x.com" },
                    })),
                )
            }),
        );
    let presenter = Arc::new(RecordingPresenter::default());

    // Queue while the gateway is failing, then switch to a healthy backend
    // over the same store.
    let store = Arc::new(InMemoryStore::new());
    let down = AuthManager::from_config(
        Config::with_api_url(serve(bad_gateway()).await),
        store.clone(),
    )
    .unwrap();
    down.sign_up("Ada", "ada@x.com", "secret1").await.unwrap();
    assert!(!down.check_connectivity().await);

    let up = AuthManager::from_config(Config::with_api_url(serve(router).await), store)
        .unwrap()
        .with_presenter(presenter.clone());
    assert_eq!(up.pending_accounts().unwrap().len(), 1);

    let report = up.sync_pending().await;
    assert_eq!(report.synced, vec!["ada@x.com".to_string()]);
    assert!(up.pending_accounts().unwrap().is_empty());
    assert_eq!(presenter.last_alert().unwrap().title(), "Sync Complete");
}
