//! Watch history merge and progress uploads.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use movy::{
    KvStore,
    history::{self, progress_key},
};

use crate::helpers::{TestContext, history_item, progress_upload};

#[tokio::test]
async fn login_merges_server_history() {
    let ctx = TestContext::new();
    ctx.api().register("Ada", "ada@example.com", "secret1");
    ctx.api().set_history(vec![
        history_item("movie-603", "2024-01-01T10:00:00Z"),
        history_item("tv-1399-1-2", "2024-01-02T10:00:00Z"),
    ]);
    let manager = ctx.manager();

    manager.log_in("ada@example.com", "secret1").await.unwrap();

    let progress = history::load_progress(ctx.store().as_ref(), "movie-603")
        .unwrap()
        .expect("merged");
    assert_eq!(progress.id, "603");
    assert_eq!(progress.media_type, "movie");
    assert_eq!(progress.last_watched, Some(1704103200000));

    let row = history::continue_watching(ctx.store().as_ref()).unwrap();
    let order: Vec<&str> = row.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(order, ["tv-1399-1-2", "movie-603"]);
}

#[tokio::test]
async fn server_history_overwrites_local_progress() {
    let ctx = TestContext::new();
    ctx.api().register("Ada", "ada@example.com", "secret1");
    ctx.store()
        .set(&progress_key("movie-603"), r#"{"timestamp":1.0}"#)
        .unwrap();
    ctx.store().set("unrelated", "kept").unwrap();
    ctx.api()
        .set_history(vec![history_item("movie-603", "2024-01-01T10:00:00Z")]);
    let manager = ctx.manager();
    manager.log_in("ada@example.com", "secret1").await.unwrap();

    let progress = history::load_progress(ctx.store().as_ref(), "movie-603")
        .unwrap()
        .unwrap();
    assert_eq!(progress.timestamp, 42.0);
    assert_eq!(ctx.store().get("unrelated").unwrap().as_deref(), Some("kept"));
}

#[tokio::test]
async fn observer_runs_after_merge() {
    let ctx = TestContext::new();
    ctx.api().register("Ada", "ada@example.com", "secret1");
    ctx.api()
        .set_history(vec![history_item("movie-603", "2024-01-01T10:00:00Z")]);
    let manager = ctx.manager();

    let seen = Arc::new(AtomicUsize::new(0));
    manager.on_history_synced({
        let seen = Arc::clone(&seen);
        move |merged| {
            seen.fetch_add(merged, Ordering::SeqCst);
        }
    });

    manager.log_in("ada@example.com", "secret1").await.unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    manager.clear_history_observer();
    manager.sync_watch_history().await.unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_history_fetch_does_not_fail_login() {
    let ctx = TestContext::new();
    ctx.api().register("Ada", "ada@example.com", "secret1");
    let manager = ctx.manager();
    manager.log_in("ada@example.com", "secret1").await.unwrap();

    ctx.api().set_reachable(false);
    let err = manager.sync_watch_history().await.unwrap_err();

    assert!(err.is_network_error());
    assert!(manager.is_logged_in());
}

#[tokio::test]
async fn progress_upload_uses_session_token() {
    let ctx = TestContext::new();
    ctx.api().register("Ada", "ada@example.com", "secret1");
    let manager = ctx.manager();
    manager.log_in("ada@example.com", "secret1").await.unwrap();

    manager
        .save_watch_progress(&progress_upload("movie-603"))
        .await
        .unwrap();

    let uploads = ctx.api().uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "token-ada@example.com");
    assert_eq!(uploads[0].1.content_id, "movie-603");
}

#[tokio::test]
async fn offline_sessions_never_reach_the_backend() {
    let ctx = TestContext::new().offline();
    let manager = ctx.manager();
    manager
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();
    ctx.api().set_reachable(true);

    let err = manager
        .save_watch_progress(&progress_upload("movie-603"))
        .await
        .unwrap_err();
    assert!(matches!(err.as_auth(), Some(movy::AuthError::NotLoggedIn)));

    let err = manager.sync_watch_history().await.unwrap_err();
    assert!(matches!(err.as_auth(), Some(movy::AuthError::NotLoggedIn)));
    assert!(ctx.api().uploads().is_empty());
}

#[tokio::test]
async fn history_requires_a_configured_backend() {
    let ctx = TestContext::without_api();
    let manager = ctx.manager();

    let err = manager.sync_watch_history().await.unwrap_err();

    assert!(err.is_network_error());
}
