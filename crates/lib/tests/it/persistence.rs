//! State surviving a restart over a file-backed store.

use std::sync::Arc;

use movy::{
    FileStore, KvStore,
    constants::{TOKEN_KEY, USER_KEY},
};
use tempfile::TempDir;

use crate::helpers::TestContext;

fn file_store(dir: &TempDir) -> Arc<dyn KvStore> {
    Arc::new(FileStore::open(dir.path().join("movy.json")).expect("open store"))
}

#[tokio::test]
async fn session_is_restored_after_restart() {
    let dir = TempDir::new().unwrap();
    let ctx = TestContext::new().with_store(file_store(&dir));
    let created = ctx
        .manager()
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();

    let reopened = TestContext::new().with_store(file_store(&dir));
    let manager = reopened.manager();
    assert!(!manager.is_logged_in());

    let restored = manager.restore_session().unwrap().expect("session");

    assert_eq!(restored, created);
    assert!(manager.is_logged_in());
    assert_eq!(reopened.presenter().sessions(), vec![Some(restored)]);
}

#[tokio::test]
async fn nothing_to_restore_when_logged_out() {
    let dir = TempDir::new().unwrap();
    let ctx = TestContext::new().with_store(file_store(&dir));
    let manager = ctx.manager();
    manager
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();
    manager.log_out().unwrap();

    let reopened = TestContext::new().with_store(file_store(&dir));
    assert!(reopened.manager().restore_session().unwrap().is_none());
    assert!(reopened.presenter().sessions().is_empty());
}

#[tokio::test]
async fn incomplete_session_is_not_restored() {
    let ctx = TestContext::new();
    ctx.store().set(TOKEN_KEY, "token-ada@example.com").unwrap();
    assert!(ctx.manager().restore_session().unwrap().is_none());

    ctx.store().set(USER_KEY, "{not json").unwrap();
    assert!(ctx.manager().restore_session().unwrap().is_none());
}

#[tokio::test]
async fn pending_accounts_sync_after_restart() {
    let dir = TempDir::new().unwrap();
    let before = TestContext::new().offline().with_store(file_store(&dir));
    before
        .manager()
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();

    let after = TestContext::new().with_store(file_store(&dir));
    let manager = after.manager();
    assert_eq!(manager.pending_accounts().unwrap().len(), 1);

    let report = manager.sync_pending().await;

    assert_eq!(report.synced, vec!["ada@example.com".to_string()]);
    assert_eq!(
        after.api().registered_password("ada@example.com").as_deref(),
        Some("secret1")
    );
    assert!(manager.pending_accounts().unwrap().is_empty());
}

#[tokio::test]
async fn offline_accounts_survive_restart() {
    let dir = TempDir::new().unwrap();
    TestContext::without_api()
        .with_store(file_store(&dir))
        .manager()
        .sign_up("Ada", "ada@example.com", "secret1")
        .await
        .unwrap();

    let reopened = TestContext::without_api().with_store(file_store(&dir));
    let session = reopened
        .manager()
        .log_in("ada@example.com", "secret1")
        .await
        .unwrap();

    assert_eq!(session.email, "ada@example.com");
}
