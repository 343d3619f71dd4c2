//! Connectivity transitions and replay of pending accounts.

use std::sync::Arc;

use movy::{Severity, constants::PENDING_ACCOUNTS_KEY};

use crate::helpers::{FlakyStore, Scripted, TestContext};

/// Queue `emails` as pending accounts while the backend is down.
async fn queue_pending(ctx: &TestContext, emails: &[&str]) {
    let manager = ctx.manager();
    ctx.api().set_reachable(false);
    for email in emails {
        manager.sign_up("User", email, "secret1").await.unwrap();
        manager.log_out().unwrap();
    }
}

fn pending_emails(ctx: &TestContext) -> Vec<String> {
    ctx.manager()
        .pending_accounts()
        .unwrap()
        .into_iter()
        .map(|a| a.email)
        .collect()
}

#[tokio::test]
async fn sync_keeps_only_accounts_that_failed() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com", "b@x.com"]).await;

    ctx.api().set_reachable(true);
    ctx.api().register("A", "a@x.com", "elsewhere");
    ctx.api().script_signup("b@x.com", Scripted::Unreachable);

    let report = ctx.manager().sync_pending().await;

    assert_eq!(report.synced, vec!["a@x.com".to_string()]);
    assert_eq!(report.failed, vec!["b@x.com".to_string()]);
    assert!(report.is_partial());
    assert_eq!(pending_emails(&ctx), vec!["b@x.com".to_string()]);

    let alert = ctx.presenter().last_alert().unwrap();
    assert_eq!(alert.severity, Severity::Success);
    assert_eq!(alert.title(), "Sync Complete");
    assert_eq!(
        alert.message,
        "Successfully synced 1 account(s) to the database!"
    );
}

#[tokio::test]
async fn sync_replays_original_password() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    ctx.api().set_reachable(true);

    let report = ctx.manager().sync_pending().await;

    assert_eq!(report.attempted(), 1);
    assert!(!report.is_partial());
    assert_eq!(
        ctx.api().registered_password("a@x.com").as_deref(),
        Some("secret1")
    );
    assert!(pending_emails(&ctx).is_empty());
}

#[tokio::test]
async fn rejected_accounts_stay_pending() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    ctx.api().set_reachable(true);
    ctx.api()
        .script_signup("a@x.com", Scripted::Reject("Invalid email".into()));
    let alerts_before = ctx.presenter().alerts().len();

    let report = ctx.manager().sync_pending().await;

    assert!(report.synced.is_empty());
    assert_eq!(report.failed, vec!["a@x.com".to_string()]);
    assert_eq!(pending_emails(&ctx), vec!["a@x.com".to_string()]);
    // Nothing synced, nothing to announce.
    assert_eq!(ctx.presenter().alerts().len(), alerts_before);
}

#[tokio::test]
async fn already_exists_is_matched_case_insensitively() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    ctx.api().set_reachable(true);
    ctx.api()
        .script_signup("a@x.com", Scripted::Reject("User ALREADY exists".into()));

    let report = ctx.manager().sync_pending().await;

    assert_eq!(report.synced, vec!["a@x.com".to_string()]);
    assert!(pending_emails(&ctx).is_empty());
}

#[tokio::test]
async fn sync_with_empty_list_does_nothing() {
    let ctx = TestContext::new();

    let report = ctx.manager().sync_pending().await;

    assert_eq!(report.attempted(), 0);
    assert!(!report.skipped);
    assert!(ctx.api().signup_calls().is_empty());
    assert!(ctx.presenter().alerts().is_empty());
}

#[tokio::test]
async fn coming_back_online_triggers_exactly_one_sync() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    // Keep the account pending so every sync would call signup again.
    ctx.api().script_signup("a@x.com", Scripted::Unreachable);
    let manager = ctx.manager();

    // Probe while down: false -> false, no sync.
    assert!(!manager.check_connectivity().await);
    let calls_while_down = ctx.api().signup_count("a@x.com");

    ctx.api().set_reachable(true);
    assert!(manager.check_connectivity().await);
    assert_eq!(ctx.api().signup_count("a@x.com"), calls_while_down + 1);

    // true -> true, no further sync.
    assert!(manager.check_connectivity().await);
    assert_eq!(ctx.api().signup_count("a@x.com"), calls_while_down + 1);
    assert_eq!(ctx.api().health_calls(), 3);
}

#[tokio::test]
async fn startup_online_does_not_sync() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    ctx.api().set_reachable(true);

    // A fresh manager assumes it is online, so the first successful probe is
    // not a transition.
    let manager = ctx.manager();
    assert!(manager.is_online());
    assert!(manager.check_connectivity().await);

    assert_eq!(pending_emails(&ctx), vec!["a@x.com".to_string()]);
}

#[tokio::test]
async fn failed_probe_marks_offline() {
    let ctx = TestContext::new().offline();
    let manager = ctx.manager();
    assert!(manager.is_online());

    assert!(!manager.check_connectivity().await);

    assert!(!manager.is_online());
}

#[tokio::test]
async fn without_api_nothing_is_probed() {
    let ctx = TestContext::without_api();
    let manager = ctx.manager();

    assert!(!manager.check_connectivity().await);
    assert!(!manager.is_online());
    assert_eq!(manager.sync_pending().await.attempted(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_cycles_do_not_double_submit() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com", "b@x.com", "c@x.com"]).await;
    ctx.api().set_reachable(true);
    let manager = ctx.manager();

    let first = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.sync_pending().await }
    });
    let second = tokio::spawn({
        let manager = Arc::clone(&manager);
        async move { manager.sync_pending().await }
    });
    let (first, second) = (first.await.unwrap(), second.await.unwrap());

    let synced = first.synced.len() + second.synced.len();
    assert_eq!(synced, 3);
    for email in ["a@x.com", "b@x.com", "c@x.com"] {
        // One attempt while offline at queue time, one during sync.
        assert_eq!(ctx.api().signup_count(email), 2, "{email}");
    }
    assert!(pending_emails(&ctx).is_empty());
}

#[tokio::test]
async fn accounts_queued_after_sync_are_kept() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;
    ctx.api().set_reachable(true);
    ctx.manager().sync_pending().await;

    queue_pending(&ctx, &["b@x.com"]).await;

    assert_eq!(pending_emails(&ctx), vec!["b@x.com".to_string()]);
}

#[tokio::test]
async fn unreadable_success_response_still_counts_as_synced() {
    let ctx = TestContext::new();
    queue_pending(&ctx, &["a@x.com"]).await;

    ctx.api().set_reachable(true);
    ctx.api().script_signup("a@x.com", Scripted::Unreadable);

    let report = ctx.manager().sync_pending().await;

    assert_eq!(report.synced, vec!["a@x.com".to_string()]);
    assert!(report.failed.is_empty());
    assert!(ctx.api().is_registered("a@x.com"));
    assert!(pending_emails(&ctx).is_empty());
}

#[tokio::test]
async fn failed_pending_write_reports_accounts_as_failed() {
    let store = FlakyStore::new();
    let ctx = TestContext::new().with_store(store.clone());
    queue_pending(&ctx, &["a@x.com", "b@x.com"]).await;

    ctx.api().set_reachable(true);
    store.block_writes(PENDING_ACCOUNTS_KEY);
    let report = ctx.manager().sync_pending().await;

    assert!(report.synced.is_empty());
    assert_eq!(
        report.failed,
        vec!["a@x.com".to_string(), "b@x.com".to_string()]
    );
    assert_eq!(pending_emails(&ctx), vec!["a@x.com", "b@x.com"]);
    assert!(
        ctx.presenter()
            .alerts()
            .iter()
            .all(|a| a.title() != "Sync Complete")
    );

    // Next cycle: the backend already knows both accounts.
    store.allow_writes();
    let report = ctx.manager().sync_pending().await;
    assert_eq!(report.synced.len(), 2);
    assert!(pending_emails(&ctx).is_empty());
    assert_eq!(
        ctx.presenter().last_alert().unwrap().title(),
        "Sync Complete"
    );
}
