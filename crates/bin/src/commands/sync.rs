//! Connectivity and pending-account commands.

use std::{sync::Arc, time::Duration};

use movy::AuthManager;
use tracing::info;

use crate::{
    cli::{OutputFormat, WatchArgs},
    output::print_table,
};

/// Probe the API, then report connectivity and queue sizes.
pub async fn status(
    manager: &AuthManager,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let online = manager.check_connectivity().await;
    let pending = manager.pending_accounts()?.len();
    let offline = manager.offline_accounts()?.len();
    let api = manager.config().api_url.as_ref().map(|u| u.to_string());
    let user = manager.current_session().map(|s| s.email);

    match format {
        OutputFormat::Human => {
            println!("API:               {}", api.as_deref().unwrap_or("(none)"));
            println!("Online:            {}", if online { "yes" } else { "no" });
            println!("User:              {}", user.as_deref().unwrap_or("(not logged in)"));
            println!("Pending accounts:  {pending}");
            println!("Offline accounts:  {offline}");
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "api_url": api,
                "online": online,
                "user": user,
                "pending_accounts": pending,
                "offline_accounts": offline,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

/// Run one sync cycle regardless of the last known connectivity.
pub async fn sync(
    manager: &AuthManager,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if !manager.has_api() {
        return Err("No API configured; set --api-url or MOVY_API_URL".into());
    }
    let report = manager.sync_pending().await;

    match format {
        OutputFormat::Human => {
            if report.attempted() == 0 {
                println!("Nothing to sync");
            } else {
                println!("Synced:     {}", report.synced.len());
                println!("Remaining:  {}", report.failed.len());
            }
        }
        OutputFormat::Json => {
            let value = serde_json::json!({
                "synced": report.synced,
                "failed": report.failed,
                "skipped": report.skipped,
            });
            println!("{}", serde_json::to_string(&value)?);
        }
    }
    Ok(())
}

/// List pending accounts.
pub fn pending(manager: &AuthManager, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let accounts = manager.pending_accounts()?;

    match format {
        OutputFormat::Human => {
            if accounts.is_empty() {
                println!("No pending accounts");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = accounts
                .iter()
                .map(|a| vec![a.email.clone(), a.name.clone(), a.created_at.clone()])
                .collect();
            print_table(&["EMAIL", "NAME", "CREATED"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = accounts
                .iter()
                .map(|a| {
                    serde_json::json!({
                        "email": a.email,
                        "name": a.name,
                        "created_at": a.created_at,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}

/// Keep probing the API until Ctrl-C.
pub async fn watch(manager: &Arc<AuthManager>, args: &WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !manager.has_api() {
        return Err("No API configured; set --api-url or MOVY_API_URL".into());
    }
    let period = args
        .interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(manager.config().sync_interval);

    manager.check_connectivity().await;
    manager.start_sync_check_every(period);
    println!("Checking every {}s. Press Ctrl+C to stop", period.as_secs());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    manager.stop_sync_check();
    Ok(())
}
