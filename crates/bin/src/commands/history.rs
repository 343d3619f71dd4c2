//! Watch history commands.

use movy::{AuthManager, history};

use crate::{cli::OutputFormat, output::print_table};

/// Fetch the server history and merge it into the local store.
pub async fn pull(
    manager: &AuthManager,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let merged = manager.sync_watch_history().await?;
    match format {
        OutputFormat::Human => println!("Merged {merged} item(s)"),
        OutputFormat::Json => println!("{}", serde_json::json!({ "merged": merged })),
    }
    Ok(())
}

/// Show the "continue watching" list.
pub fn list(manager: &AuthManager, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let entries = history::continue_watching(manager.store().as_ref())?;

    match format {
        OutputFormat::Human => {
            if entries.is_empty() {
                println!("No watch progress");
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|(content_id, p)| {
                    let episode = match (p.season, p.episode) {
                        (Some(s), Some(e)) => format!("S{s:02}E{e:02}"),
                        _ => String::new(),
                    };
                    let watched = p
                        .last_watched
                        .and_then(|ms| u64::try_from(ms).ok())
                        .map(movy::clock::millis_to_rfc3339)
                        .unwrap_or_default();
                    vec![
                        content_id.clone(),
                        p.media_type.clone(),
                        episode,
                        format!("{:.1}", p.progress),
                        watched,
                    ]
                })
                .collect();
            print_table(&["CONTENT", "TYPE", "EPISODE", "PROGRESS", "LAST WATCHED"], &rows);
        }
        OutputFormat::Json => {
            let entries: Vec<_> = entries
                .into_iter()
                .map(|(content_id, progress)| {
                    serde_json::json!({ "content_id": content_id, "progress": progress })
                })
                .collect();
            println!("{}", serde_json::to_string(&entries)?);
        }
    }
    Ok(())
}
