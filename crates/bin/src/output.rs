//! Terminal rendering of alerts and tables.

use movy::{Alert, Presenter, Session, Severity};
use tracing::debug;

use crate::cli::OutputFormat;

/// Renders manager notifications on the terminal.
///
/// Alerts go to stderr so that JSON written to stdout stays parseable.
#[derive(Debug)]
pub struct TerminalPresenter {
    format: OutputFormat,
}

impl TerminalPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

impl Presenter for TerminalPresenter {
    fn session_changed(&self, session: Option<&Session>) {
        match session {
            Some(session) => {
                debug!(email = %session.email, offline = session.is_offline(), "Session changed")
            }
            None => debug!("Session cleared"),
        }
    }

    fn alert(&self, alert: &Alert) {
        match self.format {
            OutputFormat::Human => eprintln!("{alert}"),
            OutputFormat::Json => {
                let value = serde_json::json!({
                    "alert": {
                        "severity": severity_label(alert.severity),
                        "title": alert.title(),
                        "message": alert.message,
                    }
                });
                eprintln!("{value}");
            }
        }
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "success",
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let render = |cells: Vec<&str>| {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", render(headers.to_vec()).trim_end());
    for row in rows {
        let cells = row.iter().take(col_count).map(String::as_str).collect();
        println!("{}", render(cells).trim_end());
    }
}
