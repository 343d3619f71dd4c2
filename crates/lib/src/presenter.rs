//! Hooks into the presentation layer.
//!
//! The manager never renders anything itself. It reports session changes and
//! user-facing notifications through a [`Presenter`].

use std::fmt;

use tracing::debug;

use crate::session::Session;

/// Severity of a user-facing alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    /// Title used when an alert has none of its own.
    pub fn default_title(self) -> &'static str {
        match self {
            Severity::Success => "Success!",
            Severity::Error => "Error!",
            Severity::Warning => "Warning!",
            Severity::Info => "Info",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Error => "✕",
            Severity::Warning => "⚠",
            Severity::Info => "ℹ",
        }
    }
}

/// A modal notification for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub severity: Severity,
    title: Option<String>,
}

impl Alert {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        self.title = (!title.is_empty()).then_some(title);
        self
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// The explicit title, or the severity's default.
    pub fn title(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.severity.default_title())
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.severity.icon(),
            self.title(),
            self.message
        )
    }
}

/// Rendering hooks implemented by the front end.
pub trait Presenter: Send + Sync {
    /// The session changed; `None` means logged out.
    fn session_changed(&self, session: Option<&Session>);

    /// Show a notification.
    fn alert(&self, alert: &Alert);
}

/// A presenter that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn session_changed(&self, session: Option<&Session>) {
        debug!(email = session.map(|s| s.email.as_str()), "Session changed");
    }

    fn alert(&self, alert: &Alert) {
        debug!(severity = ?alert.severity, title = alert.title(), message = %alert.message, "Alert");
    }
}
