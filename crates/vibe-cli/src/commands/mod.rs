pub mod accounts;
pub mod jobs;
pub mod metrics;
pub mod playlists;
pub mod session;
pub mod settings;

use anyhow::{Result, bail};
use vibe_application::DashboardContext;
use vibe_core::notification::Severity;

pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Probes the session and logs in with `credentials` when there is none.
///
/// Each invocation starts with an empty cookie jar, so commands that need a
/// session must establish one themselves.
pub async fn ensure_session(context: &DashboardContext, credentials: &Credentials) -> Result<()> {
    if context.init().await.is_authenticated() {
        return Ok(());
    }
    match (&credentials.username, &credentials.password) {
        (Some(username), Some(password)) => {
            context.session().login(username, password).await?;
            Ok(())
        }
        _ => bail!("Not logged in: pass --username and --password (or VIBE_USERNAME/VIBE_PASSWORD)"),
    }
}

pub fn print_notifications(context: &DashboardContext) {
    for notification in context.notifications().snapshot() {
        let marker = match notification.severity {
            Severity::Default => "*",
            Severity::Success => "ok",
            Severity::Warning => "warn",
            Severity::Error => "error",
        };
        match notification.description {
            Some(description) => eprintln!("[{}] {}: {}", marker, notification.title, description),
            None => eprintln!("[{}] {}", marker, notification.title),
        }
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
