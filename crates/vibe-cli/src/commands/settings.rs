use super::{Credentials, ensure_session};
use anyhow::Result;
use vibe_application::DashboardContext;

pub async fn show(context: &DashboardContext, credentials: &Credentials) -> Result<()> {
    ensure_session(context, credentials).await?;
    let settings = context.api().settings().await?;
    println!("{}", serde_json::to_string_pretty(&*settings)?);
    Ok(())
}
