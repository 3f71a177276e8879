use super::Credentials;
use anyhow::{Result, bail};
use vibe_application::DashboardContext;
use vibe_core::session::AuthState;

pub async fn status(context: &DashboardContext) -> Result<()> {
    let snapshot = context.init().await;
    match (snapshot.state(), snapshot.identity()) {
        (AuthState::Authenticated, Some(identity)) => {
            println!("Logged in as {}", identity.username)
        }
        _ => println!("Not logged in"),
    }
    Ok(())
}

pub async fn login(context: &DashboardContext, credentials: &Credentials) -> Result<()> {
    let (Some(username), Some(password)) = (&credentials.username, &credentials.password) else {
        bail!("--username and --password are required");
    };
    let snapshot = context.session().login(username, password).await?;
    if let Some(identity) = snapshot.identity() {
        context
            .notifications()
            .success(format!("Logged in as {}", identity.username));
    }
    Ok(())
}

pub async fn logout(context: &DashboardContext) -> Result<()> {
    context.session().logout().await;
    context.notifications().success("Logged out");
    Ok(())
}
