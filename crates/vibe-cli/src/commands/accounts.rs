use super::{Credentials, ensure_session, or_dash};
use anyhow::Result;
use clap::Subcommand;
use vibe_application::DashboardContext;

#[derive(Subcommand)]
pub enum AccountsAction {
    /// List linked accounts
    List,
    /// Show the active account
    Active,
    /// Make an account active
    Use { account_id: String },
    /// Clear the active account
    Clear,
    /// Unlink an account
    Remove { account_id: String },
    /// Change an account's playlist prefix
    Prefix { account_id: String, prefix: String },
    /// Refresh an account's token and library
    Refresh { account_id: String },
}

pub async fn run(
    context: &DashboardContext,
    credentials: &Credentials,
    action: AccountsAction,
) -> Result<()> {
    ensure_session(context, credentials).await?;
    let api = context.api();

    match action {
        AccountsAction::List => {
            let active = api.active_account().await?;
            let active_id = active.as_ref().map(|a| a.id.as_str());
            for account in &api.accounts().await?.accounts {
                let marker = if Some(account.id.as_str()) == active_id { "*" } else { " " };
                println!(
                    "{} {:<24} {:<28} prefix={:<10} playlists={:<4} {}",
                    marker,
                    account.id,
                    account.display_name,
                    or_dash(account.prefix.as_deref()),
                    account
                        .playlists_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    account.status
                );
            }
        }
        AccountsAction::Active => match api.active_account().await? {
            Some(account) => println!("{} ({})", account.display_name, account.id),
            None => println!("No active account"),
        },
        AccountsAction::Use { account_id } => {
            api.set_active_account(Some(&account_id)).await?;
            context
                .notifications()
                .success(format!("Active account set to {}", account_id));
        }
        AccountsAction::Clear => {
            api.set_active_account(None).await?;
            context.notifications().success("Active account cleared");
        }
        AccountsAction::Remove { account_id } => {
            api.remove_account(&account_id).await?;
            context
                .notifications()
                .success(format!("Account {} removed", account_id));
        }
        AccountsAction::Prefix { account_id, prefix } => {
            api.update_account_prefix(&account_id, &prefix).await?;
            context.notifications().success("Prefix updated");
        }
        AccountsAction::Refresh { account_id } => {
            api.refresh_account(&account_id).await?;
            context
                .notifications()
                .success(format!("Refresh started for {}", account_id));
        }
    }
    Ok(())
}
