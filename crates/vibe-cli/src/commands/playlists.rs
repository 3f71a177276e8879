use super::{Credentials, ensure_session, or_dash};
use anyhow::Result;
use clap::Subcommand;
use vibe_application::DashboardContext;
use vibe_core::resource::{CreatePlaylistsRequest, ReshuffleRequest};

#[derive(Subcommand)]
pub enum PlaylistsAction {
    /// List playlists
    List,
    /// Create playlists for an account
    Create {
        account_id: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value_t = 7)]
        interval_days: u32,
    },
    /// Reshuffle the given playlists, or all of them
    Reshuffle { playlist_ids: Vec<String> },
    /// Delete a playlist
    Delete { playlist_id: String },
}

pub async fn run(
    context: &DashboardContext,
    credentials: &Credentials,
    action: PlaylistsAction,
) -> Result<()> {
    ensure_session(context, credentials).await?;
    let api = context.api();

    match action {
        PlaylistsAction::List => {
            for playlist in &api.playlists().await?.playlists {
                println!(
                    "{:<24} {:<32} {:<20} size={:<4} {:<10} next={}",
                    playlist.id,
                    playlist.name,
                    playlist.account_display_name,
                    playlist.size,
                    playlist.status,
                    or_dash(playlist.next_reshuffle_at.as_deref())
                );
            }
        }
        PlaylistsAction::Create {
            account_id,
            count,
            prefix,
            interval_days,
        } => {
            api.create_playlists(&CreatePlaylistsRequest {
                account_id,
                count,
                prefix,
                interval_days,
            })
            .await?;
            context
                .notifications()
                .success(format!("Created {} playlist(s)", count));
        }
        PlaylistsAction::Reshuffle { playlist_ids } => {
            let request = ReshuffleRequest {
                playlist_ids: (!playlist_ids.is_empty()).then_some(playlist_ids),
                mode: None,
            };
            api.reshuffle_playlists(&request).await?;
            context.notifications().success("Reshuffle queued");
        }
        PlaylistsAction::Delete { playlist_id } => {
            api.delete_playlist(&playlist_id).await?;
            context
                .notifications()
                .success(format!("Playlist {} deleted", playlist_id));
        }
    }
    Ok(())
}
