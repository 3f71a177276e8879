use super::{Credentials, ensure_session};
use anyhow::Result;
use vibe_application::DashboardContext;
use vibe_core::resource::OverviewMetrics;

fn print_overview(metrics: &OverviewMetrics) {
    let Some(stats) = &metrics.stats else {
        println!("No metrics yet");
        return;
    };
    let show = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    println!("accounts connected : {}", show(stats.accounts_connected.map(|v| v.to_string())));
    println!("playlists active   : {}", show(stats.playlists_active.map(|v| v.to_string())));
    println!(
        "tracks usable      : {} / {}",
        show(stats.tracks_usable.map(|v| v.to_string())),
        show(stats.tracks_total.map(|v| v.to_string()))
    );
    println!(
        "next reshuffle in  : {} days",
        show(stats.next_reshuffle_in_days.map(|v| format!("{:.1}", v)))
    );
    println!("last sync          : {}", show(stats.last_sync_at.clone()));
    for artist in metrics.top_artists.iter().take(5) {
        println!("  {:<30} {}", artist.artist, artist.plays);
    }
}

pub async fn run(context: &DashboardContext, credentials: &Credentials, watch: bool) -> Result<()> {
    ensure_session(context, credentials).await?;

    if !watch {
        print_overview(&*context.api().metrics_overview().await?);
        return Ok(());
    }

    let mut subscription = context.api().watch_metrics_overview();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            alive = subscription.changed() => {
                if !alive {
                    break;
                }
                let current = subscription.current();
                if let Some(error) = &current.error {
                    context.notifications().notify_failure("Metrics refresh failed", error);
                    super::print_notifications(context);
                }
                if let Some(metrics) = current.value() {
                    print_overview(metrics);
                    println!();
                }
                if !context.session().is_authenticated() {
                    break;
                }
            }
        }
    }
    Ok(())
}
