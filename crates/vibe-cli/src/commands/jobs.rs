use super::{Credentials, ensure_session, or_dash};
use anyhow::Result;
use clap::Subcommand;
use vibe_application::DashboardContext;

#[derive(Subcommand)]
pub enum JobsAction {
    /// List jobs
    List,
    /// Show recent runs of a job
    History { job_name: String },
    Enable { job_name: String },
    Disable { job_name: String },
    /// Run a job now
    Run { job_name: String },
}

pub async fn run(context: &DashboardContext, credentials: &Credentials, action: JobsAction) -> Result<()> {
    ensure_session(context, credentials).await?;
    let api = context.api();

    match action {
        JobsAction::List => {
            for job in &api.jobs().await?.jobs {
                let enabled = match job.enabled {
                    Some(false) => "disabled",
                    _ => "enabled",
                };
                println!(
                    "{:<24} {:<10} {:<9} next={} last={}",
                    job.name,
                    job.status,
                    enabled,
                    or_dash(job.next_run_at.as_deref()),
                    or_dash(job.last_run_at.as_deref())
                );
            }
        }
        JobsAction::History { job_name } => {
            for run in &api.job_history(&job_name).await?.history {
                println!(
                    "{:<24} {:<10} finished={} duration_ms={}",
                    run.id,
                    run.status,
                    or_dash(run.finished_at.as_deref()),
                    run.duration_ms
                        .map(|d| format!("{:.0}", d))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }
        JobsAction::Enable { job_name } => {
            api.set_job_enabled(&job_name, true).await?;
            context
                .notifications()
                .success(format!("{} enabled", job_name));
        }
        JobsAction::Disable { job_name } => {
            api.set_job_enabled(&job_name, false).await?;
            context
                .notifications()
                .success(format!("{} disabled", job_name));
        }
        JobsAction::Run { job_name } => {
            api.run_job_now(&job_name).await?;
            context
                .notifications()
                .success(format!("{} triggered", job_name));
        }
    }
    Ok(())
}
