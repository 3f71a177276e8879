use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use vibe_application::DashboardContext;
use vibe_core::config::ClientConfig;
use vibe_infrastructure::{ConfigService, HttpTransport};

mod commands;

#[derive(Parser)]
#[command(name = "vibe")]
#[command(about = "Vibe CLI - operator dashboard client", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.config/vibe/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Username to log in with when the server has no session for us
    #[arg(long, global = true, env = "VIBE_USERNAME")]
    username: Option<String>,

    #[arg(long, global = true, env = "VIBE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the session state
    Status,
    /// Log in and show the resulting identity
    Login,
    /// End the session
    Logout,
    /// Linked accounts and the active account
    Accounts {
        #[command(subcommand)]
        action: commands::accounts::AccountsAction,
    },
    /// Curated playlists
    Playlists {
        #[command(subcommand)]
        action: commands::playlists::PlaylistsAction,
    },
    /// Dashboard overview metrics
    Metrics {
        /// Keep refreshing until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// Automation jobs
    Jobs {
        #[command(subcommand)]
        action: commands::jobs::JobsAction,
    },
    /// Server-side curation settings
    Settings,
}

fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new(),
    };
    let mut config = service.get_config().context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    Ok(config)
}

fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    init_logging(&config.log_level);

    let transport = Arc::new(HttpTransport::new(&config)?);
    let context = DashboardContext::new(config, transport);
    let credentials = commands::Credentials {
        username: cli.username,
        password: cli.password,
    };

    let outcome = match cli.command {
        Commands::Status => commands::session::status(&context).await,
        Commands::Login => commands::session::login(&context, &credentials).await,
        Commands::Logout => commands::session::logout(&context).await,
        Commands::Accounts { action } => {
            commands::accounts::run(&context, &credentials, action).await
        }
        Commands::Playlists { action } => {
            commands::playlists::run(&context, &credentials, action).await
        }
        Commands::Metrics { watch } => commands::metrics::run(&context, &credentials, watch).await,
        Commands::Jobs { action } => commands::jobs::run(&context, &credentials, action).await,
        Commands::Settings => commands::settings::show(&context, &credentials).await,
    };

    if let Err(e) = &outcome {
        match e.downcast_ref::<vibe_core::SyncError>() {
            Some(sync) => context.notifications().notify_failure("Request failed", sync),
            None => context.notifications().error("Request failed", e.to_string()),
        };
    }
    commands::print_notifications(&context);
    context.teardown();

    if outcome.is_err() {
        std::process::exit(1);
    }
    Ok(())
}
