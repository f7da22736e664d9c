use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{CalendarCommand, ConfigCommand, PlanCommand, SyncCommand};
use config::Config;
use fitplan_core::Workspace;

#[derive(Parser)]
#[command(name = "fitplan")]
#[command(version)]
#[command(about = "Share workout plans and sync them into your calendar", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workout plans
    Plan(PlanCommand),

    /// View your workout calendar
    Calendar(CalendarCommand),

    /// Sync plans into your calendar
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fitplan=warn,fitplan_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;
    tracing::debug!(
        data_dir = %config.data_dir.value.display(),
        user = %config.user.value,
        "loaded configuration"
    );

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let workspace = Workspace::open(&config.data_dir.value, config.concurrency.value);
    let session = workspace.session(&config.user.value)?;

    match command {
        Commands::Plan(cmd) => cmd.run(&session, &config).await?,
        Commands::Calendar(cmd) => cmd.run(&session).await?,
        Commands::Sync(cmd) => cmd.run(&session).await?,
        Commands::Config(_) => {}
    }

    Ok(())
}
