//! mulactl - control-plane CLI for the mula scheduler.
//!
//! Provides commands for inspecting and steering schedulers and queues
//! against a running scheduler's control API, plus local CLI configuration.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config, health, queues, schedulers};
use output::OutputFormat;

/// mulactl - control-plane CLI for the mula scheduler
#[derive(Parser)]
#[command(
    name = "mulactl",
    version = "0.1.0",
    about = "Control-plane CLI for the mula scheduler",
    propagate_version = true
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    output: OutputFormat,

    /// Scheduler control API URL
    #[arg(long, global = true, env = "MULA_API_URL")]
    api_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scheduler management operations
    #[command(subcommand)]
    Scheduler(schedulers::SchedulerCommands),

    /// Queue inspection and manipulation operations
    #[command(subcommand)]
    Queue(queues::QueueCommands),

    /// Check scheduler health
    Health(health::HealthArgs),

    /// Local CLI configuration management
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let api_url = cli
        .api_url
        .clone()
        .or_else(config::load_api_url)
        .unwrap_or_else(|| "http://localhost:8004".to_string());

    let client = client::ApiClient::new(&api_url)?;
    let format = cli.output;

    let result = match cli.command {
        Commands::Scheduler(cmd) => schedulers::execute(cmd, &client, format).await,
        Commands::Queue(cmd) => queues::execute(cmd, &client, format).await,
        Commands::Health(args) => health::execute(args, &client, format).await,
        Commands::Config(cmd) => config::execute(cmd, format).await,
    };

    if let Err(e) = result {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
