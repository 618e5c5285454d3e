mod client;
mod commands;
mod config;
mod domain;
mod error;
mod inventory;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dnac-purge",
    version,
    about = "Bulk-delete network devices from DNA Center using a spreadsheet of hostnames"
)]
struct Cli {
    /// Log level (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unprovision, delete and verify every listed device
    Run {
        #[command(flatten)]
        overrides: commands::Overrides,
    },

    /// Resolve every listed device and show what `run` would do
    Plan {
        #[command(flatten)]
        overrides: commands::Overrides,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json);

    match cli.command {
        Commands::Run { overrides } => {
            let cfg = commands::resolve_config(&overrides)?;
            commands::run::run(cfg)
        }
        Commands::Plan { overrides } => {
            let cfg = commands::resolve_config(&overrides)?;
            commands::plan::run(cfg)
        }
    }
}
