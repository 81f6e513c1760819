use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "focuslog", version, about = "Interruption-aware work session tracker")]
struct Cli {
    /// Config file (default: ~/.config/focuslog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Data directory, overriding the configured one
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Work and interruption statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Stored data management
    Data {
        #[command(subcommand)]
        action: commands::data::DataAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays clean for command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "focuslog=warn,focuslog_core=warn".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = commands::Context::load(cli.config, cli.data_dir)?;
    match cli.command {
        Commands::Session { action } => commands::session::run(&ctx, action),
        Commands::Stats { action } => commands::stats::run(&ctx, action),
        Commands::Data { action } => commands::data::run(&ctx, action),
        Commands::Config { action } => commands::config::run(ctx, action),
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
