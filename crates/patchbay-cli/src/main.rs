//! Patchbay CLI - inspect the RED808 effect catalog, presets, and saved
//! scenes, and preview the command stream a preset produces.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "patchbay")]
#[command(author, version, about = "RED808 Patchbay CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available effects and their parameters
    Effects(commands::effects::EffectsArgs),

    /// List and inspect factory presets
    Presets(commands::presets::PresetsArgs),

    /// Run a preset through a session and print the device command stream
    Simulate(commands::simulate::SimulateArgs),

    /// Manage saved scenes
    Scenes(commands::scenes::ScenesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Effects(args) => commands::effects::run(args),
        Commands::Presets(args) => commands::presets::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Scenes(args) => commands::scenes::run(args),
    }
}
