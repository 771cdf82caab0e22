//! Timbral CLI - render and play the MPE wavetable synth.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timbral")]
#[command(author, version, about = "Timbral MPE wavetable synth", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a score (or the built-in demo) to a WAV file
    Render(commands::render::RenderArgs),

    /// Play through an audio device from MIDI input or the demo
    Play(commands::play::PlayArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),

    /// List, show and save patches
    Patches(commands::patches::PatchesArgs),

    /// List global parameters and engine settings
    Params(commands::params::ParamsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Patches(args) => commands::patches::run(args),
        Commands::Params(args) => commands::params::run(args),
    }
}
