//! modplay - inspect and render tracker modules
//!
//! # Commands
//!
//! - `modplay info` - Metadata, counts, subsongs and the order list
//! - `modplay patterns` - Dump pattern grids
//! - `modplay render` - Render to a 32-bit float WAV file
//!
//! # Usage
//!
//! ```bash
//! modplay info song.xm --json
//! modplay patterns song.mod --pattern 3
//! modplay render song.xm -o song.wav --rate 48000 --repeat 1
//! modplay render song.mod --ctl render.stereoseparation_percent=50 --checksum
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use modplay_cli::{info, patterns, render};

/// modplay - inspect and render XM/MOD tracker modules
#[derive(Parser)]
#[command(name = "modplay")]
#[command(about = "Inspect and render XM/MOD tracker modules")]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show metadata, counts, subsongs and the order list
    Info(info::InfoArgs),

    /// Dump pattern grids
    Patterns(patterns::PatternsArgs),

    /// Render to a 32-bit float stereo WAV file
    Render(render::RenderArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info(args) => info::execute(args),
        Commands::Patterns(args) => patterns::execute(args),
        Commands::Render(args) => render::execute(args),
    }
}
