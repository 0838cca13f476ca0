// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

use cli::{CameraSide, FlashArg};

#[derive(Parser)]
#[command(name = "capture-session")]
#[command(about = "Drive a camera capture session from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras and microphones
    List,

    /// Take a photo
    Photo {
        /// Camera side to use
        #[arg(short, long, value_enum, default_value = "back")]
        position: CameraSide,

        /// Flash mode (default: from config)
        #[arg(short, long, value_enum)]
        flash: Option<FlashArg>,

        /// Output file path (default: ~/Pictures/photo_TIMESTAMP.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video
    Video {
        /// Camera side to use
        #[arg(short, long, value_enum, default_value = "back")]
        position: CameraSide,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "3")]
        duration: u64,

        /// Output file path (default: ~/Videos/video_TIMESTAMP.mp4)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Walk through switching, flash, focus, zoom and capture
    Demo,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=capture_session=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => cli::list_devices()?,
        Commands::Photo {
            position,
            flash,
            output,
        } => cli::take_photo(position, flash, output)?,
        Commands::Video {
            position,
            duration,
            output,
        } => cli::record_video(position, duration, output)?,
        Commands::Demo => cli::run_demo()?,
    }

    Ok(())
}
