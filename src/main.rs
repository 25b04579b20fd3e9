// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "scanview")]
#[command(about = "Barcode scanner and stored-photo lookup for the terminal")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Lookup endpoint URL (overrides the config file)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Action discriminator sent with each lookup (overrides the config file)
    #[arg(long, global = true)]
    action: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up a typed barcode
    Lookup {
        /// The barcode value
        barcode: String,

        /// Open the first photo in the browser
        #[arg(short, long)]
        open: bool,

        /// Download all photos to the pictures directory
        #[arg(short, long)]
        save: bool,
    },

    /// Decode a barcode from an image file, then look it up
    Photo {
        /// Path to the image
        path: PathBuf,

        /// Open the first photo in the browser
        #[arg(short, long)]
        open: bool,

        /// Download all photos to the pictures directory
        #[arg(short, long)]
        save: bool,
    },

    /// Scan a frame source until a barcode decodes, then look it up
    Scan {
        /// Directory of image frames, replayed in name order
        frames_dir: PathBuf,

        /// Open the first photo in the browser
        #[arg(short, long)]
        open: bool,

        /// Download all photos to the pictures directory
        #[arg(short, long)]
        save: bool,
    },

    /// Look up a typed barcode and browse the photos interactively
    View {
        /// The barcode value
        barcode: String,
    },

    /// Print where the config file lives
    ConfigPath,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=scanview=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let args = Cli::parse();
    let config = cli::load_config(args.endpoint, args.action)?;

    match args.command {
        Commands::Lookup {
            barcode,
            open,
            save,
        } => cli::lookup_barcode(
            config,
            barcode,
            cli::PresentOptions {
                open_first: open,
                save,
            },
        ),
        Commands::Photo { path, open, save } => cli::decode_photo(
            config,
            path,
            cli::PresentOptions {
                open_first: open,
                save,
            },
        ),
        Commands::Scan {
            frames_dir,
            open,
            save,
        } => cli::live_scan(
            config,
            frames_dir,
            cli::PresentOptions {
                open_first: open,
                save,
            },
        ),
        Commands::View { barcode } => scanview::terminal::run(config, barcode),
        Commands::ConfigPath => cli::config_path(),
    }
}
