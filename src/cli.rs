// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for barcode lookup
//!
//! This module provides command-line functionality for:
//! - Looking up a typed barcode
//! - Decoding a barcode from a photo, then looking it up
//! - Scanning a live frame source until a barcode appears

use scanview::backends::{CancelToken, ImageSequenceSource};
use scanview::config::Config;
use scanview::errors::SessionFailure;
use scanview::lookup::LookupClient;
use scanview::pipeline::{Pipeline, PipelineState};
use scanview::storage;
use std::path::PathBuf;

/// What to do with results beyond printing them
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentOptions {
    /// Open the first photo in the browser
    pub open_first: bool,
    /// Download all photos to the pictures directory
    pub save: bool,
}

/// Load config and apply command-line overrides
pub fn load_config(
    endpoint: Option<String>,
    action: Option<String>,
) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = Config::load()?;
    if let Some(endpoint) = endpoint {
        config.endpoint_url = endpoint;
    }
    if let Some(action) = action {
        config.action = Some(action);
    }
    Ok(config)
}

/// Look up a typed barcode
pub fn lookup_barcode(
    config: Config,
    barcode: String,
    opts: PresentOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut pipeline = build_pipeline(&config)?;
        pipeline.run_manual(&barcode).await;
        present(&config, &pipeline, opts).await
    })
}

/// Decode a barcode from an image file, then look it up
pub fn decode_photo(
    config: Config,
    path: PathBuf,
    opts: PresentOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut pipeline = build_pipeline(&config)?;

        pipeline
            .run_still(move || {
                let bytes = std::fs::read(&path).map_err(SessionFailure::from)?;
                image::load_from_memory(&bytes).map_err(|e| {
                    SessionFailure::DeviceUnavailable(format!("not a readable image: {}", e))
                })
            })
            .await;

        present(&config, &pipeline, opts).await
    })
}

/// Sample a frame source until a barcode decodes, then look it up
///
/// The source is a directory of image files replayed in name order; a
/// camera wrapper can pipe snapshots into such a directory. Ctrl+C cancels
/// the scan without error.
pub fn live_scan(
    config: Config,
    frames_dir: PathBuf,
    opts: PresentOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    println!("Scanning {} — Ctrl+C to cancel", frames_dir.display());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut pipeline = build_pipeline(&config)?;
        let sample_rate = config.sample_rate_hz;

        pipeline
            .run_live(
                move || ImageSequenceSource::open(&frames_dir).map(|s| s.into_stream()),
                cancel,
                sample_rate,
            )
            .await;

        if matches!(pipeline.state(), PipelineState::Idle) {
            println!("Scan cancelled.");
            return Ok(());
        }
        present(&config, &pipeline, opts).await
    })
}

/// Print where the config file lives
pub fn config_path() -> Result<(), Box<dyn std::error::Error>> {
    match Config::path() {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => Err("no config directory on this platform".into()),
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let client = LookupClient::from_config(config)?;
    Ok(Pipeline::new(client))
}

/// Render the final pipeline state to the terminal
async fn present(
    config: &Config,
    pipeline: &Pipeline,
    opts: PresentOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    match pipeline.state() {
        PipelineState::Ready(items) => {
            match pipeline.decoded_barcode() {
                Some(barcode) => println!("Found {} photo(s) for {}:", items.len(), barcode),
                None => println!("Found {} photo(s):", items.len()),
            }
            println!();

            for (index, item) in items.iter().enumerate() {
                let when = item
                    .captured_at
                    .map(|t| {
                        t.with_timezone(&chrono::Local)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_else(|| "-".to_string());
                let location = storage::resolve_image_url(config, item)
                    .unwrap_or_else(|| format!("{} (id, no thumbnail template)", item.image_locator));

                println!("  [{}] {}  ({})", index, item.display_name, when);
                println!("      {}", location);
            }

            if opts.open_first
                && let Some(first) = items.first()
            {
                match storage::resolve_image_url(config, first) {
                    Some(url) => open::that(url)?,
                    None => println!("First photo has no resolvable URL to open."),
                }
            }

            if opts.save {
                save_all(config, pipeline, items).await?;
            }
            Ok(())
        }
        PipelineState::Empty(barcode) => {
            println!("No photos stored for barcode {}", barcode);
            Ok(())
        }
        PipelineState::Failed { message, .. } => Err(message.clone().into()),
        other => Err(format!("pipeline ended in unexpected state: {:?}", other).into()),
    }
}

/// Download every resolvable photo for the current result set
async fn save_all(
    config: &Config,
    pipeline: &Pipeline,
    items: &[scanview::lookup::LookupResultItem],
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(barcode) = pipeline.decoded_barcode() else {
        return Err("no barcode recorded for this result set".into());
    };

    let http = reqwest::Client::new();
    let mut saved = 0usize;

    for item in items {
        let Some(url) = storage::resolve_image_url(config, item) else {
            println!("Skipping {} (no resolvable URL)", item.identifier);
            continue;
        };
        let response = http.get(&url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        let path = storage::save_photo(barcode, item, &bytes).await?;
        println!("Saved {}", path.display());
        saved += 1;
    }

    println!("{} photo(s) saved.", saved);
    Ok(())
}
