// SPDX-License-Identifier: GPL-3.0-only

//! Still-image backend
//!
//! Decodes a single already-loaded image, e.g. from a file picker or an
//! on-demand camera snapshot. Opening and reading the file belongs to the
//! capture session; by the time this decoder runs, the pixels are in hand.

use super::{BarcodeDecoder, CaptureKind, DecodeOutcome};
use crate::barcode::BarcodeValue;
use crate::errors::DecodeFailure;
use crate::symbology;
use tracing::warn;

#[derive(Debug, Default)]
pub struct StillImageDecoder;

impl BarcodeDecoder for StillImageDecoder {
    type Input = image::DynamicImage;

    fn kind(&self) -> CaptureKind {
        CaptureKind::Still
    }

    async fn decode(
        &mut self,
        input: image::DynamicImage,
    ) -> Result<DecodeOutcome, DecodeFailure> {
        // Symbol search is CPU-bound; keep it off the async runtime
        let detection = tokio::task::spawn_blocking(move || {
            let gray = input.to_luma8();
            symbology::decode_gray(&gray)
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Still decode task panicked");
            Err(DecodeFailure::Unreadable("decode task failed".to_string()))
        })?;

        match BarcodeValue::new(detection.text) {
            Some(value) => Ok(DecodeOutcome::Decoded(value)),
            None => Err(DecodeFailure::Unreadable(
                "symbol decoded to empty content".to_string(),
            )),
        }
    }
}
