// SPDX-License-Identifier: GPL-3.0-only

//! Live-stream backend
//!
//! Samples a frame stream at a bounded rate and decodes one frame per
//! sample. The first successful decode stops sampling and releases the
//! session immediately — one acquisition never emits twice. Cancellation is
//! cooperative: the token is checked every iteration, so the loop cannot
//! outlive its session.

use super::session::{CancelToken, CaptureSession};
use super::types::FrameStream;
use super::{BarcodeDecoder, CaptureKind, DecodeOutcome};
use crate::barcode::BarcodeValue;
use crate::constants;
use crate::errors::DecodeFailure;
use crate::symbology;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Live sampling decoder
#[derive(Debug)]
pub struct LiveStreamDecoder {
    interval: Duration,
}

/// Everything the live decoder consumes: the acquired stream and the
/// operator's cancel handle. The session is owned so release is guaranteed
/// on every return path.
pub struct LiveInput {
    pub session: CaptureSession<FrameStream>,
    pub cancel: CancelToken,
}

impl LiveStreamDecoder {
    /// Create a decoder sampling at the given rate (clamped to 5..=15 Hz)
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            interval: constants::sample_interval(sample_rate_hz),
        }
    }
}

impl Default for LiveStreamDecoder {
    fn default() -> Self {
        Self::new(constants::DEFAULT_SAMPLE_RATE_HZ)
    }
}

impl BarcodeDecoder for LiveStreamDecoder {
    type Input = LiveInput;

    fn kind(&self) -> CaptureKind {
        CaptureKind::Live
    }

    async fn decode(&mut self, input: LiveInput) -> Result<DecodeOutcome, DecodeFailure> {
        let LiveInput { mut session, cancel } = input;

        loop {
            if cancel.is_cancelled() {
                debug!("Live capture cancelled by operator");
                session.release();
                return Ok(DecodeOutcome::Cancelled);
            }

            let Some(stream) = session.source_mut() else {
                // Session released out from under us; treat as source gone
                return Err(DecodeFailure::NotFound);
            };

            // Wait at most one interval for a frame so cancellation stays
            // responsive on a stalled source
            let frame = match tokio::time::timeout(self.interval, stream.next()).await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    debug!("Frame source ended without a decodable symbol");
                    session.release();
                    return Err(DecodeFailure::NotFound);
                }
                Err(_) => {
                    trace!("No frame within the sampling interval");
                    continue;
                }
            };

            let decoded = tokio::task::spawn_blocking(move || {
                let gray = frame.to_gray();
                symbology::decode_gray(&gray)
            })
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Live decode task panicked");
                Err(DecodeFailure::NotFound)
            });

            match decoded {
                Ok(detection) => {
                    // Stop sampling before anything else happens
                    session.release();
                    debug!(
                        symbology = %detection.symbology,
                        "Live decode succeeded, session released"
                    );
                    match BarcodeValue::new(detection.text) {
                        Some(value) => return Ok(DecodeOutcome::Decoded(value)),
                        None => {
                            return Err(DecodeFailure::Unreadable(
                                "symbol decoded to empty content".to_string(),
                            ));
                        }
                    }
                }
                // Frames without a readable symbol are the normal case
                // while the operator lines up the camera
                Err(e) => trace!(reason = %e, "Frame had no readable symbol"),
            }

            tokio::time::sleep(self.interval).await;
        }
    }
}
