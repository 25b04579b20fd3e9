// SPDX-License-Identifier: GPL-3.0-only

//! The capture → decode → query → present state machine
//!
//! One pipeline per operator session. All mutation flows through
//! [`Pipeline::apply`], and every asynchronous step is tagged with the
//! generation it was started under: starting a new capture bumps the
//! generation, so completions of superseded work are dropped on the floor
//! instead of overwriting newer state. There is exactly one writer, so no
//! locking — stale results are discarded, not synchronized.

use crate::backends::{
    BarcodeDecoder, CancelToken, CaptureKind, CaptureSession, DecodeOutcome, FrameStream,
    LiveInput, LiveStreamDecoder, ManualEntry, StillImageDecoder,
};
use crate::barcode::BarcodeValue;
use crate::errors::{DecodeFailure, LookupFailure, ScanError, SessionFailure};
use crate::lookup::{LookupClient, LookupResultItem};
use tracing::{debug, warn};

/// Monotonic tag for in-flight work; stale tags are discarded
pub type Generation = u64;

/// The single observable pipeline state
///
/// Presentation reads this; only the pipeline writes it.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Capturing,
    Decoding,
    Querying,
    /// Lookup returned at least one item, newest first
    Ready(Vec<LookupResultItem>),
    /// Lookup succeeded but nothing is stored for this barcode
    Empty(BarcodeValue),
    /// Any failure, recovered into one human-readable message
    Failed { reason: ScanError, message: String },
}

/// A completion flowing back into the state machine
#[derive(Debug)]
pub enum PipelineEvent {
    /// Raw input (image, frame stream, typed text) is in hand
    InputReady,
    SessionFailed(SessionFailure),
    Decoded(BarcodeValue),
    DecodeFailed(DecodeFailure),
    /// Operator cancelled the capture; not a failure
    Cancelled,
    LookupFinished(Result<Vec<LookupResultItem>, LookupFailure>),
}

pub struct Pipeline {
    state: PipelineState,
    generation: Generation,
    /// Barcode decoded by the current cycle; cleared when a new one begins
    decoded: Option<BarcodeValue>,
    client: LookupClient,
}

impl Pipeline {
    pub fn new(client: LookupClient) -> Self {
        Self {
            state: PipelineState::Idle,
            generation: 0,
            decoded: None,
            client,
        }
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The barcode the current cycle decoded, if it got that far
    pub fn decoded_barcode(&self) -> Option<&BarcodeValue> {
        self.decoded.as_ref()
    }

    /// Start a new capture cycle from any state
    ///
    /// Unconditionally discards the previous cycle: its results, its
    /// decoded barcode, and (via the generation bump) any completion still
    /// in flight.
    pub fn begin_capture(&mut self, kind: CaptureKind) -> Generation {
        self.generation += 1;
        self.decoded = None;
        self.state = PipelineState::Capturing;
        debug!(generation = self.generation, kind = ?kind, "Capture started");
        self.generation
    }

    /// Return to `Idle`, discarding any in-flight work
    pub fn reset(&mut self) {
        self.generation += 1;
        self.decoded = None;
        self.state = PipelineState::Idle;
    }

    /// Apply a completion; returns false if it was stale or out of place
    pub fn apply(&mut self, generation: Generation, event: PipelineEvent) -> bool {
        if generation != self.generation {
            debug!(
                event = ?event,
                stale = generation,
                current = self.generation,
                "Dropping stale completion"
            );
            return false;
        }

        match (&self.state, event) {
            (PipelineState::Capturing, PipelineEvent::InputReady) => {
                self.state = PipelineState::Decoding;
            }
            (PipelineState::Capturing, PipelineEvent::SessionFailed(e)) => {
                self.fail(ScanError::Session(e));
            }
            (PipelineState::Decoding, PipelineEvent::Decoded(barcode)) => {
                debug!(barcode = %barcode, "Decoded");
                self.decoded = Some(barcode);
                self.state = PipelineState::Querying;
            }
            (PipelineState::Decoding, PipelineEvent::DecodeFailed(e)) => {
                self.fail(ScanError::Decode(e));
            }
            (PipelineState::Decoding, PipelineEvent::Cancelled) => {
                debug!("Capture cancelled, returning to idle");
                self.decoded = None;
                self.state = PipelineState::Idle;
            }
            (PipelineState::Querying, PipelineEvent::LookupFinished(Ok(items))) => {
                if items.is_empty() {
                    match self.decoded.clone() {
                        Some(barcode) => self.state = PipelineState::Empty(barcode),
                        None => {
                            warn!("Empty lookup with no decoded barcode");
                            self.state = PipelineState::Idle;
                        }
                    }
                } else {
                    self.state = PipelineState::Ready(items);
                }
            }
            (PipelineState::Querying, PipelineEvent::LookupFinished(Err(e))) => {
                self.fail(ScanError::Lookup(e));
            }
            (state, event) => {
                warn!(state = ?state, event = ?event, "Ignoring out-of-place event");
                return false;
            }
        }
        true
    }

    fn fail(&mut self, reason: ScanError) {
        let message = reason.user_message();
        warn!(error = %reason, "Pipeline cycle failed");
        self.state = PipelineState::Failed { reason, message };
    }

    /// Lookup step shared by all drivers
    async fn run_lookup(&mut self, generation: Generation) {
        let Some(barcode) = self.decoded.clone() else {
            return;
        };
        let result = self.client.lookup(&barcode).await;
        self.apply(generation, PipelineEvent::LookupFinished(result));
    }

    /// Drive one full cycle from typed input
    pub async fn run_manual(&mut self, raw: &str) -> &PipelineState {
        let generation = self.begin_capture(CaptureKind::Manual);
        // Typed text is its own raw input
        self.apply(generation, PipelineEvent::InputReady);

        match ManualEntry.decode(raw.to_string()).await {
            Ok(DecodeOutcome::Decoded(barcode)) => {
                self.apply(generation, PipelineEvent::Decoded(barcode));
            }
            Ok(DecodeOutcome::Cancelled) => {
                self.apply(generation, PipelineEvent::Cancelled);
            }
            Err(e) => {
                self.apply(generation, PipelineEvent::DecodeFailed(e));
            }
        }

        if matches!(self.state, PipelineState::Querying) {
            self.run_lookup(generation).await;
        }
        &self.state
    }

    /// Drive one full cycle from a picked still image
    ///
    /// The provider owns opening/reading the file; its errors are session
    /// failures, not decode failures.
    pub async fn run_still(
        &mut self,
        provider: impl FnOnce() -> Result<image::DynamicImage, SessionFailure>,
    ) -> &PipelineState {
        let generation = self.begin_capture(CaptureKind::Still);

        let mut session = match CaptureSession::acquire(CaptureKind::Still, provider) {
            Ok(session) => session,
            Err(e) => {
                self.apply(generation, PipelineEvent::SessionFailed(e));
                return &self.state;
            }
        };
        self.apply(generation, PipelineEvent::InputReady);

        let outcome = match session.take_source() {
            Some(image) => StillImageDecoder.decode(image).await,
            None => Err(DecodeFailure::NotFound),
        };
        // Decode is done either way; the file handle is not needed for the
        // network step
        session.release();

        match outcome {
            Ok(DecodeOutcome::Decoded(barcode)) => {
                self.apply(generation, PipelineEvent::Decoded(barcode));
            }
            Ok(DecodeOutcome::Cancelled) => {
                self.apply(generation, PipelineEvent::Cancelled);
            }
            Err(e) => {
                self.apply(generation, PipelineEvent::DecodeFailed(e));
            }
        }

        if matches!(self.state, PipelineState::Querying) {
            self.run_lookup(generation).await;
        }
        &self.state
    }

    /// Drive one full cycle from a live frame source
    pub async fn run_live(
        &mut self,
        provider: impl FnOnce() -> Result<FrameStream, SessionFailure>,
        cancel: CancelToken,
        sample_rate_hz: u32,
    ) -> &PipelineState {
        let generation = self.begin_capture(CaptureKind::Live);

        let session = match CaptureSession::acquire(CaptureKind::Live, provider) {
            Ok(session) => session,
            Err(e) => {
                self.apply(generation, PipelineEvent::SessionFailed(e));
                return &self.state;
            }
        };
        self.apply(generation, PipelineEvent::InputReady);

        let mut decoder = LiveStreamDecoder::new(sample_rate_hz);
        match decoder.decode(LiveInput { session, cancel }).await {
            Ok(DecodeOutcome::Decoded(barcode)) => {
                self.apply(generation, PipelineEvent::Decoded(barcode));
            }
            Ok(DecodeOutcome::Cancelled) => {
                self.apply(generation, PipelineEvent::Cancelled);
            }
            Err(e) => {
                self.apply(generation, PipelineEvent::DecodeFailed(e));
            }
        }

        if matches!(self.state, PipelineState::Querying) {
            self.run_lookup(generation).await;
        }
        &self.state
    }
}
