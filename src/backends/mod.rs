// SPDX-License-Identifier: GPL-3.0-only

//! Decoder backend abstraction
//!
//! Three ways to get a barcode out of the operator's hands, behind one
//! contract:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              Pipeline Layer                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌──────────┐  ┌───────────┐  ┌──────────┐ │
//! │  │  Manual  │  │   Still   │  │   Live   │ │
//! │  │  (text)  │  │  (image)  │  │ (stream) │ │
//! │  └──────────┘  └───────────┘  └──────────┘ │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The backend is chosen at the call site from the capture trigger (which
//! subcommand or key the operator used), never by inspecting the input at
//! runtime.
//!
//! # Modules
//!
//! - [`manual`]: pass-through for typed input
//! - [`still`]: single-image decode
//! - [`live`]: bounded-rate sampling of a frame stream
//! - [`session`]: capture source lifecycle with guaranteed release
//! - [`types`]: frame and frame-source types

pub mod live;
pub mod manual;
pub mod session;
pub mod still;
pub mod types;

pub use live::{LiveInput, LiveStreamDecoder};
pub use manual::ManualEntry;
pub use session::{CancelToken, CaptureSession, SessionProbe, SessionState};
pub use still::StillImageDecoder;
pub use types::{Frame, FrameStream, ImageSequenceSource, PixelFormat};

use crate::barcode::BarcodeValue;
use crate::errors::DecodeFailure;

/// Which backend produced or will produce the barcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureKind {
    Manual,
    Still,
    Live,
}

/// Result of a decode attempt that ran to completion
///
/// Operator cancellation ends a live session with no value and no error,
/// so it is an outcome, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    Decoded(BarcodeValue),
    Cancelled,
}

/// The shared decode contract implemented by all three backends
#[allow(async_fn_in_trait)]
pub trait BarcodeDecoder {
    /// Backend-specific input: typed text, a decoded image, or a live
    /// session plus cancel token
    type Input;

    fn kind(&self) -> CaptureKind;

    async fn decode(&mut self, input: Self::Input) -> Result<DecodeOutcome, DecodeFailure>;
}
