// SPDX-License-Identifier: GPL-3.0-only

//! scanview - resolve a physical item's barcode to its stored photos
//!
//! The core is one pipeline: acquire a barcode (typed, decoded from a
//! photo, or sampled live from a frame source), query the remote photo
//! service, normalize whatever shape it answers with, and present the
//! result.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: the three capture backends and session lifecycle
//! - [`symbology`]: locating and decoding QR/EAN-13/EAN-8/Code 128 symbols
//! - [`lookup`]: HTTP client and response normalization
//! - [`pipeline`]: the generation-tagged state machine tying it together
//! - [`config`]: user configuration handling
//! - [`storage`]: saving fetched photos
//! - [`terminal`]: interactive results viewer

pub mod backends;
pub mod barcode;
pub mod config;
pub mod constants;
pub mod errors;
pub mod lookup;
pub mod pipeline;
pub mod storage;
pub mod symbology;
pub mod terminal;

// Re-export commonly used types
pub use barcode::BarcodeValue;
pub use config::Config;
pub use errors::{DecodeFailure, LookupFailure, ScanError, SessionFailure};
pub use lookup::{LookupClient, LookupResultItem};
pub use pipeline::{Pipeline, PipelineState};
