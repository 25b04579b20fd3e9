// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanview application
//!
//! Every failure the pipeline can hit is one of three families: the decode
//! step, the capture session, or the remote lookup. All of them recover into
//! [`crate::pipeline::PipelineState::Failed`] and carry exactly one
//! user-facing message per failure kind; raw transport and parser errors are
//! logged but never shown directly.

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum ScanError {
    /// Barcode decoding errors
    Decode(DecodeFailure),
    /// Capture session acquisition errors
    Session(SessionFailure),
    /// Remote lookup errors
    Lookup(LookupFailure),
    /// Configuration errors
    Config(String),
}

/// Decode-step errors
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeFailure {
    /// Manual input was empty after trimming
    Empty,
    /// No barcode symbol was located in the input
    NotFound,
    /// A symbol was located but decoding hit a checksum/format error
    Unreadable(String),
}

/// Capture session acquisition errors
#[derive(Debug, Clone, PartialEq)]
pub enum SessionFailure {
    /// The operator or OS denied access to the capture source
    PermissionDenied(String),
    /// The capture source does not exist or cannot produce input
    DeviceUnavailable(String),
}

/// Remote lookup errors
#[derive(Debug, Clone, PartialEq)]
pub enum LookupFailure {
    /// Request never produced a successful response (connect, timeout, non-2xx)
    Transport {
        /// HTTP status, when the request got far enough to have one
        status: Option<u16>,
        detail: String,
    },
    /// Response body was not parseable JSON
    MalformedBody(String),
    /// The service itself reported a failure in a well-formed body
    ServerReported(String),
    /// Well-formed JSON in none of the recognized shapes
    UnrecognizedShape,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Decode(e) => write!(f, "Decode error: {}", e),
            ScanError::Session(e) => write!(f, "Capture error: {}", e),
            ScanError::Lookup(e) => write!(f, "Lookup error: {}", e),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for DecodeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFailure::Empty => write!(f, "empty input"),
            DecodeFailure::NotFound => write!(f, "no barcode found"),
            DecodeFailure::Unreadable(msg) => write!(f, "unreadable barcode: {}", msg),
        }
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionFailure::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            SessionFailure::DeviceUnavailable(msg) => write!(f, "device unavailable: {}", msg),
        }
    }
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupFailure::Transport {
                status: Some(status),
                detail,
            } => write!(f, "transport failure (HTTP {}): {}", status, detail),
            LookupFailure::Transport {
                status: None,
                detail,
            } => write!(f, "transport failure: {}", detail),
            LookupFailure::MalformedBody(msg) => write!(f, "malformed response body: {}", msg),
            LookupFailure::ServerReported(msg) => write!(f, "service reported: {}", msg),
            LookupFailure::UnrecognizedShape => write!(f, "unrecognized response shape"),
        }
    }
}

impl std::error::Error for ScanError {}
impl std::error::Error for DecodeFailure {}
impl std::error::Error for SessionFailure {}
impl std::error::Error for LookupFailure {}

impl ScanError {
    /// The single human-readable line shown to the operator for this failure
    ///
    /// Diagnostic detail stays in the `Display` impls (and the logs); the
    /// operator sees one stable sentence per failure kind. The exception is
    /// a service-reported message, which is already written for humans and
    /// is passed through.
    pub fn user_message(&self) -> String {
        match self {
            ScanError::Decode(DecodeFailure::Empty) => {
                "Enter a barcode before searching.".to_string()
            }
            ScanError::Decode(DecodeFailure::NotFound) => {
                "No barcode was found in the image.".to_string()
            }
            ScanError::Decode(DecodeFailure::Unreadable(_)) => {
                "A barcode was found but could not be read.".to_string()
            }
            ScanError::Session(SessionFailure::PermissionDenied(_)) => {
                "Access to the capture source was denied.".to_string()
            }
            ScanError::Session(SessionFailure::DeviceUnavailable(_)) => {
                "The capture source is unavailable.".to_string()
            }
            ScanError::Lookup(LookupFailure::Transport { .. }) => {
                "Could not reach the photo service.".to_string()
            }
            ScanError::Lookup(LookupFailure::MalformedBody(_)) => {
                "The photo service returned an unreadable response.".to_string()
            }
            ScanError::Lookup(LookupFailure::ServerReported(msg)) => msg.clone(),
            ScanError::Lookup(LookupFailure::UnrecognizedShape) => {
                "The photo service returned an unexpected response.".to_string()
            }
            ScanError::Config(msg) => msg.clone(),
        }
    }
}

// Conversions from sub-errors to ScanError
impl From<DecodeFailure> for ScanError {
    fn from(err: DecodeFailure) -> Self {
        ScanError::Decode(err)
    }
}

impl From<SessionFailure> for ScanError {
    fn from(err: SessionFailure) -> Self {
        ScanError::Session(err)
    }
}

impl From<LookupFailure> for ScanError {
    fn from(err: LookupFailure) -> Self {
        ScanError::Lookup(err)
    }
}

impl From<std::io::Error> for SessionFailure {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                SessionFailure::PermissionDenied(err.to_string())
            }
            _ => SessionFailure::DeviceUnavailable(err.to_string()),
        }
    }
}
