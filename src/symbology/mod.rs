// SPDX-License-Identifier: GPL-3.0-only

//! Symbology detection and decoding
//!
//! Locates and decodes a barcode symbol in a grayscale image. QR decoding
//! uses rqrr; the 1D symbologies (EAN-13, EAN-8, Code 128) run on a
//! scanline engine: Otsu binarization, run-length extraction, then pattern
//! matching per symbology.
//!
//! Symbologies are attempted in a fixed order (QR, EAN-13, EAN-8, Code 128)
//! and, within one symbology, in the detector's native enumeration order.
//! When a frame contains multiple distinct symbols the first successful
//! decode in that order wins; which physical symbol that is, is an accepted
//! nondeterminism boundary of the detection step.

mod code128;
mod ean;
mod qr;
pub mod scanline;

use crate::errors::DecodeFailure;
use image::GrayImage;
use scanline::Run;
use tracing::debug;

/// Supported symbologies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Qr,
    Ean13,
    Ean8,
    Code128,
}

impl std::fmt::Display for Symbology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Symbology::Qr => write!(f, "QR"),
            Symbology::Ean13 => write!(f, "EAN-13"),
            Symbology::Ean8 => write!(f, "EAN-8"),
            Symbology::Code128 => write!(f, "Code 128"),
        }
    }
}

/// A decoded symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub symbology: Symbology,
    pub text: String,
}

/// Outcome of one decode attempt over one input slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RowAttempt {
    /// A symbol decoded cleanly
    Decoded(String),
    /// A symbol structure was found but failed a checksum/format check
    Located,
    /// Nothing resembling a symbol
    Nothing,
}

/// Decode the first barcode found in a grayscale image
///
/// Returns `NotFound` when nothing symbol-shaped exists anywhere in the
/// image, and `Unreadable` when at least one candidate was located but
/// every decode attempt failed.
pub fn decode_gray(gray: &GrayImage) -> Result<Detection, DecodeFailure> {
    let mut located = false;

    match qr::decode(gray) {
        RowAttempt::Decoded(text) => {
            debug!(text = %text, "Decoded QR symbol");
            return Ok(Detection {
                symbology: Symbology::Qr,
                text,
            });
        }
        RowAttempt::Located => located = true,
        RowAttempt::Nothing => {}
    }

    let threshold = scanline::otsu_threshold(gray.as_raw());
    for row in scanline::scan_rows(gray.height()) {
        let runs = scanline::row_runs(scanline::image_row(gray, row), threshold);
        // A mirrored run sequence decodes upside-down symbols
        let mut reversed = runs.clone();
        reversed.reverse();

        for candidate in [&runs, &reversed] {
            if let Some(detection) = decode_one_dimensional(candidate, &mut located) {
                debug!(
                    row,
                    symbology = %detection.symbology,
                    text = %detection.text,
                    "Decoded 1D symbol"
                );
                return Ok(detection);
            }
        }
    }

    if located {
        Err(DecodeFailure::Unreadable(
            "symbol located but checksum/format checks failed".to_string(),
        ))
    } else {
        Err(DecodeFailure::NotFound)
    }
}

/// Try every 1D symbology, in fixed order, against one run sequence
fn decode_one_dimensional(runs: &[Run], located: &mut bool) -> Option<Detection> {
    match ean::decode_row(runs, ean::EanVariant::Ean13) {
        RowAttempt::Decoded(text) => {
            return Some(Detection {
                symbology: Symbology::Ean13,
                text,
            });
        }
        RowAttempt::Located => *located = true,
        RowAttempt::Nothing => {}
    }

    match ean::decode_row(runs, ean::EanVariant::Ean8) {
        RowAttempt::Decoded(text) => {
            return Some(Detection {
                symbology: Symbology::Ean8,
                text,
            });
        }
        RowAttempt::Located => *located = true,
        RowAttempt::Nothing => {}
    }

    match code128::decode_row(runs) {
        RowAttempt::Decoded(text) => Some(Detection {
            symbology: Symbology::Code128,
            text,
        }),
        RowAttempt::Located => {
            *located = true;
            None
        }
        RowAttempt::Nothing => None,
    }
}
