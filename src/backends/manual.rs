// SPDX-License-Identifier: GPL-3.0-only

//! Manual entry backend

use super::{BarcodeDecoder, CaptureKind, DecodeOutcome};
use crate::barcode::BarcodeValue;
use crate::errors::DecodeFailure;

/// Pass-through decoder for typed input
///
/// Leading and trailing whitespace is an input artifact and is trimmed off;
/// whatever remains is the barcode, byte for byte.
#[derive(Debug, Default)]
pub struct ManualEntry;

impl BarcodeDecoder for ManualEntry {
    type Input = String;

    fn kind(&self) -> CaptureKind {
        CaptureKind::Manual
    }

    async fn decode(&mut self, input: String) -> Result<DecodeOutcome, DecodeFailure> {
        match BarcodeValue::new(input.trim()) {
            Some(value) => Ok(DecodeOutcome::Decoded(value)),
            None => Err(DecodeFailure::Empty),
        }
    }
}
