// SPDX-License-Identifier: GPL-3.0-only

//! QR decoding via rqrr

use super::RowAttempt;
use image::GrayImage;
use tracing::debug;

/// Detect and decode the first readable QR code in the image
///
/// Grids are taken in rqrr's own enumeration order; the first grid that
/// decodes cleanly wins. A grid that is detected but fails to decode counts
/// as a located-but-unreadable symbol.
pub(crate) fn decode(gray: &GrayImage) -> RowAttempt {
    let mut prepared = rqrr::PreparedImage::prepare(gray.clone());
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return RowAttempt::Nothing;
    }

    for grid in &grids {
        match grid.decode() {
            Ok((_meta, content)) if !content.is_empty() => {
                return RowAttempt::Decoded(content);
            }
            Ok(_) => debug!("QR grid decoded to empty content"),
            Err(e) => debug!(error = %e, "QR grid failed to decode"),
        }
    }

    RowAttempt::Located
}
