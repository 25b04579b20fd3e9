// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for live capture: sampling, exactly-once emission,
//! guaranteed release

mod common;

use scanview::backends::{
    BarcodeDecoder, CancelToken, CaptureKind, CaptureSession, DecodeOutcome, Frame, FrameStream,
    ImageSequenceSource, LiveInput, LiveStreamDecoder, PixelFormat, SessionProbe,
};
use scanview::errors::SessionFailure;
use std::sync::Arc;
use std::time::Instant;

const EAN13_DIGITS: [u8; 13] = [4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 1];

fn barcode_frame() -> Frame {
    let modules = common::ean13_modules(&EAN13_DIGITS);
    let gray = common::paint_barcode(&modules, 3, 60);
    let (width, height) = gray.dimensions();
    Frame {
        width,
        height,
        stride: width,
        format: PixelFormat::Gray8,
        data: gray.into_raw().into(),
        captured_at: Instant::now(),
    }
}

#[tokio::test]
async fn test_live_decoder_emits_exactly_once() {
    let probe = Arc::new(SessionProbe::default());
    // Two decodable frames: the second must never be consumed after success
    let stream: FrameStream =
        Box::pin(futures::stream::iter(vec![barcode_frame(), barcode_frame()]));
    let session =
        CaptureSession::acquire_with_probe(CaptureKind::Live, || Ok(stream), Arc::clone(&probe))
            .unwrap();

    let mut decoder = LiveStreamDecoder::new(10);
    let outcome = decoder
        .decode(LiveInput {
            session,
            cancel: CancelToken::new(),
        })
        .await
        .unwrap();

    match outcome {
        DecodeOutcome::Decoded(value) => assert_eq!(value.as_str(), "4006381333931"),
        other => panic!("expected decode, got {:?}", other),
    }
    assert_eq!(probe.acquired(), 1);
    assert_eq!(probe.released(), 1);
}

#[tokio::test]
async fn test_image_sequence_source_drives_live_decode() {
    let dir = std::env::temp_dir().join(format!("scanview-capture-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let modules = common::ean13_modules(&EAN13_DIGITS);
    let gray = common::paint_barcode(&modules, 3, 60);
    gray.save(dir.join("frame_001.png")).unwrap();

    let source = ImageSequenceSource::open(&dir).unwrap();
    assert_eq!(source.len(), 1);

    let probe = Arc::new(SessionProbe::default());
    let session = CaptureSession::acquire_with_probe(
        CaptureKind::Live,
        || Ok(source.into_stream()),
        Arc::clone(&probe),
    )
    .unwrap();

    let mut decoder = LiveStreamDecoder::new(15);
    let outcome = decoder
        .decode(LiveInput {
            session,
            cancel: CancelToken::new(),
        })
        .await
        .unwrap();

    match outcome {
        DecodeOutcome::Decoded(value) => assert_eq!(value.as_str(), "4006381333931"),
        other => panic!("expected decode, got {:?}", other),
    }
    assert_eq!(probe.released(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_directory_is_device_unavailable() {
    let missing = std::env::temp_dir().join("scanview-no-such-dir-xyzzy");
    assert!(matches!(
        ImageSequenceSource::open(&missing),
        Err(SessionFailure::DeviceUnavailable(_))
    ));
}
