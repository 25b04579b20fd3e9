// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for capture backends
//!
//! Live capture is abstracted as a stream of [`Frame`] values. Real camera
//! integration lives outside this crate; anything that can produce frames
//! (a camera wrapper, a test fixture, the bundled [`ImageSequenceSource`])
//! plugs into the live decoder the same way.

use futures::Stream;
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::errors::SessionFailure;

/// Pixel layout of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, 4 bytes per pixel
    Rgba,
    /// 8-bit RGB, 3 bytes per pixel
    Rgb,
    /// 8-bit grayscale, 1 byte per pixel
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Rgba => 4,
            PixelFormat::Rgb => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One frame sampled from a live source
///
/// Rows may carry stride padding beyond `width * bytes_per_pixel`; the data
/// is shared so frames can be handed to a blocking decode task without
/// copying.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row including any padding
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl Frame {
    /// Build a tightly packed RGB frame from a decoded image
    pub fn from_image(image: &image::DynamicImage) -> Self {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self {
            width,
            height,
            stride: width * 3,
            format: PixelFormat::Rgb,
            data: rgb.into_raw().into(),
            captured_at: Instant::now(),
        }
    }

    /// Convert to a grayscale image, dropping stride padding
    ///
    /// Luma uses the integer BT.601 weights (76r + 150g + 29b) >> 8.
    pub fn to_gray(&self) -> GrayImage {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;
        let bpp = self.format.bytes_per_pixel() as usize;

        let mut gray = Vec::with_capacity(width * height);
        for y in 0..height {
            let row_start = y * stride;
            for x in 0..width {
                let idx = row_start + x * bpp;
                let luma = match self.format {
                    PixelFormat::Gray8 => self.data.get(idx).copied().unwrap_or(0),
                    PixelFormat::Rgb | PixelFormat::Rgba => {
                        let r = self.data.get(idx).copied().unwrap_or(0) as u32;
                        let g = self.data.get(idx + 1).copied().unwrap_or(0) as u32;
                        let b = self.data.get(idx + 2).copied().unwrap_or(0) as u32;
                        ((76 * r + 150 * g + 29 * b) >> 8) as u8
                    }
                };
                gray.push(luma);
            }
        }

        GrayImage::from_raw(self.width, self.height, gray)
            .expect("buffer sized to width * height")
    }
}

/// Boxed stream of frames — the opaque live capture source
pub type FrameStream = Pin<Box<dyn Stream<Item = Frame> + Send>>;

/// Replays a directory of image files as a frame stream
///
/// Stands in for a camera when scripting or testing: files are sorted by
/// name and yielded in order, each decoded off the async runtime. Files
/// that fail to read or decode are skipped with a diagnostic.
pub struct ImageSequenceSource {
    frames: Vec<PathBuf>,
}

impl ImageSequenceSource {
    const EXTENSIONS: [&'static str; 4] = ["jpg", "jpeg", "png", "bmp"];

    /// Scan a directory for image files
    pub fn open(dir: &Path) -> Result<Self, SessionFailure> {
        let entries = std::fs::read_dir(dir).map_err(SessionFailure::from)?;

        let mut frames: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .map(|ext| {
                        Self::EXTENSIONS
                            .iter()
                            .any(|known| ext.eq_ignore_ascii_case(known))
                    })
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();

        debug!(dir = %dir.display(), count = frames.len(), "Opened image sequence");
        Ok(Self { frames })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Consume the source into a frame stream
    pub fn into_stream(self) -> FrameStream {
        Box::pin(async_stream::stream! {
            for path in self.frames {
                let bytes = match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Skipping unreadable file");
                        continue;
                    }
                };
                let decoded = tokio::task::spawn_blocking(move || {
                    image::load_from_memory(&bytes)
                })
                .await;
                match decoded {
                    Ok(Ok(image)) => yield Frame::from_image(&image),
                    Ok(Err(e)) => {
                        warn!(path = %path.display(), error = %e, "Skipping undecodable file");
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Image decode task failed");
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_gray_drops_stride_padding() {
        // 2x2 RGB with 2 bytes of padding per row
        let data: Vec<u8> = vec![
            255, 255, 255, 0, 0, 0, 9, 9, // row 0: white, black, padding
            0, 0, 0, 255, 255, 255, 9, 9, // row 1: black, white, padding
        ];
        let frame = Frame {
            width: 2,
            height: 2,
            stride: 8,
            format: PixelFormat::Rgb,
            data: Arc::from(data.as_slice()),
            captured_at: Instant::now(),
        };

        let gray = frame.to_gray();
        assert_eq!(gray.dimensions(), (2, 2));
        assert!(gray.get_pixel(0, 0)[0] > 200);
        assert_eq!(gray.get_pixel(1, 0)[0], 0);
        assert_eq!(gray.get_pixel(0, 1)[0], 0);
        assert!(gray.get_pixel(1, 1)[0] > 200);
    }

    #[test]
    fn test_gray8_passthrough() {
        let data: Vec<u8> = vec![10, 20, 30, 40];
        let frame = Frame {
            width: 2,
            height: 2,
            stride: 2,
            format: PixelFormat::Gray8,
            data: Arc::from(data.as_slice()),
            captured_at: Instant::now(),
        };
        let gray = frame.to_gray();
        assert_eq!(gray.as_raw(), &vec![10, 20, 30, 40]);
    }
}
