// SPDX-License-Identifier: GPL-3.0-only

//! Scanline preparation for 1D symbologies
//!
//! The 1D decoders work on run-length encoded horizontal slices of a
//! binarized image: grayscale in, a global Otsu threshold, then alternating
//! dark/light run widths per row.

use image::GrayImage;

/// One run of same-colored pixels along a scanline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// True for dark (bar) pixels
    pub dark: bool,
    /// Width in pixels
    pub len: u32,
}

/// Compute a global binarization threshold with Otsu's method
///
/// Maximizes between-class variance over the gray histogram. Returns 128
/// for degenerate (single-level) images.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u32; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total = gray.len() as f64;
    if total == 0.0 {
        return 128;
    }

    let total_sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &count)| v as f64 * count as f64)
        .sum();

    let mut background_pixels = 0f64;
    let mut background_sum = 0f64;
    let mut best_variance = 0f64;
    let mut best_threshold = 128u8;

    for level in 0..256 {
        background_pixels += histogram[level] as f64;
        background_sum += level as f64 * histogram[level] as f64;
        if background_pixels == 0.0 {
            continue;
        }
        let foreground_pixels = total - background_pixels;
        if foreground_pixels == 0.0 {
            break;
        }

        let background_mean = background_sum / background_pixels;
        let foreground_mean = (total_sum - background_sum) / foreground_pixels;

        let variance = background_pixels * foreground_pixels
            * (background_mean - foreground_mean)
            * (background_mean - foreground_mean);

        if variance > best_variance {
            best_variance = variance;
            // Pixels strictly below the threshold count as dark, so the
            // cut sits one level above the last background level
            best_threshold = (level + 1) as u8;
        }
    }

    best_threshold
}

/// Run-length encode one row of gray pixels against a threshold
pub fn row_runs(row: &[u8], threshold: u8) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut current_dark = match row.first() {
        Some(&p) => p < threshold,
        None => return runs,
    };
    let mut len = 0u32;

    for &pixel in row {
        let dark = pixel < threshold;
        if dark == current_dark {
            len += 1;
        } else {
            runs.push(Run {
                dark: current_dark,
                len,
            });
            current_dark = dark;
            len = 1;
        }
    }
    runs.push(Run {
        dark: current_dark,
        len,
    });
    runs
}

/// Rows to scan, in the deterministic order the decoders try them
///
/// Center first, then progressively off-center slices. Duplicates from
/// rounding on short images are removed while keeping first occurrence.
pub fn scan_rows(height: u32) -> Vec<u32> {
    let fractions = [
        (1, 2),
        (1, 3),
        (2, 3),
        (1, 4),
        (3, 4),
        (1, 5),
        (2, 5),
        (3, 5),
        (4, 5),
    ];
    let mut rows = Vec::with_capacity(fractions.len());
    for (num, den) in fractions {
        let row = (height * num / den).min(height.saturating_sub(1));
        if !rows.contains(&row) {
            rows.push(row);
        }
    }
    rows
}

/// Borrow one row of a grayscale image as a pixel slice
pub fn image_row(gray: &GrayImage, row: u32) -> &[u8] {
    let width = gray.width() as usize;
    let start = row as usize * width;
    &gray.as_raw()[start..start + width]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_otsu_bimodal() {
        let mut pixels = vec![20u8; 100];
        pixels.extend(vec![230u8; 100]);
        let threshold = otsu_threshold(&pixels);
        assert!(threshold > 20 && threshold <= 230);
    }

    #[test]
    fn test_row_runs_alternation() {
        let row = [0, 0, 255, 255, 255, 0];
        let runs = row_runs(&row, 128);
        assert_eq!(
            runs,
            vec![
                Run { dark: true, len: 2 },
                Run {
                    dark: false,
                    len: 3
                },
                Run { dark: true, len: 1 },
            ]
        );
    }

    #[test]
    fn test_scan_rows_center_first() {
        let rows = scan_rows(100);
        assert_eq!(rows[0], 50);
        assert!(rows.iter().all(|&r| r < 100));
    }

    #[test]
    fn test_scan_rows_tiny_image() {
        // All fractions collapse onto the few available rows
        let rows = scan_rows(2);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|&r| r < 2));
    }
}
