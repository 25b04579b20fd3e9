// SPDX-License-Identifier: GPL-3.0-only

//! EAN-13 / EAN-8 scanline decoding
//!
//! Both symbologies share the same structure: a 1-1-1 start guard, digit
//! groups of four runs (seven modules each), a 1-1-1-1-1 center guard, more
//! digit groups, and a 1-1-1 end guard. EAN-13 additionally encodes its
//! leading digit in the left-half parity pattern.

use super::RowAttempt;
use super::scanline::Run;
use tracing::trace;

/// Left (odd parity) digit patterns as four run widths in modules.
/// Right patterns have identical widths starting on a bar; even-parity (G)
/// patterns are these reversed.
const L_PATTERNS: [[u8; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// EAN-13 leading digit from the parity of the six left digits
/// (bit 5 = first left digit; 0 = odd/L, 1 = even/G)
const FIRST_DIGIT_PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110,
    0b011010,
];

/// Largest accepted total deviation, in modules, when matching one digit
const MAX_DIGIT_ERROR: f32 = 1.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Parity {
    Odd,
    Even,
}

#[derive(Debug, Clone, Copy)]
struct DigitMatch {
    digit: u8,
    parity: Parity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EanVariant {
    Ean13,
    Ean8,
}

impl EanVariant {
    fn digits_per_side(self) -> usize {
        match self {
            EanVariant::Ean13 => 6,
            EanVariant::Ean8 => 4,
        }
    }

    /// Runs spanned by a full symbol: guards plus four runs per digit
    fn run_count(self) -> usize {
        3 + 4 * self.digits_per_side() + 5 + 4 * self.digits_per_side() + 3
    }

    /// Total symbol width in modules
    fn module_count(self) -> u32 {
        11 + 14 * self.digits_per_side() as u32
    }
}

/// Try to decode one scanline as the given EAN variant
pub(crate) fn decode_row(runs: &[Run], variant: EanVariant) -> RowAttempt {
    let run_count = variant.run_count();
    let mut located = false;

    for start in 0..runs.len() {
        if !runs[start].dark || start + run_count > runs.len() {
            continue;
        }
        let span = &runs[start..start + run_count];

        let Some(module) = symbol_module(span, start, runs, variant) else {
            continue;
        };

        match decode_span(span, module, variant) {
            Some(digits) => {
                if checksum_ok(&digits) {
                    let text: String = digits.iter().map(|d| (b'0' + d) as char).collect();
                    return RowAttempt::Decoded(text);
                }
                trace!(variant = ?variant, "EAN candidate failed checksum");
                located = true;
            }
            // A plausible guard structure that does not parse as digits is
            // still a located symbol for NotFound/Unreadable purposes only
            // when the guards all matched
            None => {
                if guards_ok(span, module, variant) {
                    located = true;
                }
            }
        }
    }

    if located {
        RowAttempt::Located
    } else {
        RowAttempt::Nothing
    }
}

/// Estimate the module width for a candidate span, validating the start
/// guard proportions and the leading quiet zone
fn symbol_module(span: &[Run], start: usize, runs: &[Run], variant: EanVariant) -> Option<f32> {
    let guard_total: u32 = span[..3].iter().map(|r| r.len).sum();
    let guard_module = guard_total as f32 / 3.0;
    let (min, max) = span[..3]
        .iter()
        .fold((u32::MAX, 0), |(lo, hi), r| (lo.min(r.len), hi.max(r.len)));
    if min == 0 || max as f32 / min as f32 > 1.7 {
        return None;
    }

    // Quiet zone: either the row starts at the guard (cropped image) or a
    // light run of at least two modules precedes it
    if start > 0 && (runs[start - 1].len as f32) < 2.0 * guard_module {
        return None;
    }

    let span_total: u32 = span.iter().map(|r| r.len).sum();
    let module = span_total as f32 / variant.module_count() as f32;

    // The start guard and the whole-symbol estimates must agree
    if !(0.5..=2.0).contains(&(guard_module / module)) {
        return None;
    }

    Some(module)
}

fn guards_ok(span: &[Run], module: f32, variant: EanVariant) -> bool {
    let per_side = variant.digits_per_side();
    let center = 3 + 4 * per_side;
    let end = center + 5 + 4 * per_side;

    let one_module = |r: &Run| {
        let m = r.len as f32 / module;
        (0.4..=1.9).contains(&m)
    };

    span[..3].iter().all(one_module)
        && span[center..center + 5].iter().all(one_module)
        && span[end..end + 3].iter().all(one_module)
}

fn decode_span(span: &[Run], module: f32, variant: EanVariant) -> Option<Vec<u8>> {
    if !guards_ok(span, module, variant) {
        return None;
    }

    let per_side = variant.digits_per_side();
    let allow_even = variant == EanVariant::Ean13;
    let mut digits = Vec::with_capacity(1 + 2 * per_side);
    let mut parity_mask = 0u8;

    // Left half: groups of four runs starting on a space
    for k in 0..per_side {
        let group = &span[3 + 4 * k..3 + 4 * k + 4];
        let matched = match_digit(group, allow_even)?;
        if matched.parity == Parity::Even {
            parity_mask |= 1 << (per_side - 1 - k);
        }
        digits.push(matched.digit);
    }

    match variant {
        EanVariant::Ean13 => {
            let leading = FIRST_DIGIT_PARITY
                .iter()
                .position(|&mask| mask == parity_mask)? as u8;
            digits.insert(0, leading);
        }
        // EAN-8 left digits are all odd parity
        EanVariant::Ean8 => {
            if parity_mask != 0 {
                return None;
            }
        }
    }

    // Right half: same widths as the odd-parity set, starting on a bar
    let right_base = 3 + 4 * per_side + 5;
    for k in 0..per_side {
        let group = &span[right_base + 4 * k..right_base + 4 * k + 4];
        let matched = match_digit(group, false)?;
        digits.push(matched.digit);
    }

    Some(digits)
}

/// Match four runs against the digit patterns by minimal width deviation
fn match_digit(group: &[Run], allow_even: bool) -> Option<DigitMatch> {
    let total: u32 = group.iter().map(|r| r.len).sum();
    if total == 0 {
        return None;
    }
    let norm: Vec<f32> = group.iter().map(|r| r.len as f32 * 7.0 / total as f32).collect();

    let mut best: Option<(f32, DigitMatch)> = None;
    for (digit, pattern) in L_PATTERNS.iter().enumerate() {
        let odd_err: f32 = norm
            .iter()
            .zip(pattern.iter())
            .map(|(n, &p)| (n - p as f32).abs())
            .sum();
        consider(&mut best, odd_err, digit as u8, Parity::Odd);

        if allow_even {
            let even_err: f32 = norm
                .iter()
                .zip(pattern.iter().rev())
                .map(|(n, &p)| (n - p as f32).abs())
                .sum();
            consider(&mut best, even_err, digit as u8, Parity::Even);
        }
    }

    match best {
        Some((err, matched)) if err <= MAX_DIGIT_ERROR => Some(matched),
        _ => None,
    }
}

fn consider(best: &mut Option<(f32, DigitMatch)>, err: f32, digit: u8, parity: Parity) {
    match best {
        Some((best_err, _)) if *best_err <= err => {}
        _ => *best = Some((err, DigitMatch { digit, parity })),
    }
}

/// EAN checksum: weights 1 and 3 alternating from the rightmost digit
fn checksum_ok(digits: &[u8]) -> bool {
    let sum: u32 = digits
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| d as u32 * if i % 2 == 1 { 3 } else { 1 })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render digits into runs the way a printer would, for decoder tests
    fn encode_ean13(digits: &[u8; 13]) -> Vec<Run> {
        let parity = FIRST_DIGIT_PARITY[digits[0] as usize];
        let mut runs = vec![Run {
            dark: false,
            len: 30,
        }];
        push_guard(&mut runs, &[1, 1, 1]);
        for (k, &d) in digits[1..7].iter().enumerate() {
            let mut widths = L_PATTERNS[d as usize];
            if parity & (1 << (5 - k)) != 0 {
                widths.reverse();
            }
            push_digit(&mut runs, &widths, false);
        }
        push_guard_light_first(&mut runs, &[1, 1, 1, 1, 1]);
        for &d in &digits[7..13] {
            push_digit(&mut runs, &L_PATTERNS[d as usize], true);
        }
        push_guard(&mut runs, &[1, 1, 1]);
        runs.push(Run {
            dark: false,
            len: 30,
        });
        runs
    }

    fn encode_ean8(digits: &[u8; 8]) -> Vec<Run> {
        let mut runs = vec![Run {
            dark: false,
            len: 30,
        }];
        push_guard(&mut runs, &[1, 1, 1]);
        for &d in &digits[0..4] {
            push_digit(&mut runs, &L_PATTERNS[d as usize], false);
        }
        push_guard_light_first(&mut runs, &[1, 1, 1, 1, 1]);
        for &d in &digits[4..8] {
            push_digit(&mut runs, &L_PATTERNS[d as usize], true);
        }
        push_guard(&mut runs, &[1, 1, 1]);
        runs.push(Run {
            dark: false,
            len: 30,
        });
        runs
    }

    /// Guard starting with a bar (start/end guards)
    fn push_guard(runs: &mut Vec<Run>, widths: &[u8]) {
        let mut dark = true;
        for &w in widths {
            runs.push(Run {
                dark,
                len: w as u32 * 3,
            });
            dark = !dark;
        }
    }

    /// Guard starting with a space (center guard)
    fn push_guard_light_first(runs: &mut Vec<Run>, widths: &[u8]) {
        let mut dark = false;
        for &w in widths {
            runs.push(Run {
                dark,
                len: w as u32 * 3,
            });
            dark = !dark;
        }
    }

    fn push_digit(runs: &mut Vec<Run>, widths: &[u8; 4], starts_dark: bool) {
        let mut dark = starts_dark;
        for &w in widths {
            runs.push(Run {
                dark,
                len: w as u32 * 3,
            });
            dark = !dark;
        }
    }

    #[test]
    fn test_decode_ean13() {
        let runs = encode_ean13(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 1]);
        match decode_row(&runs, EanVariant::Ean13) {
            RowAttempt::Decoded(text) => assert_eq!(text, "4006381333931"),
            other => panic!("expected decode, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ean8() {
        let runs = encode_ean8(&[9, 6, 3, 8, 5, 0, 7, 4]);
        match decode_row(&runs, EanVariant::Ean8) {
            RowAttempt::Decoded(text) => assert_eq!(text, "96385074"),
            other => panic!("expected decode, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_checksum_is_located_not_decoded() {
        // Last digit tampered: structure parses, checksum fails
        let runs = encode_ean13(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 2]);
        assert_eq!(decode_row(&runs, EanVariant::Ean13), RowAttempt::Located);
    }

    #[test]
    fn test_blank_row_is_nothing() {
        let runs = vec![Run {
            dark: false,
            len: 500,
        }];
        assert_eq!(decode_row(&runs, EanVariant::Ean13), RowAttempt::Nothing);
    }

    #[test]
    fn test_checksum() {
        assert!(checksum_ok(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 1]));
        assert!(!checksum_ok(&[4, 0, 0, 6, 3, 8, 1, 3, 3, 3, 9, 3, 2]));
        assert!(checksum_ok(&[9, 6, 3, 8, 5, 0, 7, 4]));
    }
}
