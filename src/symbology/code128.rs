// SPDX-License-Identifier: GPL-3.0-only

//! Code 128 scanline decoding
//!
//! Symbols are eleven modules wide as three bars and three spaces; the stop
//! pattern adds a terminating bar for thirteen modules. The symbol check
//! character is a weighted sum mod 103 over the data symbols.

use super::RowAttempt;
use super::scanline::Run;
use tracing::trace;

/// Symbol patterns as six run widths in modules, indexed by symbol value
const PATTERNS: [[u8; 6]; 106] = [
    [2, 1, 2, 2, 2, 2],
    [2, 2, 2, 1, 2, 2],
    [2, 2, 2, 2, 2, 1],
    [1, 2, 1, 2, 2, 3],
    [1, 2, 1, 3, 2, 2],
    [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3],
    [1, 2, 2, 3, 1, 2],
    [1, 3, 2, 2, 1, 2],
    [2, 2, 1, 2, 1, 3],
    [2, 2, 1, 3, 1, 2],
    [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2],
    [1, 2, 2, 1, 3, 2],
    [1, 2, 2, 2, 3, 1],
    [1, 1, 3, 2, 2, 2],
    [1, 2, 3, 1, 2, 2],
    [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1],
    [2, 2, 1, 1, 3, 2],
    [2, 2, 1, 2, 3, 1],
    [2, 1, 3, 2, 1, 2],
    [2, 2, 3, 1, 1, 2],
    [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2],
    [3, 2, 1, 1, 2, 2],
    [3, 2, 1, 2, 2, 1],
    [3, 1, 2, 2, 1, 2],
    [3, 2, 2, 1, 1, 2],
    [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3],
    [2, 1, 2, 3, 2, 1],
    [2, 3, 2, 1, 2, 1],
    [1, 1, 1, 3, 2, 3],
    [1, 3, 1, 1, 2, 3],
    [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3],
    [1, 3, 2, 1, 1, 3],
    [1, 3, 2, 3, 1, 1],
    [2, 1, 1, 3, 1, 3],
    [2, 3, 1, 1, 1, 3],
    [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3],
    [1, 1, 2, 3, 3, 1],
    [1, 3, 2, 1, 3, 1],
    [1, 1, 3, 1, 2, 3],
    [1, 1, 3, 3, 2, 1],
    [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1],
    [2, 1, 1, 3, 3, 1],
    [2, 3, 1, 1, 3, 1],
    [2, 1, 3, 1, 1, 3],
    [2, 1, 3, 3, 1, 1],
    [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3],
    [3, 1, 1, 3, 2, 1],
    [3, 3, 1, 1, 2, 1],
    [3, 1, 2, 1, 1, 3],
    [3, 1, 2, 3, 1, 1],
    [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1],
    [2, 2, 1, 4, 1, 1],
    [4, 3, 1, 1, 1, 1],
    [1, 1, 1, 2, 2, 4],
    [1, 1, 1, 4, 2, 2],
    [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1],
    [1, 4, 1, 1, 2, 2],
    [1, 4, 1, 2, 2, 1],
    [1, 1, 2, 2, 1, 4],
    [1, 1, 2, 4, 1, 2],
    [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1],
    [1, 4, 2, 1, 1, 2],
    [1, 4, 2, 2, 1, 1],
    [2, 4, 1, 2, 1, 1],
    [2, 2, 1, 1, 1, 4],
    [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2],
    [1, 3, 4, 1, 1, 1],
    [1, 1, 1, 2, 4, 2],
    [1, 2, 1, 1, 4, 2],
    [1, 2, 1, 2, 4, 1],
    [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2],
    [1, 2, 4, 2, 1, 1],
    [4, 1, 1, 2, 1, 2],
    [4, 2, 1, 1, 1, 2],
    [4, 2, 1, 2, 1, 1],
    [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1],
    [4, 1, 2, 1, 2, 1],
    [1, 1, 1, 1, 4, 3],
    [1, 1, 1, 3, 4, 1],
    [1, 3, 1, 1, 4, 1],
    [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1],
    [4, 1, 1, 1, 1, 3],
    [4, 1, 1, 3, 1, 1],
    [1, 1, 3, 1, 4, 1],
    [1, 1, 4, 1, 3, 1],
    [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1],
    [2, 1, 1, 4, 1, 2],
    [2, 1, 1, 2, 1, 4],
    [2, 1, 1, 2, 3, 2],
];

/// Stop pattern as seven run widths (thirteen modules)
const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

const START_A: u8 = 103;
const START_B: u8 = 104;
const START_C: u8 = 105;

/// Largest accepted total deviation, in modules, when matching one symbol
const MAX_SYMBOL_ERROR: f32 = 1.2;

/// Hard cap on symbols per row, to bound scanning of noise
const MAX_SYMBOLS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Try to decode one scanline as Code 128
pub(crate) fn decode_row(runs: &[Run]) -> RowAttempt {
    let mut located = false;

    for start in 0..runs.len() {
        if !runs[start].dark || start + 6 > runs.len() {
            continue;
        }

        let Some(start_value) = match_symbol(&runs[start..start + 6]) else {
            continue;
        };
        if !(START_A..=START_C).contains(&start_value) {
            continue;
        }

        let total: u32 = runs[start..start + 6].iter().map(|r| r.len).sum();
        let module = total as f32 / 11.0;
        if start > 0 && (runs[start - 1].len as f32) < 2.0 * module {
            continue;
        }

        located = true;
        match walk_symbols(runs, start, start_value) {
            Some(values) => {
                if let Some(text) = validate_and_translate(&values)
                    && !text.is_empty()
                {
                    return RowAttempt::Decoded(text);
                }
                trace!("Code 128 candidate failed check character or translation");
            }
            None => trace!("Code 128 start symbol without a stop pattern"),
        }
    }

    if located {
        RowAttempt::Located
    } else {
        RowAttempt::Nothing
    }
}

/// Collect symbol values from a start symbol up to the stop pattern
fn walk_symbols(runs: &[Run], start: usize, start_value: u8) -> Option<Vec<u8>> {
    let mut values = vec![start_value];
    let mut pos = start + 6;

    loop {
        if pos + 7 <= runs.len() && is_stop(&runs[pos..pos + 7]) {
            return Some(values);
        }
        if pos + 6 > runs.len() || values.len() > MAX_SYMBOLS {
            return None;
        }
        values.push(match_symbol(&runs[pos..pos + 6])?);
        pos += 6;
    }
}

/// Verify the check character, then translate data symbols to text
fn validate_and_translate(values: &[u8]) -> Option<String> {
    // Start, at least a check character, and the stop already consumed
    if values.len() < 2 {
        return None;
    }
    let check = values[values.len() - 1];
    let data = &values[1..values.len() - 1];

    let mut sum = values[0] as u32;
    for (i, &v) in data.iter().enumerate() {
        sum += v as u32 * (i as u32 + 1);
    }
    if (sum % 103) as u8 != check {
        return None;
    }

    translate(values[0], data)
}

fn translate(start: u8, data: &[u8]) -> Option<String> {
    let mut set = match start {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };
    let mut shift: Option<CodeSet> = None;
    let mut out = String::new();

    for &v in data {
        let active = shift.take().unwrap_or(set);
        match active {
            CodeSet::C => match v {
                0..=99 => {
                    out.push((b'0' + v / 10) as char);
                    out.push((b'0' + v % 10) as char);
                }
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => {} // FNC1
                _ => return None,
            },
            CodeSet::B => match v {
                0..=95 => out.push((32 + v) as char),
                96 | 97 | 100 | 102 => {} // FNC3/FNC2/FNC4/FNC1
                98 => shift = Some(CodeSet::A),
                99 => set = CodeSet::C,
                101 => set = CodeSet::A,
                _ => return None,
            },
            CodeSet::A => match v {
                0..=63 => out.push((32 + v) as char),
                64..=95 => out.push((v - 64) as char),
                96 | 97 | 101 | 102 => {} // FNC3/FNC2/FNC4/FNC1
                98 => shift = Some(CodeSet::B),
                99 => set = CodeSet::C,
                100 => set = CodeSet::B,
                _ => return None,
            },
        }
    }

    Some(out)
}

/// Match six runs against the symbol table by minimal width deviation
fn match_symbol(group: &[Run]) -> Option<u8> {
    let total: u32 = group.iter().map(|r| r.len).sum();
    if total == 0 {
        return None;
    }
    let norm: Vec<f32> = group
        .iter()
        .map(|r| r.len as f32 * 11.0 / total as f32)
        .collect();

    let mut best: Option<(f32, u8)> = None;
    for (value, pattern) in PATTERNS.iter().enumerate() {
        let err: f32 = norm
            .iter()
            .zip(pattern.iter())
            .map(|(n, &p)| (n - p as f32).abs())
            .sum();
        if best.is_none_or(|(best_err, _)| err < best_err) {
            best = Some((err, value as u8));
        }
    }

    match best {
        Some((err, value)) if err <= MAX_SYMBOL_ERROR => Some(value),
        _ => None,
    }
}

fn is_stop(group: &[Run]) -> bool {
    if !group[0].dark {
        return false;
    }
    let total: u32 = group.iter().map(|r| r.len).sum();
    if total == 0 {
        return false;
    }
    let err: f32 = group
        .iter()
        .zip(STOP_PATTERN.iter())
        .map(|(r, &p)| (r.len as f32 * 13.0 / total as f32 - p as f32).abs())
        .sum();
    err <= 1.5
}
