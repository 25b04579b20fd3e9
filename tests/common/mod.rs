// SPDX-License-Identifier: GPL-3.0-only

//! Shared fixtures: synthetic barcode images and a one-shot HTTP stub

#![allow(dead_code)]

use image::{GrayImage, Luma};

/// EAN left (L) digit codes, 7 bits each, bar = true
const EAN_L_CODES: [u8; 10] = [
    0b0001101, 0b0011001, 0b0010011, 0b0111101, 0b0100011, 0b0110001, 0b0101111, 0b0111011,
    0b0110111, 0b0001011,
];

/// EAN-13 left-half parity for each leading digit (1 bit = even/G)
const EAN_PARITY: [u8; 10] = [
    0b000000, 0b001011, 0b001101, 0b001110, 0b010011, 0b011001, 0b011100, 0b010101, 0b010110,
    0b011010,
];

fn push_bits(modules: &mut Vec<bool>, bits: u8, count: u8) {
    for i in (0..count).rev() {
        modules.push(bits & (1 << i) != 0);
    }
}

/// Module sequence (quiet zones included) for an EAN-13 code
pub fn ean13_modules(digits: &[u8; 13]) -> Vec<bool> {
    let parity = EAN_PARITY[digits[0] as usize];
    let mut modules = vec![false; 9];

    push_bits(&mut modules, 0b101, 3);
    for (k, &d) in digits[1..7].iter().enumerate() {
        let l = EAN_L_CODES[d as usize];
        let code = if parity & (1 << (5 - k)) != 0 {
            // G = bitwise reverse of the complemented L code
            let r = !l & 0x7f;
            let mut g = 0u8;
            for bit in 0..7 {
                if r & (1 << bit) != 0 {
                    g |= 1 << (6 - bit);
                }
            }
            g
        } else {
            l
        };
        push_bits(&mut modules, code, 7);
    }
    push_bits(&mut modules, 0b01010, 5);
    for &d in &digits[7..13] {
        // R = complement of L
        push_bits(&mut modules, !EAN_L_CODES[d as usize] & 0x7f, 7);
    }
    push_bits(&mut modules, 0b101, 3);

    modules.extend(vec![false; 9]);
    modules
}

/// Module sequence for explicit symbol run widths (bars first, alternating)
pub fn widths_modules(symbols: &[&[u8]]) -> Vec<bool> {
    let mut modules = vec![false; 10];
    for widths in symbols {
        let mut dark = true;
        for &w in *widths {
            for _ in 0..w {
                modules.push(dark);
            }
            dark = !dark;
        }
    }
    modules.extend(vec![false; 10]);
    modules
}

/// Paint modules into a grayscale image, bars black on white
pub fn paint_barcode(modules: &[bool], module_px: u32, height: u32) -> GrayImage {
    let width = modules.len() as u32 * module_px;
    GrayImage::from_fn(width, height, |x, _y| {
        if modules[(x / module_px) as usize] {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

/// Serve exactly one HTTP response on a random local port, returning the URL
pub async fn serve_once(status_line: &'static str, body: String) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/lookup", addr)
}
