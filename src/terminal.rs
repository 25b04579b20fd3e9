// SPDX-License-Identifier: GPL-3.0-only

//! Terminal-based photo browser
//!
//! Looks up a barcode, then renders the stored photos in the terminal using
//! Unicode half-block characters for improved vertical resolution. Photos
//! are fetched on demand as the selection moves.

use crate::config::Config;
use crate::lookup::{LookupClient, LookupResultItem};
use crate::pipeline::{Pipeline, PipelineState};
use crate::storage;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal, backend::CrosstermBackend, buffer::Buffer, layout::Rect, style::Color,
    style::Modifier, style::Style, widgets::Widget,
};
use std::collections::HashMap;
use std::io::{self, stdout};
use std::time::Duration;
use tracing::{debug, warn};

/// Look up the barcode and browse its photos interactively
pub fn run(config: Config, barcode: String) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;

    let client = LookupClient::from_config(&config)?;
    let mut pipeline = Pipeline::new(client);
    rt.block_on(pipeline.run_manual(&barcode));

    let items = match pipeline.state() {
        PipelineState::Ready(items) => items.clone(),
        PipelineState::Empty(barcode) => {
            println!("No photos stored for barcode {}", barcode);
            return Ok(());
        }
        PipelineState::Failed { message, .. } => return Err(message.clone().into()),
        other => return Err(format!("pipeline ended in unexpected state: {:?}", other).into()),
    };

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let result = run_app(&mut terminal, &rt, &config, &items);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// A fetched photo decoded to packed RGB for cell rendering
struct Photo {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rt: &tokio::runtime::Runtime,
    config: &Config,
    items: &[LookupResultItem],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut selected = 0usize;
    // None = fetch failed; absent = not fetched yet
    let mut photos: HashMap<usize, Option<Photo>> = HashMap::new();
    let mut status_message = String::from("↑/↓ select | 'o' open in browser | 'q' quit");

    loop {
        // Fetch the selected photo on first visit
        if !photos.contains_key(&selected) {
            let fetched = fetch_photo(rt, config, &items[selected]);
            if fetched.is_none() {
                status_message = format!("Could not load photo {}", items[selected].identifier);
            }
            photos.insert(selected, fetched);
        }

        terminal.draw(|f| {
            let area = f.area();

            // Left column lists the photos, the rest shows the selection
            let list_width = (area.width / 3).clamp(24, 44).min(area.width);
            let list_area = Rect {
                x: area.x,
                y: area.y,
                width: list_width,
                height: area.height.saturating_sub(1),
            };
            let photo_area = Rect {
                x: area.x + list_width,
                y: area.y,
                width: area.width.saturating_sub(list_width),
                height: area.height.saturating_sub(1),
            };
            let status_area = Rect {
                x: area.x,
                y: area.height.saturating_sub(1),
                width: area.width,
                height: 1,
            };

            f.render_widget(
                ItemList {
                    items,
                    selected,
                },
                list_area,
            );
            f.render_widget(
                PhotoPane {
                    photo: photos.get(&selected).and_then(|p| p.as_ref()),
                },
                photo_area,
            );
            f.render_widget(
                StatusBar {
                    message: &status_message,
                },
                status_area,
            );
        })?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            // Ctrl+C to quit
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                break;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Up | KeyCode::Char('k') => {
                    selected = selected.saturating_sub(1);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if selected + 1 < items.len() {
                        selected += 1;
                    }
                }
                KeyCode::Char('o') => {
                    match storage::resolve_image_url(config, &items[selected]) {
                        Some(url) => {
                            if let Err(e) = open::that(&url) {
                                warn!(error = %e, "Failed to open browser");
                                status_message = format!("Could not open browser: {}", e);
                            } else {
                                status_message = format!("Opened {}", url);
                            }
                        }
                        None => {
                            status_message =
                                "Selected photo has no resolvable URL".to_string();
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Fetch and decode one photo; None on any failure
fn fetch_photo(
    rt: &tokio::runtime::Runtime,
    config: &Config,
    item: &LookupResultItem,
) -> Option<Photo> {
    let url = storage::resolve_image_url(config, item)?;

    let bytes = rt.block_on(async {
        let response = reqwest::get(&url).await.ok()?.error_for_status().ok()?;
        response.bytes().await.ok()
    })?;

    let image = image::load_from_memory(&bytes)
        .map_err(|e| {
            debug!(url = %url, error = %e, "Photo bytes did not decode");
            e
        })
        .ok()?;

    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    Some(Photo {
        width,
        height,
        rgb: rgb.into_raw(),
    })
}

/// Photo list with the current selection highlighted
struct ItemList<'a> {
    items: &'a [LookupResultItem],
    selected: usize,
}

impl Widget for ItemList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for (index, item) in self.items.iter().enumerate() {
            let y = area.y + index as u16;
            if y >= area.y + area.height {
                break;
            }

            let when = item
                .captured_at
                .map(|t| {
                    t.with_timezone(&chrono::Local)
                        .format(" %Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_default();
            let line = format!("{}{}", item.display_name, when);
            let line = truncated(&line, area.width as usize);

            let style = if index == self.selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            buf.set_string(area.x, y, line, style);
        }
    }
}

/// Renders a photo using half-block characters
///
/// Each terminal cell shows two vertical pixels: the upper half ('▀')
/// colored with the foreground, the lower with the background.
struct PhotoPane<'a> {
    photo: Option<&'a Photo>,
}

impl Widget for PhotoPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(photo) = self.photo else {
            let msg = "No preview available";
            let x = area.x + (area.width.saturating_sub(msg.len() as u16)) / 2;
            let y = area.y + area.height / 2;
            if y < area.y + area.height && x < area.x + area.width {
                buf.set_string(x, y, msg, Style::default());
            }
            return;
        };

        if photo.width == 0 || photo.height == 0 || area.width == 0 || area.height == 0 {
            return;
        }

        // Fit maintaining aspect ratio; cells are two pixels tall
        let photo_aspect = photo.width as f64 / photo.height as f64;
        let term_width = area.width as f64;
        let term_height = (area.height * 2) as f64;

        let (display_width, display_height) = if term_width / term_height > photo_aspect {
            let h = term_height;
            let w = h * photo_aspect;
            (w as u16, (h / 2.0) as u16)
        } else {
            let w = term_width;
            let h = w / photo_aspect;
            (w as u16, (h / 2.0) as u16)
        };

        let x_offset = area.x + (area.width.saturating_sub(display_width)) / 2;
        let y_offset = area.y + (area.height.saturating_sub(display_height)) / 2;

        let x_scale = photo.width as f64 / display_width.max(1) as f64;
        let y_scale = photo.height as f64 / (display_height.max(1) * 2) as f64;

        for ty in 0..display_height {
            for tx in 0..display_width {
                let term_x = x_offset + tx;
                let term_y = y_offset + ty;
                if term_x >= area.x + area.width || term_y >= area.y + area.height {
                    continue;
                }

                let src_x = (tx as f64 * x_scale) as u32;
                let src_y_top = (ty as f64 * 2.0 * y_scale) as u32;
                let src_y_bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                let top = sample_pixel(photo, src_x, src_y_top);
                let bottom = sample_pixel(photo, src_x, src_y_bottom);

                if let Some(cell) = buf.cell_mut((term_x, term_y)) {
                    cell.set_char('▀');
                    cell.set_fg(top);
                    cell.set_bg(bottom);
                }
            }
        }
    }
}

fn sample_pixel(photo: &Photo, x: u32, y: u32) -> Color {
    let x = x.min(photo.width - 1);
    let y = y.min(photo.height - 1);
    let idx = ((y * photo.width + x) * 3) as usize;
    if idx + 2 < photo.rgb.len() {
        Color::Rgb(photo.rgb[idx], photo.rgb[idx + 1], photo.rgb[idx + 2])
    } else {
        Color::Black
    }
}

fn truncated(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        text.chars().take(width).collect()
    } else {
        text.to_string()
    }
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Fill background
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }

        let text = truncated(self.message, area.width as usize);
        buf.set_string(
            area.x,
            area.y,
            text,
            Style::default().fg(Color::White).bg(Color::DarkGray),
        );
    }
}
