// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for saving fetched photos

use crate::barcode::BarcodeValue;
use crate::config::Config;
use crate::constants::APP_NAME;
use crate::lookup::LookupResultItem;
use std::path::PathBuf;
use tracing::debug;

/// Directory photos for a barcode are saved under
///
/// `~/Pictures/scanview/<barcode>/`, falling back to the current directory
/// when the platform has no pictures dir.
pub fn photo_dir(barcode: &BarcodeValue) -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(sanitize(barcode.as_str()))
}

/// Replace path-hostile characters in a barcode for use as a directory name
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Resolve an item's locator to a fetchable URL
///
/// Direct URLs pass through untouched; opaque ids go through the configured
/// thumbnail template. None when the locator is an id and no template is
/// configured.
pub fn resolve_image_url(config: &Config, item: &LookupResultItem) -> Option<String> {
    let locator = &item.image_locator;
    if locator.starts_with("http://") || locator.starts_with("https://") {
        return Some(locator.clone());
    }
    config
        .thumbnail_url_template
        .as_ref()
        .map(|template| template.replace("{id}", locator))
}

/// Write one fetched photo to disk, returning its path
///
/// Filenames combine the item identifier with a local timestamp, matching
/// how captured photos are usually named.
pub async fn save_photo(
    barcode: &BarcodeValue,
    item: &LookupResultItem,
    bytes: &[u8],
) -> std::io::Result<PathBuf> {
    let dir = photo_dir(barcode);
    tokio::fs::create_dir_all(&dir).await?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("{}_{}.jpg", sanitize(&item.identifier), stamp);
    let path = dir.join(filename);

    tokio::fs::write(&path, bytes).await?;
    debug!(path = %path.display(), "Photo saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_locator(locator: &str) -> LookupResultItem {
        LookupResultItem {
            identifier: "a".to_string(),
            display_name: "a".to_string(),
            image_locator: locator.to_string(),
            captured_at: None,
        }
    }

    #[test]
    fn test_direct_url_passes_through() {
        let config = Config::default();
        let item = item_with_locator("https://photos.example.com/a.jpg");
        assert_eq!(
            resolve_image_url(&config, &item).as_deref(),
            Some("https://photos.example.com/a.jpg")
        );
    }

    #[test]
    fn test_opaque_id_uses_template() {
        let config = Config {
            thumbnail_url_template: Some("https://photos.example.com/thumb/{id}".to_string()),
            ..Config::default()
        };
        let item = item_with_locator("file-123");
        assert_eq!(
            resolve_image_url(&config, &item).as_deref(),
            Some("https://photos.example.com/thumb/file-123")
        );
    }

    #[test]
    fn test_opaque_id_without_template_unresolvable() {
        let config = Config::default();
        let item = item_with_locator("file-123");
        assert_eq!(resolve_image_url(&config, &item), None);
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("AB/12 #x"), "AB_12__x");
        assert_eq!(sanitize("400-638.1"), "400-638.1");
    }
}
