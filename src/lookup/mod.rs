// SPDX-License-Identifier: GPL-3.0-only

//! Remote lookup client
//!
//! Turns a barcode into an HTTP query against the photo service and
//! normalizes whatever JSON shape comes back. The service contract is not
//! stable across deployments, so normalization recognizes a closed set of
//! shapes in a fixed precedence order — see [`normalize`].

pub mod normalize;

use crate::barcode::BarcodeValue;
use crate::config::Config;
use crate::constants;
use crate::errors::{LookupFailure, ScanError, ScanResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// One stored image, as normalized from the service response
///
/// `identifier` is the stable rendering key. `image_locator` is passed
/// through exactly as received: either a fetchable URL or an opaque id that
/// presentation resolves through the configured thumbnail template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResultItem {
    pub identifier: String,
    pub display_name: String,
    pub image_locator: String,
    pub captured_at: Option<DateTime<Utc>>,
}

/// HTTP client for the lookup endpoint
#[derive(Debug, Clone)]
pub struct LookupClient {
    http: reqwest::Client,
    endpoint: String,
    action: Option<String>,
}

impl LookupClient {
    pub fn new(
        endpoint: impl Into<String>,
        action: Option<String>,
        timeout: Duration,
    ) -> ScanResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(constants::USER_AGENT)
            .build()
            .map_err(|e| ScanError::Config(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            action,
        })
    }

    pub fn from_config(config: &Config) -> ScanResult<Self> {
        let endpoint = config.require_endpoint()?;
        Self::new(
            endpoint,
            config.action.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Resolve a barcode to its stored images
    ///
    /// An empty result list is a successful lookup; the caller decides what
    /// "nothing stored" means.
    pub async fn lookup(
        &self,
        barcode: &BarcodeValue,
    ) -> Result<Vec<LookupResultItem>, LookupFailure> {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(2);
        if let Some(action) = &self.action {
            query.push(("action", action));
        }
        query.push(("barcode", barcode.as_str()));

        debug!(barcode = %barcode, endpoint = %self.endpoint, "Looking up barcode");

        let response = self
            .http
            .get(&self.endpoint)
            .query(&query)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupFailure::Transport {
                status: Some(status.as_u16()),
                detail: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(transport_failure)?;
        let parsed: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| LookupFailure::MalformedBody(e.to_string()))?;

        let items = normalize::normalize(parsed)?;
        debug!(barcode = %barcode, count = items.len(), "Lookup complete");
        Ok(items)
    }
}

fn transport_failure(e: reqwest::Error) -> LookupFailure {
    LookupFailure::Transport {
        status: e.status().map(|s| s.as_u16()),
        detail: e.to_string(),
    }
}
