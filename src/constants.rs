// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application name, used for config and photo directories
pub const APP_NAME: &str = "scanview";

/// Config file name inside the application config directory
pub const CONFIG_FILE: &str = "config.json";

/// Default bound on how long a lookup request may take end to end
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Live-stream sampling rate bounds (frames decoded per second)
///
/// Decoding every camera frame wastes CPU without improving detection
/// latency in practice, so the live decoder samples the stream at a bounded
/// rate. Values outside this range are clamped.
pub const MIN_SAMPLE_RATE_HZ: u32 = 5;
pub const MAX_SAMPLE_RATE_HZ: u32 = 15;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 10;

/// User agent sent with lookup requests
pub const USER_AGENT: &str = concat!("scanview/", env!("CARGO_PKG_VERSION"));

/// Convert a requested sampling rate into the delay between decode attempts
///
/// The rate is clamped to [`MIN_SAMPLE_RATE_HZ`]..=[`MAX_SAMPLE_RATE_HZ`].
pub fn sample_interval(rate_hz: u32) -> Duration {
    let clamped = rate_hz.clamp(MIN_SAMPLE_RATE_HZ, MAX_SAMPLE_RATE_HZ);
    Duration::from_millis(1000 / clamped as u64)
}
