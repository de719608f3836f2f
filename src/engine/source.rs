//! Media source selection
//!
//! Picks the delivery strategy for a URL and bundles it with the HTTP data
//! source settings the engine should use to fetch it.

use crate::utils::config::NetworkConfig;
use std::time::Duration;

const HLS_MARKERS: [&str; 2] = [".m3u8", "hls"];
const DASH_MARKERS: [&str; 2] = [".mpd", "dash"];

/// Delivery family of a media URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Segmented playlist streaming (HLS)
    Hls,

    /// Manifest-based adaptive streaming (DASH)
    Dash,

    /// Single-file resource (MP4 and friends)
    Progressive,
}

impl StreamKind {
    /// Classify a URL by the markers it contains.
    ///
    /// Families are tried in a fixed order, HLS first, then DASH, and the
    /// whole URL is searched for each one before moving on. Position of a
    /// marker inside the string does not matter.
    pub fn classify(url: &str) -> Self {
        let lowered = url.to_lowercase();

        if HLS_MARKERS.iter().any(|m| lowered.contains(m)) {
            StreamKind::Hls
        } else if DASH_MARKERS.iter().any(|m| lowered.contains(m)) {
            StreamKind::Dash
        } else {
            StreamKind::Progressive
        }
    }

    pub fn is_adaptive(self) -> bool {
        !matches!(self, StreamKind::Progressive)
    }
}

/// HTTP settings for the engine's data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub allow_cross_protocol_redirects: bool,
}

impl From<&NetworkConfig> for HttpSettings {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            read_timeout: Duration::from_millis(config.read_timeout_ms),
            allow_cross_protocol_redirects: config.allow_cross_protocol_redirects,
        }
    }
}

/// Everything the engine needs to open a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub url: String,
    pub kind: StreamKind,
    pub http: HttpSettings,
}

impl SourceDescriptor {
    pub fn for_url(url: &str, network: &NetworkConfig) -> Self {
        Self {
            url: url.to_string(),
            kind: StreamKind::classify(url),
            http: HttpSettings::from(network),
        }
    }
}
