// Extractor traits and the types they exchange

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::resolver::errors::ExtractError;
use crate::resolver::models::{ForwardedHeaders, StreamSource};

/// Browser fingerprint the extractor should mimic for a given site handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonationTarget {
    Chrome,
    Edge,
    Safari,
    Firefox,
}

impl fmt::Display for ImpersonationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Edge => write!(f, "edge"),
            Self::Safari => write!(f, "safari"),
            Self::Firefox => write!(f, "firefox"),
        }
    }
}

impl FromStr for ImpersonationTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "edge" => Ok(Self::Edge),
            "safari" => Ok(Self::Safari),
            "firefox" => Ok(Self::Firefox),
            other => Err(format!("unknown impersonation target '{}'", other)),
        }
    }
}

/// Configuration for structured extraction
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Only resolve metadata, never fetch media
    pub skip_download: bool,
    /// Expand playlist pages into their entries
    pub allow_playlist: bool,
    /// Site handler key (e.g. "generic") to impersonation target
    pub site_impersonation_hints: BTreeMap<String, ImpersonationTarget>,
    /// Headers sent with every extractor request
    pub http_headers: ForwardedHeaders,
    /// Per-socket timeout passed to the extractor
    pub socket_timeout_seconds: u32,
    /// Hard ceiling for the whole extractor run
    pub timeout_seconds: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let mut hints = BTreeMap::new();
        hints.insert("generic".to_string(), ImpersonationTarget::Chrome);
        hints.insert("spankbang".to_string(), ImpersonationTarget::Chrome);

        Self {
            skip_download: true,
            allow_playlist: false,
            site_impersonation_hints: hints,
            http_headers: ForwardedHeaders::default(),
            socket_timeout_seconds: 30,
            timeout_seconds: 300,
        }
    }
}

impl ExtractorConfig {
    pub fn with_headers(mut self, headers: ForwardedHeaders) -> Self {
        self.http_headers = headers;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout_seconds = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_impersonation(mut self, site: impl Into<String>, target: ImpersonationTarget) -> Self {
        self.site_impersonation_hints.insert(site.into(), target);
        self
    }
}

/// One format entry as reported by the extractor, before ranking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateFormat {
    /// Direct media URL
    pub url: Option<String>,
    /// Transport protocol (https, m3u8_native, m3u8, http_dash_segments, ...)
    pub protocol: Option<String>,
    /// Container extension (mp4, webm, m4a)
    pub ext: Option<String>,
    /// Video codec; "none" marks audio-only
    pub vcodec: Option<String>,
    /// Audio codec; "none" marks video-only
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub width: Option<u32>,
    /// Total bitrate in kbps
    pub tbr: Option<f64>,
    /// File size in bytes
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    pub filesize_approx: Option<u64>,
}

impl CandidateFormat {
    /// Exact size when known and non-zero, otherwise the approximation
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.filter(|s| *s > 0).or(self.filesize_approx)
    }

    pub fn is_audio_only(&self) -> bool {
        self.vcodec.as_deref() == Some("none")
    }
}

/// Result of a structured extraction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedInfo {
    pub title: Option<String>,
    /// Seconds
    pub duration: Option<f64>,
    /// Site handler that produced the info (e.g. "Youtube", "Generic")
    pub extractor_key: Option<String>,
    pub formats: Vec<CandidateFormat>,
}

/// What the browser fallback found. It never recovers a title.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserCapture {
    pub title: Option<String>,
    pub sources: Vec<StreamSource>,
}

/// Trait for structured (metadata) extractors
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Name of the extractor (for logging)
    fn name(&self) -> &'static str;

    /// Extract metadata and formats for a page URL
    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<ExtractedInfo, ExtractError>;
}

/// Trait for the best-effort browser fallback.
///
/// Implementations swallow every failure and return `None`; callers only ever
/// see the resulting source list.
#[async_trait]
pub trait BrowserExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, url: &str) -> Option<BrowserCapture>;
}
