// Common data models for the extraction pipeline

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

use super::errors::ExtractError;

/// User agent sent when the client did not supply one; also used by the browser fallback
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// How long a URL from the structured extractor is expected to stay playable
pub const PRIMARY_TTL_SECONDS: u64 = 3600;
/// Browser-sniffed URLs are trusted for less time
pub const FALLBACK_TTL_SECONDS: u64 = 1800;
/// Provider name reported for browser fallback results. Frontends key on this value.
pub const FALLBACK_PROVIDER: &str = "playwright";
pub const MAX_FALLBACK_SOURCES: usize = 2;

/// Headers forwarded by the calling browser. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHeaders {
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub cookie: Option<String>,
    pub accept_language: Option<String>,
}

impl ClientHeaders {
    pub fn with_user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = Some(value.into());
        self
    }

    pub fn with_referer(mut self, value: impl Into<String>) -> Self {
        self.referer = Some(value.into());
        self
    }

    pub fn with_cookie(mut self, value: impl Into<String>) -> Self {
        self.cookie = Some(value.into());
        self
    }

    pub fn with_accept_language(mut self, value: impl Into<String>) -> Self {
        self.accept_language = Some(value.into());
        self
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A validated extraction request. Lives for one call.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    url: String,
    client: ClientHeaders,
}

impl ExtractionRequest {
    /// Validate the raw URL. Any absolute URL is accepted; there is no host allow-list.
    /// A pasted link without a scheme (`example.com/watch?v=1`) is read as `http://`.
    pub fn parse(raw_url: &str, client: ClientHeaders) -> Result<Self, ExtractError> {
        let raw = raw_url.trim();
        if raw.is_empty() {
            return Err(ExtractError::missing_url());
        }

        let url = match Url::parse(raw) {
            Ok(_) => raw.to_string(),
            Err(ParseError::RelativeUrlWithoutBase) => {
                let prefixed = format!("http://{}", raw);
                Url::parse(&prefixed).map_err(|_| ExtractError::invalid_url())?;
                prefixed
            }
            Err(_) => return Err(ExtractError::invalid_url()),
        };

        Ok(Self { url, client })
    }

    /// The URL as the client sent it (trimmed), with `http://` added when it had no scheme
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn client(&self) -> &ClientHeaders {
        &self.client
    }
}

/// Header set handed to the structured extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedHeaders {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: String,
    pub cookie: Option<String>,
}

impl ForwardedHeaders {
    /// Fill in realistic defaults for anything the client left out.
    /// The target page itself becomes the Referer when none was given.
    pub fn for_request(request: &ExtractionRequest) -> Self {
        let client = request.client();
        Self {
            user_agent: non_empty(&client.user_agent)
                .unwrap_or(DEFAULT_USER_AGENT)
                .to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: non_empty(&client.accept_language)
                .unwrap_or(DEFAULT_ACCEPT_LANGUAGE)
                .to_string(),
            referer: non_empty(&client.referer)
                .unwrap_or(request.url())
                .to_string(),
            cookie: non_empty(&client.cookie).map(str::to_string),
        }
    }

    /// Header name/value pairs in a stable order
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![
            ("User-Agent", self.user_agent.as_str()),
            ("Accept", self.accept.as_str()),
            ("Accept-Language", self.accept_language.as_str()),
            ("Referer", self.referer.as_str()),
        ];
        if let Some(cookie) = &self.cookie {
            pairs.push(("Cookie", cookie.as_str()));
        }
        pairs
    }
}

impl Default for ForwardedHeaders {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            referer: String::new(),
            cookie: None,
        }
    }
}

/// Playable stream transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Hls,
    Mp4,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hls => "hls",
            Self::Mp4 => "mp4",
        }
    }
}

/// One playable source handed back to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSource {
    #[serde(rename = "type")]
    pub kind: StreamKind,
    pub url: String,
}

impl StreamSource {
    pub fn new(kind: StreamKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
        }
    }
}

/// Successful extraction payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMedia {
    pub provider: String,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub sources: Vec<StreamSource>,
    pub ttl_seconds: u64,
}

/// Outward-facing response, tagged by `status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ExtractionResult {
    Ok(ResolvedMedia),
    Error { message: String },
}

impl ExtractionResult {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn failure(err: &ExtractError) -> Self {
        Self::error(err.client_message())
    }

}
