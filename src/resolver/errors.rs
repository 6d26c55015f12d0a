// Error types for the extraction pipeline

use thiserror::Error;

pub const MISSING_URL: &str = "Missing URL";
pub const INVALID_URL: &str = "Invalid URL";
pub const NO_PLAYABLE_SOURCES: &str = "No playable sources found";
pub const EXTRACTION_FAILED: &str = "Extraction failed";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// Missing or unparseable URL; never reaches an extractor
    #[error("{0}")]
    InvalidInput(String),

    /// The extractor explicitly gave up on the URL (blocked, unsupported, geo/DRM).
    /// Carries the extractor's own message, which is shown to the client.
    #[error("{0}")]
    ExtractionFailed(String),

    /// Extraction worked but no format survived filtering
    #[error("No playable sources found")]
    NoPlayableSource,

    /// Anything else (spawn failure, timeout, bad JSON). The detail is only logged.
    #[error("Unexpected extraction error: {0}")]
    Unexpected(String),
}

impl ExtractError {
    pub fn missing_url() -> Self {
        Self::InvalidInput(MISSING_URL.to_string())
    }

    pub fn invalid_url() -> Self {
        Self::InvalidInput(INVALID_URL.to_string())
    }

    /// Message that is safe to put into a response body
    pub fn client_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) | Self::ExtractionFailed(msg) => msg.clone(),
            Self::NoPlayableSource => NO_PLAYABLE_SOURCES.to_string(),
            Self::Unexpected(_) => EXTRACTION_FAILED.to_string(),
        }
    }

    /// Classify a failed extractor run from its stderr.
    ///
    /// yt-dlp prints `ERROR: ...` when an extractor rejects the URL; from that line
    /// to the end of stderr is the recognized failure, continuation lines included.
    /// Everything else is treated as unexpected.
    pub fn from_stderr(stderr: &str) -> Self {
        let mut offset = 0;
        let mut error_start = None;
        for line in stderr.split_inclusive('\n') {
            let trimmed = line.trim_start();
            if trimmed.starts_with("ERROR:") {
                error_start = Some(offset + (line.len() - trimmed.len()));
                break;
            }
            offset += line.len();
        }

        match error_start {
            Some(start) => Self::ExtractionFailed(stderr[start..].trim().to_string()),
            None => {
                let detail = stderr.trim();
                if detail.is_empty() {
                    Self::Unexpected("extractor exited without output".to_string())
                } else {
                    Self::Unexpected(detail.to_string())
                }
            }
        }
    }
}
