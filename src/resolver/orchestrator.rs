// Extraction orchestrator - structured extraction with a browser fallback
//
// Strategy:
// 1. Validate the URL and build forwarded headers
// 2. Structured extractor (yt-dlp) → FormatSelector → single best source
// 3. On a recognized extraction failure: browser fallback, if this deployment has one
// 4. Every failure ends up as a JSON error payload; internal detail only goes to the log

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::errors::ExtractError;
use super::extractors::{
    diagnose_error, BrowserExtractor, ExtractedInfo, ExtractorConfig, FailureReason, InfoExtractor,
};
use super::format_selector::FormatSelector;
use super::models::{
    ClientHeaders, ExtractionRequest, ExtractionResult, ForwardedHeaders, ResolvedMedia,
    FALLBACK_PROVIDER, FALLBACK_TTL_SECONDS, MAX_FALLBACK_SOURCES, PRIMARY_TTL_SECONDS,
};

/// Orchestrator that sequences the structured extractor and the browser fallback.
///
/// Holds no per-request state; one instance is shared by all requests.
pub struct ExtractionOrchestrator {
    structured: Arc<dyn InfoExtractor>,
    /// `None` when the deployment has no browser; decided once at startup
    fallback: Option<Arc<dyn BrowserExtractor>>,
    base_config: ExtractorConfig,
}

impl ExtractionOrchestrator {
    pub fn new(structured: Arc<dyn InfoExtractor>, base_config: ExtractorConfig) -> Self {
        Self {
            structured,
            fallback: None,
            base_config,
        }
    }

    pub fn with_fallback(mut self, fallback: Option<Arc<dyn BrowserExtractor>>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Resolve a page URL into a playable source.
    ///
    /// Only invalid input is returned as `Err`; every other outcome is an
    /// `ExtractionResult`, successful or not.
    pub async fn extract(
        &self,
        url: &str,
        client: ClientHeaders,
    ) -> Result<ExtractionResult, ExtractError> {
        let request = ExtractionRequest::parse(url, client)?;
        Ok(self.run(&request).await)
    }

    async fn run(&self, request: &ExtractionRequest) -> ExtractionResult {
        let config = self
            .base_config
            .clone()
            .with_headers(ForwardedHeaders::for_request(request));

        debug!(
            extractor = self.structured.name(),
            url = %request.url(),
            "starting structured extraction"
        );

        match self.structured.extract(request.url(), &config).await {
            Ok(info) => Self::from_info(request.url(), info),
            Err(ExtractError::ExtractionFailed(message)) => {
                let reason = diagnose_error(&message).unwrap_or(FailureReason::Unknown);
                warn!(
                    url = %request.url(),
                    reason = reason.description(),
                    permanent = reason.is_permanent(),
                    browser_might_help = reason.browser_might_help(),
                    error = %message,
                    "structured extraction failed"
                );
                self.fallback(request.url(), message).await
            }
            Err(e) => {
                warn!(url = %request.url(), error = %e, "unexpected extraction error");
                ExtractionResult::failure(&e)
            }
        }
    }

    /// Rank the extractor's formats and shape the primary-path response
    fn from_info(url: &str, info: ExtractedInfo) -> ExtractionResult {
        let provider = info
            .extractor_key
            .as_deref()
            .unwrap_or("unknown")
            .to_lowercase();

        let Some(best) = FormatSelector::select_best(&info.formats) else {
            info!(
                url = %url,
                provider = %provider,
                formats = info.formats.len(),
                "no playable format survived filtering"
            );
            return ExtractionResult::failure(&ExtractError::NoPlayableSource);
        };

        info!(
            url = %url,
            provider = %provider,
            kind = best.kind.as_str(),
            score = best.score,
            "selected best format"
        );

        let source = best.to_source();
        ExtractionResult::Ok(ResolvedMedia {
            provider,
            title: info.title,
            duration: info.duration,
            sources: vec![source],
            ttl_seconds: PRIMARY_TTL_SECONDS,
        })
    }

    /// Browser fallback after a recognized extraction failure.
    /// Surfaces the original extractor message when it cannot help.
    async fn fallback(&self, url: &str, original_message: String) -> ExtractionResult {
        let Some(browser) = self.fallback.clone() else {
            debug!(url = %url, "no browser fallback in this deployment");
            return ExtractionResult::error(original_message);
        };

        info!(url = %url, fallback = browser.name(), "trying browser fallback");

        // Detached task: a client disconnect drops this future but the browser
        // session still runs to completion and gets released
        let target = url.to_string();
        let capture = match tokio::spawn(async move { browser.extract(&target).await }).await {
            Ok(capture) => capture,
            Err(e) => {
                warn!(url = %url, error = %e, "browser fallback task failed");
                None
            }
        };

        match capture {
            Some(mut capture) if !capture.sources.is_empty() => {
                capture.sources.truncate(MAX_FALLBACK_SOURCES);
                ExtractionResult::Ok(ResolvedMedia {
                    provider: FALLBACK_PROVIDER.to_string(),
                    title: capture.title,
                    duration: None,
                    sources: capture.sources,
                    ttl_seconds: FALLBACK_TTL_SECONDS,
                })
            }
            _ => {
                info!(url = %url, "browser fallback found nothing");
                ExtractionResult::error(original_message)
            }
        }
    }
}
