// Extractors - everything that turns a page URL into candidate streams
//
// - ytdlp: structured extraction via yt-dlp (primary path)
// - browser: headless Chromium network sniffing (fallback path)
// - diagnostics: classification of extractor failures for the logs

mod browser;
mod diagnostics;
mod traits;
mod ytdlp;

pub use browser::{
    classify_request_url, network_then_html, prioritize, scan_html, sources_from_requests,
    BrowserSettings,
};
#[cfg(feature = "browser")]
pub use browser::ChromiumExtractor;
pub use diagnostics::{diagnose_error, FailureReason};
pub use traits::{
    BrowserCapture, BrowserExtractor, CandidateFormat, ExtractedInfo, ExtractorConfig,
    ImpersonationTarget, InfoExtractor,
};
pub use ytdlp::{YtDlpCommand, YtDlpExtractor};
