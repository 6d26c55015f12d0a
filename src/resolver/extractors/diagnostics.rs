// Failure diagnostics - classifies extractor error messages for the logs
//
// The client only ever sees the extractor's message (or a generic one);
// the diagnosed reason goes to tracing so operators can tell a geo block
// from a missing handler without reading raw stderr.

/// Why an extractor gave up on a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Geographic restriction
    GeoBlocked,

    /// DRM-protected content; permanent, no workaround
    DrmProtected,

    /// Content needs a logged-in session (age gate, private, members-only)
    LoginRequired,

    /// No site handler understands the URL
    UnsupportedUrl,

    /// 429 or similar
    RateLimited,

    /// Captcha / anti-bot page
    BotDetection,

    /// Deleted or otherwise gone
    VideoUnavailable,

    /// Network timeout or refused connection
    NetworkTimeout,

    Unknown,
}

impl FailureReason {
    /// Whether the browser fallback has a realistic chance
    pub fn browser_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::UnsupportedUrl | Self::BotDetection | Self::Unknown
        )
    }

    /// Check if this is a permanent restriction (no workaround)
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::DrmProtected | Self::VideoUnavailable)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::GeoBlocked => "Geographic restriction",
            Self::DrmProtected => "DRM-protected content",
            Self::LoginRequired => "Login required",
            Self::UnsupportedUrl => "Unsupported URL",
            Self::RateLimited => "Rate limited",
            Self::BotDetection => "Bot detection triggered",
            Self::VideoUnavailable => "Video unavailable",
            Self::NetworkTimeout => "Network timeout",
            Self::Unknown => "Unknown failure",
        }
    }
}

/// Analyze an error message and return the failure reason
pub fn diagnose_error(error: &str) -> Option<FailureReason> {
    let lower = error.to_lowercase();

    // Most specific first

    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("playready")
        || lower.contains("fairplay")
        || lower.contains("encrypted media")
    {
        return Some(FailureReason::DrmProtected);
    }

    if lower.contains("unsupported url") || lower.contains("no video formats found") {
        return Some(FailureReason::UnsupportedUrl);
    }

    if lower.contains("sign in")
        || lower.contains("login required")
        || lower.contains("log in")
        || lower.contains("private video")
        || lower.contains("members only")
        || lower.contains("age-restricted")
        || lower.contains("--cookies")
    {
        return Some(FailureReason::LoginRequired);
    }

    if lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("no longer available")
        || lower.contains("http error 404")
    {
        return Some(FailureReason::VideoUnavailable);
    }

    if lower.contains("available in your country")
        || lower.contains("geo restriction")
        || lower.contains("geo-restricted")
        || lower.contains("blocked in your country")
    {
        return Some(FailureReason::GeoBlocked);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(FailureReason::RateLimited);
    }

    if lower.contains("captcha") || lower.contains("cloudflare") || lower.contains("unusual traffic") {
        return Some(FailureReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(FailureReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network is unreachable")
    {
        return Some(FailureReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(FailureReason::Unknown);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_detection() {
        let error = "ERROR: [generic] Unable to download webpage: HTTP Error 403: Forbidden";
        assert_eq!(diagnose_error(error), Some(FailureReason::Http403Forbidden));
    }

    #[test]
    fn test_unsupported_detection() {
        let error = "ERROR: Unsupported URL: https://example.com/";
        assert_eq!(diagnose_error(error), Some(FailureReason::UnsupportedUrl));
    }

    #[test]
    fn test_drm_detection() {
        let error = "ERROR: [Netflix] This video is DRM protected";
        assert_eq!(diagnose_error(error), Some(FailureReason::DrmProtected));
        assert!(FailureReason::DrmProtected.is_permanent());
    }

    #[test]
    fn test_login_detection() {
        let error = "ERROR: [youtube] abc: Sign in to confirm your age";
        assert_eq!(diagnose_error(error), Some(FailureReason::LoginRequired));
    }

    #[test]
    fn test_geo_detection() {
        let error = "ERROR: The uploader has not made this video available in your country";
        assert_eq!(diagnose_error(error), Some(FailureReason::GeoBlocked));
    }

    #[test]
    fn test_timeout_detection() {
        let error = "yt-dlp timed out after 300s";
        assert_eq!(diagnose_error(error), Some(FailureReason::NetworkTimeout));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(diagnose_error("ERROR: something odd"), Some(FailureReason::Unknown));
        assert_eq!(diagnose_error("   "), None);
    }

    #[test]
    fn test_browser_hint() {
        assert!(FailureReason::Http403Forbidden.browser_might_help());
        assert!(!FailureReason::GeoBlocked.browser_might_help());
    }
}
