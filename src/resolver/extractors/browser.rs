// Browser fallback - sniffs media URLs out of a headless Chromium session
//
// Used only after the structured extractor gave up. It has no format
// metadata, so it does not rank; it returns raw URLs with MP4 before HLS.
//
// Two techniques sit behind one interface:
// 1) network sniffing: every request the page issued whose URL mentions .m3u8/.mp4
// 2) HTML scan: absolute .m3u8/.mp4 URLs in the rendered document (only if 1 found nothing)

use regex::Regex;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use crate::resolver::models::{StreamKind, StreamSource, DEFAULT_USER_AGENT, MAX_FALLBACK_SOURCES};

lazy_static::lazy_static! {
    static ref HLS_URL_RE: Regex = Regex::new(r#"(?i)https?://[^"'\s>]+\.m3u8[^"'\s<]*"#).unwrap();
    static ref MP4_URL_RE: Regex = Regex::new(r#"(?i)https?://[^"'\s>]+\.mp4[^"'\s<]*"#).unwrap();
}

/// Timing and identity of a browser session
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub user_agent: String,
    /// Ceiling for navigation up to DOMContentLoaded
    pub navigation_timeout: Duration,
    /// Pause after DOMContentLoaded so players can request their media
    pub settle_delay: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            navigation_timeout: Duration::from_secs(45),
            settle_delay: Duration::from_secs(3),
        }
    }
}

/// Classify a network request URL by its media marker
pub fn classify_request_url(url: &str) -> Option<StreamKind> {
    if url.contains(".m3u8") {
        Some(StreamKind::Hls)
    } else if url.contains(".mp4") {
        Some(StreamKind::Mp4)
    } else {
        None
    }
}

/// Collect media URLs from a list of request URLs, in request order
pub fn sources_from_requests<'a>(urls: impl IntoIterator<Item = &'a str>) -> Vec<StreamSource> {
    urls.into_iter()
        .filter_map(|url| classify_request_url(url).map(|kind| StreamSource::new(kind, url)))
        .collect()
}

/// Pattern-match absolute media URLs in rendered HTML, deduplicated per kind
pub fn scan_html(html: &str) -> Vec<StreamSource> {
    let mut found = Vec::new();

    for (kind, re) in [(StreamKind::Hls, &*HLS_URL_RE), (StreamKind::Mp4, &*MP4_URL_RE)] {
        let mut seen = HashSet::new();
        for m in re.find_iter(html) {
            if seen.insert(m.as_str()) {
                found.push(StreamSource::new(kind, m.as_str()));
            }
        }
    }

    found
}

/// Media from the sniffed requests; the page HTML is only fetched and scanned
/// when the requests held none
pub async fn network_then_html<F, Fut, E>(request_urls: &[String], fetch_html: F) -> Result<Vec<StreamSource>, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, E>>,
{
    let found = sources_from_requests(request_urls.iter().map(String::as_str));
    if !found.is_empty() {
        return Ok(found);
    }

    let html = fetch_html().await?;
    Ok(scan_html(&html))
}

/// MP4 first (plays without a streaming player), then HLS; keep at most two
pub fn prioritize(mut found: Vec<StreamSource>) -> Vec<StreamSource> {
    found.sort_by_key(|s| match s.kind {
        StreamKind::Mp4 => 0,
        StreamKind::Hls => 1,
    });
    found.truncate(MAX_FALLBACK_SOURCES);
    found
}

#[cfg(feature = "browser")]
pub use chromium::ChromiumExtractor;

#[cfg(feature = "browser")]
mod chromium {
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::network::EventRequestWillBeSent;
    use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
    use futures::{FutureExt, StreamExt};
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};
    use tracing::{debug, info, warn};

    use super::{network_then_html, prioritize, BrowserSettings};
    use crate::resolver::extractors::traits::{BrowserCapture, BrowserExtractor};
    use crate::resolver::models::StreamSource;

    /// Headless Chromium driven over the DevTools protocol
    pub struct ChromiumExtractor {
        executable: String,
        settings: BrowserSettings,
    }

    impl ChromiumExtractor {
        pub fn new(executable: impl Into<String>) -> Self {
            Self {
                executable: executable.into(),
                settings: BrowserSettings::default(),
            }
        }

        /// Fresh profile per session so concurrent sessions never share state
        fn profile_dir() -> PathBuf {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default();
            std::env::temp_dir().join(format!("stream-finder-{}-{}", std::process::id(), nanos))
        }

        async fn run_session(&self, url: &str, profile_dir: &Path) -> Result<Vec<StreamSource>, String> {
            let config = BrowserConfig::builder()
                .chrome_executable(&self.executable)
                .user_data_dir(profile_dir)
                .no_sandbox()
                .arg(format!("--user-agent={}", self.settings.user_agent))
                .arg("--ignore-certificate-errors")
                .arg("--no-first-run")
                .arg("--disable-dev-shm-usage")
                .arg("--autoplay-policy=no-user-gesture-required")
                .build()?;

            let (mut browser, mut handler) = match Browser::launch(config).await {
                Ok(pair) => pair,
                Err(e) => {
                    Self::remove_profile(profile_dir);
                    return Err(format!("Failed to launch browser: {}", e));
                }
            };
            let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

            let found = Self::sniff(&browser, url, &self.settings).await;

            // Release the session on every path, success or not
            if let Err(e) = browser.close().await {
                debug!(error = %e, "browser close failed");
            }
            if let Err(e) = browser.wait().await {
                debug!(error = %e, "waiting for browser exit failed");
            }
            handler_task.abort();
            Self::remove_profile(profile_dir);

            found
        }

        fn remove_profile(profile_dir: &Path) {
            if let Err(e) = std::fs::remove_dir_all(profile_dir) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %profile_dir.display(), error = %e, "profile dir cleanup failed");
                }
            }
        }

        async fn extract_in(&self, url: &str, profile_dir: &Path) -> Option<BrowserCapture> {
            match self.run_session(url, profile_dir).await {
                Ok(found) if !found.is_empty() => {
                    let sources = prioritize(found);
                    info!(url = %url, sources = sources.len(), "browser fallback found media");
                    Some(BrowserCapture { title: None, sources })
                }
                Ok(_) => {
                    info!(url = %url, "browser fallback found no media");
                    None
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "browser fallback failed");
                    None
                }
            }
        }

        async fn sniff(
            browser: &Browser,
            url: &str,
            settings: &BrowserSettings,
        ) -> Result<Vec<StreamSource>, String> {
            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| format!("Failed to create page: {}", e))?;

            // Subscribe before navigating so no request is missed
            let mut requests = page
                .event_listener::<EventRequestWillBeSent>()
                .await
                .map_err(|e| format!("Failed to observe network: {}", e))?;
            let mut dom_ready = page
                .event_listener::<EventDomContentEventFired>()
                .await
                .map_err(|e| format!("Failed to observe page events: {}", e))?;

            let navigation = async {
                let nav = page
                    .execute(NavigateParams::new(url))
                    .await
                    .map_err(|e| format!("Failed to navigate: {}", e))?;
                if let Some(error_text) = nav.result.error_text.clone() {
                    return Err(format!("Navigation error: {}", error_text));
                }
                dom_ready.next().await;
                Ok(())
            };
            tokio::time::timeout(settings.navigation_timeout, navigation)
                .await
                .map_err(|_| format!("Navigation timed out after {:?}", settings.navigation_timeout))??;

            tokio::time::sleep(settings.settle_delay).await;

            let mut request_urls = Vec::new();
            while let Some(Some(event)) = requests.next().now_or_never() {
                request_urls.push(event.request.url.clone());
            }
            let page = &page;
            let found = network_then_html(&request_urls, move || async move {
                page.content()
                    .await
                    .map_err(|e| format!("Failed to read page content: {}", e))
            })
            .await?;
            debug!(requests = request_urls.len(), media = found.len(), "browser sniff done");

            Ok(found)
        }
    }

    #[async_trait]
    impl BrowserExtractor for ChromiumExtractor {
        fn name(&self) -> &'static str {
            "chromium"
        }

        async fn extract(&self, url: &str) -> Option<BrowserCapture> {
            self.extract_in(url, &Self::profile_dir()).await
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::resolver::tools::{Capabilities, DetectOptions};

        // Needs a local Chromium/Chrome: cargo test -- --ignored
        #[tokio::test]
        #[ignore]
        async fn test_unreachable_page_releases_session() {
            let caps = Capabilities::detect(&DetectOptions {
                ytdlp_path: None,
                chrome_path: std::env::var("STREAM_FINDER_CHROME").ok(),
                browser_enabled: true,
            });
            let Some(executable) = caps.browser else {
                eprintln!("no Chromium found, skipping");
                return;
            };

            let extractor = ChromiumExtractor::new(executable);
            let profile_dir = ChromiumExtractor::profile_dir();

            // Discard port on loopback: connection refused, navigation fails fast
            let capture = extractor.extract_in("http://127.0.0.1:9/", &profile_dir).await;

            assert!(capture.is_none());
            assert!(!profile_dir.exists());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_request_url() {
        assert_eq!(classify_request_url("https://cdn.example/master.m3u8?t=1"), Some(StreamKind::Hls));
        assert_eq!(classify_request_url("https://cdn.example/v.mp4"), Some(StreamKind::Mp4));
        // Manifest marker wins when both appear
        assert_eq!(classify_request_url("https://cdn.example/v.mp4/index.m3u8"), Some(StreamKind::Hls));
        assert_eq!(classify_request_url("https://cdn.example/app.js"), None);
    }

    #[test]
    fn test_sources_from_requests_keeps_order() {
        let found = sources_from_requests([
            "https://example.com/",
            "https://cdn.example/a.m3u8",
            "https://cdn.example/ads.js",
            "https://cdn.example/b.mp4",
        ]);
        assert_eq!(
            found,
            vec![
                StreamSource::new(StreamKind::Hls, "https://cdn.example/a.m3u8"),
                StreamSource::new(StreamKind::Mp4, "https://cdn.example/b.mp4"),
            ]
        );
    }

    #[test]
    fn test_scan_html_dedupes_per_kind() {
        let html = r#"
            <video src="https://cdn.example/clip.MP4?sig=1"></video>
            <source src='https://cdn.example/clip.MP4?sig=1'>
            <script>var hls = "https://cdn.example/live/index.m3u8";</script>
            <a href="/relative.mp4">relative links are ignored</a>
        "#;
        let found = scan_html(html);

        assert_eq!(
            found,
            vec![
                StreamSource::new(StreamKind::Hls, "https://cdn.example/live/index.m3u8"),
                StreamSource::new(StreamKind::Mp4, "https://cdn.example/clip.MP4?sig=1"),
            ]
        );
    }

    #[test]
    fn test_scan_html_nothing() {
        assert!(scan_html("<html><body>no media here</body></html>").is_empty());
    }

    #[tokio::test]
    async fn test_network_hits_skip_html() {
        let requests = vec![
            "https://cdn.example/app.js".to_string(),
            "https://cdn.example/v.m3u8".to_string(),
        ];
        let mut html_fetched = false;
        let found = network_then_html(&requests, || {
            html_fetched = true;
            async { Ok::<_, String>(r#"<video src="https://cdn.example/other.mp4">"#.to_string()) }
        })
        .await
        .unwrap();

        assert!(!html_fetched);
        assert_eq!(found, vec![StreamSource::new(StreamKind::Hls, "https://cdn.example/v.m3u8")]);
    }

    #[tokio::test]
    async fn test_html_scanned_when_network_empty() {
        let requests = vec!["https://example.com/".to_string()];
        let found = network_then_html(&requests, || async {
            Ok::<_, String>(r#"<video src="https://cdn.example/other.mp4">"#.to_string())
        })
        .await
        .unwrap();

        assert_eq!(found, vec![StreamSource::new(StreamKind::Mp4, "https://cdn.example/other.mp4")]);
    }

    #[tokio::test]
    async fn test_html_fetch_error_propagates() {
        let err = network_then_html(&[], || async { Err::<String, _>("page gone".to_string()) })
            .await
            .unwrap_err();
        assert_eq!(err, "page gone");
    }

    #[test]
    fn test_prioritize_mp4_first_and_truncates() {
        let found = vec![
            StreamSource::new(StreamKind::Mp4, "u1"),
            StreamSource::new(StreamKind::Hls, "u2"),
            StreamSource::new(StreamKind::Mp4, "u3"),
        ];
        let ordered = prioritize(found);

        assert_eq!(
            ordered,
            vec![
                StreamSource::new(StreamKind::Mp4, "u1"),
                StreamSource::new(StreamKind::Mp4, "u3"),
            ]
        );
    }

    #[test]
    fn test_prioritize_hls_only() {
        let ordered = prioritize(vec![StreamSource::new(StreamKind::Hls, "u1")]);
        assert_eq!(ordered, vec![StreamSource::new(StreamKind::Hls, "u1")]);
    }

    #[test]
    fn test_default_settings() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.navigation_timeout, Duration::from_secs(45));
        assert_eq!(settings.settle_delay, Duration::from_secs(3));
        assert_eq!(settings.user_agent, DEFAULT_USER_AGENT);
    }
}
