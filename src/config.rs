use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::resolver::extractors::{ExtractorConfig, ImpersonationTarget};
use crate::resolver::tools::DetectOptions;

/// Paste a page link, get back a directly playable stream
#[derive(Debug, Clone, Parser)]
#[command(name = "stream-finder", version, about)]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "STREAM_FINDER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "STREAM_FINDER_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Directory with index.html, movies.html and other static assets.
    /// Pages are not bundled; point this at the player frontend checkout.
    #[arg(long, env = "STREAM_FINDER_PUBLIC_DIR", default_value = "frontend/public")]
    pub public_dir: PathBuf,

    /// yt-dlp executable; searched in common locations and PATH when omitted
    #[arg(long, env = "STREAM_FINDER_YTDLP")]
    pub ytdlp_path: Option<String>,

    /// Chromium/Chrome executable for the browser fallback
    #[arg(long, env = "STREAM_FINDER_CHROME")]
    pub chrome_path: Option<String>,

    /// Never launch a browser, even when one is installed
    #[arg(long, env = "STREAM_FINDER_NO_BROWSER")]
    pub no_browser: bool,

    /// Per-socket timeout handed to yt-dlp, in seconds
    #[arg(long, default_value_t = 30)]
    pub socket_timeout: u32,

    /// Ceiling for one yt-dlp run, in seconds
    #[arg(long, default_value_t = 300)]
    pub extract_timeout: u64,

    /// Extra impersonation hint for a yt-dlp site handler, e.g. `vimeo=safari`.
    /// Repeatable; `generic` and `spankbang` use chrome unless overridden.
    #[arg(long = "impersonate", value_name = "SITE=TARGET", value_parser = parse_impersonation)]
    pub impersonate: Vec<(String, ImpersonationTarget)>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    pub fn detect_options(&self) -> DetectOptions {
        DetectOptions {
            ytdlp_path: self.ytdlp_path.clone(),
            chrome_path: self.chrome_path.clone(),
            browser_enabled: !self.no_browser,
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        self.impersonate.iter().fold(
            ExtractorConfig::default()
                .with_socket_timeout(self.socket_timeout)
                .with_timeout(self.extract_timeout),
            |config, (site, target)| config.with_impersonation(site.clone(), *target),
        )
    }
}

fn parse_impersonation(value: &str) -> Result<(String, ImpersonationTarget), String> {
    let (site, target) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SITE=TARGET, got '{}'", value))?;
    let site = site.trim();
    if site.is_empty() {
        return Err(format!("missing site in '{}'", value));
    }
    Ok((site.to_string(), target.parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["stream-finder"]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:5000");
        assert!(config.detect_options().browser_enabled);

        let extractor = config.extractor_config();
        assert_eq!(extractor.socket_timeout_seconds, 30);
        assert_eq!(extractor.timeout_seconds, 300);
    }

    #[test]
    fn test_overrides() {
        let config = Config::parse_from([
            "stream-finder",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--no-browser",
            "--ytdlp-path",
            "/opt/yt-dlp",
        ]);
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert!(!config.detect_options().browser_enabled);
        assert_eq!(config.detect_options().ytdlp_path.as_deref(), Some("/opt/yt-dlp"));
    }

    #[test]
    fn test_impersonation_hints() {
        let config = Config::parse_from([
            "stream-finder",
            "--impersonate",
            "vimeo=safari",
            "--impersonate",
            "generic=firefox",
        ]);
        let hints = config.extractor_config().site_impersonation_hints;

        assert_eq!(hints.get("vimeo"), Some(&ImpersonationTarget::Safari));
        assert_eq!(hints.get("generic"), Some(&ImpersonationTarget::Firefox));
        assert_eq!(hints.get("spankbang"), Some(&ImpersonationTarget::Chrome));
    }

    #[test]
    fn test_public_dir_help_mentions_frontend() {
        use clap::CommandFactory;

        let command = Config::command();
        let public_dir = command
            .get_arguments()
            .find(|arg| arg.get_id() == "public_dir")
            .unwrap();
        let help = public_dir.get_long_help().or(public_dir.get_help()).unwrap().to_string();
        assert!(help.contains("not bundled"));
    }

    #[test]
    fn test_bad_impersonation_is_rejected() {
        assert!(Config::try_parse_from(["stream-finder", "--impersonate", "vimeo"]).is_err());
        assert!(Config::try_parse_from(["stream-finder", "--impersonate", "vimeo=netscape"]).is_err());
        assert!(Config::try_parse_from(["stream-finder", "--impersonate", "=chrome"]).is_err());
    }
}
