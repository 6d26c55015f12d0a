// yt-dlp InfoExtractor - drives yt-dlp as a child process
//
// Two ways to run it:
// - native `yt-dlp` binary (preferred, no Python dependency)
// - `python3 -m yt_dlp` when only the Python module is installed
//
// A run that ends with an `ERROR:` line is a recognized extraction failure
// (the orchestrator may fall back to the browser); anything else that goes
// wrong is unexpected.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::traits::{CandidateFormat, ExtractedInfo, ExtractorConfig, InfoExtractor};
use crate::resolver::errors::ExtractError;
use crate::resolver::utils::run_output_with_timeout;

/// How yt-dlp is launched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YtDlpCommand {
    /// Path to the `yt-dlp` executable
    Binary(String),
    /// Python interpreter that has the `yt_dlp` module installed
    PythonModule(String),
}

impl YtDlpCommand {
    fn program(&self) -> &str {
        match self {
            Self::Binary(path) => path,
            Self::PythonModule(python) => python,
        }
    }

    fn leading_args(&self) -> Vec<String> {
        match self {
            Self::Binary(_) => Vec::new(),
            Self::PythonModule(_) => vec!["-m".to_string(), "yt_dlp".to_string()],
        }
    }
}

/// Structured extractor backed by yt-dlp
pub struct YtDlpExtractor {
    command: YtDlpCommand,
}

impl YtDlpExtractor {
    pub fn new(command: YtDlpCommand) -> Self {
        Self { command }
    }

    /// Build command arguments
    pub fn build_args(&self, url: &str, config: &ExtractorConfig) -> Vec<String> {
        let mut args = self.command.leading_args();
        args.extend([
            "--dump-single-json".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            config.socket_timeout_seconds.to_string(),
        ]);

        if config.skip_download {
            args.push("--skip-download".to_string());
        }

        if config.allow_playlist {
            args.push("--yes-playlist".to_string());
        } else {
            args.push("--no-playlist".to_string());
        }

        for (name, value) in config.http_headers.pairs() {
            args.push("--add-header".to_string());
            args.push(format!("{}:{}", name, value));
        }

        for (site, target) in &config.site_impersonation_hints {
            args.push("--extractor-args".to_string());
            args.push(format!("{}:impersonate={}", site, target));
        }

        // Keep URLs that start with '-' from being read as options
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Parse the `--dump-single-json` document
    pub fn parse_json(stdout: &[u8]) -> Result<ExtractedInfo, ExtractError> {
        let json: serde_json::Value = serde_json::from_slice(stdout)
            .map_err(|e| ExtractError::Unexpected(format!("Invalid JSON from yt-dlp: {}", e)))?;

        Ok(ExtractedInfo {
            title: json["title"].as_str().map(|s| s.to_string()),
            duration: json["duration"].as_f64(),
            extractor_key: json["extractor_key"].as_str().map(|s| s.to_string()),
            formats: Self::parse_formats(&json),
        })
    }

    fn parse_formats(json: &serde_json::Value) -> Vec<CandidateFormat> {
        // Playlist documents and some single-file pages carry no `formats` array
        let Some(formats_array) = json["formats"].as_array() else {
            return Vec::new();
        };

        formats_array
            .iter()
            .map(|f| CandidateFormat {
                url: f["url"].as_str().map(|s| s.to_string()),
                protocol: f["protocol"].as_str().map(|s| s.to_string()),
                ext: f["ext"].as_str().map(|s| s.to_string()),
                vcodec: f["vcodec"].as_str().map(|s| s.to_string()),
                acodec: f["acodec"].as_str().map(|s| s.to_string()),
                width: as_dimension(&f["width"]),
                height: as_dimension(&f["height"]),
                tbr: f["tbr"].as_f64(),
                filesize: as_size(&f["filesize"]),
                filesize_approx: as_size(&f["filesize_approx"]),
            })
            .collect()
    }
}

fn as_dimension(value: &serde_json::Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
        .and_then(|v| u32::try_from(v).ok())
}

fn as_size(value: &serde_json::Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64))
}

#[async_trait]
impl InfoExtractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        match self.command {
            YtDlpCommand::Binary(_) => "yt-dlp",
            YtDlpCommand::PythonModule(_) => "python-yt-dlp",
        }
    }

    async fn extract(&self, url: &str, config: &ExtractorConfig) -> Result<ExtractedInfo, ExtractError> {
        let args = self.build_args(url, config);
        debug!(
            extractor = self.name(),
            program = self.command.program(),
            url = %url,
            "running structured extraction"
        );

        let output = run_output_with_timeout(self.command.program(), &args, config.timeout_seconds)
            .await
            .map_err(ExtractError::Unexpected)?;

        if output.status.success() {
            return Self::parse_json(&output.stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(
            extractor = self.name(),
            status = %output.status,
            "yt-dlp exited with failure"
        );
        Err(ExtractError::from_stderr(&stderr))
    }
}
