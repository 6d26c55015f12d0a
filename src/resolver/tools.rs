// Capability detection - which external engines this deployment can use
//
// Resolved once at startup; requests only read the result.

use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

use super::extractors::YtDlpCommand;
use super::utils::find_binary;

const COMMON_BIN_DIRS: &[&str] = &[
    "/opt/homebrew/bin", // Homebrew on Apple Silicon
    "/usr/local/bin",    // Homebrew on Intel Mac
    "/usr/bin",
    "/snap/bin",
];

const YTDLP_NAMES: &[&str] = &["yt-dlp"];
const PYTHON_NAMES: &[&str] = &["python3", "python"];
const BROWSER_NAMES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];
const MAC_CHROME: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

/// What to look for, usually straight from the command line
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub ytdlp_path: Option<String>,
    pub chrome_path: Option<String>,
    pub browser_enabled: bool,
}

/// External engines available to this process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    /// How to run yt-dlp, if it is installed at all
    pub ytdlp: Option<YtDlpCommand>,
    /// Chromium/Chrome executable for the fallback; `None` disables it
    pub browser: Option<String>,
}

impl Capabilities {
    pub fn detect(options: &DetectOptions) -> Self {
        let ytdlp = Self::detect_ytdlp(options.ytdlp_path.as_deref());
        let browser = Self::detect_browser(options);

        match &ytdlp {
            Some(YtDlpCommand::Binary(path)) => {
                info!(path = %path, version = ?get_version(path, &[]), "yt-dlp binary found")
            }
            Some(YtDlpCommand::PythonModule(python)) => info!(
                python = %python,
                version = ?get_version(python, &["-m", "yt_dlp"]),
                "using yt_dlp python module"
            ),
            None => warn!("yt-dlp not found; structured extraction will fail until it is installed"),
        }
        match &browser {
            Some(path) => info!(path = %path, "browser fallback enabled"),
            None => info!("browser fallback disabled"),
        }

        Self { ytdlp, browser }
    }

    /// Command used for structured extraction. Falls back to a bare `yt-dlp`
    /// so a missing install shows up as a normal extraction error.
    pub fn ytdlp_command(&self) -> YtDlpCommand {
        self.ytdlp
            .clone()
            .unwrap_or_else(|| YtDlpCommand::Binary("yt-dlp".to_string()))
    }

    pub fn browser_available(&self) -> bool {
        self.browser.is_some()
    }

    fn detect_ytdlp(explicit: Option<&str>) -> Option<YtDlpCommand> {
        if let Some(path) = explicit {
            return Some(YtDlpCommand::Binary(path.to_string()));
        }

        if let Some(path) = find_binary(YTDLP_NAMES, COMMON_BIN_DIRS) {
            if get_version(&path, &[]).is_some() {
                return Some(YtDlpCommand::Binary(path));
            }
        }

        PYTHON_NAMES
            .iter()
            .find(|python| python_has_ytdlp(python))
            .map(|python| YtDlpCommand::PythonModule(python.to_string()))
    }

    fn detect_browser(options: &DetectOptions) -> Option<String> {
        if !cfg!(feature = "browser") || !options.browser_enabled {
            return None;
        }

        if let Some(path) = &options.chrome_path {
            return Some(path.clone());
        }

        find_binary(BROWSER_NAMES, COMMON_BIN_DIRS).or_else(|| {
            Path::new(MAC_CHROME)
                .is_file()
                .then(|| MAC_CHROME.to_string())
        })
    }
}

fn python_has_ytdlp(python: &str) -> bool {
    Command::new(python)
        .args(["-c", "import yt_dlp"])
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

fn get_version(program: &str, leading_args: &[&str]) -> Option<String> {
    match Command::new(program).args(leading_args).arg("--version").output() {
        Ok(output) if output.status.success() => {
            Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_paths_win() {
        let caps = Capabilities::detect(&DetectOptions {
            ytdlp_path: Some("/custom/yt-dlp".to_string()),
            chrome_path: Some("/custom/chromium".to_string()),
            browser_enabled: true,
        });

        assert_eq!(caps.ytdlp, Some(YtDlpCommand::Binary("/custom/yt-dlp".to_string())));
        assert_eq!(caps.browser_available(), cfg!(feature = "browser"));
    }

    #[test]
    fn test_disabled_browser() {
        let caps = Capabilities::detect(&DetectOptions {
            ytdlp_path: Some("/custom/yt-dlp".to_string()),
            chrome_path: Some("/custom/chromium".to_string()),
            browser_enabled: false,
        });
        assert!(!caps.browser_available());
    }

    #[test]
    fn test_missing_ytdlp_falls_back_to_bare_name() {
        let caps = Capabilities {
            ytdlp: None,
            browser: None,
        };
        assert_eq!(caps.ytdlp_command(), YtDlpCommand::Binary("yt-dlp".to_string()));
    }
}
