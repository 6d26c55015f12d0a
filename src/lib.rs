pub mod config;
pub mod resolver;
pub mod server;

use std::sync::Arc;

use tracing::info;

use config::Config;
use resolver::extractors::{BrowserExtractor, YtDlpExtractor};
use resolver::{Capabilities, ExtractionOrchestrator};
use server::AppState;

/// Resolve capabilities, wire the resolver and serve until the listener closes
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let capabilities = Capabilities::detect(&config.detect_options());

    let structured = Arc::new(YtDlpExtractor::new(capabilities.ytdlp_command()));
    let orchestrator = ExtractionOrchestrator::new(structured, config.extractor_config())
        .with_fallback(browser_fallback(&capabilities));

    let state = Arc::new(AppState {
        orchestrator,
        public_dir: config.public_dir.clone(),
    });
    let app = server::router(state);

    let address = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(address = %address, public_dir = %config.public_dir.display(), "stream-finder listening");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "browser")]
fn browser_fallback(capabilities: &Capabilities) -> Option<Arc<dyn BrowserExtractor>> {
    capabilities.browser.as_ref().map(|path| {
        Arc::new(resolver::extractors::ChromiumExtractor::new(path.clone())) as Arc<dyn BrowserExtractor>
    })
}

#[cfg(not(feature = "browser"))]
fn browser_fallback(_capabilities: &Capabilities) -> Option<Arc<dyn BrowserExtractor>> {
    None
}
