// Resolver - page URL in, best playable stream out

pub mod errors;
pub mod extractors;
pub mod format_selector;
pub mod models;
pub mod orchestrator;
pub mod tools;
pub mod utils;

pub use errors::ExtractError;
pub use format_selector::{FormatSelector, SelectedFormat};
pub use models::{ClientHeaders, ExtractionResult, ResolvedMedia, StreamKind, StreamSource};
pub use orchestrator::ExtractionOrchestrator;
pub use tools::Capabilities;
