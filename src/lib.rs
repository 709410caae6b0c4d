//! tokloader library

pub mod api;
pub mod app;
pub mod extractor;
pub mod relay;
pub mod utils;

// Re-export main types for easier use
pub use api::{router, AppState};
pub use extractor::{Extractor, QualityTag, Resolver, ResolverEndpoint, SourceTag, VideoRecord, VideoReference};
pub use relay::{ByteSink, RelayConfig, RelayEngine, RelayOutcome};
pub use utils::{AppSettings, RelayError, ResolutionError, SourceError};
