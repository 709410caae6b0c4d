//! Media relay module

pub mod engine;
pub mod sink;
pub mod variant;

// Re-export for convenience
pub use engine::{RelayConfig, RelayEngine, RelayOutcome};
pub use sink::{channel_sink, ByteSink, ChannelReceiver, ChannelSink, GuardedSink, MediaHeaders, RelayState};
pub use variant::{media_filename, sanitize_filename, select_variant};
