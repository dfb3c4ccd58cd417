//! Constants used throughout the crate.

/// Default quiescence delay before pending records are flushed.
pub const DEFAULT_FLUSH_DELAY_MILLIS: u64 = 100;

/// Default `tracing` directive installed by the binary and the test suite.
pub const DEFAULT_LOG_DIRECTIVE: &str = "collab_updates=info";
