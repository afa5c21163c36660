//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Retry constants
pub mod retry {
    /// Total attempts including the first
    pub const MAX_ATTEMPTS: usize = 3;

    /// Initial backoff delay (milliseconds)
    pub const INITIAL_DELAY_MS: u64 = 1000;

    /// Backoff multiplier
    pub const BACKOFF_FACTOR: f32 = 2.0;
}

/// Cache constants
pub mod cache {
    /// TTL for prompt and result caches (seconds)
    pub const DEFAULT_TTL_SECS: u64 = 3600;

    /// TTL for catalog trigger lookups (seconds)
    pub const CATALOG_TTL_SECS: u64 = 3600;
}

/// Validation constants
pub mod validation {
    /// Default maximum length of generated source (bytes)
    pub const MAX_CODE_LENGTH: usize = 10_000;
}

/// Loader constants
pub mod loader {
    /// Default interpreter binary
    pub const PYTHON_BIN: &str = "python3";

    /// Per-invocation wall-clock limit (seconds)
    pub const TIMEOUT_SECS: u64 = 30;
}
