//! Error types
//!
//! The per-frame lighting and shadow path never fails: every capacity or
//! culling problem degrades into an unshadowed light. Errors only exist at
//! the configuration boundary and when a host validates a recorded command
//! stream.

use thiserror::Error;

use crate::command::RenderTargetId;

/// Settings loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Settings serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid shadow atlas size {0} (expected a power of two in 256..=8192)")]
    InvalidAtlasSize(u32),

    #[error("Invalid cascade count {0} (expected 1..=4)")]
    InvalidCascadeCount(u32),
}

/// Errors raised while executing a recorded command buffer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecuteError {
    #[error("Released render target {0} that was never allocated")]
    ReleaseUnallocated(RenderTargetId),

    #[error("Render target {0} allocated twice in one frame")]
    DoubleAllocation(RenderTargetId),

    #[error("Render target {0} used before it was allocated")]
    UnknownTarget(RenderTargetId),

    #[error("Shadow draw issued without a bound render target")]
    NoRenderTarget,

    #[error("Profiler sample '{found}' closed while '{expected}' was open")]
    UnbalancedSample { expected: String, found: String },

    #[error("Profiler sample '{0}' closed but never opened")]
    SampleNotOpen(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
