//! Platform service error types

use thiserror::Error;

/// Errors raised by platform sensor and scene services
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlatformError {
    /// The service does not exist on this platform
    #[error("{service} is not supported on this platform")]
    Unsupported { service: String },
    /// The user or the platform denied access
    #[error("permission denied for {service}")]
    PermissionDenied { service: String },
    /// No position could be obtained in time
    #[error("position unavailable: {message}")]
    PositionUnavailable { message: String },
    /// The watch timed out before a fix arrived
    #[error("timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// A handle passed back to the service is unknown
    #[error("unknown subscription handle {handle}")]
    UnknownHandle { handle: u32 },
    /// A scene node id does not resolve
    #[error("unknown scene node {node}")]
    UnknownNode { node: u32 },
}

impl PlatformError {
    /// Numeric code in the style of geolocation position errors
    pub fn code(&self) -> u8 {
        match self {
            PlatformError::Unsupported { .. } => 0,
            PlatformError::PermissionDenied { .. } => 1,
            PlatformError::PositionUnavailable { .. } => 2,
            PlatformError::Timeout { .. } => 3,
            PlatformError::UnknownHandle { .. } => 4,
            PlatformError::UnknownNode { .. } => 5,
        }
    }

    /// Whether the stream may still deliver samples after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlatformError::PositionUnavailable { .. } | PlatformError::Timeout { .. }
        )
    }
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;
