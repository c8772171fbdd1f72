use thiserror::Error;

/// Result type for platform table operations
pub type Result<T> = std::result::Result<T, PlatformError>;

/// Errors that can occur while building a knowledge base
#[derive(Error, Debug)]
pub enum PlatformError {
    /// `go tool dist list -json` output could not be decoded
    #[error("invalid platform list: {0}")]
    Decode(#[from] serde_json::Error),

    /// The platform list contained no entries
    #[error("platform list is empty")]
    Empty,
}
