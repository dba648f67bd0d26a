//! # Error Types
//!
//! Custom error types for Simpit Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for Simpit Bridge
#[derive(Debug, Error)]
pub enum SimpitError {
    /// Payload length does not match the fixed record size for its channel
    #[error("Malformed payload: expected {expected} bytes, got {actual}")]
    MalformedPayload { expected: usize, actual: usize },

    /// Simpit framing errors
    #[error("Simpit protocol error: {0}")]
    Protocol(String),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// No serial device could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Outbound packet queue has no receiver anymore
    #[error("Outbound packet queue closed")]
    QueueClosed,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Simpit Bridge
pub type Result<T> = std::result::Result<T, SimpitError>;
