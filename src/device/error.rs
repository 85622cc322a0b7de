//! Device error types

use thiserror::Error;

/// Failures reported by a pointer device backend
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("injection failed: {0}")]
    Injection(String),

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("capture file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;
