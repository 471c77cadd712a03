//! Error module for the Rusty BOLD library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum BoldError {
    /// Error for a kernel whose unnormalized response has no positive maximum, e.g., offsets that miss the kernel support.
    InvalidKernelSupport(String),
    /// Error for a signal too short for the requested operation, e.g., a TR longer than the recording.
    InsufficientSignalLength { required: usize, available: usize },
    /// Error for empty inputs, e.g., convolving an empty signal.
    EmptyInput(String),
    /// Error for invalid parameters
    InvalidParameter(String),
    /// Error for invalid channel, e.g., a trace dimension out of range.
    InvalidChannel(String),
    /// Error for I/O operations.
    IOError(String),
}

impl fmt::Display for BoldError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoldError::InvalidKernelSupport(e) => write!(f, "Invalid kernel support: {}", e),
            BoldError::InsufficientSignalLength {
                required,
                available,
            } => write!(
                f,
                "Insufficient signal length: {} samples required but only {} available",
                required, available
            ),
            BoldError::EmptyInput(e) => write!(f, "Empty input: {}", e),
            BoldError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
            BoldError::InvalidChannel(e) => write!(f, "Invalid channel: {}", e),
            BoldError::IOError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl Error for BoldError {}

impl From<std::io::Error> for BoldError {
    fn from(e: std::io::Error) -> Self {
        BoldError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for BoldError {
    fn from(e: serde_json::Error) -> Self {
        BoldError::IOError(e.to_string())
    }
}
