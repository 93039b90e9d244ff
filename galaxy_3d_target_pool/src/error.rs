//! Error types for the Galaxy3D target pool
//!
//! This module defines the error types used throughout the crate,
//! including device allocation failures and malformed device output.

use std::fmt;

/// Result type for Galaxy3D target pool operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D target pool errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (device creation, copy, map, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (unsupported descriptor, malformed device output, etc.)
    InvalidResource(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
