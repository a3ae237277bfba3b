//! # Error Types
//!
//! Defines error types used across subsystems.

use thiserror::Error;

/// Errors raised by a `KeyValueStore` or the codec layer on top of it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// A value could not be encoded for storage.
    #[error("Failed to encode value for key {key}: {message}")]
    Encode { key: String, message: String },

    /// Persisted bytes could not be decoded.
    ///
    /// Data written by this system must always decode; callers treat this as
    /// fatal for the current block.
    #[error("Corrupted value under key {key}: {message}")]
    Corrupted { key: String, message: String },
}

/// Errors when constructing consensus keys and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// Key payload has the wrong size for its algorithm.
    #[error("Invalid {algorithm} key length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        algorithm: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Address string is not valid hex of the right length.
    #[error("Invalid consensus address: {0}")]
    InvalidAddress(String),
}

/// Errors when parsing a decimal ratio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RatioParseError {
    #[error("Empty ratio string")]
    Empty,

    #[error("Invalid ratio '{0}': not a decimal number")]
    Malformed(String),

    #[error("Ratio '{0}' has more than 4 decimal places")]
    TooPrecise(String),

    #[error("Ratio '{0}' is out of range")]
    Overflow(String),
}
