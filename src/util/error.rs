//! Error types for the Cast library.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::{NodeKind, PropertyKind};

/// Main error type for Cast operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid magic bytes at start of file
    #[error("Invalid Cast file: expected 'cast' magic bytes")]
    BadMagic,

    /// Unsupported file format version
    #[error("Unsupported Cast version: {0}")]
    UnsupportedVersion(u32),

    /// File is truncated or corrupted
    #[error("Unexpected end of stream at offset {0}")]
    UnexpectedEof(u64),

    /// Property identifier not in the known set
    #[error("Unknown property kind: 0x{0:04X}")]
    UnknownPropertyKind(u16),

    /// A node's declared size disagrees with the bytes it actually spans
    #[error("Node size mismatch: header says {expected} bytes, parsed {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Invalid data structure in file
    #[error("Invalid file structure: {0}")]
    InvalidStructure(String),

    /// Property not found by key
    #[error("Property not found: {0}")]
    PropertyMissing(String),

    /// Property exists but holds a different payload kind
    #[error("Property '{key}' kind mismatch: expected {expected}, got {actual}")]
    PropertyKindMismatch {
        key: String,
        expected: PropertyKind,
        actual: PropertyKind,
    },

    /// "First value" access on an empty array property
    #[error("Property '{0}' is an empty array")]
    EmptyArray(String),

    /// Child or element index out of bounds
    #[error("Index {index} out of bounds (count: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Typed accessor used on a node of a different kind
    #[error("Node kind mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: NodeKind, actual: NodeKind },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }
}

/// Result type alias for Cast operations.
pub type Result<T> = std::result::Result<T, Error>;
