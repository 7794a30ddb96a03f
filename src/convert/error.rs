use std::io;

use crate::chunk::Tag;

/// Conversion error types
#[derive(Debug)]
pub enum ConvertError {
    /// IO error occurred (open/create/read/write)
    Io(io::Error),

    /// Declared sizes or counts inside a chunk contradict each other
    Structural {
        tag: Tag,
        position: u64,
        message: String,
    },

    /// Input is not a tile this converter understands
    InvalidFormat(String),

    /// Fixed-layout record could not be decoded or encoded
    Binary(binrw::Error),
}

impl ConvertError {
    pub fn structural(tag: Tag, position: u64, message: impl Into<String>) -> Self {
        ConvertError::Structural {
            tag,
            position,
            message: message.into(),
        }
    }

    /// I/O failures abort a whole single-file run; everything else only
    /// aborts the current tile.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConvertError::Io(_))
    }
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConvertError::Io(e) => write!(f, "IO error: {}", e),
            ConvertError::Structural {
                tag,
                position,
                message,
            } => write!(f, "Structural error in {} at {:#x}: {}", tag, position, message),
            ConvertError::InvalidFormat(msg) => write!(f, "Invalid file format: {}", msg),
            ConvertError::Binary(e) => write!(f, "Binary record error: {}", e),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io(e) => Some(e),
            ConvertError::Binary(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::Io(err)
    }
}

impl From<binrw::Error> for ConvertError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(e) => ConvertError::Io(e),
            other => ConvertError::Binary(other),
        }
    }
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
