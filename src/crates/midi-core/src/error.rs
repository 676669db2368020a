use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while reading or writing Standard MIDI Files.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad magic or unusable header fields. Aborts the whole file.
    #[error("Invalid header at offset {offset}: {reason}")]
    InvalidHeader { offset: usize, reason: String },

    /// A fixed-width field or variable-length quantity ran past the buffer.
    #[error("Truncated input at offset {offset}: wanted {wanted}")]
    TruncatedInput { offset: usize, wanted: String },

    /// A data byte appeared before any status byte in the track.
    #[error("Data byte at offset {offset} with no running status")]
    NoRunningStatus { offset: usize },

    /// The value does not fit in a four byte variable-length quantity.
    #[error("Value {value} does not fit in a variable-length quantity")]
    ValueTooLarge { value: u64 },

    #[error("Failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_header(offset: usize, reason: impl Into<String>) -> Self {
        Error::InvalidHeader {
            offset,
            reason: reason.into(),
        }
    }

    pub fn truncated(offset: usize, wanted: impl Into<String>) -> Self {
        Error::TruncatedInput {
            offset,
            wanted: wanted.into(),
        }
    }

    /// Byte offset the error refers to, when there is one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::InvalidHeader { offset, .. }
            | Error::TruncatedInput { offset, .. }
            | Error::NoRunningStatus { offset } => Some(*offset),
            Error::ValueTooLarge { .. } | Error::Io { .. } => None,
        }
    }

    /// True for errors that only invalidate the track being decoded.
    pub fn is_track_local(&self) -> bool {
        matches!(
            self,
            Error::TruncatedInput { .. } | Error::NoRunningStatus { .. }
        )
    }
}

/// A track chunk that failed to decode and was left out of the file.
#[derive(Debug)]
pub struct TrackError {
    pub index: usize,
    pub error: Error,
}

impl std::fmt::Display for TrackError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Track {}: {}", self.index, self.error)
    }
}
