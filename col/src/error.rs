use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColError {
    /// A model header could not be read in full.
    #[error("unexpected end of input at offset {offset}: needed {needed} bytes, {available} available")]
    UnexpectedEndOfInput {
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("unknown collision format {magic:?} at offset {offset}")]
    UnknownFormat { offset: usize, magic: [u8; 4] },
    #[error("malformed {record} record at offset {offset}: needed {needed} bytes, {available} available")]
    MalformedRecord {
        record: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
    #[error("invalid {record} record: {reason}")]
    InvalidRecord {
        record: &'static str,
        reason: String,
    },
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ColError {
    /// Framing failures end a container read early instead of failing it.
    /// Trailing padding and garbage are common at the end of game archives.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedEndOfInput { .. } | Self::UnknownFormat { .. }
        )
    }

    pub(crate) fn invalid(record: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            record,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ColError>;
