use std::io;

use clop::{ParseError, TableError};

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// Already reported on stderr by the parser or a handler.
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("invalid option table: {0}")]
    Table(#[from] TableError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DemoError {
    /// Whether the message still has to be printed before exiting.
    pub fn needs_report(&self) -> bool {
        !matches!(self, DemoError::Parse(_))
    }
}

pub type Result<T> = std::result::Result<T, DemoError>;

/// Why an `--integer` value was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegerError {
    #[error("expects a decimal number and not")]
    NotANumber,

    #[error("got an invalid integer")]
    Malformed,
}
