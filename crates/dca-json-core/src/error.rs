//! Error types for the value tree and the parsers.

use thiserror::Error;

use crate::value::ValueKind;

/// A syntax error in a document or in a matrix text range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{origin}:{line}:{column}: {message}")]
pub struct ParseError {
    /// File path or `<memory>` for in-memory text
    pub origin: String,
    /// 1-based line of the failure
    pub line: u32,
    /// 1-based column of the failure
    pub column: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(origin: impl Into<String>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            line,
            column,
            message: message.into(),
        }
    }

    /// Build an error from a byte offset into `source`
    pub fn at_offset(
        origin: impl Into<String>,
        source: &str,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        let (line, column) = byte_to_line_col(source, offset);
        Self::new(origin, line, column, message)
    }
}

/// Convert byte offset to line and column
pub(crate) fn byte_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;

    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Kind-checked access on a [`Value`](crate::Value) failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: ValueKind },

    #[error("key '{0}' not found in map")]
    MissingKey(String),

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

impl ValueError {
    pub fn type_mismatch(expected: impl Into<String>, found: ValueKind) -> Self {
        ValueError::TypeMismatch {
            expected: expected.into(),
            found,
        }
    }
}

/// Reading a matrix from a byte range failed.
#[derive(Error, Debug)]
pub enum MatrixTextError {
    #[error("I/O error while reading matrix text: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),
}
