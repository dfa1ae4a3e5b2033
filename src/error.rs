//! Error handling for document loading, lookup and binding
//!
//! Every failure is raised where it is detected and propagated to the
//! caller of `load`, `get` or `bind`. Messages carry the context needed to
//! fix an input file: keys tried, shapes compared, paths and directories.

use std::io;
use std::path::PathBuf;

use dca_json_core::{ParseError, ValueError, ValueKind};
use thiserror::Error;

/// Main error type for reading and binding input documents
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("could not find {} in the input file", key_list(.keys))]
    KeyNotFound { keys: Vec<String> },

    #[error("key '{key}' is ambiguous, it matches: {}", .candidates.join(", "))]
    AmbiguousKey { key: String, candidates: Vec<String> },

    #[error(
        "matrix size mismatch: attempt to read a ({},{}) matrix into a ({},{}) matrix \
         (a target with zero rows and columns takes the size of the input)",
        .expected.0, .expected.1, .actual.0, .actual.1
    )]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("matrix shape ({rows},{cols}) is too large")]
    ShapeTooLarge { rows: usize, cols: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: ValueKind },

    #[error("index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(
        "could not find matrix file {} (current directory: {})",
        .path.display(), .cwd.display()
    )]
    FileNotFound {
        path: PathBuf,
        cwd: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReaderError {
    pub fn key_not_found(key: &str) -> Self {
        ReaderError::KeyNotFound {
            keys: vec![key.to_string()],
        }
    }

    pub fn type_mismatch(expected: impl Into<String>, found: ValueKind) -> Self {
        ReaderError::TypeMismatch {
            expected: expected.into(),
            found,
        }
    }
}

fn key_list(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|k| format!("'{}'", k)).collect();
    match quoted.len() {
        1 => format!("key {}", quoted[0]),
        _ => format!("keys {}", quoted.join(" ")),
    }
}

impl From<ValueError> for ReaderError {
    fn from(error: ValueError) -> Self {
        match error {
            ValueError::TypeMismatch { expected, found } => {
                ReaderError::TypeMismatch { expected, found }
            }
            ValueError::MissingKey(key) => ReaderError::KeyNotFound { keys: vec![key] },
            ValueError::IndexOutOfRange { index, len } => {
                ReaderError::IndexOutOfRange { index, len }
            }
        }
    }
}

/// Result alias for this crate
pub type Result<T> = std::result::Result<T, ReaderError>;
