//! dca-json-core: value tree and parsers for DCA input documents
//!
//! This crate contains the pure parsing layer with NO lookup or binding logic:
//! - Value tree types (Value, Scalar, Map, MatrixFileRef)
//! - Nom-based JSON-superset document parser
//! - Byte-range matrix text reader used for file-backed matrices
//! - Error types with line/column diagnostics
//!
//! Flattening, key resolution and matrix binding live in `dca-json`.

pub mod error;
pub mod matrix_text;
pub mod parser;
pub mod value;

// Re-export commonly used types
pub use error::{MatrixTextError, ParseError, ValueError};
pub use matrix_text::{parse_matrix_text, read_matrix_range, MatrixText};
pub use parser::{parse_document, parse_str, InlineMatrices, Origin};
pub use value::{Map, MatrixFileRef, Scalar, Value, ValueKind};
