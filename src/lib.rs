//! dca-json: hierarchical input documents for DCA simulations
//!
//! Loads a JSON-superset configuration file into an owned value tree,
//! indexes every map entry under a delimiter-joined flat key, resolves short
//! keys against that index and binds values into typed targets, including
//! matrices stored inline, as `{rows, cols, data}` descriptions or as byte
//! ranges of other files.
//!
//! ```text
//! Document::load(path)
//!     ├── dca_json_core::parse_document   text -> Value
//!     ├── DocumentIndex::build            Value -> [(flat key, route)]
//!     └── get / try_get / get_either      short key -> &Value
//!                 └── bind(target, value)  &Value -> typed target
//! ```
//!
//! Parsing lives in the `dca-json-core` crate; this crate adds the index,
//! the resolver, binding and the optional `dca_json` CLI (feature `cli`).

pub mod bind;
pub mod document;
pub mod error;
pub mod index;
pub mod options;
pub mod resolver;

pub use bind::{bind, bind_matrix, bind_new, Bind, Matrix, MatrixLike, Transposer};
pub use document::Document;
pub use error::{ReaderError, Result};
pub use index::{DocumentIndex, IndexEntry};
pub use options::{InlineMatrices, LoadOptions, Resolution};
pub use resolver::key_matches;

// Value tree types from the parsing layer
pub use dca_json_core::{Map, MatrixFileRef, Origin, ParseError, Scalar, Value, ValueKind};
