//! Document - a parsed input file plus its flat key index
//!
//! A `Document` owns the value tree. The index holds routes into that tree,
//! and every `&Value` handed out borrows the document, so nothing returned
//! from a lookup can outlive it.
//!
//! # Example
//!
//! ```
//! use dca_json::{Document, LoadOptions};
//!
//! let doc = Document::parse(
//!     r#"{"physics": {"beta": 10.0, "lattice": {"size": 4}}}"#,
//!     LoadOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(doc.get("beta").unwrap().as_scalar().unwrap().as_f64(), Some(10.0));
//! assert_eq!(doc.get("lattice:size").unwrap().as_scalar().unwrap().as_i64(), Some(4));
//! assert!(doc.try_get("mu").is_null());
//! ```

use std::path::{Path, PathBuf};

use dca_json_core::{parse_document, Origin, Value};
use tracing::{debug, info};

use crate::bind::Bind;
use crate::error::{ReaderError, Result};
use crate::index::{DocumentIndex, IndexEntry};
use crate::options::{LoadOptions, Resolution};

#[derive(Clone, Debug)]
pub struct Document {
    path: Option<PathBuf>,
    root: Value,
    index: DocumentIndex,
    options: LoadOptions,
}

impl Document {
    /// Load and index a document with default options
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, LoadOptions::default())
    }

    pub fn load_with(path: impl AsRef<Path>, options: LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ReaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let origin = Origin::File(path.to_path_buf());
        let root = parse_document(&text, &origin, options.inline_matrices)?;
        let doc = Self::build(Some(path.to_path_buf()), root, options);

        info!(path = %path.display(), keys = doc.len(), "loaded input document");
        Ok(doc)
    }

    /// Parse in-memory text. Inline matrices are always materialised since
    /// there is no file to defer to.
    pub fn parse(text: &str, options: LoadOptions) -> Result<Self> {
        let root = parse_document(text, &Origin::Memory, options.inline_matrices)?;
        Ok(Self::build(None, root, options))
    }

    /// Index an already built value tree
    pub fn from_value(root: Value, options: LoadOptions) -> Self {
        Self::build(None, root, options)
    }

    fn build(path: Option<PathBuf>, root: Value, options: LoadOptions) -> Self {
        let index = DocumentIndex::build(&root, options.delimiter);
        debug!(entries = index.len(), delimiter = %options.delimiter, "built document index");
        Self {
            path,
            root,
            index,
            options,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Lenient lookup. Returns the first matching entry's value, or the shared
    /// null node when nothing matches.
    pub fn try_get(&self, key: &str) -> &Value {
        match self.index.look_for(key) {
            Some(entry) => self.resolve(entry),
            None => Value::null(),
        }
    }

    /// Strict lookup. A key whose first match holds `null` counts as absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        if self.options.resolution == Resolution::Unique {
            return self.get_unique(key);
        }

        let value = self.try_get(key);
        if value.is_null() {
            return Err(ReaderError::key_not_found(key));
        }
        Ok(value)
    }

    /// Strict lookup of `primary`, falling back to `fallback`
    pub fn get_either(&self, primary: &str, fallback: &str) -> Result<&Value> {
        match self.get(primary) {
            Ok(value) => Ok(value),
            Err(ReaderError::KeyNotFound { .. }) => match self.get(fallback) {
                Ok(value) => Ok(value),
                Err(ReaderError::KeyNotFound { .. }) => Err(ReaderError::KeyNotFound {
                    keys: vec![primary.to_string(), fallback.to_string()],
                }),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Strict lookup that refuses keys matching more than one entry
    pub fn get_unique(&self, key: &str) -> Result<&Value> {
        let mut matches = self.index.candidates(key);
        let Some(first) = matches.next() else {
            return Err(ReaderError::key_not_found(key));
        };

        let rest: Vec<&IndexEntry> = matches.collect();
        if !rest.is_empty() {
            let candidates = std::iter::once(first)
                .chain(rest)
                .map(|e| e.key().to_string())
                .collect();
            return Err(ReaderError::AmbiguousKey {
                key: key.to_string(),
                candidates,
            });
        }

        let value = self.resolve(first);
        if value.is_null() {
            return Err(ReaderError::key_not_found(key));
        }
        Ok(value)
    }

    /// Arity of `key` as a direct child of the root (0 or 1)
    pub fn count(&self, key: &str) -> usize {
        self.root.count(key)
    }

    /// Every flat key matching `key`, in the order lenient lookup scans them
    pub fn candidates<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.index.candidates(key).map(|e| e.key())
    }

    pub fn field(&self, key: &str) -> Result<&Value> {
        Ok(self.root.field(key)?)
    }

    pub fn at(&self, index: usize) -> Result<&Value> {
        Ok(self.root.at(index)?)
    }

    /// `get(key)` then bind the value into `target`
    pub fn bind<T: Bind + ?Sized>(&self, key: &str, target: &mut T) -> Result<()> {
        let value = self.get(key)?;
        debug!(key = key, kind = %value.kind(), "binding value");
        target.bind_from(value)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Source file, `None` for in-memory documents
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    /// Flat keys and their values, in index order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.index.iter().map(|e| (e.key(), self.resolve(e)))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn resolve(&self, entry: &IndexEntry) -> &Value {
        self.root.descend(entry.route()).unwrap_or(Value::null())
    }
}
