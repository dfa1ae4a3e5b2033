//! Value tree - the parsed form of an input document
//!
//! A document parses into a single owned [`Value`]. Every node is owned by its
//! parent, so the whole tree is dropped with the root. Payloads are only
//! reachable through kind-checked accessors that fail with
//! [`ValueError::TypeMismatch`] when asked for the wrong kind.
//!
//! ```text
//! Value
//!   ├── Null
//!   ├── Scalar(Integer | Float | Bool | Text)
//!   ├── Map(ordered key → Value)
//!   ├── Sequence(Vec<Value>)
//!   └── MatrixFile(filename, [start, end))
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValueError;

/// The shared null node returned by lenient lookups that find nothing.
pub static NULL: Value = Value::Null;

// =============================================================================
// KIND
// =============================================================================

/// Discriminant of a [`Value`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Null,
    Scalar,
    Map,
    Sequence,
    MatrixFile,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Scalar => "scalar",
            ValueKind::Map => "map",
            ValueKind::Sequence => "sequence",
            ValueKind::MatrixFile => "matrix-file",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SCALAR
// =============================================================================

/// Leaf payload. Text is kept as written so numeric targets can still
/// convert it (`"3"` binds into an integer).
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::Bool(_) => "boolean",
            Scalar::Text(_) => "text",
        }
    }

    /// Integer view. Floats convert only when integral and in range.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            Scalar::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            Scalar::Bool(_) => None,
            Scalar::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(_) => None,
            Scalar::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            Scalar::Integer(0) => Some(false),
            Scalar::Integer(1) => Some(true),
            Scalar::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// The raw text when this scalar was a string literal
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

// =============================================================================
// MAP
// =============================================================================

/// Ordered string-keyed map. Keys are unique; insertion order is kept.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Map {
    entries: Vec<(String, Value)>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position and the
    /// previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Entry by insertion position
    pub fn entry_at(&self, position: usize) -> Option<(&str, &Value)> {
        self.entries.get(position).map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut map = Map::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

// =============================================================================
// MATRIX FILE REFERENCE
// =============================================================================

/// A matrix whose text lives in `filename` at bytes `[start, end)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MatrixFileRef {
    filename: PathBuf,
    start: u64,
    end: u64,
}

impl MatrixFileRef {
    pub fn new(filename: impl Into<PathBuf>, start: u64, end: u64) -> Self {
        Self {
            filename: filename.into(),
            start,
            end,
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    /// Length of the byte range
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for MatrixFileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("filename", &self.filename.to_string_lossy())?;
        map.serialize_entry("start", &self.start)?;
        map.serialize_entry("end", &self.end)?;
        map.end()
    }
}

// =============================================================================
// VALUE
// =============================================================================

/// A node of the parsed document
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    Map(Map),
    Sequence(Vec<Value>),
    MatrixFile(MatrixFileRef),
}

impl Value {
    /// The shared null node
    pub fn null() -> &'static Value {
        &NULL
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Scalar(_) => ValueKind::Scalar,
            Value::Map(_) => ValueKind::Map,
            Value::Sequence(_) => ValueKind::Sequence,
            Value::MatrixFile(_) => ValueKind::MatrixFile,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Value::Sequence(_))
    }

    pub fn as_scalar(&self) -> Result<&Scalar, ValueError> {
        match self {
            Value::Scalar(s) => Ok(s),
            other => Err(ValueError::type_mismatch("scalar", other.kind())),
        }
    }

    pub fn as_map(&self) -> Result<&Map, ValueError> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(ValueError::type_mismatch("map", other.kind())),
        }
    }

    pub fn as_sequence(&self) -> Result<&[Value], ValueError> {
        match self {
            Value::Sequence(items) => Ok(items),
            other => Err(ValueError::type_mismatch("sequence", other.kind())),
        }
    }

    pub fn as_file_ref(&self) -> Result<&MatrixFileRef, ValueError> {
        match self {
            Value::MatrixFile(r) => Ok(r),
            other => Err(ValueError::type_mismatch("matrix-file", other.kind())),
        }
    }

    /// Map child by key
    pub fn field(&self, key: &str) -> Result<&Value, ValueError> {
        self.as_map()?
            .get(key)
            .ok_or_else(|| ValueError::MissingKey(key.to_string()))
    }

    /// Sequence element by position
    pub fn at(&self, index: usize) -> Result<&Value, ValueError> {
        let items = self.as_sequence()?;
        items.get(index).ok_or(ValueError::IndexOutOfRange {
            index,
            len: items.len(),
        })
    }

    /// Number of times `key` occurs as a direct child (0 or 1)
    pub fn count(&self, key: &str) -> usize {
        match self {
            Value::Map(m) => usize::from(m.contains_key(key)),
            _ => 0,
        }
    }

    /// Number of children of a map or sequence, 0 otherwise
    pub fn size(&self) -> usize {
        match self {
            Value::Map(m) => m.len(),
            Value::Sequence(items) => items.len(),
            _ => 0,
        }
    }

    /// Follow a route of map entry positions from this node.
    pub fn descend(&self, route: &[usize]) -> Option<&Value> {
        route.iter().try_fold(self, |node, &position| match node {
            Value::Map(m) => m.entry_at(position).map(|(_, v)| v),
            _ => None,
        })
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Scalar(s) => s.serialize(serializer),
            Value::Map(m) => {
                let mut out = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            Value::Sequence(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(item)?;
                }
                out.end()
            }
            Value::MatrixFile(r) => {
                let mut out = serializer.serialize_map(Some(1))?;
                out.serialize_entry("@matrix", r)?;
                out.end()
            }
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Text(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Text(s))
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Map(m)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Sequence(items)
    }
}

impl From<MatrixFileRef> for Value {
    fn from(r: MatrixFileRef) -> Self {
        Value::MatrixFile(r)
    }
}
