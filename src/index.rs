//! Document index - flat keys for every map entry in the tree
//!
//! The index never owns values. Each entry stores the route (map entry
//! positions from the root) to its node, and the owning `Document` resolves
//! routes back into its tree.

use std::collections::HashMap;

use dca_json_core::{Map, Value};
use tracing::warn;

/// One flat key and the route to its value
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    key: String,
    route: Box<[usize]>,
}

impl IndexEntry {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn route(&self) -> &[usize] {
        &self.route
    }
}

/// Insertion-ordered flat key index
#[derive(Clone, Debug)]
pub struct DocumentIndex {
    delimiter: char,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl DocumentIndex {
    pub(crate) fn new(delimiter: char) -> Self {
        Self {
            delimiter,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Depth-first flattening of `root`. Every map entry is indexed; only
    /// map children are descended into.
    pub fn build(root: &Value, delimiter: char) -> Self {
        let mut index = Self::new(delimiter);
        if let Value::Map(map) = root {
            let mut route = Vec::new();
            index.flatten_map(map, None, &mut route);
        }
        index
    }

    fn flatten_map(&mut self, map: &Map, parent: Option<&str>, route: &mut Vec<usize>) {
        for (position, (key, child)) in map.iter().enumerate() {
            let full_path = match parent {
                None => key.to_string(),
                Some(parent) => format!("{}{}{}", parent, self.delimiter, key),
            };

            route.push(position);
            self.insert(full_path.clone(), route.as_slice());
            if let Value::Map(child_map) = child {
                self.flatten_map(child_map, Some(&full_path), route);
            }
            route.pop();
        }
    }

    fn insert(&mut self, key: String, route: &[usize]) {
        if self.positions.contains_key(&key) {
            warn!(key = %key, "flat key already indexed, keeping the first entry");
            return;
        }
        self.positions.insert(key.clone(), self.entries.len());
        self.entries.push(IndexEntry {
            key,
            route: route.into(),
        });
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Entry whose flat key is exactly `key`
    #[cfg(test)]
    pub fn get_exact(&self, key: &str) -> Option<&IndexEntry> {
        self.positions.get(key).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IndexEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
