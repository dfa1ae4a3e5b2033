//! Partial key resolution over the document index
//!
//! A short key matches a flat key when its LAST occurrence in the flat key is
//! delimiter-aligned at one boundary of the flat key:
//!
//! ```text
//! flat key "group:alpha"
//!   "group:alpha"  exact               -> match
//!   "alpha"        suffix after ':'    -> match
//!   "group"        prefix before ':'   -> match
//!   "grou"         prefix, no ':'      -> no match
//!   "roup:alph"    interior            -> no match
//! ```
//!
//! Interior occurrences never match, even when both sides are delimiters
//! (`"b"` does not match `"a:b:c"`). Entries are scanned in index order and
//! the first match wins.

use crate::index::{DocumentIndex, IndexEntry};

/// The matching predicate for flat key `candidate` against short `key`
pub fn key_matches(candidate: &str, key: &str, delimiter: char) -> bool {
    let Some(pos) = candidate.rfind(key) else {
        return false;
    };

    if pos == 0 {
        return candidate.len() == key.len() || candidate[key.len()..].starts_with(delimiter);
    }

    if pos == candidate.len() - key.len() {
        return candidate[..pos].ends_with(delimiter);
    }

    false
}

impl DocumentIndex {
    /// First entry in index order matching `key`
    pub fn look_for(&self, key: &str) -> Option<&IndexEntry> {
        let delimiter = self.delimiter();
        self.iter().find(|e| key_matches(e.key(), key, delimiter))
    }

    /// Every entry matching `key`, in index order
    pub fn candidates<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        let delimiter = self.delimiter();
        self.iter().filter(move |e| key_matches(e.key(), key, delimiter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dca_json_core::parse_str;
    use proptest::prelude::*;

    #[test]
    fn test_exact_suffix_and_prefix_match() {
        assert!(key_matches("group:alpha", "group:alpha", ':'));
        assert!(key_matches("group:alpha", "alpha", ':'));
        assert!(key_matches("group:alpha", "group", ':'));
    }

    #[test]
    fn test_unaligned_matches_rejected() {
        assert!(!key_matches("group:alpha", "grou", ':'));
        assert!(!key_matches("group:alpha", "lpha", ':'));
        assert!(!key_matches("group:alpha", "roup:alph", ':'));
        assert!(!key_matches("group:alpha", "beta", ':'));
    }

    #[test]
    fn test_interior_aligned_match_rejected() {
        assert!(!key_matches("a:b:c", "b", ':'));
        assert!(!key_matches("physics:lattice:size", "lattice", ':'));
    }

    #[test]
    fn test_last_occurrence_decides() {
        // last "a" is the suffix after ':'
        assert!(key_matches("a:a", "a", ':'));
        // last "ab" sits at the end but is not delimiter-aligned
        assert!(!key_matches("ab:xab", "ab", ':'));
        // last "x" is interior even though an earlier one is a prefix
        assert!(!key_matches("x:x:y", "x", ':'));
    }

    #[test]
    fn test_multibyte_keys() {
        assert!(key_matches("größe:länge", "länge", ':'));
        assert!(key_matches("größe:länge", "größe", ':'));
        assert!(!key_matches("größe:länge", "öße", ':'));
    }

    #[test]
    fn test_other_delimiter() {
        assert!(key_matches("group/alpha", "alpha", '/'));
        assert!(!key_matches("group:alpha", "alpha", '/'));
    }

    #[test]
    fn test_look_for_first_match_wins() {
        let root = parse_str(r#"{"group": {"alpha": 1}, "other": {"alpha": 2}}"#).unwrap();
        let index = DocumentIndex::build(&root, ':');
        assert_eq!(index.look_for("alpha").unwrap().key(), "group:alpha");
        let all: Vec<&str> = index.candidates("alpha").map(|e| e.key()).collect();
        assert_eq!(all, vec!["group:alpha", "other:alpha"]);
        assert!(index.look_for("gamma").is_none());
    }

    #[test]
    fn test_interior_segment_does_not_match() {
        // "x:group:alpha" holds "group" only in the middle
        let root = parse_str(r#"{"x": {"group:alpha": 1}, "group": 2}"#).unwrap();
        let index = DocumentIndex::build(&root, ':');
        assert_eq!(index.look_for("group").unwrap().key(), "group");
        assert_eq!(index.candidates("group").count(), 1);
    }

    #[test]
    fn test_prefix_match_returns_prefixed_entry() {
        let root = parse_str(r#"{"group:alpha": 1}"#).unwrap();
        let index = DocumentIndex::build(&root, ':');
        assert_eq!(index.look_for("group").unwrap().key(), "group:alpha");
        // a partial segment is not a prefix
        assert!(index.look_for("grou").is_none());
    }

    fn segment() -> impl Strategy<Value = String> {
        "[a-z]{1,6}"
    }

    proptest! {
        #[test]
        fn suffix_segments_always_match(parts in prop::collection::vec(segment(), 1..5)) {
            let path = parts.join(":");
            for start in 0..parts.len() {
                let suffix = parts[start..].join(":");
                prop_assert!(key_matches(&path, &suffix, ':'), "{} vs {}", path, suffix);
            }
        }

        #[test]
        fn exact_key_always_matches(parts in prop::collection::vec(segment(), 1..5)) {
            let path = parts.join(":");
            prop_assert!(key_matches(&path, &path, ':'));
        }

        #[test]
        fn absent_substring_never_matches(path in "[a-m:]{0,12}", key in "[n-z]{1,4}") {
            prop_assert!(!key_matches(&path, &key, ':'));
        }

        #[test]
        fn accepted_matches_are_boundary_aligned(path in "[ab:]{0,10}", key in "[ab:]{1,4}") {
            if key_matches(&path, &key, ':') {
                let prefix_ok = path == key || path.starts_with(&format!("{}:", key));
                let suffix_ok = path.ends_with(&format!(":{}", key));
                prop_assert!(prefix_ok || suffix_ok);
            }
        }
    }
}
