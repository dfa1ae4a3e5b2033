//! Document loading integration tests
//!
//! Loads input documents from disk and checks lookup through the public API:
//! full and partial keys, fallback keys, absent keys and load options.
//!
//! Run with: cargo test --test document_loading

use std::fs;

use dca_json::{Document, LoadOptions, ReaderError, Resolution, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tempfile::TempDir;

const INPUT: &str = r#"
# DCA input file
{
    "output": {
        "directory": "./results",
        "output-format": 'HDF5',
    },
    "physics": {
        "beta": 20.0,
        "chemical-potential": 0.0,
    },
    "single-band-Hubbard-model": {
        "t": 1.0,
        "U": 4,
    },
    "DCA": {
        "iterations": 6,
        "coarse-graining": {"k-mesh-recursion": 3, periods: 2},
        "cluster": [[2, 0], [0, 2]],
    },
    /* integer list */
    "Monte-Carlo-integration": {"sweeps-per-measurement": 1, "seed": 985456376}
}
"#;

fn write_input(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn scalar_f64(v: &Value) -> f64 {
    v.as_scalar().unwrap().as_f64().unwrap()
}

#[test]
fn test_load_and_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(&dir, "input.json", INPUT);

    let doc = Document::load(&path).unwrap();
    assert_eq!(doc.path(), Some(path.as_path()));

    assert_eq!(scalar_f64(doc.get("beta").unwrap()), 20.0);
    assert_eq!(scalar_f64(doc.get("physics:beta").unwrap()), 20.0);
    assert_eq!(scalar_f64(doc.get("U").unwrap()), 4.0);
    assert_eq!(doc.get("output-format").unwrap(), &Value::from("HDF5"));
    assert_eq!(scalar_f64(doc.get("coarse-graining:periods").unwrap()), 2.0);
    assert_eq!(doc.count("DCA"), 1);
    assert_eq!(doc.count("iterations"), 0);
}

#[test]
fn test_bind_typed_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let doc = Document::load(write_input(&dir, "input.json", INPUT)).unwrap();

    let mut iterations = 0usize;
    doc.bind("iterations", &mut iterations).unwrap();
    assert_eq!(iterations, 6);

    let mut seed = 0u64;
    doc.bind("seed", &mut seed).unwrap();
    assert_eq!(seed, 985_456_376);

    let mut directory = String::new();
    doc.bind("output:directory", &mut directory).unwrap();
    assert_eq!(directory, "./results");

    let mut cluster: Vec<Vec<i32>> = Vec::new();
    doc.bind("cluster", &mut cluster).unwrap();
    assert_eq!(cluster, vec![vec![2, 0], vec![0, 2]]);
}

#[test]
fn test_absent_keys() {
    let doc = Document::parse(INPUT, LoadOptions::default()).unwrap();

    assert!(doc.try_get("hopping").is_null());
    assert!(matches!(
        doc.get("hopping"),
        Err(ReaderError::KeyNotFound { .. })
    ));
    // "physics" matches only as the prefix of its own entry
    assert!(doc.try_get("hysics").is_null());

    let err = doc.get_either("mu", "chemical").unwrap_err();
    assert_eq!(
        err.to_string(),
        "could not find keys 'mu' 'chemical' in the input file"
    );
    assert_eq!(
        scalar_f64(doc.get_either("mu", "chemical-potential").unwrap()),
        0.0
    );
}

#[test]
fn test_short_key_matches_prefix_of_flat_key() {
    let doc = Document::parse(r#"{"group:alpha": 1}"#, LoadOptions::default()).unwrap();
    assert_eq!(doc.candidates("group").collect::<Vec<_>>(), vec!["group:alpha"]);
    assert_eq!(doc.get("group").unwrap(), &Value::from(1i64));
    assert!(doc.try_get("grou").is_null());
}

#[test]
fn test_options_from_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let options_path = write_input(&dir, "options.yaml", "delimiter: \"/\"\nresolution: unique\n");
    let options = LoadOptions::from_yaml_file(&options_path).unwrap();
    assert_eq!(options.resolution, Resolution::Unique);

    let input = write_input(&dir, "input.json", r#"{"a": {"x": 1}, "b": {"x": 2}}"#);
    let doc = Document::load_with(&input, options).unwrap();
    assert_eq!(doc.get("a/x").unwrap(), &Value::from(1i64));
    assert!(matches!(
        doc.get("x"),
        Err(ReaderError::AmbiguousKey { .. })
    ));
}

#[test]
fn test_parse_error_reports_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_input(&dir, "broken.json", "{\n  \"a\": 1,\n  \"b\": [1, 2\n}\n");
    let err = Document::load(&path).unwrap_err();
    match err {
        ReaderError::Parse(e) => {
            assert!(e.origin.ends_with("broken.json"), "{}", e.origin);
            assert_eq!(e.line, 4);
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Document::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ReaderError::Io { .. }));
    assert!(err.to_string().contains("absent.json"));
}

// ============================================================================
// Properties
// ============================================================================

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,5}"
}

/// A tree of nested maps described by leaf paths
fn leaf_paths() -> impl Strategy<Value = Vec<(Vec<String>, i64)>> {
    prop::collection::vec(
        (prop::collection::vec(segment(), 1..4), any::<i64>()),
        1..8,
    )
}

fn build_tree(paths: &[(Vec<String>, i64)]) -> serde_json::Value {
    let mut root = serde_json::Map::new();
    for (path, leaf) in paths {
        insert_path(&mut root, path, *leaf);
    }
    serde_json::Value::Object(root)
}

fn insert_path(map: &mut serde_json::Map<String, serde_json::Value>, path: &[String], leaf: i64) {
    match path {
        [] => {}
        [last] => {
            map.entry(last.clone()).or_insert(serde_json::json!(leaf));
        }
        [head, rest @ ..] => {
            let child = map
                .entry(head.clone())
                .or_insert_with(|| serde_json::json!({}));
            // an existing leaf blocks the deeper path
            if let Some(child) = child.as_object_mut() {
                insert_path(child, rest, leaf);
            }
        }
    }
}

fn manual_traversal<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |node, key| node.field(key).ok())
}

proptest! {
    #[test]
    fn get_by_full_path_equals_manual_traversal(paths in leaf_paths()) {
        let text = serde_json::to_string(&build_tree(&paths)).unwrap();
        let doc = Document::parse(&text, LoadOptions::default()).unwrap();

        for (flat_key, value) in doc.entries() {
            let parts: Vec<&str> = flat_key.split(':').collect();
            let expected = manual_traversal(doc.root(), &parts);
            prop_assert_eq!(Some(value), expected);

            // an earlier entry ending in ":<flat_key>" would win the lookup
            if doc.candidates(flat_key).next() == Some(flat_key) {
                prop_assert_eq!(doc.get(flat_key).unwrap(), value);
            }
        }
    }

    #[test]
    fn keys_absent_from_index_are_not_found(paths in leaf_paths(), absent in "[A-Z]{1,6}") {
        let text = serde_json::to_string(&build_tree(&paths)).unwrap();
        let doc = Document::parse(&text, LoadOptions::default()).unwrap();

        prop_assert!(doc.try_get(&absent).is_null());
        let is_not_found = matches!(doc.get(&absent), Err(ReaderError::KeyNotFound { .. }));
        prop_assert!(is_not_found);
    }
}
