//! Integration tests for load failures.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use yaml_extras::{Error, Loader, LoaderOptions};
use yaml_rust2::{Yaml, YamlLoader};

fn write_tree(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write file");
    }
}

fn try_load(doc: &str, files: &[(&str, &str)], options: LoaderOptions) -> (TempDir, Result<Yaml, Error>) {
    let temp = TempDir::new().expect("Failed to create temp directory");
    write_tree(temp.path(), files);
    let mut loader = Loader::with_options(options.with_base_dir(temp.path()));
    let result = loader.load_str(doc);
    (temp, result)
}

fn load_err(doc: &str, files: &[(&str, &str)]) -> Error {
    let (_temp, result) = try_load(doc, files, LoaderOptions::default());
    result.expect_err("load should fail")
}

#[test]
fn test_missing_file_names_path_and_tag() {
    let err = load_err("a: !import missing.yml", &[]);
    match &err {
        Error::Import { tag, path, location, .. } => {
            assert_eq!(tag, "!import");
            assert!(path.ends_with("missing.yml"));
            assert_eq!(location.as_ref().map(|l| l.line), Some(1));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("missing.yml"));
}

#[test]
fn test_missing_anchor_names_file() {
    let err = load_err(
        "a: !import.anchor other.yml &nope",
        &[("other.yml", "x: &yes 1")],
    );
    match err {
        Error::AnchorNotFound { anchor, path, .. } => {
            assert_eq!(anchor, "nope");
            assert!(path.is_some_and(|p| p.ends_with("other.yml")));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_anchor_in_one_matched_file() {
    let err = load_err(
        "ages: !import-all.anchor people/*.yml &age",
        &[
            ("people/a.yml", "age: &age 1"),
            ("people/b.yml", "name: no age here"),
        ],
    );
    assert!(matches!(err, Error::AnchorNotFound { .. }));
}

#[test]
fn test_missing_anchor_separator() {
    let err = load_err("a: !import.anchor other.yml", &[("other.yml", "x: 1")]);
    assert!(matches!(err, Error::DirectiveArgument { ref tag, .. } if tag == "!import.anchor"));
}

#[test]
fn test_wildcard_kind_mismatch() {
    let err = load_err("a: !import-all d/{name:*}.yml", &[]);
    assert!(matches!(err, Error::DirectiveArgument { ref tag, .. } if tag == "!import-all"));

    let err = load_err("a: !import-all-parameterized d/*.yml", &[]);
    assert!(
        matches!(err, Error::DirectiveArgument { ref tag, .. } if tag == "!import-all-parameterized")
    );
}

#[test]
fn test_malformed_pattern() {
    let err = load_err("a: !import-all-parameterized d/{x:*}/{x:*}.yml", &[]);
    assert!(matches!(err, Error::Pattern { .. }));
}

#[test]
fn test_malformed_pattern_names_tag_and_location() {
    let err = load_err("x: 1\ny: !import-all a/***.yml\n", &[]);
    match &err {
        Error::Pattern {
            tag,
            pattern,
            location,
            ..
        } => {
            assert_eq!(tag.as_deref(), Some("!import-all"));
            assert_eq!(pattern, "a/***.yml");
            assert_eq!(location.as_ref().map(|l| l.line), Some(2));
        }
        other => panic!("unexpected error {:?}", other),
    }
    let message = err.to_string();
    assert!(message.starts_with("!import-all invalid pattern 'a/***.yml'"));
    assert!(message.contains("(at <input>:2:"));
}

#[test]
fn test_syntax_error_in_imported_file() {
    let err = load_err("a: !import bad.yml", &[("bad.yml", "a: [1, 2")]);
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_concat_of_imported_mapping_and_sequence() {
    let err = load_err(
        "c: !++ [!import other.yml, !import another.yml]",
        &[("other.yml", "b: 2"), ("another.yml", "- inner: 'most'")],
    );
    assert!(matches!(err, Error::ConcatType { .. }));
}

#[test]
fn test_concat_of_imported_scalar() {
    let err = load_err("c: !++ [!import word.yml]", &[("word.yml", "hello")]);
    assert!(matches!(err, Error::ConcatType { .. }));
}

#[test]
fn test_merge_of_imported_scalar() {
    let err = load_err("c:\n  <<: !import word.yml\n", &[("word.yml", "hello")]);
    assert!(matches!(err, Error::DirectiveArgument { ref tag, .. } if tag == "<<"));
}

#[test]
fn test_error_in_imported_file_points_into_that_file() {
    let err = load_err("a: !import outer.yml", &[("outer.yml", "x: 1\ny: !++ 3\n")]);
    let location = err.location().expect("error should carry a location");
    assert!(location.file.as_deref().is_some_and(|f| f.ends_with("outer.yml")));
    assert_eq!(location.line, 2);
}

// ---------------------------------------------------------------------------
// Cycles and nesting
// ---------------------------------------------------------------------------

#[test]
fn test_direct_cycle_is_detected() {
    let err = load_err("a: !import self.yml", &[("self.yml", "again: !import self.yml")]);
    match err {
        Error::ImportCycle { chain, .. } => {
            assert_eq!(chain.len(), 2);
            assert!(chain.iter().all(|p| p.ends_with("self.yml")));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_transitive_cycle_is_detected() {
    let err = load_err(
        "a: !import one.yml",
        &[
            ("one.yml", "next: !import two.yml"),
            ("two.yml", "next: !import three.yml"),
            ("three.yml", "next: !import one.yml"),
        ],
    );
    match err {
        Error::ImportCycle { chain, .. } => {
            let names: Vec<PathBuf> = chain
                .iter()
                .filter_map(|p| p.file_name().map(PathBuf::from))
                .collect();
            assert_eq!(
                names,
                vec![
                    PathBuf::from("one.yml"),
                    PathBuf::from("two.yml"),
                    PathBuf::from("three.yml"),
                    PathBuf::from("one.yml"),
                ]
            );
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_anchor_import_from_own_file_is_not_a_cycle() {
    let temp = TempDir::new().expect("Failed to create temp directory");
    write_tree(
        temp.path(),
        &[("doc.yml", "defaults: &defaults {size: 3}\ncopy: !import.anchor doc.yml &defaults\n")],
    );
    let mut loader = Loader::with_options(LoaderOptions::default().with_base_dir(temp.path()));
    let value = loader
        .load_file(temp.path().join("doc.yml"))
        .expect("Failed to load document");
    let expected = YamlLoader::load_from_str("defaults: {size: 3}\ncopy: {size: 3}")
        .unwrap()
        .remove(0);
    assert_eq!(value, expected);
}

#[test]
fn test_cycle_without_detection_hits_depth_limit() {
    let options = LoaderOptions::default()
        .with_detect_cycles(false)
        .with_max_depth(8);
    let (_temp, result) = try_load(
        "a: !import self.yml",
        &[("self.yml", "again: !import self.yml")],
        options,
    );
    assert!(matches!(result, Err(Error::NestingTooDeep { max_depth: 8, .. })));
}

#[test]
fn test_repeated_import_is_not_a_cycle() {
    let (_temp, result) = try_load(
        "a: !import leaf.yml\nb: [!import leaf.yml, !import leaf.yml]",
        &[("leaf.yml", "v: 1")],
        LoaderOptions::default(),
    );
    assert!(result.is_ok());
}
