// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::Deserialize;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Doc {
    items: Vec<String>,
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("doc.json");
    let doc = Doc {
        items: vec!["a".into(), "b".into()],
    };

    save_atomic(&path, &doc).unwrap();
    let loaded: Doc = load_or_default(&path).unwrap();
    assert_eq!(loaded, doc);
}

#[test]
fn missing_file_loads_default() {
    let dir = tempfile::tempdir().unwrap();
    let loaded: Doc = load_or_default(&dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded, Doc::default());
}

#[test]
fn no_tmp_file_remains_after_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    save_atomic(&path, &Doc::default()).unwrap();
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn save_text_atomic_replaces_content_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tasks.md");
    std::fs::write(&path, "- [ ] 1. Old\n").unwrap();

    save_text_atomic(&path, "- [x] 1. New\n").unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "- [x] 1. New\n");
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn corrupt_file_is_moved_aside_and_default_returned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");
    std::fs::write(&path, "{not json").unwrap();

    let loaded: Doc = load_or_default(&path).unwrap();
    assert_eq!(loaded, Doc::default());
    assert!(!path.exists(), "corrupt file is removed from the live path");
    assert!(path.with_extension("bak").exists());
}

#[test]
fn bak_rotation_keeps_at_most_three() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.json");

    for generation in 0..5 {
        std::fs::write(&path, format!("corrupt-{generation}")).unwrap();
        let _: Doc = load_or_default(&path).unwrap();
    }

    assert!(path.with_extension("bak").exists());
    assert!(path.with_extension("bak.2").exists());
    assert!(path.with_extension("bak.3").exists());
    assert!(!path.with_extension("bak.4").exists());

    // Newest corruption lands in .bak
    let newest = std::fs::read_to_string(path.with_extension("bak")).unwrap();
    assert_eq!(newest, "corrupt-4");
}
