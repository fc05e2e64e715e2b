use super::*;

fn paths<'a>(entities: impl IntoIterator<Item = &'a FileEntity>) -> Vec<&'a str> {
    entities.into_iter().map(FileEntity::path).collect()
}

fn sample_tree() -> FileTree {
    let mut tree = FileTree::new(Some("project"));
    tree.upsert("src", FilePatch::directory()).unwrap();
    tree.upsert("src/main.rs", FilePatch::file("fn main() {}"))
        .unwrap();
    tree.upsert("src/lib", FilePatch::directory()).unwrap();
    tree.upsert("src/lib/util.rs", FilePatch::file("")).unwrap();
    tree.upsert("README.md", FilePatch::file("# readme")).unwrap();
    tree.upsert("docs", FilePatch::directory()).unwrap();
    tree
}

#[test]
fn test_new_tree_has_directory_root() {
    let tree = FileTree::new(Some("project"));
    let root = tree.root();
    assert!(root.is_root());
    assert!(root.is_directory);
    assert_eq!(root.name(), "project");
    assert_eq!(root.depth(), 0);
    assert_eq!(tree.len(), 1);
    assert!(tree.parent(ROOT_PATH).unwrap().is_none());
}

#[test]
fn test_parent_and_children_from_paths() {
    let mut tree = FileTree::new(None);
    tree.upsert("src", FilePatch::directory()).unwrap();
    tree.upsert("src/a.js", FilePatch::file("x")).unwrap();

    assert_eq!(paths(tree.children("src").unwrap()), vec!["src/a.js"]);
    let parent = tree.parent("src/a.js").unwrap().unwrap();
    assert_eq!(parent, tree.get("src").unwrap());
    let file = tree.get("src/a.js").unwrap();
    assert_eq!(file.depth(), 1);
    assert_eq!(file.name(), "a.js");
    assert_eq!(file.content, "x");
}

#[test]
fn test_children_sort_directories_first() {
    let mut tree = FileTree::new(None);
    tree.upsert("b.txt", FilePatch::file("")).unwrap();
    tree.upsert("z", FilePatch::directory()).unwrap();
    tree.upsert("a.txt", FilePatch::file("")).unwrap();
    tree.upsert("lib", FilePatch::directory()).unwrap();

    let first = paths(tree.children(ROOT_PATH).unwrap());
    assert_eq!(first, vec!["lib", "z", "a.txt", "b.txt"]);
    let second = paths(tree.children(ROOT_PATH).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_children_exclude_deeper_descendants() {
    let tree = sample_tree();
    assert_eq!(
        paths(tree.children("src").unwrap()),
        vec!["src/lib", "src/main.rs"]
    );
    assert!(tree.children("src/main.rs").unwrap().is_empty());
}

#[test]
fn test_every_entity_is_listed_once_by_its_parent() {
    let tree = sample_tree();
    for entity in tree.descendants(ROOT_PATH) {
        let parent = tree.parent(entity.path()).unwrap().unwrap();
        assert!(entity.path().starts_with(parent.path()));
        assert_ne!(entity.path(), parent.path());
        let hits = tree
            .children(parent.path())
            .unwrap()
            .into_iter()
            .filter(|c| c.path() == entity.path())
            .count();
        assert_eq!(hits, 1, "{}", entity.path());
    }
}

#[test]
fn test_upsert_requires_existing_parent() {
    let mut tree = FileTree::new(None);
    let err = tree.upsert("src/a.js", FilePatch::file("x")).unwrap_err();
    assert!(matches!(err, StoreError::InvalidPath { .. }));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_upsert_rejects_file_parent() {
    let mut tree = FileTree::new(None);
    tree.upsert("a.txt", FilePatch::file("")).unwrap();
    let err = tree.upsert("a.txt/b", FilePatch::file("")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::InvalidPath {
            reason: "parent is not a directory",
            ..
        }
    ));
}

#[test]
fn test_upsert_rejects_malformed_paths() {
    let mut tree = FileTree::new(None);
    tree.upsert("a", FilePatch::directory()).unwrap();
    for bad in ["/a", "a/", "a//b"] {
        let err = tree.upsert(bad, FilePatch::file("")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidPath { .. }), "{bad}");
    }
}

#[test]
fn test_upsert_merges_into_existing() {
    let mut tree = FileTree::new(None);
    tree.upsert("a.txt", FilePatch::file("one")).unwrap();
    tree.upsert(
        "a.txt",
        FilePatch {
            is_synced: Some(false),
            vcs_status: Some(VcsStatus::Modified),
            ..FilePatch::default()
        },
    )
    .unwrap();

    let file = tree.get("a.txt").unwrap();
    assert_eq!(file.content, "one");
    assert!(!file.is_synced);
    assert_eq!(file.vcs_status, VcsStatus::Modified);
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_directory_with_children_cannot_become_file() {
    let mut tree = sample_tree();
    let patch = FilePatch {
        is_directory: Some(false),
        ..FilePatch::default()
    };
    assert!(matches!(
        tree.upsert("src", patch.clone()),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        tree.upsert(ROOT_PATH, patch.clone()),
        Err(StoreError::InvalidArgument(_))
    ));
    // An empty directory may.
    tree.upsert("docs", patch).unwrap();
    assert!(!tree.get("docs").unwrap().is_directory);
}

#[test]
fn test_display_name_overrides_segment() {
    let mut tree = FileTree::new(None);
    tree.upsert(
        "a.txt",
        FilePatch {
            display_name: Some("Notes".to_string()),
            ..FilePatch::default()
        },
    )
    .unwrap();
    assert_eq!(tree.get("a.txt").unwrap().name(), "Notes");
}

#[test]
fn test_sibling_navigation() {
    let tree = sample_tree();
    assert_eq!(
        paths(tree.siblings("src").unwrap()),
        vec!["docs", "src", "README.md"]
    );
    assert_eq!(tree.prev("src").unwrap().unwrap().path(), "docs");
    assert_eq!(tree.next("src").unwrap().unwrap().path(), "README.md");
    assert!(tree.prev("docs").unwrap().is_none());
    assert!(tree.next("README.md").unwrap().is_none());
    assert_eq!(tree.first_child("src").unwrap().unwrap().path(), "src/lib");
    assert_eq!(
        tree.last_child("src").unwrap().unwrap().path(),
        "src/main.rs"
    );
}

#[test]
fn test_missing_parent_is_consistency_error() {
    let mut tree = FileTree::new(None);
    tree.entities.insert(
        CompactString::new("ghost/x"),
        FileEntity::new("ghost/x"),
    );
    let err = tree.parent("ghost/x").unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        tree.parent("nope"),
        Err(StoreError::NotFound { kind: "file", .. })
    ));
}

#[test]
fn test_descendants_pre_order() {
    let tree = sample_tree();
    assert_eq!(
        paths(tree.descendants(ROOT_PATH)),
        vec![
            "docs",
            "src",
            "src/lib",
            "src/lib/util.rs",
            "src/main.rs",
            "README.md"
        ]
    );
    assert_eq!(
        paths(tree.descendants("src")),
        vec!["src/lib", "src/lib/util.rs", "src/main.rs"]
    );
    assert_eq!(tree.descendants("README.md").count(), 0);

    let mut visited = Vec::new();
    tree.for_each_descendant("src/lib", |e| visited.push(e.path().to_string()));
    assert_eq!(visited, vec!["src/lib/util.rs"]);
}

#[test]
fn test_descendants_cursor_reads_live_tree() {
    let mut tree = FileTree::new(None);
    tree.upsert("a", FilePatch::directory()).unwrap();
    tree.upsert("b", FilePatch::directory()).unwrap();

    let mut cursor = Descendants::new(ROOT_PATH);
    assert_eq!(cursor.next(&tree).unwrap().path(), "a");

    tree.upsert("b/y", FilePatch::file("")).unwrap();
    assert_eq!(cursor.next(&tree).unwrap().path(), "b");
    assert_eq!(cursor.next(&tree).unwrap().path(), "b/y");
    assert!(cursor.next(&tree).is_none());

    cursor.restart();
    assert_eq!(cursor.next(&tree).unwrap().path(), "a");
    tree.remove("b").unwrap();
    assert!(cursor.next(&tree).is_none());
}

#[test]
fn test_rename_moves_subtree() {
    let mut tree = sample_tree();
    tree.rename("src", "app").unwrap();

    assert!(!tree.contains("src"));
    assert!(!tree.contains("src/lib/util.rs"));
    assert_eq!(
        paths(tree.descendants("app")),
        vec!["app/lib", "app/lib/util.rs", "app/main.rs"]
    );
    assert_eq!(tree.get("app/main.rs").unwrap().content, "fn main() {}");
    assert_eq!(tree.len(), 7);
}

#[test]
fn test_rename_rejections_leave_tree_untouched() {
    let mut tree = sample_tree();
    let before = tree.len();

    assert!(tree.rename("src", "src/lib/inner").is_err());
    assert!(tree.rename("src", "docs").is_err());
    assert!(tree.rename("src", "missing/dir").is_err());
    assert!(tree.rename(ROOT_PATH, "x").is_err());
    assert!(matches!(
        tree.rename("nope", "x"),
        Err(StoreError::NotFound { .. })
    ));

    assert_eq!(tree.len(), before);
    assert!(tree.contains("src/lib/util.rs"));
}

#[test]
fn test_remove_subtree() {
    let mut tree = sample_tree();
    let removed = tree.remove("src").unwrap();
    assert_eq!(removed.len(), 4);
    assert!(!tree.contains("src/main.rs"));
    assert_eq!(paths(tree.children(ROOT_PATH).unwrap()), vec!["docs", "README.md"]);
    assert!(tree.remove(ROOT_PATH).is_err());
}

#[test]
fn test_file_patch_from_json() {
    let patch = FilePatch::from_json(serde_json::json!({
        "content": "x",
        "isSynced": false,
        "vcsStatus": "MODIFIED"
    }))
    .unwrap();
    assert_eq!(patch.content.as_deref(), Some("x"));
    assert_eq!(patch.is_synced, Some(false));
    assert_eq!(patch.vcs_status, Some(VcsStatus::Modified));

    let err = FilePatch::from_json(serde_json::json!({ "displayName": 5 })).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}
