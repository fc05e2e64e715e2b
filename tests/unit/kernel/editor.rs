use super::*;
use crate::kernel::services::adapters::{HeadlessSurfaceFactory, SharedSurfaceLog, SurfaceEvent};
use crate::models::FilePatch;
use serde_json::json;

fn defaults() -> EditorOptions {
    [("tabSize", json!(4)), ("lineNumbers", json!(true))]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

fn new_store() -> (EditorStore, SharedSurfaceLog) {
    let factory = HeadlessSurfaceFactory::new();
    let log = factory.log();
    (EditorStore::new(defaults(), Box::new(factory)), log)
}

fn files_with(path: &str, content: &str) -> FileTree {
    let mut files = FileTree::new(None);
    files.upsert(path, FilePatch::file(content)).unwrap();
    files
}

fn count_events(log: &SharedSurfaceLog, pred: impl Fn(&SurfaceEvent) -> bool) -> usize {
    log.borrow().events().iter().filter(|e| pred(e)).count()
}

#[test]
fn test_create_unbound_seeds_local_content() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::with_content("hello"), TabId::new("t"), &files)
        .unwrap();

    let editor = store.get(&id).unwrap();
    assert_eq!(editor.content(&files), "hello");
    assert_eq!(editor.document_id().as_str(), "t");
    assert_eq!(log.borrow().content_of(0), Some("hello"));
    assert_eq!(log.borrow().option_of(0, "tabSize"), Some(&json!(4)));
    assert_eq!(store.effective_options(&id).unwrap(), defaults());
}

#[test]
fn test_bound_file_wins_over_initial_content() {
    let (mut store, log) = new_store();
    let files = files_with("a.rs", "fn a() {}");
    let props = EditorProps {
        content: Some("ignored".to_string()),
        ..EditorProps::for_file("a.rs")
    };
    let id = store.create(props, TabId::new("t"), &files).unwrap();

    assert_eq!(store.get(&id).unwrap().content(&files), "fn a() {}");
    assert_eq!(store.get(&id).unwrap().local_content(), "");
    assert_eq!(log.borrow().content_of(0), Some("fn a() {}"));
}

#[test]
fn test_generated_ids_are_unique() {
    let (mut store, _log) = new_store();
    let files = FileTree::new(None);
    let a = store
        .create(EditorProps::default(), TabId::new("t1"), &files)
        .unwrap();
    let b = store
        .create(EditorProps::default(), TabId::new("t2"), &files)
        .unwrap();
    assert_ne!(a, b);
    assert!(a.as_str().starts_with("editor_"));
}

#[test]
fn test_duplicate_explicit_id_rejected() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let props = EditorProps {
        id: Some(EditorId::new("e")),
        ..EditorProps::default()
    };
    store.create(props.clone(), TabId::new("t1"), &files).unwrap();
    let err = store.create(props, TabId::new("t2"), &files).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));
    assert_eq!(log.borrow().created(), 1);
}

#[test]
fn test_default_change_reaches_only_non_overriding_editors() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let plain = store
        .create(EditorProps::default(), TabId::new("t1"), &files)
        .unwrap();
    let props = EditorProps {
        options: [("tabSize".to_string(), json!(2))].into_iter().collect(),
        ..EditorProps::default()
    };
    let custom = store.create(props, TabId::new("t2"), &files).unwrap();

    assert!(store.set_default_option("tabSize", json!(8), &files));

    assert_eq!(store.effective_options(&plain).unwrap()["tabSize"], json!(8));
    assert_eq!(store.effective_options(&custom).unwrap()["tabSize"], json!(2));
    assert_eq!(log.borrow().option_of(0, "tabSize"), Some(&json!(8)));
    assert_eq!(log.borrow().option_of(1, "tabSize"), Some(&json!(2)));
    assert_eq!(
        count_events(&log, |e| matches!(e, SurfaceEvent::SetOption { surface: 1, .. })),
        0
    );
}

#[test]
fn test_unchanged_options_are_not_pushed() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();

    assert!(!store.set_default_option("tabSize", json!(4), &files));
    // Overriding with the default value changes nothing on screen.
    assert!(store.set_option(&id, "tabSize", json!(4), &files).unwrap());
    assert!(!store.set_option(&id, "tabSize", json!(4), &files).unwrap());
    assert_eq!(
        count_events(&log, |e| matches!(e, SurfaceEvent::SetOption { .. })),
        0
    );
}

#[test]
fn test_clear_option_falls_back_to_default() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();

    store.set_option(&id, "lineNumbers", json!(false), &files).unwrap();
    assert_eq!(log.borrow().option_of(0, "lineNumbers"), Some(&json!(false)));
    assert!(store.clear_option(&id, "lineNumbers", &files).unwrap());
    assert_eq!(log.borrow().option_of(0, "lineNumbers"), Some(&json!(true)));
    assert!(!store.clear_option(&id, "lineNumbers", &files).unwrap());
}

#[test]
fn test_dropped_option_is_reset_on_surface() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();
    store.set_option(&id, "mode", json!("rust"), &files).unwrap();
    store.clear_option(&id, "mode", &files).unwrap();
    assert_eq!(log.borrow().option_of(0, "mode"), Some(&Value::Null));
}

#[test]
fn test_binding_a_file_pushes_content_once() {
    let (mut store, log) = new_store();
    let mut files = files_with("a.rs", "one");
    let id = store
        .create(EditorProps::with_content("draft"), TabId::new("t"), &files)
        .unwrap();
    let pushes = |log: &SharedSurfaceLog| {
        count_events(log, |e| matches!(e, SurfaceEvent::SetContent { .. }))
    };
    assert_eq!(pushes(&log), 1);

    let update = store
        .update(&id, EditorProps::for_file("a.rs"), &files)
        .unwrap();
    assert!(update.newly_bound);
    assert!(update.changed);
    assert_eq!(pushes(&log), 2);
    assert_eq!(log.borrow().content_of(0), Some("one"));

    let again = store
        .update(&id, EditorProps::for_file("a.rs"), &files)
        .unwrap();
    assert!(!again.newly_bound);
    assert!(!again.changed);
    assert_eq!(pushes(&log), 2);

    files.upsert("a.rs", FilePatch::file("two")).unwrap();
    store.sync_bound_to("a.rs", &files);
    assert_eq!(log.borrow().content_of(0), Some("two"));
    store.sync_bound_to("a.rs", &files);
    assert_eq!(pushes(&log), 3);
}

#[test]
fn test_update_rejects_id_change_and_unknown_editor() {
    let (mut store, _log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();

    let props = EditorProps {
        id: Some(EditorId::new("other")),
        ..EditorProps::default()
    };
    assert!(matches!(
        store.update(&id, props, &files),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.update(&EditorId::new("missing"), EditorProps::default(), &files),
        Err(StoreError::NotFound { kind: "editor", .. })
    ));
}

#[test]
fn test_destroy_releases_surface_once() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();

    assert!(store.destroy(&id));
    assert!(!store.destroy(&id));
    assert_eq!(log.borrow().disposals_of(0), 1);
    assert!(store.is_empty());
}

#[test]
fn test_dropping_store_releases_every_surface() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    for tab in ["a", "b", "c"] {
        store
            .create(EditorProps::default(), TabId::new(tab), &files)
            .unwrap();
    }
    drop(store);
    assert_eq!(log.borrow().created(), 3);
    assert_eq!(log.borrow().disposed(), 3);
}

#[test]
fn test_rebind_paths_follows_renamed_directory() {
    let (mut store, _log) = new_store();
    let mut files = FileTree::new(None);
    files.upsert("src", FilePatch::directory()).unwrap();
    files.upsert("src/a.rs", FilePatch::file("a")).unwrap();
    files.upsert("srcx.rs", FilePatch::file("x")).unwrap();
    let inside = store
        .create(EditorProps::for_file("src/a.rs"), TabId::new("t1"), &files)
        .unwrap();
    let lookalike = store
        .create(EditorProps::for_file("srcx.rs"), TabId::new("t2"), &files)
        .unwrap();

    assert_eq!(store.rebind_paths("src", "lib"), 1);
    assert_eq!(store.get(&inside).unwrap().file_path(), Some("lib/a.rs"));
    assert_eq!(store.get(&lookalike).unwrap().file_path(), Some("srcx.rs"));
}

#[test]
fn test_destroyed_id_is_never_reused() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    let first = store
        .create(EditorProps::default(), TabId::new("t1"), &files)
        .unwrap();
    assert!(store.destroy(&first));
    assert!(store.is_retired(&first));

    let second = store
        .create(EditorProps::default(), TabId::new("t2"), &files)
        .unwrap();
    assert_ne!(second, first);

    let reuse = EditorProps {
        id: Some(first.clone()),
        ..EditorProps::default()
    };
    assert!(matches!(
        store.create(reuse, TabId::new("t3"), &files),
        Err(StoreError::InvalidArgument(_))
    ));
    assert_eq!(log.borrow().created(), 2);
}

#[test]
fn test_generated_id_skips_retired_explicit_id() {
    let (mut store, _log) = new_store();
    let files = FileTree::new(None);
    let props = EditorProps {
        id: Some(EditorId::new("editor_1")),
        ..EditorProps::default()
    };
    let explicit = store.create(props, TabId::new("t1"), &files).unwrap();
    store.destroy(&explicit);

    let generated = store
        .create(EditorProps::default(), TabId::new("t2"), &files)
        .unwrap();
    assert_ne!(generated.as_str(), "editor_1");
}

#[test]
fn test_git_blame_set_on_create_and_replaced_on_update() {
    let (mut store, _log) = new_store();
    let files = FileTree::new(None);
    let props = EditorProps {
        git_blame: Some(GitBlame {
            show: true,
            data: vec![json!({ "line": 1, "author": "ann" })],
        }),
        ..EditorProps::default()
    };
    let id = store.create(props, TabId::new("t"), &files).unwrap();
    assert!(store.get(&id).unwrap().git_blame().show);
    assert_eq!(store.get(&id).unwrap().git_blame().data.len(), 1);

    let hide = EditorProps {
        git_blame: Some(GitBlame::default()),
        ..EditorProps::default()
    };
    assert!(store.update(&id, hide.clone(), &files).unwrap().changed);
    assert!(!store.update(&id, hide, &files).unwrap().changed);
    assert_eq!(store.get(&id).unwrap().git_blame(), &GitBlame::default());

    // Other updates leave the blame alone.
    let blank = store
        .create(EditorProps::default(), TabId::new("t2"), &files)
        .unwrap();
    store
        .update(&blank, EditorProps::with_content("x"), &files)
        .unwrap();
    assert!(!store.get(&blank).unwrap().git_blame().show);
}

#[test]
fn test_overrides_hold_only_instance_values() {
    let (mut store, _log) = new_store();
    let files = FileTree::new(None);
    let id = store
        .create(EditorProps::default(), TabId::new("t"), &files)
        .unwrap();
    assert!(store.get(&id).unwrap().overrides().is_empty());

    store.set_option(&id, "theme", json!("dark"), &files).unwrap();
    let overrides = store.get(&id).unwrap().overrides();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides.get("theme"), Some(&json!("dark")));
    assert!(!overrides.contains_key("tabSize"));
}

#[test]
fn test_surface_events_are_tagged_with_their_surface() {
    let (mut store, log) = new_store();
    let files = FileTree::new(None);
    store
        .create(EditorProps::default(), TabId::new("t1"), &files)
        .unwrap();
    let second = store
        .create(EditorProps::default(), TabId::new("t2"), &files)
        .unwrap();
    store.set_option(&second, "theme", json!("dark"), &files).unwrap();

    assert_eq!(count_events(&log, |e| e.surface() == 0), 2);
    assert_eq!(count_events(&log, |e| e.surface() == 1), 3);
}
