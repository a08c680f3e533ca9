//! Tests for session configuration, clipboard and file operations.
mod common;
use common::*;
use renketsu::prelude::*;
use std::fs;
use std::path::PathBuf;

/// A scratch path unique to this test process.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("renketsu-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

#[test]
fn test_config_defaults() {
    let config = SessionConfig::default();
    assert!(config.halt_on_error);
    assert_eq!(config.connection_policy, ConnectionPolicy::Reject);
    assert_eq!(config.history_limit, None);
    assert_eq!(config.source_root, None);

    assert_eq!(SessionConfig::from_json("{}").unwrap(), config);
}

#[test]
fn test_config_from_file() {
    let path = scratch("config.json");
    fs::write(
        &path,
        r#"{ "halt_on_error": false, "connection_policy": "replace", "history_limit": 10 }"#,
    )
    .unwrap();

    let config = SessionConfig::from_file(&path).unwrap();
    assert!(!config.halt_on_error);
    assert_eq!(config.connection_policy, ConnectionPolicy::Replace);
    assert_eq!(config.history_limit, Some(10));

    assert!(matches!(
        SessionConfig::from_json(r#"{ "connection_policy": "merge" }"#),
        Err(ConfigError::Json(_))
    ));
    assert!(matches!(
        SessionConfig::from_file(scratch("absent.json")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_builder_registers_types() {
    let session = Session::builder()
        .with_metadata(add_type())
        .with_value_type::<Position>()
        .with_config(SessionConfig::default().with_halt_on_error(false))
        .build();

    assert!(session.metadata().contains("math/add"));
    assert!(session.metadata().contains("network"));
    assert!(session.values().contains("position"));
    assert!(!session.config().halt_on_error);
    assert!(session.graph().is_empty());
    assert!(session.clipboard().is_none());
}

#[test]
fn test_create_node_in_missing_network_fails() {
    let mut session = create_session();
    let add = meta(&session, "math/add");
    let diagnostics = session
        .create_node(Some(NodeId::mint()), &add, "lost", TypedValue::empty())
        .unwrap_err();
    assert!(diagnostics.errored());
    assert!(session.graph().is_empty());
}

#[test]
fn test_save_and_load() {
    let mut session = create_session();
    let (_, _, sum) = build_sum(&mut session);
    session.rename_node(sum, "total");
    let path = scratch("save-and-load.json");
    session.save(&path).unwrap();

    let mut restored = create_session();
    let diagnostics = restored.load(&path).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(restored.graph().len(), 3);
    assert_eq!(
        named_connections(restored.graph()),
        named_connections(session.graph())
    );
    // a load is not undoable
    assert!(restored.undo_stack().is_empty());
    assert!(!restored.undo().unwrap());
}

#[test]
fn test_evaluated_value_survives_disconnect_and_reload() {
    let mut session = create_session();
    let constant = add_node(&mut session, "source/constant", "constant");
    let print = add_node(&mut session, "sink/print", "print");
    session.set_value(constant, "value", TypedValue::new(5.0f32));
    session.connect_by_name(constant, "out", print, "value");
    session.evaluate(print).unwrap();
    session.disconnect_by_name(constant, "out", print, "value");
    assert_eq!(value_of(session.graph(), print, "value"), TypedValue::new(5.0f32));

    let path = scratch("void-after-disconnect.json");
    session.save(&path).unwrap();
    let mut restored = create_session();
    let diagnostics = restored.load(&path).unwrap();
    assert!(diagnostics.is_empty(), "{}", diagnostics);
    assert_eq!(restored.graph().len(), 2);
    let copy = restored.graph()[1].id();
    assert_eq!(value_of(restored.graph(), copy, "value"), TypedValue::new(5.0f32));
}

#[test]
fn test_load_replaces_graph() {
    let mut session = create_session();
    build_sum(&mut session);
    let path = scratch("replace.json");
    session.save(&path).unwrap();

    let first: Vec<_> = {
        session.load(&path).unwrap();
        session.graph().iter().map(|n| n.id()).collect()
    };
    let document = session.to_document(&Selection::new());
    session.load(&path).unwrap();

    assert_eq!(session.graph().len(), 3);
    assert_eq!(session.to_document(&Selection::new()), document);
    assert!(session.graph().iter().all(|n| !first.contains(&n.id())));
}

#[test]
fn test_failed_load_keeps_session() {
    let mut session = create_session();
    build_sum(&mut session);
    let history = session.undo_stack().len();

    let err = session.load(scratch("does-not-exist.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));

    let broken = scratch("broken.json");
    fs::write(&broken, "{").unwrap();
    assert!(matches!(session.load(&broken), Err(LoadError::Json(_))));

    assert_eq!(session.graph().len(), 3);
    assert_eq!(session.undo_stack().len(), history);
}

#[test]
fn test_clipboard_copy_and_paste() {
    let mut session = create_session();
    let (two, _, sum) = build_sum(&mut session);
    let selection: Selection = [two, sum].into_iter().collect();

    let content = session.copy(&selection).unwrap();
    assert_eq!(session.clipboard(), Some(content.as_str()));
    assert!(content.contains("\"out_node\": \"constant_0\""));

    let outcome = session.paste_clipboard(None).unwrap();
    assert_eq!(outcome.selection.len(), 2);
    assert_eq!(session.graph().len(), 5);
}

#[test]
fn test_paste_with_empty_clipboard() {
    let mut session = create_session();
    let outcome = session.paste_clipboard(None).unwrap();
    assert!(outcome.selection.is_empty());
    assert!(session.undo_stack().is_empty());
}

#[test]
fn test_cut_then_paste() {
    let mut session = create_session();
    let (two, three, sum) = build_sum(&mut session);
    let history = session.undo_stack().len();
    let selection: Selection = [two, three, sum].into_iter().collect();

    assert!(session.cut(&selection).unwrap().is_empty());
    assert!(session.graph().is_empty());
    assert_eq!(session.undo_stack().len(), history + 1);

    session.paste_clipboard(None).unwrap();
    assert_eq!(session.graph().len(), 3);
    assert_eq!(session.graph().connections().len(), 2);
}

#[test]
fn test_import_network() {
    let mut source = create_session();
    build_sum(&mut source);
    let path = scratch("import-source.json");
    source.save(&path).unwrap();

    let config = SessionConfig::default().with_source_root(path.parent().unwrap());
    let mut session = create_session_with(config);
    let outcome = session
        .import_network(
            None,
            "import-source.json",
            "imported",
            TypedValue::new(Position::new(1.0, 1.0)),
        )
        .unwrap();

    assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
    assert_eq!(outcome.selection.len(), 1);
    let id = outcome.selection.iter().next().unwrap();
    let node = session.graph().node(id).unwrap();
    assert_eq!(node.name(), "imported");
    assert_eq!(node.as_network().source(), Some("import-source.json"));
    assert_eq!(node.as_network().graph().len(), 3);
    assert_eq!(node.as_network().graph().connections().len(), 2);

    // one undo step removes the whole import
    assert_eq!(session.undo_stack().len(), 1);
    session.undo().unwrap();
    assert!(session.graph().is_empty());
}

#[test]
fn test_import_missing_file() {
    let mut session = create_session();
    let err = session
        .import_network(None, "/nonexistent/renketsu.json", "x", TypedValue::empty())
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(session.graph().is_empty());
}
