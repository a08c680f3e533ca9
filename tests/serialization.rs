//! Tests for the JSON projection: writing documents and pasting them back.
mod common;
use common::*;
use renketsu::io::MemoryResolver;
use renketsu::prelude::*;
use serde_json::json;

#[test]
fn test_write_path_schema() {
    let mut session = create_session();
    build_sum(&mut session);
    let add = meta(&session, "math/add");
    let loose = session
        .create_node(None, &add, "loose", TypedValue::new(Position::new(3.0, 4.0)))
        .unwrap();
    session.set_value(loose, "a", TypedValue::new(1.5f32));

    let document = session.to_document(&Selection::new());
    let keys: Vec<_> = document.nodes.as_ref().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["constant_0", "constant_1", "add_0", "add_1"]);

    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(json["type"], "network");
    let nodes = json["nodes"].as_object().unwrap();

    assert_eq!(nodes["constant_0"]["name"], "two");
    assert_eq!(nodes["constant_0"]["type"], "source/constant");
    assert_eq!(nodes["constant_0"]["ports"], json!({"value": 2.0}));
    // connected inputs are carried by the edge list only
    assert!(nodes["add_0"].get("ports").is_none());
    assert_eq!(nodes["add_1"]["ports"], json!({"a": 1.5, "b": 0.0}));
    assert_eq!(
        nodes["add_1"]["blind_data"],
        json!({"type": "position", "value": {"x": 3.0, "y": 4.0}})
    );

    let connections = json["connections"].as_array().unwrap();
    assert_eq!(connections.len(), 2);
    assert!(connections.contains(&json!({
        "out_node": "constant_0", "out_port": "out", "in_node": "add_0", "in_port": "a"
    })));
}

#[test]
fn test_round_trip_law() {
    let mut session = create_session();
    let (_, _, sum) = build_sum(&mut session);
    let print = add_node(&mut session, "sink/print", "print");
    session.connect_by_name(sum, "out", print, "value");
    let loose = add_node(&mut session, "util/passthrough", "loose");
    session.set_value(loose, "in", TypedValue::new("hello".to_string()));
    let content = session.copy(&Selection::new()).unwrap();

    let mut restored = create_session();
    let outcome = restored.paste(None, &content).unwrap();
    assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
    assert_eq!(outcome.selection.len(), 5);

    assert_eq!(restored.graph().len(), session.graph().len());
    assert_eq!(
        named_connections(restored.graph()),
        named_connections(session.graph())
    );
    for (original, copy) in session.graph().iter().zip(restored.graph().iter()) {
        assert_ne!(original.id(), copy.id());
        assert_eq!(original.name(), copy.name());
        assert_eq!(original.type_name(), copy.type_name());
        for (a, b) in original.inputs().zip(copy.inputs()) {
            assert_eq!(a.value(), b.value());
        }
    }
    assert_eq!(
        restored.to_document(&Selection::new()),
        session.to_document(&Selection::new())
    );
}

#[test]
fn test_void_port_value_round_trip() {
    let mut session = create_session();
    let p = add_node(&mut session, "util/passthrough", "p");
    session.set_value(p, "in", TypedValue::new(3.0f32));
    add_node(&mut session, "math/add", "sum");

    let document = session.to_document(&Selection::new());
    let json = serde_json::to_value(&document).unwrap();
    assert_eq!(
        json["nodes"]["passthrough_0"]["ports"],
        json!({"in": {"type": "float", "value": 3.0}})
    );

    let content = session.copy(&Selection::new()).unwrap();
    let mut restored = create_session();
    let outcome = restored.paste(None, &content).unwrap();
    assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
    assert_eq!(restored.graph().len(), 2);
    let copy = restored.graph()[0].id();
    assert_eq!(value_of(restored.graph(), copy, "in"), TypedValue::new(3.0f32));
    assert_eq!(restored.to_document(&Selection::new()), document);
}

#[test]
fn test_untyped_void_port_value_is_a_warning() {
    let mut session = create_session();
    let document = json!({
        "nodes": {
            "passthrough_0": {"type": "util/passthrough", "ports": {"in": 3.0}},
            "add_0": {"type": "math/add"}
        }
    });

    let outcome = session.from_json(None, &document).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(!outcome.diagnostics.errored());
    assert_eq!(session.graph().len(), 2);
    let p = session.graph()[0].id();
    assert!(value_of(session.graph(), p, "in").is_empty());
}

#[test]
fn test_loading_twice_gives_distinct_ids() {
    let mut source = create_session();
    build_sum(&mut source);
    let document = source.to_document(&Selection::new());

    let mut first = create_session();
    let mut second = create_session();
    let a = first.paste_document(None, &document).unwrap();
    let b = second.paste_document(None, &document).unwrap();

    assert_eq!(
        first.to_document(&Selection::new()),
        second.to_document(&Selection::new())
    );
    assert!(a.selection.iter().all(|id| !b.selection.contains(id)));
}

#[test]
fn test_unregistered_type_is_skipped() {
    let mut session = Session::default();
    let outcome = session
        .from_json(None, &json!({"type": "math/add", "ports": {"a": 1}}))
        .unwrap();

    assert!(session.graph().is_empty());
    assert!(outcome.selection.is_empty());
    assert_eq!(outcome.diagnostics.len(), 1);
    let message = outcome.diagnostics.messages().next().unwrap();
    assert!(message.contains("Unregistered node type"));
    assert!(message.contains("math/add"));
    // nothing applied, nothing recorded
    assert!(session.undo_stack().is_empty());
}

#[test]
fn test_single_node_document() {
    let mut session = create_session();
    let outcome = session
        .from_json(None, &json!({"type": "math/add", "name": "solo", "ports": {"a": 1}}))
        .unwrap();

    assert!(outcome.diagnostics.is_empty());
    let id = outcome.selection.iter().next().unwrap();
    let node = session.graph().node(id).unwrap();
    assert_eq!(node.name(), "solo");
    assert_eq!(value_of(session.graph(), id, "a"), TypedValue::new(1.0f32));
}

#[test]
fn test_skipped_node_drops_its_connections() {
    let mut session = create_session();
    let document = json!({
        "nodes": {
            "constant_0": {"type": "source/constant", "name": "c"},
            "mul_0": {"type": "math/mul", "name": "m"},
            "add_0": {"type": "math/add", "name": "a"}
        },
        "connections": [
            {"out_node": "constant_0", "out_port": "out", "in_node": "mul_0", "in_port": "x"},
            {"out_node": "mul_0", "out_port": "out", "in_node": "add_0", "in_port": "a"},
            {"out_node": "constant_0", "out_port": "out", "in_node": "add_0", "in_port": "b"}
        ]
    });

    let outcome = session.from_json(None, &document).unwrap();
    assert_eq!(session.graph().len(), 2);
    assert_eq!(session.graph().connections().len(), 1);

    let messages: Vec<_> = outcome.diagnostics.messages().collect();
    assert_eq!(messages.len(), 3);
    assert!(messages[0].starts_with("Unregistered node type 'math/mul'"));
    assert_eq!(
        messages[1],
        "Connection to a non-existing node 'mul_0' cannot be added!"
    );
    assert_eq!(
        messages[2],
        "Connection from a non-existing node 'mul_0' cannot be added!"
    );
}

#[test]
fn test_paste_is_one_undo_step() {
    let mut source = create_session();
    build_sum(&mut source);
    let content = source.copy(&Selection::new()).unwrap();

    let mut session = create_session();
    session.paste(None, &content).unwrap();
    assert_eq!(session.undo_stack().len(), 1);

    session.undo().unwrap();
    assert!(session.graph().is_empty());
    session.redo().unwrap();
    assert_eq!(session.graph().len(), 3);
}

#[test]
fn test_copy_paste_twice() {
    let mut source = create_session();
    let two = add_node(&mut source, "source/constant", "two");
    let sum = add_node(&mut source, "math/add", "sum");
    source.connect_by_name(two, "out", sum, "a");
    let selection: Selection = [two, sum].into_iter().collect();
    let content = source.copy(&selection).unwrap();

    let mut session = create_session();
    let first = session.paste(None, &content).unwrap();
    let second = session.paste(None, &content).unwrap();

    assert_eq!(session.graph().len(), 4);
    assert_eq!(session.graph().connections().len(), 2);
    assert_eq!(first.selection.len(), 2);
    assert_eq!(second.selection.len(), 2);
    assert!(first.selection.iter().all(|id| !second.selection.contains(id)));
    assert!(first.selection.iter().all(|id| id != two && id != sum));

    // each pasted pair is wired within itself
    for outcome in [&first, &second] {
        for (from, to) in session.graph().connections().iter() {
            assert_eq!(
                outcome.selection.contains(from.node),
                outcome.selection.contains(to.node)
            );
        }
    }
}

#[test]
fn test_copy_drops_edges_leaving_the_selection() {
    let mut session = create_session();
    let (two, _, sum) = build_sum(&mut session);
    let selection: Selection = [two, sum].into_iter().collect();

    let document = session.to_document(&selection);
    assert_eq!(document.node_count(), 2);
    assert_eq!(document.connection_count(), 1);

    let outcome = session.paste_document(None, &document).unwrap();
    assert!(outcome.diagnostics.is_empty());
    assert_eq!(session.graph().len(), 5);
    assert_eq!(session.graph().connections().len(), 3);
}

#[test]
fn test_blind_data_round_trip() {
    let mut session = create_session();
    let add = meta(&session, "math/add");
    let id = session
        .create_node(None, &add, "sum", TypedValue::new(Position::new(-1.0, 8.0)))
        .unwrap();
    let content = session.copy(&[id].into_iter().collect()).unwrap();

    let outcome = session.paste(None, &content).unwrap();
    let pasted = outcome.selection.iter().next().unwrap();
    assert_eq!(
        session.graph().node(pasted).unwrap().blind_data_as::<Position>(),
        Some(&Position::new(-1.0, 8.0))
    );
}

#[test]
fn test_unknown_blind_data_type_is_a_warning() {
    let mut session = create_session();
    let document = json!({
        "nodes": {"add_0": {
            "type": "math/add",
            "blind_data": {"type": "editor/color", "value": [1, 0, 0]}
        }}
    });

    let outcome = session.from_json(None, &document).unwrap();
    assert_eq!(session.graph().len(), 1);
    assert!(!session.graph()[0].has_blind_data());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert!(!outcome.diagnostics.errored());
}

#[test]
fn test_bad_port_value_is_reported() {
    let mut session = create_session_with(SessionConfig::default().with_halt_on_error(false));
    let document = json!({
        "nodes": {"add_0": {"type": "math/add", "ports": {"a": "one", "b": 2}}}
    });

    let outcome = session.from_json(None, &document).unwrap();
    assert_eq!(outcome.diagnostics.len(), 1);
    let id = session.graph()[0].id();
    assert_eq!(value_of(session.graph(), id, "a"), TypedValue::new(0.0f32));
    assert_eq!(value_of(session.graph(), id, "b"), TypedValue::new(2.0f32));
}

#[test]
fn test_nested_network_round_trip() {
    let mut session = create_session();
    let net = session.create_network(None, "net").unwrap();
    let constant = meta(&session, "source/constant");
    let add = meta(&session, "math/add");
    let c = session
        .create_node(Some(net), &constant, "c", TypedValue::empty())
        .unwrap();
    let s = session
        .create_node(Some(net), &add, "s", TypedValue::empty())
        .unwrap();
    session.connect_by_name(c, "out", s, "b");
    let passthrough = meta(&session, "util/passthrough");
    let p = session
        .create_node(Some(net), &passthrough, "p", TypedValue::empty())
        .unwrap();
    session.set_value(p, "in", TypedValue::new(7i32));

    let document = session.to_document(&Selection::new());
    let inner = &document.nodes.as_ref().unwrap()["network_0"];
    assert_eq!(inner.node_count(), 3);
    assert_eq!(inner.connection_count(), 1);

    let mut restored = create_session();
    let outcome = restored.paste_document(None, &document).unwrap();
    assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
    assert_eq!(restored.graph().total_len(), 4);
    let network = restored.graph()[0].as_network();
    assert_eq!(network.graph().len(), 3);
    assert_eq!(
        network.graph()[2].find_port("in").unwrap().value(),
        &TypedValue::new(7i32)
    );
    assert_eq!(network.graph().connections().len(), 1);
    assert_eq!(restored.to_document(&Selection::new()), document);
}

#[test]
fn test_paste_into_network() {
    let mut session = create_session();
    let net = session.create_network(None, "net").unwrap();
    let outcome = session
        .from_json(Some(net), &json!({"type": "math/add"}))
        .unwrap();

    let id = outcome.selection.iter().next().unwrap();
    assert_eq!(session.graph().parent_of(id), Some(Some(net)));

    // copying inside the network scopes to the network's graph
    let document = session.to_document(&outcome.selection);
    assert_eq!(document.node_count(), 1);
}

fn sub_network() -> String {
    json!({
        "type": "network",
        "ports": {"gain": 2.0},
        "nodes": {
            "constant_0": {"type": "source/constant", "name": "c", "ports": {"value": 7.0}},
            "add_0": {"type": "math/add", "name": "s"}
        },
        "connections": [
            {"out_node": "constant_0", "out_port": "out", "in_node": "add_0", "in_port": "a"}
        ]
    })
    .to_string()
}

/// A session whose network type carries a `gain` parameter port.
fn session_with_sources() -> Session {
    let (mut metadata, values) = registries();
    metadata.register(
        Metadata::builder("network")
            .input("gain", 1.0f32)
            .build(),
    );
    Session::builder()
        .with_registries(metadata, values)
        .with_resolver(MemoryResolver::new().with_document("sub.json", &sub_network()))
        .build()
}

#[test]
fn test_network_by_reference() {
    let mut session = session_with_sources();
    let document = json!({
        "nodes": {"network_0": {"type": "network", "name": "ref", "source": "sub.json"}}
    });

    let outcome = session.from_json(None, &document).unwrap();
    assert!(outcome.diagnostics.is_empty(), "{}", outcome.diagnostics);
    let id = outcome.selection.iter().next().unwrap();
    let network = session.graph().node(id).unwrap().as_network();
    assert_eq!(network.source(), Some("sub.json"));
    assert_eq!(network.graph().len(), 2);
    assert_eq!(network.graph().connections().len(), 1);
    assert_eq!(value_of(session.graph(), id, "gain"), TypedValue::new(2.0f32));

    // written back as a reference only
    let written = session.to_document(&Selection::new());
    let entry = &written.nodes.as_ref().unwrap()["network_0"];
    assert_eq!(entry.source.as_deref(), Some("sub.json"));
    assert!(entry.nodes.is_none());
}

#[test]
fn test_referencing_values_override_the_source() {
    let mut session = session_with_sources();
    let document = json!({
        "nodes": {"network_0": {"type": "network", "source": "sub.json", "ports": {"gain": 5.0}}}
    });

    let outcome = session.from_json(None, &document).unwrap();
    let id = outcome.selection.iter().next().unwrap();
    assert_eq!(value_of(session.graph(), id, "gain"), TypedValue::new(5.0f32));
}

#[test]
fn test_missing_source_fails_the_paste() {
    let mut session = session_with_sources();
    let document = json!({
        "nodes": {"network_0": {"type": "network", "source": "gone.json"}}
    });

    let err = session.from_json(None, &document).unwrap_err();
    assert!(matches!(err, LoadError::Source { .. }));
    assert!(session.graph().is_empty());
    assert!(session.undo_stack().is_empty());
}

#[test]
fn test_self_referencing_source_fails() {
    let looping = json!({
        "nodes": {"network_0": {"type": "network", "source": "loop.json"}}
    })
    .to_string();
    let mut session = Session::builder()
        .with_resolver(MemoryResolver::new().with_document("loop.json", &looping))
        .build();

    let err = session
        .from_json(None, &json!({"type": "network", "source": "loop.json"}))
        .unwrap_err();
    assert!(matches!(err, LoadError::Source { .. }));
}

#[test]
fn test_malformed_document() {
    let mut session = create_session();
    let err = session.paste(None, "{ not json").unwrap_err();
    assert!(matches!(err, LoadError::Json(_)));
}
