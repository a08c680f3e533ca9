//! Tests for pull-based evaluation of compute callbacks.
mod common;
use common::*;
use renketsu::evaluator::{Evaluator, evaluate};
use renketsu::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn test_evaluate_pulls_upstream_values() {
    let mut session = create_session();
    let (_, _, sum) = build_sum(&mut session);

    session.evaluate(sum).unwrap();
    assert_eq!(value_of(session.graph(), sum, "a"), TypedValue::new(2.0f32));
    assert_eq!(value_of(session.graph(), sum, "b"), TypedValue::new(3.0f32));
    assert_eq!(value_of(session.graph(), sum, "out"), TypedValue::new(5.0f32));
}

#[test]
fn test_evaluation_is_not_recorded() {
    let mut session = create_session();
    let (_, _, sum) = build_sum(&mut session);
    let history = session.undo_stack().len();

    session.evaluate(sum).unwrap();
    assert_eq!(session.undo_stack().len(), history);
}

#[test]
fn test_void_ports_carry_any_type() {
    let mut session = create_session();
    let (_, _, sum) = build_sum(&mut session);
    let through = add_node(&mut session, "util/passthrough", "through");
    let print = add_node(&mut session, "sink/print", "print");
    session.connect_by_name(sum, "out", through, "in");
    session.connect_by_name(through, "out", print, "value");

    session.evaluate(print).unwrap();
    assert_eq!(value_of(session.graph(), through, "out"), TypedValue::new(5.0f32));
    assert_eq!(
        value_of(session.graph(), print, "text"),
        TypedValue::new(String::from("5.0"))
    );
}

#[test]
fn test_each_node_computes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let counted = Metadata::builder("test/counted")
        .output("out", 1.0f32)
        .compute(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .build();

    let mut graph = Graph::new();
    let source = graph.add(&counted, "source").id();
    let sum = graph.add(&add_type(), "sum").id();
    let out = graph.resolve_port(source, "out", None).unwrap();
    let a = graph.resolve_port(sum, "a", None).unwrap();
    let b = graph.resolve_port(sum, "b", None).unwrap();
    graph.connect(out, a, ConnectionPolicy::Reject).unwrap();
    graph.connect(out, b, ConnectionPolicy::Reject).unwrap();

    let mut evaluator = Evaluator::new(&mut graph);
    evaluator.evaluate(sum).unwrap();
    evaluator.evaluate_all().unwrap();
    assert_eq!(evaluator.computed(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(value_of(&graph, sum, "out"), TypedValue::new(2.0f32));
}

#[test]
fn test_cycle_is_reported() {
    let mut graph = Graph::new();
    let first = graph.add(&passthrough_type(), "first").id();
    let second = graph.add(&passthrough_type(), "second").id();
    let connect = |graph: &mut Graph, from: NodeId, to: NodeId| {
        let out = graph.resolve_port(from, "out", None).unwrap();
        let input = graph.resolve_port(to, "in", None).unwrap();
        graph.connect(out, input, ConnectionPolicy::Reject).unwrap();
    };
    connect(&mut graph, first, second);
    connect(&mut graph, second, first);

    let err = evaluate(&mut graph, first).unwrap_err();
    assert_eq!(err, EvaluationError::Cycle(first));
}

#[test]
fn test_compute_failure_propagates() {
    let failing = Metadata::builder("test/failing")
        .output("out", 0.0f32)
        .compute(|ctx| Err(ctx.fail("sensor offline")))
        .build();
    let mut graph = Graph::new();
    let id = graph.add(&failing, "broken").id();

    let err = evaluate(&mut graph, id).unwrap_err();
    assert_eq!(
        err,
        EvaluationError::Compute {
            node: id,
            message: "sensor offline".to_string()
        }
    );
}

#[test]
fn test_compute_context_port_errors() {
    let strict = Metadata::builder("test/strict")
        .input("a", 0.0f32)
        .output("out", 0.0f32)
        .compute(|ctx| {
            assert!(ctx.get::<i32>("a").is_err());
            assert!(ctx.value("missing").is_err());
            // inputs cannot be written
            assert!(ctx.set("a", 1.0f32).is_err());
            assert!(ctx.set("out", String::from("text")).is_err());
            ctx.set("out", 1.0f32)
        })
        .build();
    let mut graph = Graph::new();
    let id = graph.add(&strict, "strict").id();

    evaluate(&mut graph, id).unwrap();
    assert_eq!(value_of(&graph, id, "out"), TypedValue::new(1.0f32));
}

#[test]
fn test_evaluate_inside_network() {
    let mut session = create_session();
    let net = session.create_network(None, "net").unwrap();
    let constant = meta(&session, "source/constant");
    let inner = session
        .create_node(Some(net), &constant, "inner", TypedValue::empty())
        .unwrap();
    session.set_value(inner, "value", TypedValue::new(4.0f32));

    session.evaluate(inner).unwrap();
    assert_eq!(value_of(session.graph(), inner, "out"), TypedValue::new(4.0f32));

    let ghost = NodeId::mint();
    assert_eq!(
        session.evaluate(ghost).unwrap_err(),
        EvaluationError::NodeNotFound(ghost)
    );
}
