//! Common test utilities: node types, registries and small graph helpers.
use renketsu::prelude::*;

/// `math/add`: `out = a + b` over `f32`.
#[allow(dead_code)]
pub fn add_type() -> MetadataHandle {
    Metadata::builder("math/add")
        .input("a", 0.0f32)
        .input("b", 0.0f32)
        .output("out", 0.0f32)
        .compute(|ctx| {
            let sum = *ctx.get::<f32>("a")? + *ctx.get::<f32>("b")?;
            ctx.set("out", sum)
        })
        .build()
}

/// `source/constant`: forwards its `value` input to `out`.
#[allow(dead_code)]
pub fn constant_type() -> MetadataHandle {
    Metadata::builder("source/constant")
        .input("value", 0.0f32)
        .output("out", 0.0f32)
        .compute(|ctx| {
            let value = *ctx.get::<f32>("value")?;
            ctx.set("out", value)
        })
        .build()
}

/// `sink/print`: accepts anything on its void `value` input and renders it to `text`.
#[allow(dead_code)]
pub fn print_type() -> MetadataHandle {
    Metadata::builder("sink/print")
        .void_port("value", PortCategory::Input)
        .output("text", String::new())
        .compute(|ctx| {
            let text = ctx.value("value")?.to_string();
            ctx.set("text", text)
        })
        .build()
}

/// `util/passthrough`: void in, void out.
#[allow(dead_code)]
pub fn passthrough_type() -> MetadataHandle {
    Metadata::builder("util/passthrough")
        .void_port("in", PortCategory::Input)
        .void_port("out", PortCategory::Output)
        .compute(|ctx| {
            let value = ctx.value("in")?.clone();
            ctx.set_value("out", value)
        })
        .build()
}

/// Registries holding every fixture type plus the built-in `network` type.
#[allow(dead_code)]
pub fn registries() -> (MetadataRegistry, ValueRegistry) {
    let mut metadata = MetadataRegistry::new();
    metadata.register(add_type());
    metadata.register(constant_type());
    metadata.register(print_type());
    metadata.register(passthrough_type());
    (metadata, ValueRegistry::with_defaults())
}

#[allow(dead_code)]
pub fn create_session() -> Session {
    create_session_with(SessionConfig::default())
}

#[allow(dead_code)]
pub fn create_session_with(config: SessionConfig) -> Session {
    let (metadata, values) = registries();
    Session::builder()
        .with_registries(metadata, values)
        .with_config(config)
        .build()
}

/// Looks up a registered type of the session.
#[allow(dead_code)]
pub fn meta(session: &Session, type_name: &str) -> MetadataHandle {
    session.metadata().find(type_name).unwrap()
}

/// Creates a node in the root graph.
#[allow(dead_code)]
pub fn add_node(session: &mut Session, type_name: &str, name: &str) -> NodeId {
    let metadata = meta(session, type_name);
    session
        .create_node(None, &metadata, name, TypedValue::empty())
        .unwrap()
}

/// Resolves a port of a node anywhere in the graph.
#[allow(dead_code)]
pub fn port(graph: &Graph, node: NodeId, name: &str) -> PortRef {
    graph
        .owner_of(node)
        .unwrap()
        .resolve_port(node, name, None)
        .unwrap()
}

#[allow(dead_code)]
pub fn value_of(graph: &Graph, node: NodeId, name: &str) -> TypedValue {
    graph
        .find_node(node)
        .unwrap()
        .find_port(name)
        .unwrap()
        .value()
        .clone()
}

/// Builds `constant(2) -> add.a`, `constant(3) -> add.b` in the root graph.
#[allow(dead_code)]
pub fn build_sum(session: &mut Session) -> (NodeId, NodeId, NodeId) {
    let two = add_node(session, "source/constant", "two");
    let three = add_node(session, "source/constant", "three");
    let sum = add_node(session, "math/add", "sum");
    session.set_value(two, "value", TypedValue::new(2.0f32));
    session.set_value(three, "value", TypedValue::new(3.0f32));
    session.connect_by_name(two, "out", sum, "a");
    session.connect_by_name(three, "out", sum, "b");
    (two, three, sum)
}

/// Sorted (out_node_name, out_port, in_node_name, in_port) tuples of a graph's connections.
#[allow(dead_code)]
pub fn named_connections(graph: &Graph) -> Vec<(String, String, String, String)> {
    let name_of = |id: NodeId| graph.node(id).unwrap().name().to_string();
    let port_of = |p: PortRef| graph.port(p).unwrap().name().to_string();
    let mut connections: Vec<_> = graph
        .connections()
        .iter()
        .map(|(from, to)| (name_of(from.node), port_of(from), name_of(to.node), port_of(to)))
        .collect();
    connections.sort();
    connections
}
