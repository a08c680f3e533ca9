use super::TRACING_TARGET;
use super::document::{NodeDocument, TypedValueDocument};
use super::resolver::SourceResolver;
use crate::action::{Action, Command, Diagnostics, ValueSource};
use crate::error::{LoadError, ValueError};
use crate::graph::{ConnectionPolicy, MetadataHandle, MetadataRegistry, NETWORK_TYPE, NodeId};
use crate::value::{TypedValue, VOID_TYPE_NAME, ValueRegistry};
use ahash::AHashMap;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value as JsonValue;

/// The registries and policies a document is read against.
pub struct PasteContext<'a> {
    pub metadata: &'a MetadataRegistry,
    pub values: &'a ValueRegistry,
    pub resolver: &'a dyn SourceResolver,
    pub policy: ConnectionPolicy,
}

/// The queued result of reading a document: not yet applied to any graph.
#[derive(Debug, Default)]
pub struct PastePlan {
    pub action: Action,
    pub diagnostics: Diagnostics,
    /// Freshly minted ids of the top-level nodes the action creates.
    pub ids: Vec<NodeId>,
}

#[derive(Default)]
struct PlanBuilder {
    plan: PastePlan,
    sources: Vec<String>,
}

impl PlanBuilder {
    fn error(&mut self, message: String) {
        tracing::warn!(target: TRACING_TARGET, "{}", message);
        self.plan.diagnostics.add_error(message);
    }

    fn warning(&mut self, message: String) {
        tracing::warn!(target: TRACING_TARGET, "{}", message);
        self.plan.diagnostics.add_warning(message);
    }
}

impl<'a> PasteContext<'a> {
    /// Queues the commands that recreate `document` inside the network `target`
    /// (`None` for the root graph).
    ///
    /// Unknown node types, dangling connection references and unreadable blind data are
    /// collected as diagnostics and skipped. Only a referenced source that cannot be read or
    /// parsed fails the whole paste.
    pub fn plan(
        &self,
        target: Option<NodeId>,
        document: &NodeDocument,
    ) -> Result<PastePlan, LoadError> {
        let mut builder = PlanBuilder::default();
        let document = wrap_single_node(document);
        let mut ids = Vec::new();
        self.paste_network(&mut builder, target, &document, true, Some(&mut ids))?;
        builder.plan.ids = ids;

        tracing::debug!(
            target: TRACING_TARGET,
            steps = builder.plan.action.len(),
            nodes = builder.plan.ids.len(),
            diagnostics = builder.plan.diagnostics.len(),
            "Planned paste"
        );
        Ok(builder.plan)
    }

    /// Queues the commands that fill the existing network node `network` from the document
    /// at `path`, recording `path` as the network's source.
    pub fn plan_import(&self, network: NodeId, path: &str) -> Result<PastePlan, LoadError> {
        let mut builder = PlanBuilder::default();
        let document = NodeDocument {
            source: Some(path.to_string()),
            ..Default::default()
        };
        self.paste_network(&mut builder, Some(network), &document, false, None)?;
        builder.plan.ids.push(network);
        Ok(builder.plan)
    }

    fn paste_network(
        &self,
        builder: &mut PlanBuilder,
        target: Option<NodeId>,
        document: &NodeDocument,
        root: bool,
        mut ids: Option<&mut Vec<NodeId>>,
    ) -> Result<(), LoadError> {
        let loaded = match &document.source {
            Some(path) => Some(self.load_source(builder, path)?),
            None => None,
        };
        let content = loaded.as_ref().unwrap_or(document);

        let mut keys: AHashMap<&str, NodeId> = AHashMap::new();
        for (key, entry) in content.nodes.iter().flatten() {
            let Some(type_name) = entry.type_name.as_deref() else {
                builder.error(format!("Node '{}' has no type - skipping it.", key));
                continue;
            };
            let Some(metadata) = self.metadata.find(type_name) else {
                builder.error(format!(
                    "Unregistered node type '{}' found in the setup - maybe a missing plugin? \
                     Skipping the creation of unregistered node type.",
                    type_name
                ));
                continue;
            };

            let blind_data = self.read_blind_data(builder, key, entry);
            let id = NodeId::mint();
            keys.insert(key.as_str(), id);
            if let Some(ids) = ids.as_deref_mut() {
                ids.push(id);
            }

            let name = entry.name.as_deref().unwrap_or(key);
            let is_network = metadata.is_network();
            builder
                .plan
                .action
                .push(Command::create_node(target, id, metadata.clone(), name, blind_data));

            if is_network {
                self.paste_network(builder, Some(id), entry, false, None)?;
            } else {
                self.push_values(builder, Some(id), Some(&metadata), &entry.ports);
            }
        }

        for connection in content.connections.iter().flatten() {
            let Some(&out_node) = keys.get(connection.out_node.as_str()) else {
                builder.error(format!(
                    "Connection from a non-existing node '{}' cannot be added!",
                    connection.out_node
                ));
                continue;
            };
            let Some(&in_node) = keys.get(connection.in_node.as_str()) else {
                builder.error(format!(
                    "Connection to a non-existing node '{}' cannot be added!",
                    connection.in_node
                ));
                continue;
            };
            builder.plan.action.push(Command::connect(
                out_node,
                &connection.out_port,
                in_node,
                &connection.in_port,
                self.policy,
            ));
        }

        if let (Some(source), false, Some(network)) = (&document.source, root, target) {
            builder
                .plan
                .action
                .push(Command::set_source(network, Some(source.clone())));
        }

        // the referencing document's values win over the source's own
        let network = self.metadata.find(NETWORK_TYPE);
        if let Some(loaded) = &loaded {
            self.push_values(builder, target, network.as_ref(), &loaded.ports);
        }
        self.push_values(builder, target, network.as_ref(), &document.ports);

        if document.source.is_some() {
            builder.sources.pop();
        }
        Ok(())
    }

    fn load_source(
        &self,
        builder: &mut PlanBuilder,
        path: &str,
    ) -> Result<NodeDocument, LoadError> {
        if builder.sources.iter().any(|s| s == path) {
            return Err(LoadError::Source {
                path: path.to_string(),
                message: "the document references itself".to_string(),
            });
        }
        let text = self.resolver.read(path)?;
        let document: NodeDocument = serde_json::from_str(&text)?;
        tracing::debug!(target: TRACING_TARGET, path, "Loaded source document");
        builder.sources.push(path.to_string());
        Ok(document)
    }

    fn read_blind_data(
        &self,
        builder: &mut PlanBuilder,
        key: &str,
        entry: &NodeDocument,
    ) -> TypedValue {
        let Some(blind_data) = &entry.blind_data else {
            return TypedValue::empty();
        };
        match self.values.from_json(&blind_data.type_name, &blind_data.value) {
            Ok(value) => value,
            Err(e) => {
                builder.warning(format!(
                    "Blind data of node '{}' could not be restored: {}",
                    key, e
                ));
                TypedValue::empty()
            }
        }
    }

    fn push_values(
        &self,
        builder: &mut PlanBuilder,
        node: Option<NodeId>,
        metadata: Option<&MetadataHandle>,
        ports: &IndexMap<String, JsonValue>,
    ) {
        if ports.is_empty() {
            return;
        }
        let Some(node) = node else {
            builder.warning(format!(
                "Port values given at the document root have no node to apply to ({} ignored).",
                ports.len()
            ));
            return;
        };
        for (port, json) in ports {
            let is_void = metadata
                .and_then(|m| m.port(port))
                .is_some_and(|(_, definition)| definition.default.is_empty());
            let value = if is_void {
                match self.read_typed(json) {
                    Ok(value) => ValueSource::Typed(value),
                    Err(e) => {
                        builder.warning(format!(
                            "Value of port '{}' on {} could not be restored: {}",
                            port, node, e
                        ));
                        continue;
                    }
                }
            } else {
                ValueSource::Json(json.clone())
            };
            builder
                .plan
                .action
                .push(Command::set_value(node, port, value));
        }
    }

    /// Reads a `{type, value}` pair through the value registry.
    fn read_typed(&self, json: &JsonValue) -> Result<TypedValue, ValueError> {
        let document =
            TypedValueDocument::deserialize(json).map_err(|e| ValueError::Deserialize {
                type_name: VOID_TYPE_NAME.to_string(),
                message: e.to_string(),
            })?;
        self.values.from_json(&document.type_name, &document.value)
    }
}

/// A document describing one plain node is read as a network holding just that node.
fn wrap_single_node(document: &NodeDocument) -> NodeDocument {
    let is_single_node = document
        .type_name
        .as_deref()
        .is_some_and(|t| t != NETWORK_TYPE)
        && !document.has_content()
        && document.source.is_none();
    if !is_single_node {
        return document.clone();
    }

    let type_name = document.type_name.as_deref().unwrap_or_default();
    let key = format!("{}_0", type_name.rsplit('/').next().unwrap_or(type_name));
    NodeDocument {
        nodes: Some(IndexMap::from([(key, document.clone())])),
        ..Default::default()
    }
}
