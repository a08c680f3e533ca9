use super::{PortCategory, PortDefinition};
use crate::error::{ConfigError, EvaluationError};
use crate::evaluator::ComputeContext;
use crate::value::{PortValue, TypedValue, ValueRegistry};
use ahash::AHashMap;
use itertools::Itertools;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

/// Type name of the built-in network (sub-graph) node type.
pub const NETWORK_TYPE: &str = "network";

/// A node's compute callback. The core never looks inside it.
pub type ComputeFn = Arc<dyn Fn(&mut ComputeContext<'_>) -> Result<(), EvaluationError> + Send + Sync>;

/// Shared handle to a node type template.
pub type MetadataHandle = Arc<Metadata>;

/// Template describing a node type: its name, ordered ports and optional compute callback.
pub struct Metadata {
    type_name: String,
    ports: Vec<PortDefinition>,
    compute: Option<ComputeFn>,
}

impl Metadata {
    pub fn builder(type_name: &str) -> MetadataBuilder {
        MetadataBuilder::new(type_name)
    }

    /// The built-in port-less network type.
    pub fn network() -> MetadataHandle {
        Self::builder(NETWORK_TYPE).build()
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn ports(&self) -> &[PortDefinition] {
        &self.ports
    }

    /// Looks a port up by name, returning its index and definition.
    pub fn port(&self, name: &str) -> Option<(usize, &PortDefinition)> {
        self.ports.iter().enumerate().find(|(_, p)| p.name == name)
    }

    pub fn compute(&self) -> Option<&ComputeFn> {
        self.compute.as_ref()
    }

    pub fn is_network(&self) -> bool {
        self.type_name == NETWORK_TYPE
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("type_name", &self.type_name)
            .field("ports", &self.ports)
            .field("compute", &self.compute.is_some())
            .finish()
    }
}

/// Incrementally declares a node type.
pub struct MetadataBuilder {
    type_name: String,
    ports: Vec<PortDefinition>,
    compute: Option<ComputeFn>,
}

impl MetadataBuilder {
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ports: Vec::new(),
            compute: None,
        }
    }

    pub fn input<T: PortValue>(self, name: &str, default: T) -> Self {
        self.port(name, PortCategory::Input, TypedValue::new(default))
    }

    pub fn output<T: PortValue>(self, name: &str, default: T) -> Self {
        self.port(name, PortCategory::Output, TypedValue::new(default))
    }

    /// Declares an untyped port that accepts any value.
    pub fn void_port(self, name: &str, category: PortCategory) -> Self {
        self.port(name, category, TypedValue::empty())
    }

    pub fn port(mut self, name: &str, category: PortCategory, default: TypedValue) -> Self {
        self.ports.push(PortDefinition {
            name: name.to_string(),
            category,
            default,
            hint: None,
        });
        self
    }

    /// Attaches a presentation hint to the most recently declared port.
    pub fn hint(mut self, hint: &str) -> Self {
        if let Some(port) = self.ports.last_mut() {
            port.hint = Some(hint.to_string());
        }
        self
    }

    pub fn compute<F>(mut self, compute: F) -> Self
    where
        F: Fn(&mut ComputeContext<'_>) -> Result<(), EvaluationError> + Send + Sync + 'static,
    {
        self.compute = Some(Arc::new(compute));
        self
    }

    pub fn build(self) -> MetadataHandle {
        debug_assert!(
            self.ports.iter().map(|p| p.name.as_str()).all_unique(),
            "port names of '{}' must be unique",
            self.type_name
        );
        Arc::new(Metadata {
            type_name: self.type_name,
            ports: self.ports,
            compute: self.compute,
        })
    }
}

#[derive(Deserialize)]
struct TypeDefinition {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    ports: Vec<PortSpec>,
}

#[derive(Deserialize)]
struct PortSpec {
    name: String,
    category: PortCategory,
    #[serde(default, alias = "valueType")]
    value_type: Option<String>,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    hint: Option<String>,
}

/// Maps node type names to their metadata. The only extension point plugins use.
pub struct MetadataRegistry {
    entries: AHashMap<String, MetadataHandle>,
}

impl MetadataRegistry {
    /// Creates a registry holding only the built-in `network` type.
    pub fn new() -> Self {
        let mut registry = Self {
            entries: AHashMap::new(),
        };
        registry.register(Metadata::network());
        registry
    }

    /// Registers a node type, replacing any previous registration under the same name.
    pub fn register(&mut self, metadata: MetadataHandle) -> Option<MetadataHandle> {
        self.entries
            .insert(metadata.type_name().to_string(), metadata)
    }

    pub fn find(&self, type_name: &str) -> Option<MetadataHandle> {
        self.entries.get(type_name).cloned()
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// The registered network type.
    pub fn network(&self) -> MetadataHandle {
        self.find(NETWORK_TYPE).unwrap_or_else(Metadata::network)
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registers port-only node types from a JSON list of type definitions.
    ///
    /// ```json
    /// [{ "type": "math/add", "ports": [
    ///     { "name": "a", "category": "input", "value_type": "float", "default": 0.0, "hint": "slider" },
    ///     { "name": "out", "category": "output", "value_type": "float" }
    /// ]}]
    /// ```
    ///
    /// A port without `value_type` is a void port. Returns the number of registered types.
    pub fn load_definitions(
        &mut self,
        json: &str,
        values: &ValueRegistry,
    ) -> Result<usize, ConfigError> {
        let definitions: Vec<TypeDefinition> = serde_json::from_str(json)?;
        let count = definitions.len();

        for definition in definitions {
            let mut builder = Metadata::builder(&definition.type_name);
            for spec in definition.ports {
                let default = match &spec.value_type {
                    None => TypedValue::empty(),
                    Some(value_type) => {
                        let value = match &spec.default {
                            Some(json) => values.from_json(value_type, json),
                            None => values.create(value_type),
                        };
                        value.map_err(|e| ConfigError::Definition {
                            type_name: definition.type_name.clone(),
                            message: format!("port '{}': {}", spec.name, e),
                        })?
                    }
                };
                builder = builder.port(&spec.name, spec.category, default);
                if let Some(hint) = &spec.hint {
                    builder = builder.hint(hint);
                }
            }
            self.register(builder.build());
        }

        Ok(count)
    }
}

impl Default for MetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}
