use super::{NodeId, PortRef};
use crate::error::ValueError;
use crate::value::TypedValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortCategory {
    Input,
    Output,
}

impl fmt::Display for PortCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortCategory::Input => write!(f, "input"),
            PortCategory::Output => write!(f, "output"),
        }
    }
}

/// Declaration of a port in a node type's metadata.
#[derive(Debug, Clone)]
pub struct PortDefinition {
    pub name: String,
    pub category: PortCategory,
    /// Default value; its type is the port's declared type. Empty declares a void port.
    pub default: TypedValue,
    /// Optional presentation hint for host editors. Never interpreted by the core.
    pub hint: Option<String>,
}

/// A named, categorized value slot on a node.
#[derive(Debug, Clone)]
pub struct Port {
    node: NodeId,
    index: usize,
    name: String,
    category: PortCategory,
    declared: TypedValue,
    value: TypedValue,
}

impl Port {
    pub(crate) fn from_definition(node: NodeId, index: usize, definition: &PortDefinition) -> Self {
        Self {
            node,
            index,
            name: definition.name.clone(),
            category: definition.category,
            declared: definition.default.clone(),
            value: definition.default.clone(),
        }
    }

    /// Id of the owning node.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn port_ref(&self) -> PortRef {
        PortRef::new(self.node, self.index)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> PortCategory {
        self.category
    }

    pub fn value(&self) -> &TypedValue {
        &self.value
    }

    /// The default value from the metadata; carries the declared type.
    pub fn declared(&self) -> &TypedValue {
        &self.declared
    }

    pub fn is_void(&self) -> bool {
        self.declared.is_empty()
    }

    /// Accepts `value` if it is empty, the port is void, or the declared type matches.
    pub fn accepts(&self, value: &TypedValue) -> bool {
        value.is_empty() || self.declared.is_empty() || self.declared.same_type(value)
    }

    pub(crate) fn set_value(&mut self, value: TypedValue) -> Result<(), ValueError> {
        if !self.accepts(&value) {
            return Err(ValueError::TypeMismatch {
                expected: self.declared.type_name().to_string(),
                found: value.type_name().to_string(),
            });
        }
        self.value = value;
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.value = self.declared.clone();
    }
}
