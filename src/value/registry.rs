use super::types::{BUILTIN_TYPE_NAMES, register_builtin_types};
use super::{PortValue, TypedValue};
use crate::error::ValueError;
use ahash::AHashMap;
use serde_json::Value as JsonValue;

type ValueFactory = Box<dyn Fn() -> TypedValue + Send + Sync>;

/// Maps type-name strings to zero-argument value factories.
///
/// This is what lets a loader instantiate a typed slot (blind data, port overrides) from a
/// serialized type name before the concrete Rust type is known at the call site. Types are
/// registered up front, before any document using them is read.
pub struct ValueRegistry {
    factories: AHashMap<String, ValueFactory>,
}

impl ValueRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// Creates a registry with all built-in value types registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        register_builtin_types(&mut registry);
        registry
    }

    /// Registers `T` under `T::type_name()`, producing `T::default()`.
    pub fn register<T: PortValue>(&mut self) {
        self.factories.insert(
            T::type_name().to_string(),
            Box::new(|| TypedValue::new(T::default())),
        );
    }

    /// Registers a custom factory under an explicit name.
    pub fn register_factory<F>(&mut self, type_name: &str, factory: F)
    where
        F: Fn() -> TypedValue + Send + Sync + 'static,
    {
        self.factories
            .insert(type_name.to_string(), Box::new(factory));
    }

    /// Creates a default-initialised value of the named type.
    pub fn create(&self, type_name: &str) -> Result<TypedValue, ValueError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| ValueError::UnknownType(type_name.to_string()))?;
        Ok(factory())
    }

    /// Creates a value of the named type and reads its content from JSON.
    pub fn from_json(&self, type_name: &str, json: &JsonValue) -> Result<TypedValue, ValueError> {
        self.create(type_name)?.with_json(json)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Names of the types registered by [`ValueRegistry::with_defaults`].
    pub fn builtin_type_names() -> &'static [&'static str] {
        BUILTIN_TYPE_NAMES
    }
}

impl Default for ValueRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
