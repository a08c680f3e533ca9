//! Type-erased port values.
//!
//! A [`TypedValue`] holds exactly one value of any type implementing [`PortValue`], or
//! nothing at all. The empty state acts as a typed "void": any value can be assigned into
//! an empty slot and an empty value can be assigned over any slot, which is how unconnected
//! and disconnected void ports are modelled.
//!
//! Values are shared copy-on-reference. Once published into a port they are never mutated
//! in place; every change produces a new holder.

use crate::error::ValueError;
use serde_json::Value as JsonValue;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

mod registry;
mod types;

pub use registry::ValueRegistry;
pub use types::Position;

/// Name reported by an empty value.
pub const VOID_TYPE_NAME: &str = "void";

/// A concrete type that can be stored in a port or as node blind data.
pub trait PortValue: Any + Clone + PartialEq + fmt::Debug + Default + Send + Sync {
    /// The name this type is registered and serialized under.
    fn type_name() -> &'static str;

    /// JSON projection of the value. `None` marks the value as not saveable.
    fn to_json(&self) -> Option<JsonValue>;

    fn from_json(json: &JsonValue) -> Result<Self, ValueError>;
}

trait Holder: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn value_type_id(&self) -> TypeId;
    fn as_any(&self) -> &dyn Any;
    fn is_equal(&self, other: &dyn Holder) -> bool;
    fn debug_string(&self) -> String;
    fn to_json(&self) -> Option<JsonValue>;
    fn from_json(&self, json: &JsonValue) -> Result<Arc<dyn Holder>, ValueError>;
}

struct TypedHolder<T>(T);

impl<T: PortValue> Holder for TypedHolder<T> {
    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        &self.0
    }

    fn is_equal(&self, other: &dyn Holder) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|value| *value == self.0)
    }

    fn debug_string(&self) -> String {
        format!("{:?}", self.0)
    }

    fn to_json(&self) -> Option<JsonValue> {
        self.0.to_json()
    }

    fn from_json(&self, json: &JsonValue) -> Result<Arc<dyn Holder>, ValueError> {
        Ok(Arc::new(TypedHolder(T::from_json(json)?)))
    }
}

/// A copyable container holding one value of a registered type, or nothing.
#[derive(Clone, Default)]
pub struct TypedValue {
    holder: Option<Arc<dyn Holder>>,
}

impl TypedValue {
    pub fn new<T: PortValue>(value: T) -> Self {
        Self {
            holder: Some(Arc::new(TypedHolder(value))),
        }
    }

    /// The empty ("void") value.
    pub fn empty() -> Self {
        Self { holder: None }
    }

    pub fn is_empty(&self) -> bool {
        self.holder.is_none()
    }

    /// Registered name of the stored type, or [`VOID_TYPE_NAME`] when empty.
    pub fn type_name(&self) -> &'static str {
        self.holder
            .as_ref()
            .map_or(VOID_TYPE_NAME, |holder| holder.type_name())
    }

    pub fn is<T: PortValue>(&self) -> bool {
        self.holder
            .as_ref()
            .is_some_and(|holder| holder.value_type_id() == TypeId::of::<T>())
    }

    /// Returns the stored value.
    ///
    /// # Panics
    ///
    /// Panics if the value is empty or holds a different type. Use [`TypedValue::try_get`]
    /// to probe.
    pub fn get<T: PortValue>(&self) -> &T {
        match self.try_get::<T>() {
            Some(value) => value,
            None => panic!(
                "TypedValue::get: requested '{}', but the value holds '{}'",
                T::type_name(),
                self.type_name()
            ),
        }
    }

    pub fn try_get<T: PortValue>(&self) -> Option<&T> {
        self.holder
            .as_ref()
            .and_then(|holder| holder.as_any().downcast_ref::<T>())
    }

    /// Replaces the stored value. An empty value adopts `T`.
    ///
    /// # Panics
    ///
    /// Panics if the value is non-empty and holds a type other than `T`.
    pub fn set<T: PortValue>(&mut self, value: T) {
        assert!(
            self.is_empty() || self.is::<T>(),
            "TypedValue::set: cannot store '{}' into a value of type '{}'",
            T::type_name(),
            self.type_name()
        );
        self.holder = Some(Arc::new(TypedHolder(value)));
    }

    /// True if both values hold the same concrete type (two empty values count as the same).
    pub fn same_type(&self, other: &TypedValue) -> bool {
        match (&self.holder, &other.holder) {
            (Some(a), Some(b)) => a.value_type_id() == b.value_type_id(),
            (None, None) => true,
            _ => false,
        }
    }

    /// True if `other` may be assigned over this value: same type, or either side empty.
    pub fn is_compatible(&self, other: &TypedValue) -> bool {
        self.is_empty() || other.is_empty() || self.same_type(other)
    }

    /// Assigns another value over this one, sharing its storage.
    ///
    /// # Panics
    ///
    /// Panics if both values are non-empty and of different types.
    pub fn assign(&mut self, other: &TypedValue) {
        assert!(
            self.is_compatible(other),
            "TypedValue::assign: cannot assign '{}' over '{}'",
            other.type_name(),
            self.type_name()
        );
        self.holder = other.holder.clone();
    }

    /// Checked variant of [`TypedValue::assign`].
    pub fn try_assign(&mut self, other: &TypedValue) -> Result<(), ValueError> {
        if !self.is_compatible(other) {
            return Err(ValueError::TypeMismatch {
                expected: self.type_name().to_string(),
                found: other.type_name().to_string(),
            });
        }
        self.holder = other.holder.clone();
        Ok(())
    }

    pub fn is_saveable(&self) -> bool {
        self.to_json().is_some()
    }

    pub fn to_json(&self) -> Option<JsonValue> {
        self.holder.as_ref().and_then(|holder| holder.to_json())
    }

    /// Like [`TypedValue::to_json`], but reports which type could not be written.
    pub fn try_to_json(&self) -> Result<JsonValue, ValueError> {
        self.to_json()
            .ok_or_else(|| ValueError::NotSaveable(self.type_name().to_string()))
    }

    /// Builds a new value of the same type as `self` from its JSON projection.
    pub fn with_json(&self, json: &JsonValue) -> Result<TypedValue, ValueError> {
        let holder = self.holder.as_ref().ok_or_else(|| ValueError::Deserialize {
            type_name: VOID_TYPE_NAME.to_string(),
            message: "cannot interpret JSON without a concrete type".to_string(),
        })?;
        Ok(Self {
            holder: Some(holder.from_json(json)?),
        })
    }
}

/// Value equality through the stored type. Two empty values compare equal; an empty value
/// never equals a non-empty one.
impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.holder, &other.holder) {
            (Some(a), Some(b)) => a.is_equal(b.as_ref()),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.holder {
            Some(holder) => write!(f, "{}", holder.debug_string()),
            None => write!(f, "null"),
        }
    }
}

impl fmt::Debug for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypedValue<{}>({})", self.type_name(), self)
    }
}
