use super::PortValue;
use crate::error::ValueError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A 2D editor position, the usual payload of node blind data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Implements `PortValue` for serde-capable types under a fixed registered name.
macro_rules! impl_port_value {
    ( $( $ty:ty => $name:expr ),* $(,)? ) => {
        $(
            impl PortValue for $ty {
                fn type_name() -> &'static str { $name }

                fn to_json(&self) -> Option<JsonValue> {
                    serde_json::to_value(self).ok()
                }

                fn from_json(json: &JsonValue) -> Result<Self, ValueError> {
                    <$ty>::deserialize(json).map_err(|e| ValueError::Deserialize {
                        type_name: $name.to_string(),
                        message: e.to_string(),
                    })
                }
            }
        )*

        /// Type names of every built-in value type, in registration order.
        pub(super) const BUILTIN_TYPE_NAMES: &[&str] = &[ $( $name ),* ];

        pub(super) fn register_builtin_types(registry: &mut super::ValueRegistry) {
            $( registry.register::<$ty>(); )*
        }
    };
}

impl_port_value! {
    f32 => "float",
    f64 => "double",
    i32 => "int",
    i64 => "int64",
    u32 => "unsigned",
    bool => "bool",
    String => "string",
    Position => "position",
}
