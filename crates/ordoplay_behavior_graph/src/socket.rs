// SPDX-License-Identifier: MIT OR Apache-2.0
//! Socket definitions for node inputs/outputs.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Data type that can flow through sockets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SocketType {
    /// Number
    Number,
    /// String
    String,
    /// Boolean
    Boolean,
    /// 2D vector
    Vec2,
    /// 3D vector
    Vec3,
    /// 4D vector
    Vec4,
    /// RGB color
    Col3,
    /// RGBA color
    Col4,
    /// Trigger signal
    Event,
    /// Any data type
    Any,
    /// Host-defined type
    Custom(String),
}

impl SocketType {
    /// Parse a single type name. Unknown names become [`SocketType::Custom`].
    pub fn parse(name: &str) -> Self {
        match name.trim() {
            "number" => Self::Number,
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "col3" => Self::Col3,
            "col4" => Self::Col4,
            "event" => Self::Event,
            "any" | "" | "*" => Self::Any,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Type name as written in documents
    pub fn as_str(&self) -> &str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Col3 => "col3",
            Self::Col4 => "col4",
            Self::Event => "event",
            Self::Any => "any",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for SocketType {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<SocketType> for String {
    fn from(value: SocketType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Union of socket types, written comma-joined (`"number,string,boolean"`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct SocketTypes(Vec<SocketType>);

impl SocketTypes {
    /// Parse a comma-joined union
    pub fn parse(types: &str) -> Self {
        let mut parsed: Vec<SocketType> = Vec::new();
        for ty in types.split(',').map(SocketType::parse) {
            if !parsed.contains(&ty) {
                parsed.push(ty);
            }
        }
        Self(parsed)
    }

    /// The event type alone
    pub fn event() -> Self {
        Self(vec![SocketType::Event])
    }

    /// The any type alone
    pub fn any() -> Self {
        Self(vec![SocketType::Any])
    }

    /// Member types
    pub fn types(&self) -> &[SocketType] {
        &self.0
    }

    /// Whether this is the event type
    pub fn is_event(&self) -> bool {
        self.0.contains(&SocketType::Event)
    }

    /// Whether this union accepts any data type
    pub fn is_any(&self) -> bool {
        self.0.contains(&SocketType::Any)
    }

    /// Check if a single type is accepted.
    ///
    /// `any` accepts every data type; `event` is only accepted by `event`.
    pub fn accepts(&self, ty: &SocketType) -> bool {
        if *ty == SocketType::Event {
            return self.is_event();
        }
        if matches!(ty, SocketType::Any) {
            return !self.is_event() || self.0.len() > 1;
        }
        self.is_any() || self.0.contains(ty)
    }

    /// Check if a value is accepted
    pub fn accepts_value(&self, value: &Value) -> bool {
        self.accepts(&value.socket_type())
    }

    /// Check if an output of these types can feed an input of `input` types
    pub fn can_connect_to(&self, input: &SocketTypes) -> bool {
        if self.is_event() || input.is_event() {
            return self.is_event() && input.is_event();
        }
        if self.is_any() || input.is_any() {
            return true;
        }
        self.0.iter().any(|ty| input.0.contains(ty))
    }
}

impl From<String> for SocketTypes {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for SocketTypes {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<SocketType> for SocketTypes {
    fn from(value: SocketType) -> Self {
        Self(vec![value])
    }
}

impl From<SocketTypes> for String {
    fn from(value: SocketTypes) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SocketTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(SocketType::as_str).collect();
        f.write_str(&names.join(","))
    }
}

/// An input socket on a node descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct InputSocket {
    /// Socket name
    pub name: String,
    /// Accepted types
    pub types: SocketTypes,
}

impl InputSocket {
    /// Create a new input socket
    pub fn new(name: impl Into<String>, types: impl Into<SocketTypes>) -> Self {
        Self {
            name: name.into(),
            types: types.into(),
        }
    }

    /// Create the unnamed "Execute" event input
    pub fn execute() -> Self {
        Self::new("", SocketTypes::event())
    }
}

/// Where an output's value comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputSource {
    /// Written by the execute callback through `set_output`
    #[default]
    Computed,
    /// Value returned by the execute callback, stored after it returns
    Return,
    /// Value of the named node property
    Property(String),
    /// Pass-through of the named input
    Input(String),
}

/// An output socket on a node descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSocket {
    /// Socket name
    pub name: String,
    /// Produced types
    pub types: SocketTypes,
    /// Value source
    pub source: OutputSource,
}

impl OutputSocket {
    /// Create a new computed output socket
    pub fn new(name: impl Into<String>, types: impl Into<SocketTypes>) -> Self {
        Self {
            name: name.into(),
            types: types.into(),
            source: OutputSource::Computed,
        }
    }

    /// Create an unnamed event output
    pub fn event() -> Self {
        Self::new("", SocketTypes::event())
    }

    /// Set the value source
    pub fn with_source(mut self, source: OutputSource) -> Self {
        self.source = source;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_parsing() {
        let types = SocketTypes::parse("number,string,boolean");
        assert_eq!(types.types().len(), 3);
        assert!(types.accepts(&SocketType::String));
        assert!(!types.accepts(&SocketType::Vec3));
        assert_eq!(types.to_string(), "number,string,boolean");
    }

    #[test]
    fn test_event_only_connects_to_event() {
        let event = SocketTypes::event();
        let any = SocketTypes::any();
        assert!(event.can_connect_to(&event));
        assert!(!event.can_connect_to(&any));
        assert!(!any.can_connect_to(&event));
        assert!(!any.accepts(&SocketType::Event));
    }

    #[test]
    fn test_any_accepts_data() {
        let any = SocketTypes::parse("");
        assert!(any.is_any());
        assert!(any.accepts_value(&Value::Vec2([1.0, 2.0])));
        assert!(SocketTypes::from(SocketType::Number).can_connect_to(&any));
    }

    #[test]
    fn test_custom_types() {
        let types = SocketTypes::parse("Node,TransformNode");
        assert!(types.accepts(&SocketType::Custom("Node".to_string())));
        assert!(types.can_connect_to(&SocketTypes::parse("TransformNode,Mesh")));
        assert!(!types.can_connect_to(&SocketTypes::parse("number")));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&SocketTypes::parse("vec3,col3")).unwrap();
        assert_eq!(json, "\"vec3,col3\"");
        let loaded: SocketTypes = serde_json::from_str(&json).unwrap();
        assert!(loaded.accepts(&SocketType::Col3));
    }
}
