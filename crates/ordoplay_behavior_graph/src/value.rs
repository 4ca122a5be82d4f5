// SPDX-License-Identifier: MIT OR Apache-2.0
//! Values that flow through sockets, properties and variables.

use crate::socket::SocketType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Socket type name used for entity references
pub const ENTITY_TYPE: &str = "entity";

/// Value that can be stored in a socket, property or variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
    /// 2D vector
    Vec2([f64; 2]),
    /// 3D vector
    Vec3([f64; 3]),
    /// 4D vector
    Vec4([f64; 4]),
    /// RGB color
    Col3([f64; 3]),
    /// RGBA color
    Col4([f64; 4]),
    /// Scene entity, by name
    Entity(String),
}

impl Value {
    /// Get the socket type for this value
    pub fn socket_type(&self) -> SocketType {
        match self {
            Self::Number(_) => SocketType::Number,
            Self::String(_) => SocketType::String,
            Self::Boolean(_) => SocketType::Boolean,
            Self::Vec2(_) => SocketType::Vec2,
            Self::Vec3(_) => SocketType::Vec3,
            Self::Vec4(_) => SocketType::Vec4,
            Self::Col3(_) => SocketType::Col3,
            Self::Col4(_) => SocketType::Col4,
            Self::Entity(_) => SocketType::Custom(ENTITY_TYPE.to_string()),
        }
    }

    /// Short type name, used in log lines
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Col3(_) => "col3",
            Self::Col4(_) => "col4",
            Self::Entity(_) => ENTITY_TYPE,
        }
    }

    /// Zero value for a socket type, if the type has one.
    ///
    /// Vector and color properties declared without a default start zeroed.
    pub fn zero(socket_type: &SocketType) -> Option<Self> {
        match socket_type {
            SocketType::Number => Some(Self::Number(0.0)),
            SocketType::String => Some(Self::String(String::new())),
            SocketType::Boolean => Some(Self::Boolean(false)),
            SocketType::Vec2 => Some(Self::Vec2([0.0; 2])),
            SocketType::Vec3 => Some(Self::Vec3([0.0; 3])),
            SocketType::Vec4 => Some(Self::Vec4([0.0; 4])),
            SocketType::Col3 => Some(Self::Col3([0.0; 3])),
            SocketType::Col4 => Some(Self::Col4([0.0; 4])),
            SocketType::Event | SocketType::Any | SocketType::Custom(_) => None,
        }
    }

    /// Get the number, if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the string, if this is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean, if this is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get the entity name, if this is an entity reference
    pub fn as_entity(&self) -> Option<&str> {
        match self {
            Self::Entity(name) => Some(name),
            _ => None,
        }
    }

    /// Truthiness as used by logic nodes
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Boolean(b) => *b,
            Self::Entity(name) => !name.is_empty(),
            Self::Vec2(_) | Self::Vec3(_) | Self::Vec4(_) | Self::Col3(_) | Self::Col4(_) => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Vec2(v) => write!(f, "({}, {})", v[0], v[1]),
            Self::Vec3(v) | Self::Col3(v) => write!(f, "({}, {}, {})", v[0], v[1], v[2]),
            Self::Vec4(v) | Self::Col4(v) => write!(f, "({}, {}, {}, {})", v[0], v[1], v[2], v[3]),
            Self::Entity(name) => write!(f, "<{name}>"),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}
