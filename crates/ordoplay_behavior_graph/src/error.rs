// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the behavior graph runtime.
//!
//! Only loading, saving and editing report errors. Problems met while a
//! graph runs are logged and degrade the offending node instead.

use crate::metadata::GraphId;

/// Error when registering a node type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Path is not a lower-case `category/name` key
    #[error("Invalid node path {0:?}: expected lower-case \"<category>/<name>\"")]
    InvalidPath(String),
}

/// Error reported by the host engine collaborator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HostError {
    /// No property at the given path
    #[error("Property not found: {0}")]
    PropertyNotFound(String),

    /// No method with the given name
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// The host refused the value for this property
    #[error("Property {path} rejected a value of type {value_type}")]
    TypeRejected {
        /// Property path
        path: String,
        /// Type name of the rejected value
        value_type: String,
    },
}

/// Error when loading, saving or editing behavior graphs
#[derive(Debug, thiserror::Error)]
pub enum BehaviorError {
    /// JSON decode/encode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// RON decode failure
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document written by a newer editor
    #[error("Graph document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the document
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// No graph document with this id
    #[error("Unknown graph: {0}")]
    UnknownGraph(GraphId),

    /// Entity reference does not resolve in the scene
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Registry rejected a node type
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for behavior graph operations
pub type Result<T> = std::result::Result<T, BehaviorError>;
