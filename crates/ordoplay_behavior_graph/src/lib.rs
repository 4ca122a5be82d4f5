// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior graph runtime for `OrdoPlay` Editor.
//!
//! Designers wire nodes together in the graph editor; this crate turns the
//! saved documents into live behavior attached to scene entities.
//!
//! ## Architecture
//!
//! - [`NodeRegistry`] maps `category/name` paths to [`NodeDescriptor`]s
//! - [`GraphNode`] is one placed instance of a descriptor, with properties,
//!   a typed scratch store and an [`ExecutionMode`]
//! - [`Graph`] owns nodes, links and variables, and runs the per-frame
//!   evaluation and trigger propagation
//! - [`BehaviorGraphExtension`] binds graphs to scene entities, persists the
//!   bindings as scene metadata and follows the host's frame/ready lifecycle
//!
//! The host engine is only seen through the [`host::SceneObject`] and
//! [`host::HostScene`] traits; [`host::memory`] provides an in-memory host.

pub mod value;
pub mod socket;
pub mod descriptor;
pub mod registry;
pub mod scratch;
pub mod node;
pub mod connection;
pub mod document;
pub mod graph;
pub mod execution;
pub mod settings;
pub mod host;
pub mod metadata;
pub mod extension;
pub mod nodes;
pub mod error;

pub use value::Value;
pub use socket::{InputSocket, OutputSocket, OutputSource, SocketType, SocketTypes};
pub use descriptor::{NodeDescriptor, PropertyDescriptor, TargetCapability, TriggerSource};
pub use registry::NodeRegistry;
pub use scratch::Scratch;
pub use node::{ExecutionMode, GraphNode, NodeId};
pub use connection::{Link, LinkId};
pub use document::{GraphDocument, GRAPH_FORMAT_VERSION};
pub use graph::{Graph, GraphStatus, Variable};
pub use execution::{NodeContext, TimerHandle};
pub use settings::GraphSettings;
pub use metadata::{BehaviorGraphMetadata, EntityRef, GraphData, GraphId};
pub use extension::{AttachedGraph, BehaviorGraphExtension, GraphAsset};
pub use error::{BehaviorError, HostError, RegistryError, Result};
