// SPDX-License-Identifier: MIT OR Apache-2.0
//! Behavior graph metadata persisted with a scene.
//!
//! Graph documents live in one list keyed by generated id; entities refer to
//! them through binding lists. Older editors saved a flat list of entities
//! each embedding its graphs, which is migrated on load.

use crate::document::GraphDocument;
use crate::error::Result;
use crate::graph::Variable;
use crate::host::{EntityHandle, EntityKind, SCENE_TARGET};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a stored graph document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(pub String);

impl GraphId {
    /// Generate a new random id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GraphId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A stored graph document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    /// Document id
    pub id: GraphId,
    /// Display name
    pub name: String,
    /// The graph
    pub graph: GraphDocument,
    /// Variable values overriding the ones saved in the graph
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<Variable>>,
}

impl GraphData {
    /// Create a stored document with a fresh id
    pub fn new(name: impl Into<String>, graph: GraphDocument) -> Self {
        Self {
            id: GraphId::new(),
            name: name.into(),
            graph,
            variables: None,
        }
    }
}

/// One graph bound to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    /// Bound document
    pub graph_id: GraphId,
    /// Whether the graph runs
    pub active: bool,
}

/// Reference to a scene entity, or the scene itself
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityRef {
    /// The scene
    Scene,
    /// An entity, by name and optionally by id
    Entity {
        /// Entity name at save time
        name: String,
        /// Stable entity id
        id: Option<String>,
    },
}

impl EntityRef {
    /// Reference an entity by name only
    pub fn named(name: impl Into<String>) -> Self {
        Self::Entity {
            name: name.into(),
            id: None,
        }
    }

    /// Reference a live entity by name and id
    pub fn of(entity: &EntityHandle) -> Self {
        if entity.kind() == EntityKind::Scene {
            return Self::Scene;
        }
        Self::Entity {
            name: entity.name(),
            id: Some(entity.id()),
        }
    }

    /// Check if both references point at the same entity.
    ///
    /// Ids are compared when both sides have one, names otherwise.
    pub fn refers_to(&self, other: &EntityRef) -> bool {
        match (self, other) {
            (Self::Scene, Self::Scene) => true,
            (
                Self::Entity { name, id },
                Self::Entity {
                    name: other_name,
                    id: other_id,
                },
            ) => match (id, other_id) {
                (Some(id), Some(other_id)) => id == other_id,
                _ => name == other_name,
            },
            _ => false,
        }
    }

    /// Name used in logs
    pub fn name(&self) -> &str {
        match self {
            Self::Scene => SCENE_TARGET,
            Self::Entity { name, .. } => name,
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Graphs bound to one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNodeBinding {
    /// Entity name, or `"Scene"`
    pub node: String,
    /// Entity id, or `"Scene"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Bound graphs, in run order
    #[serde(default)]
    pub metadatas: Vec<GraphMetadata>,
}

impl GraphNodeBinding {
    /// Create an empty binding list for an entity
    pub fn new(entity: &EntityRef) -> Self {
        match entity {
            EntityRef::Scene => Self {
                node: SCENE_TARGET.to_string(),
                node_id: Some(SCENE_TARGET.to_string()),
                metadatas: Vec::new(),
            },
            EntityRef::Entity { name, id } => Self {
                node: name.clone(),
                node_id: id.clone(),
                metadatas: Vec::new(),
            },
        }
    }

    /// Entity this binding refers to
    pub fn entity(&self) -> EntityRef {
        if self.node == SCENE_TARGET && self.node_id.as_deref().map_or(true, |id| id == SCENE_TARGET) {
            return EntityRef::Scene;
        }
        EntityRef::Entity {
            name: self.node.clone(),
            id: self.node_id.clone(),
        }
    }

    /// Check if this binding belongs to an entity
    pub fn matches(&self, entity: &EntityRef) -> bool {
        self.entity().refers_to(entity)
    }

    /// Get the metadata for a graph
    pub fn metadata(&self, graph_id: &GraphId) -> Option<&GraphMetadata> {
        self.metadatas.iter().find(|m| m.graph_id == *graph_id)
    }
}

/// Everything the behavior graph extension saves with a scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorGraphMetadata {
    /// Graph documents
    #[serde(default)]
    pub graphs: Vec<GraphData>,
    /// Bindings, one per entity
    #[serde(default)]
    pub nodes: Vec<GraphNodeBinding>,
}

/// Binding list as saved by older editors
#[derive(Debug, Deserialize)]
struct LegacyBinding {
    node: String,
    #[serde(default, rename = "nodeId")]
    node_id: Option<String>,
    #[serde(default)]
    metadatas: Vec<LegacyMetadata>,
}

/// Graph embedded in a legacy binding
#[derive(Debug, Deserialize)]
struct LegacyMetadata {
    name: String,
    graph: GraphDocument,
    #[serde(default = "default_active")]
    active: bool,
}

fn default_active() -> bool {
    true
}

impl BehaviorGraphMetadata {
    /// Parse saved metadata from JSON, migrating the legacy shape
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Read saved metadata, migrating the legacy flat-list shape.
    ///
    /// Every embedded legacy graph gets its own new id, even when several
    /// entities embedded identical graphs. Graphs written by a newer editor
    /// are kept so they survive a save, but never attach.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let metadata = if value.is_array() {
            let legacy: Vec<LegacyBinding> = serde_json::from_value(value)?;
            Self::migrate(legacy)
        } else {
            serde_json::from_value(value)?
        };
        for data in &metadata.graphs {
            if let Err(err) = data.graph.check_version() {
                tracing::warn!(graph = %data.id, name = %data.name, "Graph won't attach: {err}");
            }
        }
        Ok(metadata)
    }

    fn migrate(legacy: Vec<LegacyBinding>) -> Self {
        let mut metadata = Self::default();
        for binding in legacy {
            let mut migrated = GraphNodeBinding {
                node: binding.node,
                node_id: binding.node_id,
                metadatas: Vec::new(),
            };
            for embedded in binding.metadatas {
                let data = GraphData::new(embedded.name, embedded.graph);
                migrated.metadatas.push(GraphMetadata {
                    graph_id: data.id.clone(),
                    active: embedded.active,
                });
                metadata.graphs.push(data);
            }
            metadata.nodes.push(migrated);
        }
        tracing::info!(
            graphs = metadata.graphs.len(),
            entities = metadata.nodes.len(),
            "Migrated legacy behavior graph metadata"
        );
        metadata
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Get a graph document
    pub fn graph(&self, graph_id: &GraphId) -> Option<&GraphData> {
        self.graphs.iter().find(|g| g.id == *graph_id)
    }

    /// Get a graph document mutably
    pub fn graph_mut(&mut self, graph_id: &GraphId) -> Option<&mut GraphData> {
        self.graphs.iter_mut().find(|g| g.id == *graph_id)
    }

    /// Get an entity's binding list
    pub fn binding(&self, entity: &EntityRef) -> Option<&GraphNodeBinding> {
        self.nodes.iter().find(|b| b.matches(entity))
    }

    /// Get an entity's binding list mutably
    pub fn binding_mut(&mut self, entity: &EntityRef) -> Option<&mut GraphNodeBinding> {
        self.nodes.iter_mut().find(|b| b.matches(entity))
    }

    /// Get an entity's binding list, creating an empty one if needed
    pub fn binding_or_insert(&mut self, entity: &EntityRef) -> &mut GraphNodeBinding {
        let index = match self.nodes.iter().position(|b| b.matches(entity)) {
            Some(index) => index,
            None => {
                self.nodes.push(GraphNodeBinding::new(entity));
                self.nodes.len() - 1
            }
        };
        &mut self.nodes[index]
    }

    /// Remove a graph document and every binding that points at it
    pub fn remove_graph(&mut self, graph_id: &GraphId) -> Option<GraphData> {
        let index = self.graphs.iter().position(|g| g.id == *graph_id)?;
        for binding in &mut self.nodes {
            binding.metadatas.retain(|m| m.graph_id != *graph_id);
        }
        Some(self.graphs.remove(index))
    }

    /// Remove an entity's binding list. Graph documents are kept.
    pub fn remove_entity(&mut self, entity: &EntityRef) -> Option<GraphNodeBinding> {
        let index = self.nodes.iter().position(|b| b.matches(entity))?;
        Some(self.nodes.remove(index))
    }

    /// Number of bindings referring to a graph
    pub fn reference_count(&self, graph_id: &GraphId) -> usize {
        self.nodes
            .iter()
            .flat_map(|b| b.metadatas.iter())
            .filter(|m| m.graph_id == *graph_id)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NodeDocument;
    use crate::node::NodeId;
    use serde_json::json;
    use std::collections::HashSet;

    fn legacy_json() -> serde_json::Value {
        let graph = json!({
            "nodes": [{ "id": 1, "type": "basic/number", "pos": [0.0, 0.0], "size": [180.0, 60.0] }],
            "links": []
        });
        json!([
            { "node": "cube", "metadatas": [
                { "name": "Spin", "graph": graph.clone(), "active": true },
                { "name": "Blink", "graph": { "nodes": [] }, "active": false }
            ]},
            { "node": "sphere", "metadatas": [
                { "name": "Spin", "graph": graph }
            ]}
        ])
    }

    #[test]
    fn test_legacy_migration() {
        let metadata = BehaviorGraphMetadata::from_value(legacy_json()).unwrap();
        assert_eq!(metadata.graphs.len(), 3);
        assert_eq!(metadata.nodes.len(), 2);

        let ids: HashSet<&GraphId> = metadata.graphs.iter().map(|g| &g.id).collect();
        assert_eq!(ids.len(), 3, "identical legacy graphs still get distinct ids");

        let cube = metadata.binding(&EntityRef::named("cube")).unwrap();
        let spin = metadata.graph(&cube.metadatas[0].graph_id).unwrap();
        assert_eq!(spin.name, "Spin");
        assert_eq!(spin.graph.nodes[0].type_path, "basic/number");
        assert!(cube.metadatas[0].active);

        let blink = metadata.graph(&cube.metadatas[1].graph_id).unwrap();
        assert_eq!(blink.name, "Blink");
        assert!(!cube.metadatas[1].active);

        let sphere = metadata.binding(&EntityRef::named("sphere")).unwrap();
        let sphere_spin = metadata.graph(&sphere.metadatas[0].graph_id).unwrap();
        assert_eq!(sphere_spin.graph, spin.graph);
        assert_ne!(sphere_spin.id, spin.id);
    }

    #[test]
    fn test_current_shape_round_trip() {
        let mut metadata = BehaviorGraphMetadata::default();
        let mut document = GraphDocument::default();
        document.nodes.push(NodeDocument {
            id: NodeId(1),
            type_path: "basic/number".to_string(),
            pos: [0.0, 0.0],
            size: [180.0, 60.0],
            mode: None,
            properties: Default::default(),
        });
        let data = GraphData::new("Spin", document);
        let id = data.id.clone();
        metadata.graphs.push(data);
        metadata
            .binding_or_insert(&EntityRef::Scene)
            .metadatas
            .push(GraphMetadata { graph_id: id, active: true });

        let json = metadata.to_json_pretty().unwrap();
        assert!(json.contains("\"graphId\""));
        assert!(json.contains("\"nodeId\": \"Scene\""));
        assert_eq!(BehaviorGraphMetadata::from_json(&json).unwrap(), metadata);
    }

    #[test]
    fn test_remove_graph_cascades() {
        let mut metadata = BehaviorGraphMetadata::from_value(legacy_json()).unwrap();
        let spin = metadata.nodes[0].metadatas[0].graph_id.clone();
        metadata.nodes[1].metadatas[0].graph_id = spin.clone();
        assert_eq!(metadata.reference_count(&spin), 2);

        metadata.remove_graph(&spin).unwrap();
        assert!(metadata.graph(&spin).is_none());
        assert_eq!(metadata.reference_count(&spin), 0);
        assert_eq!(metadata.nodes[0].metadatas.len(), 1);
        assert!(metadata.nodes[1].metadatas.is_empty());
    }

    #[test]
    fn test_remove_entity_keeps_graphs() {
        let mut metadata = BehaviorGraphMetadata::from_value(legacy_json()).unwrap();
        metadata.remove_entity(&EntityRef::named("cube")).unwrap();
        assert_eq!(metadata.nodes.len(), 1);
        assert_eq!(metadata.graphs.len(), 3);
    }

    #[test]
    fn test_binding_matches_id_before_name() {
        let binding = GraphNodeBinding::new(&EntityRef::Entity {
            name: "cube".to_string(),
            id: Some("id-1".to_string()),
        });
        assert!(binding.matches(&EntityRef::Entity {
            name: "renamed".to_string(),
            id: Some("id-1".to_string()),
        }));
        assert!(!binding.matches(&EntityRef::Entity {
            name: "cube".to_string(),
            id: Some("id-2".to_string()),
        }));
        assert!(binding.matches(&EntityRef::named("cube")));
        assert!(!binding.matches(&EntityRef::Scene));
    }

    #[test]
    fn test_newer_graph_version_kept() {
        let value = json!({
            "graphs": [
                { "id": "g", "name": "Future", "graph": { "version": 99 } },
                { "id": "h", "name": "Current", "graph": {} }
            ],
            "nodes": []
        });
        let metadata = BehaviorGraphMetadata::from_value(value).unwrap();
        assert_eq!(metadata.graphs.len(), 2);
        assert!(metadata.graph(&GraphId("g".to_string())).unwrap().graph.check_version().is_err());
    }
}
