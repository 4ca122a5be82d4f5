// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene attachment layer.
//!
//! The extension owns the scene's [`BehaviorGraphMetadata`], turns every
//! active binding into a running [`Graph`] attached to its entity, and
//! follows the host scene's lifecycle:
//! - graphs start once the scene reports ready
//! - every rendered frame ticks each running graph
//! - keyboard input is forwarded to event nodes
//!
//! Each attachment runs its own graph instance, even when several entities
//! share one stored document.

use crate::document::GraphDocument;
use crate::error::{BehaviorError, Result};
use crate::graph::Graph;
use crate::host::{EntityHandle, EntityKind, HostContext, ObserverId, SceneHandle};
use crate::metadata::{BehaviorGraphMetadata, EntityRef, GraphData, GraphId, GraphMetadata, GraphNodeBinding};
use crate::nodes::builtin_registry;
use crate::registry::NodeRegistry;
use crate::settings::GraphSettings;
use std::cell::{Ref, RefCell};
use std::rc::Rc;

#[derive(Debug, Default)]
struct Observers {
    ready: Option<ObserverId>,
    frame: Option<ObserverId>,
    keyboard: Option<ObserverId>,
}

/// A graph instance bound to an entity of the host scene
pub struct AttachedGraph {
    graph_id: GraphId,
    entity: EntityRef,
    scene: SceneHandle,
    graph: Rc<RefCell<Graph>>,
    observers: RefCell<Observers>,
}

impl AttachedGraph {
    /// Wrap a configured graph
    pub fn new(graph_id: GraphId, entity: EntityRef, scene: SceneHandle, graph: Graph) -> Rc<Self> {
        Rc::new(Self {
            graph_id,
            entity,
            scene,
            graph: Rc::new(RefCell::new(graph)),
            observers: RefCell::new(Observers::default()),
        })
    }

    /// Stored document this instance was built from
    pub fn graph_id(&self) -> &GraphId {
        &self.graph_id
    }

    /// Entity the graph is attached to
    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    /// The running graph
    pub fn graph(&self) -> Ref<'_, Graph> {
        self.graph.borrow()
    }

    /// Check if the graph is hooked into the frame loop
    pub fn is_running(&self) -> bool {
        self.observers.borrow().frame.is_some()
    }

    /// Start the graph and hook it into the scene's frame and keyboard
    /// observables. No-op when already running.
    pub fn start(&self) {
        let mut observers = self.observers.borrow_mut();
        if observers.frame.is_some() {
            return;
        }
        if let Some(id) = observers.ready.take() {
            self.scene.ready().remove(id);
        }
        match self.graph.try_borrow_mut() {
            Ok(mut graph) => graph.start(),
            Err(_) => {
                tracing::warn!(graph = %self.graph_id, entity = %self.entity, "Graph is busy, start skipped");
                return;
            }
        }

        let graph = Rc::downgrade(&self.graph);
        observers.frame = Some(self.scene.after_render().add(move |frame| {
            let Some(graph) = graph.upgrade() else {
                return;
            };
            match graph.try_borrow_mut() {
                Ok(mut graph) => graph.tick(frame.delta),
                Err(_) => tracing::warn!("Graph is busy, frame skipped"),
            };
        }));

        let graph = Rc::downgrade(&self.graph);
        observers.keyboard = Some(self.scene.keyboard().add(move |event| {
            let Some(graph) = graph.upgrade() else {
                return;
            };
            match graph.try_borrow_mut() {
                Ok(mut graph) => graph.dispatch_event(event),
                Err(_) => tracing::warn!(key = event.key(), "Graph is busy, event dropped"),
            };
        }));

        tracing::info!(graph = %self.graph_id, entity = %self.entity, "Behavior graph started");
    }

    /// Start now if the scene is ready, otherwise once it becomes ready
    pub fn start_when_ready(self: &Rc<Self>) {
        if self.scene.is_ready() {
            self.start();
            return;
        }
        let mut observers = self.observers.borrow_mut();
        if observers.ready.is_some() || observers.frame.is_some() {
            return;
        }
        let attached = Rc::downgrade(self);
        observers.ready = Some(self.scene.ready().add_once(move |()| {
            if let Some(attached) = attached.upgrade() {
                attached.start();
            }
        }));
    }

    /// Unhook from the scene and stop the graph. No-op when stopped.
    pub fn stop(&self) {
        let mut observers = self.observers.borrow_mut();
        if let Some(id) = observers.ready.take() {
            self.scene.ready().remove(id);
        }
        if let Some(id) = observers.keyboard.take() {
            self.scene.keyboard().remove(id);
        }
        let Some(id) = observers.frame.take() else {
            return;
        };
        self.scene.after_render().remove(id);
        match self.graph.try_borrow_mut() {
            Ok(mut graph) => graph.stop(),
            Err(_) => tracing::warn!(graph = %self.graph_id, entity = %self.entity, "Graph is busy, stop skipped"),
        }
        tracing::info!(graph = %self.graph_id, entity = %self.entity, "Behavior graph stopped");
    }
}

impl Drop for AttachedGraph {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for AttachedGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedGraph")
            .field("graph_id", &self.graph_id)
            .field("entity", &self.entity)
            .field("observers", &self.observers.borrow())
            .finish()
    }
}

/// A stored graph as listed by the asset browser
#[derive(Debug, Clone, PartialEq)]
pub struct GraphAsset {
    /// Document id
    pub id: GraphId,
    /// Display name
    pub name: String,
    /// Number of entities bound to it
    pub references: usize,
}

/// Binds behavior graphs to the entities of one host scene
pub struct BehaviorGraphExtension {
    scene: SceneHandle,
    catalog: NodeRegistry,
    registry: NodeRegistry,
    settings: GraphSettings,
    metadata: BehaviorGraphMetadata,
    attached: Vec<Rc<AttachedGraph>>,
}

impl BehaviorGraphExtension {
    /// Create an extension offering the built-in node catalog
    pub fn new(scene: SceneHandle) -> Result<Self> {
        Ok(Self::with_catalog(scene, builtin_registry()?))
    }

    /// Create an extension offering a custom node catalog
    pub fn with_catalog(scene: SceneHandle, catalog: NodeRegistry) -> Self {
        Self {
            scene,
            registry: catalog.clone(),
            catalog,
            settings: GraphSettings::default(),
            metadata: BehaviorGraphMetadata::default(),
            attached: Vec::new(),
        }
    }

    /// Set the settings used for graphs built from now on
    pub fn with_settings(mut self, settings: GraphSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Host scene
    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    /// Every node kind the extension knows
    pub fn catalog(&self) -> &NodeRegistry {
        &self.catalog
    }

    /// Node kinds offered for editing, possibly scoped to an entity kind
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Current metadata
    pub fn metadata(&self) -> &BehaviorGraphMetadata {
        &self.metadata
    }

    /// Graph instances attached to entities
    pub fn attached(&self) -> &[Rc<AttachedGraph>] {
        &self.attached
    }

    /// Number of graphs hooked into the frame loop
    pub fn running_graphs(&self) -> usize {
        self.attached.iter().filter(|a| a.is_running()).count()
    }

    // ------------------------------------------------------------------
    // Scene lifecycle
    // ------------------------------------------------------------------

    /// Load saved metadata, current or legacy shape, and apply it
    pub fn on_load(&mut self, value: serde_json::Value) -> Result<usize> {
        let metadata = BehaviorGraphMetadata::from_value(value)?;
        Ok(self.on_apply(metadata))
    }

    /// Replace the metadata and attach every active binding.
    ///
    /// Bindings whose entity cannot be found are skipped with a warning.
    /// Graphs start once the scene is ready. Returns the number of attached
    /// graphs.
    pub fn on_apply(&mut self, metadata: BehaviorGraphMetadata) -> usize {
        self.stop_all();
        self.metadata = metadata;

        let mut pending = Vec::new();
        for binding in &self.metadata.nodes {
            let entity_ref = binding.entity();
            let Some(entity) = self.resolve(&entity_ref) else {
                tracing::warn!(entity = %entity_ref, "Entity not found, skipping its behavior graphs");
                continue;
            };
            for meta in binding.metadatas.iter().filter(|m| m.active) {
                pending.push((meta.graph_id.clone(), entity.clone()));
            }
        }

        for (graph_id, entity) in pending {
            match self.instantiate(&graph_id, &entity) {
                Ok(attached) => {
                    attached.start_when_ready();
                    self.attached.push(attached);
                }
                Err(err) => tracing::warn!(graph = %graph_id, entity = %entity.name(), "Skipping binding: {err}"),
            }
        }
        tracing::debug!(
            graphs = self.metadata.graphs.len(),
            attached = self.attached.len(),
            "Applied behavior graph metadata"
        );
        self.attached.len()
    }

    /// Metadata to save with the scene.
    ///
    /// Stored names and ids are refreshed from the live entities so renamed
    /// entities keep their graphs. Bindings of entities no longer in the
    /// scene are dropped, as are empty bindings.
    pub fn on_serialize(&mut self) -> BehaviorGraphMetadata {
        let bindings = std::mem::take(&mut self.metadata.nodes);
        for binding in bindings {
            if binding.metadatas.is_empty() {
                continue;
            }
            let entity_ref = binding.entity();
            let Some(entity) = self.resolve(&entity_ref) else {
                tracing::debug!(entity = %entity_ref, "Dropping bindings of removed entity");
                continue;
            };
            let mut refreshed = GraphNodeBinding::new(&EntityRef::of(&entity));
            refreshed.metadatas = binding.metadatas;
            self.metadata.nodes.push(refreshed);
        }
        self.metadata.clone()
    }

    /// Stop every attached graph and release it
    pub fn stop_all(&mut self) {
        for attached in self.attached.drain(..) {
            attached.stop();
        }
    }

    // ------------------------------------------------------------------
    // Asset browser
    // ------------------------------------------------------------------

    /// Stored graphs
    pub fn on_get_assets(&self) -> Vec<GraphAsset> {
        self.metadata
            .graphs
            .iter()
            .map(|g| GraphAsset {
                id: g.id.clone(),
                name: g.name.clone(),
                references: self.metadata.reference_count(&g.id),
            })
            .collect()
    }

    /// Store a new empty graph
    pub fn on_add_asset(&mut self, name: impl Into<String>) -> GraphId {
        let data = GraphData::new(name, GraphDocument::default());
        let id = data.id.clone();
        tracing::debug!(graph = %id, name = %data.name, "Added behavior graph");
        self.metadata.graphs.push(data);
        id
    }

    /// Delete a stored graph, every binding to it and its running instances
    pub fn on_remove_asset(&mut self, graph_id: &GraphId) -> bool {
        self.release(|a| a.graph_id == *graph_id);
        let removed = self.metadata.remove_graph(graph_id).is_some();
        if removed {
            tracing::info!(graph = %graph_id, "Removed behavior graph");
        }
        removed
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// Create an empty graph and bind it to an entity
    pub fn add_graph(&mut self, entity: &EntityHandle, name: impl Into<String>) -> GraphId {
        let id = self.on_add_asset(name);
        self.bind(&EntityRef::of(entity), &id);
        id
    }

    /// Bind an existing graph to an entity. Binding twice is a no-op.
    pub fn attach(&mut self, entity: &EntityHandle, graph_id: &GraphId) -> Result<()> {
        if self.metadata.graph(graph_id).is_none() {
            return Err(BehaviorError::UnknownGraph(graph_id.clone()));
        }
        self.bind(&EntityRef::of(entity), graph_id);
        Ok(())
    }

    fn bind(&mut self, entity: &EntityRef, graph_id: &GraphId) {
        let binding = self.metadata.binding_or_insert(entity);
        if binding.metadata(graph_id).is_none() {
            binding.metadatas.push(GraphMetadata {
                graph_id: graph_id.clone(),
                active: true,
            });
        }
    }

    /// Remove one graph from an entity's bindings, stopping its instance
    pub fn detach(&mut self, entity: &EntityRef, graph_id: &GraphId) -> bool {
        self.release(|a| a.graph_id == *graph_id && a.entity.refers_to(entity));
        let Some(binding) = self.metadata.binding_mut(entity) else {
            return false;
        };
        let before = binding.metadatas.len();
        binding.metadatas.retain(|m| m.graph_id != *graph_id);
        binding.metadatas.len() != before
    }

    /// Enable or disable a binding. Disabling stops its running instance;
    /// enabling takes effect on the next apply.
    pub fn set_active(&mut self, entity: &EntityRef, graph_id: &GraphId, active: bool) -> bool {
        if !active {
            self.release(|a| a.graph_id == *graph_id && a.entity.refers_to(entity));
        }
        let Some(meta) = self
            .metadata
            .binding_mut(entity)
            .and_then(|b| b.metadatas.iter_mut().find(|m| m.graph_id == *graph_id))
        else {
            return false;
        };
        meta.active = active;
        true
    }

    /// Rename a stored graph
    pub fn rename_graph(&mut self, graph_id: &GraphId, name: impl Into<String>) -> Result<()> {
        let data = self
            .metadata
            .graph_mut(graph_id)
            .ok_or_else(|| BehaviorError::UnknownGraph(graph_id.clone()))?;
        data.name = name.into();
        Ok(())
    }

    /// Clone a graph bound to an entity.
    ///
    /// The copy gets a new id and a `Cloned` name suffix. It is bound to the
    /// entity next to the original, with the original's active flag.
    pub fn clone_binding(&mut self, entity: &EntityRef, graph_id: &GraphId) -> Result<GraphId> {
        let source = self
            .metadata
            .graph(graph_id)
            .ok_or_else(|| BehaviorError::UnknownGraph(graph_id.clone()))?;
        let mut copy = GraphData::new(format!("{} Cloned", source.name), source.graph.clone());
        copy.variables = source.variables.clone();
        let copy_id = copy.id.clone();

        let binding = self
            .metadata
            .binding_mut(entity)
            .ok_or_else(|| BehaviorError::EntityNotFound(entity.to_string()))?;
        let active = binding
            .metadatas
            .iter()
            .find(|m| m.graph_id == *graph_id)
            .map(|m| m.active)
            .ok_or_else(|| BehaviorError::EntityNotFound(entity.to_string()))?;
        binding.metadatas.push(GraphMetadata {
            graph_id: copy_id.clone(),
            active,
        });
        self.metadata.graphs.push(copy);
        Ok(copy_id)
    }

    /// Forget every binding of an entity, stopping its instances
    pub fn remove_entity(&mut self, entity: &EntityRef) -> Option<GraphNodeBinding> {
        self.release(|a| a.entity.refers_to(entity));
        self.metadata.remove_entity(entity)
    }

    fn release(&mut self, mut matches: impl FnMut(&AttachedGraph) -> bool) {
        self.attached.retain(|attached| {
            if matches(attached) {
                attached.stop();
                false
            } else {
                true
            }
        });
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    /// Store an edited graph document
    pub fn save_graph(&mut self, graph_id: &GraphId, document: GraphDocument) -> Result<()> {
        document.check_version()?;
        let data = self
            .metadata
            .graph_mut(graph_id)
            .ok_or_else(|| BehaviorError::UnknownGraph(graph_id.clone()))?;
        data.graph = document;
        Ok(())
    }

    /// Open a stored graph for editing on an entity, scoping the editing
    /// registry to the entity's kind
    pub fn open_graph(&mut self, graph_id: &GraphId, entity: &EntityHandle) -> Result<Graph> {
        let data = self
            .metadata
            .graph(graph_id)
            .ok_or_else(|| BehaviorError::UnknownGraph(graph_id.clone()))?;
        let (name, document) = (data.name.clone(), data.graph.clone());
        self.scope_registry(entity.kind());
        Ok(Graph::from_document(name, &document, &self.registry).with_settings(self.settings.clone()))
    }

    /// Restrict the editing registry to categories usable on an entity kind.
    ///
    /// Refused while graphs are running.
    pub fn scope_registry(&mut self, kind: EntityKind) -> bool {
        if self.running_graphs() > 0 {
            tracing::warn!(?kind, "Can't re-scope node types while graphs are running");
            return false;
        }
        self.registry = self.scoped_catalog(kind);
        tracing::debug!(?kind, node_types = self.registry.len(), "Scoped node types");
        true
    }

    /// Offer the whole catalog again
    pub fn restore_registry(&mut self) {
        self.registry = self.catalog.clone();
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// The catalog without categories unusable on an entity kind
    fn scoped_catalog(&self, kind: EntityKind) -> NodeRegistry {
        let allowed: Vec<String> = self
            .catalog
            .categories_for(kind)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut registry = self.catalog.clone();
        registry.unregister_category(&allowed);
        registry
    }

    /// Resolve a stored entity reference by id, then by name
    fn resolve(&self, entity: &EntityRef) -> Option<EntityHandle> {
        match entity {
            EntityRef::Scene => Some(self.scene.clone().as_entity()),
            EntityRef::Entity { name, id } => id
                .as_deref()
                .and_then(|id| self.scene.find_entity_by_id(id))
                .or_else(|| self.scene.find_entity(name)),
        }
    }

    fn instantiate(&self, graph_id: &GraphId, entity: &EntityHandle) -> Result<Rc<AttachedGraph>> {
        let data = self
            .metadata
            .graph(graph_id)
            .ok_or_else(|| BehaviorError::UnknownGraph(graph_id.clone()))?;
        data.graph.check_version()?;

        let kind = entity.kind();
        let registry = self.scoped_catalog(kind);
        let mut graph = Graph::new(data.name.clone()).with_settings(self.settings.clone());
        graph.configure(&data.graph, &registry);
        if let Some(variables) = &data.variables {
            *graph.variables_mut() = variables.clone();
        }
        let host = if kind == EntityKind::Scene {
            HostContext::for_scene(self.scene.clone())
        } else {
            HostContext::new(entity.clone(), self.scene.clone())
        };
        graph.set_host(host);

        Ok(AttachedGraph::new(
            graph_id.clone(),
            EntityRef::of(entity),
            self.scene.clone(),
            graph,
        ))
    }
}

impl Drop for BehaviorGraphExtension {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for BehaviorGraphExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BehaviorGraphExtension")
            .field("scene", &self.scene.name())
            .field("node_types", &self.registry.len())
            .field("graphs", &self.metadata.graphs.len())
            .field("attached", &self.attached.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryEntity, MemoryScene};
    use crate::host::{HostScene, SceneObject};
    use crate::nodes::PROPERTY_PATH;
    use crate::value::Value;
    use serde_json::json;

    fn scene() -> (Rc<MemoryScene>, Rc<MemoryEntity>) {
        let scene = Rc::new(MemoryScene::new());
        let cube = scene.add_entity(
            MemoryEntity::new("cube", EntityKind::Mesh)
                .with_property("visibility", 1.0)
                .with_method("beginAnimation", |_| None),
        );
        (scene, cube)
    }

    fn handle(entity: &Rc<MemoryEntity>) -> EntityHandle {
        entity.clone()
    }

    fn visibility_document(registry: &NodeRegistry) -> GraphDocument {
        let mut graph = Graph::new("visibility");
        let number = graph.add_node(registry, "basic/number").unwrap();
        let set = graph.add_node(registry, "properties/set_property").unwrap();
        graph.node_mut(number).unwrap().set_property("Value", Value::Number(5.0));
        graph.node_mut(set).unwrap().set_property(PROPERTY_PATH, Value::from("visibility"));
        graph.connect(number, 0, set, 1).unwrap();
        graph.serialize()
    }

    #[test]
    fn test_start_waits_for_ready() {
        let (scene, cube) = scene();
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        let id = extension.add_graph(&handle(&cube), "Visibility");
        let document = visibility_document(extension.catalog());
        extension.save_graph(&id, document).unwrap();

        let metadata = extension.on_serialize();
        assert_eq!(extension.on_apply(metadata), 1);
        assert_eq!(extension.running_graphs(), 0);
        assert_eq!(scene.ready().observer_count(), 1);

        scene.render_frame(0.016);
        assert_eq!(cube.property("visibility"), Some(Value::Number(1.0)));

        scene.mark_ready();
        assert_eq!(extension.running_graphs(), 1);
        scene.render_frame(0.016);
        assert_eq!(cube.property("visibility"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_start_twice_registers_one_frame_observer() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        extension.add_graph(&handle(&cube), "Empty");
        let metadata = extension.on_serialize();
        extension.on_apply(metadata);

        let attached = extension.attached()[0].clone();
        attached.start();
        attached.start();
        assert_eq!(scene.after_render().observer_count(), 1);
        assert_eq!(scene.keyboard().observer_count(), 1);

        attached.stop();
        attached.stop();
        assert_eq!(scene.after_render().observer_count(), 0);
        assert!(!attached.graph().is_running());
    }

    #[test]
    fn test_keyboard_reaches_attached_graph() {
        let (scene, cube) = scene();
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        let mut graph = Graph::new("keys");
        let keyboard = graph.add_node(extension.catalog(), "keyboard/keyboard_down").unwrap();
        let play = graph.add_node(extension.catalog(), "animation/play_animations").unwrap();
        graph.connect(keyboard, 0, play, 0).unwrap();

        let id = extension.add_graph(&handle(&cube), "Keys");
        extension.save_graph(&id, graph.serialize()).unwrap();
        let metadata = extension.on_serialize();
        extension.on_apply(metadata);
        scene.mark_ready();

        scene.render_frame(0.016);
        scene.key_down("a");
        for _ in 0..5 {
            scene.render_frame(0.016);
        }
        assert_eq!(cube.call_count("beginAnimation"), 1);
        scene.key_down("a");
        assert_eq!(cube.call_count("beginAnimation"), 2);
    }

    #[test]
    fn test_reload_and_attach_to_renamed_entity() {
        let (scene, cube) = scene();
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        let id = extension.add_graph(&handle(&cube), "Visibility");
        let document = visibility_document(extension.catalog());
        assert_eq!(document.nodes.len(), 2);
        assert_eq!(document.links.len(), 1);
        extension.save_graph(&id, document).unwrap();
        extension.remove_entity(&EntityRef::of(&handle(&cube)));
        let saved = serde_json::to_value(extension.on_serialize()).unwrap();

        cube.rename("crate");
        let mut reloaded = BehaviorGraphExtension::new(scene.clone()).unwrap();
        assert_eq!(reloaded.on_load(saved).unwrap(), 0);
        reloaded.attach(&handle(&cube), &id).unwrap();
        let binding = reloaded.metadata().binding(&EntityRef::of(&handle(&cube))).unwrap();
        assert_eq!(binding.node, "crate");

        let metadata = reloaded.on_serialize();
        assert_eq!(reloaded.on_apply(metadata), 1);
        assert!(scene.find_entity("cube").is_none());
        scene.mark_ready();
        scene.render_frame(0.016);
        assert_eq!(cube.property("visibility"), Some(Value::Number(5.0)));
    }

    #[test]
    fn test_stale_name_resolves_by_id() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        extension.add_graph(&handle(&cube), "Empty");
        cube.rename("box");

        let metadata = extension.on_serialize();
        assert_eq!(metadata.nodes[0].node, "box");
        assert_eq!(extension.on_apply(metadata), 1);
        assert_eq!(extension.attached()[0].entity().name(), "box");
    }

    #[test]
    fn test_unresolved_entity_is_skipped() {
        let (scene, cube) = scene();
        let value = json!({
            "graphs": [{ "id": "g1", "name": "Spin", "graph": {} }],
            "nodes": [
                { "node": "ghost", "metadatas": [{ "graphId": "g1", "active": true }] },
                { "node": "cube", "metadatas": [{ "graphId": "g1", "active": true }] },
                { "node": "Scene", "nodeId": "Scene", "metadatas": [{ "graphId": "g1", "active": false }] }
            ]
        });
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        assert_eq!(extension.on_load(value).unwrap(), 1);
        assert_eq!(extension.attached()[0].entity().name(), cube.name());

        let saved = extension.on_serialize();
        assert_eq!(saved.nodes.len(), 2);
    }

    #[test]
    fn test_legacy_load() {
        let (scene, _cube) = scene();
        scene.mark_ready();
        let value = json!([
            { "node": "cube", "metadatas": [{ "name": "Spin", "graph": { "nodes": [] } }] }
        ]);
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        assert_eq!(extension.on_load(value).unwrap(), 1);
        assert_eq!(extension.running_graphs(), 1);
        assert_eq!(extension.on_get_assets()[0].name, "Spin");
        assert_eq!(extension.on_get_assets()[0].references, 1);
    }

    #[test]
    fn test_newer_graph_does_not_block_others() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let value = json!({
            "graphs": [
                { "id": "current", "name": "Current", "graph": {} },
                { "id": "future", "name": "Future", "graph": { "version": 2 } }
            ],
            "nodes": [{
                "node": "cube",
                "metadatas": [
                    { "graphId": "current", "active": true },
                    { "graphId": "future", "active": true }
                ]
            }]
        });
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        assert_eq!(extension.on_load(value).unwrap(), 1);
        assert_eq!(extension.attached()[0].graph_id().as_str(), "current");
        assert_eq!(extension.running_graphs(), 1);

        let saved = extension.on_serialize();
        assert_eq!(saved.graphs.len(), 2);
        assert_eq!(saved.binding(&EntityRef::of(&handle(&cube))).unwrap().metadatas.len(), 2);
    }

    #[test]
    fn test_remove_asset_cascades() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let sphere = scene.add_entity(MemoryEntity::new("sphere", EntityKind::Mesh));
        let mut extension = BehaviorGraphExtension::new(scene.clone()).unwrap();
        let shared = extension.add_graph(&handle(&cube), "Shared");
        extension.attach(&handle(&sphere), &shared).unwrap();
        let metadata = extension.on_serialize();
        assert_eq!(extension.on_apply(metadata), 2);
        assert_eq!(scene.after_render().observer_count(), 2);

        assert!(extension.on_remove_asset(&shared));
        assert_eq!(extension.running_graphs(), 0);
        assert_eq!(scene.after_render().observer_count(), 0);
        assert!(extension.metadata().nodes.iter().all(|b| b.metadatas.is_empty()));
        assert!(extension.on_get_assets().is_empty());
    }

    #[test]
    fn test_clone_binding_copies_document() {
        let (scene, cube) = scene();
        let sphere = scene.add_entity(MemoryEntity::new("sphere", EntityKind::Mesh));
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        let shared = extension.add_graph(&handle(&cube), "Shared");
        let document = visibility_document(extension.catalog());
        extension.save_graph(&shared, document).unwrap();
        extension.attach(&handle(&sphere), &shared).unwrap();

        let sphere_ref = EntityRef::of(&handle(&sphere));
        let copy = extension.clone_binding(&sphere_ref, &shared).unwrap();
        assert_ne!(copy, shared);
        assert_eq!(extension.metadata().reference_count(&shared), 2);
        assert_eq!(extension.metadata().reference_count(&copy), 1);
        let bound: Vec<_> = extension
            .metadata()
            .binding(&sphere_ref)
            .unwrap()
            .metadatas
            .iter()
            .map(|m| m.graph_id.clone())
            .collect();
        assert_eq!(bound, vec![shared.clone(), copy.clone()]);
        assert_eq!(extension.metadata().graph(&copy).unwrap().name, "Shared Cloned");
        assert_eq!(
            extension.metadata().graph(&copy).unwrap().graph,
            extension.metadata().graph(&shared).unwrap().graph
        );

        extension.rename_graph(&copy, "Sphere only").unwrap();
        assert_eq!(extension.metadata().graph(&copy).unwrap().name, "Sphere only");
        assert!(extension.rename_graph(&GraphId::from("missing"), "x").is_err());
    }

    #[test]
    fn test_inactive_and_detached_bindings() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        let cube_ref = EntityRef::of(&handle(&cube));
        let id = extension.add_graph(&handle(&cube), "Visibility");
        let metadata = extension.on_serialize();
        extension.on_apply(metadata);
        assert_eq!(extension.running_graphs(), 1);

        assert!(extension.set_active(&cube_ref, &id, false));
        assert_eq!(extension.running_graphs(), 0);
        let metadata = extension.on_serialize();
        assert_eq!(extension.on_apply(metadata), 0);

        assert!(extension.detach(&cube_ref, &id));
        assert!(!extension.detach(&cube_ref, &id));
        assert!(extension.on_serialize().nodes.is_empty());
    }

    #[test]
    fn test_open_graph_scopes_registry() {
        let (scene, cube) = scene();
        let sun = scene.add_entity(MemoryEntity::new("sun", EntityKind::Light));
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        let id = extension.add_graph(&handle(&cube), "Visibility");

        let graph = extension.open_graph(&id, &handle(&sun)).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert!(extension.registry().contains("light/set_intensity"));
        assert!(!extension.registry().contains("animation/play_animations"));

        extension.restore_registry();
        assert_eq!(extension.registry().len(), extension.catalog().len());
    }

    #[test]
    fn test_scoping_refused_while_running() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        extension.add_graph(&handle(&cube), "Empty");
        let metadata = extension.on_serialize();
        extension.on_apply(metadata);

        assert!(!extension.scope_registry(EntityKind::Camera));
        extension.stop_all();
        assert!(extension.scope_registry(EntityKind::Camera));
        assert!(extension.registry().contains("camera/set_fov"));
    }

    #[test]
    fn test_mesh_graph_skips_light_nodes() {
        let (scene, cube) = scene();
        scene.mark_ready();
        let mut extension = BehaviorGraphExtension::new(scene).unwrap();
        let mut graph = Graph::new("mixed");
        graph.add_node(extension.catalog(), "light/set_intensity").unwrap();
        graph.add_node(extension.catalog(), "basic/number").unwrap();
        let id = extension.add_graph(&handle(&cube), "Mixed");
        extension.save_graph(&id, graph.serialize()).unwrap();
        let metadata = extension.on_serialize();
        extension.on_apply(metadata);

        assert_eq!(extension.attached()[0].graph().node_count(), 1);
    }
}
