// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host engine collaborator interfaces.
//!
//! Graphs never see the engine's scene graph directly. They reach entities
//! through [`SceneObject`] (named properties by dotted path, named methods)
//! and the scene through [`HostScene`] (lookup, frame/ready/keyboard
//! observables).

pub mod memory;
pub mod observable;
pub mod property_path;

pub use observable::{Observable, ObserverId};
pub use property_path::PropertyPath;

use crate::error::HostError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Target path token for the entity the graph is attached to
pub const SELF_TARGET: &str = "Self";

/// Target path token for the scene itself
pub const SCENE_TARGET: &str = "Scene";

/// Kind of host entity, used to scope the node palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Renderable mesh
    Mesh,
    /// Light source
    Light,
    /// Camera
    Camera,
    /// Plain transform node
    TransformNode,
    /// The scene itself
    Scene,
}

/// An entity exposed by the host engine
pub trait SceneObject {
    /// Entity name
    fn name(&self) -> String;

    /// Stable entity id
    fn id(&self) -> String;

    /// Entity kind
    fn kind(&self) -> EntityKind;

    /// Read a property
    fn get_property(&self, path: &PropertyPath) -> Result<Value, HostError>;

    /// Write a property
    fn set_property(&self, path: &PropertyPath, value: Value) -> Result<(), HostError>;

    /// Call a method
    fn call_method(&self, name: &str, args: &[Value]) -> Result<Option<Value>, HostError>;
}

/// Shared handle to a host entity
pub type EntityHandle = Rc<dyn SceneObject>;

/// The host scene
pub trait HostScene: SceneObject {
    /// Find an entity by name
    fn find_entity(&self, name: &str) -> Option<EntityHandle>;

    /// Find an entity by id
    fn find_entity_by_id(&self, id: &str) -> Option<EntityHandle>;

    /// All entities, in scene order
    fn entities(&self) -> Vec<EntityHandle>;

    /// Fired after each rendered frame
    fn after_render(&self) -> &Observable<FrameInfo>;

    /// Fired once when the scene is ready
    fn ready(&self) -> &Observable<()>;

    /// Whether the ready notification already happened
    fn is_ready(&self) -> bool;

    /// Keyboard input
    fn keyboard(&self) -> &Observable<HostEvent>;

    /// The scene as a plain entity handle
    fn as_entity(self: Rc<Self>) -> EntityHandle;
}

/// Shared handle to the host scene
pub type SceneHandle = Rc<dyn HostScene>;

/// Per-frame data passed to frame observers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Seconds since the previous frame
    pub delta: f64,
}

/// Input event forwarded to graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostEvent {
    /// A key was pressed
    KeyDown {
        /// Key name
        key: String,
    },
    /// A key was released
    KeyUp {
        /// Key name
        key: String,
    },
}

impl HostEvent {
    /// Key involved in a keyboard event
    pub fn key(&self) -> &str {
        match self {
            Self::KeyDown { key } | Self::KeyUp { key } => key,
        }
    }
}

/// The entity a graph is attached to and its scene
#[derive(Clone)]
pub struct HostContext {
    /// Attached entity
    pub target: EntityHandle,
    /// Scene
    pub scene: SceneHandle,
}

impl HostContext {
    /// Create a context for a graph attached to `target`
    pub fn new(target: EntityHandle, scene: SceneHandle) -> Self {
        Self { target, scene }
    }

    /// Create a context for a graph attached to the scene itself
    pub fn for_scene(scene: SceneHandle) -> Self {
        Self {
            target: scene.clone().as_entity(),
            scene,
        }
    }

    /// Resolve a target path: `"Self"`, `"Scene"` or an entity name
    pub fn resolve_target(&self, path: &str) -> Option<EntityHandle> {
        match path {
            "" | SELF_TARGET => Some(self.target.clone()),
            SCENE_TARGET => Some(self.scene.clone().as_entity()),
            name => self.scene.find_entity(name),
        }
    }
}

impl std::fmt::Debug for HostContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostContext")
            .field("target", &self.target.name())
            .field("scene", &self.scene.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::memory::{MemoryEntity, MemoryScene};
    use super::*;

    #[test]
    fn test_resolve_target() {
        let scene = Rc::new(MemoryScene::new());
        let cube = scene.add_entity(MemoryEntity::new("cube", EntityKind::Mesh));
        scene.add_entity(MemoryEntity::new("sun", EntityKind::Light));
        let host = HostContext::new(cube, scene);

        assert_eq!(host.resolve_target(SELF_TARGET).unwrap().name(), "cube");
        assert_eq!(host.resolve_target(SCENE_TARGET).unwrap().kind(), EntityKind::Scene);
        assert_eq!(host.resolve_target("sun").unwrap().kind(), EntityKind::Light);
        assert!(host.resolve_target("moon").is_none());
    }

    #[test]
    fn test_scene_context() {
        let scene = Rc::new(MemoryScene::new());
        let host = HostContext::for_scene(scene);
        assert_eq!(host.target.kind(), EntityKind::Scene);
        assert_eq!(host.resolve_target("").unwrap().name(), SCENE_TARGET);
    }
}
