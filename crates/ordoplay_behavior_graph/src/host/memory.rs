// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory host scene.
//!
//! Used by the headless player and by tests in place of the real engine.
//! Entities hold nested property trees and named methods; every method call
//! is logged so callers can inspect what graphs did.

use super::{
    EntityHandle, EntityKind, FrameInfo, HostEvent, HostScene, Observable, PropertyPath,
    SceneObject, SCENE_TARGET,
};
use crate::error::HostError;
use crate::value::Value;
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use uuid::Uuid;

/// Nested property storage
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyTree {
    /// A value
    Leaf(Value),
    /// Named children
    Branch(IndexMap<String, PropertyTree>),
}

impl PropertyTree {
    /// Create an empty branch
    pub fn branch() -> Self {
        Self::Branch(IndexMap::new())
    }

    /// Walk to the node at `segments`
    pub fn get(&self, segments: &[String]) -> Option<&PropertyTree> {
        let mut current = self;
        for segment in segments {
            match current {
                Self::Branch(children) => current = children.get(segment)?,
                Self::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    fn get_mut(&mut self, segments: &[String]) -> Option<&mut PropertyTree> {
        let mut current = self;
        for segment in segments {
            match current {
                Self::Branch(children) => current = children.get_mut(segment)?,
                Self::Leaf(_) => return None,
            }
        }
        Some(current)
    }

    /// Insert a value, creating intermediate branches
    pub fn insert(&mut self, segments: &[String], value: Value) {
        let Some((leaf, parents)) = segments.split_last() else {
            *self = Self::Leaf(value);
            return;
        };
        let mut current = self;
        for segment in parents {
            if !matches!(current, Self::Branch(_)) {
                *current = Self::branch();
            }
            let Self::Branch(children) = current else {
                return;
            };
            current = children.entry(segment.clone()).or_insert_with(Self::branch);
        }
        if !matches!(current, Self::Branch(_)) {
            *current = Self::branch();
        }
        if let Self::Branch(children) = current {
            children.insert(leaf.clone(), Self::Leaf(value));
        }
    }

    /// Flatten leaves into `(dotted path, value)` pairs
    pub fn leaves(&self) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        self.collect_leaves(String::new(), &mut out);
        out
    }

    fn collect_leaves(&self, prefix: String, out: &mut Vec<(String, Value)>) {
        match self {
            Self::Leaf(value) => out.push((prefix, value.clone())),
            Self::Branch(children) => {
                for (name, child) in children {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    child.collect_leaves(path, out);
                }
            }
        }
    }
}

/// Method implementation on an in-memory entity
pub type MethodFn = Rc<dyn Fn(&[Value]) -> Option<Value>>;

/// A recorded method call
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall {
    /// Method name
    pub method: String,
    /// Arguments
    pub args: Vec<Value>,
}

/// An in-memory entity
pub struct MemoryEntity {
    id: String,
    name: RefCell<String>,
    kind: EntityKind,
    properties: RefCell<PropertyTree>,
    methods: RefCell<IndexMap<String, MethodFn>>,
    calls: RefCell<Vec<MethodCall>>,
}

impl MemoryEntity {
    /// Create an entity with a random id
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: RefCell::new(name.into()),
            kind,
            properties: RefCell::new(PropertyTree::branch()),
            methods: RefCell::new(IndexMap::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Set the id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Add a property at a dotted path
    pub fn with_property(self, path: &str, value: impl Into<Value>) -> Self {
        self.insert_property(path, value);
        self
    }

    /// Store a property at a dotted path, creating missing branches.
    ///
    /// Returns `false` when the path is malformed.
    pub fn insert_property(&self, path: &str, value: impl Into<Value>) -> bool {
        let Some(path) = PropertyPath::parse(path) else {
            return false;
        };
        self.properties.borrow_mut().insert(path.segments(), value.into());
        true
    }

    /// Add a method
    pub fn with_method(self, name: impl Into<String>, method: impl Fn(&[Value]) -> Option<Value> + 'static) -> Self {
        self.methods.borrow_mut().insert(name.into(), Rc::new(method));
        self
    }

    /// Rename the entity
    pub fn rename(&self, name: impl Into<String>) {
        *self.name.borrow_mut() = name.into();
    }

    /// Read a property by dotted path
    pub fn property(&self, path: &str) -> Option<Value> {
        let path = PropertyPath::parse(path)?;
        self.get_property(&path).ok()
    }

    /// All leaf properties as `(dotted path, value)`
    pub fn property_leaves(&self) -> Vec<(String, Value)> {
        self.properties.borrow().leaves()
    }

    /// Number of calls made to a method
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|c| c.method == method).count()
    }

    /// Every recorded call, oldest first
    pub fn calls(&self) -> Vec<MethodCall> {
        self.calls.borrow().clone()
    }
}

impl SceneObject for MemoryEntity {
    fn name(&self) -> String {
        self.name.borrow().clone()
    }

    fn id(&self) -> String {
        self.id.clone()
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn get_property(&self, path: &PropertyPath) -> Result<Value, HostError> {
        match self.properties.borrow().get(path.segments()) {
            Some(PropertyTree::Leaf(value)) => Ok(value.clone()),
            _ => Err(HostError::PropertyNotFound(path.to_string())),
        }
    }

    fn set_property(&self, path: &PropertyPath, value: Value) -> Result<(), HostError> {
        let mut properties = self.properties.borrow_mut();
        let Some(PropertyTree::Branch(owner)) = properties.get_mut(path.parent()) else {
            return Err(HostError::PropertyNotFound(path.to_string()));
        };
        if let Some(PropertyTree::Branch(_)) = owner.get(path.leaf()) {
            return Err(HostError::TypeRejected {
                path: path.to_string(),
                value_type: value.type_name().to_string(),
            });
        }
        owner.insert(path.leaf().to_string(), PropertyTree::Leaf(value));
        Ok(())
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Option<Value>, HostError> {
        let method = self
            .methods
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| HostError::MethodNotFound(name.to_string()))?;
        self.calls.borrow_mut().push(MethodCall {
            method: name.to_string(),
            args: args.to_vec(),
        });
        Ok(method(args))
    }
}

impl std::fmt::Debug for MemoryEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEntity")
            .field("id", &self.id)
            .field("name", &self.name.borrow())
            .field("kind", &self.kind)
            .finish()
    }
}

/// An in-memory scene
pub struct MemoryScene {
    root: MemoryEntity,
    entities: RefCell<Vec<Rc<MemoryEntity>>>,
    after_render: Observable<FrameInfo>,
    ready: Observable<()>,
    is_ready: Cell<bool>,
    keyboard: Observable<HostEvent>,
}

impl MemoryScene {
    /// Create an empty scene that is not ready yet
    pub fn new() -> Self {
        Self {
            root: MemoryEntity::new(SCENE_TARGET, EntityKind::Scene).with_id(SCENE_TARGET),
            entities: RefCell::new(Vec::new()),
            after_render: Observable::new(),
            ready: Observable::new(),
            is_ready: Cell::new(false),
            keyboard: Observable::new(),
        }
    }

    /// The scene's own properties and methods
    pub fn root(&self) -> &MemoryEntity {
        &self.root
    }

    /// Add an entity
    pub fn add_entity(&self, entity: MemoryEntity) -> Rc<MemoryEntity> {
        let entity = Rc::new(entity);
        self.entities.borrow_mut().push(entity.clone());
        entity
    }

    /// Remove an entity by name
    pub fn remove_entity(&self, name: &str) -> Option<Rc<MemoryEntity>> {
        let mut entities = self.entities.borrow_mut();
        let index = entities.iter().position(|e| e.name() == name)?;
        Some(entities.remove(index))
    }

    /// Get an entity by name
    pub fn entity(&self, name: &str) -> Option<Rc<MemoryEntity>> {
        self.entities.borrow().iter().find(|e| e.name() == name).cloned()
    }

    /// Mark the scene ready, notifying ready observers once
    pub fn mark_ready(&self) {
        if self.is_ready.replace(true) {
            return;
        }
        self.ready.notify(&());
    }

    /// Simulate a rendered frame
    pub fn render_frame(&self, delta: f64) {
        self.after_render.notify(&FrameInfo { delta });
    }

    /// Simulate a key press
    pub fn key_down(&self, key: &str) {
        self.keyboard.notify(&HostEvent::KeyDown { key: key.to_string() });
    }

    /// Simulate a key release
    pub fn key_up(&self, key: &str) {
        self.keyboard.notify(&HostEvent::KeyUp { key: key.to_string() });
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneObject for MemoryScene {
    fn name(&self) -> String {
        self.root.name()
    }

    fn id(&self) -> String {
        self.root.id()
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Scene
    }

    fn get_property(&self, path: &PropertyPath) -> Result<Value, HostError> {
        self.root.get_property(path)
    }

    fn set_property(&self, path: &PropertyPath, value: Value) -> Result<(), HostError> {
        self.root.set_property(path, value)
    }

    fn call_method(&self, name: &str, args: &[Value]) -> Result<Option<Value>, HostError> {
        self.root.call_method(name, args)
    }
}

impl HostScene for MemoryScene {
    fn find_entity(&self, name: &str) -> Option<EntityHandle> {
        self.entity(name).map(|e| e as EntityHandle)
    }

    fn find_entity_by_id(&self, id: &str) -> Option<EntityHandle> {
        self.entities
            .borrow()
            .iter()
            .find(|e| e.id() == id)
            .map(|e| e.clone() as EntityHandle)
    }

    fn entities(&self) -> Vec<EntityHandle> {
        self.entities
            .borrow()
            .iter()
            .map(|e| e.clone() as EntityHandle)
            .collect()
    }

    fn after_render(&self) -> &Observable<FrameInfo> {
        &self.after_render
    }

    fn ready(&self) -> &Observable<()> {
        &self.ready
    }

    fn is_ready(&self) -> bool {
        self.is_ready.get()
    }

    fn keyboard(&self) -> &Observable<HostEvent> {
        &self.keyboard
    }

    fn as_entity(self: Rc<Self>) -> EntityHandle {
        self
    }
}

impl std::fmt::Debug for MemoryScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryScene")
            .field("entities", &self.entities.borrow().len())
            .field("ready", &self.is_ready.get())
            .finish()
    }
}
