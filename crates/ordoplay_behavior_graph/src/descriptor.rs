// SPDX-License-Identifier: MIT OR Apache-2.0
//! Declarative node kind definitions.
//!
//! A [`NodeDescriptor`] is plain data plus callbacks: every node kind, from a
//! number constant to a keyboard listener, is one descriptor driving the same
//! generic [`GraphNode`](crate::node::GraphNode).

use crate::execution::NodeContext;
use crate::host::{EntityKind, HostEvent};
use crate::node::ExecutionMode;
use crate::socket::{InputSocket, OutputSocket, SocketType};
use crate::value::Value;
use std::fmt;
use std::rc::Rc;

/// Behavior callback. The returned value feeds outputs whose source is
/// [`OutputSource::Return`](crate::socket::OutputSource::Return).
pub type ExecuteFn = Rc<dyn Fn(&mut NodeContext<'_>) -> Option<Value>>;

/// Cleanup callback invoked when the graph stops
pub type StopFn = Rc<dyn Fn(&mut NodeContext<'_>)>;

/// Callback invoked for host events while the node is in
/// [`ExecutionMode::OnEvent`]
pub type EventFn = Rc<dyn Fn(&mut NodeContext<'_>, &HostEvent)>;

/// Which host entities a node kind is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetCapability {
    /// Any entity, and the scene
    #[default]
    Any,
    /// Meshes only
    Mesh,
    /// Lights only
    Light,
    /// Cameras only
    Camera,
    /// The scene only
    Scene,
}

impl TargetCapability {
    /// Check if an entity of the given kind may use this node kind
    pub fn accepts(&self, kind: EntityKind) -> bool {
        match self {
            Self::Any => true,
            Self::Mesh => kind == EntityKind::Mesh,
            Self::Light => kind == EntityKind::Light,
            Self::Camera => kind == EntityKind::Camera,
            Self::Scene => kind == EntityKind::Scene,
        }
    }
}

/// How a node is driven from outside the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerSource {
    /// Runs every tick or when triggered
    #[default]
    None,
    /// Fires on every host frame
    RenderLoop,
    /// Fires once on the first host frame after start
    RenderOnce,
    /// Fires on host events (keyboard, ...)
    HostEvent,
}

/// Persisted, user-editable node configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Declared type
    pub socket_type: SocketType,
    /// Default value
    pub default: Value,
    /// Allowed values, for combo-box properties
    pub enum_values: Option<Vec<Value>>,
}

impl PropertyDescriptor {
    /// Create a property typed after its default value
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            socket_type: default.socket_type(),
            default,
            enum_values: None,
        }
    }

    /// Create a property with the zero value of its type.
    ///
    /// Returns `None` for types without a zero value (`event`, `any`, custom).
    pub fn zeroed(name: impl Into<String>, socket_type: SocketType) -> Option<Self> {
        let default = Value::zero(&socket_type)?;
        Some(Self {
            name: name.into(),
            socket_type,
            default,
            enum_values: None,
        })
    }

    /// Restrict the property to a set of values
    pub fn with_enum(mut self, values: impl IntoIterator<Item = Value>) -> Self {
        self.enum_values = Some(values.into_iter().collect());
        self
    }

    /// Check if a value may be stored in this property
    pub fn accepts(&self, value: &Value) -> bool {
        if value.socket_type() != self.socket_type {
            return false;
        }
        self.enum_values
            .as_ref()
            .map_or(true, |values| values.contains(value))
    }
}

/// Node kind definition
pub struct NodeDescriptor {
    /// Registry key, `category/name`
    pub path: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Entities this node kind is valid for
    pub target: TargetCapability,
    /// Input sockets, in slot order
    pub inputs: Vec<InputSocket>,
    /// Output sockets, in slot order
    pub outputs: Vec<OutputSocket>,
    /// Configurable properties
    pub properties: Vec<PropertyDescriptor>,
    /// External driver
    pub trigger_source: TriggerSource,
    execute: ExecuteFn,
    on_stop: Option<StopFn>,
    on_event: Option<EventFn>,
}

impl NodeDescriptor {
    /// Create a descriptor with no sockets or properties
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        execute: impl Fn(&mut NodeContext<'_>) -> Option<Value> + 'static,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            description: String::new(),
            target: TargetCapability::Any,
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: Vec::new(),
            trigger_source: TriggerSource::None,
            execute: Rc::new(execute),
            on_stop: None,
            on_event: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Restrict to a kind of entity
    pub fn with_target(mut self, target: TargetCapability) -> Self {
        self.target = target;
        self
    }

    /// Append an input socket
    pub fn with_input(mut self, input: InputSocket) -> Self {
        self.inputs.push(input);
        self
    }

    /// Append an output socket
    pub fn with_output(mut self, output: OutputSocket) -> Self {
        self.outputs.push(output);
        self
    }

    /// Append a property
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Mark the node as driven by the host
    pub fn with_trigger_source(mut self, source: TriggerSource) -> Self {
        self.trigger_source = source;
        self
    }

    /// Set the stop callback
    pub fn with_on_stop(mut self, on_stop: impl Fn(&mut NodeContext<'_>) + 'static) -> Self {
        self.on_stop = Some(Rc::new(on_stop));
        self
    }

    /// Set the host event callback
    pub fn with_on_event(
        mut self,
        on_event: impl Fn(&mut NodeContext<'_>, &HostEvent) + 'static,
    ) -> Self {
        self.on_event = Some(Rc::new(on_event));
        self
    }

    /// Top-level path segment
    pub fn category(&self) -> &str {
        self.path.split('/').next().unwrap_or_default()
    }

    /// Mode a fresh instance starts in
    pub fn initial_mode(&self) -> ExecutionMode {
        match self.trigger_source {
            TriggerSource::None => ExecutionMode::Always,
            TriggerSource::RenderLoop | TriggerSource::RenderOnce => ExecutionMode::Never,
            TriggerSource::HostEvent => ExecutionMode::OnEvent,
        }
    }

    /// Get a property definition by name
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Get an input slot index by name
    pub fn input_slot(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|i| i.name == name)
    }

    /// Get an output slot index by name
    pub fn output_slot(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o.name == name)
    }

    /// Behavior callback
    pub fn execute_fn(&self) -> &ExecuteFn {
        &self.execute
    }

    /// Stop callback, if declared
    pub fn stop_fn(&self) -> Option<&StopFn> {
        self.on_stop.as_ref()
    }

    /// Host event callback, if declared
    pub fn event_fn(&self) -> Option<&EventFn> {
        self.on_event.as_ref()
    }
}

impl fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("target", &self.target)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("properties", &self.properties)
            .field("trigger_source", &self.trigger_source)
            .field("on_stop", &self.on_stop.is_some())
            .field("on_event", &self.on_event.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_modes() {
        let generic = NodeDescriptor::new("math/add", "Add", |_| None);
        assert_eq!(generic.initial_mode(), ExecutionMode::Always);

        let render = NodeDescriptor::new("render/render_loop", "Render Loop", |_| None)
            .with_trigger_source(TriggerSource::RenderLoop);
        assert_eq!(render.initial_mode(), ExecutionMode::Never);

        let keyboard = NodeDescriptor::new("keyboard/keyboard_down", "Keyboard Down", |_| None)
            .with_trigger_source(TriggerSource::HostEvent);
        assert_eq!(keyboard.initial_mode(), ExecutionMode::OnEvent);
    }

    #[test]
    fn test_property_enum() {
        let property = PropertyDescriptor::new("Mode", "linear")
            .with_enum(["linear".into(), "ease".into()]);
        assert!(property.accepts(&Value::from("ease")));
        assert!(!property.accepts(&Value::from("bounce")));
        assert!(!property.accepts(&Value::Number(1.0)));
    }

    #[test]
    fn test_zeroed_vector_property() {
        let property = PropertyDescriptor::zeroed("Offset", SocketType::Vec3).unwrap();
        assert_eq!(property.default, Value::Vec3([0.0; 3]));
        assert!(PropertyDescriptor::zeroed("Anything", SocketType::Any).is_none());
    }

    #[test]
    fn test_category_and_capability() {
        let descriptor = NodeDescriptor::new("animation/play_animations", "Play Animations", |_| None)
            .with_target(TargetCapability::Mesh);
        assert_eq!(descriptor.category(), "animation");
        assert!(descriptor.target.accepts(EntityKind::Mesh));
        assert!(!descriptor.target.accepts(EntityKind::Light));
        assert!(TargetCapability::Any.accepts(EntityKind::Scene));
    }
}
