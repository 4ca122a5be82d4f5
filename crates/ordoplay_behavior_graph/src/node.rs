// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node instances placed in a graph.

use crate::connection::LinkId;
use crate::descriptor::NodeDescriptor;
use crate::scratch::Scratch;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Identifier for a node, unique within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// When a node runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Every tick
    #[default]
    Always,
    /// When its "Execute" input is triggered
    OnTrigger,
    /// When a host event reaches it
    OnEvent,
    /// Only when driven by the host frame loop
    Never,
}

impl ExecutionMode {
    /// Check if the mode is only ever set explicitly
    pub fn is_explicit(&self) -> bool {
        matches!(self, Self::OnEvent | Self::Never)
    }
}

/// A node instance in the graph
#[derive(Debug)]
pub struct GraphNode {
    id: NodeId,
    descriptor: Rc<NodeDescriptor>,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Size in the graph UI
    pub size: [f32; 2],
    properties: IndexMap<String, Value>,
    scratch: Scratch,
    mode: ExecutionMode,
    pub(crate) inputs: Vec<Option<LinkId>>,
    pub(crate) outputs: Vec<Vec<LinkId>>,
    pub(crate) output_values: Vec<Option<Value>>,
    valid: bool,
}

impl GraphNode {
    /// Create a node from a descriptor, with default properties
    pub fn new(id: NodeId, descriptor: Rc<NodeDescriptor>) -> Self {
        let properties = descriptor
            .properties
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect();
        let mode = descriptor.initial_mode();
        let inputs = vec![None; descriptor.inputs.len()];
        let outputs = vec![Vec::new(); descriptor.outputs.len()];
        let output_values = vec![None; descriptor.outputs.len()];

        Self {
            id,
            descriptor,
            position: [0.0, 0.0],
            size: default_size(),
            properties,
            scratch: Scratch::new(),
            mode,
            inputs,
            outputs,
            output_values,
            valid: true,
        }
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Node id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Descriptor this node was created from
    pub fn descriptor(&self) -> &Rc<NodeDescriptor> {
        &self.descriptor
    }

    /// Registry path of the node kind
    pub fn type_path(&self) -> &str {
        &self.descriptor.path
    }

    /// Current execution mode
    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Set the execution mode explicitly
    pub fn set_mode(&mut self, mode: ExecutionMode) {
        self.mode = mode;
    }

    /// All property values, in declaration order
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Get a property value
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    /// Set a property value.
    ///
    /// Unknown names and values the property does not accept are rejected
    /// with a warning.
    pub fn set_property(&mut self, name: &str, value: Value) -> bool {
        let Some(definition) = self.descriptor.property(name) else {
            tracing::warn!(
                node_type = %self.descriptor.path,
                node_id = self.id.0,
                property = name,
                "Unknown node property"
            );
            return false;
        };
        if !definition.accepts(&value) {
            tracing::warn!(
                node_type = %self.descriptor.path,
                node_id = self.id.0,
                property = name,
                expected = %definition.socket_type,
                found = value.type_name(),
                "Rejected node property value"
            );
            return false;
        }
        self.properties.insert(name.to_string(), value);
        true
    }

    /// Scratch store
    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    /// Scratch store, mutably
    pub fn scratch_mut(&mut self) -> &mut Scratch {
        &mut self.scratch
    }

    /// Whether the last execution passed input validation
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    /// Link feeding an input slot
    pub fn input_link(&self, slot: usize) -> Option<LinkId> {
        self.inputs.get(slot).copied().flatten()
    }

    /// Links leaving an output slot
    pub fn output_links(&self, slot: usize) -> &[LinkId] {
        self.outputs.get(slot).map_or(&[][..], Vec::as_slice)
    }

    /// Check if an input slot is connected
    pub fn is_input_connected(&self, slot: usize) -> bool {
        self.input_link(slot).is_some()
    }

    /// Last value written to an output slot
    pub fn output_value(&self, slot: usize) -> Option<&Value> {
        self.output_values.get(slot).and_then(Option::as_ref)
    }

    pub(crate) fn store_output(&mut self, slot: usize, value: Option<Value>) {
        if let Some(stored) = self.output_values.get_mut(slot) {
            *stored = value;
        }
    }

    /// Record an incoming link and re-derive the execution mode
    pub(crate) fn attach_input(&mut self, slot: usize, link: LinkId) {
        if let Some(input) = self.inputs.get_mut(slot) {
            *input = Some(link);
        }
        self.derive_mode(slot, true);
    }

    /// Forget an incoming link and re-derive the execution mode
    pub(crate) fn detach_input(&mut self, slot: usize, link: LinkId) {
        if let Some(input) = self.inputs.get_mut(slot) {
            if *input == Some(link) {
                *input = None;
                self.derive_mode(slot, false);
            }
        }
    }

    pub(crate) fn attach_output(&mut self, slot: usize, link: LinkId) {
        if let Some(links) = self.outputs.get_mut(slot) {
            links.push(link);
        }
    }

    pub(crate) fn detach_output(&mut self, slot: usize, link: LinkId) {
        if let Some(links) = self.outputs.get_mut(slot) {
            links.retain(|l| *l != link);
        }
    }

    /// Slot 0 drives the mode when it is the event "Execute" input.
    /// `Never` and `OnEvent` are left alone.
    fn derive_mode(&mut self, slot: usize, connected: bool) {
        if slot != 0 || self.mode.is_explicit() {
            return;
        }
        let is_event = self
            .descriptor
            .inputs
            .first()
            .is_some_and(|input| input.types.is_event());
        if !is_event {
            return;
        }
        self.mode = if connected {
            ExecutionMode::OnTrigger
        } else {
            ExecutionMode::Always
        };
    }
}

fn default_size() -> [f32; 2] {
    [180.0, 60.0]
}
