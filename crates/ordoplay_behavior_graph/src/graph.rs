// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes, links and variables.

use crate::connection::{Link, LinkId};
use crate::descriptor::NodeDescriptor;
use crate::document::{GraphDocument, GroupAnnotation, NodeDocument, GRAPH_FORMAT_VERSION};
use crate::execution::{NodeContext, TimerQueue};
use crate::host::HostContext;
use crate::node::{GraphNode, NodeId};
use crate::registry::NodeRegistry;
use crate::settings::GraphSettings;
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// A named value shared by every node of a graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name
    pub name: String,
    /// Current value
    pub value: Value,
}

impl Variable {
    /// Create a variable
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Graph lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphStatus {
    /// Not running
    #[default]
    Stopped,
    /// Running
    Running,
}

/// A behavior graph
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph, in evaluation order
    pub(crate) nodes: IndexMap<NodeId, GraphNode>,
    /// Links between nodes
    pub(crate) links: IndexMap<LinkId, Link>,
    groups: Vec<GroupAnnotation>,
    variables: Vec<Variable>,
    last_node_id: u32,
    last_link_id: u32,
    pub(crate) global_time: f64,
    status: GraphStatus,
    pub(crate) host: Option<HostContext>,
    pub(crate) settings: GraphSettings,
    pub(crate) timers: TimerQueue,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            groups: Vec::new(),
            variables: Vec::new(),
            last_node_id: 0,
            last_link_id: 0,
            global_time: 0.0,
            status: GraphStatus::Stopped,
            host: None,
            settings: GraphSettings::default(),
            timers: TimerQueue::default(),
        }
    }

    /// Set the runtime settings
    pub fn with_settings(mut self, settings: GraphSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runtime settings
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Inject the attached entity and scene
    pub fn set_host(&mut self, host: HostContext) {
        self.host = Some(host);
    }

    /// Attached entity and scene, if any
    pub fn host(&self) -> Option<&HostContext> {
        self.host.as_ref()
    }

    /// Add a node of a registered kind
    pub fn add_node(&mut self, registry: &NodeRegistry, path: &str) -> Option<NodeId> {
        let Some(descriptor) = registry.lookup(path) else {
            tracing::warn!(node_type = path, graph = %self.name, "Node type is not registered");
            return None;
        };
        Some(self.add_node_from(descriptor))
    }

    /// Add a node from a descriptor
    pub fn add_node_from(&mut self, descriptor: Rc<NodeDescriptor>) -> NodeId {
        self.last_node_id += 1;
        let id = NodeId(self.last_node_id);
        self.nodes.insert(id, GraphNode::new(id, descriptor));
        id
    }

    /// Remove a node and its links
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<GraphNode> {
        let links: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.involves_node(node_id))
            .map(|l| l.id)
            .collect();
        for link in links {
            self.disconnect(link);
        }
        self.nodes.shift_remove(&node_id)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes, in evaluation order
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Link an output slot to an input slot.
    ///
    /// An input holds at most one link: linking into an occupied input
    /// replaces the previous link. Self-links and cycles are allowed.
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_slot: usize,
    ) -> Result<LinkId, ConnectionError> {
        let id = LinkId(self.last_link_id + 1);
        let link = self.validate_link(id, from_node, from_slot, to_node, to_slot)?;
        self.last_link_id = id.0;
        self.insert_link(link);
        Ok(id)
    }

    fn validate_link(
        &self,
        id: LinkId,
        from_node: NodeId,
        from_slot: usize,
        to_node: NodeId,
        to_slot: usize,
    ) -> Result<Link, ConnectionError> {
        let source = self
            .nodes
            .get(&from_node)
            .ok_or(ConnectionError::NodeNotFound(from_node))?;
        let target = self
            .nodes
            .get(&to_node)
            .ok_or(ConnectionError::NodeNotFound(to_node))?;

        let output = source
            .descriptor()
            .outputs
            .get(from_slot)
            .ok_or(ConnectionError::OutputNotFound(from_node, from_slot))?;
        let input = target
            .descriptor()
            .inputs
            .get(to_slot)
            .ok_or(ConnectionError::InputNotFound(to_node, to_slot))?;

        if !output.types.can_connect_to(&input.types) {
            tracing::warn!(
                from = source.type_path(),
                to = target.type_path(),
                output = %output.types,
                input = %input.types,
                "Rejected link between incompatible sockets"
            );
            return Err(ConnectionError::IncompatibleTypes {
                output: output.types.to_string(),
                input: input.types.to_string(),
            });
        }

        Ok(Link {
            id,
            from_node,
            from_slot,
            to_node,
            to_slot,
            types: output.types.clone(),
        })
    }

    fn insert_link(&mut self, link: Link) {
        if let Some(previous) = self
            .nodes
            .get(&link.to_node)
            .and_then(|n| n.input_link(link.to_slot))
        {
            self.disconnect(previous);
        }
        if let Some(source) = self.nodes.get_mut(&link.from_node) {
            source.attach_output(link.from_slot, link.id);
        }
        if let Some(target) = self.nodes.get_mut(&link.to_node) {
            target.attach_input(link.to_slot, link.id);
        }
        self.links.insert(link.id, link);
    }

    /// Remove a link
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;
        if let Some(source) = self.nodes.get_mut(&link.from_node) {
            source.detach_output(link.from_slot, link.id);
        }
        if let Some(target) = self.nodes.get_mut(&link.to_node) {
            target.detach_input(link.to_slot, link.id);
        }
        Some(link)
    }

    /// Remove the link feeding an input slot
    pub fn disconnect_input(&mut self, node_id: NodeId, slot: usize) -> Option<Link> {
        let link = self.nodes.get(&node_id)?.input_link(slot)?;
        self.disconnect(link)
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Editor group frames
    pub fn groups(&self) -> &[GroupAnnotation] {
        &self.groups
    }

    /// Add an editor group frame
    pub fn add_group(&mut self, group: GroupAnnotation) {
        self.groups.push(group);
    }

    /// Graph variables, in declaration order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Graph variables, mutably
    pub fn variables_mut(&mut self) -> &mut Vec<Variable> {
        &mut self.variables
    }

    /// Declare a variable. Returns `false` if the name is already taken.
    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) -> bool {
        let name = name.into();
        if self.variables.iter().any(|v| v.name == name) {
            return false;
        }
        self.variables.push(Variable::new(name, value));
        true
    }

    /// Remove a variable
    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        let index = self.variables.iter().position(|v| v.name == name)?;
        Some(self.variables.remove(index))
    }

    /// Read a variable. Missing variables are logged and read as `None`.
    pub fn get_variable(&self, name: &str) -> Option<&Value> {
        let value = self.variables.iter().find(|v| v.name == name).map(|v| &v.value);
        if value.is_none() {
            tracing::warn!(graph = %self.name, variable = name, "Variable not found");
        }
        value
    }

    /// Write an existing variable. Missing variables are logged and left
    /// undeclared.
    pub fn set_variable(&mut self, name: &str, value: Value) -> bool {
        match self.variables.iter_mut().find(|v| v.name == name) {
            Some(variable) => {
                variable.value = value;
                true
            }
            None => {
                tracing::warn!(graph = %self.name, variable = name, "Cannot set undeclared variable");
                false
            }
        }
    }

    /// Elapsed running time, in seconds
    pub fn global_time(&self) -> f64 {
        self.global_time
    }

    /// Lifecycle state
    pub fn status(&self) -> GraphStatus {
        self.status
    }

    /// Check if the graph is running
    pub fn is_running(&self) -> bool {
        self.status == GraphStatus::Running
    }

    /// Start running. Resets every node's scratch store. No-op when running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        self.reset_run_state();
        self.status = GraphStatus::Running;
        tracing::debug!(graph = %self.name, nodes = self.nodes.len(), "Graph started");
    }

    /// Stop running. Calls every declared stop callback once, then clears
    /// scratch stores and pending timers. No-op when stopped.
    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.status = GraphStatus::Stopped;

        let stops: Vec<_> = self
            .nodes
            .values()
            .filter_map(|n| n.descriptor().stop_fn().map(|f| (n.id(), f.clone())))
            .collect();
        for (node_id, on_stop) in stops {
            let mut ctx = NodeContext::new(self, node_id, 0);
            on_stop(&mut ctx);
        }

        self.reset_run_state();
        tracing::debug!(graph = %self.name, time = self.global_time, "Graph stopped");
    }

    fn reset_run_state(&mut self) {
        for node in self.nodes.values_mut() {
            node.scratch_mut().clear();
            node.set_valid(true);
        }
        self.timers.clear();
    }

    /// Capture the graph as a document
    pub fn serialize(&self) -> GraphDocument {
        let nodes = self
            .nodes
            .values()
            .map(|node| NodeDocument {
                id: node.id(),
                type_path: node.type_path().to_string(),
                pos: node.position,
                size: node.size,
                mode: Some(node.mode()),
                properties: node.properties().clone(),
            })
            .collect();

        GraphDocument {
            version: GRAPH_FORMAT_VERSION,
            last_node_id: self.last_node_id,
            last_link_id: self.last_link_id,
            nodes,
            links: self.links.values().cloned().collect(),
            groups: self.groups.clone(),
            variables: self.variables.clone(),
        }
    }

    /// Replace the graph's content with a document.
    ///
    /// Nodes whose kind is no longer registered are skipped together with
    /// their links; the rest of the document still loads.
    pub fn configure(&mut self, document: &GraphDocument, registry: &NodeRegistry) {
        self.stop();
        self.nodes.clear();
        self.links.clear();
        self.timers.clear();
        self.global_time = 0.0;

        for saved in &document.nodes {
            let Some(descriptor) = registry.lookup(&saved.type_path) else {
                tracing::warn!(
                    node_type = %saved.type_path,
                    node_id = saved.id.0,
                    graph = %self.name,
                    "Skipping node of unregistered type"
                );
                continue;
            };
            let mut node = GraphNode::new(saved.id, descriptor);
            node.position = saved.pos;
            node.size = saved.size;
            for (name, value) in &saved.properties {
                node.set_property(name, value.clone());
            }
            self.nodes.insert(saved.id, node);
        }

        for saved in &document.links {
            match self.validate_link(
                saved.id,
                saved.from_node,
                saved.from_slot,
                saved.to_node,
                saved.to_slot,
            ) {
                Ok(link) => self.insert_link(link),
                Err(err) => tracing::warn!(link = saved.id.0, graph = %self.name, "Skipping link: {err}"),
            }
        }

        self.groups = document.groups.clone();
        self.variables = document.variables.clone();
        self.last_node_id = self
            .nodes
            .keys()
            .map(|id| id.0)
            .max()
            .unwrap_or_default()
            .max(document.last_node_id);
        self.last_link_id = self
            .links
            .keys()
            .map(|id| id.0)
            .max()
            .unwrap_or_default()
            .max(document.last_link_id);
    }

    /// Build a graph from a document
    pub fn from_document(name: impl Into<String>, document: &GraphDocument, registry: &NodeRegistry) -> Self {
        let mut graph = Self::new(name);
        graph.configure(document, registry);
        graph
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a link
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Output slot not found
    #[error("Node {0:?} has no output slot {1}")]
    OutputNotFound(NodeId, usize),

    /// Input slot not found
    #[error("Node {0:?} has no input slot {1}")]
    InputNotFound(NodeId, usize),

    /// Socket types can't be linked
    #[error("Output type {output} can't feed input type {input}")]
    IncompatibleTypes {
        /// Output socket types
        output: String,
        /// Input socket types
        input: String,
    },
}
