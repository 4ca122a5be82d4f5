// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph evaluation and trigger propagation.
//!
//! A tick advances the graph clock, fires due timers and then runs every
//! node that is due in node-list order: `Always` nodes and host-driven
//! render sources. Triggers run downstream nodes synchronously, depth-first,
//! before the triggering callback returns.

use crate::descriptor::TriggerSource;
use crate::graph::Graph;
use crate::host::{EntityHandle, HostContext, HostEvent, SceneHandle, SELF_TARGET};
use crate::node::{ExecutionMode, NodeId};
use crate::nodes::TARGET_PATH;
use crate::scratch::Scratch;
use crate::socket::OutputSource;
use crate::value::Value;

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    node: NodeId,
    slot: usize,
    due: f64,
}

/// Timers owned by a graph, ordered by due time
#[derive(Debug, Default)]
pub(crate) struct TimerQueue {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerQueue {
    fn schedule(&mut self, node: NodeId, slot: usize, due: f64) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(PendingTimer { handle, node, slot, due });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }

    fn contains(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    fn take_due(&mut self, now: f64) -> Vec<PendingTimer> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.pending.drain(..).partition(|t| t.due <= now);
        self.pending = pending;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.handle.0.cmp(&b.handle.0)));
        due
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Marks a render-once source as fired for the current run
struct RenderOnceFired;

/// Target entity resolved from the node's target path
struct ResolvedTarget {
    path: String,
    entity: EntityHandle,
}

/// Everything a node callback can reach while it runs
pub struct NodeContext<'a> {
    graph: &'a mut Graph,
    node: NodeId,
    depth: usize,
    detached: Scratch,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(graph: &'a mut Graph, node: NodeId, depth: usize) -> Self {
        Self {
            graph,
            node,
            depth,
            detached: Scratch::new(),
        }
    }

    /// Id of the running node
    pub fn node_id(&self) -> NodeId {
        self.node
    }

    /// Trigger depth of this call, 0 for tick and event roots
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The owning graph
    pub fn graph(&self) -> &Graph {
        self.graph
    }

    /// Registry path of the running node
    pub fn type_path(&self) -> String {
        self.graph
            .node(self.node)
            .map(|n| n.type_path().to_string())
            .unwrap_or_default()
    }

    /// Get a property value
    pub fn property(&self, name: &str) -> Option<Value> {
        self.graph.node(self.node)?.property(name).cloned()
    }

    /// Get a number property
    pub fn property_number(&self, name: &str) -> Option<f64> {
        self.property(name)?.as_number()
    }

    /// Get a string property
    pub fn property_string(&self, name: &str) -> Option<String> {
        self.property(name)?.as_str().map(str::to_string)
    }

    /// Get a boolean property
    pub fn property_bool(&self, name: &str) -> Option<bool> {
        self.property(name)?.as_bool()
    }

    /// Value on an input slot, read from the linked output.
    /// `None` when unconnected or when upstream has not produced a value.
    pub fn input(&self, slot: usize) -> Option<Value> {
        self.graph.input_value(self.node, slot)
    }

    /// Value on an input, by socket name
    pub fn input_named(&self, name: &str) -> Option<Value> {
        let slot = self.graph.node(self.node)?.descriptor().input_slot(name)?;
        self.input(slot)
    }

    /// Value on the named input, falling back to the property of the same
    /// name when the input is unconnected
    pub fn input_or_property(&self, name: &str) -> Option<Value> {
        self.input_named(name).or_else(|| self.property(name))
    }

    /// Write an output slot
    pub fn set_output(&mut self, slot: usize, value: impl Into<Value>) {
        if let Some(node) = self.graph.node_mut(self.node) {
            node.store_output(slot, Some(value.into()));
        }
    }

    /// Write an output, by socket name
    pub fn set_output_named(&mut self, name: &str, value: impl Into<Value>) {
        let slot = self
            .graph
            .node(self.node)
            .and_then(|n| n.descriptor().output_slot(name));
        if let Some(slot) = slot {
            self.set_output(slot, value);
        }
    }

    /// Clear an output slot
    pub fn clear_output(&mut self, slot: usize) {
        if let Some(node) = self.graph.node_mut(self.node) {
            node.store_output(slot, None);
        }
    }

    /// Fire an output slot: runs every node linked to it, in link order
    pub fn trigger(&mut self, slot: usize) {
        self.graph.fire_output(self.node, slot, self.depth + 1);
    }

    /// The running node's scratch store
    pub fn scratch(&self) -> &Scratch {
        match self.graph.nodes.get(&self.node) {
            Some(node) => node.scratch(),
            None => &self.detached,
        }
    }

    /// The running node's scratch store, mutably
    pub fn scratch_mut(&mut self) -> &mut Scratch {
        match self.graph.nodes.get_mut(&self.node) {
            Some(node) => node.scratch_mut(),
            None => &mut self.detached,
        }
    }

    /// Attached entity and scene
    pub fn host(&self) -> Option<&HostContext> {
        self.graph.host()
    }

    /// Entity the graph is attached to
    pub fn target(&self) -> Option<EntityHandle> {
        self.host().map(|h| h.target.clone())
    }

    /// Host scene
    pub fn scene(&self) -> Option<SceneHandle> {
        self.host().map(|h| h.scene.clone())
    }

    /// Entity named by the node's `Target Path` property.
    ///
    /// Nodes without the property act on the attached entity. The result is
    /// cached in scratch until the path changes or the graph restarts.
    pub fn resolve_target(&mut self) -> Option<EntityHandle> {
        let path = self
            .property_string(TARGET_PATH)
            .unwrap_or_else(|| SELF_TARGET.to_string());
        if let Some(cached) = self.scratch().get::<ResolvedTarget>() {
            if cached.path == path {
                return Some(cached.entity.clone());
            }
        }

        let host = self.host()?;
        let Some(entity) = host.resolve_target(&path) else {
            tracing::warn!(
                node_type = %self.type_path(),
                node_id = self.node.0,
                entity = %path,
                "Target entity not found"
            );
            return None;
        };
        self.scratch_mut().insert(ResolvedTarget {
            path,
            entity: entity.clone(),
        });
        Some(entity)
    }

    /// Read a graph variable
    pub fn get_variable(&self, name: &str) -> Option<Value> {
        self.graph.get_variable(name).cloned()
    }

    /// Write an existing graph variable
    pub fn set_variable(&mut self, name: &str, value: Value) -> bool {
        self.graph.set_variable(name, value)
    }

    /// Graph clock, in seconds
    pub fn global_time(&self) -> f64 {
        self.graph.global_time
    }

    /// Fire `slot` of the running node once `delay` seconds have elapsed on
    /// the graph clock
    pub fn schedule_timer(&mut self, delay: f64, slot: usize) -> TimerHandle {
        let due = self.graph.global_time + delay.max(0.0);
        self.graph.timers.schedule(self.node, slot, due)
    }

    /// Cancel a pending timer. Returns `false` if it already fired.
    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        self.graph.timers.cancel(handle)
    }

    /// Check if a timer is still pending
    pub fn is_timer_pending(&self, handle: TimerHandle) -> bool {
        self.graph.timers.contains(handle)
    }

    /// Log a degraded result for the running node
    pub fn warn(&self, message: &str) {
        tracing::warn!(node_type = %self.type_path(), node_id = self.node.0, "{message}");
    }
}

impl Graph {
    /// Run one node now, as if it were triggered
    pub fn execute_node(&mut self, node_id: NodeId) {
        self.run_node(node_id, 0);
    }

    pub(crate) fn run_node(&mut self, node_id: NodeId, depth: usize) {
        if let Some(max) = self.settings.max_trigger_depth {
            if depth > max {
                tracing::warn!(node_id = node_id.0, depth, max, "Trigger depth limit reached");
                return;
            }
        }
        let Some(node) = self.nodes.get(&node_id) else {
            return;
        };
        let descriptor = node.descriptor().clone();

        if self.settings.validate_input_types && !self.inputs_valid(node_id) {
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.set_valid(false);
            }
            return;
        }
        if let Some(node) = self.nodes.get_mut(&node_id) {
            node.set_valid(true);
        }

        let execute = descriptor.execute_fn().clone();
        let result = {
            let mut ctx = NodeContext::new(self, node_id, depth);
            execute(&mut ctx)
        };

        for (slot, output) in descriptor.outputs.iter().enumerate() {
            let value = match &output.source {
                OutputSource::Computed => continue,
                OutputSource::Return => result.clone(),
                OutputSource::Property(name) => self
                    .nodes
                    .get(&node_id)
                    .and_then(|n| n.property(name).cloned()),
                OutputSource::Input(name) => descriptor
                    .input_slot(name)
                    .and_then(|input| self.input_value(node_id, input)),
            };
            if let Some(node) = self.nodes.get_mut(&node_id) {
                node.store_output(slot, value);
            }
        }
    }

    /// Value on an input slot, read from the linked output
    pub(crate) fn input_value(&self, node_id: NodeId, slot: usize) -> Option<Value> {
        let link = self.nodes.get(&node_id)?.input_link(slot)?;
        let link = self.links.get(&link)?;
        self.nodes
            .get(&link.from_node)?
            .output_value(link.from_slot)
            .cloned()
    }

    /// Check linked data inputs against their declared types
    fn inputs_valid(&self, node_id: NodeId) -> bool {
        let Some(node) = self.nodes.get(&node_id) else {
            return false;
        };
        let descriptor = node.descriptor();
        for (slot, input) in descriptor.inputs.iter().enumerate() {
            if input.types.is_event() {
                continue;
            }
            let Some(value) = self.input_value(node_id, slot) else {
                continue;
            };
            if !input.types.accepts_value(&value) {
                tracing::warn!(
                    node_type = %descriptor.path,
                    node_id = node_id.0,
                    input = %input.name,
                    expected = %input.types,
                    found = value.type_name(),
                    "Input type mismatch, node skipped"
                );
                return false;
            }
        }
        true
    }

    pub(crate) fn fire_output(&mut self, node_id: NodeId, slot: usize, depth: usize) {
        let targets: Vec<NodeId> = match self.nodes.get(&node_id) {
            Some(node) => node
                .output_links(slot)
                .iter()
                .filter_map(|id| self.links.get(id))
                .filter(|link| link.is_event())
                .map(|link| link.to_node)
                .collect(),
            None => return,
        };
        for target in targets {
            self.run_node(target, depth);
        }
    }

    /// Advance the clock by `delta` seconds and run one frame: due timers
    /// first, then every due node in list order. Does nothing when stopped.
    pub fn tick(&mut self, delta: f64) {
        if !self.is_running() {
            return;
        }
        if delta.is_finite() && delta > 0.0 {
            self.global_time += delta;
        }

        for timer in self.timers.take_due(self.global_time) {
            self.fire_output(timer.node, timer.slot, 1);
        }

        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let trigger_source = node.descriptor().trigger_source;
            let due = match node.mode() {
                ExecutionMode::Always => true,
                ExecutionMode::Never => match trigger_source {
                    TriggerSource::RenderLoop => true,
                    TriggerSource::RenderOnce => node.scratch_mut().insert(RenderOnceFired).is_none(),
                    TriggerSource::None | TriggerSource::HostEvent => false,
                },
                ExecutionMode::OnTrigger | ExecutionMode::OnEvent => false,
            };
            if due {
                self.run_node(id, 0);
            }
        }
    }

    /// Deliver a host event to every `OnEvent` node, in list order.
    /// Does nothing when stopped.
    pub fn dispatch_event(&mut self, event: &HostEvent) {
        if !self.is_running() {
            return;
        }
        let handlers: Vec<_> = self
            .nodes
            .values()
            .filter(|n| n.mode() == ExecutionMode::OnEvent)
            .filter_map(|n| n.descriptor().event_fn().map(|f| (n.id(), f.clone())))
            .collect();
        for (node_id, on_event) in handlers {
            let mut ctx = NodeContext::new(self, node_id, 0);
            on_event(&mut ctx, event);
        }
    }

    /// Number of pending timers
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl std::fmt::Debug for NodeContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeContext")
            .field("node", &self.node)
            .field("depth", &self.depth)
            .finish()
    }
}
