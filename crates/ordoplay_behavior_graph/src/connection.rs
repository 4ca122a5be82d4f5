// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::socket::SocketTypes;
use serde::{Deserialize, Serialize};

/// Identifier for a link, unique within its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub u32);

/// A link from an output slot to an input slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Link id
    pub id: LinkId,
    /// Source node
    #[serde(rename = "originId")]
    pub from_node: NodeId,
    /// Source output slot
    #[serde(rename = "originSlot")]
    pub from_slot: usize,
    /// Target node
    #[serde(rename = "targetId")]
    pub to_node: NodeId,
    /// Target input slot
    #[serde(rename = "targetSlot")]
    pub to_slot: usize,
    /// Types carried, taken from the source output
    #[serde(rename = "type")]
    pub types: SocketTypes,
}

impl Link {
    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.from_node == node_id || self.to_node == node_id
    }

    /// Check if this link carries triggers
    pub fn is_event(&self) -> bool {
        self.types.is_event()
    }
}
