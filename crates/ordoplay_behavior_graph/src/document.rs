// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serialized graph documents.
//!
//! A [`GraphDocument`] is what the editor saves: nodes by registry path with
//! their properties and layout, links, editor groups and variables. Runtime
//! state (scratch, outputs, status, time) is never part of it.

use crate::connection::Link;
use crate::error::{BehaviorError, Result};
use crate::graph::Variable;
use crate::node::{ExecutionMode, NodeId};
use crate::value::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Current graph document format version
pub const GRAPH_FORMAT_VERSION: u32 = 1;

fn default_version() -> u32 {
    GRAPH_FORMAT_VERSION
}

/// A saved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    /// Highest node id handed out so far
    #[serde(default)]
    pub last_node_id: u32,
    /// Highest link id handed out so far
    #[serde(default)]
    pub last_link_id: u32,
    /// Nodes, in graph order
    #[serde(default)]
    pub nodes: Vec<NodeDocument>,
    /// Links
    #[serde(default)]
    pub links: Vec<Link>,
    /// Editor-only group frames
    #[serde(default)]
    pub groups: Vec<GroupAnnotation>,
    /// Graph variables
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl GraphDocument {
    /// Parse a document from JSON, rejecting newer format versions
    pub fn from_json(json: &str) -> Result<Self> {
        let document: GraphDocument = serde_json::from_str(json)?;
        document.check_version()?;
        Ok(document)
    }

    /// Serialize to pretty JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject documents written by a newer editor
    pub fn check_version(&self) -> Result<()> {
        if self.version > GRAPH_FORMAT_VERSION {
            return Err(BehaviorError::UnsupportedVersion {
                found: self.version,
                supported: GRAPH_FORMAT_VERSION,
            });
        }
        Ok(())
    }
}

impl Default for GraphDocument {
    fn default() -> Self {
        Self {
            version: GRAPH_FORMAT_VERSION,
            last_node_id: 0,
            last_link_id: 0,
            nodes: Vec::new(),
            links: Vec::new(),
            groups: Vec::new(),
            variables: Vec::new(),
        }
    }
}

/// A saved node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDocument {
    /// Node id
    pub id: NodeId,
    /// Registry path of the node kind
    #[serde(rename = "type")]
    pub type_path: String,
    /// Position in the graph UI
    pub pos: [f32; 2],
    /// Size in the graph UI
    pub size: [f32; 2],
    /// Execution mode at save time, for the editor's display. Loading always
    /// derives the mode from the descriptor and the restored links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
    /// Property values
    #[serde(default)]
    pub properties: IndexMap<String, Value>,
}

/// Editor-only frame grouping nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupAnnotation {
    /// Title
    pub title: String,
    /// `[x, y, width, height]`
    pub bounding: [f32; 4],
    /// Color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}
