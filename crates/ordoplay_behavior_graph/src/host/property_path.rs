// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dotted property paths (`material.albedoColor.r`).

use std::fmt;

/// A non-empty dotted path into an entity's properties
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse a dotted path. Returns `None` if any segment is empty.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path.trim().split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return None;
        }
        Some(Self { segments })
    }

    /// All segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments leading to the property's owner
    pub fn parent(&self) -> &[String] {
        &self.segments[..self.segments.len() - 1]
    }

    /// Last segment
    pub fn leaf(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
