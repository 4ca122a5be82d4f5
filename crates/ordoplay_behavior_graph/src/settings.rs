// SPDX-License-Identifier: MIT OR Apache-2.0
//! Runtime settings for behavior graphs.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings applied to every graph built by the runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Maximum trigger propagation depth. `None` leaves authored cycles
    /// unguarded: they recurse until the stack runs out.
    pub max_trigger_depth: Option<usize>,
    /// Check connected input values against declared socket types before
    /// running a node
    pub validate_input_types: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_trigger_depth: None,
            validate_input_types: true,
        }
    }
}

impl GraphSettings {
    /// Parse settings from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = GraphSettings::default();
        assert_eq!(settings.max_trigger_depth, None);
        assert!(settings.validate_input_types);
    }

    #[test]
    fn test_partial_ron() {
        let settings = GraphSettings::from_ron("(max_trigger_depth: Some(64))").unwrap();
        assert_eq!(settings.max_trigger_depth, Some(64));
        assert!(settings.validate_input_types);
    }
}
