// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player settings file.

use crate::error::{PlayerError, Result};
use ordoplay_behavior_graph::GraphSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default log directive when neither `RUST_LOG` nor the settings set one
pub const DEFAULT_LOG_FILTER: &str = "ordoplay_behavior_graph=info,ordoplay_behavior_player=info";

/// Player settings, loaded from RON. Every field is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Number of frames to play
    pub frames: u32,
    /// Seconds per frame
    pub frame_time: f64,
    /// `tracing` filter directives
    pub log_filter: String,
    /// Settings for every graph
    pub graph: GraphSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            frames: 60,
            frame_time: 1.0 / 60.0,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            graph: GraphSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Load settings from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PlayerError::io(path, e))?;
        ron::from_str(&content).map_err(|source| PlayerError::Ron {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total simulated time, in seconds
    pub fn duration(&self) -> f64 {
        f64::from(self.frames) * self.frame_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: PlayerSettings = ron::from_str("(frames: 10, graph: (max_trigger_depth: Some(32)))").unwrap();
        assert_eq!(settings.frames, 10);
        assert_eq!(settings.frame_time, 1.0 / 60.0);
        assert_eq!(settings.log_filter, DEFAULT_LOG_FILTER);
        assert_eq!(settings.graph.max_trigger_depth, Some(32));
        assert!(settings.graph.validate_input_types);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("ordoplay_player_settings_{}.ron", std::process::id()));
        let settings = PlayerSettings {
            frames: 3,
            frame_time: 0.5,
            ..Default::default()
        };
        let config = ron::ser::PrettyConfig::default().struct_names(true);
        std::fs::write(&path, ron::ser::to_string_pretty(&settings, config).unwrap()).unwrap();
        let loaded = PlayerSettings::load(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.duration(), 1.5);
    }

    #[test]
    fn test_missing_file() {
        let err = PlayerSettings::load(Path::new("/nonexistent/player.ron")).unwrap_err();
        assert!(matches!(err, PlayerError::Io { .. }));
    }
}
