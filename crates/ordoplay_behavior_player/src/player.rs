// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless playback of a scene and its behavior graphs.

use crate::error::{PlayerError, Result};
use crate::scene_file::SceneFile;
use crate::settings::PlayerSettings;
use ordoplay_behavior_graph::host::memory::MemoryScene;
use ordoplay_behavior_graph::host::SceneObject;
use ordoplay_behavior_graph::{BehaviorError, BehaviorGraphExtension, Value};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// State of one entity after playback
#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    /// Entity name
    pub name: String,
    /// Leaf properties as `(dotted path, value)`
    pub properties: Vec<(String, Value)>,
    /// Method calls as `(method, count)`, in first-call order
    pub calls: Vec<(String, usize)>,
}

/// Result of a playback
#[derive(Debug, Clone, PartialEq)]
pub struct PlayReport {
    /// Frames played
    pub frames: u32,
    /// Simulated seconds
    pub elapsed: f64,
    /// Graphs attached to entities
    pub graphs: usize,
    /// Entity states, in scene order
    pub entities: Vec<EntityReport>,
}

impl fmt::Display for PlayReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} frames, {:.3}s, {} behavior graphs",
            self.frames, self.elapsed, self.graphs
        )?;
        for entity in &self.entities {
            writeln!(f, "{}", entity.name)?;
            for (path, value) in &entity.properties {
                writeln!(f, "  {path} = {value}")?;
            }
            for (method, count) in &entity.calls {
                writeln!(f, "  {method}() x{count}")?;
            }
        }
        Ok(())
    }
}

/// Plays a scene frame by frame, replaying scripted input
pub struct Player {
    settings: PlayerSettings,
    scene_file: SceneFile,
    scene: Rc<MemoryScene>,
    extension: BehaviorGraphExtension,
    frame: u32,
}

impl Player {
    /// Build the scene and apply its behavior metadata
    pub fn new(settings: PlayerSettings, scene_file: SceneFile, metadata: serde_json::Value) -> Result<Self> {
        let scene = scene_file.build();
        let mut extension = BehaviorGraphExtension::new(scene.clone())?.with_settings(settings.graph.clone());
        let graphs = extension.on_load(metadata)?;
        tracing::info!(
            entities = scene_file.entities.len(),
            graphs,
            "Loaded scene"
        );
        Ok(Self {
            settings,
            scene_file,
            scene,
            extension,
            frame: 0,
        })
    }

    /// Load the scene and metadata files
    pub fn load(settings: PlayerSettings, scene_path: &Path, metadata_path: &Path) -> Result<Self> {
        let scene_file = SceneFile::load(scene_path)?;
        let json = std::fs::read_to_string(metadata_path).map_err(|e| PlayerError::io(metadata_path, e))?;
        let metadata: serde_json::Value = serde_json::from_str(&json).map_err(BehaviorError::from)?;
        Self::new(settings, scene_file, metadata)
    }

    /// The behavior graph extension
    pub fn extension(&self) -> &BehaviorGraphExtension {
        &self.extension
    }

    /// Frames played so far
    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Play one frame: scripted input for the frame, then render
    pub fn step(&mut self) {
        if self.frame == 0 {
            self.scene.mark_ready();
        }
        for input in self.scene_file.input_at(self.frame) {
            tracing::debug!(frame = self.frame, key = %input.key, pressed = input.pressed, "Scripted input");
            if input.pressed {
                self.scene.key_down(&input.key);
            } else {
                self.scene.key_up(&input.key);
            }
        }
        self.scene.render_frame(self.settings.frame_time);
        self.frame += 1;
    }

    /// Play every configured frame
    pub fn run(&mut self) -> PlayReport {
        while self.frame < self.settings.frames {
            self.step();
        }
        tracing::info!(frames = self.frame, "Playback finished");
        self.report()
    }

    /// Current state of the scene
    pub fn report(&self) -> PlayReport {
        let entities = self
            .scene_file
            .entities
            .iter()
            .filter_map(|e| self.scene.entity(&e.name))
            .map(|entity| {
                let mut calls: Vec<(String, usize)> = Vec::new();
                for call in entity.calls() {
                    match calls.iter_mut().find(|(method, _)| *method == call.method) {
                        Some((_, count)) => *count += 1,
                        None => calls.push((call.method, 1)),
                    }
                }
                EntityReport {
                    name: entity.name(),
                    properties: entity.property_leaves(),
                    calls,
                }
            })
            .collect();
        PlayReport {
            frames: self.frame,
            elapsed: f64::from(self.frame) * self.settings.frame_time,
            graphs: self.extension.attached().len(),
            entities,
        }
    }

    /// Write the behavior metadata as saved after playback
    pub fn save_metadata(&mut self, path: &Path) -> Result<()> {
        let json = self.extension.on_serialize().to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| PlayerError::io(path, e))?;
        tracing::info!(path = %path.display(), "Saved behavior metadata");
        Ok(())
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("frame", &self.frame)
            .field("extension", &self.extension)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCENE: &str = r#"
        SceneFile(
            entities: [
                (name: "cube", kind: Mesh, id: Some("cube-1"), properties: {"visibility": Number(1.0)}, methods: ["beginAnimation"]),
                (name: "sun", kind: Light, properties: {"intensity": Number(1.0)}),
            ],
            input: [(frame: 2, key: "a"), (frame: 3, key: "a", pressed: false), (frame: 5, key: "a")],
        )
    "#;

    fn metadata() -> serde_json::Value {
        json!({
            "graphs": [
                {
                    "id": "keys",
                    "name": "Keys",
                    "graph": {
                        "nodes": [
                            { "id": 1, "type": "keyboard/keyboard_down", "pos": [0, 0], "size": [180, 60] },
                            { "id": 2, "type": "animation/play_animations", "pos": [200, 0], "size": [180, 60] }
                        ],
                        "links": [
                            { "id": 1, "originId": 1, "originSlot": 0, "targetId": 2, "targetSlot": 0, "type": "event" }
                        ]
                    }
                },
                {
                    "id": "dim",
                    "name": "Dim",
                    "graph": {
                        "nodes": [
                            { "id": 1, "type": "basic/number", "pos": [0, 0], "size": [180, 60],
                              "properties": { "Value": { "type": "number", "value": 0.5 } } },
                            { "id": 2, "type": "light/set_intensity", "pos": [200, 0], "size": [180, 60] }
                        ],
                        "links": [
                            { "id": 1, "originId": 1, "originSlot": 0, "targetId": 2, "targetSlot": 1, "type": "number" }
                        ]
                    }
                }
            ],
            "nodes": [
                { "node": "cube", "nodeId": "cube-1", "metadatas": [{ "graphId": "keys", "active": true }] },
                { "node": "sun", "metadatas": [{ "graphId": "dim", "active": true }] }
            ]
        })
    }

    fn entity<'a>(report: &'a PlayReport, name: &str) -> &'a EntityReport {
        report.entities.iter().find(|e| e.name == name).unwrap()
    }

    fn player(frames: u32) -> Player {
        let settings = PlayerSettings {
            frames,
            ..Default::default()
        };
        Player::new(settings, SceneFile::from_ron(SCENE).unwrap(), metadata()).unwrap()
    }

    #[test]
    fn test_run_replays_input() {
        let mut player = player(8);
        let report = player.run();
        assert_eq!(report.frames, 8);
        assert_eq!(report.graphs, 2);

        let cube = entity(&report, "cube");
        assert_eq!(cube.calls, vec![("beginAnimation".to_string(), 2)]);
        let sun = entity(&report, "sun");
        assert_eq!(sun.properties, vec![("intensity".to_string(), Value::Number(0.5))]);
        assert!(report.to_string().contains("beginAnimation() x2"));
    }

    #[test]
    fn test_graphs_wait_for_first_frame() {
        let mut player = player(1);
        assert_eq!(player.extension().running_graphs(), 0);
        player.step();
        assert_eq!(player.extension().running_graphs(), 2);
        assert_eq!(player.frame(), 1);
    }

    #[test]
    fn test_save_metadata_refreshes_names() {
        let mut player = player(1);
        player.run();
        player.scene.entity("cube").unwrap().rename("box");

        let path = std::env::temp_dir().join(format!("ordoplay_player_metadata_{}.json", std::process::id()));
        player.save_metadata(&path).unwrap();
        let saved = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(saved.contains("\"node\": \"box\""));
        assert!(saved.contains("\"graphId\": \"keys\""));
    }
}
