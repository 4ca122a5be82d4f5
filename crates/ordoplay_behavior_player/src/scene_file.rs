// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene description played by the headless player.
//!
//! ```ron
//! SceneFile(
//!     entities: [
//!         (name: "cube", kind: Mesh, properties: {"visibility": Number(1.0)}, methods: ["beginAnimation"]),
//!     ],
//!     input: [(frame: 2, key: "a")],
//! )
//! ```

use crate::error::{PlayerError, Result};
use indexmap::IndexMap;
use ordoplay_behavior_graph::host::memory::{MemoryEntity, MemoryScene};
use ordoplay_behavior_graph::host::EntityKind;
use ordoplay_behavior_graph::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::rc::Rc;

/// Property value as written in a scene file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneValue {
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
    /// 2D vector
    Vec2([f64; 2]),
    /// 3D vector
    Vec3([f64; 3]),
    /// 4D vector
    Vec4([f64; 4]),
    /// RGB color
    Col3([f64; 3]),
    /// RGBA color
    Col4([f64; 4]),
    /// Entity, by name
    Entity(String),
}

impl From<SceneValue> for Value {
    fn from(value: SceneValue) -> Self {
        match value {
            SceneValue::Number(v) => Value::Number(v),
            SceneValue::String(v) => Value::String(v),
            SceneValue::Boolean(v) => Value::Boolean(v),
            SceneValue::Vec2(v) => Value::Vec2(v),
            SceneValue::Vec3(v) => Value::Vec3(v),
            SceneValue::Vec4(v) => Value::Vec4(v),
            SceneValue::Col3(v) => Value::Col3(v),
            SceneValue::Col4(v) => Value::Col4(v),
            SceneValue::Entity(v) => Value::Entity(v),
        }
    }
}

/// An entity of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityFile {
    /// Entity name
    pub name: String,
    /// Entity kind
    pub kind: EntityKind,
    /// Stable id. Generated when omitted.
    #[serde(default)]
    pub id: Option<String>,
    /// Initial properties, by dotted path
    #[serde(default)]
    pub properties: IndexMap<String, SceneValue>,
    /// Methods the entity answers. Calls are recorded and return nothing.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// A scripted key event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInput {
    /// Frame before which the event is sent, starting at 0
    pub frame: u32,
    /// Key name
    pub key: String,
    /// `true` for a press, `false` for a release
    #[serde(default = "default_pressed")]
    pub pressed: bool,
}

fn default_pressed() -> bool {
    true
}

/// A scene description with scripted input
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    /// Properties of the scene itself, by dotted path
    pub properties: IndexMap<String, SceneValue>,
    /// Entities, in scene order
    pub entities: Vec<EntityFile>,
    /// Scripted keyboard input
    pub input: Vec<KeyInput>,
}

impl SceneFile {
    /// Parse a scene from RON
    pub fn from_ron(source: &str) -> std::result::Result<Self, ron::error::SpannedError> {
        ron::from_str(source)
    }

    /// Load a scene file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PlayerError::io(path, e))?;
        Self::from_ron(&content).map_err(|source| PlayerError::Ron {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build an in-memory scene
    pub fn build(&self) -> Rc<MemoryScene> {
        let scene = Rc::new(MemoryScene::new());
        for (path, value) in &self.properties {
            scene.root().insert_property(path, value.clone());
        }
        for entity in &self.entities {
            let mut built = MemoryEntity::new(entity.name.clone(), entity.kind);
            if let Some(id) = &entity.id {
                built = built.with_id(id.clone());
            }
            for (path, value) in &entity.properties {
                built = built.with_property(path, value.clone());
            }
            for method in &entity.methods {
                built = built.with_method(method.clone(), |_| None);
            }
            scene.add_entity(built);
        }
        tracing::debug!(entities = self.entities.len(), input = self.input.len(), "Built scene");
        scene
    }

    /// Key events scheduled before a frame, in file order
    pub fn input_at(&self, frame: u32) -> impl Iterator<Item = &KeyInput> {
        self.input.iter().filter(move |k| k.frame == frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordoplay_behavior_graph::host::{HostScene, SceneObject};

    const SCENE: &str = r#"
        SceneFile(
            properties: {"gravity": Number(-9.8)},
            entities: [
                (
                    name: "cube",
                    kind: Mesh,
                    id: Some("cube-1"),
                    properties: {"visibility": Number(1.0), "position.x": Number(2.0), "label": String("box")},
                    methods: ["beginAnimation"],
                ),
                (name: "sun", kind: Light),
            ],
            input: [(frame: 2, key: "a"), (frame: 4, key: "a", pressed: false)],
        )
    "#;

    #[test]
    fn test_build_scene() {
        let file = SceneFile::from_ron(SCENE).unwrap();
        let scene = file.build();
        let cube = scene.entity("cube").unwrap();
        assert_eq!(cube.id(), "cube-1");
        assert_eq!(cube.kind(), EntityKind::Mesh);
        assert_eq!(cube.property("position.x"), Some(Value::Number(2.0)));
        assert_eq!(cube.property("label"), Some(Value::from("box")));
        assert!(cube.call_method("beginAnimation", &[]).is_ok());
        assert_eq!(scene.root().property("gravity"), Some(Value::Number(-9.8)));
        assert_eq!(scene.entities().len(), 2);
        assert!(!scene.is_ready());
    }

    #[test]
    fn test_scripted_input() {
        let file = SceneFile::from_ron(SCENE).unwrap();
        assert_eq!(file.input_at(0).count(), 0);
        assert!(file.input_at(2).all(|k| k.pressed));
        assert!(file.input_at(4).all(|k| !k.pressed));
    }

    #[test]
    fn test_empty_scene() {
        let file = SceneFile::from_ron("SceneFile()").unwrap();
        assert_eq!(file, SceneFile::default());
        assert!(file.build().entities().is_empty());
    }
}
