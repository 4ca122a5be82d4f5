// SPDX-License-Identifier: MIT OR Apache-2.0
//! Nodes bound to a kind of entity: meshes, lights, cameras and the scene.

use super::properties::write_property;
use super::target_path;
use crate::descriptor::{NodeDescriptor, PropertyDescriptor, TargetCapability};
use crate::execution::NodeContext;
use crate::host::PropertyPath;
use crate::socket::{InputSocket, OutputSocket, OutputSource};
use crate::value::Value;

fn execute_play_animations(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let entity = ctx.resolve_target()?;
    let args: Vec<Value> = ["From", "To", "Loop", "Speed"]
        .into_iter()
        .filter_map(|name| ctx.property(name))
        .collect();
    match entity.call_method("beginAnimation", &args) {
        Ok(_) => ctx.trigger(0),
        Err(err) => tracing::warn!(
            node_type = %ctx.type_path(),
            node_id = ctx.node_id().0,
            entity = %entity.name(),
            "Failed to play animations: {err}"
        ),
    }
    None
}

/// Write a numeric input (or its property fallback) to a property of the target
fn set_number(ctx: &mut NodeContext<'_>, input: &str, property: &str) -> Option<Value> {
    let Some(value) = ctx.input_or_property(input).and_then(|v| v.as_number()) else {
        ctx.warn(&format!("{input} is not a number"));
        return None;
    };
    let entity = ctx.resolve_target()?;
    let path = PropertyPath::parse(property)?;
    if write_property(ctx, &entity, &path, Value::Number(value)) {
        ctx.trigger(0);
    }
    None
}

fn execute_find_entity(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let name = ctx.input_or_property("Name")?;
    let name = name.as_str()?;
    let scene = ctx.scene()?;
    match scene.find_entity(name) {
        Some(entity) => Some(Value::Entity(entity.name())),
        None => {
            ctx.warn(&format!("No entity named {name}"));
            None
        }
    }
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new("animation/play_animations", "Play Animations", execute_play_animations)
            .with_description("Plays the animations of the target between From and To.")
            .with_target(TargetCapability::Mesh)
            .with_input(InputSocket::execute())
            .with_property(target_path())
            .with_property(PropertyDescriptor::new("From", 0.0))
            .with_property(PropertyDescriptor::new("To", 100.0))
            .with_property(PropertyDescriptor::new("Loop", false))
            .with_property(PropertyDescriptor::new("Speed", 1.0))
            .with_output(OutputSocket::event()),
        NodeDescriptor::new("light/set_intensity", "Set Intensity", |ctx| {
            set_number(ctx, "Intensity", "intensity")
        })
        .with_description("Sets the intensity of the target light.")
        .with_target(TargetCapability::Light)
        .with_input(InputSocket::execute())
        .with_input(InputSocket::new("Intensity", "number"))
        .with_property(target_path())
        .with_property(PropertyDescriptor::new("Intensity", 1.0))
        .with_output(OutputSocket::event()),
        NodeDescriptor::new("camera/set_fov", "Set Field Of View", |ctx| set_number(ctx, "Fov", "fov"))
            .with_description("Sets the field of view of the target camera, in radians.")
            .with_target(TargetCapability::Camera)
            .with_input(InputSocket::execute())
            .with_input(InputSocket::new("Fov", "number"))
            .with_property(target_path())
            .with_property(PropertyDescriptor::new("Fov", 0.8))
            .with_output(OutputSocket::event()),
        NodeDescriptor::new("scene/find_entity", "Find Entity", execute_find_entity)
            .with_description("Looks up a scene entity by name.")
            .with_target(TargetCapability::Scene)
            .with_input(InputSocket::new("Name", "string"))
            .with_property(PropertyDescriptor::new("Name", ""))
            .with_output(OutputSocket::new("Entity", "entity").with_source(OutputSource::Return)),
    ]
}
