// SPDX-License-Identifier: MIT OR Apache-2.0
//! Generic property and method nodes.

use super::{target_path, PROPERTY_PATH};
use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::execution::NodeContext;
use crate::host::{EntityHandle, PropertyPath};
use crate::socket::{InputSocket, OutputSocket, OutputSource};
use crate::value::Value;

/// Parse the node's `Property Path`, warning when it is malformed
fn property_path(ctx: &NodeContext<'_>) -> Option<PropertyPath> {
    let raw = ctx.property_string(PROPERTY_PATH)?;
    let path = PropertyPath::parse(&raw);
    if path.is_none() {
        tracing::warn!(
            node_type = %ctx.type_path(),
            node_id = ctx.node_id().0,
            property = %raw,
            "Malformed property path"
        );
    }
    path
}

/// Write a property on an entity, warning on failure
pub(super) fn write_property(ctx: &NodeContext<'_>, entity: &EntityHandle, path: &PropertyPath, value: Value) -> bool {
    match entity.set_property(path, value) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                node_type = %ctx.type_path(),
                node_id = ctx.node_id().0,
                entity = %entity.name(),
                property = %path,
                "Failed to set property: {err}"
            );
            false
        }
    }
}

fn execute_get_property(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let path = property_path(ctx)?;
    let entity = ctx.resolve_target()?;
    match entity.get_property(&path) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                node_type = %ctx.type_path(),
                node_id = ctx.node_id().0,
                entity = %entity.name(),
                property = %path,
                "Failed to get property: {err}"
            );
            None
        }
    }
}

fn execute_set_property(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let value = ctx.input(1)?;
    let path = property_path(ctx)?;
    let entity = ctx.resolve_target()?;
    if write_property(ctx, &entity, &path, value) {
        ctx.trigger(0);
    }
    None
}

fn execute_call_method(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let method = ctx.property_string("Method")?;
    let entity = ctx.resolve_target()?;
    let args: Vec<Value> = ctx.input(1).into_iter().collect();
    match entity.call_method(&method, &args) {
        Ok(Some(result)) => ctx.set_output(1, result),
        Ok(None) => ctx.clear_output(1),
        Err(err) => {
            tracing::warn!(
                node_type = %ctx.type_path(),
                node_id = ctx.node_id().0,
                entity = %entity.name(),
                method = %method,
                "Failed to call method: {err}"
            );
            return None;
        }
    }
    ctx.trigger(0);
    None
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new("properties/get_property", "Get Property", execute_get_property)
            .with_description("Reads a property of the target by dotted path.")
            .with_property(target_path())
            .with_property(PropertyDescriptor::new(PROPERTY_PATH, "name"))
            .with_output(OutputSocket::new("Value", "any").with_source(OutputSource::Return)),
        NodeDescriptor::new("properties/set_property", "Set Property", execute_set_property)
            .with_description("Writes a property of the target by dotted path.")
            .with_input(InputSocket::execute())
            .with_input(InputSocket::new("Value", "any"))
            .with_property(target_path())
            .with_property(PropertyDescriptor::new(PROPERTY_PATH, "name"))
            .with_output(OutputSocket::event())
            .with_output(OutputSocket::new("Value", "any").with_source(OutputSource::Input("Value".to_string()))),
        NodeDescriptor::new("functions/call_method", "Call Method", execute_call_method)
            .with_description("Calls a method of the target with an optional argument.")
            .with_input(InputSocket::execute())
            .with_input(InputSocket::new("Argument", "any"))
            .with_property(target_path())
            .with_property(PropertyDescriptor::new("Method", ""))
            .with_output(OutputSocket::event())
            .with_output(OutputSocket::new("Result", "any")),
    ]
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::host::memory::{MemoryEntity, MemoryScene};
    use crate::host::{EntityKind, HostContext};
    use crate::nodes::{builtin_registry, PROPERTY_PATH, TARGET_PATH};
    use crate::value::Value;
    use std::rc::Rc;

    fn scene() -> (Rc<MemoryScene>, Rc<MemoryEntity>) {
        let scene = Rc::new(MemoryScene::new());
        let cube = scene.add_entity(
            MemoryEntity::new("cube", EntityKind::Mesh)
                .with_property("position.x", 1.0)
                .with_method("getAge", |args| {
                    Some(Value::Number(args.first().and_then(Value::as_number).unwrap_or(0.0) + 1.0))
                }),
        );
        scene.add_entity(MemoryEntity::new("sphere", EntityKind::Mesh).with_property("position.x", 4.0));
        (scene, cube)
    }

    #[test]
    fn test_get_property_of_named_target() {
        let registry = builtin_registry().unwrap();
        let (scene, cube) = scene();
        let mut graph = Graph::new("props");
        let get = graph.add_node(&registry, "properties/get_property").unwrap();
        let node = graph.node_mut(get).unwrap();
        node.set_property(TARGET_PATH, Value::from("sphere"));
        node.set_property(PROPERTY_PATH, Value::from("position.x"));
        graph.set_host(HostContext::new(cube, scene));

        graph.start();
        graph.tick(0.016);
        assert_eq!(graph.node(get).unwrap().output_value(0), Some(&Value::Number(4.0)));
    }

    #[test]
    fn test_set_property_failure_withholds_trigger() {
        let registry = builtin_registry().unwrap();
        let (scene, cube) = scene();
        let mut graph = Graph::new("props");
        let number = graph.add_node(&registry, "basic/number").unwrap();
        let set = graph.add_node(&registry, "properties/set_property").unwrap();
        let call = graph.add_node(&registry, "functions/call_method").unwrap();
        graph.node_mut(set).unwrap().set_property(PROPERTY_PATH, Value::from("physics.mass"));
        graph.node_mut(call).unwrap().set_property("Method", Value::from("getAge"));
        graph.connect(number, 0, set, 1).unwrap();
        graph.connect(set, 0, call, 0).unwrap();
        graph.set_host(HostContext::new(cube.clone(), scene));

        graph.start();
        graph.tick(0.016);
        assert_eq!(cube.call_count("getAge"), 0);

        graph.node_mut(set).unwrap().set_property(PROPERTY_PATH, Value::from("position.x"));
        graph.tick(0.016);
        assert_eq!(cube.property("position.x"), Some(Value::Number(0.0)));
        assert_eq!(cube.call_count("getAge"), 1);
    }

    #[test]
    fn test_call_method_output() {
        let registry = builtin_registry().unwrap();
        let (scene, cube) = scene();
        let mut graph = Graph::new("calls");
        let number = graph.add_node(&registry, "basic/number").unwrap();
        let call = graph.add_node(&registry, "functions/call_method").unwrap();
        graph.node_mut(number).unwrap().set_property("Value", Value::Number(41.0));
        graph.node_mut(call).unwrap().set_property("Method", Value::from("getAge"));
        graph.connect(number, 0, call, 1).unwrap();
        graph.set_host(HostContext::new(cube.clone(), scene));

        graph.start();
        graph.tick(0.016);
        assert_eq!(graph.node(call).unwrap().output_value(1), Some(&Value::Number(42.0)));

        graph.node_mut(call).unwrap().set_property("Method", Value::from("explode"));
        graph.tick(0.016);
        assert_eq!(cube.call_count("explode"), 0);
    }
}
