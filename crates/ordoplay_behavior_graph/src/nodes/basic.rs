// SPDX-License-Identifier: MIT OR Apache-2.0
//! Constant nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::socket::{InputSocket, OutputSocket, OutputSource};
use crate::value::Value;

fn constant(path: &str, name: &str, default: Value) -> NodeDescriptor {
    let output_type = default.socket_type();
    NodeDescriptor::new(path, name, |_| None)
        .with_description(format!("Outputs a constant {}.", default.type_name()))
        .with_property(PropertyDescriptor::new("Value", default))
        .with_output(
            OutputSocket::new("Value", output_type).with_source(OutputSource::Property("Value".to_string())),
        )
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        constant("basic/number", "Number", Value::Number(0.0)),
        constant("basic/string", "String", Value::from("")),
        constant("basic/boolean", "Boolean", Value::Boolean(false)),
        NodeDescriptor::new("basic/vector3", "Vector 3", |ctx| {
            let component = |name: &str| {
                ctx.input_or_property(name)
                    .and_then(|v| v.as_number())
                    .unwrap_or_default()
            };
            Some(Value::Vec3([component("x"), component("y"), component("z")]))
        })
        .with_description("Builds a vector from 3 numbers.")
        .with_input(InputSocket::new("x", "number"))
        .with_input(InputSocket::new("y", "number"))
        .with_input(InputSocket::new("z", "number"))
        .with_property(PropertyDescriptor::new("x", 0.0))
        .with_property(PropertyDescriptor::new("y", 0.0))
        .with_property(PropertyDescriptor::new("z", 0.0))
        .with_output(OutputSocket::new("Vector", "vec3").with_source(OutputSource::Return)),
    ]
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::nodes::builtin_registry;
    use crate::value::Value;

    #[test]
    fn test_vector3_mixes_inputs_and_properties() {
        let registry = builtin_registry().unwrap();
        let mut graph = Graph::new("vector");
        let number = graph.add_node(&registry, "basic/number").unwrap();
        let vector = graph.add_node(&registry, "basic/vector3").unwrap();
        graph.node_mut(number).unwrap().set_property("Value", Value::Number(2.0));
        graph.node_mut(vector).unwrap().set_property("z", Value::Number(3.0));
        graph.connect(number, 0, vector, 1).unwrap();

        graph.start();
        graph.tick(0.016);
        assert_eq!(
            graph.node(vector).unwrap().output_value(0),
            Some(&Value::Vec3([0.0, 2.0, 3.0]))
        );
    }
}
