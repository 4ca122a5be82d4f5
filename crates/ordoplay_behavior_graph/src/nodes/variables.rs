// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph variable nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::socket::{InputSocket, OutputSocket, OutputSource};

const VARIABLE: &str = "Variable";

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new("variables/get_variable", "Get Variable", |ctx| {
            let name = ctx.property_string(VARIABLE)?;
            ctx.get_variable(&name)
        })
        .with_description("Reads a graph variable.")
        .with_property(PropertyDescriptor::new(VARIABLE, ""))
        .with_output(OutputSocket::new("Value", "any").with_source(OutputSource::Return)),
        NodeDescriptor::new("variables/set_variable", "Set Variable", |ctx| {
            let name = ctx.property_string(VARIABLE)?;
            let Some(value) = ctx.input(1) else {
                ctx.warn("No value to assign");
                return None;
            };
            if ctx.set_variable(&name, value) {
                ctx.trigger(0);
            }
            None
        })
        .with_description("Writes an existing graph variable.")
        .with_input(InputSocket::execute())
        .with_input(InputSocket::new("Value", "any"))
        .with_property(PropertyDescriptor::new(VARIABLE, ""))
        .with_output(OutputSocket::event())
        .with_output(OutputSocket::new("Value", "any").with_source(OutputSource::Input("Value".to_string()))),
    ]
}
