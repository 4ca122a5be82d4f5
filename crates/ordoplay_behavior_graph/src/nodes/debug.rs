// SPDX-License-Identifier: MIT OR Apache-2.0
//! Debugging nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::socket::{InputSocket, OutputSocket};

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![NodeDescriptor::new("debug/log", "Log", |ctx| {
        let message = ctx
            .input_or_property("Message")
            .map(|value| value.to_string())
            .unwrap_or_default();
        tracing::info!(
            graph = %ctx.graph().name,
            node_id = ctx.node_id().0,
            "{message}"
        );
        ctx.trigger(0);
        None
    })
    .with_description("Logs a message and passes the trigger on.")
    .with_input(InputSocket::execute())
    .with_input(InputSocket::new("Message", "any"))
    .with_property(PropertyDescriptor::new("Message", ""))
    .with_output(OutputSocket::event())]
}
