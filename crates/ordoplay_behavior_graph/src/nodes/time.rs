// SPDX-License-Identifier: MIT OR Apache-2.0
//! Time and render loop nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor, TriggerSource};
use crate::execution::{NodeContext, TimerHandle};
use crate::socket::{InputSocket, OutputSocket, OutputSource};
use crate::value::Value;

fn execute_set_timeout(ctx: &mut NodeContext<'_>) -> Option<Value> {
    if let Some(handle) = ctx.scratch().get::<TimerHandle>().copied() {
        if ctx.is_timer_pending(handle) {
            return None;
        }
    }
    let delay = ctx.property_number("Delay").unwrap_or_default();
    let handle = ctx.schedule_timer(delay, 0);
    ctx.scratch_mut().insert(handle);
    None
}

fn stop_set_timeout(ctx: &mut NodeContext<'_>) {
    if let Some(handle) = ctx.scratch_mut().remove::<TimerHandle>() {
        ctx.cancel_timer(handle);
    }
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new("time/get_time", "Get Time", |ctx| Some(Value::Number(ctx.global_time())))
            .with_description("Seconds elapsed since the graph started.")
            .with_output(OutputSocket::new("Time", "number").with_source(OutputSource::Return)),
        NodeDescriptor::new("time/set_timeout", "Set Timeout", execute_set_timeout)
            .with_description("Fires once after Delay seconds. Pending timeouts are not restarted.")
            .with_input(InputSocket::execute())
            .with_property(PropertyDescriptor::new("Delay", 1.0))
            .with_output(OutputSocket::event())
            .with_on_stop(stop_set_timeout),
        NodeDescriptor::new("render/render_loop", "Render Loop", |ctx| {
            ctx.trigger(0);
            None
        })
        .with_description("Fires on every rendered frame.")
        .with_output(OutputSocket::event())
        .with_trigger_source(TriggerSource::RenderLoop),
        NodeDescriptor::new("render/render_start", "Render Start", |ctx| {
            ctx.trigger(0);
            None
        })
        .with_description("Fires on the first rendered frame after the graph starts.")
        .with_output(OutputSocket::event())
        .with_trigger_source(TriggerSource::RenderOnce),
    ]
}
