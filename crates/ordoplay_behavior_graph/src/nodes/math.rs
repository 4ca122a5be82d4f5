// SPDX-License-Identifier: MIT OR Apache-2.0
//! Math and logic nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::execution::NodeContext;
use crate::socket::{InputSocket, OutputSocket, OutputSource};
use crate::value::Value;

const NUMERIC: &str = "number,vec2,vec3,vec4,col3,col4";

fn add(a: &Value, b: &Value) -> Option<Value> {
    fn zip<const N: usize>(a: &[f64; N], b: &[f64; N]) -> [f64; N] {
        std::array::from_fn(|i| a[i] + b[i])
    }
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => Some(Value::Number(a + b)),
        (Value::Vec2(a), Value::Vec2(b)) => Some(Value::Vec2(zip(a, b))),
        (Value::Vec3(a), Value::Vec3(b)) => Some(Value::Vec3(zip(a, b))),
        (Value::Vec4(a), Value::Vec4(b)) => Some(Value::Vec4(zip(a, b))),
        (Value::Col3(a), Value::Col3(b)) => Some(Value::Col3(zip(a, b))),
        (Value::Col4(a), Value::Col4(b)) => Some(Value::Col4(zip(a, b))),
        _ => None,
    }
}

fn execute_add(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let (a, b) = (ctx.input(0)?, ctx.input(1)?);
    let sum = add(&a, &b);
    if sum.is_none() {
        ctx.warn(&format!("Can't add {} and {}", a.type_name(), b.type_name()));
    }
    sum
}

fn execute_clamp(ctx: &mut NodeContext<'_>) -> Option<Value> {
    let value = ctx.input(0)?.as_number()?;
    let min = ctx.property_number("Min").unwrap_or(f64::NEG_INFINITY);
    let max = ctx.property_number("Max").unwrap_or(f64::INFINITY);
    if min > max {
        ctx.warn("Clamp bounds are inverted");
        return None;
    }
    Some(Value::Number(value.clamp(min, max)))
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new("math/add", "Add", execute_add)
            .with_description("Adds two numbers, or two vectors/colors of the same size.")
            .with_input(InputSocket::new("a", NUMERIC))
            .with_input(InputSocket::new("b", NUMERIC))
            .with_output(OutputSocket::new("Result", NUMERIC).with_source(OutputSource::Return)),
        NodeDescriptor::new("math/clamp", "Clamp", execute_clamp)
            .with_description("Clamps a number between Min and Max.")
            .with_input(InputSocket::new("Value", "number"))
            .with_property(PropertyDescriptor::new("Min", 0.0))
            .with_property(PropertyDescriptor::new("Max", 1.0))
            .with_output(OutputSocket::new("Result", "number").with_source(OutputSource::Return)),
        NodeDescriptor::new("logic/equals", "Equals", |ctx| {
            Some(Value::Boolean(ctx.input(0) == ctx.input(1)))
        })
        .with_description("Checks if both inputs hold the same value.")
        .with_input(InputSocket::new("a", "any"))
        .with_input(InputSocket::new("b", "any"))
        .with_output(OutputSocket::new("Result", "boolean").with_source(OutputSource::Return)),
        NodeDescriptor::new("logic/not", "Not", |ctx| {
            let value = ctx.input(0)?;
            Some(Value::Boolean(!value.is_truthy()))
        })
        .with_description("Negates the truthiness of its input.")
        .with_input(InputSocket::new("Value", "any"))
        .with_output(OutputSocket::new("Result", "boolean").with_source(OutputSource::Return)),
    ]
}
