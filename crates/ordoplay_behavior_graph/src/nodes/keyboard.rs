// SPDX-License-Identifier: MIT OR Apache-2.0
//! Keyboard event nodes.

use crate::descriptor::{NodeDescriptor, PropertyDescriptor, TriggerSource};
use crate::execution::NodeContext;
use crate::host::HostEvent;
use crate::socket::OutputSocket;

const KEY: &str = "Key";
const RESET_STATE: &str = "Reset State";

/// Key currently held down, for nodes that ignore auto-repeat
struct KeyHeld;

fn matches_key(ctx: &NodeContext<'_>, key: &str) -> bool {
    ctx.property_string(KEY)
        .is_some_and(|expected| expected.eq_ignore_ascii_case(key))
}

fn on_key_down_event(ctx: &mut NodeContext<'_>, event: &HostEvent) {
    if !matches_key(ctx, event.key()) {
        return;
    }
    match event {
        HostEvent::KeyDown { .. } => {
            let reset_state = ctx.property_bool(RESET_STATE).unwrap_or(true);
            let repeated = ctx.scratch_mut().insert(KeyHeld).is_some();
            if reset_state || !repeated {
                ctx.trigger(0);
            }
        }
        HostEvent::KeyUp { .. } => {
            ctx.scratch_mut().remove::<KeyHeld>();
        }
    }
}

fn on_key_up_event(ctx: &mut NodeContext<'_>, event: &HostEvent) {
    if matches!(event, HostEvent::KeyUp { .. }) && matches_key(ctx, event.key()) {
        ctx.trigger(0);
    }
}

fn key_node(path: &str, name: &str) -> NodeDescriptor {
    NodeDescriptor::new(path, name, |_| None)
        .with_property(PropertyDescriptor::new(KEY, "a"))
        .with_output(OutputSocket::event())
        .with_trigger_source(TriggerSource::HostEvent)
}

pub(super) fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        key_node("keyboard/keyboard_down", "Keyboard Down")
            .with_description(
                "Fires when Key is pressed. With Reset State off, auto-repeat is ignored until the key is released.",
            )
            .with_property(PropertyDescriptor::new(RESET_STATE, true))
            .with_on_event(on_key_down_event),
        key_node("keyboard/keyboard_up", "Keyboard Up")
            .with_description("Fires when Key is released.")
            .with_on_event(on_key_up_event),
    ]
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::host::memory::{MemoryEntity, MemoryScene};
    use crate::host::{EntityKind, HostContext, HostEvent};
    use crate::node::ExecutionMode;
    use crate::nodes::builtin_registry;
    use crate::value::Value;
    use std::rc::Rc;

    fn key_down(key: &str) -> HostEvent {
        HostEvent::KeyDown { key: key.to_string() }
    }

    fn key_up(key: &str) -> HostEvent {
        HostEvent::KeyUp { key: key.to_string() }
    }

    #[test]
    fn test_keyboard_down_plays_animation_once_per_press() {
        let registry = builtin_registry().unwrap();
        let scene = Rc::new(MemoryScene::new());
        let cube = scene.add_entity(
            MemoryEntity::new("cube", EntityKind::Mesh).with_method("beginAnimation", |_| None),
        );

        let mut graph = Graph::new("keys");
        let keyboard = graph.add_node(&registry, "keyboard/keyboard_down").unwrap();
        let play = graph.add_node(&registry, "animation/play_animations").unwrap();
        graph.connect(keyboard, 0, play, 0).unwrap();
        graph.set_host(HostContext::new(cube.clone(), scene));
        assert_eq!(graph.node(keyboard).unwrap().mode(), ExecutionMode::OnEvent);
        assert_eq!(graph.node(play).unwrap().mode(), ExecutionMode::OnTrigger);

        graph.start();
        graph.tick(0.016);
        assert_eq!(cube.call_count("beginAnimation"), 0);

        graph.dispatch_event(&key_down("a"));
        assert_eq!(cube.call_count("beginAnimation"), 1);
        for _ in 0..10 {
            graph.tick(0.016);
        }
        assert_eq!(cube.call_count("beginAnimation"), 1);

        graph.dispatch_event(&key_down("b"));
        graph.dispatch_event(&key_down("A"));
        assert_eq!(cube.call_count("beginAnimation"), 2);
    }

    #[test]
    fn test_auto_repeat_without_reset_state() {
        let registry = builtin_registry().unwrap();
        let mut graph = Graph::new("keys");
        graph.add_variable("presses", 0.0);
        let keyboard = graph.add_node(&registry, "keyboard/keyboard_down").unwrap();
        let one = graph.add_node(&registry, "basic/number").unwrap();
        let get = graph.add_node(&registry, "variables/get_variable").unwrap();
        let add = graph.add_node(&registry, "math/add").unwrap();
        let set = graph.add_node(&registry, "variables/set_variable").unwrap();
        graph.node_mut(keyboard).unwrap().set_property("Reset State", Value::Boolean(false));
        graph.node_mut(get).unwrap().set_property("Variable", Value::from("presses"));
        graph.node_mut(set).unwrap().set_property("Variable", Value::from("presses"));
        graph.node_mut(one).unwrap().set_property("Value", Value::Number(1.0));
        graph.connect(get, 0, add, 0).unwrap();
        graph.connect(one, 0, add, 1).unwrap();
        graph.connect(keyboard, 0, set, 0).unwrap();
        graph.connect(add, 0, set, 1).unwrap();

        graph.start();
        graph.tick(0.016);
        graph.dispatch_event(&key_down("a"));
        graph.tick(0.016);
        graph.dispatch_event(&key_down("a"));
        graph.tick(0.016);
        assert_eq!(graph.get_variable("presses"), Some(&Value::Number(1.0)));

        graph.dispatch_event(&key_up("a"));
        graph.dispatch_event(&key_down("a"));
        assert_eq!(graph.get_variable("presses"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_keyboard_up() {
        let registry = builtin_registry().unwrap();
        let mut graph = Graph::new("keys");
        graph.add_variable("released", false);
        let keyboard = graph.add_node(&registry, "keyboard/keyboard_up").unwrap();
        let flag = graph.add_node(&registry, "basic/boolean").unwrap();
        let set = graph.add_node(&registry, "variables/set_variable").unwrap();
        graph.node_mut(keyboard).unwrap().set_property("Key", Value::from("space"));
        graph.node_mut(flag).unwrap().set_property("Value", Value::Boolean(true));
        graph.node_mut(set).unwrap().set_property("Variable", Value::from("released"));
        graph.connect(keyboard, 0, set, 0).unwrap();
        graph.connect(flag, 0, set, 1).unwrap();

        graph.start();
        graph.tick(0.016);
        graph.dispatch_event(&key_down("space"));
        assert_eq!(graph.get_variable("released"), Some(&Value::Boolean(false)));
        graph.dispatch_event(&key_up("space"));
        assert_eq!(graph.get_variable("released"), Some(&Value::Boolean(true)));
    }
}
