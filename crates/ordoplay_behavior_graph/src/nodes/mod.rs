// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node catalog.
//!
//! Every built-in kind is a [`NodeDescriptor`] built by one of the category
//! modules. Nodes acting on an entity carry a `Target Path` property resolved
//! through [`NodeContext::resolve_target`](crate::execution::NodeContext::resolve_target).

mod basic;
mod debug;
mod entities;
mod keyboard;
mod math;
mod properties;
mod time;
mod variables;

use crate::descriptor::{NodeDescriptor, PropertyDescriptor};
use crate::error::RegistryError;
use crate::host::SELF_TARGET;
use crate::registry::NodeRegistry;

/// Property naming the entity a node acts on
pub const TARGET_PATH: &str = "Target Path";

/// Property holding a dotted property path on the target
pub const PROPERTY_PATH: &str = "Property Path";

/// Every built-in node kind, in palette order
pub fn builtin_descriptors() -> Vec<NodeDescriptor> {
    let mut descriptors = Vec::new();
    descriptors.extend(basic::descriptors());
    descriptors.extend(math::descriptors());
    descriptors.extend(variables::descriptors());
    descriptors.extend(properties::descriptors());
    descriptors.extend(time::descriptors());
    descriptors.extend(keyboard::descriptors());
    descriptors.extend(entities::descriptors());
    descriptors.extend(debug::descriptors());
    descriptors
}

/// Register the built-in catalog. Kinds already registered are kept.
///
/// Returns the number of newly registered kinds.
pub fn register_builtins(registry: &mut NodeRegistry) -> Result<usize, RegistryError> {
    let mut added = 0;
    for descriptor in builtin_descriptors() {
        if registry.register(descriptor)? {
            added += 1;
        }
    }
    Ok(added)
}

/// A registry holding the whole built-in catalog
pub fn builtin_registry() -> Result<NodeRegistry, RegistryError> {
    let mut registry = NodeRegistry::new();
    register_builtins(&mut registry)?;
    Ok(registry)
}

fn target_path() -> PropertyDescriptor {
    PropertyDescriptor::new(TARGET_PATH, SELF_TARGET)
}
