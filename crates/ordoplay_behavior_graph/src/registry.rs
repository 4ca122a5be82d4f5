// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of available node kinds.
//!
//! The registry is plain state owned by whoever edits or runs graphs and is
//! passed explicitly to [`Graph`](crate::graph::Graph) construction. It must
//! not be re-scoped while a graph built from it is running.

use crate::descriptor::NodeDescriptor;
use crate::error::RegistryError;
use crate::host::EntityKind;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::rc::Rc;

/// Registry of available node kinds, keyed by `category/name` path
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    /// Registered descriptors by path, in registration order
    types: IndexMap<String, Rc<NodeDescriptor>>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node kind under its path.
    ///
    /// The first registration of a path wins: later registrations are ignored
    /// and return `Ok(false)`.
    pub fn register(&mut self, descriptor: NodeDescriptor) -> Result<bool, RegistryError> {
        self.register_shared(Rc::new(descriptor))
    }

    /// Register an already shared descriptor
    pub fn register_shared(&mut self, descriptor: Rc<NodeDescriptor>) -> Result<bool, RegistryError> {
        if !is_valid_path(&descriptor.path) {
            return Err(RegistryError::InvalidPath(descriptor.path.clone()));
        }
        if self.types.contains_key(&descriptor.path) {
            tracing::trace!(path = %descriptor.path, "Node type already registered");
            return Ok(false);
        }
        self.types.insert(descriptor.path.clone(), descriptor);
        Ok(true)
    }

    /// Remove every node kind whose category is not in `allowed`.
    ///
    /// Returns the number of removed kinds.
    pub fn unregister_category<I, S>(&mut self, allowed: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = allowed.into_iter().map(|s| s.as_ref().to_string()).collect();
        let before = self.types.len();
        self.types.retain(|_, d| allowed.contains(d.category()));
        before - self.types.len()
    }

    /// Get a node kind by path
    pub fn lookup(&self, path: &str) -> Option<Rc<NodeDescriptor>> {
        self.types.get(path).cloned()
    }

    /// Check if a path is registered
    pub fn contains(&self, path: &str) -> bool {
        self.types.contains_key(path)
    }

    /// Iterate over `(path, descriptor)` in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<NodeDescriptor>)> {
        self.types.iter().map(|(path, d)| (path.as_str(), d))
    }

    /// All node kinds grouped by category, for palette display
    pub fn list_all(&self) -> IndexMap<&str, Vec<(&str, &Rc<NodeDescriptor>)>> {
        let mut groups: IndexMap<&str, Vec<(&str, &Rc<NodeDescriptor>)>> = IndexMap::new();
        for (path, descriptor) in &self.types {
            groups
                .entry(descriptor.category())
                .or_default()
                .push((path.as_str(), descriptor));
        }
        groups
    }

    /// Registered categories, in first-seen order
    pub fn categories(&self) -> Vec<&str> {
        self.list_all().keys().copied().collect()
    }

    /// Categories holding at least one node kind valid for an entity kind
    pub fn categories_for(&self, kind: EntityKind) -> Vec<&str> {
        self.list_all()
            .into_iter()
            .filter(|(_, kinds)| kinds.iter().any(|(_, d)| d.target.accepts(kind)))
            .map(|(category, _)| category)
            .collect()
    }

    /// Number of registered kinds
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.types.clear();
    }
}

/// Check that a path is lower-case `category/name[/...]` with no empty segment
pub fn is_valid_path(path: &str) -> bool {
    let mut segments = 0;
    for segment in path.split('/') {
        if segment.is_empty()
            || !segment
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return false;
        }
        segments += 1;
    }
    segments >= 2
}
