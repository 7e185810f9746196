//! Name to implementation resolution.
//!
//! Registration is explicit: catalogs call the `register_*` methods at
//! startup and resolution is a plain table lookup. There is no filesystem
//! scanning or dynamic discovery.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::blueprint::BlueprintSpec;
use crate::component::ComponentSpec;
use crate::error::{ComposeError, ComposeResult};
use crate::transform::TransformSpec;

/// Explicit registration tables for components, transforms, and blueprints.
///
/// Each namespace is independent; the same name may appear in all three.
/// Implementations are keyed by their metadata name, and a later
/// registration under the same name replaces the earlier one.
#[derive(Default)]
pub struct Registry {
    components: BTreeMap<String, Arc<dyn ComponentSpec>>,
    transforms: BTreeMap<String, Arc<dyn TransformSpec>>,
    blueprints: BTreeMap<String, Arc<dyn BlueprintSpec>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_component(&mut self, spec: Arc<dyn ComponentSpec>) {
        self.components.insert(spec.metadata().name, spec);
    }

    pub fn register_transform(&mut self, spec: Arc<dyn TransformSpec>) {
        self.transforms.insert(spec.metadata().name, spec);
    }

    pub fn register_blueprint(&mut self, spec: Arc<dyn BlueprintSpec>) {
        self.blueprints.insert(spec.metadata().name, spec);
    }

    pub fn component(&self, name: &str) -> ComposeResult<Arc<dyn ComponentSpec>> {
        self.components.get(name).cloned().ok_or_else(|| {
            ComposeError::NotFound {
                namespace: "component",
                name: name.to_string(),
            }
        })
    }

    pub fn transform(&self, name: &str) -> ComposeResult<Arc<dyn TransformSpec>> {
        self.transforms.get(name).cloned().ok_or_else(|| {
            ComposeError::NotFound {
                namespace: "transform",
                name: name.to_string(),
            }
        })
    }

    pub fn blueprint(&self, name: &str) -> ComposeResult<Arc<dyn BlueprintSpec>> {
        self.blueprints.get(name).cloned().ok_or_else(|| {
            ComposeError::NotFound {
                namespace: "blueprint",
                name: name.to_string(),
            }
        })
    }

    /// Registered component names, sorted.
    pub fn components(&self) -> Vec<&str> {
        self.components.keys().map(String::as_str).collect()
    }

    /// Registered transform names, sorted.
    pub fn transforms(&self) -> Vec<&str> {
        self.transforms.keys().map(String::as_str).collect()
    }

    /// Registered blueprint names, sorted.
    pub fn blueprints(&self) -> Vec<&str> {
        self.blueprints.keys().map(String::as_str).collect()
    }
}
