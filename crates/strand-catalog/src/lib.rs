//! strand-catalog: the built-in implementation catalog.
//!
//! Ships the CMake project blueprints plus small example components and
//! transforms, and registers them all through [`register_builtins`].

use std::sync::Arc;

use strand_compose::Registry;

pub mod cmake;
pub mod examples;

pub use cmake::CMakeBlueprint;
pub use examples::{ConfigurationExample, MinimalExample, ReplaceTransform};

/// Register every built-in implementation on the given registry.
pub fn register_builtins(registry: &mut Registry) {
    registry.register_blueprint(Arc::new(CMakeBlueprint::c()));
    registry.register_blueprint(Arc::new(CMakeBlueprint::cpp()));

    registry.register_component(Arc::new(MinimalExample));
    registry.register_component(Arc::new(ConfigurationExample));

    registry.register_transform(Arc::new(ReplaceTransform));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_resolve_by_name() {
        let mut registry = Registry::new();
        register_builtins(&mut registry);

        assert!(registry.blueprint("cmake-c").is_ok());
        assert!(registry.blueprint("cmake-cpp").is_ok());
        assert!(registry.component("minimal-example").is_ok());
        assert!(registry.component("configuration-example").is_ok());
        assert!(registry.transform("replace-example").is_ok());
    }
}
