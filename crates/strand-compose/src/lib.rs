//! strand-compose: entity lifecycle and blueprint composition.
//!
//! Provides:
//! - `Component` and `Transform` instances with configure/generate/finalize
//!   lifecycles over trait-object implementations
//! - Symbol uniqueification so multiple instances of one component can
//!   coexist in a single build
//! - `Blueprint` composition with eager sanity checks and the
//!   generate -> transform -> compile -> transform build pipeline
//! - An explicit registration table resolving names to implementations
//! - Build-from-configuration orchestration

pub mod blueprint;
pub mod build;
pub mod component;
pub mod dependency;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod transform;

pub use blueprint::{Blueprint, BlueprintSpec, BuildOptions, BuildPlan};
pub use build::{
    build, build_with_env, BlueprintSource, BuildConfig, BuildProduct, ComponentEntry,
    ComponentSource, TransformEntry, TransformSource,
};
pub use component::{Component, ComponentSpec, Generated, InstanceId};
pub use dependency::{ensure_installed, BinaryDependency, Dependency, ManualDependency};
pub use error::{ComposeError, ComposeResult};
pub use metadata::{Metadata, Tag};
pub use registry::Registry;
pub use transform::{Transform, TransformKind, TransformSpec};
