//! Blueprints: composing components and transforms into a build.
//!
//! A blueprint implementation ([`BlueprintSpec`]) knows how to turn
//! aggregated component source into files on disk and how to drive the
//! target toolchain. The [`Blueprint`] wrapper validates a concrete set of
//! finalized components and configured transforms eagerly at construction,
//! before any file I/O, and then runs the fixed pipeline:
//!
//! ```text
//! generate -> transform(source) -> compile -> transform(artifact)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::component::Component;
use crate::dependency::Dependency;
use crate::error::{ComposeError, ComposeResult};
use crate::metadata::{Metadata, Tag};
use crate::transform::{Transform, TransformKind};

/// Options threaded through `compile` and any toolchain invocations.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// File capturing toolchain stdout. Inherited when unset.
    pub stdout: Option<PathBuf>,
    /// File capturing toolchain stderr. Inherited when unset.
    pub stderr: Option<PathBuf>,
    /// Build-local environment variables for toolchain invocations. The
    /// shared process environment is never mutated.
    pub env: BTreeMap<String, String>,
}

/// Aggregated inputs handed to a blueprint implementation.
///
/// Ordering is a documented contract: `functions` and each `calls` entry are
/// concatenated in component list order, which determines generated call
/// order.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub build_name: String,
    pub functions: Vec<String>,
    pub calls: BTreeMap<String, Vec<String>>,
    pub libraries: Vec<String>,
    pub include_dirs: Vec<String>,
}

/// A blueprint implementation.
pub trait BlueprintSpec: Send + Sync {
    fn metadata(&self) -> Metadata;

    /// Valid callsite names components may hook into.
    fn callsites(&self) -> Vec<String>;

    /// Optional extra sanity checks, run after the built-in ones.
    fn sane(&self, _components: &[Component], _transforms: &[Transform]) -> ComposeResult<()> {
        Ok(())
    }

    /// Write generated source files into `directory`, returning their paths.
    fn generate(&self, plan: &BuildPlan, directory: &Path) -> ComposeResult<Vec<PathBuf>>;

    /// Invoke the external toolchain on `directory`, returning artifact
    /// paths. Toolchain failure must surface as a build failure.
    fn compile(
        &self,
        plan: &BuildPlan,
        directory: &Path,
        options: &BuildOptions,
    ) -> ComposeResult<Vec<PathBuf>>;

    fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        Vec::new()
    }
}

/// A validated, immutable composition of components and transforms.
pub struct Blueprint {
    spec: Arc<dyn BlueprintSpec>,
    metadata: Metadata,
    build_name: String,
    components: Vec<Component>,
    transforms: Vec<Transform>,
}

impl Blueprint {
    /// Compose and validate.
    ///
    /// Checks run eagerly, before any file I/O, and the first violation
    /// found is returned: finalized state of every component, each
    /// component's support for this blueprint, each component's callsite
    /// validity, configured state of every transform, and component-list
    /// instance uniqueness. The implementation's `sane` hook runs last.
    pub fn new(
        spec: Arc<dyn BlueprintSpec>,
        build_name: impl Into<String>,
        components: Vec<Component>,
        transforms: Vec<Transform>,
    ) -> ComposeResult<Self> {
        let metadata = spec.metadata();

        if let Some(component) = components.iter().find(|c| !c.finalized()) {
            return Err(ComposeError::UnfinalizedComponent {
                component: component.metadata().to_string(),
            });
        }

        for component in &components {
            let supported = component.blueprints();
            if !supported.iter().any(|b| b == &metadata.name) {
                return Err(ComposeError::UnsupportedBlueprint {
                    component: component.metadata().to_string(),
                    blueprint: metadata.to_string(),
                    supported: supported.join(", "),
                });
            }
        }

        let callsites = spec.callsites();
        for component in &components {
            if let Some(calls) = component.calls() {
                for site in calls.keys() {
                    if !callsites.iter().any(|s| s == site) {
                        return Err(ComposeError::InvalidCallsite {
                            component: component.metadata().to_string(),
                            blueprint: metadata.to_string(),
                            callsite: site.clone(),
                        });
                    }
                }
            }
        }

        if let Some(transform) = transforms.iter().find(|t| !t.configured()) {
            return Err(ComposeError::UnconfiguredTransform {
                transform: transform.metadata().to_string(),
            });
        }

        let mut seen = BTreeSet::new();
        for component in &components {
            if !seen.insert(component.instance()) {
                return Err(ComposeError::DuplicateComponent {
                    component: component.metadata().to_string(),
                });
            }
        }

        spec.sane(&components, &transforms)?;

        Ok(Self {
            spec,
            metadata,
            build_name: build_name.into(),
            components,
            transforms,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn build_name(&self) -> &str {
        &self.build_name
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// The deduplicated union of every component's and transform's tags.
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags = BTreeSet::new();

        for component in &self.components {
            tags.extend(component.tags().iter().cloned());
        }
        for transform in &self.transforms {
            tags.extend(transform.tags().iter().cloned());
        }

        tags.into_iter().collect()
    }

    /// Every component's functions, concatenated in component list order.
    pub fn functions(&self) -> Vec<String> {
        self.components
            .iter()
            .flat_map(|c| c.functions().iter().cloned())
            .collect()
    }

    /// Per callsite, every component's call strings concatenated in
    /// component list order. Order determines generated call order.
    pub fn calls(&self) -> BTreeMap<String, Vec<String>> {
        let mut aggregated: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for component in &self.components {
            if let Some(calls) = component.calls() {
                for (site, entries) in calls {
                    aggregated
                        .entry(site.clone())
                        .or_default()
                        .extend(entries.iter().cloned());
                }
            }
        }

        aggregated
    }

    fn dedup_aggregate(&self, select: fn(&Component) -> &[String]) -> Vec<String> {
        let mut values: BTreeSet<String> = BTreeSet::new();
        for component in &self.components {
            values.extend(select(component).iter().cloned());
        }
        values.into_iter().collect()
    }

    fn plan(&self) -> BuildPlan {
        BuildPlan {
            build_name: self.build_name.clone(),
            functions: self.functions(),
            calls: self.calls(),
            libraries: self.dedup_aggregate(Component::libraries),
            include_dirs: self.dedup_aggregate(Component::include_dirs),
        }
    }

    /// Apply all transforms of the given kind to `targets`, replacing each
    /// target file in place.
    ///
    /// The replacement is staged: output is written to a temporary
    /// `<target>.transformed` path, the original is removed, and the
    /// temporary is renamed into place. A transform with zero applicable
    /// targets out of a non-empty list is a pipeline failure; an empty
    /// target list is not.
    pub fn transform(&self, kind: TransformKind, targets: &[PathBuf]) -> ComposeResult<()> {
        for transform in self.transforms.iter().filter(|t| t.kind() == kind) {
            let mut transformed = targets.is_empty();

            for target in targets {
                if !transform.supported(target) {
                    continue;
                }

                let staged = staged_path(target);
                transform.apply(target, &staged)?;
                fs::remove_file(target)?;
                fs::rename(&staged, target)?;

                transformed = true;
            }

            if !transformed {
                return Err(ComposeError::UnsupportedTransform {
                    transform: transform.metadata().to_string(),
                    kind: kind.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Fully build this blueprint.
    ///
    /// Ensures `directory` exists, then runs generate, source transforms,
    /// compile, and artifact transforms, returning the final artifacts.
    pub fn build(&self, directory: &Path, options: &BuildOptions) -> ComposeResult<Vec<PathBuf>> {
        if !directory.is_dir() {
            fs::create_dir_all(directory)?;
        }

        info!(blueprint = %self.metadata.name, build = %self.build_name, "generating sources");
        let plan = self.plan();
        let sources = self.spec.generate(&plan, directory)?;

        self.transform(TransformKind::Source, &sources)?;

        info!(blueprint = %self.metadata.name, build = %self.build_name, "compiling");
        let artifacts = self.spec.compile(&plan, directory, options)?;

        self.transform(TransformKind::Artifact, &artifacts)?;

        Ok(artifacts)
    }
}

fn staged_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".transformed");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentSpec, Generated};
    use crate::transform::TransformSpec;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use strand_core::options::{Configuration, OptionSpec, Options};

    struct DemoComponentSpec;

    impl ComponentSpec for DemoComponentSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("demo", "0.1.0").tag("test", "component-test")
        }

        fn options(&self) -> Options {
            Options::new().declare("test", OptionSpec::with_default("test"))
        }

        fn blueprints(&self) -> Vec<String> {
            vec!["test".to_string()]
        }

        fn generate(&self, configuration: &Configuration) -> ComposeResult<Generated> {
            let body = strand_core::substitute(
                "${global}-${test}",
                strand_core::Mode::Safe,
                configuration,
            )?;

            Ok(Generated {
                functions: vec![body],
                calls: BTreeMap::from([("test".to_string(), vec!["${global}".to_string()])]),
                globals: vec!["global".to_string()],
                ..Generated::default()
            })
        }
    }

    struct UnsupportedComponentSpec;

    impl ComponentSpec for UnsupportedComponentSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("unsupported", "0.1.0")
        }

        fn blueprints(&self) -> Vec<String> {
            vec!["none".to_string()]
        }

        fn generate(&self, _configuration: &Configuration) -> ComposeResult<Generated> {
            Ok(Generated {
                functions: vec!["${global}".to_string()],
                globals: vec!["global".to_string()],
                ..Generated::default()
            })
        }
    }

    struct DemoTransformSpec;

    impl TransformSpec for DemoTransformSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("demo-transform", "0.1.0").tag("test", "transform-test")
        }

        fn options(&self) -> Options {
            Options::new().declare("test", OptionSpec::required())
        }

        fn kind(&self) -> TransformKind {
            TransformKind::Source
        }

        fn apply(
            &self,
            _configuration: &Configuration,
            source: &Path,
            destination: &Path,
        ) -> ComposeResult<()> {
            fs::copy(source, destination)?;
            Ok(())
        }
    }

    struct RejectingTransformSpec;

    impl TransformSpec for RejectingTransformSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("rejecting", "0.1.0")
        }

        fn kind(&self) -> TransformKind {
            TransformKind::Source
        }

        fn supported(&self, _target: &Path) -> bool {
            false
        }

        fn apply(
            &self,
            _configuration: &Configuration,
            _source: &Path,
            _destination: &Path,
        ) -> ComposeResult<()> {
            unreachable!("never supported")
        }
    }

    struct DemoBlueprintSpec;

    impl BlueprintSpec for DemoBlueprintSpec {
        fn metadata(&self) -> Metadata {
            Metadata::new("test", "0.1.0")
        }

        fn callsites(&self) -> Vec<String> {
            vec!["test".to_string()]
        }

        fn generate(&self, _plan: &BuildPlan, _directory: &Path) -> ComposeResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }

        fn compile(
            &self,
            _plan: &BuildPlan,
            _directory: &Path,
            _options: &BuildOptions,
        ) -> ComposeResult<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    fn finalized_component() -> Component {
        let mut component = Component::new(Arc::new(DemoComponentSpec));
        component.configure(&Configuration::new()).unwrap();
        component.generate().unwrap();
        component.finalize(&mut StdRng::seed_from_u64(7)).unwrap();
        component
    }

    fn configured_transform() -> Transform {
        let mut transform = Transform::new(Arc::new(DemoTransformSpec));
        transform
            .configure(&Configuration::from([("test".to_string(), "value".to_string())]))
            .unwrap();
        transform
    }

    #[test]
    fn unfinalized_component_rejected() {
        let component = Component::new(Arc::new(DemoComponentSpec));
        let err = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![component],
            vec![configured_transform()],
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, ComposeError::UnfinalizedComponent { .. }));
    }

    #[test]
    fn unconfigured_transform_rejected() {
        let err = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![finalized_component()],
            vec![Transform::new(Arc::new(DemoTransformSpec))],
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, ComposeError::UnconfiguredTransform { .. }));
    }

    #[test]
    fn unsupported_component_rejected_with_relationship() {
        let mut component = Component::new(Arc::new(UnsupportedComponentSpec));
        component.generate().unwrap();
        component.finalize(&mut StdRng::seed_from_u64(7)).unwrap();

        let err = Blueprint::new(Arc::new(DemoBlueprintSpec), "test", vec![component], vec![])
            .map(|_| ())
            .unwrap_err();

        match err {
            ComposeError::UnsupportedBlueprint { supported, .. } => {
                assert!(supported.contains("none"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_callsite_rejected() {
        struct RogueCallsiteSpec;

        impl ComponentSpec for RogueCallsiteSpec {
            fn metadata(&self) -> Metadata {
                Metadata::new("rogue", "0.1.0")
            }

            fn blueprints(&self) -> Vec<String> {
                vec!["test".to_string()]
            }

            fn generate(&self, _configuration: &Configuration) -> ComposeResult<Generated> {
                Ok(Generated {
                    functions: vec!["${global}".to_string()],
                    calls: BTreeMap::from([(
                        "unsupported".to_string(),
                        vec!["test".to_string()],
                    )]),
                    globals: vec!["global".to_string()],
                    ..Generated::default()
                })
            }
        }

        let mut component = Component::new(Arc::new(RogueCallsiteSpec));
        component.generate().unwrap();
        component.finalize(&mut StdRng::seed_from_u64(7)).unwrap();

        let err = Blueprint::new(Arc::new(DemoBlueprintSpec), "test", vec![component], vec![])
            .map(|_| ())
            .unwrap_err();

        assert!(
            matches!(err, ComposeError::InvalidCallsite { callsite, .. } if callsite == "unsupported")
        );
    }

    #[test]
    fn duplicate_instance_rejected() {
        let component = finalized_component();
        let duplicate = component.clone();

        let err = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![component, duplicate],
            vec![],
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, ComposeError::DuplicateComponent { .. }));
    }

    #[test]
    fn independently_finalized_duplicates_allowed() {
        let blueprint = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![finalized_component(), finalized_component()],
            vec![],
        )
        .unwrap();

        assert_eq!(blueprint.components().len(), 2);
    }

    #[test]
    fn tag_aggregation() {
        let blueprint = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![finalized_component()],
            vec![configured_transform()],
        )
        .unwrap();

        let tags = blueprint.tags();
        assert!(tags.contains(&("test".to_string(), "component-test".to_string())));
        assert!(tags.contains(&("test".to_string(), "transform-test".to_string())));
    }

    #[test]
    fn call_aggregation_preserves_component_order() {
        let first = finalized_component();
        let second = finalized_component();
        let first_call = first.calls().unwrap()["test"][0].clone();
        let second_call = second.calls().unwrap()["test"][0].clone();

        let blueprint = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![first, second],
            vec![],
        )
        .unwrap();

        assert_eq!(blueprint.calls()["test"], vec![first_call, second_call]);
    }

    #[test]
    fn function_aggregation_preserves_component_order() {
        let first = finalized_component();
        let second = finalized_component();
        let expected = vec![first.functions()[0].clone(), second.functions()[0].clone()];

        let blueprint = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![first, second],
            vec![],
        )
        .unwrap();

        assert_eq!(blueprint.functions(), expected);
    }

    #[test]
    fn transform_with_no_applicable_targets_fails() {
        let mut transform = Transform::new(Arc::new(RejectingTransformSpec));
        transform.configure(&Configuration::new()).unwrap();

        let blueprint =
            Blueprint::new(Arc::new(DemoBlueprintSpec), "test", vec![], vec![transform]).unwrap();

        let err = blueprint
            .transform(TransformKind::Source, &[PathBuf::from("anything")])
            .unwrap_err();
        assert!(matches!(err, ComposeError::UnsupportedTransform { .. }));

        // Empty target lists are fine.
        blueprint.transform(TransformKind::Source, &[]).unwrap();
    }

    #[test]
    fn transform_replaces_target_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file.txt");
        fs::write(&target, "content").unwrap();

        let blueprint = Blueprint::new(
            Arc::new(DemoBlueprintSpec),
            "test",
            vec![],
            vec![configured_transform()],
        )
        .unwrap();

        blueprint
            .transform(TransformKind::Source, &[target.clone()])
            .unwrap();

        assert!(target.is_file());
        assert!(!staged_path(&target).exists());
    }

    #[test]
    fn sane_hook_runs_last() {
        struct StrictBlueprintSpec;

        impl BlueprintSpec for StrictBlueprintSpec {
            fn metadata(&self) -> Metadata {
                Metadata::new("test", "0.1.0")
            }

            fn callsites(&self) -> Vec<String> {
                vec!["test".to_string()]
            }

            fn sane(
                &self,
                components: &[Component],
                _transforms: &[Transform],
            ) -> ComposeResult<()> {
                if components.len() > 1 {
                    return Err(ComposeError::NotSane {
                        what: "at most one component supported".to_string(),
                    });
                }
                Ok(())
            }

            fn generate(
                &self,
                _plan: &BuildPlan,
                _directory: &Path,
            ) -> ComposeResult<Vec<PathBuf>> {
                Ok(Vec::new())
            }

            fn compile(
                &self,
                _plan: &BuildPlan,
                _directory: &Path,
                _options: &BuildOptions,
            ) -> ComposeResult<Vec<PathBuf>> {
                Ok(Vec::new())
            }
        }

        let err = Blueprint::new(
            Arc::new(StrictBlueprintSpec),
            "test",
            vec![finalized_component(), finalized_component()],
            vec![],
        )
        .map(|_| ())
        .unwrap_err();

        assert!(matches!(err, ComposeError::NotSane { .. }));
    }
}
