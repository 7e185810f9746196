//! Build orchestration from a declarative configuration.
//!
//! A [`BuildConfig`] names one blueprint plus ordered component and
//! transform entries with their configuration parameters. [`build`] resolves
//! every name through a [`Registry`], drives each instance through its
//! lifecycle, composes the blueprint, and runs the pipeline into an output
//! directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::RngCore;
use serde_json::Value;
use tracing::info;

use strand_core::options::Configuration;

use crate::blueprint::{Blueprint, BlueprintSpec, BuildOptions};
use crate::component::{Component, ComponentSpec};
use crate::dependency::ensure_installed;
use crate::error::{ComposeError, ComposeResult};
use crate::metadata::Tag;
use crate::registry::Registry;
use crate::transform::{Transform, TransformSpec};

/// Where a component implementation comes from: a registry name or an
/// already-constructed implementation.
#[derive(Clone)]
pub enum ComponentSource {
    Name(String),
    Spec(Arc<dyn ComponentSpec>),
}

#[derive(Clone)]
pub enum TransformSource {
    Name(String),
    Spec(Arc<dyn TransformSpec>),
}

#[derive(Clone)]
pub enum BlueprintSource {
    Name(String),
    Spec(Arc<dyn BlueprintSpec>),
}

/// One component entry of a build configuration.
#[derive(Clone)]
pub struct ComponentEntry {
    pub source: ComponentSource,
    pub configuration: Configuration,
}

impl ComponentEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source: ComponentSource::Name(name.into()),
            configuration: Configuration::new(),
        }
    }
}

/// One transform entry of a build configuration.
#[derive(Clone)]
pub struct TransformEntry {
    pub source: TransformSource,
    pub configuration: Configuration,
}

impl TransformEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source: TransformSource::Name(name.into()),
            configuration: Configuration::new(),
        }
    }
}

/// A declarative build: one blueprint, ordered components, ordered
/// transforms.
#[derive(Clone)]
pub struct BuildConfig {
    pub name: String,
    pub blueprint: BlueprintSource,
    pub components: Vec<ComponentEntry>,
    pub transforms: Vec<TransformEntry>,
}

impl BuildConfig {
    /// Parse a JSON build configuration document.
    ///
    /// All missing top-level keys are reported together rather than one at a
    /// time.
    pub fn from_json(text: &str) -> ComposeResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| {
            ComposeError::ConfigurationError {
                what: format!("malformed JSON: {e}"),
            }
        })?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> ComposeResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ComposeError::ConfigurationError {
                what: "build configuration must be a JSON object".to_string(),
            }
        })?;

        let missing: Vec<&str> = ["name", "blueprint", "components", "transforms"]
            .into_iter()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(ComposeError::ConfigurationError {
                what: format!("missing keys: {}", missing.join(", ")),
            });
        }

        let name = expect_string(&object["name"], "name")?;
        let blueprint = BlueprintSource::Name(expect_string(&object["blueprint"], "blueprint")?);

        let components = expect_array(&object["components"], "components")?
            .iter()
            .map(|entry| {
                let (name, configuration) = parse_entry(entry, "component")?;
                Ok(ComponentEntry {
                    source: ComponentSource::Name(name),
                    configuration,
                })
            })
            .collect::<ComposeResult<Vec<_>>>()?;

        let transforms = expect_array(&object["transforms"], "transforms")?
            .iter()
            .map(|entry| {
                let (name, configuration) = parse_entry(entry, "transform")?;
                Ok(TransformEntry {
                    source: TransformSource::Name(name),
                    configuration,
                })
            })
            .collect::<ComposeResult<Vec<_>>>()?;

        Ok(Self {
            name,
            blueprint,
            components,
            transforms,
        })
    }
}

fn expect_string(value: &Value, key: &str) -> ComposeResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ComposeError::ConfigurationError {
            what: format!("{key} must be a string"),
        })
}

fn expect_array<'a>(value: &'a Value, key: &str) -> ComposeResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ComposeError::ConfigurationError {
            what: format!("{key} must be an array"),
        })
}

/// Parse one `{"name": ..., "configuration": {...}}` entry. The
/// configuration key is optional; all values are coerced to strings.
fn parse_entry(value: &Value, kind: &str) -> ComposeResult<(String, Configuration)> {
    let object = value.as_object().ok_or_else(|| {
        ComposeError::ConfigurationError {
            what: format!("each {kind} entry must be an object"),
        }
    })?;

    let name = object
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ComposeError::ConfigurationError {
            what: format!("{kind} entry is missing a name"),
        })?;

    let mut configuration = Configuration::new();
    if let Some(parameters) = object.get("configuration") {
        let parameters = parameters.as_object().ok_or_else(|| {
            ComposeError::ConfigurationError {
                what: format!("{kind} {name:?}: configuration must be an object"),
            }
        })?;

        for (key, value) in parameters {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                other => {
                    return Err(ComposeError::ConfigurationError {
                        what: format!("{kind} {name:?}: parameter {key:?} has unsupported value {other}"),
                    });
                }
            };
            configuration.insert(key.clone(), value);
        }
    }

    Ok((name, configuration))
}

/// The output of a successful build.
#[derive(Debug, Clone)]
pub struct BuildProduct {
    /// Final artifact paths, after artifact transforms.
    pub artifacts: Vec<PathBuf>,
    /// Deduplicated tags of everything that participated.
    pub tags: Vec<Tag>,
}

fn resolve_component(
    registry: &Registry,
    source: &ComponentSource,
) -> ComposeResult<Arc<dyn ComponentSpec>> {
    match source {
        ComponentSource::Name(name) => registry.component(name),
        ComponentSource::Spec(spec) => Ok(spec.clone()),
    }
}

fn resolve_transform(
    registry: &Registry,
    source: &TransformSource,
) -> ComposeResult<Arc<dyn TransformSpec>> {
    match source {
        TransformSource::Name(name) => registry.transform(name),
        TransformSource::Spec(spec) => Ok(spec.clone()),
    }
}

fn resolve_blueprint(
    registry: &Registry,
    source: &BlueprintSource,
) -> ComposeResult<Arc<dyn BlueprintSpec>> {
    match source {
        BlueprintSource::Name(name) => registry.blueprint(name),
        BlueprintSource::Spec(spec) => Ok(spec.clone()),
    }
}

/// Run a full build into `output`.
///
/// Resolves the blueprint and every entry, checks external dependencies,
/// drives each component through configure/generate/finalize and each
/// transform through configure, composes the blueprint, and executes the
/// pipeline.
pub fn build(
    registry: &Registry,
    config: &BuildConfig,
    output: &Path,
    options: &BuildOptions,
    rng: &mut dyn RngCore,
) -> ComposeResult<BuildProduct> {
    let blueprint_spec = resolve_blueprint(registry, &config.blueprint)?;
    let blueprint_metadata = blueprint_spec.metadata();
    ensure_installed(&blueprint_metadata.name, &blueprint_spec.dependencies())?;

    info!(build = %config.name, blueprint = %blueprint_metadata.name, "starting build");

    let mut components = Vec::with_capacity(config.components.len());
    for entry in &config.components {
        let spec = resolve_component(registry, &entry.source)?;
        ensure_installed(&spec.metadata().name, &spec.dependencies())?;

        let mut component = Component::new(spec);
        component.configure(&entry.configuration)?;
        component.generate()?;
        component.finalize(rng)?;
        components.push(component);
    }

    let mut transforms = Vec::with_capacity(config.transforms.len());
    for entry in &config.transforms {
        let spec = resolve_transform(registry, &entry.source)?;
        ensure_installed(&spec.metadata().name, &spec.dependencies())?;

        let mut transform = Transform::new(spec);
        transform.configure(&entry.configuration)?;
        transforms.push(transform);
    }

    let blueprint = Blueprint::new(blueprint_spec, config.name.clone(), components, transforms)?;
    let tags = blueprint.tags();
    let artifacts = blueprint.build(output, options)?;

    info!(build = %config.name, artifacts = artifacts.len(), "build complete");

    Ok(BuildProduct { artifacts, tags })
}

/// Build against an explicit environment map.
///
/// Convenience over [`build`] for callers that only customize the toolchain
/// environment.
pub fn build_with_env(
    registry: &Registry,
    config: &BuildConfig,
    output: &Path,
    env: BTreeMap<String, String>,
    rng: &mut dyn RngCore,
) -> ComposeResult<BuildProduct> {
    let options = BuildOptions {
        env,
        ..BuildOptions::default()
    };
    build(registry, config, output, &options, rng)
}
