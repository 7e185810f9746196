//! Parallel, failure-isolated build fan-out.
//!
//! Every sample configuration becomes one independent build in its own
//! uniquely-named working directory under the dataset output directory,
//! with captured stdout/stderr. A failure inside one sample is caught at
//! the task boundary, logged, and persisted next to that sample's
//! artifacts; it never aborts sibling builds. The label map is written
//! once, after every worker has returned.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{info, warn};

use strand_compose::{
    build, BlueprintSource, BuildConfig, BuildOptions, ComponentEntry, ComponentSource, Registry,
    Tag, TransformEntry, TransformSource,
};
use strand_core::parse_spec;

use crate::error::{DatasetError, DatasetResult};
use crate::labels::{write_labels, LabelEntry, LabelMap};

/// Default worker count: half the available parallel-execution units, with
/// a floor of one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Find the single blueprint every identifier's component supports.
///
/// Identifiers use the `name:key=value` mini-language; only the name part
/// participates. Zero or more than one candidate is an error.
pub fn resolve_blueprint<'a, I>(registry: &Registry, identifiers: I) -> DatasetResult<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut common: Option<BTreeSet<String>> = None;

    for identifier in identifiers {
        let spec = parse_spec(identifier)?;
        let supported: BTreeSet<String> = registry
            .component(&spec.name)?
            .blueprints()
            .into_iter()
            .collect();

        common = Some(match common {
            None => supported,
            Some(common) => common.intersection(&supported).cloned().collect(),
        });
    }

    let candidates = common.unwrap_or_default();
    match candidates.len() {
        0 => Err(DatasetError::NoCommonBlueprint),
        1 => Ok(candidates.into_iter().next().unwrap()),
        _ => Err(DatasetError::AmbiguousBlueprint {
            candidates: candidates.into_iter().collect::<Vec<_>>().join(", "),
        }),
    }
}

/// Drives dataset fan-out over a registry of implementations.
pub struct DatasetRunner<'r> {
    registry: &'r Registry,
    workers: usize,
    seed: Option<u64>,
    transforms: Vec<String>,
    env: BTreeMap<String, String>,
}

impl<'r> DatasetRunner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            workers: default_workers(),
            seed: None,
            transforms: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Seed for deterministic generation. Each sample derives its own
    /// generator from this seed and its index, so results do not depend on
    /// the worker count.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Apply a transform (in the `name:key=value` mini-language) to every
    /// sample.
    pub fn transform(mut self, identifier: impl Into<String>) -> Self {
        self.transforms.push(identifier.into());
        self
    }

    /// Pass a toolchain environment variable to every build. The shared
    /// process environment is never mutated.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    fn sample_rng(&self, index: usize) -> StdRng {
        match self.seed {
            Some(seed) => {
                let salted = seed.wrapping_add((index as u64).wrapping_mul(0x9e3779b97f4a7c15));
                StdRng::seed_from_u64(salted)
            }
            None => StdRng::from_entropy(),
        }
    }

    fn transform_entries(&self) -> DatasetResult<Vec<TransformEntry>> {
        self.transforms
            .iter()
            .map(|identifier| {
                let spec = parse_spec(identifier)?;
                // Resolve eagerly so a bad transform name fails the whole
                // dataset instead of every individual sample.
                self.registry.transform(&spec.name)?;
                Ok(TransformEntry {
                    source: TransformSource::Name(spec.name),
                    configuration: spec.configuration,
                })
            })
            .collect()
    }

    fn build_sample(
        &self,
        index: usize,
        identifiers: &[String],
        blueprint: &str,
        transforms: &[TransformEntry],
        output: &Path,
    ) -> Option<(String, Vec<Tag>)> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let directory = output.join(&id);

        let result = (|| -> DatasetResult<Vec<Tag>> {
            fs::create_dir_all(&directory)?;

            let components = identifiers
                .iter()
                .map(|identifier| {
                    let spec = parse_spec(identifier)?;
                    Ok(ComponentEntry {
                        source: ComponentSource::Name(spec.name),
                        configuration: spec.configuration,
                    })
                })
                .collect::<DatasetResult<Vec<_>>>()?;

            let config = BuildConfig {
                name: id.clone(),
                blueprint: BlueprintSource::Name(blueprint.to_string()),
                components,
                transforms: transforms.to_vec(),
            };

            let options = BuildOptions {
                stdout: Some(directory.join("stdout.log")),
                stderr: Some(directory.join("stderr.log")),
                env: self.env.clone(),
            };

            let product = build(
                self.registry,
                &config,
                &directory,
                &options,
                &mut self.sample_rng(index),
            )?;
            Ok(product.tags)
        })();

        match result {
            Ok(tags) => {
                info!(sample = %id, index, "sample built");
                Some((id, tags))
            }
            Err(e) => {
                warn!(sample = %id, index, error = %e, "sample build failed");
                // Best effort; the directory itself may have failed to appear.
                let _ = fs::write(directory.join("error.log"), format!("{e}\n"));
                None
            }
        }
    }

    /// Build every sample, returning per-sample results index-aligned with
    /// the input list. Failed samples yield `None`.
    pub fn run(
        &self,
        samples: &[Vec<String>],
        output: &Path,
    ) -> DatasetResult<Vec<Option<(String, Vec<Tag>)>>> {
        if !output.is_dir() {
            fs::create_dir_all(output)?;
        }

        let all: BTreeSet<&str> = samples
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let blueprint = resolve_blueprint(self.registry, all)?;
        let transforms = self.transform_entries()?;

        info!(
            samples = samples.len(),
            workers = self.workers,
            blueprint = %blueprint,
            "starting dataset fan-out"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;

        let results = pool.install(|| {
            samples
                .par_iter()
                .enumerate()
                .map(|(index, identifiers)| {
                    self.build_sample(index, identifiers, &blueprint, &transforms, output)
                })
                .collect::<Vec<_>>()
        });

        let built = results.iter().filter(|r| r.is_some()).count();
        info!(built, total = samples.len(), "dataset fan-out complete");

        Ok(results)
    }

    /// Build every sample and write a `labels.json` mapping sample id to
    /// aggregated tags.
    pub fn generate(&self, samples: &[Vec<String>], output: &Path) -> DatasetResult<LabelMap> {
        let results = self.run(samples, output)?;

        let labels: LabelMap = results
            .into_iter()
            .flatten()
            .map(|(id, tags)| (id, LabelEntry::Tags(tags)))
            .collect();

        write_labels(output, &labels)?;
        Ok(labels)
    }

    /// Build every sample of a classification task and write a
    /// `labels.json` mapping sample id to `{class, tags}`.
    ///
    /// `classes` must be index-aligned with `samples`, as produced by
    /// [`crate::classification::classification`].
    pub fn generate_classified(
        &self,
        samples: &[Vec<String>],
        classes: &[usize],
        output: &Path,
    ) -> DatasetResult<LabelMap> {
        if samples.len() != classes.len() {
            return Err(DatasetError::InvalidParameters {
                what: "samples and classes must be the same length".to_string(),
            });
        }

        let results = self.run(samples, output)?;

        let labels: LabelMap = results
            .into_iter()
            .zip(classes)
            .filter_map(|(result, &class)| {
                result.map(|(id, tags)| (id, LabelEntry::Classed { class, tags }))
            })
            .collect();

        write_labels(output, &labels)?;
        Ok(labels)
    }
}
