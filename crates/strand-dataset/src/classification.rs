//! Classification task generation.
//!
//! Builds a configurable set of classes over a universe of component
//! identifiers. Each class is anchored by a centroid feature set; samples
//! are drawn by permuting their class centroid, salted with noise features
//! from a pool disjoint from the centroid chain, and a small fraction of
//! samples is deliberately mislabeled.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{DatasetError, DatasetResult};

/// Knobs for [`classification`]. Ranges are inclusive on both ends.
#[derive(Debug, Clone)]
pub struct ClassificationParams {
    /// Number of classes. Must be at least 2.
    pub classes: usize,
    /// Features (component identifiers) per sample.
    pub features: usize,
    /// Minimum samples per class.
    pub smin: usize,
    /// Maximum samples per class.
    pub smax: usize,
    /// Fraction of the previous centroid's features kept when deriving the
    /// next centroid.
    pub class_ratio: (f64, f64),
    /// Fraction of the class centroid kept when drawing a sample.
    pub sample_ratio: (f64, f64),
    /// Fraction of a sample's features overwritten with noise.
    pub noise_ratio: (f64, f64),
    /// Fraction of all samples to relabel with an independently drawn class.
    pub reclass_ratio: f64,
    /// Shuffle samples and labels together before returning.
    pub shuffle: bool,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            classes: 2,
            features: 25,
            smin: 20,
            smax: 100,
            class_ratio: (0.4, 0.8),
            sample_ratio: (0.8, 0.95),
            noise_ratio: (0.4, 0.6),
            reclass_ratio: 0.02,
            shuffle: true,
        }
    }
}

impl ClassificationParams {
    fn validate(&self, universe: usize) -> DatasetResult<()> {
        let invalid = |what: &str| DatasetError::InvalidParameters {
            what: what.to_string(),
        };

        if self.classes < 2 {
            return Err(invalid("at least two classes are required"));
        }
        if self.smin > self.smax {
            return Err(invalid("sample minimum exceeds sample maximum"));
        }
        for (name, (min, max)) in [
            ("class", self.class_ratio),
            ("sample", self.sample_ratio),
            ("noise", self.noise_ratio),
        ] {
            if min > max || min < 0.0 || max > 1.0 {
                return Err(DatasetError::InvalidParameters {
                    what: format!("{name} ratio bounds must satisfy 0 <= min <= max <= 1"),
                });
            }
        }

        // The noise pool draws 2F identifiers on top of the F per centroid.
        let needed = self.features * 2;
        if universe < needed {
            return Err(DatasetError::UniverseTooSmall {
                needed,
                available: universe,
            });
        }

        Ok(())
    }
}

/// Keep a `ratio` fraction of `sample`, refill the rest from `universe`, and
/// reshuffle. The result always has exactly `features` unique entries.
fn permute<R: Rng + ?Sized>(
    universe: &[String],
    sample: &[String],
    features: usize,
    ratio: f64,
    rng: &mut R,
) -> Vec<String> {
    let keep = (features as f64 * ratio) as usize;

    let mut permuted: Vec<String> = sample.choose_multiple(rng, keep).cloned().collect();
    let kept: BTreeSet<&String> = permuted.iter().collect();

    let pool: Vec<&String> = universe.iter().filter(|f| !kept.contains(f)).collect();
    permuted.extend(
        pool.choose_multiple(rng, features - permuted.len())
            .map(|f| (*f).clone()),
    );

    permuted.shuffle(rng);
    permuted
}

/// Generate a labeled classification task over `universe`.
///
/// Returns index-aligned samples and labels. Centroid 0 is an unconstrained
/// draw; each later centroid derives from its predecessor at a class-ratio
/// drawn per class, which controls inter-class similarity. The relabel count
/// is exactly `floor(reclass_ratio * total)` relabel operations, each of
/// which may reassign a sample to its own class.
pub fn classification<R: Rng + ?Sized>(
    universe: &[String],
    params: &ClassificationParams,
    rng: &mut R,
) -> DatasetResult<(Vec<Vec<String>>, Vec<usize>)> {
    params.validate(universe.len())?;

    let features = params.features;

    let mut centroids: Vec<Vec<String>> = Vec::with_capacity(params.classes);
    for _ in 0..params.classes {
        let centroid = match centroids.last() {
            Some(previous) => {
                let ratio = rng.gen_range(params.class_ratio.0..=params.class_ratio.1);
                permute(universe, previous, features, ratio, rng)
            }
            None => universe
                .choose_multiple(rng, features)
                .cloned()
                .collect(),
        };
        centroids.push(centroid);
    }

    let noise_pool: Vec<String> = universe
        .choose_multiple(rng, features * 2)
        .cloned()
        .collect();

    let mut samples: Vec<Vec<String>> = Vec::new();
    let mut labels: Vec<usize> = Vec::new();

    for (class, centroid) in centroids.iter().enumerate() {
        let count = rng.gen_range(params.smin..=params.smax);

        for _ in 0..count {
            let ratio = rng.gen_range(params.sample_ratio.0..=params.sample_ratio.1);
            let mut sample = permute(universe, centroid, features, ratio, rng);

            let noise_ratio = rng.gen_range(params.noise_ratio.0..=params.noise_ratio.1);
            let noise = (noise_ratio * features as f64) as usize;
            for _ in 0..noise {
                let index = rng.gen_range(0..features);
                let present: BTreeSet<&String> = sample.iter().collect();
                let choices: Vec<&String> =
                    noise_pool.iter().filter(|f| !present.contains(f)).collect();
                if let Some(replacement) = choices.choose(rng) {
                    sample[index] = (**replacement).clone();
                }
            }

            samples.push(sample);
            labels.push(class);
        }
    }

    let reclass = (params.reclass_ratio * labels.len() as f64) as usize;
    for _ in 0..reclass {
        let index = rng.gen_range(0..labels.len());
        labels[index] = rng.gen_range(0..params.classes);
    }

    if params.shuffle {
        // The same permutation is applied to samples and labels.
        let mut order: Vec<usize> = (0..samples.len()).collect();
        order.shuffle(rng);

        samples = order.iter().map(|&i| samples[i].clone()).collect();
        labels = order.iter().map(|&i| labels[i]).collect();
    }

    Ok((samples, labels))
}
