//! Similarity-oriented sampling strategies.
//!
//! Each strategy is a pure, seedable function from a universe of component
//! identifiers to a list of sample configurations (each an ordered list of
//! identifiers). Randomness comes in through the caller's generator, so the
//! same seed always reproduces the same dataset.

use rand::seq::{index, SliceRandom};
use rand::Rng;

use crate::error::{DatasetError, DatasetResult};

/// Fraction of positions replaced from one walk step to the next.
const WALK_CHANGE: f64 = 0.02;

fn check_draw(universe: &[String], k: usize) -> DatasetResult<()> {
    if universe.len() < k {
        return Err(DatasetError::UniverseTooSmall {
            needed: k,
            available: universe.len(),
        });
    }
    Ok(())
}

fn draw<R: Rng + ?Sized>(universe: &[String], k: usize, rng: &mut R) -> Vec<String> {
    universe
        .choose_multiple(rng, k)
        .cloned()
        .collect()
}

/// One single-identifier sample per universe entry.
///
/// Degenerate strategy that ignores requested counts; useful as a smoke test
/// over an entire catalog.
pub fn simple(universe: &[String]) -> Vec<Vec<String>> {
    universe.iter().map(|c| vec![c.clone()]).collect()
}

/// `samples` independent draws of `k` distinct identifiers each.
///
/// Identifiers are distinct within a sample; whole samples may duplicate
/// each other.
pub fn random<R: Rng + ?Sized>(
    universe: &[String],
    samples: usize,
    k: usize,
    rng: &mut R,
) -> DatasetResult<Vec<Vec<String>>> {
    check_draw(universe, k)?;

    Ok((0..samples).map(|_| draw(universe, k, rng)).collect())
}

/// A random walk with small per-step permutations.
///
/// Sample 0 is an independent draw of size `k`; each subsequent sample
/// copies its predecessor and replaces `ceil(2% * k)` distinct positions
/// with freshly drawn identifiers, producing inter-sample similarity that
/// decays gradually along the walk.
pub fn walk<R: Rng + ?Sized>(
    universe: &[String],
    samples: usize,
    k: usize,
    rng: &mut R,
) -> DatasetResult<Vec<Vec<String>>> {
    check_draw(universe, k)?;

    let change = ((k as f64 * WALK_CHANGE).ceil() as usize).min(k);
    let mut options: Vec<Vec<String>> = Vec::with_capacity(samples);

    for _ in 0..samples {
        match options.last() {
            Some(previous) => {
                let mut sample = previous.clone();
                for position in index::sample(rng, k, change) {
                    // Unwrap is fine: check_draw guarantees a non-empty universe.
                    sample[position] = universe.choose(rng).cloned().unwrap();
                }
                options.push(sample);
            }
            None => options.push(draw(universe, k, rng)),
        }
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;

    fn universe(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("component-{i}")).collect()
    }

    #[test]
    fn simple_is_one_sample_per_entry() {
        let universe = universe(5);
        let samples = simple(&universe);

        assert_eq!(samples.len(), 5);
        for (sample, identifier) in samples.iter().zip(&universe) {
            assert_eq!(sample, &vec![identifier.clone()]);
        }
    }

    #[test]
    fn random_draws_distinct_identifiers_within_a_sample() {
        let universe = universe(50);
        let mut rng = StdRng::seed_from_u64(1);

        let samples = random(&universe, 10, 20, &mut rng).unwrap();

        assert_eq!(samples.len(), 10);
        for sample in &samples {
            assert_eq!(sample.len(), 20);
            let unique: BTreeSet<&String> = sample.iter().collect();
            assert_eq!(unique.len(), 20);
        }
    }

    #[test]
    fn random_rejects_small_universe() {
        let err = random(&universe(3), 1, 20, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, DatasetError::UniverseTooSmall { needed: 20, .. }));
    }

    #[test]
    fn walk_changes_a_bounded_number_of_positions() {
        let universe = universe(200);
        let mut rng = StdRng::seed_from_u64(2);
        let k = 100;
        let change = (k as f64 * WALK_CHANGE).ceil() as usize;

        let samples = walk(&universe, 20, k, &mut rng).unwrap();

        for window in samples.windows(2) {
            let differing = window[0]
                .iter()
                .zip(&window[1])
                .filter(|(a, b)| a != b)
                .count();
            assert!(differing <= change);
        }
    }

    #[test]
    fn walk_is_seed_deterministic() {
        let universe = universe(40);

        let first = walk(&universe, 10, 15, &mut StdRng::seed_from_u64(3)).unwrap();
        let second = walk(&universe, 10, 15, &mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(first, second);
    }
}
