//! Dataset Splitter - seeded train/holdout partition

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::record::Dataset;
use crate::logic::error::{PipelineError, PipelineResult, Stage};

/// Training and holdout subsets of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub training: Dataset,
    pub holdout: Dataset,
}

/// Holdout size for `len` rows: ceil(len * ratio), leaving both sides non-empty
pub fn holdout_len(len: usize, ratio: f64) -> usize {
    let raw = (len as f64 * ratio).ceil() as usize;
    raw.clamp(1, len.saturating_sub(1).max(1))
}

/// Partition `dataset` reproducibly for a given `(ratio, seed)`.
///
/// Rows keep their original relative order inside each subset.
pub fn split(dataset: &Dataset, ratio: f64, seed: u64) -> PipelineResult<Split> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(PipelineError::InvalidRatio(ratio));
    }
    if dataset.len() < 2 {
        return Err(PipelineError::empty(Stage::Split, dataset.len(), 2));
    }

    let mut positions: Vec<usize> = (0..dataset.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    positions.shuffle(&mut rng);

    let n_holdout = holdout_len(dataset.len(), ratio);
    let mut in_holdout = vec![false; dataset.len()];
    for &pos in &positions[..n_holdout] {
        in_holdout[pos] = true;
    }

    let (holdout, training): (Vec<_>, Vec<_>) = dataset
        .iter()
        .zip(in_holdout)
        .partition(|(_, held)| *held);

    let training = Dataset::new(training.into_iter().map(|(r, _)| *r).collect(), Stage::Split)?;
    let holdout = Dataset::new(holdout.into_iter().map(|(r, _)| *r).collect(), Stage::Split)?;

    log::info!(
        "Split {} rows into {} training / {} holdout (ratio {}, seed {})",
        dataset.len(),
        training.len(),
        holdout.len(),
        ratio,
        seed
    );

    Ok(Split { training, holdout })
}
