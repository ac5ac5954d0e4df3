//! Aggregate Run - whole-holdout prediction distribution
//!
//! Recomputed on every call; nothing here is persisted.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::logic::dataset::{PredictionRecord, SuggestedAction};
use crate::logic::features::FeatureVector;
use crate::logic::model::Classifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    /// Predicted-label counts; every label of the domain is present
    pub per_class_counts: BTreeMap<SuggestedAction, u64>,
    pub correct: u64,
    pub total: u64,
}

impl AggregateResult {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    /// Largest bucket, for scaling a chart
    pub fn max_count(&self) -> u64 {
        self.per_class_counts.values().copied().max().unwrap_or(0)
    }
}

/// Predict every holdout row and tally the outcome
pub fn run_all<M: Classifier + ?Sized>(model: &M, holdout: &[PredictionRecord]) -> AggregateResult {
    let features: Vec<FeatureVector> = holdout.iter().map(|row| row.features).collect();
    let predicted = model.predict_batch(&features);

    let mut per_class_counts: BTreeMap<SuggestedAction, u64> =
        SuggestedAction::ALL.iter().map(|&action| (action, 0)).collect();
    let mut correct = 0;

    for (row, label) in holdout.iter().zip(&predicted) {
        *per_class_counts.entry(*label).or_insert(0) += 1;
        if row.true_label == *label {
            correct += 1;
        }
    }

    log::debug!("Aggregate run: {} / {} correct", correct, holdout.len());

    AggregateResult {
        per_class_counts,
        correct,
        total: holdout.len() as u64,
    }
}
