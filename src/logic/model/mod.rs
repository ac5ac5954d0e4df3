//! Model Module - Classifier Capability
//!
//! The pipeline and the session only see `Trainer` and `Classifier`.
//! Any concrete learner can be swapped in behind them; the shipped one is a
//! class-weighted random forest.

pub mod forest;
pub mod tree;
pub mod weights;

use crate::logic::dataset::{Dataset, SuggestedAction};
use crate::logic::error::PipelineResult;
use crate::logic::features::FeatureVector;

pub use forest::{ForestConfig, ForestTrainer, RandomForest};

/// A fitted model
pub trait Classifier {
    fn predict(&self, features: &FeatureVector) -> SuggestedAction;

    fn predict_batch(&self, rows: &[FeatureVector]) -> Vec<SuggestedAction> {
        rows.iter().map(|row| self.predict(row)).collect()
    }
}

/// Something that fits a `Classifier` on a training set
pub trait Trainer {
    type Model: Classifier;

    fn train(&self, training: &Dataset) -> PipelineResult<Self::Model>;
}
