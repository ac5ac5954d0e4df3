//! Random Forest - bagged, class-weighted decision trees

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::tree::{DecisionTree, TrainingView, TreeParams};
use super::weights::ClassWeighting;
use super::{Classifier, Trainer};
use crate::constants::DEFAULT_SEED;
use crate::logic::artifact::ModelCheck;
use crate::logic::dataset::{Dataset, SuggestedAction, CLASS_COUNT};
use crate::logic::error::{PipelineError, PipelineResult};
use crate::logic::features::{FeatureVector, FEATURE_COUNT};

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub class_weight: ClassWeighting,
    /// Draw each tree's rows with replacement
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            class_weight: ClassWeighting::Balanced,
            bootstrap: true,
            seed: DEFAULT_SEED,
        }
    }
}

impl ForestConfig {
    /// sqrt(n_features), at least one
    pub fn max_features(&self) -> usize {
        ((FEATURE_COUNT as f64).sqrt().floor() as usize).max(1)
    }
}

// ============================================================================
// MODEL
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    class_weights: [f64; CLASS_COUNT],
}

impl RandomForest {
    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn class_weights(&self) -> &[f64; CLASS_COUNT] {
        &self.class_weights
    }

    /// Mean leaf distribution across trees
    pub fn predict_proba(&self, features: &FeatureVector) -> [f64; CLASS_COUNT] {
        let mut sum = [0.0; CLASS_COUNT];
        for tree in &self.trees {
            for (s, p) in sum.iter_mut().zip(tree.distribution(features)) {
                *s += p;
            }
        }
        if !self.trees.is_empty() {
            let n = self.trees.len() as f64;
            for s in sum.iter_mut() {
                *s /= n;
            }
        }
        sum
    }
}

impl ModelCheck for RandomForest {
    fn check(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.verify().map_err(|reason| format!("tree {}: {}", i, reason))?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    /// Highest mean probability; ties go to the lower code
    fn predict(&self, features: &FeatureVector) -> SuggestedAction {
        let proba = self.predict_proba(features);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate().skip(1) {
            if *p > proba[best] {
                best = i;
            }
        }
        SuggestedAction::ALL[best]
    }
}

// ============================================================================
// TRAINER
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl Trainer for ForestTrainer {
    type Model = RandomForest;

    fn train(&self, training: &Dataset) -> PipelineResult<RandomForest> {
        let found = training.distinct_labels();
        if found < 2 {
            return Err(PipelineError::InsufficientClasses { found });
        }

        let x: Vec<FeatureVector> = training.iter().map(|r| r.features).collect();
        let y: Vec<usize> = training.iter().map(|r| r.suggested_action.index()).collect();
        let class_weights = self.config.class_weight.weights(&training.class_counts());
        let sample_weight: Vec<f64> = y.iter().map(|&c| class_weights[c]).collect();

        let view = TrainingView {
            x: &x,
            y: &y,
            sample_weight: &sample_weight,
        };
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split.max(2),
            max_features: self.config.max_features(),
        };

        let n = x.len();
        let n_trees = self.config.n_estimators.max(1);
        let mut trees = Vec::with_capacity(n_trees);
        for t in 0..n_trees {
            let mut rng = StdRng::seed_from_u64(self.config.seed.wrapping_add(t as u64));
            let rows: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.gen_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(&view, rows, &params, &mut rng));
        }

        let mean_depth =
            trees.iter().map(|t| t.depth()).sum::<usize>() as f64 / trees.len() as f64;
        log::info!(
            "Model training complete: {} trees on {} rows, mean depth {:.1}, {} nodes",
            trees.len(),
            n,
            mean_depth,
            trees.iter().map(|t| t.node_count()).sum::<usize>()
        );
        log::debug!("Class weights: {:?}", class_weights);

        Ok(RandomForest {
            trees,
            class_weights,
        })
    }
}
