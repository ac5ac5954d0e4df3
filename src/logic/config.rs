//! Pipeline Configuration
//!
//! Paths come from the environment (see `constants`); training parameters
//! are fixed defaults that tests override field by field.

use std::path::PathBuf;

use crate::constants;
use crate::logic::artifact::ArtifactStore;
use crate::logic::model::ForestConfig;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_file: PathBuf,
    pub model_file: PathBuf,
    pub predictions_file: PathBuf,
    pub warmup_rows: usize,
    pub holdout_ratio: f64,
    pub split_seed: u64,
    pub forest: ForestConfig,
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            data_file: constants::get_data_file(),
            model_file: constants::get_model_file(),
            predictions_file: constants::get_predictions_file(),
            ..Self::with_paths(PathBuf::new(), PathBuf::new(), PathBuf::new())
        }
    }

    /// Defaults with explicit paths
    pub fn with_paths(
        data_file: impl Into<PathBuf>,
        model_file: impl Into<PathBuf>,
        predictions_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_file: data_file.into(),
            model_file: model_file.into(),
            predictions_file: predictions_file.into(),
            warmup_rows: constants::DEFAULT_WARMUP_ROWS,
            holdout_ratio: constants::DEFAULT_HOLDOUT_RATIO,
            split_seed: constants::DEFAULT_SEED,
            forest: ForestConfig::default(),
        }
    }

    pub fn artifact_store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.model_file, &self.predictions_file)
    }
}
