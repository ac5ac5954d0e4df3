//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Only file paths can be overridden from the environment.

use std::path::PathBuf;

/// Default source table (relative to the working directory)
pub const DEFAULT_DATA_FILE: &str = "data/windows.csv";

/// Default model artifact file name
pub const DEFAULT_MODEL_FILE: &str = "memory_action_classifier.json";

/// Default predictions table file name
pub const DEFAULT_PREDICTIONS_FILE: &str = "test_data_with_predictions.csv";

/// Rows discarded at the top of every source table (startup window)
pub const DEFAULT_WARMUP_ROWS: usize = 10;

/// Fraction of labeled rows held out for evaluation
pub const DEFAULT_HOLDOUT_RATIO: f64 = 0.2;

/// Seed shared by the splitter and the forest
pub const DEFAULT_SEED: u64 = 42;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Memory Action Classifier";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Base directory for artifacts
pub fn get_artifact_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("memory-classifier")
}

/// Get source table path from environment or use default
pub fn get_data_file() -> PathBuf {
    std::env::var("MEMCLASS_DATA_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_FILE))
}

/// Get model artifact path from environment or use default
pub fn get_model_file() -> PathBuf {
    std::env::var("MEMCLASS_MODEL_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_artifact_dir().join(DEFAULT_MODEL_FILE))
}

/// Fixed seed for the session's sample draws, if set
pub fn get_session_seed() -> Option<u64> {
    std::env::var("MEMCLASS_SESSION_SEED")
        .ok()
        .and_then(|v| v.trim().parse().ok())
}

/// Get predictions table path from environment or use default
pub fn get_predictions_file() -> PathBuf {
    std::env::var("MEMCLASS_PREDICTIONS_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_artifact_dir().join(DEFAULT_PREDICTIONS_FILE))
}
