use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logic::dataset::{PredictionRecord, SuggestedAction};
use crate::logic::features::{FeatureVector, LayoutInfo};

/// Bump when the envelope shape changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Persisted model with the metadata needed to trust it on reload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact<M> {
    pub format_version: u32,
    pub layout: LayoutInfo,
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub holdout_rows: usize,
    pub model: M,
}

impl<M> ModelArtifact<M> {
    pub fn new(model: M, holdout_rows: usize) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            layout: LayoutInfo::current(),
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            holdout_rows,
            model,
        }
    }
}

/// One line of the predictions table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct PredictionRow {
    #[serde(rename = "RAM_Usage_MB")]
    pub ram_usage_mb: f64,
    #[serde(rename = "Swap_Usage_MB")]
    pub swap_usage_mb: f64,
    #[serde(rename = "CPU_Usage")]
    pub cpu_usage: f64,
    #[serde(rename = "True_Label")]
    pub true_label: SuggestedAction,
    #[serde(rename = "Predicted_Label")]
    pub predicted_label: SuggestedAction,
}

impl From<&PredictionRecord> for PredictionRow {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            ram_usage_mb: record.features.ram_usage_mb,
            swap_usage_mb: record.features.swap_usage_mb,
            cpu_usage: record.features.cpu_usage,
            true_label: record.true_label,
            predicted_label: record.predicted_label,
        }
    }
}

impl From<PredictionRow> for PredictionRecord {
    fn from(row: PredictionRow) -> Self {
        Self {
            features: FeatureVector::new(row.ram_usage_mb, row.swap_usage_mb, row.cpu_usage),
            true_label: row.true_label,
            predicted_label: row.predicted_label,
        }
    }
}
