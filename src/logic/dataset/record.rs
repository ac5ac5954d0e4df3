use serde::{Deserialize, Serialize};

use super::label::SuggestedAction;
use crate::logic::error::{PipelineError, PipelineResult, Stage};
use crate::logic::features::FeatureVector;

/// One raw row of the source table
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// 1-based line in the source file (header is line 1)
    pub line: u64,

    // Decision features
    pub ram_usage_mb: f64,
    pub swap_usage_mb: f64,
    pub cpu_usage: f64,

    // Label source
    pub page_fault_delta: f64,

    // Context (not predictive)
    pub timestamp: Option<String>,
    pub hostname: Option<String>,
    pub os: Option<String>,
    pub machine_id: Option<String>,
}

impl TelemetryRecord {
    pub fn features(&self) -> FeatureVector {
        FeatureVector::new(self.ram_usage_mb, self.swap_usage_mb, self.cpu_usage)
    }
}

/// Decision features plus derived label
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRecord {
    pub features: FeatureVector,
    pub suggested_action: SuggestedAction,
}

/// Ordered, non-empty sequence of labeled records
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<LabeledRecord>,
}

impl Dataset {
    pub fn new(records: Vec<LabeledRecord>, stage: Stage) -> PipelineResult<Self> {
        if records.is_empty() {
            return Err(PipelineError::empty(stage, 0, 1));
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabeledRecord> {
        self.records.iter()
    }

    /// Per-class row counts, indexed by `SuggestedAction::index`
    pub fn class_counts(&self) -> [usize; super::label::CLASS_COUNT] {
        let mut counts = [0usize; super::label::CLASS_COUNT];
        for record in &self.records {
            counts[record.suggested_action.index()] += 1;
        }
        counts
    }

    /// Number of labels that occur at least once
    pub fn distinct_labels(&self) -> usize {
        self.class_counts().iter().filter(|&&c| c > 0).count()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a LabeledRecord;
    type IntoIter = std::slice::Iter<'a, LabeledRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Holdout row with the model's verdict
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub features: FeatureVector,
    pub true_label: SuggestedAction,
    pub predicted_label: SuggestedAction,
}

impl PredictionRecord {
    pub fn is_correct(&self) -> bool {
        self.true_label == self.predicted_label
    }
}
