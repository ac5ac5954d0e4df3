//! Feature Selector - projects raw rows onto decision features + label

use super::label::derive_label;
use super::record::{Dataset, LabeledRecord, TelemetryRecord};
use crate::logic::error::{PipelineResult, Stage};

/// Label one raw row. Context columns and the delta itself are dropped.
pub fn label_record(record: &TelemetryRecord) -> LabeledRecord {
    LabeledRecord {
        features: record.features(),
        suggested_action: derive_label(record.page_fault_delta),
    }
}

/// Build the labeled dataset from raw rows
pub fn select_features(records: &[TelemetryRecord]) -> PipelineResult<Dataset> {
    let labeled = records.iter().map(label_record).collect();
    let dataset = Dataset::new(labeled, Stage::Select)?;

    let counts = dataset.class_counts();
    log::info!(
        "Labeled {} rows (class counts 0/1/2/3: {}/{}/{}/{})",
        dataset.len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3]
    );

    Ok(dataset)
}
