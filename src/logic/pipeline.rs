//! Training Pipeline
//!
//! load → label/select → split → train → evaluate → persist.
//! Any stage failure aborts the run before artifacts are written.

use serde::Serialize;

use crate::logic::config::PipelineConfig;
use crate::logic::dataset::{self, Split};
use crate::logic::error::{PipelineError, PipelineResult, Stage};
use crate::logic::evaluate::{evaluate, ClassificationReport};
use crate::logic::model::{ForestTrainer, Trainer};

/// What one training run produced
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub loaded_rows: usize,
    pub training_rows: usize,
    pub holdout_rows: usize,
    pub report: ClassificationReport,
    pub run_id: uuid::Uuid,
}

/// Run the pipeline with the shipped random forest
pub fn run(config: &PipelineConfig) -> PipelineResult<TrainingSummary> {
    let trainer = ForestTrainer::new(config.forest.clone());
    log::debug!("Forest config: {:?}", trainer.config());
    run_with(config, &trainer)
}

/// Run the pipeline with any trainer whose model can be persisted
pub fn run_with<T>(config: &PipelineConfig, trainer: &T) -> PipelineResult<TrainingSummary>
where
    T: Trainer,
    T::Model: Serialize,
{
    log::info!("Training pipeline started ({})", config.data_file.display());

    let raw = dataset::load_records(&config.data_file, config.warmup_rows)?;
    if raw.is_empty() {
        return Err(PipelineError::empty(Stage::Load, 0, 1));
    }

    let labeled = dataset::select_features(&raw)?;
    let Split { training, holdout } =
        dataset::split(&labeled, config.holdout_ratio, config.split_seed)?;

    let model = trainer.train(&training)?;

    let evaluation = evaluate(&model, &holdout);
    log::info!("Evaluation complete.");
    log::info!("\n{}", evaluation.report);
    log::info!("Confusion Matrix:\n{}", evaluation.report.confusion);

    let store = config.artifact_store();
    let artifact = store.save(&model, &evaluation.predictions)?;

    Ok(TrainingSummary {
        loaded_rows: raw.len(),
        training_rows: training.len(),
        holdout_rows: holdout.len(),
        report: evaluation.report,
        run_id: artifact.run_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::SuggestedAction;
    use crate::logic::model::{Classifier, ForestConfig, RandomForest};
    use crate::logic::session::aggregate::run_all;
    use crate::logic::session::InteractiveSession;
    use std::fmt::Write as _;
    use std::fs;
    use tempfile::tempdir;

    /// Page-fault delta tracks swap so the label is learnable
    fn write_source(path: &std::path::Path, rows: usize) {
        let mut csv = String::from("Timestamp,OS,Machine_ID,Hostname,RAM_Usage_MB,Swap_Usage_MB,CPU_Usage,Page_Faults_Delta\n");
        for i in 0..rows {
            let swap = (i % 40) as f64 * 10.0;
            let delta = match i % 40 {
                0..=9 => 1000.0,
                10..=19 => 4000.0,
                20..=29 => 50_000.0,
                _ => 250_000.0,
            };
            writeln!(
                csv,
                "2024-05-01T10:{:02}:00,Windows,m-7,host-b,{},{},{},{}",
                i % 60,
                4096 + (i % 13) * 7,
                swap,
                (i % 9) as f64 * 11.0,
                delta
            )
            .unwrap();
        }
        fs::write(path, csv).unwrap();
    }

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        let mut config = PipelineConfig::with_paths(
            dir.join("windows.csv"),
            dir.join("out").join("model.json"),
            dir.join("out").join("predictions.csv"),
        );
        config.forest = ForestConfig {
            n_estimators: 20,
            ..Default::default()
        };
        config
    }

    #[test]
    fn test_end_to_end_train_then_session() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        write_source(&config.data_file, 210);

        let summary = run(&config).unwrap();
        assert_eq!(summary.loaded_rows, 200);
        assert_eq!(summary.holdout_rows, 40);
        assert_eq!(summary.training_rows, 160);
        assert!(summary.report.accuracy > 0.9);

        let (artifact, holdout) = config.artifact_store().load::<RandomForest>().unwrap();
        assert_eq!(artifact.run_id, summary.run_id);
        assert_eq!(holdout.len(), 40);
        for row in &holdout {
            assert_eq!(artifact.model.predict(&row.features), row.predicted_label);
        }

        let aggregate = run_all(&artifact.model, &holdout);
        assert_eq!(aggregate.total, 40);
        assert_eq!(
            aggregate.correct,
            holdout.iter().filter(|r| r.is_correct()).count() as u64
        );

        let mut session = InteractiveSession::with_seed(&artifact.model, &holdout, 1).unwrap();
        session.load_sample();
        assert!(session.predict().is_some());
        assert_eq!(session.score().total, 1);
    }

    #[test]
    fn test_same_config_same_holdout() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        write_source(&config.data_file, 120);

        run(&config).unwrap();
        let (_, first) = config.artifact_store().load::<RandomForest>().unwrap();
        run(&config).unwrap();
        let (_, second) = config.artifact_store().load::<RandomForest>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_warmup_only_source_aborts_before_persist() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        write_source(&config.data_file, 10);

        assert!(matches!(
            run(&config),
            Err(PipelineError::EmptyDataset { stage: Stage::Load, .. })
        ));
        assert!(!config.model_file.exists());
    }

    #[test]
    fn test_single_label_source_is_rejected() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        let mut csv = String::from("ram_usage_mb,swap_usage_mb,cpu_usage,page_fault_delta\n");
        for i in 0..40 {
            writeln!(csv, "{},{},{},{}", 1000 + i, i, i % 100, 10).unwrap();
        }
        fs::write(&config.data_file, csv).unwrap();

        assert!(matches!(
            run(&config),
            Err(PipelineError::InsufficientClasses { found: 1 })
        ));
        assert!(!config.predictions_file.exists());
    }

    #[test]
    fn test_missing_source_aborts() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        assert!(matches!(run(&config), Err(PipelineError::SourceNotFound { .. })));
    }

    #[test]
    fn test_all_labels_reach_the_table() {
        let dir = tempdir().unwrap();
        let config = config_in(dir.path());
        write_source(&config.data_file, 410);
        run(&config).unwrap();

        let (_, holdout) = config.artifact_store().load::<RandomForest>().unwrap();
        for action in SuggestedAction::ALL {
            assert!(holdout.iter().any(|r| r.true_label == action));
        }
    }
}
