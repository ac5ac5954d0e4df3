//! Memory Action Classifier - Main Entry Point
//!
//! `train`   - run the training pipeline and persist the artifacts
//! `session` - replay the holdout set in the terminal

mod api;
mod logic;
pub mod constants;

use std::io;
use std::process::ExitCode;

use logic::config::PipelineConfig;
use logic::error::{PipelineError, PipelineResult, Stage};
use logic::model::RandomForest;
use logic::session::InteractiveSession;

const USAGE: &str = "\
Usage: memory-action-classifier <COMMAND>

Commands:
  train     load the source table, train, evaluate and persist
  session   open the interactive terminal on the persisted holdout

Environment:
  MEMCLASS_DATA_FILE, MEMCLASS_MODEL_FILE, MEMCLASS_PREDICTIONS_FILE,
  MEMCLASS_SESSION_SEED";

fn train(config: &PipelineConfig) -> PipelineResult<()> {
    let summary = logic::pipeline::run(config)?;
    log::info!(
        "Run {} complete: {} rows loaded, {} trained, {} held out, accuracy {:.4}",
        summary.run_id,
        summary.loaded_rows,
        summary.training_rows,
        summary.holdout_rows,
        summary.report.accuracy
    );
    Ok(())
}

fn session(config: &PipelineConfig) -> PipelineResult<()> {
    let store = config.artifact_store();
    log::info!(
        "Opening session on {} and {}",
        store.model_path().display(),
        store.predictions_path().display()
    );
    let (artifact, holdout) = store.load::<RandomForest>()?;
    log::info!(
        "Loaded model from run {} ({} trees, class weights {:?})",
        artifact.run_id,
        artifact.model.tree_count(),
        artifact.model.class_weights()
    );

    let mut session = match constants::get_session_seed() {
        Some(seed) => InteractiveSession::with_seed(&artifact.model, &holdout, seed)?,
        None => InteractiveSession::new(&artifact.model, &holdout)?,
    };
    let stdin = io::stdin();
    api::console::run_console(&mut session, stdin.lock(), io::stdout().lock())
        .map_err(|e| PipelineError::io(Stage::Session, "<terminal>", e))
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    let config = PipelineConfig::from_env();
    let result = match std::env::args().nth(1).as_deref() {
        Some("train") => train(&config),
        Some("session") => session(&config),
        _ => {
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
