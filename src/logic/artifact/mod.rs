//! Artifact Store - persisted model + holdout predictions
//!
//! The model goes to pretty JSON with a `.sha256` sidecar; the holdout set
//! with true and predicted labels goes to a CSV table.

pub mod types;

#[cfg(test)]
mod tests;

use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::logic::dataset::PredictionRecord;
use crate::logic::error::{PipelineError, PipelineResult, Stage};
use types::PredictionRow;
pub use types::{ModelArtifact, ARTIFACT_FORMAT_VERSION};

/// Structural check run on every model decoded from disk.
///
/// The checksum sidecar is optional, so a decoded model must not be trusted
/// to be well formed until this passes.
pub trait ModelCheck {
    fn check(&self) -> Result<(), String>;
}

/// Hex SHA-256 of a byte slice
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// `<path>.sha256`
pub fn checksum_path(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".sha256");
    PathBuf::from(raw)
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    model_path: PathBuf,
    predictions_path: PathBuf,
}

impl ArtifactStore {
    pub fn new(model_path: impl Into<PathBuf>, predictions_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            predictions_path: predictions_path.into(),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn predictions_path(&self) -> &Path {
        &self.predictions_path
    }

    // ========================================================================
    // SAVE
    // ========================================================================

    /// Persist the model and the holdout predictions.
    ///
    /// All files are written to `.tmp` siblings first and only renamed into
    /// place once every write succeeded, so a failed save leaves the previous
    /// pair intact.
    pub fn save<'m, M: Serialize>(
        &self,
        model: &'m M,
        predictions: &[PredictionRecord],
    ) -> PipelineResult<ModelArtifact<&'m M>> {
        let artifact = ModelArtifact::new(model, predictions.len());
        let bytes = serde_json::to_vec_pretty(&artifact)?;
        let sidecar = checksum_path(&self.model_path);

        ensure_parent(&self.model_path)?;
        ensure_parent(&self.predictions_path)?;

        let staged = [
            (staging_path(&self.predictions_path), self.predictions_path.clone()),
            (staging_path(&self.model_path), self.model_path.clone()),
            (staging_path(&sidecar), sidecar.clone()),
        ];
        let written = write_predictions(&staged[0].0, predictions)
            .and_then(|()| write_file(&staged[1].0, &bytes))
            .and_then(|()| write_file(&staged[2].0, sha256_hex(&bytes).as_bytes()));
        if let Err(e) = written {
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }

        for (tmp, target) in &staged {
            fs::rename(tmp, target).map_err(|e| PipelineError::io(Stage::Persist, target, e))?;
        }

        log::info!(
            "Model saved to {} (run {}, {} bytes)",
            self.model_path.display(),
            artifact.run_id,
            bytes.len()
        );
        log::info!(
            "Predictions saved to {} ({} rows)",
            self.predictions_path.display(),
            predictions.len()
        );
        Ok(artifact)
    }

    // ========================================================================
    // LOAD
    // ========================================================================

    /// Reload both artifacts. Fails with `ArtifactNotFound` before any save.
    pub fn load<M: DeserializeOwned + ModelCheck>(&self) -> PipelineResult<(ModelArtifact<M>, Vec<PredictionRecord>)> {
        for path in [&self.model_path, &self.predictions_path] {
            if !path.exists() {
                return Err(PipelineError::ArtifactNotFound { path: path.clone() });
            }
        }

        let artifact = self.read_model()?;
        let predictions = self.read_predictions()?;

        if artifact.holdout_rows != predictions.len() {
            return Err(self.corrupt(
                &self.predictions_path,
                format!(
                    "table has {} rows, model run {} was saved with {}",
                    predictions.len(),
                    artifact.run_id,
                    artifact.holdout_rows
                ),
            ));
        }

        log::info!(
            "Loaded model run {} (trained {}) and {} holdout rows, {} predicted correctly",
            artifact.run_id,
            artifact.trained_at.format("%Y-%m-%d %H:%M:%S"),
            predictions.len(),
            predictions.iter().filter(|p| p.is_correct()).count()
        );

        Ok((artifact, predictions))
    }

    fn corrupt(&self, path: &Path, reason: impl Into<String>) -> PipelineError {
        PipelineError::ArtifactCorrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn read_model<M: DeserializeOwned + ModelCheck>(&self) -> PipelineResult<ModelArtifact<M>> {
        let bytes = fs::read(&self.model_path)
            .map_err(|e| PipelineError::io(Stage::ArtifactLoad, &self.model_path, e))?;

        let sidecar = checksum_path(&self.model_path);
        match fs::read_to_string(&sidecar) {
            Ok(expected) => {
                let actual = sha256_hex(&bytes);
                if expected.trim() != actual {
                    return Err(self.corrupt(
                        &self.model_path,
                        format!("checksum mismatch (expected {}, got {})", expected.trim(), actual),
                    ));
                }
            }
            Err(_) => log::warn!(
                "No checksum at {}; loading model unverified",
                sidecar.display()
            ),
        }

        let artifact: ModelArtifact<M> = serde_json::from_slice(&bytes)
            .map_err(|e| self.corrupt(&self.model_path, e.to_string()))?;

        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(self.corrupt(
                &self.model_path,
                format!(
                    "format version {} (expected {})",
                    artifact.format_version, ARTIFACT_FORMAT_VERSION
                ),
            ));
        }
        artifact.layout.validate()?;
        artifact
            .model
            .check()
            .map_err(|reason| self.corrupt(&self.model_path, reason))?;

        Ok(artifact)
    }

    fn read_predictions(&self) -> PipelineResult<Vec<PredictionRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&self.predictions_path)
            .map_err(|e| self.corrupt(&self.predictions_path, e.to_string()))?;

        let mut predictions = Vec::new();
        for row in reader.deserialize::<PredictionRow>() {
            let row = row.map_err(|e| self.corrupt(&self.predictions_path, e.to_string()))?;
            predictions.push(PredictionRecord::from(row));
        }

        if predictions.is_empty() {
            return Err(self.corrupt(&self.predictions_path, "table has no rows"));
        }
        Ok(predictions)
    }
}

/// `<path>.tmp`
fn staging_path(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

fn write_file(path: &Path, bytes: &[u8]) -> PipelineResult<()> {
    fs::write(path, bytes).map_err(|e| PipelineError::io(Stage::Persist, path, e))
}

fn write_predictions(path: &Path, predictions: &[PredictionRecord]) -> PipelineResult<()> {
    let file = File::create(path).map_err(|e| PipelineError::io(Stage::Persist, path, e))?;
    let mut writer = csv::Writer::from_writer(file);
    for record in predictions {
        writer
            .serialize(PredictionRow::from(record))
            .map_err(|e| PipelineError::csv(Stage::Persist, e))?;
    }
    writer
        .flush()
        .map_err(|e| PipelineError::io(Stage::Persist, path, e))
}

fn ensure_parent(path: &Path) -> PipelineResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| PipelineError::io(Stage::Persist, parent, e)),
        _ => Ok(()),
    }
}
