//! Pipeline Errors
//!
//! One taxonomy for the training pipeline, the artifact store and the
//! interactive session. Every message names the stage and the precondition
//! that failed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::logic::features::layout::LayoutMismatchError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Stage that raised an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Select,
    Split,
    Train,
    Persist,
    ArtifactLoad,
    Session,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Select => "select",
            Stage::Split => "split",
            Stage::Train => "train",
            Stage::Persist => "persist",
            Stage::ArtifactLoad => "artifact load",
            Stage::Session => "session",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("load: source table {} is missing or unreadable: {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("load: source table {} lacks required column(s): {}", path.display(), missing.join(", "))]
    SchemaMismatch { path: PathBuf, missing: Vec<String> },

    #[error("load: line {line}: column '{column}' holds non-numeric or non-finite value '{value}'")]
    MalformedRow {
        line: u64,
        column: String,
        value: String,
    },

    #[error("split: ratio {0} must lie strictly between 0 and 1")]
    InvalidRatio(f64),

    #[error("{stage}: dataset has {len} record(s), at least {required} required")]
    EmptyDataset {
        stage: Stage,
        len: usize,
        required: usize,
    },

    #[error("train: training subset has {found} distinct label(s), at least 2 required")]
    InsufficientClasses { found: usize },

    #[error("artifact load: no artifact at {}; run the training pipeline first", path.display())]
    ArtifactNotFound { path: PathBuf },

    #[error("artifact load: {} is unusable: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("artifact load: {0}")]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("{stage}: I/O error on {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{stage}: csv error: {source}")]
    Csv {
        stage: Stage,
        #[source]
        source: csv::Error,
    },

    #[error("persist: serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    pub fn csv(stage: Stage, source: csv::Error) -> Self {
        PipelineError::Csv { stage, source }
    }

    pub fn empty(stage: Stage, len: usize, required: usize) -> Self {
        PipelineError::EmptyDataset {
            stage,
            len,
            required,
        }
    }
}
