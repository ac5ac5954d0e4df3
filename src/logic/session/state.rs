//! Interactive Session - sample / predict / score / reset
//!
//! Idle ──load──▶ SampleLoaded ──predict──▶ Predicted
//!   ▲                 ▲                       │
//!   └──── reset ──────┴──────── load ─────────┘
//!
//! `predict` does not advance to a new sample. Calling it twice on the same
//! sample scores it twice; a fresh `load_sample` is expected in between.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use super::aggregate::{run_all, AggregateResult};
use crate::logic::dataset::{PredictionRecord, SuggestedAction};
use crate::logic::error::{PipelineError, PipelineResult, Stage};
use crate::logic::model::Classifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionPhase {
    Idle,
    SampleLoaded,
    Predicted,
}

/// Running score; `correct <= total` always
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionScore {
    pub correct: u64,
    pub total: u64,
}

impl SessionScore {
    fn record(&mut self, correct: bool) {
        self.total += 1;
        if correct {
            self.correct += 1;
        }
    }
}

impl fmt::Display for SessionScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Score: {} / {}", self.correct, self.total)
    }
}

/// Outcome of one scored prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub predicted: SuggestedAction,
    pub truth: SuggestedAction,
    pub correct: bool,
    pub score: SessionScore,
}

pub struct InteractiveSession<'a, M: Classifier + ?Sized> {
    model: &'a M,
    holdout: &'a [PredictionRecord],
    rng: StdRng,
    phase: SessionPhase,
    current: Option<usize>,
    verdict: Option<Verdict>,
    score: SessionScore,
    chart: Option<AggregateResult>,
}

impl<'a, M: Classifier + ?Sized> InteractiveSession<'a, M> {
    pub fn new(model: &'a M, holdout: &'a [PredictionRecord]) -> PipelineResult<Self> {
        Self::with_rng(model, holdout, StdRng::from_entropy())
    }

    /// Reproducible sample draws
    pub fn with_seed(model: &'a M, holdout: &'a [PredictionRecord], seed: u64) -> PipelineResult<Self> {
        Self::with_rng(model, holdout, StdRng::seed_from_u64(seed))
    }

    fn with_rng(model: &'a M, holdout: &'a [PredictionRecord], rng: StdRng) -> PipelineResult<Self> {
        if holdout.is_empty() {
            return Err(PipelineError::empty(Stage::Session, 0, 1));
        }
        Ok(Self {
            model,
            holdout,
            rng,
            phase: SessionPhase::Idle,
            current: None,
            verdict: None,
            score: SessionScore::default(),
            chart: None,
        })
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Draw one holdout row uniformly at random. Score is untouched.
    pub fn load_sample(&mut self) -> &PredictionRecord {
        let index = self.rng.gen_range(0..self.holdout.len());
        self.current = Some(index);
        self.verdict = None;
        self.phase = SessionPhase::SampleLoaded;
        &self.holdout[index]
    }

    /// Score the current sample. `None` (and no state change) without one.
    pub fn predict(&mut self) -> Option<Verdict> {
        let sample = &self.holdout[self.current?];

        let predicted = self.model.predict(&sample.features);
        let truth = sample.true_label;
        let correct = predicted == truth;
        self.score.record(correct);

        let verdict = Verdict {
            predicted,
            truth,
            correct,
            score: self.score,
        };
        self.verdict = Some(verdict);
        self.phase = SessionPhase::Predicted;
        Some(verdict)
    }

    /// Zero the score, drop the sample and any chart
    pub fn reset(&mut self) {
        self.score = SessionScore::default();
        self.current = None;
        self.verdict = None;
        self.chart = None;
        self.phase = SessionPhase::Idle;
    }

    /// Whole-holdout run; replaces the current chart, leaves the score alone
    pub fn run_aggregate(&mut self) -> &AggregateResult {
        self.chart.insert(run_all(self.model, self.holdout))
    }

    // ========================================================================
    // STATE
    // ========================================================================

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> SessionScore {
        self.score
    }

    pub fn current_sample(&self) -> Option<&PredictionRecord> {
        self.current.map(|i| &self.holdout[i])
    }

    pub fn last_verdict(&self) -> Option<&Verdict> {
        self.verdict.as_ref()
    }

    pub fn chart(&self) -> Option<&AggregateResult> {
        self.chart.as_ref()
    }

    pub fn holdout_len(&self) -> usize {
        self.holdout.len()
    }
}
