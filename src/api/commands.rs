//! Session Commands - UI-agnostic command layer
//!
//! Each command runs to completion against the session and returns an
//! immutable output value for whatever front end renders it.

use std::fmt;
use std::str::FromStr;

use crate::logic::dataset::PredictionRecord;
use crate::logic::model::Classifier;
use crate::logic::session::{
    AggregateResult, InteractiveSession, SessionPhase, SessionScore, Verdict,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    LoadSample,
    Predict,
    ResetScore,
    RunAggregate,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown command '{}'. Type 'help' for the list.", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for SessionCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "load" | "l" => Ok(SessionCommand::LoadSample),
            "predict" | "p" => Ok(SessionCommand::Predict),
            "reset" | "r" => Ok(SessionCommand::ResetScore),
            "wild" | "aggregate" | "a" => Ok(SessionCommand::RunAggregate),
            "status" | "s" => Ok(SessionCommand::Status),
            "help" | "h" | "?" => Ok(SessionCommand::Help),
            "quit" | "q" | "exit" => Ok(SessionCommand::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Everything the session screen currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub phase: SessionPhase,
    pub score: SessionScore,
    pub sample: Option<PredictionRecord>,
    pub verdict: Option<Verdict>,
    pub chart: Option<AggregateResult>,
}

impl SessionStatus {
    pub fn capture<M: Classifier + ?Sized>(session: &InteractiveSession<'_, M>) -> Self {
        Self {
            phase: session.phase(),
            score: session.score(),
            sample: session.current_sample().copied(),
            verdict: session.last_verdict().copied(),
            chart: session.chart().cloned(),
        }
    }
}

/// Status update produced by one command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    SampleLoaded(PredictionRecord),
    Scored(Verdict),
    /// Predict with nothing loaded
    NoSample,
    ScoreReset(SessionScore),
    Aggregate(AggregateResult),
    Status(SessionStatus),
    Help,
    Quit,
}

/// Run one command against the session
pub fn dispatch<M: Classifier + ?Sized>(
    session: &mut InteractiveSession<'_, M>,
    command: SessionCommand,
) -> CommandOutput {
    match command {
        SessionCommand::LoadSample => CommandOutput::SampleLoaded(*session.load_sample()),
        SessionCommand::Predict => match session.predict() {
            Some(verdict) => CommandOutput::Scored(verdict),
            None => CommandOutput::NoSample,
        },
        SessionCommand::ResetScore => {
            session.reset();
            CommandOutput::ScoreReset(session.score())
        }
        SessionCommand::RunAggregate => CommandOutput::Aggregate(session.run_aggregate().clone()),
        SessionCommand::Status => CommandOutput::Status(SessionStatus::capture(session)),
        SessionCommand::Help => CommandOutput::Help,
        SessionCommand::Quit => CommandOutput::Quit,
    }
}
