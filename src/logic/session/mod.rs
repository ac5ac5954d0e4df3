//! Session Module - interactive replay of the persisted holdout set

pub mod aggregate;
pub mod state;


pub use aggregate::AggregateResult;
pub use state::{InteractiveSession, SessionPhase, SessionScore, Verdict};
