//! Dataset Module - Telemetry Table to Labeled Train/Holdout Sets
//!
//! Loader → label derivation → feature selection → seeded split.

pub mod label;
pub mod loader;
pub mod record;
pub mod select;
pub mod split;


pub use label::{SuggestedAction, CLASS_COUNT};
pub use loader::load_records;
pub use record::{Dataset, PredictionRecord};
pub use select::select_features;
pub use split::{split, Split};
