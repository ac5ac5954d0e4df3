//! Features Module - Decision Feature Schema
//!
//! Fixed, versioned layout of the features the classifier sees.

pub mod layout;
pub mod vector;

// Re-export common types
pub use layout::{LayoutInfo, FEATURE_COUNT};
pub use vector::FeatureVector;
