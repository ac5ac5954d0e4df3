//! Feature Layout - Centralized Feature Definition
//!
//! **This file controls the decision-feature schema.**
//!
//! Any change to the names or their order must bump `FEATURE_VERSION`:
//! persisted model artifacts carry the version and layout hash and are
//! rejected on load when they disagree with the running build.

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// FEATURE VERSION
// ============================================================================

/// Current feature layout version
pub const FEATURE_VERSION: u8 = 1;

// ============================================================================
// FEATURE LAYOUT (Authoritative source)
// ============================================================================

/// Decision features in the exact order they appear in a vector
pub const FEATURE_LAYOUT: &[&str] = &[
    "ram_usage_mb",  // 0: Resident memory in MB
    "swap_usage_mb", // 1: Swap in use in MB
    "cpu_usage",     // 2: CPU usage percent
];

/// Total number of features
/// Must match FEATURE_LAYOUT.len()
pub const FEATURE_COUNT: usize = 3;

// ============================================================================
// LAYOUT HASH
// ============================================================================

/// CRC32 over the version byte and the feature names
pub fn layout_hash() -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(&[FEATURE_VERSION]);

    for name in FEATURE_LAYOUT {
        hasher.update(name.as_bytes());
        hasher.update(&[0]); // Separator
    }

    hasher.finalize()
}

// ============================================================================
// LAYOUT INFO
// ============================================================================

/// Layout information stamped into persisted artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInfo {
    pub version: u8,
    pub hash: u32,
    pub feature_names: Vec<String>,
}

impl LayoutInfo {
    pub fn current() -> Self {
        Self {
            version: FEATURE_VERSION,
            hash: layout_hash(),
            feature_names: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Accept only artifacts stamped with this build's version and hash
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        let build = Self::current();
        if self.version != build.version || self.hash != build.hash {
            return Err(LayoutMismatchError {
                saved: self.clone(),
                build,
            });
        }
        Ok(())
    }
}

/// Saved model was trained on a different decision-feature layout
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "model trained on feature layout v{} [{}] ({:08x}), this build reads v{} [{}] ({:08x}); retrain the model",
    .saved.version,
    .saved.feature_names.join(", "),
    .saved.hash,
    .build.version,
    .build.feature_names.join(", "),
    .build.hash
)]
pub struct LayoutMismatchError {
    pub saved: LayoutInfo,
    pub build: LayoutInfo,
}

/// Get feature name by index
pub fn feature_name(index: usize) -> Option<&'static str> {
    FEATURE_LAYOUT.get(index).copied()
}

// ============================================================================
// TESTS
// ============================================================================
