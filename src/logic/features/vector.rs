//! Feature Vector - the three decision features of one telemetry sample

use serde::{Deserialize, Serialize};

use super::layout::{feature_name, FEATURE_COUNT};

/// Decision features in layout order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub ram_usage_mb: f64,
    pub swap_usage_mb: f64,
    pub cpu_usage: f64,
}

impl FeatureVector {
    pub fn new(ram_usage_mb: f64, swap_usage_mb: f64, cpu_usage: f64) -> Self {
        Self {
            ram_usage_mb,
            swap_usage_mb,
            cpu_usage,
        }
    }

    /// Values in the order defined by FEATURE_LAYOUT
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [self.ram_usage_mb, self.swap_usage_mb, self.cpu_usage]
    }

    /// Value at a layout index
    pub fn get(&self, index: usize) -> f64 {
        self.as_array()[index]
    }
}

impl std::fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, value) in self.as_array().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", feature_name(i).unwrap_or("?"), value)?;
        }
        Ok(())
    }
}
