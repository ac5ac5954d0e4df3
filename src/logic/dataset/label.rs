//! Suggested Action Labels
//!
//! Four categorical remediation buckets derived from page-fault delta
//! severity. The codes are symbolic: never compare or average them as
//! numbers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// BUCKET BOUNDARIES
// ============================================================================

/// Upper bound (inclusive) of bucket "0"
pub const NOMINAL_MAX_DELTA: f64 = 3000.0;
/// Upper bound (inclusive) of bucket "1"
pub const ELEVATED_MAX_DELTA: f64 = 5000.0;
/// Upper bound (inclusive) of bucket "2"
pub const SEVERE_MAX_DELTA: f64 = 100_000.0;

/// Number of labels in the domain
pub const CLASS_COUNT: usize = 4;

// ============================================================================
// LABEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuggestedAction {
    /// Code "0"
    Nominal,
    /// Code "1"
    Elevated,
    /// Code "2"
    Severe,
    /// Code "3"
    Critical,
}

impl SuggestedAction {
    pub const ALL: [SuggestedAction; CLASS_COUNT] = [
        SuggestedAction::Nominal,
        SuggestedAction::Elevated,
        SuggestedAction::Severe,
        SuggestedAction::Critical,
    ];

    /// Bucket a page-fault delta. Total over all reals; NaN lands in "3".
    pub fn from_delta(delta: f64) -> Self {
        if delta <= NOMINAL_MAX_DELTA {
            SuggestedAction::Nominal
        } else if delta <= ELEVATED_MAX_DELTA {
            SuggestedAction::Elevated
        } else if delta <= SEVERE_MAX_DELTA {
            SuggestedAction::Severe
        } else {
            SuggestedAction::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestedAction::Nominal => "0",
            SuggestedAction::Elevated => "1",
            SuggestedAction::Severe => "2",
            SuggestedAction::Critical => "3",
        }
    }

    /// Dense index into per-class arrays
    pub fn index(&self) -> usize {
        match self {
            SuggestedAction::Nominal => 0,
            SuggestedAction::Elevated => 1,
            SuggestedAction::Severe => 2,
            SuggestedAction::Critical => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

/// Derive the label for one delta
pub fn derive_label(page_fault_delta: f64) -> SuggestedAction {
    SuggestedAction::from_delta(page_fault_delta)
}

impl fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// NORMALIZED PARSING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLabel(pub String);

impl fmt::Display for UnknownLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a suggested action code (0-3)", self.0)
    }
}

impl std::error::Error for UnknownLabel {}

impl FromStr for SuggestedAction {
    type Err = UnknownLabel;

    /// Accepts "2", " 2 " and "2.0" alike; tables written by other tools
    /// sometimes store the codes as floats.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let index = match trimmed.parse::<usize>() {
            Ok(index) => Some(index),
            Err(_) => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && (0.0..=3.0).contains(v))
                .map(|v| v as usize),
        };

        index
            .and_then(Self::from_index)
            .ok_or_else(|| UnknownLabel(s.to_string()))
    }
}

impl Serialize for SuggestedAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SuggestedAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
