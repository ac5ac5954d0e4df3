//! Class Weights - imbalance compensation

use serde::{Deserialize, Serialize};

use crate::logic::dataset::CLASS_COUNT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeighting {
    /// Every sample counts once
    Uniform,
    /// n_samples / (n_present_classes * n_c)
    Balanced,
}

impl ClassWeighting {
    /// Per-class weights from class counts. Absent classes get 0.
    pub fn weights(&self, counts: &[usize; CLASS_COUNT]) -> [f64; CLASS_COUNT] {
        let mut weights = [0.0; CLASS_COUNT];
        let total: usize = counts.iter().sum();
        let present = counts.iter().filter(|&&c| c > 0).count();

        for (w, &count) in weights.iter_mut().zip(counts) {
            if count == 0 {
                continue;
            }
            *w = match self {
                ClassWeighting::Uniform => 1.0,
                ClassWeighting::Balanced => total as f64 / (present as f64 * count as f64),
            };
        }
        weights
    }
}
