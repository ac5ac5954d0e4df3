//! Evaluator - holdout predictions, confusion matrix and per-class metrics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logic::dataset::{Dataset, PredictionRecord, SuggestedAction, CLASS_COUNT};
use crate::logic::model::Classifier;

// ============================================================================
// CONFUSION MATRIX
// ============================================================================

/// Rows are true labels, columns predicted labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[u64; CLASS_COUNT]; CLASS_COUNT],
}

impl ConfusionMatrix {
    pub fn from_predictions(predictions: &[PredictionRecord]) -> Self {
        let mut matrix = Self::default();
        for p in predictions {
            matrix.counts[p.true_label.index()][p.predicted_label.index()] += 1;
        }
        matrix
    }

    pub fn get(&self, truth: SuggestedAction, predicted: SuggestedAction) -> u64 {
        self.counts[truth.index()][predicted.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> u64 {
        (0..CLASS_COUNT).map(|i| self.counts[i][i]).sum()
    }

    fn true_count(&self, class: usize) -> u64 {
        self.counts[class].iter().sum()
    }

    fn predicted_count(&self, class: usize) -> u64 {
        self.counts.iter().map(|row| row[class]).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "true\\pred")?;
        for action in SuggestedAction::ALL {
            write!(f, "{:>8}", action.as_str())?;
        }
        for truth in SuggestedAction::ALL {
            writeln!(f)?;
            write!(f, "{:>9}", truth.as_str())?;
            for predicted in SuggestedAction::ALL {
                write!(f, "{:>8}", self.get(truth, predicted))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// METRICS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: SuggestedAction,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub confusion: ConfusionMatrix,
    /// Only labels seen as truth or prediction
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
}

impl ClassificationReport {
    pub fn from_confusion(confusion: ConfusionMatrix) -> Self {
        let mut per_class = Vec::new();
        for action in SuggestedAction::ALL {
            let c = action.index();
            let support = confusion.true_count(c);
            let predicted = confusion.predicted_count(c);
            if support == 0 && predicted == 0 {
                continue;
            }

            let tp = confusion.counts[c][c];
            let precision = ratio(tp, predicted);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            per_class.push(ClassMetrics {
                label: action,
                precision,
                recall,
                f1,
                support,
            });
        }

        let total = confusion.total();
        let accuracy = ratio(confusion.correct(), total);
        let macro_f1 = if per_class.is_empty() {
            0.0
        } else {
            per_class.iter().map(|m| m.f1).sum::<f64>() / per_class.len() as f64
        };
        let weighted_f1 = if total == 0 {
            0.0
        } else {
            per_class.iter().map(|m| m.f1 * m.support as f64).sum::<f64>() / total as f64
        };

        Self {
            confusion,
            per_class,
            accuracy,
            macro_f1,
            weighted_f1,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>9}{:>11}{:>9}{:>10}{:>9}", "", "precision", "recall", "f1-score", "support")?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>9}{:>11.2}{:>9.2}{:>10.2}{:>9}",
                m.label.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            )?;
        }
        let total = self.confusion.total();
        writeln!(f)?;
        writeln!(f, "{:>9}{:>11}{:>9}{:>10.2}{:>9}", "accuracy", "", "", self.accuracy, total)?;
        writeln!(f, "{:>9}{:>11}{:>9}{:>10.2}{:>9}", "macro f1", "", "", self.macro_f1, total)?;
        write!(f, "{:>9}{:>11}{:>9}{:>10.2}{:>9}", "wtd f1", "", "", self.weighted_f1, total)
    }
}

// ============================================================================
// EVALUATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub predictions: Vec<PredictionRecord>,
    pub report: ClassificationReport,
}

/// Predict every holdout row and summarize. No side effects.
pub fn evaluate<M: Classifier + ?Sized>(model: &M, holdout: &Dataset) -> Evaluation {
    let predictions: Vec<PredictionRecord> = holdout
        .iter()
        .map(|record| PredictionRecord {
            features: record.features,
            true_label: record.suggested_action,
            predicted_label: model.predict(&record.features),
        })
        .collect();

    let report = ClassificationReport::from_confusion(ConfusionMatrix::from_predictions(&predictions));

    Evaluation {
        predictions,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::dataset::record::LabeledRecord;
    use crate::logic::error::Stage;
    use crate::logic::features::FeatureVector;

    /// Predicts "1" above 50% CPU, "0" otherwise
    struct CpuRule;

    impl Classifier for CpuRule {
        fn predict(&self, features: &FeatureVector) -> SuggestedAction {
            if features.cpu_usage > 50.0 {
                SuggestedAction::Elevated
            } else {
                SuggestedAction::Nominal
            }
        }
    }

    fn record(cpu: f64, label: SuggestedAction) -> LabeledRecord {
        LabeledRecord {
            features: FeatureVector::new(0.0, 0.0, cpu),
            suggested_action: label,
        }
    }

    #[test]
    fn test_evaluate_counts_and_metrics() {
        use SuggestedAction::*;
        let holdout = Dataset::new(
            vec![
                record(10.0, Nominal),  // tp 0
                record(20.0, Nominal),  // tp 0
                record(80.0, Nominal),  // 0 → 1
                record(90.0, Elevated), // tp 1
                record(30.0, Elevated), // 1 → 0
                record(95.0, Critical), // 3 → 1
            ],
            Stage::Select,
        )
        .unwrap();

        let eval = evaluate(&CpuRule, &holdout);
        assert_eq!(eval.predictions.len(), 6);
        assert_eq!(eval.predictions[2].predicted_label, Elevated);
        assert!(!eval.predictions[2].is_correct());

        let cm = &eval.report.confusion;
        assert_eq!(cm.get(Nominal, Nominal), 2);
        assert_eq!(cm.get(Nominal, Elevated), 1);
        assert_eq!(cm.get(Elevated, Nominal), 1);
        assert_eq!(cm.get(Critical, Elevated), 1);
        assert_eq!(cm.total(), 6);
        assert_eq!(cm.correct(), 3);

        let report = &eval.report;
        assert!((report.accuracy - 0.5).abs() < 1e-12);
        // Severe never appears
        assert_eq!(report.per_class.len(), 3);

        let nominal = &report.per_class[0];
        assert!((nominal.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((nominal.recall - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(nominal.support, 3);

        let critical = &report.per_class[2];
        assert_eq!(critical.label, Critical);
        assert_eq!(critical.precision, 0.0);
        assert_eq!(critical.f1, 0.0);
    }

    #[test]
    fn test_report_renders() {
        let holdout = Dataset::new(vec![record(10.0, SuggestedAction::Nominal)], Stage::Select).unwrap();
        let text = evaluate(&CpuRule, &holdout).report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));

        let matrix = evaluate(&CpuRule, &holdout).report.confusion.to_string();
        assert_eq!(matrix.lines().count(), 1 + CLASS_COUNT);
    }
}
