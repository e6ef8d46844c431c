// ============================================================
// Layer 5 — Evaluation Reporter
// ============================================================
// Per-class precision, recall, F1 and support plus a confusion
// matrix, computed from predicted vs. actual labels:
//
//   precision = TP / (TP + FP)
//   recall    = TP / (TP + FN)
//   f1        = 2 * precision * recall / (precision + recall)
//
// Pure functions only; turning Metrics into text is the CLI's
// job. Zero denominators give 0.0 rather than NaN.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub per_class: Vec<ClassMetrics>,
    /// `confusion[actual][predicted]`
    pub confusion: Vec<Vec<usize>>,
    pub accuracy:  f64,
    pub macro_avg:    AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub total:     usize,
}

impl Metrics {
    pub fn num_classes(&self) -> usize {
        self.per_class.len()
    }
}

/// Metrics over `K = max(label) + 1` classes, taken from both sequences.
/// The pipeline always knows K and calls `report_with_classes`.
#[cfg(test)]
pub fn report(predicted: &[usize], actual: &[usize]) -> PipelineResult<Metrics> {
    let k = predicted
        .iter()
        .chain(actual)
        .max()
        .map_or(0, |&m| m + 1);
    report_with_classes(predicted, actual, k)
}

/// Metrics over a fixed number of classes, so classes that never
/// occur still get a (zero) row.
pub fn report_with_classes(
    predicted:   &[usize],
    actual:      &[usize],
    num_classes: usize,
) -> PipelineResult<Metrics> {
    if predicted.len() != actual.len() {
        return Err(PipelineError::LengthMismatch {
            predicted: predicted.len(),
            actual:    actual.len(),
        });
    }

    let mut confusion = vec![vec![0usize; num_classes]; num_classes];
    for (&p, &a) in predicted.iter().zip(actual) {
        let out_of_range = [a, p].into_iter().find(|&l| l >= num_classes);
        if let Some(label) = out_of_range {
            return Err(PipelineError::OutOfRange {
                label:    label as i64,
                offset:   0,
                remapped: label as i64,
                max:      num_classes as i64 - 1,
            });
        }
        confusion[a][p] += 1;
    }

    let total = actual.len();
    let per_class: Vec<ClassMetrics> = (0..num_classes)
        .map(|c| {
            let tp        = confusion[c][c];
            let support   = confusion[c].iter().sum::<usize>();
            let predicted = (0..num_classes).map(|r| confusion[r][c]).sum::<usize>();
            let precision = ratio(tp, predicted);
            let recall    = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics { precision, recall, f1, support }
        })
        .collect();

    let correct  = (0..num_classes).map(|c| confusion[c][c]).sum::<usize>();
    let accuracy = ratio(correct, total);

    Ok(Metrics {
        macro_avg:    average(&per_class, |_| 1.0),
        weighted_avg: average(&per_class, |m| m.support as f64),
        per_class,
        confusion,
        accuracy,
        total,
    })
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

fn average(per_class: &[ClassMetrics], weight: impl Fn(&ClassMetrics) -> f64) -> AverageMetrics {
    let total_weight: f64 = per_class.iter().map(&weight).sum();
    if total_weight == 0.0 {
        return AverageMetrics { precision: 0.0, recall: 0.0, f1: 0.0 };
    }
    let mean = |f: fn(&ClassMetrics) -> f64| {
        per_class.iter().map(|m| f(m) * weight(m)).sum::<f64>() / total_weight
    };
    AverageMetrics {
        precision: mean(|m| m.precision),
        recall:    mean(|m| m.recall),
        f1:        mean(|m| m.f1),
    }
}
