// ============================================================
// Layer 3 — Record Types
// ============================================================
// The values that flow between pipeline stages:
//
//   RawRecord        — text + label exactly as read from the CSV
//   Record           — text + label remapped into [0, K-1]
//   TokenizedRecord  — token ids + attention mask (+ label)
//   PredictionResult — per-class scores for one input
//
// A Record can only be built from a RawRecord by the label
// remapper, which consumes the RawRecord. Remapping the same
// record twice is therefore not expressible.

use serde::{Deserialize, Serialize};

/// One labelled sample as it appears in the source file.
/// The label follows the dataset's own convention (AG News is 1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub text:  String,
    pub label: i64,
}

impl RawRecord {
    pub fn new(text: impl Into<String>, label: i64) -> Self {
        Self { text: text.into(), label }
    }
}

/// One labelled sample with its label in `[0, K-1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub text:  String,
    pub label: usize,
}

impl Record {
    /// Build a record whose label is already zero-based.
    /// Only the label remapper and tests should need this.
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}

/// Output of a tokenizer for a single text, before labels are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedText {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
}

/// A record in the numeric form the classifier consumes.
/// `label` is `None` for inference inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizedRecord {
    pub input_ids:      Vec<u32>,
    pub attention_mask: Vec<u32>,
    pub label:          Option<usize>,
}

impl TokenizedRecord {
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Drop the label, e.g. before handing a held-out set to `predict`.
    pub fn without_label(&self) -> Self {
        Self {
            input_ids:      self.input_ids.clone(),
            attention_mask: self.attention_mask.clone(),
            label:          None,
        }
    }
}

/// Per-class scores for one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub scores: Vec<f32>,
}

impl PredictionResult {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }

    /// Index of the highest score. Ties go to the lowest index,
    /// NaN scores never win.
    pub fn predicted_label(&self) -> usize {
        let mut best_idx   = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (i, &s) in self.scores.iter().enumerate() {
            if s > best_score {
                best_score = s;
                best_idx   = i;
            }
        }
        best_idx
    }

    /// Score of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.scores
            .get(self.predicted_label())
            .copied()
            .unwrap_or(0.0)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicted_label_is_argmax() {
        let p = PredictionResult::new(vec![0.1, 0.7, 0.15, 0.05]);
        assert_eq!(p.predicted_label(), 1);
        assert!((p.confidence() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_predicted_label_tie_goes_to_first() {
        let p = PredictionResult::new(vec![0.4, 0.4, 0.2]);
        assert_eq!(p.predicted_label(), 0);
    }

    #[test]
    fn test_predicted_label_skips_nan() {
        let p = PredictionResult::new(vec![f32::NAN, 0.2, 0.8]);
        assert_eq!(p.predicted_label(), 2);
    }

    #[test]
    fn test_without_label_keeps_ids() {
        let t = TokenizedRecord {
            input_ids:      vec![101, 7, 102],
            attention_mask: vec![1, 1, 1],
            label:          Some(3),
        };
        let u = t.without_label();
        assert_eq!(u.input_ids, t.input_ids);
        assert_eq!(u.label, None);
    }
}
