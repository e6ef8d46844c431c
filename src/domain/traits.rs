// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The narrow capability sets the pipeline talks to:
//
//   RecordSource       — "loads raw labelled records"
//   BatchTokenizer     — "tokenizes batches"
//   SequenceClassifier — "trains and predicts"
//   Persistable        — "saves/loads its state to a directory"
//
// Implementations:
//   - CsvLoader          → RecordSource          (data layer)
//   - HfTokenizer        → BatchTokenizer, Persistable (infra layer)
//   - BurnClassifier<B>  → SequenceClassifier, Persistable (ml layer)
//
// Tests substitute small fakes for the tokenizer and classifier
// so the pipeline can be exercised without a model backend.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

use crate::domain::record::{EncodedText, PredictionResult, RawRecord, TokenizedRecord};

// ─── RecordSource ─────────────────────────────────────────────────────────────
/// Any component that can produce raw labelled records.
pub trait RecordSource {
    /// Load every record from this source, in source order.
    fn load_all(&self) -> Result<Vec<RawRecord>>;
}

// ─── BatchTokenizer ───────────────────────────────────────────────────────────
/// Converts a batch of strings into aligned id / mask sequences.
/// Truncation policy belongs to the implementation; `max_length`
/// is only a request.
pub trait BatchTokenizer {
    fn encode_batch(&self, texts: &[&str], max_length: Option<usize>) -> Result<Vec<EncodedText>>;

    /// One past the largest token id this tokenizer can emit.
    fn vocab_size(&self) -> usize;

    /// Id used to pad sequences to a common length.
    fn pad_id(&self) -> u32 {
        0
    }
}

// ─── SequenceClassifier ───────────────────────────────────────────────────────
/// Summary of a `fit` call, for logging and reports.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub epochs:          usize,
    pub steps:           usize,
    pub final_train_loss: f64,
    pub final_eval_loss:  Option<f64>,
}

/// A model that can be trained on labelled tokenized records and
/// then score unlabeled ones.
pub trait SequenceClassifier {
    /// Train on `train`, reporting held-out loss on `eval` when it is non-empty.
    /// Records without a label are rejected.
    fn fit(&mut self, train: &[TokenizedRecord], eval: &[TokenizedRecord]) -> Result<FitSummary>;

    /// One score vector per input, in input order.
    fn predict(&self, records: &[TokenizedRecord]) -> Result<Vec<PredictionResult>>;

    fn num_classes(&self) -> usize;
}

// ─── Persistable ──────────────────────────────────────────────────────────────
/// Any component whose state can be saved to and restored from a directory.
pub trait Persistable: Sized {
    fn save(&self, dir: &Path) -> Result<()>;

    fn load(dir: &Path) -> Result<Self>;
}
