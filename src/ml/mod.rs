// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific model code lives here, plus the evaluation
// reporter that scores its predictions.
//
//   model.rs      — transformer encoder + linear classification head
//                   (token & position embeddings, masked multi-head
//                   self-attention, GELU feed-forward, layer norm,
//                   residual connections)
//
//   trainer.rs    — AdamW training loop with per-epoch evaluation,
//                   loss telemetry and checkpointing
//
//   classifier.rs — BurnClassifier: SequenceClassifier + Persistable
//                   over the model, so upper layers stay Burn-free
//
//   report.rs     — precision / recall / F1 / confusion matrix
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT

/// Transformer encoder sequence-classification model
pub mod model;

/// Training loop with evaluation and checkpointing
pub mod trainer;

/// Trait implementations wrapping the model
pub mod classifier;

/// Classification metrics from predicted vs. actual labels
pub mod report;
