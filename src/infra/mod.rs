// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   checkpoint.rs      — Saving and loading model weights
//                        with Burn's CompactRecorder, plus the
//                        JSON side files (latest_epoch.json,
//                        classifier.json, train_config.json).
//
//   tokenizer_store.rs — HfTokenizer (BatchTokenizer +
//                        Persistable over the `tokenizers`
//                        crate) and the tokenizer.json store
//                        that builds a word-level vocabulary
//                        when none exists.
//
//   metrics.rs         — loss.csv every `logging_steps` steps
//                        and metrics.csv once per epoch.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
