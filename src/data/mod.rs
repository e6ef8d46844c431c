// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the raw CSV file to padded tensor batches.
//
// The pipeline flows in this order:
//
//   train.csv
//       │
//       ▼
//   CsvLoader         → RawRecord { text, label (1-based) }
//       │
//       ▼
//   TextNormalizer    → strips punctuation/digits, drops stopwords
//       │
//       ▼
//   LabelRemapper     → Record { text, label (0-based) }
//       │
//       ▼
//   train_test_split  → Split { train, test }
//       │
//       ▼
//   tokenize_batch    → TokenizedRecord { input_ids, attention_mask, label }
//       │
//       ▼
//   TokenizedDataset  → implements Burn's Dataset trait
//       │
//       ▼
//   ClassificationBatcher → pads each batch to its longest sequence
//
// Each stage takes its input by reference (or by value when the
// output type replaces the input type) and returns a new value.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labelled records from CSV
pub mod loader;

/// Punctuation, digit and stopword removal
pub mod normalizer;

/// Shifts labels into [0, K-1]
pub mod labels;

/// Seeded train/test partitioning
pub mod splitter;

/// Maps records to token ids through a BatchTokenizer
pub mod tokenize;

/// Implements Burn's Dataset trait for tokenized records
pub mod dataset;

/// Implements Burn's Batcher trait with dynamic padding
pub mod batcher;
