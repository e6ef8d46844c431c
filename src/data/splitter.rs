// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Partitions cleaned records into two disjoint sets:
//   - Training set: used to update model weights
//   - Test set:     held out for the evaluation report
//
// Procedure:
//   1. Validate: 0 < train_fraction < 1, at least one record
//   2. Optionally permute record indices with a seeded
//      Fisher-Yates shuffle (rand::seq::SliceRandom on StdRng)
//   3. First floor(train_fraction * N) records → train,
//      the remainder → test
//   4. Optionally truncate test to its first `test_cap` records
//
// The input slice is never reordered or modified; both outputs
// are fresh Vecs. Same records + same config → same split.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};

/// Split parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Proportion for training, strictly between 0 and 1
    pub train_fraction: f64,
    /// Permute before partitioning
    pub shuffle: bool,
    /// Seed for the permutation
    pub seed: u64,
    /// Keep at most this many test records
    pub test_cap: Option<usize>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.3,
            shuffle:        true,
            seed:           42,
            test_cap:       Some(10_000),
        }
    }
}

/// A disjoint (train, test) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub test:  Vec<T>,
}

/// Split `records` into train and test according to `cfg`.
///
/// # Errors
/// `InvalidFraction` if `cfg.train_fraction` is not in (0, 1),
/// `EmptyDataset` if `records` is empty.
///
/// # Example
/// ```ignore
/// let split = train_test_split(&records, &SplitConfig { train_fraction: 0.3, ..Default::default() })?;
/// // 10 records → 3 train, 7 test
/// ```
pub fn train_test_split<T: Clone>(records: &[T], cfg: &SplitConfig) -> PipelineResult<Split<T>> {
    // NaN fails both comparisons and is rejected here too
    if !(cfg.train_fraction > 0.0 && cfg.train_fraction < 1.0) {
        return Err(PipelineError::InvalidFraction(cfg.train_fraction));
    }
    if records.is_empty() {
        return Err(PipelineError::EmptyDataset);
    }

    let total = records.len();

    // Work on indices so the caller's slice stays untouched
    let mut order: Vec<usize> = (0..total).collect();
    if cfg.shuffle {
        let mut rng = StdRng::seed_from_u64(cfg.seed);
        order.shuffle(&mut rng);
    }

    // e.g. 10 records * 0.3 = 3 → first 3 are training
    let split_at = ((total as f64) * cfg.train_fraction).floor() as usize;
    let split_at = split_at.min(total);

    let train: Vec<T> = order[..split_at].iter().map(|&i| records[i].clone()).collect();

    let test_end = match cfg.test_cap {
        Some(cap) => (split_at + cap).min(total),
        None      => total,
    };
    let test: Vec<T> = order[split_at..test_end].iter().map(|&i| records[i].clone()).collect();

    tracing::debug!(
        "Dataset split: {} training, {} test ({} dropped by cap)",
        train.len(),
        test.len(),
        total - test_end,
    );

    Ok(Split { train, test })
}
