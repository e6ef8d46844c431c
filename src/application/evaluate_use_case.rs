// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved model against a labelled CSV:
//
//   Step 1: Reload train_config.json, tokenizer and weights
//   Step 2: Load the CSV (optionally a random window of N rows)
//   Step 3: Normalize + remap with the saved configuration
//   Step 4: Predict and build the classification report
//   Step 5: Collect the first `show` prediction-vs-actual rows

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;

use crate::application::pipeline::{evaluate_records, log_class_balance, prepare_records, Evaluation};
use crate::application::train_use_case::TrainConfig;
use crate::data::loader::CsvLoader;
use crate::domain::traits::{Persistable, RecordSource, SequenceClassifier};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::HfTokenizer};
use crate::ml::classifier::{BurnClassifier, TrainBackend};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub model_dir: String,
    pub data_path: String,
    /// Evaluate a random contiguous window of this many records
    pub sample:    Option<usize>,
    /// Number of prediction-vs-actual rows to return
    pub show:      usize,
    pub seed:      u64,
}

/// One displayed prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub text:       String,
    pub actual:     String,
    pub predicted:  String,
    pub confidence: f32,
}

pub struct EvaluationReport {
    pub class_names: Vec<String>,
    pub evaluation:  Evaluation,
    pub rows:        Vec<ComparisonRow>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        self.execute_on::<TrainBackend>(Default::default())
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<EvaluationReport> {
        let eval_cfg  = &self.config;
        let model_dir = Path::new(&eval_cfg.model_dir);

        // ── Step 1: Reload everything the training run saved ─────────────────
        let cfg: TrainConfig = CheckpointManager::open(model_dir).load_config()?;
        let tokenizer        = HfTokenizer::load(model_dir)?;
        let classifier       = BurnClassifier::<B>::load_on(model_dir, device)?;
        ensure!(
            classifier.num_classes() == cfg.num_classes(),
            "model has {} classes but train_config.json names {}",
            classifier.num_classes(),
            cfg.num_classes()
        );

        // ── Step 2: Load records, optionally a window of them ────────────────
        let raw = CsvLoader::new(&eval_cfg.data_path)
            .with_separator(cfg.title_separator.clone())
            .load_all()?;
        let raw = match eval_cfg.sample {
            Some(n) => sample_window(&raw, n, eval_cfg.seed).to_vec(),
            None    => raw,
        };
        ensure!(!raw.is_empty(), "no records to evaluate in '{}'", eval_cfg.data_path);
        tracing::info!("Evaluating {} records", raw.len());
        let originals: Vec<String> = raw.iter().map(|r| r.text.clone()).collect();

        // ── Step 3: Same cleaning as training ────────────────────────────────
        let records = prepare_records(raw, &cfg.text_normalizer(), &cfg.label_remapper())?;
        log_class_balance(&records, &cfg.class_names);

        // ── Step 4: Predict + report ─────────────────────────────────────────
        let max_length = classifier.config().max_seq_len;
        let evaluation = evaluate_records(&records, &tokenizer, &classifier, Some(max_length))?;
        tracing::info!("Accuracy: {:.4}", evaluation.metrics.accuracy);

        // ── Step 5: Comparison rows ──────────────────────────────────────────
        let rows = originals
            .into_iter()
            .zip(evaluation.actual.iter().zip(&evaluation.predicted))
            .zip(&evaluation.predictions)
            .take(eval_cfg.show)
            .map(|((text, (&actual, &predicted)), pred)| ComparisonRow {
                text,
                actual:     cfg.class_name(actual),
                predicted:  cfg.class_name(predicted),
                confidence: pred.confidence(),
            })
            .collect();

        Ok(EvaluationReport { class_names: cfg.class_names.clone(), evaluation, rows })
    }
}

/// A seeded random contiguous run of `n` items, or all of them
/// when there are no more than `n`.
pub fn sample_window<T>(items: &[T], n: usize, seed: u64) -> &[T] {
    if n >= items.len() {
        return items;
    }
    let start = StdRng::seed_from_u64(seed).gen_range(0..=items.len() - n);
    &items[start..start + n]
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::tests::{tiny_config, write_csv, TestBackend};
    use crate::application::train_use_case::TrainUseCase;

    #[test]
    fn test_sample_window_is_contiguous_and_seeded() {
        let items: Vec<usize> = (0..100).collect();
        let a = sample_window(&items, 10, 7);
        let b = sample_window(&items, 10, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_sample_window_larger_than_input() {
        let items = [1, 2, 3];
        assert_eq!(sample_window(&items, 5, 0), &items[..]);
        assert_eq!(sample_window(&items, 0, 0).len(), 0);
    }

    #[test]
    fn test_evaluate_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        let eval = EvaluateUseCase::new(EvaluateConfig {
            model_dir: cfg.output_dir.clone(),
            data_path: write_csv(dir.path()),
            sample:    Some(6),
            show:      3,
            seed:      1,
        });
        let report = eval.execute_on::<TestBackend>(Default::default()).unwrap();

        assert_eq!(report.evaluation.actual.len(), 6);
        assert_eq!(report.evaluation.metrics.total, 6);
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.class_names, cfg.class_names);
        assert!(report.rows.iter().all(|r| cfg.class_names.contains(&r.actual)));
    }

    #[test]
    fn test_evaluate_without_training_fails() {
        let dir  = tempfile::tempdir().unwrap();
        let eval = EvaluateUseCase::new(EvaluateConfig {
            model_dir: dir.path().to_string_lossy().into_owned(),
            data_path: write_csv(dir.path()),
            sample:    None,
            show:      0,
            seed:      0,
        });
        assert!(eval.execute_on::<TestBackend>(Default::default()).is_err());
    }
}
