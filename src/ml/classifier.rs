// ============================================================
// Layer 5 — Burn Classifier
// ============================================================
// Wraps the model, its architecture config and the optimisation
// settings behind the SequenceClassifier and Persistable traits,
// so the application layer never touches Burn types directly.
//
// Files written by `save(dir)`:
//   dir/
//     classifier.json   ← architecture + training settings
//     model.mpk.gz      ← weights (CompactRecorder)
//
// `fit` also writes classifier.json next to the per-epoch
// checkpoints, so a checkpoint directory can be reopened with
// `resume_on` after an interrupted run.

use anyhow::{ensure, Result};
use burn::{module::AutodiffModule, tensor::backend::AutodiffBackend};
use burn::data::dataloader::batcher::Batcher;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::batcher::ClassificationBatcher;
use crate::domain::record::{PredictionResult, TokenizedRecord};
use crate::domain::traits::{FitSummary, Persistable, SequenceClassifier};
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::MetricsLogger;
use crate::ml::model::{NewsClassifierConfig, NewsClassifierModel};
use crate::ml::trainer::{train_loop, TrainSettings, TrainSinks};

const MANIFEST_FILE: &str = "classifier.json";

/// Training backend used by the CLI.
pub type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// What `classifier.json` holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierManifest {
    pub model:    NewsClassifierConfig,
    pub training: TrainSettings,
}

pub struct BurnClassifier<B: AutodiffBackend> {
    model:       NewsClassifierModel<B>,
    manifest:    ClassifierManifest,
    device:      B::Device,
    checkpoints: Option<CheckpointManager>,
    metrics:     Option<MetricsLogger>,
}

impl<B: AutodiffBackend> BurnClassifier<B> {
    /// Fresh, randomly initialised classifier.
    pub fn new(model_cfg: NewsClassifierConfig, training: TrainSettings, device: B::Device) -> Self {
        B::seed(training.seed);
        let model = model_cfg.init::<B>(&device);
        tracing::info!(
            "Model ready: {} layers, d_model={}, {} classes, vocab={}",
            model_cfg.num_layers, model_cfg.d_model, model_cfg.num_classes, model_cfg.vocab_size
        );
        Self {
            model,
            manifest: ClassifierManifest { model: model_cfg, training },
            device,
            checkpoints: None,
            metrics: None,
        }
    }

    /// Write per-epoch checkpoints during `fit`.
    pub fn with_checkpoints(mut self, ckpt: CheckpointManager) -> Self {
        self.checkpoints = Some(ckpt);
        self
    }

    /// Write loss.csv / metrics.csv during `fit`.
    pub fn with_metrics(mut self, metrics: MetricsLogger) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the optimisation settings, e.g. when continuing
    /// training from a saved classifier.
    pub fn with_training(mut self, training: TrainSettings) -> Self {
        self.manifest.training = training;
        self
    }

    pub fn config(&self) -> &NewsClassifierConfig {
        &self.manifest.model
    }

    #[cfg(test)]
    pub fn training(&self) -> &TrainSettings {
        &self.manifest.training
    }

    /// Load weights and manifest from `dir` onto a specific device.
    pub fn load_on(dir: &Path, device: B::Device) -> Result<Self> {
        let ckpt     = CheckpointManager::open(dir);
        let manifest = ckpt.load_json::<ClassifierManifest>(MANIFEST_FILE)?;
        let model    = manifest.model.init::<B>(&device);
        let model    = ckpt.load_final(model, &device)?;
        tracing::info!("Classifier loaded from '{}'", dir.display());
        Ok(Self { model, manifest, device, checkpoints: None, metrics: None })
    }

    /// Load the latest epoch checkpoint written to `dir` during `fit`.
    pub fn resume_on(dir: &Path, device: B::Device) -> Result<Self> {
        let ckpt     = CheckpointManager::open(dir);
        let manifest = ckpt.load_json::<ClassifierManifest>(MANIFEST_FILE)?;
        let model    = manifest.model.init::<B>(&device);
        let model    = ckpt.load_model(model, &device)?;
        Ok(Self { model, manifest, device, checkpoints: None, metrics: None })
    }
}

impl<B: AutodiffBackend> SequenceClassifier for BurnClassifier<B> {
    fn fit(&mut self, train: &[TokenizedRecord], eval: &[TokenizedRecord]) -> Result<FitSummary> {
        if let Some(ckpt) = &self.checkpoints {
            ckpt.save_json(MANIFEST_FILE, &self.manifest)?;
        }
        let sinks = TrainSinks {
            checkpoints: self.checkpoints.as_ref(),
            metrics:     self.metrics.as_ref(),
        };
        let (model, summary) = train_loop(
            self.model.clone(),
            self.manifest.model.max_seq_len,
            train.to_vec(),
            eval.to_vec(),
            &self.manifest.training,
            sinks,
            &self.device,
        )?;
        self.model = model;
        Ok(summary)
    }

    fn predict(&self, records: &[TokenizedRecord]) -> Result<Vec<PredictionResult>> {
        let num_classes = self.manifest.model.num_classes;
        let batch_size  = self.manifest.training.batch_size.max(1);
        let model       = self.model.valid();
        let batcher     = ClassificationBatcher::<B::InnerBackend>::new(
            self.device.clone(),
            self.manifest.model.max_seq_len,
            self.manifest.training.pad_id,
        );

        let mut out = Vec::with_capacity(records.len());
        for chunk in records.chunks(batch_size) {
            let batch  = batcher.batch(chunk.to_vec());
            let logits = model.forward(batch.input_ids, batch.attention_mask);
            let probs: Vec<f32> = burn::tensor::activation::softmax(logits, 1)
                .into_data()
                .to_vec::<f32>()
                .map_err(|e| anyhow::anyhow!("Cannot read prediction scores: {e:?}"))?;

            ensure!(
                probs.len() == chunk.len() * num_classes,
                "expected {} scores, got {}",
                chunk.len() * num_classes,
                probs.len()
            );
            out.extend(probs.chunks(num_classes).map(|s| PredictionResult::new(s.to_vec())));
        }

        tracing::debug!("Predicted {} records", out.len());
        Ok(out)
    }

    fn num_classes(&self) -> usize {
        self.manifest.model.num_classes
    }
}

impl<B: AutodiffBackend> Persistable for BurnClassifier<B> {
    fn save(&self, dir: &Path) -> Result<()> {
        let ckpt = CheckpointManager::new(dir)?;
        ckpt.save_json(MANIFEST_FILE, &self.manifest)?;
        ckpt.save_final(&self.model)?;
        tracing::info!("Classifier saved to '{}'", dir.display());
        Ok(())
    }

    fn load(dir: &Path) -> Result<Self> {
        Self::load_on(dir, B::Device::default())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn rec(ids: &[u32], label: Option<usize>) -> TokenizedRecord {
        TokenizedRecord {
            input_ids:      ids.to_vec(),
            attention_mask: vec![1; ids.len()],
            label,
        }
    }

    fn classifier() -> BurnClassifier<TestBackend> {
        BurnClassifier::new(
            NewsClassifierConfig::new(16, 8, 8, 2, 1, 16, 3, 0.0),
            TrainSettings { epochs: 1, batch_size: 2, lr: 1e-3, ..Default::default() },
            Default::default(),
        )
    }

    #[test]
    fn test_predict_returns_probabilities_in_order() {
        let clf   = classifier();
        let input = vec![rec(&[1, 2, 3], None), rec(&[4], None), rec(&[5, 6], None)];
        let preds = clf.predict(&input).unwrap();

        assert_eq!(preds.len(), 3);
        for p in &preds {
            assert_eq!(p.scores.len(), 3);
            let sum: f32 = p.scores.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_fit_then_predict() {
        let mut clf = classifier();
        let train   = vec![rec(&[1, 2], Some(0)), rec(&[3, 4], Some(1)), rec(&[5, 6], Some(2))];
        let summary = clf.fit(&train, &[]).unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(clf.predict(&train).unwrap().len(), 3);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let clf = classifier();
        clf.save(dir.path()).unwrap();

        let loaded = BurnClassifier::<TestBackend>::load(dir.path()).unwrap();
        assert_eq!(loaded.num_classes(), 3);
        assert_eq!(loaded.training().batch_size, 2);

        let input  = vec![rec(&[1, 2, 3], None)];
        let before = clf.predict(&input).unwrap();
        let after  = loaded.predict(&input).unwrap();
        // CompactRecorder stores half precision weights
        for (a, b) in before[0].scores.iter().zip(&after[0].scores) {
            assert!((a - b).abs() < 1e-2);
        }
    }

    #[test]
    fn test_resume_from_epoch_checkpoint() {
        let dir     = tempfile::tempdir().unwrap();
        let mut clf = classifier().with_checkpoints(CheckpointManager::new(dir.path()).unwrap());
        let train   = vec![rec(&[1, 2], Some(0)), rec(&[3, 4], Some(1)), rec(&[5, 6], Some(2))];
        clf.fit(&train, &[]).unwrap();

        let resumed = BurnClassifier::<TestBackend>::resume_on(dir.path(), Default::default()).unwrap();
        assert_eq!(resumed.num_classes(), 3);
        assert_eq!(resumed.config().max_seq_len, 8);

        let input  = vec![rec(&[1, 2, 3], None)];
        let before = clf.predict(&input).unwrap();
        let after  = resumed.predict(&input).unwrap();
        for (a, b) in before[0].scores.iter().zip(&after[0].scores) {
            assert!((a - b).abs() < 1e-2);
        }
    }

    #[test]
    fn test_resume_without_checkpoint_fails() {
        let dir = tempfile::tempdir().unwrap();
        classifier().save(dir.path()).unwrap();
        assert!(BurnClassifier::<TestBackend>::resume_on(dir.path(), Default::default()).is_err());
    }

    #[test]
    fn test_load_from_empty_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(BurnClassifier::<TestBackend>::load(dir.path()).is_err());
    }
}
