// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Full train + evaluation loop using Burn's DataLoader and AdamW.
//
// Key Burn insight:
//   - Training runs on an AutodiffBackend for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - The evaluation batcher must also use B::InnerBackend
//   - argmax(1) returns [batch,1] so we flatten before .equal()
//
// Per optimizer step the loss is accumulated; every
// `logging_steps` steps the running mean is written to loss.csv.
// Per epoch: evaluation loss/accuracy, metrics.csv row, and a
// checkpoint (model_epoch_{n}) when a CheckpointManager is given.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::{batcher::Batcher, DataLoaderBuilder},
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::ClassificationBatcher, dataset::TokenizedDataset};
use crate::domain::record::TokenizedRecord;
use crate::domain::traits::FitSummary;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::model::NewsClassifierModel;

/// Optimisation hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSettings {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub lr:            f64,
    pub weight_decay:  f32,
    pub seed:          u64,
    pub logging_steps: usize,
    pub pad_id:        u32,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            epochs:        3,
            batch_size:    16,
            lr:            2e-5,
            weight_decay:  0.01,
            seed:          42,
            logging_steps: 500,
            pad_id:        0,
        }
    }
}

/// Where the loop writes its side outputs. Both are optional so
/// tests can train without touching the filesystem.
#[derive(Default)]
pub struct TrainSinks<'a> {
    pub checkpoints: Option<&'a CheckpointManager>,
    pub metrics:     Option<&'a MetricsLogger>,
}

/// Loss and accuracy over an evaluation set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalOutcome {
    pub loss:     f64,
    pub accuracy: f64,
}

pub fn train_loop<B: AutodiffBackend>(
    mut model:   NewsClassifierModel<B>,
    max_seq_len: usize,
    train:       Vec<TokenizedRecord>,
    eval:        Vec<TokenizedRecord>,
    settings:    &TrainSettings,
    sinks:       TrainSinks<'_>,
    device:      &B::Device,
) -> Result<(NewsClassifierModel<B>, FitSummary)> {
    ensure!(!train.is_empty(), "training set is empty");
    ensure!(
        train.iter().chain(eval.iter()).all(|r| r.label.is_some()),
        "every training and evaluation record needs a label"
    );
    ensure!(settings.batch_size > 0, "batch size must be positive");

    B::seed(settings.seed);

    // ── AdamW optimiser ──────────────────────────────────────────────────────
    let optim_cfg = AdamWConfig::new()
        .with_weight_decay(settings.weight_decay)
        .with_epsilon(1e-8);
    let mut optim = optim_cfg.init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_batcher = ClassificationBatcher::<B>::new(device.clone(), max_seq_len, settings.pad_id);
    let train_dataset = TokenizedDataset::new(train);
    tracing::info!(
        "Training on {} records (longest {} tokens), batch size {}",
        train_dataset.record_count(),
        train_dataset.max_len(),
        settings.batch_size
    );
    let train_loader = DataLoaderBuilder::new(train_batcher)
        .batch_size(settings.batch_size)
        .shuffle(settings.seed)
        .num_workers(1)
        .build(train_dataset);

    let mut step             = 0usize;
    let mut window_loss_sum  = 0.0f64;
    let mut window_steps     = 0usize;
    let mut last_train_loss  = f64::NAN;
    let mut last_eval_loss   = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=settings.epochs {
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;

        for batch in train_loader.iter() {
            let Some(labels) = batch.labels else { continue };
            let (loss, _) = model.forward_classification(batch.input_ids, batch.attention_mask, labels);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            train_loss_sum  += loss_val;
            train_batches   += 1;
            window_loss_sum += loss_val;
            window_steps    += 1;
            step            += 1;

            // Backward pass + AdamW update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(settings.lr, model, grads);

            if settings.logging_steps > 0 && step % settings.logging_steps == 0 {
                let mean = window_loss_sum / window_steps as f64;
                tracing::debug!("step {} loss {:.4}", step, mean);
                if let Some(m) = sinks.metrics {
                    m.log_step(step, mean)?;
                }
                window_loss_sum = 0.0;
                window_steps    = 0;
            }
        }

        let avg_train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };
        last_train_loss = avg_train_loss;

        // ── Evaluation phase ──────────────────────────────────────────────────
        // model.valid() → model on the inner backend, dropout disabled
        let outcome = if eval.is_empty() {
            None
        } else {
            Some(evaluate(&model.valid(), &eval, max_seq_len, settings, device))
        };
        last_eval_loss = outcome.map(|o| o.loss);

        match outcome {
            Some(o) => println!(
                "Epoch {:>3}/{} | train_loss={:.4} | eval_loss={:.4} | eval_acc={:.1}%",
                epoch, settings.epochs, avg_train_loss, o.loss, o.accuracy * 100.0,
            ),
            None => println!(
                "Epoch {:>3}/{} | train_loss={:.4}",
                epoch, settings.epochs, avg_train_loss,
            ),
        }

        if let Some(m) = sinks.metrics {
            m.log(&EpochMetrics::new(
                epoch,
                avg_train_loss,
                outcome.map(|o| o.loss),
                outcome.map(|o| o.accuracy),
            ))?;
        }

        if let Some(ckpt) = sinks.checkpoints {
            ckpt.save_model(&model, epoch)?;
            tracing::info!("Checkpoint saved for epoch {}", epoch);
        }
    }

    tracing::info!("Training complete after {} steps", step);
    let summary = FitSummary {
        epochs:           settings.epochs,
        steps:            step,
        final_train_loss: last_train_loss,
        final_eval_loss:  last_eval_loss,
    };
    Ok((model, summary))
}

/// Mean loss and accuracy of `model` over labelled `records`, in order.
pub fn evaluate<B: Backend>(
    model:       &NewsClassifierModel<B>,
    records:     &[TokenizedRecord],
    max_seq_len: usize,
    settings:    &TrainSettings,
    device:      &B::Device,
) -> EvalOutcome {
    let batcher = ClassificationBatcher::<B>::new(device.clone(), max_seq_len, settings.pad_id);

    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut correct  = 0usize;
    let mut total    = 0usize;

    for chunk in records.chunks(settings.batch_size.max(1)) {
        let batch = batcher.batch(chunk.to_vec());
        let Some(labels) = batch.labels else { continue };

        let (loss, logits) = model.forward_classification(
            batch.input_ids,
            batch.attention_mask,
            labels.clone(),
        );
        loss_sum += loss.into_scalar().elem::<f64>();
        batches  += 1;

        // argmax(1) returns shape [batch, 1]; flatten to [batch]
        let predicted = logits.argmax(1).flatten::<1>(0, 1);
        total += labels.dims()[0];
        let hits: i64 = predicted.equal(labels).int().sum().into_scalar().elem::<i64>();
        correct += hits as usize;
    }

    EvalOutcome {
        loss:     if batches > 0 { loss_sum / batches as f64 } else { f64::NAN },
        accuracy: if total > 0 { correct as f64 / total as f64 } else { 0.0 },
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::NewsClassifierConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn rec(ids: &[u32], label: usize) -> TokenizedRecord {
        TokenizedRecord {
            input_ids:      ids.to_vec(),
            attention_mask: vec![1; ids.len()],
            label:          Some(label),
        }
    }

    fn toy_data() -> Vec<TokenizedRecord> {
        (0..12)
            .map(|i| if i % 2 == 0 { rec(&[1, 3, 4, 2], 0) } else { rec(&[1, 5, 6, 7, 2], 1) })
            .collect()
    }

    fn settings() -> TrainSettings {
        TrainSettings { epochs: 2, batch_size: 4, lr: 1e-3, logging_steps: 2, ..Default::default() }
    }

    #[test]
    fn test_train_loop_runs_and_writes_telemetry() {
        let device = Default::default();
        let model: NewsClassifierModel<TestBackend> =
            NewsClassifierConfig::new(16, 8, 8, 2, 1, 16, 2, 0.0).init(&device);

        let dir     = tempfile::tempdir().unwrap();
        let metrics = MetricsLogger::new(dir.path()).unwrap();
        let ckpt    = CheckpointManager::new(dir.path()).unwrap();
        let sinks   = TrainSinks { checkpoints: Some(&ckpt), metrics: Some(&metrics) };

        let (_, summary) =
            train_loop(model, 8, toy_data(), toy_data(), &settings(), sinks, &device).unwrap();

        assert_eq!(summary.epochs, 2);
        assert_eq!(summary.steps, 6);
        assert!(summary.final_train_loss.is_finite());
        assert!(summary.final_eval_loss.is_some());

        assert!(dir.path().join("latest_epoch.json").exists());
        let loss_csv = std::fs::read_to_string(dir.path().join("loss.csv")).unwrap();
        // header + one row every 2 of the 6 steps
        assert_eq!(loss_csv.lines().count(), 4);
    }

    #[test]
    fn test_unlabelled_training_data_is_rejected() {
        let device = Default::default();
        let model: NewsClassifierModel<TestBackend> =
            NewsClassifierConfig::new(16, 8, 8, 2, 1, 16, 2, 0.0).init(&device);
        let mut data = toy_data();
        data[0].label = None;

        let result = train_loop(model, 8, data, Vec::new(), &settings(), TrainSinks::default(), &device);
        assert!(result.is_err());
    }
}
