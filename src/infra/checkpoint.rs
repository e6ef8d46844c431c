// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights using Burn's CompactRecorder,
// plus the small JSON files that describe them.
//
// Two kinds of weight files share one directory layout:
//   - per-epoch checkpoints written by the trainer
//   - the final export written by BurnClassifier::save
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     model_epoch_2.mpk.gz   ← weights after epoch 2
//     latest_epoch.json      ← number of the latest epoch
//     classifier.json        ← architecture, for resuming
//     tokenizer.json
//
//   output/
//     model.mpk.gz           ← final weights
//     classifier.json        ← architecture + optimisation settings
//     train_config.json      ← pipeline configuration (TrainConfig)
//
// CompactRecorder serialises to MessagePack, gzips, and stores
// floats at half precision. Loading fails if the architecture
// doesn't match the record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::NewsClassifierModel;

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const TRAIN_CONFIG_FILE: &str = "train_config.json";
const FINAL_MODEL_FILE:  &str = "model";

/// Reads and writes weights and JSON side files in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Manager for writing. Creates the directory (and parents).
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    /// Manager for reading an existing directory. Touches nothing on disk.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `model_epoch_{epoch}` and point `latest_epoch.json` at it.
    pub fn save_model<B: Backend>(&self, model: &NewsClassifierModel<B>, epoch: usize) -> Result<()> {
        // Recorder appends the extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));
        self.record(model, path)?;

        let latest_path = self.dir.join(LATEST_EPOCH_FILE);
        fs::write(&latest_path, serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write '{}'", latest_path.display()))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restore weights from the most recent epoch checkpoint into `model`,
    /// which must have the saved architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  NewsClassifierModel<B>,
        device: &B::Device,
    ) -> Result<NewsClassifierModel<B>> {
        let epoch = self.latest_epoch()?;
        tracing::info!("Loading checkpoint from epoch {}", epoch);
        self.restore(model, self.dir.join(format!("model_epoch_{epoch}")), device)
    }

    /// Whether an epoch checkpoint has been written to this directory.
    pub fn has_epochs(&self) -> bool {
        self.dir.join(LATEST_EPOCH_FILE).is_file()
    }

    /// Number of the last epoch checkpoint written to this directory.
    pub fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_EPOCH_FILE);
        let s = fs::read_to_string(&path).with_context(|| {
            format!("Cannot find '{}'. Has training written a checkpoint yet?", path.display())
        })?;
        Ok(serde_json::from_str::<usize>(s.trim())?)
    }

    pub fn save_final<B: Backend>(&self, model: &NewsClassifierModel<B>) -> Result<()> {
        self.record(model, self.dir.join(FINAL_MODEL_FILE))
    }

    pub fn load_final<B: Backend>(
        &self,
        model:  NewsClassifierModel<B>,
        device: &B::Device,
    ) -> Result<NewsClassifierModel<B>> {
        self.restore(model, self.dir.join(FINAL_MODEL_FILE), device)
    }

    /// Pretty-printed JSON side file.
    pub fn save_json<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Saved '{}'", path.display());
        Ok(())
    }

    pub fn load_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }

    /// Save the pipeline configuration so `evaluate` / `predict` can
    /// rebuild the normalizer, remapper and class names.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.save_json(TRAIN_CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.load_json(TRAIN_CONFIG_FILE).with_context(|| {
            format!(
                "No training configuration in '{}'. Run 'train' with this output directory first.",
                self.dir.display()
            )
        })
    }

    fn record<B: Backend>(&self, model: &NewsClassifierModel<B>, path: PathBuf) -> Result<()> {
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save weights to '{}'", path.display()))
    }

    fn restore<B: Backend>(
        &self,
        model:  NewsClassifierModel<B>,
        path:   PathBuf,
        device: &B::Device,
    ) -> Result<NewsClassifierModel<B>> {
        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load weights '{}'", path.display()))?;
        Ok(model.load_record(record))
    }
}
