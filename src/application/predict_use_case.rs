// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a saved model and classifies free text, cleaning it
// exactly as the training data was cleaned.

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use std::path::Path;

use crate::application::pipeline::predict_texts;
use crate::application::train_use_case::TrainConfig;
use crate::domain::traits::{Persistable, SequenceClassifier};
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::HfTokenizer};
use crate::ml::classifier::{BurnClassifier, TrainBackend};

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub text:       String,
    pub class_name: String,
    pub confidence: f32,
    pub scores:     Vec<f32>,
}

pub struct PredictUseCase<B: AutodiffBackend = TrainBackend> {
    config:     TrainConfig,
    tokenizer:  HfTokenizer,
    classifier: BurnClassifier<B>,
}

impl PredictUseCase<TrainBackend> {
    pub fn new(model_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_on(model_dir, Default::default())
    }
}

impl<B: AutodiffBackend> PredictUseCase<B> {
    pub fn load_on(model_dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let dir        = model_dir.as_ref();
        let config     = CheckpointManager::open(dir).load_config()?;
        let tokenizer  = HfTokenizer::load(dir)?;
        let classifier = BurnClassifier::<B>::load_on(dir, device)?;
        ensure!(
            classifier.num_classes() == config.num_classes(),
            "model has {} classes but train_config.json names {}",
            classifier.num_classes(),
            config.num_classes()
        );
        Ok(Self { config, tokenizer, classifier })
    }

    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Prediction>> {
        let results = predict_texts(
            texts,
            &self.config.text_normalizer(),
            &self.tokenizer,
            &self.classifier,
            Some(self.classifier.config().max_seq_len),
        )?;

        Ok(texts
            .iter()
            .zip(results)
            .map(|(text, r)| {
                Prediction {
                    text:       text.as_ref().to_string(),
                    class_name: self.config.class_name(r.predicted_label()),
                    confidence: r.confidence(),
                    scores:     r.scores,
                }
            })
            .collect())
    }
}
