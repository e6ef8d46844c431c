// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the CSV                   (Layer 4 - data)
//   Step 2: Normalize text, remap labels   (Layer 4 - data)
//   Step 3: Split train / test             (Layer 4 - data)
//   Step 4: Load or build tokenizer        (Layer 6 - infra)
//   Step 5: Build or load the classifier   (Layer 5 - ml)
//           `init_from` takes either a final export or a
//           checkpoint directory, resumed from its latest epoch
//   Step 6: Save config                    (Layer 6 - infra)
//   Step 7: Fit, then score the test set   (Layer 2 - pipeline)
//   Step 8: Export model + tokenizer       (Layer 6 - infra)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::pipeline::{fit_and_evaluate, log_class_balance, prepare_records, PipelineOutcome};
use crate::data::{
    labels::LabelRemapper,
    loader::CsvLoader,
    normalizer::{NormalizerConfig, TextNormalizer},
    splitter::{train_test_split, SplitConfig},
};
use crate::domain::traits::{BatchTokenizer, Persistable, RecordSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::{HfTokenizer, TokenizerStore},
};
use crate::ml::classifier::{BurnClassifier, TrainBackend};
use crate::ml::model::NewsClassifierConfig;
use crate::ml::trainer::TrainSettings;

// ─── Training Configuration ──────────────────────────────────────────────────
// Everything needed to reproduce a run. Saved as train_config.json
// in the output directory so `evaluate` and `predict` rebuild the
// same normalizer, label mapping and class names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_path:       String,
    pub output_dir:      String,
    pub checkpoint_dir:  String,
    /// Pretrained tokenizer.json; built from the training split when absent
    pub tokenizer_path:  Option<String>,
    /// Saved model directory to continue fine-tuning from
    pub init_from:       Option<String>,
    /// Replaces the built-in stopword list
    pub stopwords_file:  Option<String>,
    pub normalizer:      NormalizerConfig,
    pub title_separator: String,
    pub class_names:     Vec<String>,
    pub label_offset:    i64,
    pub train_fraction:  f64,
    pub test_cap:        Option<usize>,
    pub seed:            u64,
    pub max_seq_len:     usize,
    pub vocab_size:      usize,
    pub d_model:         usize,
    pub num_heads:       usize,
    pub num_layers:      usize,
    pub d_ff:            usize,
    pub dropout:         f64,
    pub batch_size:      usize,
    pub epochs:          usize,
    pub lr:              f64,
    pub weight_decay:    f32,
    pub logging_steps:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_path:       "data/train.csv".to_string(),
            output_dir:      "model_output".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            tokenizer_path:  None,
            init_from:       None,
            stopwords_file:  None,
            normalizer:      NormalizerConfig::default(),
            title_separator: String::new(),
            class_names:     ["World", "Sports", "Business", "Sci/Tech"].map(String::from).to_vec(),
            label_offset:    1,
            train_fraction:  0.3,
            test_cap:        Some(10_000),
            seed:            42,
            max_seq_len:     128,
            vocab_size:      30522,
            d_model:         256,
            num_heads:       8,
            num_layers:      6,
            d_ff:            1024,
            dropout:         0.1,
            batch_size:      16,
            epochs:          3,
            lr:              2e-5,
            weight_decay:    0.01,
            logging_steps:   500,
        }
    }
}

impl TrainConfig {
    pub fn num_classes(&self) -> usize {
        self.class_names.len()
    }

    pub fn text_normalizer(&self) -> TextNormalizer {
        TextNormalizer::new(&self.normalizer)
    }

    pub fn label_remapper(&self) -> LabelRemapper {
        LabelRemapper::new(self.label_offset, self.num_classes())
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            train_fraction: self.train_fraction,
            shuffle:        true,
            seed:           self.seed,
            test_cap:       self.test_cap,
        }
    }

    pub fn train_settings(&self, pad_id: u32) -> TrainSettings {
        TrainSettings {
            epochs:        self.epochs,
            batch_size:    self.batch_size,
            lr:            self.lr,
            weight_decay:  self.weight_decay,
            seed:          self.seed,
            logging_steps: self.logging_steps,
            pad_id,
        }
    }

    pub fn model_config(&self, vocab_size: usize) -> NewsClassifierConfig {
        NewsClassifierConfig::new(
            vocab_size,
            self.max_seq_len,
            self.d_model,
            self.num_heads,
            self.num_layers,
            self.d_ff,
            self.num_classes(),
            self.dropout,
        )
    }

    /// Display name of a zero-based label.
    pub fn class_name(&self, label: usize) -> String {
        self.class_names
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    /// Copy with the stopword file (if any) read into `normalizer`,
    /// so the saved config is self-contained.
    fn resolved(&self) -> Result<Self> {
        let mut cfg = self.clone();
        if let Some(path) = cfg.stopwords_file.take() {
            let from_file = NormalizerConfig::from_stopwords_file(&path)?;
            cfg.normalizer.stopwords = from_file.stopwords;
        }
        Ok(cfg)
    }
}

/// What a training run produced.
#[derive(Debug)]
pub struct TrainReport {
    pub config:  TrainConfig,
    pub outcome: PipelineOutcome,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run on the default GPU backend.
    pub fn execute(&self) -> Result<TrainReport> {
        self.execute_on::<TrainBackend>(Default::default())
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: B::Device) -> Result<TrainReport> {
        let cfg = self.config.resolved()?;
        ensure!(cfg.num_classes() > 0, "at least one class name is required");
        ensure!(
            cfg.init_from.is_none() || cfg.tokenizer_path.is_none(),
            "--tokenizer cannot be combined with --init-from; the saved model's tokenizer is used"
        );

        // ── Step 1: Load the CSV ──────────────────────────────────────────────
        tracing::info!("Loading records from '{}'", cfg.data_path);
        let raw = CsvLoader::new(&cfg.data_path)
            .with_separator(cfg.title_separator.clone())
            .load_all()?;
        tracing::info!("Loaded {} records", raw.len());

        // ── Step 2: Normalize text, remap labels ─────────────────────────────
        let records = prepare_records(raw, &cfg.text_normalizer(), &cfg.label_remapper())
            .context("Cannot prepare records")?;
        log_class_balance(&records, &cfg.class_names);

        // ── Step 3: Split train / test ───────────────────────────────────────
        let split = train_test_split(&records, &cfg.split_config())?;
        tracing::info!("Split: {} train, {} test", split.train.len(), split.test.len());

        // ── Step 4: Tokenizer ────────────────────────────────────────────────
        let tokenizer = match (&cfg.init_from, &cfg.tokenizer_path) {
            (Some(dir), _)     => HfTokenizer::load(Path::new(dir))?,
            (None, Some(path)) => HfTokenizer::from_file(path)?,
            (None, None) => {
                let texts: Vec<&str> = split.train.iter().map(|r| r.text.as_str()).collect();
                TokenizerStore::new(&cfg.output_dir).load_or_build(&texts, cfg.vocab_size)?
            }
        };

        // ── Step 5: Classifier ───────────────────────────────────────────────
        let settings   = cfg.train_settings(tokenizer.pad_id());
        let classifier = match &cfg.init_from {
            Some(dir) => {
                let clf = if CheckpointManager::open(dir).has_epochs() {
                    tracing::info!("Resuming from the latest checkpoint in '{}'", dir);
                    BurnClassifier::<B>::resume_on(Path::new(dir), device)?
                } else {
                    BurnClassifier::<B>::load_on(Path::new(dir), device)?
                };
                ensure!(
                    clf.config().num_classes == cfg.num_classes(),
                    "model in '{}' has {} classes but {} class names were given",
                    dir,
                    clf.config().num_classes,
                    cfg.num_classes()
                );
                tracing::info!("Continuing training from '{}'", dir);
                clf.with_training(settings)
            }
            None => BurnClassifier::<B>::new(cfg.model_config(tokenizer.vocab_size()), settings, device),
        };
        ensure!(
            tokenizer.vocab_size() <= classifier.config().vocab_size,
            "tokenizer emits ids up to {} but the model embeds only {}",
            tokenizer.vocab_size(),
            classifier.config().vocab_size
        );
        let max_length = classifier.config().max_seq_len;

        // Checkpoint dirs also carry tokenizer.json for `init_from`
        let checkpoints = CheckpointManager::new(&cfg.checkpoint_dir)?;
        tokenizer.save(checkpoints.dir())?;
        let mut classifier = classifier
            .with_checkpoints(checkpoints)
            .with_metrics(MetricsLogger::new(&cfg.output_dir)?);

        // ── Step 6: Save config before training ──────────────────────────────
        let output = CheckpointManager::new(&cfg.output_dir)?;
        output.save_config(&cfg)?;

        // ── Step 7: Fit and evaluate ─────────────────────────────────────────
        let outcome = fit_and_evaluate(&split, &tokenizer, &mut classifier, Some(max_length))?;

        // ── Step 8: Export ───────────────────────────────────────────────────
        classifier.save(output.dir())?;
        tokenizer.save(output.dir())?;
        tracing::info!("Model exported to '{}'", cfg.output_dir);

        Ok(TrainReport { config: cfg, outcome })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    pub(crate) type TestBackend = Autodiff<NdArray>;

    /// 16 short AG-News-style rows, four per class.
    pub(crate) fn write_csv(dir: &Path) -> String {
        let rows = [
            ("Peace talks resume", "Leaders meet in Geneva", 1),
            ("Election results", "Parliament vote counted", 1),
            ("Embassy reopens", "Diplomats return abroad", 1),
            ("Border dispute", "Troops withdraw from region", 1),
            ("Team wins cup", "Striker scores twice", 2),
            ("Coach resigns", "Season ends early", 2),
            ("Olympic record", "Sprinter breaks time", 2),
            ("Tennis final", "Champion defends title", 2),
            ("Stocks rally", "Markets close higher", 3),
            ("Oil prices fall", "Crude supply rises", 3),
            ("Merger announced", "Shares jump on deal", 3),
            ("Profit warning", "Retailer cuts outlook", 3),
            ("Rocket launch", "Satellite reaches orbit", 4),
            ("New chip unveiled", "Processor doubles speed", 4),
            ("Software update", "Browser patches flaw", 4),
            ("Genome study", "Scientists map gene", 4),
        ];
        let mut csv = String::from("Class Index,Title,Description\n");
        for (title, desc, label) in rows {
            csv.push_str(&format!("{label},{title},{desc}\n"));
        }
        let path = dir.join("train.csv");
        fs::write(&path, csv).unwrap();
        path.to_string_lossy().into_owned()
    }

    pub(crate) fn tiny_config(dir: &Path) -> TrainConfig {
        TrainConfig {
            data_path:      write_csv(dir),
            output_dir:     dir.join("out").to_string_lossy().into_owned(),
            checkpoint_dir: dir.join("ckpt").to_string_lossy().into_owned(),
            train_fraction: 0.5,
            test_cap:       None,
            max_seq_len:    16,
            vocab_size:     200,
            d_model:        8,
            num_heads:      2,
            num_layers:     1,
            d_ff:           16,
            dropout:        0.0,
            batch_size:     4,
            epochs:         1,
            lr:             1e-3,
            logging_steps:  1,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_reference_run() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.num_classes(), 4);
        assert_eq!(cfg.class_name(3), "Sci/Tech");
        assert_eq!(cfg.class_name(9), "9");
        assert_eq!(cfg.split_config(), SplitConfig::default());
        assert_eq!(cfg.train_settings(0), TrainSettings::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: TrainConfig = serde_json::from_str(r#"{ "epochs": 9 }"#).unwrap();
        assert_eq!(cfg.epochs, 9);
        assert_eq!(cfg.label_offset, 1);
    }

    #[test]
    fn test_stopwords_file_is_folded_into_config() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("stop.txt");
        fs::write(&path, "# custom\nfoo\nbar\n").unwrap();

        let cfg = TrainConfig {
            stopwords_file: Some(path.to_string_lossy().into_owned()),
            ..TrainConfig::default()
        };
        let resolved = cfg.resolved().unwrap();
        assert_eq!(resolved.stopwords_file, None);
        assert_eq!(resolved.normalizer.stopwords, vec!["foo", "bar"]);
    }

    #[test]
    fn test_train_end_to_end_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());

        let report = TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        assert_eq!(report.outcome.train_size, 8);
        assert_eq!(report.outcome.test_size, 8);
        assert_eq!(report.outcome.evaluation.metrics.num_classes(), 4);
        assert_eq!(report.outcome.fit.steps, 2);

        let out = dir.path().join("out");
        for file in ["classifier.json", "tokenizer.json", "train_config.json", "loss.csv", "metrics.csv"] {
            assert!(out.join(file).exists(), "missing {file}");
        }
        let ckpt = dir.path().join("ckpt");
        for file in ["latest_epoch.json", "classifier.json", "tokenizer.json"] {
            assert!(ckpt.join(file).exists(), "missing checkpoint {file}");
        }
    }

    #[test]
    fn test_continue_training_from_checkpoint_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        let resumed = TrainConfig {
            init_from:      Some(cfg.checkpoint_dir.clone()),
            output_dir:     dir.path().join("out2").to_string_lossy().into_owned(),
            checkpoint_dir: dir.path().join("ckpt2").to_string_lossy().into_owned(),
            ..cfg
        };
        let report = TrainUseCase::new(resumed).execute_on::<TestBackend>(Default::default()).unwrap();
        assert_eq!(report.outcome.fit.epochs, 1);
        assert!(dir.path().join("out2").join("classifier.json").exists());
    }

    #[test]
    fn test_init_from_rejects_separate_tokenizer() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            init_from:      Some("prev".into()),
            tokenizer_path: Some("tokenizer.json".into()),
            ..tiny_config(dir.path())
        };
        let err = TrainUseCase::new(cfg).execute_on::<TestBackend>(Default::default()).unwrap_err();
        assert!(err.to_string().contains("--init-from"));
    }

    #[test]
    fn test_metrics_files_restart_each_run() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        // 8 train records, batch 4, logging every step: two rows per run
        let loss = fs::read_to_string(Path::new(&cfg.output_dir).join("loss.csv")).unwrap();
        assert_eq!(loss.lines().count(), 3);
        let metrics = fs::read_to_string(Path::new(&cfg.output_dir).join("metrics.csv")).unwrap();
        assert_eq!(metrics.lines().count(), 2);
    }

    #[test]
    fn test_continue_training_from_saved_model() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        let resumed = TrainConfig {
            init_from:  Some(cfg.output_dir.clone()),
            output_dir: dir.path().join("out2").to_string_lossy().into_owned(),
            ..cfg
        };
        let report = TrainUseCase::new(resumed).execute_on::<TestBackend>(Default::default()).unwrap();
        assert_eq!(report.outcome.fit.epochs, 1);
        assert!(dir.path().join("out2").join("classifier.json").exists());
    }

    #[test]
    fn test_continue_training_rejects_class_count_change() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = tiny_config(dir.path());
        TrainUseCase::new(cfg.clone()).execute_on::<TestBackend>(Default::default()).unwrap();

        let resumed = TrainConfig {
            init_from:   Some(cfg.output_dir.clone()),
            class_names: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            ..cfg
        };
        assert!(TrainUseCase::new(resumed).execute_on::<TestBackend>(Default::default()).is_err());
    }
}
