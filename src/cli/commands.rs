// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate`, `predict`
// and all their configurable flags.
//
// clap's derive macros generate --help text, error messages for
// missing args, and string → number conversion.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::evaluate_use_case::EvaluateConfig;
use crate::application::train_use_case::TrainConfig;
use crate::data::normalizer::NormalizerConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fine-tune the classifier on a labelled CSV
    Train(TrainArgs),

    /// Score a saved model on a labelled CSV
    Evaluate(EvaluateArgs),

    /// Classify free text with a saved model
    Predict(PredictArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// CSV with [Class Index, Title, Description] or [text, label] columns
    #[arg(long, default_value = "data/train.csv")]
    pub data: String,

    /// Where the final model, tokenizer, config and loss CSVs go
    #[arg(long, default_value = "model_output")]
    pub output_dir: String,

    /// Where per-epoch checkpoints go
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Pretrained tokenizer.json (otherwise one is built from the training split)
    #[arg(long)]
    pub tokenizer: Option<String>,

    /// Saved model directory to continue fine-tuning from
    #[arg(long)]
    pub init_from: Option<String>,

    /// One stopword per line; replaces the built-in English list
    #[arg(long)]
    pub stopwords: Option<String>,

    /// Placed between Title and Description
    #[arg(long, default_value = "")]
    pub title_separator: String,

    /// Class names in label order
    #[arg(long, value_delimiter = ',', default_values = ["World", "Sports", "Business", "Sci/Tech"])]
    pub class_names: Vec<String>,

    /// Subtracted from source labels (AG News labels start at 1)
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub label_offset: i64,

    /// Share of records used for training; the rest is the test set
    #[arg(long, default_value_t = 0.3)]
    pub train_fraction: f64,

    /// Keep at most this many test records (0 = no cap)
    #[arg(long, default_value_t = 10_000)]
    pub test_cap: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Longest token sequence fed to the model
    #[arg(long, default_value_t = 128)]
    pub max_seq_len: usize,

    /// Word-level vocabulary size when building a tokenizer
    #[arg(long, default_value_t = 30522)]
    pub vocab_size: usize,

    /// Hidden dimension of the transformer
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 6)]
    pub num_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    #[arg(long, default_value_t = 2e-5)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f32,

    /// Write the running training loss every N optimizer steps
    #[arg(long, default_value_t = 500)]
    pub logging_steps: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:       a.data,
            output_dir:      a.output_dir,
            checkpoint_dir:  a.checkpoint_dir,
            tokenizer_path:  a.tokenizer,
            init_from:       a.init_from,
            stopwords_file:  a.stopwords,
            normalizer:      NormalizerConfig::default(),
            title_separator: a.title_separator,
            class_names:     a.class_names,
            label_offset:    a.label_offset,
            train_fraction:  a.train_fraction,
            test_cap:        (a.test_cap > 0).then_some(a.test_cap),
            seed:            a.seed,
            max_seq_len:     a.max_seq_len,
            vocab_size:      a.vocab_size,
            d_model:         a.d_model,
            num_heads:       a.num_heads,
            num_layers:      a.num_layers,
            d_ff:            a.d_ff,
            dropout:         a.dropout,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            lr:              a.lr,
            weight_decay:    a.weight_decay,
            logging_steps:   a.logging_steps,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled CSV to score
    #[arg(long)]
    pub data: String,

    /// Directory written by `train`
    #[arg(long, default_value = "model_output")]
    pub model_dir: String,

    /// Evaluate a random contiguous window of N records
    #[arg(long)]
    pub sample: Option<usize>,

    /// Print N prediction-vs-actual rows
    #[arg(long, default_value_t = 10)]
    pub show: usize,

    /// Seed for --sample
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            model_dir: a.model_dir,
            data_path: a.data,
            sample:    a.sample,
            show:      a.show,
            seed:      a.seed,
        }
    }
}

/// All arguments for the `predict` command
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to classify; repeat for several
    #[arg(required = true)]
    pub texts: Vec<String>,

    /// Directory written by `train`
    #[arg(long, default_value = "model_output")]
    pub model_dir: String,
}
