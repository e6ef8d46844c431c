// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Three commands are supported:
//   1. `train`    — fine-tunes the classifier on a labelled CSV
//   2. `evaluate` — scores a saved model on a labelled CSV
//   3. `predict`  — classifies free text with a saved model
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;
pub mod render;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "news-topic-classifier",
    version,
    about = "Fine-tune a transformer news-topic classifier on CSV data, then evaluate and predict."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the use case; nothing is computed here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Predict(args)  => run_predict(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on: {}", args.data);
    let report = TrainUseCase::new(args.into()).execute()?;
    let eval   = &report.outcome.evaluation;
    let fit    = &report.outcome.fit;

    println!(
        "\nTrained on {} records for {} epochs ({} steps, final loss {:.4}), evaluated on {}.\n",
        report.outcome.train_size, fit.epochs, fit.steps, fit.final_train_loss, report.outcome.test_size
    );
    println!("{}", render::classification_report(&eval.metrics, &report.config.class_names));
    println!("{}", render::confusion_matrix(&eval.metrics, &report.config.class_names));
    println!("Model saved to '{}'.", report.config.output_dir);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let report = EvaluateUseCase::new(args.into()).execute()?;
    let m      = &report.evaluation.metrics;

    println!("{}", render::classification_report(m, &report.class_names));
    println!("{}", render::confusion_matrix(m, &report.class_names));
    if !report.rows.is_empty() {
        println!("{}", render::comparison_table(&report.rows));
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let use_case = PredictUseCase::new(&args.model_dir)?;
    let preds    = use_case.predict(&args.texts)?;
    print!("{}", render::predictions(&preds));
    Ok(())
}
