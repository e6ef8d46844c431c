// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training telemetry to two CSV files:
//
//   loss.csv     — running mean training loss every
//                  `logging_steps` optimizer steps
//   metrics.csv  — one row per epoch
//
// Example output:
//   step,training_loss
//   500,1.204311
//   1000,0.612840
//
//   epoch,train_loss,eval_loss,eval_accuracy
//   1,0.531200,0.402100,0.871000
//   2,0.310900,0.388700,0.880500
//
// Evaluation columns are left empty when no evaluation set was
// given. Both files are recreated when the logger is opened, so
// each training run starts from a header and step 1 with no rows
// left over from an earlier run in the same directory.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const LOSS_HEADER:    &str = "step,training_loss";
const METRICS_HEADER: &str = "epoch,train_loss,eval_loss,eval_accuracy";

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Epoch number, starting at 1
    pub epoch: usize,

    /// Mean cross-entropy over all training batches of the epoch
    pub train_loss: f64,

    /// Mean cross-entropy on the evaluation set
    pub eval_loss: Option<f64>,

    /// Fraction of evaluation records predicted correctly, in [0, 1]
    pub eval_accuracy: Option<f64>,
}

impl EpochMetrics {
    pub fn new(
        epoch:         usize,
        train_loss:    f64,
        eval_loss:     Option<f64>,
        eval_accuracy: Option<f64>,
    ) -> Self {
        Self { epoch, train_loss, eval_loss, eval_accuracy }
    }

    fn csv_row(&self) -> String {
        let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
        format!(
            "{},{:.6},{},{}",
            self.epoch,
            self.train_loss,
            opt(self.eval_loss),
            opt(self.eval_accuracy),
        )
    }
}

/// Appends training telemetry to CSV files in one directory.
#[derive(Debug)]
pub struct MetricsLogger {
    loss_path:    PathBuf,
    metrics_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;

        let loss_path    = dir.join("loss.csv");
        let metrics_path = dir.join("metrics.csv");
        write_header(&loss_path, LOSS_HEADER)?;
        write_header(&metrics_path, METRICS_HEADER)?;

        Ok(Self { loss_path, metrics_path })
    }

    /// Append the running training loss at an optimizer step.
    pub fn log_step(&self, step: usize, training_loss: f64) -> Result<()> {
        append_line(&self.loss_path, &format!("{step},{training_loss:.6}"))
    }

    /// Append one epoch's metrics.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        append_line(&self.metrics_path, &m.csv_row())?;
        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, eval_loss={:?}",
            m.epoch,
            m.train_loss,
            m.eval_loss,
        );
        Ok(())
    }

    #[cfg(test)]
    pub fn loss_path(&self) -> &Path {
        &self.loss_path
    }

    #[cfg(test)]
    pub fn metrics_path(&self) -> &Path {
        &self.metrics_path
    }
}

/// Create or truncate `path`, leaving only the header line.
fn write_header(path: &Path, header: &str) -> Result<()> {
    if path.exists() {
        tracing::debug!("Replacing '{}' from an earlier run", path.display());
    }
    let mut f = fs::File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    writeln!(f, "{header}")?;
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot append to '{}'", path.display()))?;
    writeln!(f, "{line}")?;
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let log = MetricsLogger::new(dir.path()).unwrap();

        log.log_step(500, 1.25).unwrap();
        log.log(&EpochMetrics::new(1, 0.5, Some(0.4), Some(0.875))).unwrap();

        let loss = fs::read_to_string(log.loss_path()).unwrap();
        assert_eq!(loss, "step,training_loss\n500,1.250000\n");

        let metrics = fs::read_to_string(log.metrics_path()).unwrap();
        assert_eq!(
            metrics,
            "epoch,train_loss,eval_loss,eval_accuracy\n1,0.500000,0.400000,0.875000\n"
        );
    }

    #[test]
    fn test_missing_eval_columns_are_empty() {
        let row = EpochMetrics::new(3, 0.25, None, None).csv_row();
        assert_eq!(row, "3,0.250000,,");
    }

    #[test]
    fn test_new_run_replaces_previous_rows() {
        let dir = tempfile::tempdir().unwrap();
        let first = MetricsLogger::new(dir.path()).unwrap();
        first.log_step(1, 2.0).unwrap();
        first.log_step(2, 1.5).unwrap();
        first.log(&EpochMetrics::new(1, 1.75, None, None)).unwrap();

        let second = MetricsLogger::new(dir.path()).unwrap();
        second.log_step(1, 0.9).unwrap();

        let loss = fs::read_to_string(dir.path().join("loss.csv")).unwrap();
        assert_eq!(loss, "step,training_loss\n1,0.900000\n");
        let metrics = fs::read_to_string(dir.path().join("metrics.csv")).unwrap();
        assert_eq!(metrics, "epoch,train_loss,eval_loss,eval_accuracy\n");
    }
}
