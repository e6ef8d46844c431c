// ============================================================
// Layer 3 — Pipeline Errors
// ============================================================
// Typed failures raised by the data pipeline and the evaluation
// reporter. Each one is a misconfiguration or a caller bug, never
// a transient condition; nothing retries on them.
//
// Reference: Rust Book §9 (Error Handling)

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// A label fell outside `[0, num_classes - 1]` after remapping.
    #[error("label {label} maps to {remapped}, outside [0, {max}] (offset {offset})")]
    OutOfRange {
        label:    i64,
        offset:   i64,
        remapped: i64,
        max:      i64,
    },

    /// The train fraction must lie strictly between 0 and 1.
    #[error("train fraction must be strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),

    /// Splitting was requested on a dataset with no records.
    #[error("cannot split an empty dataset")]
    EmptyDataset,

    /// Predicted and actual label sequences differ in length.
    #[error("predicted has {predicted} labels but actual has {actual}")]
    LengthMismatch { predicted: usize, actual: usize },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
