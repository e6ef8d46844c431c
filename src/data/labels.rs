// ============================================================
// Layer 4 — Label Remapper
// ============================================================
// Shifts dataset labels into the zero-based range the model's
// classification head expects.
//
// AG News labels classes 1..=4; the classifier predicts 0..=3,
// so the default offset is 1.
//
//   remap(label)        = label - offset, checked against [0, K-1]
//   remap_record(raw)   = consumes a RawRecord, returns a Record
//
// remap() on a bare integer is NOT idempotent: feeding its own
// output back in shifts the label a second time. remap_record()
// takes the RawRecord by value and returns a different type, so
// a record cannot be remapped twice.

use serde::{Deserialize, Serialize};

use crate::domain::error::{PipelineError, PipelineResult};
use crate::domain::record::{RawRecord, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRemapper {
    offset:      i64,
    num_classes: usize,
}

impl LabelRemapper {
    pub fn new(offset: i64, num_classes: usize) -> Self {
        Self { offset, num_classes }
    }

    /// `label - offset`, failing with `OutOfRange` outside `[0, K-1]`.
    pub fn remap(&self, label: i64) -> PipelineResult<usize> {
        let max      = self.num_classes as i64 - 1;
        let remapped = label.checked_sub(self.offset).unwrap_or(i64::MIN);
        if remapped < 0 || remapped > max {
            return Err(PipelineError::OutOfRange {
                label,
                offset: self.offset,
                remapped,
                max,
            });
        }
        Ok(remapped as usize)
    }

    pub fn remap_record(&self, raw: RawRecord) -> PipelineResult<Record> {
        let label = self.remap(raw.label)?;
        Ok(Record::new(raw.text, label))
    }

    /// Remap every record, stopping at the first failure.
    pub fn remap_all(&self, raw: Vec<RawRecord>) -> PipelineResult<Vec<Record>> {
        raw.into_iter()
            .enumerate()
            .map(|(i, r)| {
                self.remap_record(r).inspect_err(|e| {
                    tracing::warn!("Record {} has an unusable label: {}", i, e);
                })
            })
            .collect()
    }
}
