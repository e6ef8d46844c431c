use burn::data::dataset::Dataset;

use crate::domain::record::TokenizedRecord;

/// Tokenized records behind Burn's `Dataset` trait so the DataLoader
/// can index into them.
pub struct TokenizedDataset {
    records: Vec<TokenizedRecord>,
}

impl TokenizedDataset {
    pub fn new(records: Vec<TokenizedRecord>) -> Self { Self { records } }

    pub fn record_count(&self) -> usize { self.records.len() }

    /// Length of the longest sequence, for logging.
    pub fn max_len(&self) -> usize {
        self.records.iter().map(TokenizedRecord::len).max().unwrap_or(0)
    }
}

impl Dataset<TokenizedRecord> for TokenizedDataset {
    fn get(&self, index: usize) -> Option<TokenizedRecord> {
        self.records.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}
