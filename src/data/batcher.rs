// ============================================================
// Layer 4 — Classification Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<TokenizedRecord>
// into tensors, padding dynamically:
//
//   Input:  N records with lengths l1, l2, ..., lN
//   Output: ClassificationBatch with input_ids / attention_mask
//           of shape [N, L], L = min(max(li), max_seq_len)
//
// Sequences shorter than L are padded with `pad_id` and mask 0.
// Sequences longer than max_seq_len are cut, so the position
// embedding table is never indexed past its end.
//
// A record with no tokens at all still gets one visible pad
// token (mask 1), otherwise every attention key in that row
// would be masked out.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::record::TokenizedRecord;

/// A padded batch ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ClassificationBatch<B: Backend> {
    /// Token ids, shape: [batch_size, seq_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// 1 = real token, 0 = padding, shape: [batch_size, seq_len]
    pub attention_mask: Tensor<B, 2, Int>,

    /// Class targets, shape: [batch_size]; None for inference batches
    pub labels: Option<Tensor<B, 1, Int>>,
}

#[derive(Clone, Debug)]
pub struct ClassificationBatcher<B: Backend> {
    pub device:      B::Device,
    pub max_seq_len: usize,
    pub pad_id:      u32,
}

impl<B: Backend> ClassificationBatcher<B> {
    pub fn new(device: B::Device, max_seq_len: usize, pad_id: u32) -> Self {
        Self { device, max_seq_len, pad_id }
    }

    /// Padded id and mask rows, flattened row-major, plus the common length.
    fn pad(&self, items: &[TokenizedRecord]) -> (Vec<i32>, Vec<i32>, usize) {
        let longest = items.iter().map(TokenizedRecord::len).max().unwrap_or(0);
        let seq_len = longest.min(self.max_seq_len).max(1);

        let mut ids  = Vec::with_capacity(items.len() * seq_len);
        let mut mask = Vec::with_capacity(items.len() * seq_len);

        for item in items {
            let n = item.input_ids.len().min(seq_len);
            ids.extend(item.input_ids[..n].iter().map(|&x| x as i32));
            mask.extend(item.attention_mask.iter().take(n).map(|&x| x as i32));
            // attention_mask shorter than input_ids is treated as all-visible
            mask.extend(std::iter::repeat(1).take(n - item.attention_mask.len().min(n)));

            ids.extend(std::iter::repeat(self.pad_id as i32).take(seq_len - n));
            mask.extend(std::iter::repeat(0).take(seq_len - n));

            if n == 0 {
                let last = mask.len() - seq_len;
                mask[last] = 1;
            }
        }

        (ids, mask, seq_len)
    }
}

impl<B: Backend> Batcher<TokenizedRecord, ClassificationBatch<B>> for ClassificationBatcher<B> {
    fn batch(&self, items: Vec<TokenizedRecord>) -> ClassificationBatch<B> {
        let batch_size = items.len();
        let (ids, mask, seq_len) = self.pad(&items);

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            ids.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        let attention_mask = Tensor::<B, 1, Int>::from_ints(
            mask.as_slice(), &self.device
        ).reshape([batch_size, seq_len]);

        // Labels only if every record carries one
        let labels: Option<Vec<i32>> = items
            .iter()
            .map(|r| r.label.map(|l| l as i32))
            .collect();
        let labels = labels.map(|l| Tensor::<B, 1, Int>::from_ints(l.as_slice(), &self.device));

        ClassificationBatch { input_ids, attention_mask, labels }
    }
}
