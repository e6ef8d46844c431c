// ============================================================
// Layer 4 — Tokenization Adapter
// ============================================================
// Maps records onto the numeric form the classifier consumes:
//
//   Record { text, label }
//       │  BatchTokenizer::encode_batch
//       ▼
//   TokenizedRecord { input_ids, attention_mask, label }
//
// The text column is dropped here. Truncation is whatever the
// tokenizer does with `max_length`; padding happens later, per
// batch, in the batcher.

use anyhow::{ensure, Result};

use crate::domain::record::{Record, TokenizedRecord};
use crate::domain::traits::BatchTokenizer;

/// Tokenize labelled records; labels pass through unchanged.
pub fn tokenize_batch<T: BatchTokenizer + ?Sized>(
    tokenizer:  &T,
    records:    &[Record],
    max_length: Option<usize>,
) -> Result<Vec<TokenizedRecord>> {
    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let labels = records.iter().map(|r| Some(r.label));
    encode(tokenizer, &texts, labels, max_length)
}

/// Tokenize free text for inference (`label: None`).
pub fn tokenize_texts<T: BatchTokenizer + ?Sized, S: AsRef<str>>(
    tokenizer:  &T,
    texts:      &[S],
    max_length: Option<usize>,
) -> Result<Vec<TokenizedRecord>> {
    let texts: Vec<&str> = texts.iter().map(AsRef::as_ref).collect();
    encode(tokenizer, &texts, std::iter::repeat(None), max_length)
}

fn encode<T: BatchTokenizer + ?Sized>(
    tokenizer:  &T,
    texts:      &[&str],
    labels:     impl Iterator<Item = Option<usize>>,
    max_length: Option<usize>,
) -> Result<Vec<TokenizedRecord>> {
    let encodings = tokenizer.encode_batch(texts, max_length)?;
    ensure!(
        encodings.len() == texts.len(),
        "tokenizer returned {} encodings for {} texts",
        encodings.len(),
        texts.len()
    );

    let out: Vec<TokenizedRecord> = encodings
        .into_iter()
        .zip(labels)
        .map(|(enc, label)| TokenizedRecord {
            input_ids:      enc.input_ids,
            attention_mask: enc.attention_mask,
            label,
        })
        .collect();

    tracing::debug!("Tokenized {} texts", out.len());
    Ok(out)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::record::EncodedText;

    /// Whitespace tokenizer: each word becomes its byte length + 10,
    /// wrapped in 1 … 2 markers, truncated to `max_length`.
    pub(crate) struct FakeTokenizer;

    impl BatchTokenizer for FakeTokenizer {
        fn encode_batch(&self, texts: &[&str], max_length: Option<usize>) -> Result<Vec<EncodedText>> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut ids = vec![1u32];
                    ids.extend(t.split_whitespace().map(|w| (w.len() as u32 + 10).min(63)));
                    ids.push(2);
                    if let Some(max) = max_length {
                        ids.truncate(max);
                    }
                    let mask = vec![1u32; ids.len()];
                    EncodedText { input_ids: ids, attention_mask: mask }
                })
                .collect())
        }

        fn vocab_size(&self) -> usize {
            64
        }
    }

    struct ShortTokenizer;

    impl BatchTokenizer for ShortTokenizer {
        fn encode_batch(&self, _texts: &[&str], _max: Option<usize>) -> Result<Vec<EncodedText>> {
            Ok(Vec::new())
        }

        fn vocab_size(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_labels_pass_through() {
        let recs = vec![Record::new("stocks up", 2), Record::new("team wins cup", 1)];
        let out  = tokenize_batch(&FakeTokenizer, &recs, None).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].input_ids, vec![1, 16, 12, 2]);
        assert_eq!(out[0].label, Some(2));
        assert_eq!(out[1].label, Some(1));
        assert_eq!(out[1].attention_mask, vec![1; 5]);
    }

    #[test]
    fn test_max_length_is_forwarded() {
        let recs = vec![Record::new("a b c d e f", 0)];
        let out  = tokenize_batch(&FakeTokenizer, &recs, Some(3)).unwrap();
        assert_eq!(out[0].len(), 3);
    }

    #[test]
    fn test_texts_have_no_label() {
        let out = tokenize_texts(&FakeTokenizer, &["hello", "world"][..], None).unwrap();
        assert!(out.iter().all(|r| r.label.is_none()));
    }

    #[test]
    fn test_misaligned_tokenizer_output_fails() {
        let recs = vec![Record::new("x", 0)];
        assert!(tokenize_batch(&ShortTokenizer, &recs, None).is_err());
    }
}
