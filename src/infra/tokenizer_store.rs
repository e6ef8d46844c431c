// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// HfTokenizer wraps a HuggingFace `tokenizers::Tokenizer` behind
// the BatchTokenizer / Persistable traits. It either loads an
// existing tokenizer.json (e.g. a pretrained BERT vocabulary) or
// is built from the training corpus.
//
// In tokenizers 0.15, train_from_files requires Trainer::Model
// to equal ModelWrapper. Instead of training, we count words,
// write a WordLevel tokenizer JSON directly, and parse it back.
//
// Built tokenizers follow the BERT id convention:
//   [PAD]=0  [UNK]=1  [CLS]=101  [SEP]=102  [MASK]=103
//   corpus words from 104, most frequent first
// and wrap every sequence as [CLS] … [SEP], so the classifier
// can pool the first position.
//
// Reference: Sennrich et al. (2016) BPE paper
//            HuggingFace tokenizers (tokenizer.json format)

use anyhow::{anyhow, ensure, Context, Result};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokenizers::{PostProcessor, Tokenizer, TruncationParams};

use crate::domain::record::EncodedText;
use crate::domain::traits::{BatchTokenizer, Persistable};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

const SPECIAL_TOKENS: [(&str, u32); 5] = [
    ("[PAD]", 0),
    ("[UNK]", 1),
    ("[CLS]", 101),
    ("[SEP]", 102),
    ("[MASK]", 103),
];
const FIRST_WORD_ID: u32 = 104;

// ─── HfTokenizer ──────────────────────────────────────────────────────────────
#[derive(Clone)]
pub struct HfTokenizer {
    inner:      Tokenizer,
    vocab_size: usize,
    pad_id:     u32,
}

impl HfTokenizer {
    pub fn new(mut inner: Tokenizer) -> Self {
        let pad_id = inner
            .get_padding()
            .map(|p| p.pad_id)
            .or_else(|| inner.token_to_id("[PAD]"))
            .unwrap_or(0);
        // Batches are padded later, per batch, by the batcher
        inner.with_padding(None);

        let vocab_size = inner
            .get_vocab(true)
            .values()
            .copied()
            .max()
            .map_or(0, |max_id| max_id as usize + 1);
        Self { inner, vocab_size, pad_id }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e))?;
        tracing::info!("Tokenizer loaded from '{}'", path.display());
        Ok(Self::new(inner))
    }

    /// Word-level tokenizer over the `vocab_size - 5` most frequent
    /// words of `texts` (ties broken alphabetically).
    pub fn build_word_level<S: AsRef<str>>(texts: &[S], vocab_size: usize) -> Result<Self> {
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            let lower = text.as_ref().to_lowercase();
            for word in pre_tokenize(&lower) {
                *freq.entry(word.to_string()).or_insert(0) += 1;
            }
        }

        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(w, _)| !SPECIAL_TOKENS.iter().any(|(s, _)| *s == w.as_str()))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        let mut vocab = serde_json::Map::new();
        for (token, id) in SPECIAL_TOKENS {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (offset, (word, _)) in words.iter().enumerate() {
            vocab.insert(word.clone(), serde_json::json!(FIRST_WORD_ID as usize + offset));
        }

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .map(|(content, id)| serde_json::json!({
                "id": id, "content": content, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": false,
                "lowercase": true
            },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": {
                "type": "BertProcessing",
                "sep": ["[SEP]", 102],
                "cls": ["[CLS]", 101]
            },
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let inner = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow!("Cannot parse built tokenizer: {e}"))?;
        tracing::info!("Tokenizer built with {} corpus words", words.len());
        Ok(Self::new(inner))
    }

    #[cfg(test)]
    pub fn token_to_id(&self, token: &str) -> Option<u32> {
        self.inner.token_to_id(token)
    }

    fn special_token_count(&self) -> usize {
        self.inner
            .get_post_processor()
            .map_or(0, |p| p.added_tokens(false))
    }
}

impl BatchTokenizer for HfTokenizer {
    fn encode_batch(&self, texts: &[&str], max_length: Option<usize>) -> Result<Vec<EncodedText>> {
        let mut tokenizer = self.inner.clone();
        if let Some(max_length) = max_length {
            ensure!(
                max_length > self.special_token_count(),
                "max_length {} leaves no room beside {} special tokens",
                max_length,
                self.special_token_count()
            );
        }
        let truncation = max_length.map(|max_length| TruncationParams {
            max_length,
            ..Default::default()
        });
        tokenizer
            .with_truncation(truncation)
            .map_err(|e| anyhow!("Invalid truncation settings: {e}"))?;

        let encodings = tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow!("Tokenization failed: {e}"))?;

        Ok(encodings
            .iter()
            .map(|e| EncodedText {
                input_ids:      e.get_ids().to_vec(),
                attention_mask: e.get_attention_mask().to_vec(),
            })
            .collect())
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn pad_id(&self) -> u32 {
        self.pad_id
    }
}

impl Persistable for HfTokenizer {
    fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;
        let path = dir.join(TOKENIZER_FILE);
        self.inner
            .save(&path, true)
            .map_err(|e| anyhow!("Cannot write tokenizer to '{}': {}", path.display(), e))?;
        tracing::debug!("Tokenizer saved to '{}'", path.display());
        Ok(())
    }

    fn load(dir: &Path) -> Result<Self> {
        Self::from_file(dir.join(TOKENIZER_FILE))
    }
}

/// Same split as the `Whitespace` pre-tokenizer: runs of word
/// characters, or runs of other non-space characters.
fn pre_tokenize(text: &str) -> impl Iterator<Item = &str> {
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    text.split_whitespace().flat_map(move |chunk| {
        let mut pieces = Vec::new();
        let mut start  = 0;
        let mut chars  = chunk.char_indices().peekable();
        while let Some((_, c)) = chars.next() {
            let boundary = match chars.peek() {
                Some(&(next_i, next_c)) if is_word(next_c) != is_word(c) => Some(next_i),
                Some(_) => None,
                None => Some(chunk.len()),
            };
            if let Some(end) = boundary {
                pieces.push(&chunk[start..end]);
                start = end;
            }
        }
        pieces
    })
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
/// Tokenizer persistence in one directory: reuse the saved
/// tokenizer.json if present, otherwise build one and save it.
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn load_or_build<S: AsRef<str>>(&self, texts: &[S], vocab_size: usize) -> Result<HfTokenizer> {
        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            HfTokenizer::load(&self.dir)
        } else {
            tracing::info!("Building new tokenizer (vocab_size={})", vocab_size);
            let tokenizer = HfTokenizer::build_word_level(texts, vocab_size)?;
            tokenizer.save(&self.dir)?;
            Ok(tokenizer)
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<&'static str> {
        vec!["stocks rally", "stocks fall", "team wins cup", "Stocks rebound"]
    }

    #[test]
    fn test_pre_tokenize_splits_like_whitespace_pretokenizer() {
        let pieces: Vec<&str> = pre_tokenize("us stocks% up  3rd!!").collect();
        assert_eq!(pieces, vec!["us", "stocks", "%", "up", "3rd", "!!"]);
    }

    #[test]
    fn test_built_vocab_orders_by_frequency() {
        let tok = HfTokenizer::build_word_level(&corpus(), 100).unwrap();
        // "stocks" appears three times (case-folded)
        assert_eq!(tok.token_to_id("stocks"), Some(FIRST_WORD_ID));
        assert_eq!(tok.token_to_id("[CLS]"), Some(101));
        assert_eq!(tok.pad_id(), 0);
        // 7 distinct words after the reserved ids
        assert_eq!(tok.vocab_size(), FIRST_WORD_ID as usize + 7);
    }

    #[test]
    fn test_vocab_size_limits_words() {
        let tok = HfTokenizer::build_word_level(&corpus(), 6).unwrap();
        assert_eq!(tok.token_to_id("stocks"), Some(FIRST_WORD_ID));
        assert_eq!(tok.token_to_id("rally"), None);
    }

    #[test]
    fn test_encode_wraps_with_cls_and_sep() {
        let tok = HfTokenizer::build_word_level(&corpus(), 100).unwrap();
        let enc = tok.encode_batch(&["Stocks unknownword"], None).unwrap();
        assert_eq!(enc.len(), 1);
        assert_eq!(enc[0].input_ids, vec![101, FIRST_WORD_ID, 1, 102]);
        assert_eq!(enc[0].attention_mask, vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_truncation_keeps_special_tokens() {
        let tok = HfTokenizer::build_word_level(&corpus(), 100).unwrap();
        let enc = tok.encode_batch(&["team wins cup stocks rally"], Some(4)).unwrap();
        assert_eq!(enc[0].input_ids.len(), 4);
        assert_eq!(enc[0].input_ids.first(), Some(&101));
        assert_eq!(enc[0].input_ids.last(), Some(&102));
    }

    #[test]
    fn test_max_length_must_exceed_special_tokens() {
        let tok = HfTokenizer::build_word_level(&corpus(), 100).unwrap();
        assert!(tok.encode_batch(&["stocks"], Some(2)).is_err());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tok = HfTokenizer::build_word_level(&corpus(), 100).unwrap();
        tok.save(dir.path()).unwrap();

        let loaded = HfTokenizer::load(dir.path()).unwrap();
        assert_eq!(loaded.vocab_size(), tok.vocab_size());
        assert_eq!(
            loaded.encode_batch(&["team wins"], None).unwrap(),
            tok.encode_batch(&["team wins"], None).unwrap()
        );
    }

    #[test]
    fn test_store_reuses_saved_tokenizer() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let first = store.load_or_build(&corpus(), 100).unwrap();
        assert!(store.path().exists());

        // A different corpus is ignored once tokenizer.json exists
        let second = store.load_or_build(&["entirely new words"][..], 100).unwrap();
        assert_eq!(second.vocab_size(), first.vocab_size());
        assert_eq!(second.token_to_id("entirely"), None);
    }
}
