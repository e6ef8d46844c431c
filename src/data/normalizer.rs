// ============================================================
// Layer 4 — Text Normalizer
// ============================================================
// Cleans the merged Title + Description text of a news record
// before tokenisation.
//
// Cleaning steps (applied in order, each narrows the character set):
//   1. Replace every "space" character ('-' and '\' by default)
//      with a single space so compound terms stay separate words
//   2. Delete every punctuation character in , . ? ; : ' ( ) { } ! |
//      and every ASCII digit. Characters are deleted, not
//      replaced, so "U.S." becomes "US"
//   3. Split on single spaces, drop tokens that exactly match a
//      stopword (case-sensitive), rejoin with single spaces
//
// Step 3 keeps empty tokens produced by consecutive spaces, so
// "a  b" stays "a  b", unless every surviving token is empty: text
// that was only punctuation, hyphens and stopwords becomes "" rather
// than a run of spaces. Words merged in step 2 ("U.S.-led" → "US led",
// "Reuters)Reuters" → "ReutersReuters") are left merged.
//
// Every character set and the stopword list are injected through
// NormalizerConfig; the defaults reproduce the English setup.
//
// Reference: Rust Book §8 (Strings in Rust)
//            Rust Book §13 (Iterators)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fs, path::Path};

/// NLTK English stopword list.
pub const ENGLISH_STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below",
    "to", "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t",
    "can", "will", "just", "don", "don't", "should", "should've", "now", "d", "ll",
    "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven",
    "haven't", "isn", "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't",
    "needn", "needn't", "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't",
    "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

/// Characters replaced by a single space in step 1.
pub const DEFAULT_SPACE_CHARS: &str = "-\\";

/// Characters deleted in step 2 (digits are controlled separately).
pub const DEFAULT_DELETE_CHARS: &str = ",.?;:'(){}!|";

/// Injected configuration for [`TextNormalizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub space_chars:  String,
    pub delete_chars: String,
    pub strip_digits: bool,
    pub stopwords:    Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            space_chars:  DEFAULT_SPACE_CHARS.to_string(),
            delete_chars: DEFAULT_DELETE_CHARS.to_string(),
            strip_digits: true,
            stopwords:    ENGLISH_STOPWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NormalizerConfig {
    /// Same character sets as the default, with a custom stopword list.
    pub fn with_stopwords<I, S>(stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stopwords: stopwords.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Default character sets with the stopword list read from a file:
    /// one word per line, blank lines and `#` comments ignored.
    pub fn from_stopwords_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Cannot read stopwords file '{}'", path.display()))?;
        let words: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect();
        tracing::debug!("Loaded {} stopwords from '{}'", words.len(), path.display());
        Ok(Self::with_stopwords(words))
    }
}

/// Pure, deterministic text cleaner.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    space_chars:  HashSet<char>,
    delete_chars: HashSet<char>,
    strip_digits: bool,
    stopwords:    HashSet<String>,
}

impl TextNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            space_chars:  config.space_chars.chars().collect(),
            delete_chars: config.delete_chars.chars().collect(),
            strip_digits: config.strip_digits,
            stopwords:    config.stopwords.iter().cloned().collect(),
        }
    }

    /// Run all three cleaning steps.
    pub fn normalize(&self, raw: &str) -> String {
        self.remove_stopwords(&self.strip_punctuation(raw))
    }

    /// Steps 1 and 2: space-replace, then delete punctuation and digits.
    pub fn strip_punctuation(&self, raw: &str) -> String {
        raw.chars()
            .map(|c| if self.space_chars.contains(&c) { ' ' } else { c })
            .filter(|c| !self.is_deleted(*c))
            .collect()
    }

    /// Step 3: drop exact stopword tokens, keeping token order.
    /// Returns "" when no non-empty token survives.
    pub fn remove_stopwords(&self, text: &str) -> String {
        let kept: Vec<&str> = text
            .split(' ')
            .filter(|token| !self.stopwords.contains(*token))
            .collect();
        if kept.iter().all(|token| token.is_empty()) {
            return String::new();
        }
        kept.join(" ")
    }

    fn is_deleted(&self, c: char) -> bool {
        self.delete_chars.contains(&c) || (self.strip_digits && c.is_ascii_digit())
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}
