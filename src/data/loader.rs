// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// Reads labelled news records from a UTF-8 CSV file with a
// header row, using the `csv` crate (quoted fields with embedded
// commas and newlines are common in AG News descriptions).
//
// Two column layouts are recognised, by header name:
//
//   Class Index,Title,Description   → text = Title + sep + Description
//   text,label                      → used as-is
//
// The separator defaults to "" so Title and Description are glued
// together exactly as a plain string concatenation would.
//
// Rows whose merged text is blank are skipped with a warning;
// a label that does not parse as an integer is a hard error that
// names the CSV line.

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::{fs::File, io::Read, path::PathBuf};

use crate::domain::record::RawRecord;
use crate::domain::traits::RecordSource;

/// Which columns hold the text and label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    TitleDescription { title: usize, description: usize, label: usize },
    TextLabel        { text: usize, label: usize },
}

/// Loads [`RawRecord`]s from a CSV file.
pub struct CsvLoader {
    path:      PathBuf,
    separator: String,
}

impl CsvLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), separator: String::new() }
    }

    /// String placed between Title and Description.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Parse records from any reader; `load_all` wraps this around the file.
    pub fn read_from<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let headers = rdr.headers().context("Cannot read CSV header row")?.clone();
        let layout  = detect_layout(&headers)?;
        tracing::debug!("CSV layout: {:?}", layout);

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            // +2: one for the header, one for 1-based line numbers
            let line = row + 2;
            let rec  = result.with_context(|| format!("Malformed CSV row at line {line}"))?;

            let (text, label_raw) = match layout {
                Layout::TitleDescription { title, description, label } => {
                    let t = rec.get(title).unwrap_or_default();
                    let d = rec.get(description).unwrap_or_default();
                    (format!("{t}{}{d}", self.separator), rec.get(label).unwrap_or_default())
                }
                Layout::TextLabel { text, label } => (
                    rec.get(text).unwrap_or_default().to_string(),
                    rec.get(label).unwrap_or_default(),
                ),
            };

            let label: i64 = label_raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid label {label_raw:?} at line {line}"))?;

            if text.trim().is_empty() {
                tracing::warn!("Skipping line {}: empty text", line);
                skipped += 1;
                continue;
            }

            records.push(RawRecord::new(text, label));
        }

        if skipped > 0 {
            tracing::info!("Skipped {} rows with empty text", skipped);
        }
        Ok(records)
    }
}

impl RecordSource for CsvLoader {
    fn load_all(&self) -> Result<Vec<RawRecord>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open data file '{}'", self.path.display()))?;
        let records = self
            .read_from(file)
            .with_context(|| format!("Cannot parse '{}'", self.path.display()))?;
        tracing::info!("Loaded {} records from '{}'", records.len(), self.path.display());
        Ok(records)
    }
}

fn detect_layout(headers: &StringRecord) -> Result<Layout> {
    let find = |name: &str| headers.iter().position(|h| h.trim() == name);

    if let (Some(title), Some(description), Some(label)) =
        (find("Title"), find("Description"), find("Class Index"))
    {
        return Ok(Layout::TitleDescription { title, description, label });
    }
    if let (Some(text), Some(label)) = (find("text"), find("label")) {
        return Ok(Layout::TextLabel { text, label });
    }

    let seen: Vec<&str> = headers.iter().collect();
    bail!(
        "CSV must have columns [Class Index, Title, Description] or [text, label]; found {:?}",
        seen
    )
}
