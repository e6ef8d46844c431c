// ============================================================
// Layer 2 — Classification Pipeline
// ============================================================
// The stage-to-stage workflow shared by the use cases, written
// against the domain traits only:
//
//   RawRecord ──normalize──► RawRecord ──remap──► Record
//   Record ──split──► Split<Record>
//   Split ──tokenize──► TokenizedRecord ──fit/predict──► Metrics
//
// Each stage takes its input by value or reference and returns
// a new value; nothing here owns a tokenizer or a model.

use anyhow::{ensure, Result};

use crate::data::labels::LabelRemapper;
use crate::data::normalizer::TextNormalizer;
use crate::data::splitter::Split;
use crate::data::tokenize::{tokenize_batch, tokenize_texts};
use crate::domain::error::PipelineResult;
use crate::domain::record::{PredictionResult, RawRecord, Record};
use crate::domain::traits::{BatchTokenizer, FitSummary, SequenceClassifier};
use crate::ml::report::{report_with_classes, Metrics};

/// Normalize every text, then shift labels to `[0, K-1]`.
pub fn prepare_records(
    raw:        Vec<RawRecord>,
    normalizer: &TextNormalizer,
    remapper:   &LabelRemapper,
) -> PipelineResult<Vec<Record>> {
    let normalized: Vec<RawRecord> = raw
        .into_iter()
        .map(|r| RawRecord { text: normalizer.normalize(&r.text), label: r.label })
        .collect();
    remapper.remap_all(normalized)
}

/// Records per class, indexed by zero-based label.
pub fn class_counts(records: &[Record], num_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; num_classes];
    for r in records {
        if let Some(c) = counts.get_mut(r.label) {
            *c += 1;
        }
    }
    counts
}

/// Log the per-class record counts; a class with no records gets a warning.
pub fn log_class_balance(records: &[Record], class_names: &[String]) {
    let counts = class_counts(records, class_names.len());
    let summary: Vec<String> = class_names
        .iter()
        .zip(&counts)
        .map(|(name, n)| format!("{name}={n}"))
        .collect();
    tracing::info!("Class balance over {} records: {}", records.len(), summary.join(", "));

    for (name, _) in class_names.iter().zip(&counts).filter(|(_, n)| **n == 0) {
        tracing::warn!("Class '{}' has no records", name);
    }
}

/// Predictions over a labelled set, with the scores kept for display.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub predictions: Vec<PredictionResult>,
    pub predicted:   Vec<usize>,
    pub actual:      Vec<usize>,
    pub metrics:     Metrics,
}

/// Result of a full train-and-evaluate run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub train_size: usize,
    pub test_size:  usize,
    pub fit:        FitSummary,
    pub evaluation: Evaluation,
}

/// Tokenize both halves of `split`, train on `train` (evaluating on
/// `test` each epoch), then score the test set.
pub fn fit_and_evaluate<T, C>(
    split:      &Split<Record>,
    tokenizer:  &T,
    classifier: &mut C,
    max_length: Option<usize>,
) -> Result<PipelineOutcome>
where
    T: BatchTokenizer + ?Sized,
    C: SequenceClassifier + ?Sized,
{
    let train = tokenize_batch(tokenizer, &split.train, max_length)?;
    let test  = tokenize_batch(tokenizer, &split.test, max_length)?;
    tracing::info!("Tokenized {} train / {} test records", train.len(), test.len());

    let fit = classifier.fit(&train, &test)?;
    match fit.final_eval_loss {
        Some(eval_loss) => tracing::info!(
            "Fit finished: {} epochs, {} steps, final train loss {:.4}, eval loss {:.4}",
            fit.epochs, fit.steps, fit.final_train_loss, eval_loss
        ),
        None => tracing::info!(
            "Fit finished: {} epochs, {} steps, final train loss {:.4}",
            fit.epochs, fit.steps, fit.final_train_loss
        ),
    }

    let evaluation = evaluate_records(&split.test, tokenizer, classifier, max_length)?;
    Ok(PipelineOutcome {
        train_size: split.train.len(),
        test_size:  split.test.len(),
        fit,
        evaluation,
    })
}

/// Score labelled records and compare against their labels.
pub fn evaluate_records<T, C>(
    records:    &[Record],
    tokenizer:  &T,
    classifier: &C,
    max_length: Option<usize>,
) -> Result<Evaluation>
where
    T: BatchTokenizer + ?Sized,
    C: SequenceClassifier + ?Sized,
{
    let tokenized: Vec<_> = tokenize_batch(tokenizer, records, max_length)?
        .iter()
        .map(|r| r.without_label())
        .collect();
    let predictions = classifier.predict(&tokenized)?;
    ensure!(
        predictions.len() == records.len(),
        "classifier returned {} predictions for {} records",
        predictions.len(),
        records.len()
    );

    let predicted: Vec<usize> = predictions.iter().map(PredictionResult::predicted_label).collect();
    let actual:    Vec<usize> = records.iter().map(|r| r.label).collect();
    let metrics = report_with_classes(&predicted, &actual, classifier.num_classes())?;

    Ok(Evaluation { predictions, predicted, actual, metrics })
}

/// Normalize and score free text.
pub fn predict_texts<T, C, S>(
    texts:      &[S],
    normalizer: &TextNormalizer,
    tokenizer:  &T,
    classifier: &C,
    max_length: Option<usize>,
) -> Result<Vec<PredictionResult>>
where
    T: BatchTokenizer + ?Sized,
    C: SequenceClassifier + ?Sized,
    S: AsRef<str>,
{
    let cleaned: Vec<String> = texts.iter().map(|t| normalizer.normalize(t.as_ref())).collect();
    let tokenized = tokenize_texts(tokenizer, &cleaned, max_length)?;
    classifier.predict(&tokenized)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::splitter::{train_test_split, SplitConfig};
    use crate::data::tokenize::tests::FakeTokenizer;
    use crate::domain::error::PipelineError;
    use crate::domain::record::TokenizedRecord;

    /// Predicts the label seen most often during `fit` for every input.
    struct MajorityClassifier {
        num_classes: usize,
        majority:    usize,
    }

    impl SequenceClassifier for MajorityClassifier {
        fn fit(&mut self, train: &[TokenizedRecord], _eval: &[TokenizedRecord]) -> Result<FitSummary> {
            let mut counts = vec![0usize; self.num_classes];
            for r in train {
                let label = r.label.ok_or_else(|| anyhow::anyhow!("unlabelled record"))?;
                counts[label] += 1;
            }
            self.majority = (0..self.num_classes).max_by_key(|&c| (counts[c], std::cmp::Reverse(c))).unwrap_or(0);
            Ok(FitSummary { epochs: 1, steps: 1, final_train_loss: 0.0, final_eval_loss: None })
        }

        fn predict(&self, records: &[TokenizedRecord]) -> Result<Vec<PredictionResult>> {
            Ok(records
                .iter()
                .map(|_| {
                    let mut scores = vec![0.0; self.num_classes];
                    scores[self.majority] = 1.0;
                    PredictionResult::new(scores)
                })
                .collect())
        }

        fn num_classes(&self) -> usize {
            self.num_classes
        }
    }

    fn raw_records() -> Vec<RawRecord> {
        vec![
            RawRecord::new("U.S. Stocks-Up 3%!", 3),
            RawRecord::new("Team wins the cup", 2),
            RawRecord::new("Stocks fall again", 3),
            RawRecord::new("Rocket launch delayed", 4),
            RawRecord::new("Peace talks resume", 1),
            RawRecord::new("Markets rally", 3),
        ]
    }

    #[test]
    fn test_prepare_normalizes_then_remaps() {
        let out = prepare_records(raw_records(), &TextNormalizer::default(), &LabelRemapper::new(1, 4)).unwrap();
        assert_eq!(out[0], Record::new("US Stocks Up %", 2));
        assert_eq!(out[1].text, "Team wins cup");
        assert_eq!(out[4].label, 0);
    }

    #[test]
    fn test_prepare_rejects_out_of_range_label() {
        let mut raw = raw_records();
        raw.push(RawRecord::new("Mystery", 5));
        let err = prepare_records(raw, &TextNormalizer::default(), &LabelRemapper::new(1, 4)).unwrap_err();
        assert!(matches!(err, PipelineError::OutOfRange { label: 5, remapped: 4, .. }));
    }

    #[test]
    fn test_class_counts_by_label() {
        let records = prepare_records(raw_records(), &TextNormalizer::default(), &LabelRemapper::new(1, 4)).unwrap();
        assert_eq!(class_counts(&records, 4), vec![1, 1, 3, 1]);
        // Labels past the class count are not counted
        assert_eq!(class_counts(&records, 2), vec![1, 1]);
        assert_eq!(class_counts(&[], 3), vec![0, 0, 0]);
    }

    #[test]
    fn test_fit_and_evaluate_with_fakes() {
        let records = prepare_records(raw_records(), &TextNormalizer::default(), &LabelRemapper::new(1, 4)).unwrap();
        let split   = Split { train: records.clone(), test: records };
        let mut clf = MajorityClassifier { num_classes: 4, majority: 0 };

        let outcome = fit_and_evaluate(&split, &FakeTokenizer, &mut clf, Some(8)).unwrap();

        // Business (label 2) is the majority class: 3 of 6
        assert!(outcome.evaluation.predicted.iter().all(|&p| p == 2));
        assert_eq!(outcome.evaluation.metrics.num_classes(), 4);
        assert!((outcome.evaluation.metrics.accuracy - 0.5).abs() < 1e-9);
        assert_eq!(outcome.evaluation.metrics.confusion[0], vec![0, 0, 1, 0]);
        assert_eq!(outcome.train_size, 6);
    }

    #[test]
    fn test_split_feeds_disjoint_sets() {
        let records = prepare_records(raw_records(), &TextNormalizer::default(), &LabelRemapper::new(1, 4)).unwrap();
        let split   = train_test_split(&records, &SplitConfig { train_fraction: 0.5, test_cap: None, ..Default::default() }).unwrap();
        let mut clf = MajorityClassifier { num_classes: 4, majority: 0 };

        let outcome = fit_and_evaluate(&split, &FakeTokenizer, &mut clf, None).unwrap();
        assert_eq!(outcome.train_size, 3);
        assert_eq!(outcome.test_size, 3);
        assert_eq!(outcome.evaluation.actual.len(), 3);
    }

    #[test]
    fn test_predict_texts_normalizes_first() {
        let clf   = MajorityClassifier { num_classes: 4, majority: 1 };
        let preds = predict_texts(&["Team wins!", ""][..], &TextNormalizer::default(), &FakeTokenizer, &clf, None).unwrap();
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].predicted_label(), 1);
    }
}
