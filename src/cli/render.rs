// ============================================================
// Layer 1 — Text Rendering
// ============================================================
// Turns evaluation results into the tables printed by the CLI.
// The classification report uses the familiar sklearn layout:
//
//                 precision    recall  f1-score   support
//
//          World       0.91      0.90      0.90      2503
//            ...
//       accuracy                           0.89     10000
//      macro avg       0.89      0.89      0.89     10000
//   weighted avg       0.89      0.89      0.89     10000

use std::fmt::Write;

use crate::application::evaluate_use_case::ComparisonRow;
use crate::application::predict_use_case::Prediction;
use crate::ml::report::{AverageMetrics, Metrics};

const TEXT_PREVIEW: usize = 60;

fn class_label(class_names: &[String], idx: usize) -> String {
    class_names.get(idx).cloned().unwrap_or_else(|| idx.to_string())
}

pub fn classification_report(metrics: &Metrics, class_names: &[String]) -> String {
    let names: Vec<String> = (0..metrics.num_classes()).map(|i| class_label(class_names, i)).collect();
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0).max("weighted avg".len());

    let mut out = String::new();
    let _ = writeln!(out, "{:>width$} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support");
    let _ = writeln!(out);
    for (name, m) in names.iter().zip(&metrics.per_class) {
        let _ = writeln!(
            out,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            name, m.precision, m.recall, m.f1, m.support
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{:>width$} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", metrics.accuracy, metrics.total);

    let avg_row = |out: &mut String, label: &str, a: &AverageMetrics| {
        let _ = writeln!(
            out,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            label, a.precision, a.recall, a.f1, metrics.total
        );
    };
    avg_row(&mut out, "macro avg", &metrics.macro_avg);
    avg_row(&mut out, "weighted avg", &metrics.weighted_avg);
    out
}

/// Rows are actual classes, columns predicted.
pub fn confusion_matrix(metrics: &Metrics, class_names: &[String]) -> String {
    let names: Vec<String> = (0..metrics.num_classes()).map(|i| class_label(class_names, i)).collect();
    let row_width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0).max("actual".len());
    let max_count = metrics.confusion.iter().flatten().copied().max().unwrap_or(0);
    let cell = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max(max_count.to_string().len());

    let mut out = String::new();
    let _ = write!(out, "{:<row_width$}", "actual");
    for name in &names {
        let _ = write!(out, " {:>cell$}", name);
    }
    let _ = writeln!(out);
    for (name, row) in names.iter().zip(&metrics.confusion) {
        let _ = write!(out, "{:<row_width$}", name);
        for count in row {
            let _ = write!(out, " {:>cell$}", count);
        }
        let _ = writeln!(out);
    }
    out
}

pub fn comparison_table(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:<TEXT_PREVIEW$}  {:<12} {:<12} {:>6}", "text", "actual", "predicted", "score");
    for r in rows {
        let mark = if r.actual == r.predicted { ' ' } else { '*' };
        let _ = writeln!(
            out,
            "{:<TEXT_PREVIEW$}  {:<12} {:<12} {:>6.3}{}",
            preview(&r.text),
            r.actual,
            r.predicted,
            r.confidence,
            mark
        );
    }
    out
}

/// Predicted class, its score, every class score, then the text.
pub fn predictions(preds: &[Prediction]) -> String {
    let mut out = String::new();
    for p in preds {
        let scores: Vec<String> = p.scores.iter().map(|s| format!("{s:.3}")).collect();
        let _ = writeln!(
            out,
            "{:<12} {:>6.3}  [{}]  {}",
            p.class_name,
            p.confidence,
            scores.join(" "),
            preview(&p.text)
        );
    }
    out
}

fn preview(text: &str) -> String {
    if text.chars().count() <= TEXT_PREVIEW {
        return text.to_string();
    }
    let mut s: String = text.chars().take(TEXT_PREVIEW - 3).collect();
    s.push_str("...");
    s
}
