//! Classification metrics

use serde::{Deserialize, Serialize};

/// Accuracy plus support-weighted precision, recall and F1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
    /// `confusion[true][predicted]`
    pub confusion: Vec<Vec<usize>>,
}

/// Score predictions against ground truth over `n_classes` classes.
///
/// A class with no predicted (or no true) rows contributes 0 precision
/// (or recall) rather than failing.
pub fn evaluate(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> EvaluationMetrics {
    let size = y_true
        .iter()
        .chain(y_pred)
        .map(|c| c + 1)
        .max()
        .unwrap_or(0)
        .max(n_classes);
    let mut confusion = vec![vec![0usize; size]; size];
    for (&t, &p) in y_true.iter().zip(y_pred) {
        confusion[t][p] += 1;
    }

    let total = y_true.len().min(y_pred.len());
    if total == 0 {
        return EvaluationMetrics {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0,
            support: 0,
            confusion,
        };
    }

    let correct: usize = (0..size).map(|c| confusion[c][c]).sum();
    let mut precision = 0.0;
    let mut recall = 0.0;
    let mut f1 = 0.0;

    for c in 0..size {
        let tp = confusion[c][c] as f64;
        let support: usize = confusion[c].iter().sum();
        let predicted: usize = confusion.iter().map(|row| row[c]).sum();
        if support == 0 {
            continue;
        }
        let p = if predicted > 0 { tp / predicted as f64 } else { 0.0 };
        let r = tp / support as f64;
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };

        let weight = support as f64 / total as f64;
        precision += weight * p;
        recall += weight * r;
        f1 += weight * f;
    }

    EvaluationMetrics {
        accuracy: correct as f64 / total as f64,
        precision,
        recall,
        f1,
        support: total,
        confusion,
    }
}
