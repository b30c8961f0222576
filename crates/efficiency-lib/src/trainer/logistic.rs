//! Multinomial logistic regression
//!
//! Softmax cross-entropy with an L2 penalty, fit by full-batch gradient
//! descent from a zero start. Deterministic for identical inputs.

use crate::error::{Error, ErrorKind, Result};
use crate::predictor::Classifier;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Optimisation settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    /// Inverse regularization strength
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Stop once the loss changes by less than this between iterations
    pub tolerance: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tolerance: 1e-6,
        }
    }
}

/// Fitted model: one weight row and one bias per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Array2<f64>,
    bias: Array1<f64>,
    n_iter: usize,
    converged: bool,
}

impl LogisticRegression {
    /// Build a model from known parameters
    pub fn from_parts(weights: Array2<f64>, bias: Array1<f64>) -> Result<Self> {
        if weights.nrows() != bias.len() || weights.nrows() == 0 {
            return Err(Error::new(
                ErrorKind::Training,
                format!(
                    "Weight rows ({}) and bias length ({}) must match and be non-zero",
                    weights.nrows(),
                    bias.len()
                ),
            ));
        }
        Ok(Self {
            weights,
            bias,
            n_iter: 0,
            converged: true,
        })
    }

    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        n_classes: usize,
        config: &TrainingConfig,
    ) -> Result<Self> {
        let (n_samples, n_features) = x.dim();
        if n_samples == 0 {
            return Err(Error::new(ErrorKind::Training, "Training set is empty"));
        }
        if y.len() != n_samples {
            return Err(Error::new(
                ErrorKind::Training,
                format!("Dimension mismatch: {} rows but {} labels", n_samples, y.len()),
            ));
        }
        if let Some(bad) = y.iter().find(|c| **c >= n_classes) {
            return Err(Error::new(
                ErrorKind::Training,
                format!("Label {} outside 0..{}", bad, n_classes),
            ));
        }

        let n = n_samples as f64;
        let mut targets = Array2::<f64>::zeros((n_samples, n_classes));
        for (i, &c) in y.iter().enumerate() {
            targets[[i, c]] = 1.0;
        }

        let mut weights = Array2::<f64>::zeros((n_classes, n_features));
        let mut bias = Array1::<f64>::zeros(n_classes);
        let penalty = 1.0 / (config.c * n);

        let mut previous_loss = f64::INFINITY;
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 0..config.max_iter {
            n_iter = iter + 1;
            let logits = x.dot(&weights.t()) + &bias;
            let probs = softmax_rows(&logits);

            let loss = cross_entropy(&probs, y) + 0.5 * penalty * weights.mapv(|w| w * w).sum();
            if !loss.is_finite() {
                return Err(Error::new(
                    ErrorKind::Training,
                    format!("Loss diverged at iteration {}", iter),
                ));
            }

            let errors = &probs - &targets;
            let grad_w = errors.t().dot(x) / n + &weights * penalty;
            let grad_b = errors.sum_axis(Axis(0)) / n;

            weights = weights - grad_w * config.learning_rate;
            bias = bias - grad_b * config.learning_rate;

            if (previous_loss - loss).abs() < config.tolerance {
                converged = true;
                debug!(iteration = iter, loss, "Converged");
                break;
            }
            previous_loss = loss;
        }

        Ok(Self {
            weights,
            bias,
            n_iter,
            converged,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.weights.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn predict_proba(&self, x: &Array2<f64>) -> Array2<f64> {
        softmax_rows(&(x.dot(&self.weights.t()) + &self.bias))
    }

    pub fn predict(&self, x: &Array2<f64>) -> Array1<usize> {
        let scores = x.dot(&self.weights.t()) + &self.bias;
        scores.rows().into_iter().map(argmax).collect()
    }
}

impl Classifier for LogisticRegression {
    fn predict_class(&self, features: &[f64]) -> Result<i64> {
        if features.len() != self.n_features() {
            return Err(Error::new(
                ErrorKind::SchemaMismatch,
                format!(
                    "Model expects {} features, got {}",
                    self.n_features(),
                    features.len()
                ),
            ));
        }
        let row = ArrayView1::from(features);
        let scores = self.weights.dot(&row) + &self.bias;
        Ok(argmax(scores.view()) as i64)
    }
}

fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, v) in row.iter().enumerate() {
        if *v > row[best] {
            best = i;
        }
    }
    best
}

fn softmax_rows(logits: &Array2<f64>) -> Array2<f64> {
    let mut out = logits.clone();
    for mut row in out.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, v| m.max(*v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    out
}

fn cross_entropy(probs: &Array2<f64>, y: &Array1<usize>) -> f64 {
    let eps = 1e-15;
    let total: f64 = y
        .iter()
        .enumerate()
        .map(|(i, &c)| -probs[[i, c]].max(eps).ln())
        .sum();
    total / y.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<usize>) {
        let x = array![
            [-2.0, 0.0],
            [-1.8, 0.2],
            [-2.2, -0.1],
            [0.0, 2.0],
            [0.1, 1.8],
            [-0.2, 2.2],
            [2.0, 0.0],
            [1.9, -0.2],
            [2.1, 0.1],
        ];
        let y = array![0, 0, 0, 1, 1, 1, 2, 2, 2];
        (x, y)
    }

    #[test]
    fn test_fits_separable_classes() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, 3, &TrainingConfig::default()).unwrap();
        assert_eq!(model.n_classes(), 3);
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.predict(&x), y);
        assert!(model.n_iter() <= 1000);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = separable();
        let config = TrainingConfig::default();
        let a = LogisticRegression::fit(&x, &y, 3, &config).unwrap();
        let b = LogisticRegression::fit(&x, &y, 3, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, 3, &TrainingConfig::default()).unwrap();
        for row in model.predict_proba(&x).rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_iteration_budget_is_respected() {
        let (x, y) = separable();
        let config = TrainingConfig {
            max_iter: 5,
            ..TrainingConfig::default()
        };
        let model = LogisticRegression::fit(&x, &y, 3, &config).unwrap();
        assert_eq!(model.n_iter(), 5);
        assert!(!model.converged());
    }

    #[test]
    fn test_rejects_bad_input() {
        let (x, _) = separable();
        let short = array![0, 1];
        assert!(LogisticRegression::fit(&x, &short, 3, &TrainingConfig::default()).is_err());
        let out_of_range = array![0, 0, 0, 1, 1, 1, 2, 2, 5];
        let err = LogisticRegression::fit(&x, &out_of_range, 3, &TrainingConfig::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Training);
    }

    #[test]
    fn test_classifier_matches_batch_predict() {
        let (x, y) = separable();
        let model = LogisticRegression::fit(&x, &y, 3, &TrainingConfig::default()).unwrap();
        let predicted = model.predict(&x);
        for (row, expected) in x.rows().into_iter().zip(predicted.iter()) {
            let row: Vec<f64> = row.to_vec();
            assert_eq!(model.predict_class(&row).unwrap(), *expected as i64);
        }
        assert_eq!(
            model.predict_class(&[1.0]).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
    }

    #[test]
    fn test_from_parts() {
        let weights = array![[1.0, 0.0], [0.0, 1.0]];
        let model = LogisticRegression::from_parts(weights, array![0.0, 0.0]).unwrap();
        assert_eq!(model.predict_class(&[3.0, 1.0]).unwrap(), 0);
        assert_eq!(model.predict_class(&[1.0, 3.0]).unwrap(), 1);
        assert!(LogisticRegression::from_parts(array![[1.0]], array![0.0, 1.0]).is_err());
    }
}
