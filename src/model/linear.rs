//! Multinomial logistic regression over sparse feature vectors.
//!
//! Training minimizes weighted multinomial cross-entropy plus an L2
//! penalty `(1/C) * sum ||w_c||^2` (intercepts unpenalized) with
//! full-batch gradient descent and Armijo backtracking line search.
//! Inference is softmax over per-class logits with a
//! deterministic first-wins argmax.

use serde::{Deserialize, Serialize};

use crate::error::{FormcastError, Result};
use crate::vectorize::SparseVector;

/// Gradient sup-norm below which training stops early.
const GRADIENT_TOLERANCE: f64 = 1e-5;

/// Training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Inverse regularization strength; smaller means stronger L2 penalty.
    pub c: f64,
    /// Iteration bound for the optimizer.
    pub max_iter: usize,
    /// Scale each sample's loss by `n / (num_classes * count(class))`.
    pub balance_classes: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            c: 5.0,
            max_iter: 100,
            balance_classes: true,
        }
    }
}

/// Fitted per-class weights and intercepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearClassifier {
    /// Distinct labels in first-occurrence order; canonical everywhere
    /// (coefficient rows, probability output, argmax tie-break).
    pub classes: Vec<String>,
    /// One weight row per class, each `total_dim` wide.
    pub coef: Vec<Vec<f64>>,
    /// One intercept per class.
    pub intercept: Vec<f64>,
}

/// Numerically stable softmax: subtract the max logit before
/// exponentiating, then normalize.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|&e| e / sum).collect()
}

impl LinearClassifier {
    /// Fit a multinomial logistic regression on the full concatenated
    /// feature vectors.
    ///
    /// # Errors
    ///
    /// Zero examples or an example/label count mismatch is a fatal
    /// configuration error. A single-class corpus is legal and yields a
    /// trivial model that always predicts that class.
    pub fn train(x: &[SparseVector], labels: &[String], config: &TrainConfig) -> Result<Self> {
        if x.is_empty() {
            return Err(FormcastError::train("no training examples"));
        }
        if x.len() != labels.len() {
            return Err(FormcastError::train(format!(
                "{} examples but {} labels",
                x.len(),
                labels.len()
            )));
        }
        let dim = x[0].dim();
        if x.iter().any(|v| v.dim() != dim) {
            return Err(FormcastError::train(
                "training vectors have inconsistent dimensions",
            ));
        }

        // Canonical class order: first occurrence in the label stream.
        let mut classes: Vec<String> = Vec::new();
        let mut y: Vec<usize> = Vec::with_capacity(labels.len());
        for label in labels {
            let idx = match classes.iter().position(|c| c == label) {
                Some(idx) => idx,
                None => {
                    classes.push(label.clone());
                    classes.len() - 1
                }
            };
            y.push(idx);
        }

        let n = x.len();
        let k = classes.len();
        let c_reg = if config.c > 0.0 { config.c } else { 5.0 };

        let sample_weights = if config.balance_classes {
            let mut counts = vec![0usize; k];
            for &yi in &y {
                counts[yi] += 1;
            }
            y.iter()
                .map(|&yi| n as f64 / (k as f64 * counts[yi] as f64))
                .collect()
        } else {
            vec![1.0; n]
        };

        let mut coef = vec![vec![0.0; dim]; k];
        let mut intercept = vec![0.0; k];
        let mut step = 1.0;

        for iter in 0..config.max_iter {
            let (loss, grad_w, grad_b) =
                objective_and_gradient(x, &y, &sample_weights, &coef, &intercept, c_reg);

            let sup_norm = grad_sup_norm(&grad_w, &grad_b);
            log::debug!("train iter {iter}: loss {loss:.6}, grad sup-norm {sup_norm:.2e}");
            if sup_norm < GRADIENT_TOLERANCE {
                break;
            }

            let grad_sq: f64 = grad_w
                .iter()
                .flat_map(|row| row.iter())
                .chain(grad_b.iter())
                .map(|g| g * g)
                .sum();

            // Armijo backtracking from the (doubled) previous step size.
            let mut t = step;
            loop {
                let (cand_w, cand_b) = descend(&coef, &intercept, &grad_w, &grad_b, t);
                let cand_loss =
                    objective(x, &y, &sample_weights, &cand_w, &cand_b, c_reg);
                if cand_loss <= loss - 1e-4 * t * grad_sq || t < 1e-12 {
                    coef = cand_w;
                    intercept = cand_b;
                    break;
                }
                t *= 0.5;
            }
            step = (t * 2.0).min(1.0);
        }

        Ok(Self {
            classes,
            coef,
            intercept,
        })
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Per-class logits for a feature vector.
    pub fn logits(&self, features: &SparseVector) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| features.dot(row) + b)
            .collect()
    }

    /// Softmax probability for each class, in canonical class order.
    pub fn predict_proba(&self, features: &SparseVector) -> Vec<f64> {
        softmax(&self.logits(features))
    }

    /// The class with the strictly greatest probability. Ties resolve to
    /// the earlier class in canonical order: classes are scanned in order
    /// with a strict `>` comparison, so the first class reaching the best
    /// probability wins.
    pub fn predict(&self, features: &SparseVector) -> &str {
        let probs = self.predict_proba(features);
        let mut best = 0;
        let mut best_prob = f64::NEG_INFINITY;
        for (idx, &p) in probs.iter().enumerate() {
            if p > best_prob {
                best_prob = p;
                best = idx;
            }
        }
        &self.classes[best]
    }
}

fn grad_sup_norm(grad_w: &[Vec<f64>], grad_b: &[f64]) -> f64 {
    grad_w
        .iter()
        .flat_map(|row| row.iter())
        .chain(grad_b.iter())
        .fold(0.0, |acc, g| acc.max(g.abs()))
}

fn descend(
    coef: &[Vec<f64>],
    intercept: &[f64],
    grad_w: &[Vec<f64>],
    grad_b: &[f64],
    t: f64,
) -> (Vec<Vec<f64>>, Vec<f64>) {
    let cand_w = coef
        .iter()
        .zip(grad_w)
        .map(|(row, grow)| row.iter().zip(grow).map(|(w, g)| w - t * g).collect())
        .collect();
    let cand_b = intercept
        .iter()
        .zip(grad_b)
        .map(|(b, g)| b - t * g)
        .collect();
    (cand_w, cand_b)
}

/// Weighted cross-entropy plus L2 penalty.
fn objective(
    x: &[SparseVector],
    y: &[usize],
    sample_weights: &[f64],
    coef: &[Vec<f64>],
    intercept: &[f64],
    c_reg: f64,
) -> f64 {
    let mut loss = 0.0;
    for ((xi, &yi), &sw) in x.iter().zip(y).zip(sample_weights) {
        let logits: Vec<f64> = coef
            .iter()
            .zip(intercept)
            .map(|(row, b)| xi.dot(row) + b)
            .collect();
        loss -= sw * log_softmax_at(&logits, yi);
    }
    let penalty: f64 = coef
        .iter()
        .flat_map(|row| row.iter())
        .map(|w| w * w)
        .sum();
    loss + penalty / c_reg
}

fn objective_and_gradient(
    x: &[SparseVector],
    y: &[usize],
    sample_weights: &[f64],
    coef: &[Vec<f64>],
    intercept: &[f64],
    c_reg: f64,
) -> (f64, Vec<Vec<f64>>, Vec<f64>) {
    let k = coef.len();
    let dim = coef.first().map(|row| row.len()).unwrap_or(0);
    let mut loss = 0.0;
    let mut grad_w = vec![vec![0.0; dim]; k];
    let mut grad_b = vec![0.0; k];

    for ((xi, &yi), &sw) in x.iter().zip(y).zip(sample_weights) {
        let logits: Vec<f64> = coef
            .iter()
            .zip(intercept)
            .map(|(row, b)| xi.dot(row) + b)
            .collect();
        loss -= sw * log_softmax_at(&logits, yi);

        let probs = softmax(&logits);
        for c in 0..k {
            let indicator = if c == yi { 1.0 } else { 0.0 };
            let g = sw * (probs[c] - indicator);
            grad_b[c] += g;
            for (idx, value) in xi.iter() {
                grad_w[c][idx] += g * value;
            }
        }
    }

    for (grow, row) in grad_w.iter_mut().zip(coef) {
        for (g, w) in grow.iter_mut().zip(row) {
            *g += 2.0 * w / c_reg;
        }
    }
    let penalty: f64 = coef
        .iter()
        .flat_map(|row| row.iter())
        .map(|w| w * w)
        .sum();

    (loss + penalty / c_reg, grad_w, grad_b)
}

/// `log(softmax(logits)[target])` computed without forming the softmax.
fn log_softmax_at(logits: &[f64], target: usize) -> f64 {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum_exp: f64 = logits
        .iter()
        .map(|&z| (z - max).exp())
        .sum::<f64>()
        .ln();
    logits[target] - max - log_sum_exp
}
