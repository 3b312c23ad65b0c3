//! Scoring for binary delay classifiers.

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Predictions;

/// Probability above which a row is predicted delayed.
pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    #[error("{labels} labels but {predictions} predictions")]
    LengthMismatch { labels: usize, predictions: usize },
    #[error("{metric} metrics cannot score {found} predictions")]
    UnexpectedPredictions {
        metric: &'static str,
        found: &'static str,
    },
}

/// 2x2 confusion matrix (`counts[truth][predicted]`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[u64; 2]; 2],
}

impl ConfusionMatrix {
    pub fn from_labels(truth: ArrayView1<'_, u8>, predicted: ArrayView1<'_, u8>) -> Self {
        let mut cm = Self::default();
        for (&t, &p) in truth.iter().zip(predicted.iter()) {
            if t > 1 || p > 1 {
                continue;
            }
            cm.counts[t as usize][p as usize] += 1;
        }
        cm
    }

    pub fn true_positives(&self) -> u64 {
        self.counts[1][1]
    }

    pub fn false_positives(&self) -> u64 {
        self.counts[0][1]
    }

    pub fn false_negatives(&self) -> u64 {
        self.counts[1][0]
    }

    pub fn true_negatives(&self) -> u64 {
        self.counts[0][0]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Metrics reported for every benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// `None` when the labels contain a single class.
    pub auc: Option<f64>,
    pub confusion: ConfusionMatrix,
}

/// How a benchmark's predictions are turned into [`BinaryMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Threshold `P(label = 1)` at 0.5; AUC over the probabilities.
    BinaryProbability,
    /// Argmax over per-class columns, then binary metrics on the hard labels.
    CategoricalArgmax,
}

impl MetricKind {
    pub const fn name(self) -> &'static str {
        match self {
            MetricKind::BinaryProbability => "binary_probability",
            MetricKind::CategoricalArgmax => "categorical_argmax",
        }
    }

    pub fn score(
        self,
        y_true: ArrayView1<'_, u8>,
        predictions: &Predictions,
    ) -> Result<BinaryMetrics, MetricError> {
        if y_true.len() != predictions.len() {
            return Err(MetricError::LengthMismatch {
                labels: y_true.len(),
                predictions: predictions.len(),
            });
        }
        match (self, predictions) {
            (MetricKind::BinaryProbability, Predictions::Binary(prob)) => {
                Ok(binary_prob_metrics(y_true, prob.view()))
            }
            (MetricKind::BinaryProbability, Predictions::PerClass(prob)) if prob.ncols() == 2 => {
                Ok(binary_prob_metrics(y_true, prob.column(1)))
            }
            (MetricKind::CategoricalArgmax, Predictions::PerClass(prob)) => {
                Ok(categorical_metrics(y_true, prob.view()))
            }
            (_, Predictions::Binary(_)) => Err(MetricError::UnexpectedPredictions {
                metric: self.name(),
                found: "binary",
            }),
            (_, Predictions::PerClass(_)) => Err(MetricError::UnexpectedPredictions {
                metric: self.name(),
                found: "multi-column",
            }),
        }
    }
}

/// Accuracy, precision, recall and F1 at [`DECISION_THRESHOLD`], plus ROC AUC over `y_prob`.
pub fn binary_prob_metrics(y_true: ArrayView1<'_, u8>, y_prob: ArrayView1<'_, f32>) -> BinaryMetrics {
    let predicted: Array1<u8> = y_prob
        .iter()
        .map(|&p| u8::from(p > DECISION_THRESHOLD))
        .collect();
    let confusion = ConfusionMatrix::from_labels(y_true, predicted.view());
    let ratio = |num: u64, den: u64| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let tp = confusion.true_positives();
    let precision = ratio(tp, tp + confusion.false_positives());
    let recall = ratio(tp, tp + confusion.false_negatives());
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    BinaryMetrics {
        accuracy: ratio(tp + confusion.true_negatives(), confusion.total()),
        precision,
        recall,
        f1,
        auc: roc_auc(y_true, y_prob),
        confusion,
    }
}

/// Argmax over each row of `per_class`, then [`binary_prob_metrics`] on the hard labels.
///
/// The AUC is therefore computed on 0/1 scores, not on the class probabilities.
pub fn categorical_metrics(y_true: ArrayView1<'_, u8>, per_class: ArrayView2<'_, f32>) -> BinaryMetrics {
    let hard: Array1<f32> = per_class
        .rows()
        .into_iter()
        .map(|row| argmax(row) as f32)
        .collect();
    binary_prob_metrics(y_true, hard.view())
}

/// Area under the ROC curve via the rank-sum statistic; tied scores share their average rank.
pub fn roc_auc(y_true: ArrayView1<'_, u8>, scores: ArrayView1<'_, f32>) -> Option<f64> {
    let mut order: Vec<usize> = (0..y_true.len().min(scores.len())).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let positives = order.iter().filter(|&&i| y_true[i] == 1).count();
    let negatives = order.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut positive_rank_sum = 0.0f64;
    let mut start = 0usize;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks are 1-based; the tie group covers ranks start+1..=end.
        let average_rank = (start + 1 + end) as f64 / 2.0;
        let group_positives = order[start..end].iter().filter(|&&i| y_true[i] == 1).count();
        positive_rank_sum += average_rank * group_positives as f64;
        start = end;
    }
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

fn argmax(row: ArrayView1<'_, f32>) -> usize {
    let mut best_idx = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &v) in row.iter().enumerate() {
        if v > best_val {
            best_val = v;
            best_idx = idx;
        }
    }
    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    #[test]
    fn hand_computed_binary_metrics() {
        let y = arr1(&[1u8, 0, 1, 1, 0, 0]);
        let p = arr1(&[0.9f32, 0.2, 0.4, 0.7, 0.6, 0.1]);
        let m = binary_prob_metrics(y.view(), p.view());
        assert_eq!(m.confusion.counts, [[2, 1], [1, 2]]);
        assert!((m.accuracy - 4.0 / 6.0).abs() < 1e-12);
        assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
        // 8 of 9 positive/negative pairs are ordered correctly.
        assert!((m.auc.unwrap() - 8.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn threshold_is_strict() {
        let y = arr1(&[1u8, 0]);
        let p = arr1(&[0.5f32, 0.5]);
        let m = binary_prob_metrics(y.view(), p.view());
        assert_eq!(m.confusion.true_positives(), 0);
        assert_eq!(m.confusion.true_negatives(), 1);
        assert_eq!(m.auc, Some(0.5));
    }

    #[test]
    fn auc_is_none_for_single_class() {
        let y = arr1(&[1u8, 1]);
        let p = arr1(&[0.3f32, 0.8]);
        assert_eq!(roc_auc(y.view(), p.view()), None);
    }

    #[test]
    fn categorical_argmax_scores_hard_labels() {
        let y = arr1(&[1u8, 0, 1]);
        let per_class = Predictions::PerClass(arr2(&[[0.2f32, 0.8], [0.7, 0.3], [0.6, 0.4]]));
        let m = MetricKind::CategoricalArgmax.score(y.view(), &per_class).unwrap();
        assert_eq!(m.confusion.counts, [[1, 0], [1, 1]]);
        assert_eq!(m.auc, Some(0.75));
    }

    #[test]
    fn mismatched_inputs_are_errors() {
        let y = arr1(&[1u8, 0]);
        let binary = Predictions::Binary(arr1(&[0.1f32]));
        assert_eq!(
            MetricKind::BinaryProbability.score(y.view(), &binary),
            Err(MetricError::LengthMismatch {
                labels: 2,
                predictions: 1
            })
        );
        let binary = Predictions::Binary(arr1(&[0.1f32, 0.9]));
        assert!(matches!(
            MetricKind::CategoricalArgmax.score(y.view(), &binary),
            Err(MetricError::UnexpectedPredictions { .. })
        ));
        let two_col = Predictions::PerClass(arr2(&[[0.9f32, 0.1], [0.2, 0.8]]));
        let m = MetricKind::BinaryProbability.score(y.view(), &two_col).unwrap();
        assert_eq!(m.auc, Some(0.0));
    }
}
