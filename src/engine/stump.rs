//! Deterministic gradient-boosted decision stumps for binary classification.
//!
//! A lightweight logistic-loss booster: each round fits one single-split tree
//! on histogram-binned features using second-order (Newton) leaf values. It
//! stands in for a native library so the whole harness runs without one.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use super::{
    EngineError, EngineKind, EngineParams, OutputLayout, Predictions, TrainedModel, TrainingEngine,
};

/// Histogram bins per feature used for split search.
pub const DEFAULT_BINS: usize = 32;

/// Single-split tree used as the weak learner.
#[derive(Debug, Clone, PartialEq)]
pub struct Stump {
    pub feature_index: u16,
    /// Rows with `feature < threshold` take `left_value`.
    pub threshold: f32,
    pub left_value: f32,
    pub right_value: f32,
}

impl Stump {
    pub fn predict(&self, row: ArrayView1<'_, f32>) -> f32 {
        let value = row
            .get(self.feature_index as usize)
            .copied()
            .unwrap_or(0.0);
        if value < self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Fitted stump ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct BoostedStumps {
    pub feature_count: usize,
    pub learning_rate: f32,
    /// Log-odds before any round.
    pub init_raw: f32,
    pub stumps: Vec<Stump>,
    pub layout: OutputLayout,
}

impl BoostedStumps {
    pub fn predict_raw(&self, row: ArrayView1<'_, f32>) -> f32 {
        self.stumps
            .iter()
            .fold(self.init_raw, |raw, stump| raw + self.learning_rate * stump.predict(row))
    }

    /// `P(label = 1)` for every row.
    pub fn predict_proba(&self, x: ArrayView2<'_, f32>) -> Array1<f32> {
        x.rows()
            .into_iter()
            .map(|row| sigmoid(self.predict_raw(row)))
            .collect()
    }
}

impl TrainedModel for BoostedStumps {
    fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Predictions, EngineError> {
        if x.ncols() != self.feature_count {
            return Err(EngineError::FeatureCount {
                expected: self.feature_count,
                found: x.ncols(),
            });
        }
        let proba = self.predict_proba(x);
        Ok(match self.layout {
            OutputLayout::Binary => Predictions::Binary(proba),
            OutputLayout::PerClass => Predictions::PerClass(Array2::from_shape_fn(
                (proba.len(), 2),
                |(row, class)| if class == 1 { proba[row] } else { 1.0 - proba[row] },
            )),
        })
    }
}

/// In-tree engine bound to one family; it reads that family's parameters.
#[derive(Debug, Clone)]
pub struct StumpEngine {
    kind: EngineKind,
    bins: usize,
}

impl StumpEngine {
    pub fn new(kind: EngineKind) -> Self {
        Self {
            kind,
            bins: DEFAULT_BINS,
        }
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins.clamp(2, 256);
        self
    }
}

impl TrainingEngine for StumpEngine {
    fn kind(&self) -> EngineKind {
        self.kind
    }

    fn label(&self) -> String {
        format!("stumps/{}", self.kind)
    }

    fn train(
        &self,
        params: &EngineParams,
        x: ArrayView2<'_, f32>,
        y: ArrayView1<'_, u8>,
    ) -> Result<Box<dyn TrainedModel>, EngineError> {
        if params.kind() != self.kind {
            return Err(EngineError::ParamsMismatch {
                engine: self.kind,
                found: params.kind(),
            });
        }
        let model = train_stumps(params, x, y, self.bins, self.kind.output())?;
        Ok(Box::new(model))
    }
}

fn sigmoid(raw: f32) -> f32 {
    1.0 / (1.0 + (-raw).exp())
}

fn train_stumps(
    params: &EngineParams,
    x: ArrayView2<'_, f32>,
    y: ArrayView1<'_, u8>,
    bins: usize,
    layout: OutputLayout,
) -> Result<BoostedStumps, EngineError> {
    if x.nrows() != y.len() {
        return Err(EngineError::InvalidInput(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if x.nrows() == 0 {
        return Err(EngineError::InvalidInput("empty training set".to_string()));
    }
    if let Some(bad) = y.iter().find(|&&label| label > 1) {
        return Err(EngineError::InvalidInput(format!("label {bad} is not binary")));
    }

    let n = x.nrows();
    let bins = bins.clamp(2, 256);
    let learning_rate = params.learning_rate() as f32;
    let lambda = params.l2_regularization().max(0.0);
    let pos_weight = params.positive_weight().max(0.0);
    let weights: Vec<f64> = y
        .iter()
        .map(|&label| if label == 1 { pos_weight } else { 1.0 })
        .collect();

    let ranges = feature_ranges(x);
    let binned = bin_features(x, &ranges, bins);

    let positive: f64 = y
        .iter()
        .zip(&weights)
        .filter(|(label, _)| **label == 1)
        .map(|(_, w)| w)
        .sum();
    let total: f64 = weights.iter().sum();
    let prior = (positive / total.max(f64::MIN_POSITIVE)).clamp(1e-6, 1.0 - 1e-6);
    let init_raw = (prior / (1.0 - prior)).ln() as f32;

    let mut raw = vec![init_raw; n];
    let mut stumps = Vec::with_capacity(params.rounds());
    let mut grad = vec![0.0f64; n];
    let mut hess = vec![0.0f64; n];
    for _round in 0..params.rounds() {
        for i in 0..n {
            let p = sigmoid(raw[i]) as f64;
            let target = f64::from(y[i]);
            grad[i] = weights[i] * (target - p);
            hess[i] = weights[i] * p * (1.0 - p);
        }
        let split = best_split(&binned, ranges.len(), &grad, &hess, bins, lambda);
        let stump = fit_stump(x, &ranges, &split, bins, &grad, &hess, lambda);
        for (i, row) in x.rows().into_iter().enumerate() {
            raw[i] += learning_rate * stump.predict(row);
        }
        stumps.push(stump);
    }

    Ok(BoostedStumps {
        feature_count: x.ncols(),
        learning_rate,
        init_raw,
        stumps,
        layout,
    })
}

#[derive(Debug, Clone, Copy)]
struct FeatureRange {
    min: f32,
    max: f32,
}

impl FeatureRange {
    fn width(&self, bins: usize) -> f32 {
        (self.max - self.min) / bins as f32
    }

    fn bin(&self, value: f32, bins: usize) -> u8 {
        if !value.is_finite() || self.max <= self.min {
            return 0;
        }
        let t = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        ((t * bins as f32).floor() as usize).min(bins - 1) as u8
    }

    fn threshold(&self, split_bin: usize, bins: usize) -> f32 {
        self.min + (split_bin + 1) as f32 * self.width(bins)
    }
}

fn feature_ranges(x: ArrayView2<'_, f32>) -> Vec<FeatureRange> {
    x.columns()
        .into_iter()
        .map(|column| {
            let (min, max) = column
                .iter()
                .filter(|v| v.is_finite())
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            if min.is_finite() && max.is_finite() {
                FeatureRange { min, max }
            } else {
                FeatureRange { min: 0.0, max: 0.0 }
            }
        })
        .collect()
}

/// Row-major `n x d` bin indices.
fn bin_features(x: ArrayView2<'_, f32>, ranges: &[FeatureRange], bins: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(x.len());
    for row in x.rows() {
        for (value, range) in row.iter().zip(ranges) {
            out.push(range.bin(*value, bins));
        }
    }
    out
}

#[derive(Debug, Clone)]
struct BestSplit {
    gain: f64,
    feature_index: usize,
    split_bin: usize,
}

fn leaf_score(g: f64, h: f64, lambda: f64) -> f64 {
    g * g / (h + lambda).max(1e-12)
}

fn best_split(
    binned: &[u8],
    n_features: usize,
    grad: &[f64],
    hess: &[f64],
    bins: usize,
    lambda: f64,
) -> Option<BestSplit> {
    let mut g_hist = vec![0.0f64; n_features * bins];
    let mut h_hist = vec![0.0f64; n_features * bins];
    for (i, row) in binned.chunks_exact(n_features.max(1)).enumerate() {
        for (feature, &b) in row.iter().enumerate() {
            let slot = feature * bins + b as usize;
            g_hist[slot] += grad[i];
            h_hist[slot] += hess[i];
        }
    }

    let mut best: Option<BestSplit> = None;
    for feature in 0..n_features {
        let g_bins = &g_hist[feature * bins..(feature + 1) * bins];
        let h_bins = &h_hist[feature * bins..(feature + 1) * bins];
        let g_total: f64 = g_bins.iter().sum();
        let h_total: f64 = h_bins.iter().sum();
        let parent = leaf_score(g_total, h_total, lambda);
        let (mut g_left, mut h_left) = (0.0f64, 0.0f64);
        for split_bin in 0..bins - 1 {
            g_left += g_bins[split_bin];
            h_left += h_bins[split_bin];
            let h_right = h_total - h_left;
            if h_left <= 0.0 || h_right <= 0.0 {
                continue;
            }
            let gain = leaf_score(g_left, h_left, lambda)
                + leaf_score(g_total - g_left, h_right, lambda)
                - parent;
            if best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(BestSplit {
                    gain,
                    feature_index: feature,
                    split_bin,
                });
            }
        }
    }
    best
}

// Leaf values are recomputed with the threshold rule `predict` uses.
fn fit_stump(
    x: ArrayView2<'_, f32>,
    ranges: &[FeatureRange],
    split: &Option<BestSplit>,
    bins: usize,
    grad: &[f64],
    hess: &[f64],
    lambda: f64,
) -> Stump {
    let (feature_index, threshold) = match split {
        Some(split) => (
            split.feature_index,
            ranges[split.feature_index].threshold(split.split_bin, bins),
        ),
        None => (0, f32::INFINITY),
    };
    let (mut g_left, mut h_left, mut g_right, mut h_right) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    for (i, row) in x.rows().into_iter().enumerate() {
        let value = row.get(feature_index).copied().unwrap_or(0.0);
        if value < threshold {
            g_left += grad[i];
            h_left += hess[i];
        } else {
            g_right += grad[i];
            h_right += hess[i];
        }
    }
    let leaf = |g: f64, h: f64| (g / (h + lambda).max(1e-12)) as f32;
    Stump {
        feature_index: feature_index as u16,
        threshold,
        left_value: leaf(g_left, h_left),
        right_value: leaf(g_right, h_right),
    }
}
