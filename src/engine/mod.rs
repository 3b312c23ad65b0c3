//! Training-engine seam.
//!
//! Gradient-boosting libraries are plugged in behind [`TrainingEngine`]; the
//! harness only hands them typed parameters and feature matrices and reads
//! back probabilities. [`StumpEngine`] is the in-tree implementation.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod params;
mod stump;

pub use params::{
    CatParams, CatPatch, DEFAULT_TREES, EngineParams, LgbParams, LgbPatch, XgbParams, XgbPatch,
};
pub use stump::{BoostedStumps, StumpEngine};

/// Engine family a benchmark is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EngineKind {
    #[serde(rename = "xgboost")]
    XGBoost,
    #[serde(rename = "lightgbm")]
    LightGbm,
    #[serde(rename = "catboost")]
    CatBoost,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::XGBoost, EngineKind::LightGbm, EngineKind::CatBoost];

    pub const fn name(self) -> &'static str {
        match self {
            EngineKind::XGBoost => "xgboost",
            EngineKind::LightGbm => "lightgbm",
            EngineKind::CatBoost => "catboost",
        }
    }

    /// Prediction layout the engine family returns.
    pub const fn output(self) -> OutputLayout {
        match self {
            EngineKind::CatBoost => OutputLayout::PerClass,
            EngineKind::XGBoost | EngineKind::LightGbm => OutputLayout::Binary,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Hardware target of a benchmark variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    Cpu,
    Gpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// One probability of the positive class per row.
    Binary,
    /// One column per class.
    PerClass,
}

/// Model output on a feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum Predictions {
    /// `P(label = 1)` per row.
    Binary(Array1<f32>),
    /// `rows x classes` probabilities.
    PerClass(Array2<f32>),
}

impl Predictions {
    pub fn len(&self) -> usize {
        match self {
            Predictions::Binary(p) => p.len(),
            Predictions::PerClass(p) => p.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{engine} engine received {found} parameters")]
    ParamsMismatch { engine: EngineKind, found: EngineKind },
    #[error("invalid training input: {0}")]
    InvalidInput(String),
    #[error("feature matrix has {found} columns, model expects {expected}")]
    FeatureCount { expected: usize, found: usize },
}

/// A gradient-boosting library as seen by the harness.
pub trait TrainingEngine {
    fn kind(&self) -> EngineKind;

    /// Human-readable implementation name for reports.
    fn label(&self) -> String {
        self.kind().to_string()
    }

    fn train(
        &self,
        params: &EngineParams,
        x: ArrayView2<'_, f32>,
        y: ArrayView1<'_, u8>,
    ) -> Result<Box<dyn TrainedModel>, EngineError>;
}

/// A fitted model handle.
pub trait TrainedModel {
    fn predict(&self, x: ArrayView2<'_, f32>) -> Result<Predictions, EngineError>;
}

/// Engine implementations available to a run, one per family.
#[derive(Default)]
pub struct EngineSet {
    engines: BTreeMap<EngineKind, Box<dyn TrainingEngine>>,
}

impl EngineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-tree stump booster bound to every family.
    pub fn builtin() -> Self {
        let mut set = Self::new();
        for kind in EngineKind::ALL {
            set.insert(Box::new(StumpEngine::new(kind)));
        }
        set
    }

    /// Bind `engine` to its family, replacing any previous binding.
    pub fn insert(&mut self, engine: Box<dyn TrainingEngine>) {
        self.engines.insert(engine.kind(), engine);
    }

    pub fn get(&self, kind: EngineKind) -> Option<&dyn TrainingEngine> {
        self.engines.get(&kind).map(|engine| engine.as_ref())
    }

    pub fn kinds(&self) -> impl Iterator<Item = EngineKind> + '_ {
        self.engines.keys().copied()
    }
}

impl fmt::Debug for EngineSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.engines.values().map(|engine| engine.label()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_set_covers_every_family() {
        let set = EngineSet::builtin();
        assert_eq!(set.kinds().collect::<Vec<_>>(), EngineKind::ALL.to_vec());
        assert_eq!(set.get(EngineKind::CatBoost).unwrap().kind(), EngineKind::CatBoost);
    }

    #[test]
    fn only_catboost_returns_per_class_columns() {
        assert_eq!(EngineKind::CatBoost.output(), OutputLayout::PerClass);
        assert_eq!(EngineKind::XGBoost.output(), OutputLayout::Binary);
        assert_eq!(EngineKind::LightGbm.output(), OutputLayout::Binary);
    }
}
