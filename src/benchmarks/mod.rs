//! Named benchmark matrix over the three engine families.
//!
//! The registry is built once from a [`RunConfig`] and only read afterwards.
//! Variants that crash on known hardware stay listed as
//! [`BenchmarkEntry::Disabled`] so `list` can explain why they do not run.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::config::RunConfig;
use crate::dataset::DatasetError;
use crate::engine::params::{LgbDevice, XgbGrowPolicy, XgbObjective, XgbTreeMethod};
use crate::engine::{
    CatParams, CatPatch, Device, EngineError, EngineKind, EngineParams, LgbParams, LgbPatch,
    XgbParams, XgbPatch,
};
use crate::metrics::{MetricError, MetricKind};

pub mod report;
pub mod runner;

pub use report::{BenchmarkReport, DatasetSummary, SystemInfo};
pub use runner::{BenchmarkOutcome, Runner};

#[derive(Debug, Error)]
pub enum BenchmarkError {
    #[error("Unknown benchmark `{0}`")]
    Unknown(String),
    #[error("Benchmark `{name}` is disabled, environment unsupported: {reason}")]
    Disabled { name: String, reason: &'static str },
    #[error("No {0} engine available for this run")]
    EngineUnavailable(EngineKind),
    #[error("Benchmark `{name}` failed in the engine: {source}")]
    Engine { name: String, source: EngineError },
    #[error("Benchmark `{name}` could not be scored: {source}")]
    Metric { name: String, source: MetricError },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// A benchmark that can be trained and scored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunnableBenchmark {
    pub engine: EngineKind,
    pub device: Device,
    pub metric: MetricKind,
    pub params: EngineParams,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BenchmarkEntry {
    Runnable(RunnableBenchmark),
    Disabled {
        engine: EngineKind,
        device: Device,
        reason: &'static str,
    },
}

impl BenchmarkEntry {
    pub fn engine(&self) -> EngineKind {
        match self {
            BenchmarkEntry::Runnable(bench) => bench.engine,
            BenchmarkEntry::Disabled { engine, .. } => *engine,
        }
    }

    pub fn device(&self) -> Device {
        match self {
            BenchmarkEntry::Runnable(bench) => bench.device,
            BenchmarkEntry::Disabled { device, .. } => *device,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, BenchmarkEntry::Runnable(_))
    }
}

/// Immutable name -> entry table, iterated in name order.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkRegistry {
    entries: BTreeMap<&'static str, BenchmarkEntry>,
}

const XGB_GPU_DISABLED: &str = "illegal memory access in the GPU exact updater";
const CAT_GPU_DISABLED: &str = "segfaults";

impl BenchmarkRegistry {
    /// The standard airline matrix: XGBoost, LightGBM and CatBoost on CPU and GPU.
    pub fn airline(config: &RunConfig) -> Self {
        let n_trees = config.n_trees;
        let threads = Some(config.effective_threads());
        let overrides = &config.overrides;

        let xgb = |patch: XgbPatch| {
            EngineParams::XGBoost(
                XgbParams::base(n_trees)
                    .patched(&patch)
                    .patched(&overrides.xgboost),
            )
        };
        let lgb = |patch: LgbPatch| {
            EngineParams::LightGbm(
                LgbParams::base(n_trees)
                    .patched(&patch)
                    .patched(&overrides.lightgbm),
            )
        };
        let cat = |patch: CatPatch| {
            EngineParams::CatBoost(
                CatParams::base(n_trees)
                    .patched(&patch)
                    .patched(&overrides.catboost),
            )
        };
        let runnable = |device: Device, metric: MetricKind, params: EngineParams| {
            BenchmarkEntry::Runnable(RunnableBenchmark {
                engine: params.kind(),
                device,
                metric,
                params,
            })
        };

        let mut entries = BTreeMap::new();
        entries.insert(
            "xgb-cpu",
            runnable(
                Device::Cpu,
                MetricKind::BinaryProbability,
                xgb(XgbPatch {
                    tree_method: Some(XgbTreeMethod::Exact),
                    nthread: threads,
                    ..XgbPatch::default()
                }),
            ),
        );
        entries.insert(
            "xgb-cpu-hist",
            runnable(
                Device::Cpu,
                MetricKind::BinaryProbability,
                xgb(XgbPatch {
                    nthread: threads,
                    grow_policy: Some(XgbGrowPolicy::Lossguide),
                    tree_method: Some(XgbTreeMethod::Hist),
                    ..XgbPatch::default()
                }),
            ),
        );
        entries.insert(
            "xgb-gpu",
            BenchmarkEntry::Disabled {
                engine: EngineKind::XGBoost,
                device: Device::Gpu,
                reason: XGB_GPU_DISABLED,
            },
        );
        entries.insert(
            "xgb-gpu-hist",
            runnable(
                Device::Gpu,
                MetricKind::BinaryProbability,
                xgb(XgbPatch {
                    tree_method: Some(XgbTreeMethod::GpuHist),
                    objective: Some(XgbObjective::GpuBinaryLogistic),
                    ..XgbPatch::default()
                }),
            ),
        );
        entries.insert(
            "lgbm-cpu",
            runnable(
                Device::Cpu,
                MetricKind::BinaryProbability,
                lgb(LgbPatch {
                    nthread: threads,
                    ..LgbPatch::default()
                }),
            ),
        );
        entries.insert(
            "lgbm-gpu",
            runnable(
                Device::Gpu,
                MetricKind::BinaryProbability,
                lgb(LgbPatch {
                    device: Some(LgbDevice::Gpu),
                    ..LgbPatch::default()
                }),
            ),
        );
        entries.insert(
            "cat-cpu",
            runnable(
                Device::Cpu,
                MetricKind::CategoricalArgmax,
                cat(CatPatch {
                    thread_count: threads,
                    ..CatPatch::default()
                }),
            ),
        );
        entries.insert(
            "cat-gpu",
            BenchmarkEntry::Disabled {
                engine: EngineKind::CatBoost,
                device: Device::Gpu,
                reason: CAT_GPU_DISABLED,
            },
        );
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&BenchmarkEntry> {
        self.entries.get(name)
    }

    /// The runnable benchmark called `name`, or why it cannot run.
    pub fn runnable(&self, name: &str) -> Result<&RunnableBenchmark, BenchmarkError> {
        match self.entries.get(name) {
            Some(BenchmarkEntry::Runnable(bench)) => Ok(bench),
            Some(BenchmarkEntry::Disabled { reason, .. }) => Err(BenchmarkError::Disabled {
                name: name.to_string(),
                reason: *reason,
            }),
            None => Err(BenchmarkError::Unknown(name.to_string())),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn enabled_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.is_enabled())
            .map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &BenchmarkEntry)> + '_ {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
