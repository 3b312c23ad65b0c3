use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use super::{BenchmarkError, BenchmarkRegistry, RunnableBenchmark};
use crate::dataset::PreparedData;
use crate::engine::{Device, EngineKind, EngineSet};
use crate::metrics::{BinaryMetrics, MetricKind};

/// Result of training and scoring one benchmark.
#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkOutcome {
    pub name: String,
    pub engine: EngineKind,
    /// Implementation that served the engine family.
    pub implementation: String,
    pub device: Device,
    pub metric: MetricKind,
    pub params: BTreeMap<String, String>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_ms: f64,
    pub test_ms: f64,
    pub metrics: BinaryMetrics,
}

/// Trains, predicts and scores registry entries against a prepared split.
pub struct Runner<'a> {
    registry: &'a BenchmarkRegistry,
    engines: &'a EngineSet,
}

impl<'a> Runner<'a> {
    pub fn new(registry: &'a BenchmarkRegistry, engines: &'a EngineSet) -> Self {
        Self { registry, engines }
    }

    /// Run `names` in order.
    ///
    /// Every name is resolved before anything is trained, so a disabled or
    /// unknown benchmark, or a missing engine, fails the whole call up front.
    pub fn run<S: AsRef<str>>(
        &self,
        data: &PreparedData,
        names: &[S],
    ) -> Result<Vec<BenchmarkOutcome>, BenchmarkError> {
        let mut planned = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let bench = self.registry.runnable(name)?;
            if self.engines.get(bench.engine).is_none() {
                return Err(BenchmarkError::EngineUnavailable(bench.engine));
            }
            planned.push((name, bench));
        }
        planned
            .into_iter()
            .map(|(name, bench)| self.run_one(name, bench, data))
            .collect()
    }

    fn run_one(
        &self,
        name: &str,
        bench: &RunnableBenchmark,
        data: &PreparedData,
    ) -> Result<BenchmarkOutcome, BenchmarkError> {
        let engine = self
            .engines
            .get(bench.engine)
            .ok_or(BenchmarkError::EngineUnavailable(bench.engine))?;
        let engine_error = |source| BenchmarkError::Engine {
            name: name.to_string(),
            source,
        };
        tracing::info!(
            benchmark = name,
            engine = %engine.label(),
            rounds = bench.params.rounds(),
            "Training"
        );

        let started = Instant::now();
        let model = engine
            .train(&bench.params, data.train.x(), data.train.y())
            .map_err(engine_error)?;
        let train_ms = started.elapsed().as_secs_f64() * 1000.0;

        let started = Instant::now();
        let predictions = model.predict(data.test.x()).map_err(engine_error)?;
        let test_ms = started.elapsed().as_secs_f64() * 1000.0;

        let metrics = bench
            .metric
            .score(data.test.y(), &predictions)
            .map_err(|source| BenchmarkError::Metric {
                name: name.to_string(),
                source,
            })?;
        tracing::info!(
            benchmark = name,
            train_ms,
            test_ms,
            accuracy = metrics.accuracy,
            "Finished"
        );

        Ok(BenchmarkOutcome {
            name: name.to_string(),
            engine: bench.engine,
            implementation: engine.label(),
            device: bench.device,
            metric: bench.metric,
            params: bench.params.to_param_map(),
            train_rows: data.train.len(),
            test_rows: data.test.len(),
            train_ms,
            test_ms,
            metrics,
        })
    }
}
