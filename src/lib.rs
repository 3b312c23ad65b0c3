//! Library exports for the airline benchmark binary, integration tests and benches.
/// Application directory resolution.
pub mod app_dirs;
/// Benchmark registry, runner and report.
pub mod benchmarks;
/// Run configuration.
pub mod config;
/// Airline dataset loading, caching and splitting.
pub mod dataset;
/// Training-engine seam and the built-in stump booster.
pub mod engine;
/// Tracing setup.
pub mod logging;
/// Classification metrics.
pub mod metrics;
