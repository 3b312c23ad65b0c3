use serde::Serialize;

use super::BenchmarkOutcome;
use crate::config::ConfigSummary;
use crate::dataset::PreparedData;

/// JSON document written by `flightbench run`.
#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkReport {
    pub flightbench_version: String,
    pub os: String,
    pub arch: String,
    pub cpu_cores: usize,
    pub total_elapsed_ms: u64,
    pub system: SystemInfo,
    pub config: ConfigSummary,
    pub dataset: DatasetSummary,
    pub outcomes: Vec<BenchmarkOutcome>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DatasetSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_positive_rate: f64,
    pub test_positive_rate: f64,
    pub feature_names: Vec<&'static str>,
}

impl DatasetSummary {
    pub fn from_prepared(data: &PreparedData) -> Self {
        Self {
            train_rows: data.train.len(),
            test_rows: data.test.len(),
            train_positive_rate: data.train.positive_rate(),
            test_positive_rate: data.test.positive_rate(),
            feature_names: data.feature_names.clone(),
        }
    }
}

impl BenchmarkReport {
    pub fn new(config: ConfigSummary, system: SystemInfo) -> Self {
        Self {
            flightbench_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            total_elapsed_ms: 0,
            system,
            config,
            dataset: DatasetSummary::default(),
            outcomes: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SystemInfo {
    pub cpu_brand: String,
    pub memory_total_bytes: u64,
}

impl SystemInfo {
    pub fn from_system(system: &sysinfo::System) -> Self {
        Self {
            cpu_brand: system
                .cpus()
                .first()
                .map(|cpu| cpu.brand().trim().to_string())
                .unwrap_or_default(),
            memory_total_bytes: system.total_memory(),
        }
    }

    pub fn detect() -> Self {
        Self::from_system(&sysinfo::System::new_all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    #[test]
    fn report_serializes_with_host_fields() {
        let system = SystemInfo {
            cpu_brand: "test cpu".to_string(),
            memory_total_bytes: 1024,
        };
        let report = BenchmarkReport::new(RunConfig::default().summary(), system);
        let value: serde_json::Value = serde_json::from_slice(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["flightbench_version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(value["system"]["cpu_brand"], "test cpu");
        assert_eq!(value["config"]["row_limit"], 20_000_000);
        assert_eq!(value["config"]["cache_policy"], "source_name");
        assert!(value["outcomes"].as_array().unwrap().is_empty());
    }
}
