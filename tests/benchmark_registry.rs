mod support;

use flightbench::benchmarks::{BenchmarkError, BenchmarkRegistry, Runner};
use flightbench::config::RunConfig;
use flightbench::dataset::{PrepareOptions, prepare};
use flightbench::engine::{EngineKind, EngineSet};
use flightbench::metrics::MetricKind;
use support::airline::write_airline_source;

fn small_config() -> RunConfig {
    RunConfig {
        n_trees: 20,
        threads: Some(2),
        ..RunConfig::default()
    }
}

#[test]
fn standard_matrix_names() {
    let registry = BenchmarkRegistry::airline(&small_config());
    assert_eq!(
        registry.names().collect::<Vec<_>>(),
        vec![
            "cat-cpu",
            "cat-gpu",
            "lgbm-cpu",
            "lgbm-gpu",
            "xgb-cpu",
            "xgb-cpu-hist",
            "xgb-gpu",
            "xgb-gpu-hist",
        ]
    );
    assert_eq!(
        registry.enabled_names().collect::<Vec<_>>(),
        vec!["cat-cpu", "lgbm-cpu", "lgbm-gpu", "xgb-cpu", "xgb-cpu-hist", "xgb-gpu-hist"]
    );
}

#[test]
fn disabled_entries_are_refused_before_the_dataset_is_touched() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 200);
    let data = prepare(temp.path(), &PrepareOptions::with_row_limit(Some(200))).unwrap();
    let registry = BenchmarkRegistry::airline(&small_config());
    let engines = EngineSet::builtin();

    let err = Runner::new(&registry, &engines)
        .run(&data, &["cat-gpu"])
        .unwrap_err();
    assert!(matches!(err, BenchmarkError::Disabled { .. }), "{err}");
    assert!(err.to_string().contains("segfaults"));
}

#[test]
fn enabled_matrix_runs_end_to_end_on_builtin_engines() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 1000);
    let config = RunConfig {
        storage_root: Some(temp.path().to_path_buf()),
        row_limit: 1000,
        ..small_config()
    };
    let data = prepare(&config.resolved_storage_root().unwrap(), &config.prepare_options()).unwrap();
    let registry = BenchmarkRegistry::airline(&config);
    let engines = EngineSet::builtin();
    let names: Vec<&str> = registry.enabled_names().collect();

    let outcomes = Runner::new(&registry, &engines).run(&data, names.as_slice()).unwrap();

    assert_eq!(outcomes.len(), 6);
    for outcome in &outcomes {
        assert_eq!(outcome.train_rows, 800);
        assert_eq!(outcome.test_rows, 200);
        assert!(outcome.train_ms >= 0.0 && outcome.test_ms >= 0.0);
        assert!(
            outcome.metrics.accuracy > 0.7,
            "{} accuracy {}",
            outcome.name,
            outcome.metrics.accuracy
        );
        assert_eq!(outcome.metrics.confusion.total(), 200);
        assert!(outcome.metrics.auc.is_some());
    }
    let cat = outcomes.iter().find(|o| o.name == "cat-cpu").unwrap();
    assert_eq!(cat.engine, EngineKind::CatBoost);
    assert_eq!(cat.metric, MetricKind::CategoricalArgmax);
    assert_eq!(cat.params["iterations"], "20");
    assert_eq!(cat.params["thread_count"], "2");
}
