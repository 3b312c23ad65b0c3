mod support;

use std::collections::BTreeSet;

use flightbench::config::RunConfig;
use flightbench::dataset::{
    CachePolicy, DatasetError, DatasetLoader, PrepareOptions, PreparedData, prepare,
};
use support::airline::{positive_rows, write_airline_source};
use support::data_env::DataEnvGuard;

fn options(row_limit: usize) -> PrepareOptions {
    PrepareOptions {
        row_limit,
        ..PrepareOptions::default()
    }
}

fn all_rows(data: &PreparedData) -> Vec<usize> {
    let mut rows: Vec<usize> = data.train.rows.iter().chain(&data.test.rows).copied().collect();
    rows.sort_unstable();
    rows
}

#[test]
fn thousand_row_prepare_writes_cache_and_splits_80_20() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 1200);
    let loader = DatasetLoader::new(temp.path());
    let options = options(1000);

    let data = loader.prepare(&options).unwrap();

    assert_eq!(data.train.len(), 800);
    assert_eq!(data.test.len(), 200);
    assert_eq!(data.train.features.dim(), (800, 13));
    assert_eq!(data.feature_names.len(), 13);
    assert!(!data.feature_names.contains(&"ArrDelay"));
    let cache_path = loader.cache_path(&options);
    assert!(cache_path.is_file());
    assert_eq!(
        cache_path.file_name().unwrap().to_str().unwrap(),
        "airline_14col.data.bz2.cache"
    );
}

#[test]
fn train_and_test_partition_every_row() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 500);
    let data = prepare(temp.path(), &options(500)).unwrap();

    let train: BTreeSet<usize> = data.train.rows.iter().copied().collect();
    let test: BTreeSet<usize> = data.test.rows.iter().copied().collect();
    assert!(train.is_disjoint(&test));
    assert_eq!(all_rows(&data), (0..500).collect::<Vec<_>>());
}

#[test]
fn split_keeps_label_proportions() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 1000);
    let data = prepare(temp.path(), &options(1000)).unwrap();

    let positives = positive_rows(1000) as f64;
    let test_positives = data.test.labels.iter().filter(|&&y| y == 1).count() as f64;
    assert!((test_positives - positives * 0.2).abs() <= 1.0);
    assert!((data.train.positive_rate() - data.test.positive_rate()).abs() < 0.01);
}

#[test]
fn warm_cache_matches_cold_build() {
    let cold_root = tempfile::tempdir().unwrap();
    write_airline_source(cold_root.path(), 600);
    let first = prepare(cold_root.path(), &options(600)).unwrap();
    let warm = prepare(cold_root.path(), &options(600)).unwrap();
    assert_eq!(first, warm);

    let other_root = tempfile::tempdir().unwrap();
    write_airline_source(other_root.path(), 600);
    let fresh = prepare(other_root.path(), &options(600)).unwrap();
    assert_eq!(first, fresh);
}

#[test]
fn warm_cache_does_not_need_the_source() {
    let temp = tempfile::tempdir().unwrap();
    let source = write_airline_source(temp.path(), 300);
    let first = prepare(temp.path(), &options(300)).unwrap();
    std::fs::remove_file(source).unwrap();
    let second = prepare(temp.path(), &options(300)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_source_without_cache_is_fatal() {
    let temp = tempfile::tempdir().unwrap();
    let loader = DatasetLoader::new(temp.path());
    let err = loader.prepare(&options(100)).unwrap_err();
    assert!(matches!(err, DatasetError::MissingSource { .. }), "{err}");
    assert!(!loader.cache_path(&options(100)).exists());
}

#[test]
fn row_limit_above_file_size_reads_everything() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 250);
    let data = prepare(temp.path(), &options(10_000)).unwrap();
    assert_eq!(data.total_rows(), 250);
}

#[test]
fn source_name_cache_ignores_later_row_limits() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 1200);
    prepare(temp.path(), &options(1000)).unwrap();

    let stale = prepare(temp.path(), &options(500)).unwrap();
    assert_eq!(stale.total_rows(), 1000);

    let per_limit = PrepareOptions {
        cache_policy: CachePolicy::SourceAndRowLimit,
        ..options(500)
    };
    let fresh = prepare(temp.path(), &per_limit).unwrap();
    assert_eq!(fresh.total_rows(), 500);
    let loader = DatasetLoader::new(temp.path());
    assert_ne!(loader.cache_path(&per_limit), loader.cache_path(&options(500)));
}

#[test]
fn unshuffled_split_takes_tail_of_each_label() {
    let temp = tempfile::tempdir().unwrap();
    write_airline_source(temp.path(), 400);
    let ordered = PrepareOptions {
        shuffle: false,
        ..options(400)
    };
    let data = prepare(temp.path(), &ordered).unwrap();

    assert!(data.train.rows.windows(2).all(|w| w[0] < w[1]));
    assert!(data.test.rows.windows(2).all(|w| w[0] < w[1]));
    for label in [0u8, 1] {
        let last_train = data
            .train
            .rows
            .iter()
            .zip(data.train.labels.iter())
            .filter(|(_, y)| **y == label)
            .map(|(row, _)| *row)
            .max()
            .unwrap();
        let first_test = data
            .test
            .rows
            .iter()
            .zip(data.test.labels.iter())
            .filter(|(_, y)| **y == label)
            .map(|(row, _)| *row)
            .min()
            .unwrap();
        assert!(last_train < first_test);
    }
    assert_eq!(prepare(temp.path(), &ordered).unwrap(), data);
}

#[test]
fn storage_root_falls_back_to_data_env_var() {
    let temp = tempfile::tempdir().unwrap();
    let _env = DataEnvGuard::set_data_root(temp.path().to_path_buf());
    let root = RunConfig::default().resolved_storage_root().unwrap();
    assert_eq!(root, temp.path());
}
