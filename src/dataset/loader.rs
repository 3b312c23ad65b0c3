//! Airline dataset preparation: load, encode, cache, label and split.

use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::cache::{CacheKey, CachePolicy, DatasetCache};
use super::error::DatasetError;
use super::schema::{AIRLINE_SOURCE_FILE, Column, feature_names};
use super::source::read_encoded_table;
use super::split::{SPLIT_SEED, stratified_split};
use super::table::EncodedTable;

/// Rows read from the raw source when no limit is given (about 1/6 of the file).
pub const DEFAULT_ROW_LIMIT: usize = 20_000_000;
/// Share of rows assigned to the test split by default.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Knobs for [`DatasetLoader::prepare`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareOptions {
    pub row_limit: usize,
    pub test_fraction: f64,
    pub shuffle: bool,
    pub cache_policy: CachePolicy,
}

impl Default for PrepareOptions {
    fn default() -> Self {
        Self {
            row_limit: DEFAULT_ROW_LIMIT,
            test_fraction: DEFAULT_TEST_FRACTION,
            shuffle: true,
            cache_policy: CachePolicy::default(),
        }
    }
}

impl PrepareOptions {
    /// Defaults with an optional row limit override.
    pub fn with_row_limit(row_limit: Option<usize>) -> Self {
        Self {
            row_limit: row_limit.unwrap_or(DEFAULT_ROW_LIMIT),
            ..Self::default()
        }
    }
}

/// One side of the split.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    /// `rows x features`, columns ordered as [`PreparedData::feature_names`].
    pub features: Array2<f32>,
    pub labels: Array1<u8>,
    /// Source row index of every entry, aligned with `labels`.
    pub rows: Vec<usize>,
}

impl Split {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn y(&self) -> ArrayView1<'_, u8> {
        self.labels.view()
    }

    /// Fraction of rows labelled delayed.
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.iter().filter(|&&y| y == 1).count() as f64 / self.labels.len() as f64
    }
}

/// Train and test partitions returned by a single preparation run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedData {
    pub train: Split,
    pub test: Split,
    pub feature_names: Vec<&'static str>,
}

impl PreparedData {
    pub fn total_rows(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

/// Binary label: delayed only when the arrival delay is strictly positive.
pub fn label_for_delay(arr_delay: i16) -> u8 {
    u8::from(arr_delay > 0)
}

/// Label column derived from `ArrDelay`.
pub fn derive_labels(arr_delay: &[i16]) -> Array1<u8> {
    arr_delay.iter().map(|&delay| label_for_delay(delay)).collect()
}

/// Prepares the airline dataset stored under a storage root.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    storage_root: PathBuf,
    source_file: String,
}

impl DatasetLoader {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            source_file: AIRLINE_SOURCE_FILE.to_string(),
        }
    }

    /// Use a differently named source file under the same root.
    pub fn with_source_file(mut self, source_file: impl Into<String>) -> Self {
        self.source_file = source_file.into();
        self
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn source_path(&self) -> PathBuf {
        self.storage_root.join(&self.source_file)
    }

    fn cache(&self, options: &PrepareOptions) -> (DatasetCache, CacheKey) {
        let cache = DatasetCache::new(&self.storage_root).with_policy(options.cache_policy);
        let key = CacheKey::new(self.source_file.clone(), options.row_limit);
        (cache, key)
    }

    pub fn cache_path(&self, options: &PrepareOptions) -> PathBuf {
        let (cache, key) = self.cache(options);
        cache.artifact_path(&key)
    }

    /// Encoded table from the cache, building it from the raw source if absent.
    pub fn load_table(&self, options: &PrepareOptions) -> Result<EncodedTable, DatasetError> {
        let (cache, key) = self.cache(options);
        let cache_path = cache.artifact_path(&key);
        let source_path = self.source_path();
        cache.load_or_build(&key, || {
            if !source_path.is_file() {
                return Err(DatasetError::MissingSource {
                    path: source_path.clone(),
                    cache_path: cache_path.clone(),
                });
            }
            read_encoded_table(&source_path, options.row_limit)
        })
    }

    /// Load (or restore) the table, derive labels and split it.
    pub fn prepare(&self, options: &PrepareOptions) -> Result<PreparedData, DatasetError> {
        let started = Instant::now();
        let table = self.load_table(options)?;
        let prepared = split_table(&table, options)?;
        tracing::info!(
            train_rows = prepared.train.len(),
            test_rows = prepared.test.len(),
            "Airline dataset loaded in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(prepared)
    }
}

/// Shorthand for `DatasetLoader::new(storage_root).prepare(options)`.
pub fn prepare(storage_root: &Path, options: &PrepareOptions) -> Result<PreparedData, DatasetError> {
    DatasetLoader::new(storage_root).prepare(options)
}

/// Derive labels and features from `table` and split them.
pub fn split_table(table: &EncodedTable, options: &PrepareOptions) -> Result<PreparedData, DatasetError> {
    let labels = derive_labels(table.numeric(Column::ArrDelay).unwrap_or_default());
    let features = table.feature_matrix();
    let labels_slice = labels.as_slice().unwrap_or_default();
    let indices = stratified_split(labels_slice, options.test_fraction, options.shuffle, SPLIT_SEED)?;
    let take = |rows: Vec<usize>| Split {
        features: features.select(Axis(0), &rows),
        labels: labels.select(Axis(0), &rows),
        rows,
    };
    Ok(PreparedData {
        train: take(indices.train),
        test: take(indices.test),
        feature_names: feature_names(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::source::parse_line;
    use crate::dataset::table::TableBuilder;

    #[test]
    fn label_boundaries() {
        assert_eq!(label_for_delay(0), 0);
        assert_eq!(label_for_delay(1), 1);
        assert_eq!(label_for_delay(-5), 0);
        assert_eq!(derive_labels(&[3, 0, -1]).to_vec(), vec![1, 0, 0]);
    }

    #[test]
    fn default_options_match_published_setup() {
        let options = PrepareOptions::default();
        assert_eq!(options.row_limit, 20_000_000);
        assert_eq!(options.test_fraction, 0.2);
        assert!(options.shuffle);
        assert_eq!(PrepareOptions::with_row_limit(Some(5)).row_limit, 5);
    }

    #[test]
    fn split_table_keeps_rows_aligned() {
        let mut builder = TableBuilder::default();
        for delay in -5..15 {
            let line = format!("2004,1,12,1,623,901,UA,{},158,ORD,DEN,888,0,{delay}", delay + 100);
            builder.push(parse_line(&line).unwrap());
        }
        let table = builder.finish().unwrap();
        let prepared = split_table(&table, &PrepareOptions::default()).unwrap();
        assert_eq!(prepared.train.len(), 16);
        assert_eq!(prepared.test.len(), 4);

        let flight_col = prepared
            .feature_names
            .iter()
            .position(|&name| name == "FlightNum")
            .unwrap();
        for split in [&prepared.train, &prepared.test] {
            for (i, &row) in split.rows.iter().enumerate() {
                let delay = row as i16 - 5;
                assert_eq!(split.labels[i], label_for_delay(delay));
                assert_eq!(split.features[[i, flight_col]], (delay + 100) as f32);
            }
        }
    }
}
