//! Airline dataset pipeline: raw source → encoded table → cache → labelled split.

pub mod cache;
pub mod encoder;
mod error;
pub mod loader;
pub mod schema;
pub mod source;
pub mod split;
pub mod table;

pub use cache::{CacheKey, CachePolicy, DatasetCache};
pub use encoder::{CategoryCodes, EncodeError};
pub use error::DatasetError;
pub use loader::{
    DEFAULT_ROW_LIMIT, DEFAULT_TEST_FRACTION, DatasetLoader, PrepareOptions, PreparedData, Split,
    derive_labels, label_for_delay, prepare,
};
pub use schema::{AIRLINE_SOURCE_FILE, Column};
pub use split::{SPLIT_SEED, SplitError, SplitIndices, stratified_split};
pub use table::EncodedTable;
