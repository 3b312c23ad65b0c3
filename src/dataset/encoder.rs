//! Categorical-to-integer encoding.
//!
//! Codes are handed out in order of first occurrence, so a given input always
//! produces the same table. Codes are only meaningful within the table that
//! produced them; a different row subset may number the same value differently.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest number of distinct values a single table can hold.
pub const MAX_CATEGORIES: usize = u16::MAX as usize + 1;

/// Errors raised while building or restoring a code table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("more than {limit} distinct categorical values")]
    TooManyCategories { limit: usize },
    #[error("duplicate categorical value {0:?} in code table")]
    DuplicateValue(String),
    #[error("linked columns have different lengths ({expected} vs {found})")]
    RaggedColumns { expected: usize, found: usize },
}

/// Bijection between distinct raw values and codes `0..len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CategoryCodes {
    values: Vec<String>,
    index: HashMap<String, u16>,
}

impl CategoryCodes {
    /// Encode a single categorical column.
    pub fn encode_column<S: AsRef<str>>(
        column: &[S],
    ) -> Result<(Vec<u16>, CategoryCodes), EncodeError> {
        let mut codes = CategoryCodes::default();
        let encoded = codes.encode_into(column)?;
        Ok((encoded, codes))
    }

    /// Encode a group of columns that share one coding domain.
    ///
    /// Values are visited column by column, so codes for the first column come
    /// first. All columns must have the same length.
    pub fn encode_related_columns<S: AsRef<str>>(
        columns: &[&[S]],
    ) -> Result<(Vec<Vec<u16>>, CategoryCodes), EncodeError> {
        if let Some(first) = columns.first() {
            for column in columns {
                if column.len() != first.len() {
                    return Err(EncodeError::RaggedColumns {
                        expected: first.len(),
                        found: column.len(),
                    });
                }
            }
        }
        let mut codes = CategoryCodes::default();
        let mut encoded = Vec::with_capacity(columns.len());
        for column in columns {
            encoded.push(codes.encode_into(column)?);
        }
        Ok((encoded, codes))
    }

    fn encode_into<S: AsRef<str>>(&mut self, column: &[S]) -> Result<Vec<u16>, EncodeError> {
        let mut out = Vec::with_capacity(column.len());
        for value in column {
            out.push(self.intern(value.as_ref())?);
        }
        Ok(out)
    }

    fn intern(&mut self, value: &str) -> Result<u16, EncodeError> {
        if let Some(&code) = self.index.get(value) {
            return Ok(code);
        }
        if self.values.len() >= MAX_CATEGORIES {
            return Err(EncodeError::TooManyCategories {
                limit: MAX_CATEGORIES,
            });
        }
        let code = self.values.len() as u16;
        self.values.push(value.to_string());
        self.index.insert(value.to_string(), code);
        Ok(code)
    }

    /// Code assigned to `value`, if it was observed.
    pub fn code(&self, value: &str) -> Option<u16> {
        self.index.get(value).copied()
    }

    /// Raw value behind `code`.
    pub fn decode(&self, code: u16) -> Option<&str> {
        self.values.get(code as usize).map(String::as_str)
    }

    /// Decode a whole column; `None` if any code is out of range.
    pub fn decode_column(&self, codes: &[u16]) -> Option<Vec<&str>> {
        codes.iter().map(|&code| self.decode(code)).collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distinct values in code order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

impl TryFrom<Vec<String>> for CategoryCodes {
    type Error = EncodeError;

    fn try_from(values: Vec<String>) -> Result<Self, Self::Error> {
        if values.len() > MAX_CATEGORIES {
            return Err(EncodeError::TooManyCategories {
                limit: MAX_CATEGORIES,
            });
        }
        let mut index = HashMap::with_capacity(values.len());
        for (code, value) in values.iter().enumerate() {
            if index.insert(value.clone(), code as u16).is_some() {
                return Err(EncodeError::DuplicateValue(value.clone()));
            }
        }
        Ok(Self { values, index })
    }
}

impl From<CategoryCodes> for Vec<String> {
    fn from(codes: CategoryCodes) -> Self {
        codes.values
    }
}
