//! Columnar storage for the encoded (pre-label) dataset.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::encoder::{CategoryCodes, EncodeError};
use super::schema::{Column, FEATURE_COLUMNS, NUMERIC_COLUMNS, numeric_slot};
use super::source::RawRecord;

/// All loaded rows with categorical columns replaced by integer codes.
///
/// `UniqueCarrier` uses its own code table; `Origin` and `Dest` share the
/// airport table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedTable {
    rows: usize,
    /// Indexed like [`NUMERIC_COLUMNS`].
    numeric: Vec<Vec<i16>>,
    carrier: Vec<u16>,
    origin: Vec<u16>,
    dest: Vec<u16>,
    carrier_codes: CategoryCodes,
    airport_codes: CategoryCodes,
}

/// Borrowed view of one column.
#[derive(Debug, Clone, Copy)]
pub enum ColumnValues<'a> {
    Numeric(&'a [i16]),
    Codes(&'a [u16]),
}

impl ColumnValues<'_> {
    pub fn get(&self, row: usize) -> Option<i32> {
        match self {
            ColumnValues::Numeric(values) => values.get(row).map(|&v| i32::from(v)),
            ColumnValues::Codes(values) => values.get(row).map(|&v| i32::from(v)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnValues::Numeric(values) => values.len(),
            ColumnValues::Codes(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EncodedTable {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, column: Column) -> ColumnValues<'_> {
        match column {
            Column::UniqueCarrier => ColumnValues::Codes(&self.carrier),
            Column::Origin => ColumnValues::Codes(&self.origin),
            Column::Dest => ColumnValues::Codes(&self.dest),
            numeric => {
                let slot = numeric_slot(numeric).unwrap_or_default();
                ColumnValues::Numeric(&self.numeric[slot])
            }
        }
    }

    /// Raw `i16` values of a numeric column.
    pub fn numeric(&self, column: Column) -> Option<&[i16]> {
        numeric_slot(column).map(|slot| self.numeric[slot].as_slice())
    }

    pub fn carrier_codes(&self) -> &CategoryCodes {
        &self.carrier_codes
    }

    pub fn airport_codes(&self) -> &CategoryCodes {
        &self.airport_codes
    }

    /// Code table used for a categorical column.
    pub fn codes_for(&self, column: Column) -> Option<&CategoryCodes> {
        match column {
            Column::UniqueCarrier => Some(&self.carrier_codes),
            Column::Origin | Column::Dest => Some(&self.airport_codes),
            _ => None,
        }
    }

    /// Row-major `rows x 13` matrix of [`FEATURE_COLUMNS`].
    pub fn feature_matrix(&self) -> Array2<f32> {
        let columns: Vec<ColumnValues<'_>> =
            FEATURE_COLUMNS.iter().map(|&c| self.column(c)).collect();
        Array2::from_shape_fn((self.rows, columns.len()), |(row, col)| {
            columns[col].get(row).unwrap_or_default() as f32
        })
    }

    /// Structural check run on tables restored from disk.
    pub fn validate(&self) -> Result<(), String> {
        if self.numeric.len() != NUMERIC_COLUMNS.len() {
            return Err(format!(
                "expected {} numeric columns, found {}",
                NUMERIC_COLUMNS.len(),
                self.numeric.len()
            ));
        }
        for column in Column::ALL {
            let len = self.column(column).len();
            if len != self.rows {
                return Err(format!(
                    "column {} has {len} rows, expected {}",
                    column.name(),
                    self.rows
                ));
            }
        }
        let check_codes = |name: &str, codes: &[u16], table: &CategoryCodes| {
            match codes.iter().find(|&&code| code as usize >= table.len()) {
                Some(code) => Err(format!("column {name} has out-of-range code {code}")),
                None => Ok(()),
            }
        };
        check_codes("UniqueCarrier", &self.carrier, &self.carrier_codes)?;
        check_codes("Origin", &self.origin, &self.airport_codes)?;
        check_codes("Dest", &self.dest, &self.airport_codes)?;
        Ok(())
    }
}

/// Accumulates parsed rows and encodes them once all rows are in.
#[derive(Debug, Default)]
pub struct TableBuilder {
    numeric: Vec<Vec<i16>>,
    carrier: Vec<String>,
    origin: Vec<String>,
    dest: Vec<String>,
}

impl TableBuilder {
    pub fn with_capacity(rows: usize) -> Self {
        Self {
            numeric: (0..NUMERIC_COLUMNS.len())
                .map(|_| Vec::with_capacity(rows))
                .collect(),
            carrier: Vec::with_capacity(rows),
            origin: Vec::with_capacity(rows),
            dest: Vec::with_capacity(rows),
        }
    }

    pub fn push(&mut self, record: RawRecord) {
        if self.numeric.is_empty() {
            self.numeric = vec![Vec::new(); NUMERIC_COLUMNS.len()];
        }
        for (column, value) in self.numeric.iter_mut().zip(record.numeric) {
            column.push(value);
        }
        self.carrier.push(record.carrier);
        self.origin.push(record.origin);
        self.dest.push(record.dest);
    }

    pub fn len(&self) -> usize {
        self.carrier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.carrier.is_empty()
    }

    /// Encode the airport pair jointly and the carrier on its own.
    pub fn finish(self) -> Result<EncodedTable, EncodeError> {
        let rows = self.len();
        let numeric = if self.numeric.is_empty() {
            vec![Vec::new(); NUMERIC_COLUMNS.len()]
        } else {
            self.numeric
        };
        let (mut airports, airport_codes) =
            CategoryCodes::encode_related_columns(&[&self.origin[..], &self.dest[..]])?;
        let dest = airports.pop().unwrap_or_default();
        let origin = airports.pop().unwrap_or_default();
        let (carrier, carrier_codes) = CategoryCodes::encode_column(&self.carrier)?;
        Ok(EncodedTable {
            rows,
            numeric,
            carrier,
            origin,
            dest,
            carrier_codes,
            airport_codes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::source::parse_line;

    fn table(lines: &[&str]) -> EncodedTable {
        let mut builder = TableBuilder::default();
        for line in lines {
            builder.push(parse_line(line).unwrap());
        }
        builder.finish().unwrap()
    }

    #[test]
    fn encodes_categoricals_and_keeps_numerics() {
        let table = table(&[
            "2004,1,12,1,623,901,UA,462,158,ORD,DEN,888,0,-7",
            "2004,1,13,2,700,930,AA,10,60,DEN,SFO,400,0,15",
        ]);
        assert_eq!(table.rows(), 2);
        assert_eq!(table.numeric(Column::ArrDelay).unwrap(), &[-7, 15]);
        assert_eq!(table.column(Column::Origin).get(0), Some(0));
        assert_eq!(table.column(Column::Dest).get(0), Some(1));
        assert_eq!(table.column(Column::Origin).get(1), Some(1));
        assert_eq!(table.column(Column::Dest).get(1), Some(2));
        assert_eq!(table.airport_codes().values(), &["ORD", "DEN", "SFO"]);
        assert_eq!(table.carrier_codes().values(), &["UA", "AA"]);
        assert!(table.validate().is_ok());
    }

    #[test]
    fn feature_matrix_follows_feature_column_order() {
        let table = table(&["2004,1,12,1,623,901,UA,462,158,ORD,DEN,888,0,-7"]);
        let matrix = table.feature_matrix();
        assert_eq!(matrix.dim(), (1, FEATURE_COLUMNS.len()));
        let row: Vec<f32> = matrix.row(0).to_vec();
        assert_eq!(
            row,
            vec![158.0, 901.0, 623.0, 12.0, 1.0, 1.0, 888.0, 0.0, 462.0, 1.0, 0.0, 0.0, 2004.0]
        );
    }

    #[test]
    fn empty_builder_produces_valid_empty_table() {
        let table = TableBuilder::default().finish().unwrap();
        assert_eq!(table.rows(), 0);
        assert!(table.validate().is_ok());
        assert_eq!(table.feature_matrix().dim(), (0, FEATURE_COLUMNS.len()));
    }
}
