//! Reader for the header-less, comma-delimited airline source.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bzip2::read::MultiBzDecoder;

use super::error::DatasetError;
use super::schema::{COLUMN_COUNT, Column, NUMERIC_COLUMNS};
use super::table::{EncodedTable, TableBuilder};

/// One parsed source row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Values for [`NUMERIC_COLUMNS`], in that order.
    pub numeric: [i16; NUMERIC_COLUMNS.len()],
    pub carrier: String,
    pub origin: String,
    pub dest: String,
}

impl RawRecord {
    /// Value of a numeric column; `None` for categorical columns.
    pub fn numeric_value(&self, column: Column) -> Option<i16> {
        super::schema::numeric_slot(column).map(|slot| self.numeric[slot])
    }
}

/// Parse one source line. Errors carry a message without location.
pub fn parse_line(line: &str) -> Result<RawRecord, String> {
    let mut fields = [""; COLUMN_COUNT];
    let mut count = 0usize;
    for field in line.split(',') {
        if count == COLUMN_COUNT {
            return Err(format!("expected {COLUMN_COUNT} fields, found more"));
        }
        fields[count] = field.trim();
        count += 1;
    }
    if count != COLUMN_COUNT {
        return Err(format!("expected {COLUMN_COUNT} fields, found {count}"));
    }

    let mut numeric = [0i16; NUMERIC_COLUMNS.len()];
    for (slot, column) in NUMERIC_COLUMNS.iter().enumerate() {
        let raw = fields[column.position()];
        numeric[slot] = parse_i16(raw)
            .ok_or_else(|| format!("column {}: {raw:?} is not a 16-bit integer", column.name()))?;
    }
    Ok(RawRecord {
        numeric,
        carrier: fields[Column::UniqueCarrier.position()].to_string(),
        origin: fields[Column::Origin.position()].to_string(),
        dest: fields[Column::Dest.position()].to_string(),
    })
}

// Integral floats such as "79.0" show up in some exports of the dataset.
fn parse_i16(raw: &str) -> Option<i16> {
    if let Ok(value) = raw.parse::<i16>() {
        return Some(value);
    }
    let value = raw.parse::<f64>().ok()?;
    if value.fract() != 0.0 || value < i16::MIN as f64 || value > i16::MAX as f64 {
        return None;
    }
    Some(value as i16)
}

/// Open `path`, decompressing transparently when the name ends in `.bz2`.
pub fn open_source(path: &Path) -> std::io::Result<Box<dyn BufRead>> {
    let file = File::open(path)?;
    let is_bz2 = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"));
    if is_bz2 {
        Ok(Box::new(BufReader::new(MultiBzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read at most `row_limit` rows from `path` and encode them.
///
/// Blank lines are skipped and do not count toward the limit. A limit larger
/// than the file yields every row.
pub fn read_encoded_table(path: &Path, row_limit: usize) -> Result<EncodedTable, DatasetError> {
    let io_err = |source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };
    let reader = open_source(path).map_err(io_err)?;
    let mut builder = TableBuilder::with_capacity(row_limit.min(1 << 20));
    for (idx, line) in reader.lines().enumerate() {
        if builder.len() >= row_limit {
            break;
        }
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(&line).map_err(|message| DatasetError::Parse {
            path: path.to_path_buf(),
            line: idx + 1,
            message,
        })?;
        builder.push(record);
    }
    tracing::debug!(rows = builder.len(), "read airline source {}", path.display());
    Ok(builder.finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    const LINE: &str = "2004,1,12,1,623,901,UA,462,158,ORD,DEN,888,0,-7";

    #[test]
    fn parses_fixed_schema_line() {
        let record = parse_line(LINE).unwrap();
        assert_eq!(record.numeric_value(Column::Year), Some(2004));
        assert_eq!(record.numeric_value(Column::CRSArrTime), Some(901));
        assert_eq!(record.numeric_value(Column::ArrDelay), Some(-7));
        assert_eq!(record.numeric_value(Column::Origin), None);
        assert_eq!(record.carrier, "UA");
        assert_eq!(record.origin, "ORD");
        assert_eq!(record.dest, "DEN");
    }

    #[test]
    fn rejects_wrong_field_count_and_overflow() {
        assert!(parse_line("2004,1,12").is_err());
        assert!(parse_line(&format!("{LINE},extra")).is_err());
        let overflow = LINE.replace("888", "40000");
        let err = parse_line(&overflow).unwrap_err();
        assert!(err.contains("Distance"), "{err}");
    }

    #[test]
    fn accepts_integral_floats() {
        let record = parse_line(&LINE.replace(",158,", ",158.0,")).unwrap();
        assert_eq!(record.numeric_value(Column::ActualElapsedTime), Some(158));
        assert!(parse_line(&LINE.replace(",158,", ",158.5,")).is_err());
    }

    #[test]
    fn reads_bz2_source_up_to_row_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.data.bz2");
        let file = File::create(&path).unwrap();
        let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::default());
        for _ in 0..5 {
            writeln!(encoder, "{LINE}").unwrap();
        }
        writeln!(encoder).unwrap();
        encoder.finish().unwrap();

        assert_eq!(read_encoded_table(&path, 3).unwrap().rows(), 3);
        assert_eq!(read_encoded_table(&path, 100).unwrap().rows(), 5);
    }

    #[test]
    fn parse_errors_report_line_numbers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plain.data");
        std::fs::write(&path, format!("{LINE}\n2004,bad\n")).unwrap();
        match read_encoded_table(&path, 10) {
            Err(DatasetError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
