//! Fixed column layout of the airline source file.

use serde::{Deserialize, Serialize};

/// File name of the raw airline dataset inside the storage root.
pub const AIRLINE_SOURCE_FILE: &str = "airline_14col.data.bz2";

/// Number of comma-separated fields on every source line.
pub const COLUMN_COUNT: usize = 14;

/// Source columns in file order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Year,
    Month,
    DayofMonth,
    DayofWeek,
    CRSDepTime,
    CRSArrTime,
    UniqueCarrier,
    FlightNum,
    ActualElapsedTime,
    Origin,
    Dest,
    Distance,
    Diverted,
    ArrDelay,
}

impl Column {
    /// All columns in file order.
    pub const ALL: [Column; COLUMN_COUNT] = [
        Column::Year,
        Column::Month,
        Column::DayofMonth,
        Column::DayofWeek,
        Column::CRSDepTime,
        Column::CRSArrTime,
        Column::UniqueCarrier,
        Column::FlightNum,
        Column::ActualElapsedTime,
        Column::Origin,
        Column::Dest,
        Column::Distance,
        Column::Diverted,
        Column::ArrDelay,
    ];

    /// Column header as used in the published dataset description.
    pub const fn name(self) -> &'static str {
        match self {
            Column::Year => "Year",
            Column::Month => "Month",
            Column::DayofMonth => "DayofMonth",
            Column::DayofWeek => "DayofWeek",
            Column::CRSDepTime => "CRSDepTime",
            Column::CRSArrTime => "CRSArrTime",
            Column::UniqueCarrier => "UniqueCarrier",
            Column::FlightNum => "FlightNum",
            Column::ActualElapsedTime => "ActualElapsedTime",
            Column::Origin => "Origin",
            Column::Dest => "Dest",
            Column::Distance => "Distance",
            Column::Diverted => "Diverted",
            Column::ArrDelay => "ArrDelay",
        }
    }

    /// Zero-based field position on a source line.
    pub const fn position(self) -> usize {
        self as usize
    }

    /// True for string-valued columns that go through categorical encoding.
    pub const fn is_categorical(self) -> bool {
        matches!(self, Column::UniqueCarrier | Column::Origin | Column::Dest)
    }
}

/// The 11 numeric columns in file order; each value fits in an `i16`.
pub const NUMERIC_COLUMNS: [Column; 11] = [
    Column::Year,
    Column::Month,
    Column::DayofMonth,
    Column::DayofWeek,
    Column::CRSDepTime,
    Column::CRSArrTime,
    Column::FlightNum,
    Column::ActualElapsedTime,
    Column::Distance,
    Column::Diverted,
    Column::ArrDelay,
];

/// Column the binary label is derived from.
pub const LABEL_SOURCE: Column = Column::ArrDelay;

/// Name of the derived label column.
pub const LABEL_NAME: &str = "ArrDelayBinary";

/// Model inputs: every column except `ArrDelay`, ordered by column name.
pub const FEATURE_COLUMNS: [Column; 13] = [
    Column::ActualElapsedTime,
    Column::CRSArrTime,
    Column::CRSDepTime,
    Column::DayofMonth,
    Column::DayofWeek,
    Column::Dest,
    Column::Distance,
    Column::Diverted,
    Column::FlightNum,
    Column::Month,
    Column::Origin,
    Column::UniqueCarrier,
    Column::Year,
];

/// Position of `column` inside [`NUMERIC_COLUMNS`], if numeric.
pub fn numeric_slot(column: Column) -> Option<usize> {
    NUMERIC_COLUMNS.iter().position(|&c| c == column)
}

/// Header names for [`FEATURE_COLUMNS`].
pub fn feature_names() -> Vec<&'static str> {
    FEATURE_COLUMNS.iter().map(|c| c.name()).collect()
}
