use std::io::Write;
use std::path::{Path, PathBuf};

use flightbench::dataset::AIRLINE_SOURCE_FILE;

const CARRIERS: [&str; 4] = ["UA", "AA", "DL", "WN"];
const AIRPORTS: [&str; 6] = ["ORD", "DEN", "SFO", "JFK", "ATL", "SEA"];

/// Deterministic source line for row `i`.
///
/// Evening departures are delayed, except every seventh row which flips, so
/// the label is learnable but not trivially separable.
pub fn fixture_line(i: usize) -> String {
    let dep = 600 + (i * 37) % 1700;
    let arr = (dep + 215) % 2400;
    let evening = dep >= 1500;
    let delayed = evening != (i % 7 == 0);
    let delay: i32 = if delayed { 5 + (i % 40) as i32 } else { -((i % 12) as i32) };
    format!(
        "{year},{month},{day},{dow},{dep},{arr},{carrier},{flight},{elapsed},{origin},{dest},{distance},{diverted},{delay}",
        year = 2004 + i % 4,
        month = 1 + i % 12,
        day = 1 + i % 28,
        dow = 1 + i % 7,
        carrier = CARRIERS[i % CARRIERS.len()],
        flight = 100 + i % 900,
        elapsed = 60 + i % 240,
        origin = AIRPORTS[i % AIRPORTS.len()],
        dest = AIRPORTS[(i + 1 + i / 6) % AIRPORTS.len()],
        distance = 150 + (i * 13) % 2500,
        diverted = u8::from(i % 97 == 0),
    )
}

/// Write `rows` fixture lines as a bzip2 source named like the real dataset.
pub fn write_airline_source(root: &Path, rows: usize) -> PathBuf {
    std::fs::create_dir_all(root).expect("create storage root");
    let path = root.join(AIRLINE_SOURCE_FILE);
    let file = std::fs::File::create(&path).expect("create source file");
    let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::fast());
    for i in 0..rows {
        writeln!(encoder, "{}", fixture_line(i)).expect("write source line");
    }
    encoder.finish().expect("finish bz2 stream");
    path
}

/// Number of fixture rows among the first `rows` that carry a positive label.
pub fn positive_rows(rows: usize) -> usize {
    (0..rows)
        .filter(|&i| {
            let delay: i32 = fixture_line(i)
                .rsplit(',')
                .next()
                .and_then(|field| field.parse().ok())
                .expect("delay field");
            delay > 0
        })
        .count()
}
