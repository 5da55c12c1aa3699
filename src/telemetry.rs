//! Recorded flight data: loading, stitching the two recorder files together,
//! and replaying them through a classifier.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::automaton::Micros;
use crate::classifier::{FlightClassifier, FlightError};
use crate::observer::FlightObserver;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed telemetry: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}, column {column}: {value:?} is not a valid sample value")]
    Parse {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("{name} contains no telemetry")]
    Empty { name: String },

    #[error("row {row} was rejected: {source}")]
    Replay {
        row: usize,
        #[source]
        source: FlightError,
    },
}

/// One recorded sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryRow {
    /// Seconds since the recorder started.
    pub time: f64,
    pub total_acceleration: f32,
    pub pressure: f32,
}

impl TelemetryRow {
    pub fn microseconds(&self) -> Micros {
        (self.time * 1_000_000.0) as Micros
    }
}

/// Reads `time,total_acceleration,pressure` rows. Comment lines start with `#`,
/// blank lines are skipped and extra columns are ignored.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TelemetryRow>, TelemetryError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TelemetryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        // Stray single characters (e.g. a lone '\r') are not samples.
        if record.len() == 1 && record[0].len() <= 1 {
            continue;
        }
        let line = record.position().map_or(0, |position| position.line());
        let field = |column: usize| -> Result<f64, TelemetryError> {
            let value = record.get(column).unwrap_or("");
            let invalid = || TelemetryError::Parse {
                line,
                column: column + 1,
                value: value.to_string(),
            };
            let parsed: f64 = value.parse().map_err(|_| invalid())?;
            // Time must be a finite, non-negative f64; the sensor columns must fit an f32.
            let usable = if column == 0 {
                parsed.is_finite() && parsed >= 0.0
            } else {
                (parsed as f32).is_finite()
            };
            if usable { Ok(parsed) } else { Err(invalid()) }
        };
        rows.push(TelemetryRow {
            time: field(0)?,
            total_acceleration: field(1)? as f32,
            pressure: field(2)? as f32,
        });
    }

    if rows.is_empty() {
        return Err(TelemetryError::Empty {
            name: path.display().to_string(),
        });
    }
    debug!("loaded {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Stitches the two recorder files of one flight together.
///
/// The longer recording is taken as the full one. Its rows from before the
/// shorter recording starts are put in front of the shorter recording.
pub fn merge_stages(
    first: Vec<TelemetryRow>,
    second: Vec<TelemetryRow>,
) -> Result<Vec<TelemetryRow>, TelemetryError> {
    if first.is_empty() {
        return Err(TelemetryError::Empty {
            name: "first recording".to_string(),
        });
    }
    if second.is_empty() {
        return Err(TelemetryError::Empty {
            name: "second recording".to_string(),
        });
    }

    let (short, full) = if first.len() > second.len() {
        debug!("first recording is the longer one, swapping");
        (second, first)
    } else {
        (first, second)
    };

    let cutoff = short[0].time;
    let mut merged: Vec<TelemetryRow> = full.into_iter().filter(|row| row.time < cutoff).collect();
    merged.extend(short);
    Ok(merged)
}

/// Drives every row through `classifier` in order and returns how many were driven.
/// Stops at the first row the classifier rejects.
pub fn replay<O: FlightObserver>(
    rows: &[TelemetryRow],
    classifier: &mut FlightClassifier<O>,
) -> Result<usize, TelemetryError> {
    for (row, sample) in rows.iter().enumerate() {
        classifier
            .drive(sample.microseconds(), sample.pressure, sample.total_acceleration)
            .map_err(|source| TelemetryError::Replay { row, source })?;
    }
    Ok(rows.len())
}
