//! Flight log: every raw sample, derived event and state change as one CSV row.
//! Also the console transcript printed while replaying recorded flights.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::automaton::Micros;
use crate::observer::FlightObserver;
use crate::state::{FlightEvent, FlightState};

pub const LOG_HEADER: &str = "timestamp,kind,pressure,acceleration,detail";

pub struct FlightLogger {
    path: PathBuf,
    writer: BufWriter<File>,
    failed: bool,
}

impl FlightLogger {
    /// Creates `<dir>/<YYYY-MM-DD_HH-MM-SS>.csv` (UTC) and writes the header.
    pub fn create(dir: impl AsRef<Path>) -> io::Result<Self> {
        let path = dir
            .as_ref()
            .join(format!("{}.csv", chrono::Utc::now().format("%Y-%m-%d_%H-%M-%S")));

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut logger = FlightLogger {
            path,
            writer: BufWriter::new(file),
            failed: false,
        };
        logger.write_headers()?;
        Ok(logger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_headers(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{}", LOG_HEADER)
    }

    fn log_row(&mut self, row: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.writer, "{}", row) {
            // One warning is enough, the rest of the flight will most likely fail the same way.
            if !self.failed {
                warn!("failed to write to {}: {}", self.path.display(), e);
                self.failed = true;
            }
        }
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl FlightObserver for FlightLogger {
    fn data(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        self.log_row(format_args!("{},data,{},{},", timestamp, pressure, acceleration));
    }

    fn state_changed(&mut self, timestamp: Micros, state: FlightState) {
        self.log_row(format_args!("{},state,,,{}", timestamp, state));
    }

    fn event_produced(&mut self, timestamp: Micros, event: FlightEvent) {
        self.log_row(format_args!("{},event,,,{}", timestamp, event));
    }
}

impl Drop for FlightLogger {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Prints a line per notification to stdout.
#[derive(Debug, Default)]
pub struct PrintObserver {
    since_state_change: Micros,
}

impl PrintObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock time accumulated since the last state change.
    pub fn since_state_change(&self) -> Micros {
        self.since_state_change
    }
}

impl FlightObserver for PrintObserver {
    fn data(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        println!("data: {}, p: {}, a: {}", timestamp, pressure, acceleration);
    }

    fn state_changed(&mut self, timestamp: Micros, state: FlightState) {
        println!("state changed: {} -> {}", timestamp, state);
        self.since_state_change = 0;
    }

    fn event_produced(&mut self, timestamp: Micros, event: FlightEvent) {
        println!("event fed: {} -> {}", timestamp, event);
    }

    fn elapsed(&mut self, timestamp: Micros, elapsed: Micros) {
        self.since_state_change = self.since_state_change.saturating_add(elapsed);
        println!("elapsed: {}: {}", timestamp, self.since_state_change / 1_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FlightClassifier;
    use crate::config::FlightConfig;

    #[test]
    fn log_file_is_named_after_utc_time() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FlightLogger::create(dir.path()).unwrap();
        let name = logger.path().file_name().unwrap().to_str().unwrap().to_string();
        // YYYY-MM-DD_HH-MM-SS.csv
        assert_eq!(name.len(), 23);
        assert!(name.ends_with(".csv"));
        assert_eq!(&name[10..11], "_");
        assert_eq!(logger.path().parent(), Some(dir.path()));
    }

    #[test]
    fn logs_samples_events_and_states() {
        let dir = tempfile::tempdir().unwrap();
        let logger = FlightLogger::create(dir.path()).unwrap();
        let path = logger.path().to_path_buf();

        let mut classifier = FlightClassifier::with_observer(FlightConfig::default(), logger);
        classifier.drive(0, 1013.5, 9.75).unwrap();
        classifier.drive(10_000, 1013.5, 9.75).unwrap();
        drop(classifier);

        let text = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                LOG_HEADER,
                "0,data,1013.5,9.75,",
                "10000,data,1013.5,9.75,",
                "10000,event,,,GroundPressureEstablished",
                "10000,state,,,WaitForLaunch",
                "10000,event,,,PressureAboveLaunchThreshold",
                "10000,event,,,AccelerationBelowThreshold",
            ]
        );
    }

    #[test]
    fn missing_directory_fails_to_create() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FlightLogger::create(dir.path().join("missing")).is_err());
    }

    #[test]
    fn printer_counts_time_since_state_change() {
        let mut printer = PrintObserver::new();
        printer.elapsed(10_000, 10_000);
        printer.elapsed(30_000, 20_000);
        assert_eq!(printer.since_state_change(), 30_000);
        printer.state_changed(30_000, FlightState::WaitForLaunch);
        assert_eq!(printer.since_state_change(), 0);
    }
}
