use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use flight_state::logger::FlightLogger;
use flight_state::telemetry::{self, TelemetryError};
use flight_state::{FlightClassifier, FlightConfig, FlightError, FlightState, PressureTrend};

/// Pressure and total acceleration of a flight whose drogue opens at apogee (5 s).
fn drogue_flight(t: f64) -> (f32, f32) {
    let acceleration = if t < 0.1 {
        9.81
    } else if t < 2.1 {
        60.0
    } else {
        2.0
    };
    let pressure = if t < 1.2 {
        1013.0
    } else if t <= 5.0 {
        1013.0 - 10.0 * (t - 1.2)
    } else {
        975.0 + 5.0 * (t - 5.0)
    };
    (pressure as f32, acceleration as f32)
}

fn write_recording(dir: &Path, name: &str, from_s: f64, until_s: f64) -> PathBuf {
    let mut text = String::from("# time,total_acceleration,pressure,temperature\n");
    let first = (from_s * 100.0).round() as u64;
    let last = (until_s * 100.0).round() as u64;
    for i in first..=last {
        let t = i as f64 / 100.0;
        let (pressure, acceleration) = drogue_flight(t);
        writeln!(text, "{:.2},{},{},21.5", t, acceleration, pressure).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn profile(dir: &Path) -> FlightConfig {
    let path = dir.join("vehicle.toml");
    std::fs::write(&path, "pressure_window = 5\ntrend_window = 40\n").unwrap();
    FlightConfig::load(path).unwrap()
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn merged_recordings_fly_to_landing() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let full = write_recording(dir.path(), "full.csv", 0.0, 13.0);
    let late = write_recording(dir.path(), "late.csv", 3.0, 13.0);

    let rows = telemetry::merge_stages(
        telemetry::load(&late).unwrap(),
        telemetry::load(&full).unwrap(),
    )
    .unwrap();
    assert_eq!(rows.len(), 1301);

    let logger = FlightLogger::create(dir.path()).unwrap();
    let log_path = logger.path().to_path_buf();
    let mut classifier = FlightClassifier::with_observer(profile(dir.path()), logger);
    assert_eq!(telemetry::replay(&rows, &mut classifier).unwrap(), 1301);

    assert_eq!(classifier.state(), FlightState::Landed);
    let fit = classifier.pressure_trend().unwrap();
    assert_eq!(PressureTrend::classify(&fit, 0.2), PressureTrend::Linear);
    drop(classifier);

    let log = std::fs::read_to_string(log_path).unwrap();
    assert!(log.starts_with("timestamp,kind,pressure,acceleration,detail\n"));
    assert!(log.contains(",state,,,DrogueOpened\n"));
    assert!(log.contains(",state,,,Landed\n"));
    assert!(!log.contains("DrogueFailed"));
}

#[test]
fn recording_without_samples_is_rejected() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "# recorder started\n\n").unwrap();

    match telemetry::load(&path).unwrap_err() {
        TelemetryError::Empty { name } => assert!(name.ends_with("empty.csv")),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn replay_stops_at_time_going_backwards() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("glitch.csv");
    std::fs::write(&path, "0.00,9.81,1013\n0.01,9.81,1013\n0.02,9.81,1013\n0.015,9.81,1013\n").unwrap();

    let rows = telemetry::load(&path).unwrap();
    let mut classifier = FlightClassifier::default();
    match telemetry::replay(&rows, &mut classifier).unwrap_err() {
        TelemetryError::Replay { row, source } => {
            assert_eq!(row, 3);
            assert!(matches!(source, FlightError::NonMonotonicTimestamp { .. }));
        }
        other => panic!("unexpected error {other}"),
    }
    assert_eq!(classifier.state(), FlightState::WaitForLaunch);
}
