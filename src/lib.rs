//! Flight phase detection for a small sounding rocket, driven by a barometer
//! and the magnitude of the acceleration vector.
//!
//! The pieces, bottom up:
//! - [`automaton`]: a timed finite automaton with event and timeout transitions.
//! - [`statistics`] and [`trend`]: rolling / windowed estimators and a least-squares
//!   quadratic fit used to read the pressure trace.
//! - [`classifier`]: turns samples into events and drives the flight automaton.
//! - [`telemetry`] and [`logger`]: replaying recorded flights and writing flight logs.

pub mod automaton;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod logger;
pub mod observer;
pub mod state;
pub mod statistics;
pub mod telemetry;
pub mod trend;

pub use automaton::{Micros, TimedAutomaton};
pub use classifier::{FlightClassifier, FlightError, PressureTrend};
pub use config::{ConfigError, FlightConfig};
pub use observer::{FlightObserver, NullObserver};
pub use state::{FlightEvent, FlightState};
