//! Vehicle profile: thresholds and timeouts the flight classifier runs with.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::automaton::Micros;
use crate::constants::*;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    pub launch_acceleration_threshold: f32,
    pub freefall_acceleration_threshold: f32,
    pub launch_pressure_differential: f32,
    pub acceleration_confirmation: Micros,
    pub motor_burn: Micros,
    pub separation: Micros,
    pub falling_pressure: Micros,
    pub expected_apogee_time: Micros,
    pub apogee_pressure_rise: f32,
    pub pressure_window: usize,
    pub trend_window: usize,
    pub linear_curvature_tolerance: f64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            launch_acceleration_threshold: LAUNCH_ACCELERATION_THRESHOLD,
            freefall_acceleration_threshold: FREEFALL_ACCELERATION_THRESHOLD,
            launch_pressure_differential: LAUNCH_PRESSURE_DIFFERENTIAL,
            acceleration_confirmation: ACCELERATION_CONFIRMATION_US,
            motor_burn: MOTOR_BURN_US,
            separation: SEPARATION_US,
            falling_pressure: FALLING_PRESSURE_US,
            expected_apogee_time: EXPECTED_APOGEE_US,
            apogee_pressure_rise: APOGEE_PRESSURE_RISE,
            pressure_window: PRESSURE_WINDOW_SIZE,
            trend_window: TREND_WINDOW_SIZE,
            linear_curvature_tolerance: LINEAR_CURVATURE_TOLERANCE,
        }
    }
}

impl FlightConfig {
    /// Reads a TOML vehicle profile. Keys that are missing keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects profiles the estimators cannot work with: the quadratic fit
    /// needs at least three samples, the pressure smoothing at least two.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });
        if self.trend_window < 3 {
            return invalid("trend_window", "must be at least 3");
        }
        if self.pressure_window < 2 {
            return invalid("pressure_window", "must be at least 2");
        }
        if !self.linear_curvature_tolerance.is_finite() || self.linear_curvature_tolerance < 0.0 {
            return invalid("linear_curvature_tolerance", "must be finite and non-negative");
        }
        let thresholds = [
            ("launch_acceleration_threshold", self.launch_acceleration_threshold),
            ("freefall_acceleration_threshold", self.freefall_acceleration_threshold),
            ("launch_pressure_differential", self.launch_pressure_differential),
            ("apogee_pressure_rise", self.apogee_pressure_rise),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() {
                return invalid(field, "must be finite");
            }
        }
        Ok(())
    }

    /// Timeout of the launched state: the rest of the burn after confirmation.
    pub fn remaining_burn(&self) -> Micros {
        self.motor_burn.saturating_sub(self.acceleration_confirmation)
    }
}
