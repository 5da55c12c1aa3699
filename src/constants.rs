//! Default vehicle profile. Every value can be overridden through `FlightConfig`.
//!
//! Time is in microseconds, pressure in hPa, acceleration in m/s².

/// Total acceleration above which we suspect a launch:
pub const LAUNCH_ACCELERATION_THRESHOLD: f32 = 30.0;
/// Total acceleration below which the motor is considered out:
pub const FREEFALL_ACCELERATION_THRESHOLD: f32 = 5.0;
/// Pressure drop from ground level that confirms we left the pad (~16 m):
pub const LAUNCH_PRESSURE_DIFFERENTIAL: f32 = 2.0;

/// Acceleration has to be held this long before it counts:
pub const ACCELERATION_CONFIRMATION_US: u64 = 1_000_000;
/// Expected burn time of the motor, counted from acceleration onset:
pub const MOTOR_BURN_US: u64 = 2_000_000;
/// Delay between burnout and separation:
pub const SEPARATION_US: u64 = 1_000_000;
/// Length of each of the descent sampling phases:
pub const FALLING_PRESSURE_US: u64 = 500_000;
/// Flight time after which apogee is assumed even without a pressure peak:
pub const EXPECTED_APOGEE_US: u64 = 10_000_000;

/// Smoothed pressure rise over its minimum that marks apogee:
pub const APOGEE_PRESSURE_RISE: f32 = 0.5;
/// Samples in the pressure smoothing window:
pub const PRESSURE_WINDOW_SIZE: usize = 10;
/// Samples in the descent trend fit:
pub const TREND_WINDOW_SIZE: usize = 50;
/// Largest quadratic coefficient (hPa/s²) still classified as a linear descent.
/// Free fall is roughly 0.6 hPa/s² near the ground.
pub const LINEAR_CURVATURE_TOLERANCE: f64 = 0.2;
