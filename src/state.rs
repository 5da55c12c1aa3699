//! Flight phases and the discrete events that move the vehicle between them.
//!
//! Both display as their variant name.

use std::fmt;

/// The phase of flight the vehicle is believed to be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlightState {
    /// Start state, no calibration yet.
    Idle,
    /// Ground pressure is known, sitting on the pad.
    WaitForLaunch,
    /// Acceleration crossed the launch threshold but has not been held long enough.
    AccelerationDetected,
    /// Acceleration held past the confirmation timeout.
    Accelerating,
    /// Pressure dropped far enough below ground pressure to confirm the launch.
    Launched,
    Burnout,
    Separation,
    Coasting,
    /// Past apogee, the descent is being sampled.
    Falling,
    MeasureFallingPressure1,
    MeasureFallingPressure2,
    MeasureFallingPressure3,
    /// Pressure rises linearly: the drogue is holding a constant sink rate.
    DrogueOpened,
    /// Pressure rises quadratically: the vehicle is in free fall.
    DrogueFailed,
    Landed,
}

/// A discrete signal derived from the sensors or from the trend fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FlightEvent {
    GroundPressureEstablished,
    /// Ground pressure minus current pressure reached the launch differential,
    /// i.e. the vehicle is up in the air.
    PressureBelowLaunchThreshold,
    PressureAboveLaunchThreshold,
    PressurePeakReached,
    AccelerationBelowThreshold,
    AccelerationAboveThreshold,
    AccelerationNearZero,
    PressureLinear,
    PressureQuadratic,
    RestartPressureMeasurement,
    ExpectedApogeeTimeReached,
}

impl FlightState {
    /// True for the states in which the descent is sampled for the trend fit.
    pub fn is_measuring_descent(&self) -> bool {
        matches!(
            self,
            FlightState::Falling
                | FlightState::MeasureFallingPressure1
                | FlightState::MeasureFallingPressure2
                | FlightState::MeasureFallingPressure3
        )
    }

    /// True between the confirmed launch and apogee.
    pub fn is_ascending(&self) -> bool {
        matches!(
            self,
            FlightState::Launched
                | FlightState::Burnout
                | FlightState::Separation
                | FlightState::Coasting
        )
    }
}

impl fmt::Display for FlightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for FlightEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
