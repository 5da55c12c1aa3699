//! Flight phase classification from pressure and total acceleration.
//!
//! [`FlightClassifier::drive`] is called once per sensor sample. It advances
//! the automaton's clock, turns the sample into threshold events, and derives
//! the apogee and drogue events from windowed pressure statistics and a
//! quadratic fit of the descent.

use log::{debug, info, trace, warn};
use thiserror::Error;

use crate::automaton::{Micros, TimedAutomaton};
use crate::config::FlightConfig;
use crate::observer::{FlightObserver, NullObserver};
use crate::state::{FlightEvent, FlightState};
use crate::statistics::{ArrayStatistics, RollingStatistics, Statistics};
use crate::trend::{Quadratic, QuadraticFit};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlightError {
    #[error("sample at {timestamp}us is older than the previous one at {previous}us")]
    NonMonotonicTimestamp { previous: Micros, timestamp: Micros },

    #[error("sample at {timestamp}us is not finite: pressure {pressure}, acceleration {acceleration}")]
    NonFiniteSample {
        timestamp: Micros,
        pressure: f32,
        acceleration: f32,
    },
}

/// Shape of the pressure trace during descent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressureTrend {
    /// Constant sink rate, the drogue is open.
    Linear,
    /// Accelerating descent, the drogue did not open.
    Quadratic,
}

impl PressureTrend {
    /// Classifies a fitted descent by the magnitude of its quadratic coefficient.
    pub fn classify(fit: &Quadratic, tolerance: f64) -> Self {
        if fit.a.abs() < tolerance {
            PressureTrend::Linear
        } else {
            PressureTrend::Quadratic
        }
    }

    fn event(self) -> FlightEvent {
        match self {
            PressureTrend::Linear => FlightEvent::PressureLinear,
            PressureTrend::Quadratic => FlightEvent::PressureQuadratic,
        }
    }
}

/// Builds the flight transition table for `config`.
pub fn flight_automaton(config: &FlightConfig) -> TimedAutomaton<FlightState, FlightEvent> {
    use FlightEvent as E;
    use FlightState as S;

    let mut sm = TimedAutomaton::new(S::Idle);
    sm.add_event_transition(S::Idle, E::GroundPressureEstablished, S::WaitForLaunch);
    sm.add_event_transition(S::WaitForLaunch, E::AccelerationAboveThreshold, S::AccelerationDetected);
    sm.add_event_transition(S::AccelerationDetected, E::AccelerationBelowThreshold, S::WaitForLaunch);
    sm.add_timeout_transition(S::AccelerationDetected, config.acceleration_confirmation, S::Accelerating);
    sm.add_event_transition(S::Accelerating, E::AccelerationBelowThreshold, S::WaitForLaunch);
    sm.add_event_transition(S::Accelerating, E::PressureBelowLaunchThreshold, S::Launched);
    sm.add_event_transition(S::Launched, E::AccelerationNearZero, S::Burnout);
    sm.add_timeout_transition(S::Launched, config.remaining_burn(), S::Burnout);
    sm.add_timeout_transition(S::Burnout, config.separation, S::Separation);
    sm.add_timeout_transition(S::Separation, 0, S::Coasting);
    sm.add_event_transition(S::Coasting, E::PressurePeakReached, S::Falling);
    sm.add_event_transition(S::Coasting, E::ExpectedApogeeTimeReached, S::Falling);
    sm.add_timeout_transition(S::Falling, config.falling_pressure, S::MeasureFallingPressure1);
    sm.add_timeout_transition(S::MeasureFallingPressure1, config.falling_pressure, S::MeasureFallingPressure2);
    sm.add_timeout_transition(S::MeasureFallingPressure2, config.falling_pressure, S::MeasureFallingPressure3);
    sm.add_event_transition(S::MeasureFallingPressure3, E::PressureLinear, S::DrogueOpened);
    sm.add_event_transition(S::MeasureFallingPressure3, E::PressureQuadratic, S::DrogueFailed);
    sm.add_event_transition(S::DrogueOpened, E::PressureAboveLaunchThreshold, S::Landed);
    sm.add_event_transition(S::DrogueFailed, E::PressureAboveLaunchThreshold, S::Landed);
    sm.add_event_transition(S::DrogueFailed, E::RestartPressureMeasurement, S::Falling);
    sm
}

/// Classifies one flight. Owns its transition table and is deliberately not `Clone`.
pub struct FlightClassifier<O: FlightObserver = NullObserver> {
    config: FlightConfig,
    automaton: TimedAutomaton<FlightState, FlightEvent>,
    observer: O,
    /// First processed pressure sample, frozen once set.
    ground_pressure: Option<f32>,
    ground_noise: Option<RollingStatistics>,
    ground_noise_estimate: Option<Statistics>,
    last_timestamp: Option<Micros>,
    /// Set on entering `AccelerationDetected`, cleared on falling back to `WaitForLaunch`.
    liftoff_timestamp: Option<Micros>,
    smoothed_pressure: ArrayStatistics,
    lowest_pressure: Option<f64>,
    falling_since: Option<Micros>,
    descent: QuadraticFit,
    pressure_trend: Option<Quadratic>,
}

impl FlightClassifier<NullObserver> {
    pub fn new(config: FlightConfig) -> Self {
        Self::with_observer(config, NullObserver)
    }
}

impl Default for FlightClassifier<NullObserver> {
    fn default() -> Self {
        Self::new(FlightConfig::default())
    }
}

impl<O: FlightObserver> FlightClassifier<O> {
    pub fn with_observer(config: FlightConfig, observer: O) -> Self {
        Self {
            automaton: flight_automaton(&config),
            smoothed_pressure: ArrayStatistics::new(config.pressure_window),
            descent: QuadraticFit::new(config.trend_window),
            config,
            observer,
            ground_pressure: None,
            ground_noise: None,
            ground_noise_estimate: None,
            last_timestamp: None,
            liftoff_timestamp: None,
            lowest_pressure: None,
            falling_since: None,
            pressure_trend: None,
        }
    }

    pub fn state(&self) -> FlightState {
        self.automaton.current_state()
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn ground_pressure(&self) -> Option<f32> {
        self.ground_pressure
    }

    /// Spread of the pressure readings while waiting on the pad.
    pub fn ground_pressure_noise(&self) -> Option<Statistics> {
        self.ground_noise_estimate
    }

    pub fn last_timestamp(&self) -> Option<Micros> {
        self.last_timestamp
    }

    pub fn liftoff_timestamp(&self) -> Option<Micros> {
        self.liftoff_timestamp
    }

    /// Time since acceleration onset, or `None` while no flight is in progress.
    pub fn flighttime(&self) -> Option<Micros> {
        let liftoff = self.liftoff_timestamp?;
        let now = self.last_timestamp?;
        Some(now - liftoff)
    }

    /// The descent fit that produced the most recent drogue verdict.
    pub fn pressure_trend(&self) -> Option<Quadratic> {
        self.pressure_trend
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Graphviz rendering of the transition table, timeouts in microseconds.
    pub fn dot(&self) -> String {
        self.automaton.dot("us")
    }

    /// Processes one sample. Timestamps must not decrease and both readings
    /// must be finite; a sample breaking either rule is rejected and leaves
    /// the classifier untouched.
    ///
    /// The first sample only seeds the clock.
    pub fn drive(
        &mut self,
        timestamp: Micros,
        pressure: f32,
        acceleration: f32,
    ) -> Result<(), FlightError> {
        self.observer.data(timestamp, pressure, acceleration);
        if !pressure.is_finite() || !acceleration.is_finite() {
            warn!(
                "rejecting sample at {}us: pressure {}, acceleration {}",
                timestamp, pressure, acceleration
            );
            return Err(FlightError::NonFiniteSample {
                timestamp,
                pressure,
                acceleration,
            });
        }
        let Some(previous) = self.last_timestamp else {
            self.last_timestamp = Some(timestamp);
            return Ok(());
        };
        if timestamp < previous {
            warn!(
                "rejecting sample at {}us, previous sample was at {}us",
                timestamp, previous
            );
            return Err(FlightError::NonMonotonicTimestamp { previous, timestamp });
        }

        let elapsed = timestamp - previous;
        self.last_timestamp = Some(timestamp);

        let before = self.automaton.current_state();
        self.automaton.elapsed(elapsed);
        self.observer.elapsed(timestamp, elapsed);
        self.on_step(before, timestamp);

        self.process_pressure(pressure);
        self.produce_events(timestamp, pressure, acceleration);
        Ok(())
    }

    fn process_pressure(&mut self, pressure: f32) {
        // No averaging preamble: the first processed sample is taken as ground level.
        let ground = *self.ground_pressure.get_or_insert(pressure);
        if matches!(self.state(), FlightState::Idle | FlightState::WaitForLaunch) {
            let window = self.config.pressure_window;
            let noise = self
                .ground_noise
                .get_or_insert_with(|| RollingStatistics::new(window, ground as f64, 0.0));
            if let Some(estimate) = noise.update(pressure as f64) {
                self.ground_noise_estimate = Some(estimate);
            }
        }
    }

    fn produce_events(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        let Some(ground) = self.ground_pressure else {
            return;
        };
        self.feed(timestamp, FlightEvent::GroundPressureEstablished);

        let in_air = ground - pressure >= self.config.launch_pressure_differential;
        if in_air {
            self.feed(timestamp, FlightEvent::PressureBelowLaunchThreshold);
        } else {
            self.feed(timestamp, FlightEvent::PressureAboveLaunchThreshold);
        }

        if acceleration > self.config.launch_acceleration_threshold {
            self.feed(timestamp, FlightEvent::AccelerationAboveThreshold);
        } else {
            self.feed(timestamp, FlightEvent::AccelerationBelowThreshold);
            if acceleration < self.config.freefall_acceleration_threshold {
                self.feed(timestamp, FlightEvent::AccelerationNearZero);
            }
        }

        self.detect_apogee(timestamp, pressure);
        self.judge_descent(timestamp, pressure);

        // Keep re-measuring a failed descent as long as we are still up in the air.
        if self.state() == FlightState::DrogueFailed && in_air {
            self.feed(timestamp, FlightEvent::RestartPressureMeasurement);
        }
    }

    fn detect_apogee(&mut self, timestamp: Micros, pressure: f32) {
        if !self.state().is_ascending() {
            return;
        }
        if let Some(smoothed) = self.smoothed_pressure.update(pressure as f64) {
            let lowest = self
                .lowest_pressure
                .map_or(smoothed.average, |lowest| lowest.min(smoothed.average));
            self.lowest_pressure = Some(lowest);
            if self.state() == FlightState::Coasting
                && smoothed.average - lowest >= self.config.apogee_pressure_rise as f64
            {
                self.feed(timestamp, FlightEvent::PressurePeakReached);
            }
        }

        let apogee_due = self
            .flighttime()
            .is_some_and(|flighttime| flighttime >= self.config.expected_apogee_time);
        if self.state() == FlightState::Coasting && apogee_due {
            self.feed(timestamp, FlightEvent::ExpectedApogeeTimeReached);
        }
    }

    fn judge_descent(&mut self, timestamp: Micros, pressure: f32) {
        if !self.state().is_measuring_descent() {
            return;
        }
        let since = self.falling_since.unwrap_or(timestamp);
        let x = (timestamp - since) as f64 / 1_000_000.0;
        self.descent.feed(x, pressure as f64);

        if self.state() != FlightState::MeasureFallingPressure3 {
            return;
        }
        // Wait for a full window if the sampling phases were too short to fill it.
        if let Some(fit) = self.descent.coefficients() {
            self.pressure_trend = Some(fit);
            let trend = PressureTrend::classify(&fit, self.config.linear_curvature_tolerance);
            info!(
                "descent at {}us looks {:?}: p = {:.4}·t² + {:.4}·t + {:.2}",
                timestamp, trend, fit.a, fit.b, fit.c
            );
            self.feed(timestamp, trend.event());
        }
    }

    fn feed(&mut self, timestamp: Micros, event: FlightEvent) {
        let before = self.automaton.current_state();
        self.automaton.feed(event);
        trace!("{}us: fed {}", timestamp, event);
        self.observer.event_produced(timestamp, event);
        self.on_step(before, timestamp);
    }

    fn on_step(&mut self, before: FlightState, timestamp: Micros) {
        let to = self.automaton.current_state();
        if to == before {
            return;
        }
        debug!("{}us: {} -> {}", timestamp, before, to);
        self.on_enter(to, timestamp);
        self.observer.state_changed(timestamp, to);
    }

    fn on_enter(&mut self, state: FlightState, timestamp: Micros) {
        match state {
            FlightState::WaitForLaunch => {
                self.liftoff_timestamp = None;
            }
            FlightState::AccelerationDetected => {
                self.liftoff_timestamp = Some(timestamp);
            }
            FlightState::Launched => {
                self.smoothed_pressure.clear();
                self.lowest_pressure = None;
                match (self.ground_pressure, self.ground_noise_estimate) {
                    (Some(ground), Some(noise)) => info!(
                        "launch confirmed at {}us, ground pressure {:.2} hPa (σ {:.3})",
                        timestamp,
                        ground,
                        noise.stddev()
                    ),
                    (Some(ground), None) => {
                        info!("launch confirmed at {}us, ground pressure {:.2} hPa", timestamp, ground)
                    }
                    _ => info!("launch confirmed at {}us", timestamp),
                }
            }
            FlightState::Falling => {
                self.falling_since = Some(timestamp);
                self.descent.reset();
                info!("sampling descent from {}us", timestamp);
            }
            FlightState::Landed => {
                info!("landed at {}us, flight time {:?}us", timestamp, self.flighttime());
            }
            _ => {}
        }
    }
}
