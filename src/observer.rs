//! Hooks for watching the classifier work.

use crate::automaton::Micros;
use crate::state::{FlightEvent, FlightState};

/// Receives everything the classifier sees and decides, synchronously and in order.
///
/// All methods default to doing nothing, so implementors only override what they need.
pub trait FlightObserver {
    /// A raw sample, before any processing.
    fn data(&mut self, _timestamp: Micros, _pressure: f32, _acceleration: f32) {}

    fn state_changed(&mut self, _timestamp: Micros, _state: FlightState) {}

    fn event_produced(&mut self, _timestamp: Micros, _event: FlightEvent) {}

    /// The logical clock advanced by `elapsed` to `timestamp`.
    fn elapsed(&mut self, _timestamp: Micros, _elapsed: Micros) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl FlightObserver for NullObserver {}

impl<T: FlightObserver + ?Sized> FlightObserver for &mut T {
    fn data(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        (**self).data(timestamp, pressure, acceleration);
    }

    fn state_changed(&mut self, timestamp: Micros, state: FlightState) {
        (**self).state_changed(timestamp, state);
    }

    fn event_produced(&mut self, timestamp: Micros, event: FlightEvent) {
        (**self).event_produced(timestamp, event);
    }

    fn elapsed(&mut self, timestamp: Micros, elapsed: Micros) {
        (**self).elapsed(timestamp, elapsed);
    }
}

/// Forwards to both observers, first `A` then `B`.
impl<A: FlightObserver, B: FlightObserver> FlightObserver for (A, B) {
    fn data(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        self.0.data(timestamp, pressure, acceleration);
        self.1.data(timestamp, pressure, acceleration);
    }

    fn state_changed(&mut self, timestamp: Micros, state: FlightState) {
        self.0.state_changed(timestamp, state);
        self.1.state_changed(timestamp, state);
    }

    fn event_produced(&mut self, timestamp: Micros, event: FlightEvent) {
        self.0.event_produced(timestamp, event);
        self.1.event_produced(timestamp, event);
    }

    fn elapsed(&mut self, timestamp: Micros, elapsed: Micros) {
        self.0.elapsed(timestamp, elapsed);
        self.1.elapsed(timestamp, elapsed);
    }
}

/// Forwards to the observer if there is one.
impl<T: FlightObserver> FlightObserver for Option<T> {
    fn data(&mut self, timestamp: Micros, pressure: f32, acceleration: f32) {
        if let Some(observer) = self {
            observer.data(timestamp, pressure, acceleration);
        }
    }

    fn state_changed(&mut self, timestamp: Micros, state: FlightState) {
        if let Some(observer) = self {
            observer.state_changed(timestamp, state);
        }
    }

    fn event_produced(&mut self, timestamp: Micros, event: FlightEvent) {
        if let Some(observer) = self {
            observer.event_produced(timestamp, event);
        }
    }

    fn elapsed(&mut self, timestamp: Micros, elapsed: Micros) {
        if let Some(observer) = self {
            observer.elapsed(timestamp, elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        calls: usize,
    }

    impl FlightObserver for Counter {
        fn state_changed(&mut self, _: Micros, _: FlightState) {
            self.calls += 1;
        }
    }

    #[test]
    fn pair_forwards_to_both() {
        let mut pair = (Counter::default(), Counter::default());
        pair.state_changed(0, FlightState::Idle);
        pair.data(0, 1013.0, 9.81);
        assert_eq!(pair.0.calls, 1);
        assert_eq!(pair.1.calls, 1);
    }

    #[test]
    fn absent_observer_is_skipped() {
        let mut present = Some(Counter::default());
        present.state_changed(0, FlightState::Landed);
        assert_eq!(present.map(|c| c.calls), Some(1));

        let mut absent: Option<Counter> = None;
        absent.state_changed(0, FlightState::Landed);
    }

    #[test]
    fn borrowed_observer_forwards() {
        fn notify<O: FlightObserver>(mut observer: O) {
            observer.state_changed(0, FlightState::Idle);
        }

        let mut counter = Counter::default();
        notify(&mut counter);
        notify(&mut counter);
        assert_eq!(counter.calls, 2);
    }
}
