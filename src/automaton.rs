//! A small timed finite automaton.
//!
//! Transitions fire either when a matching event is fed in the current state,
//! or once the logical clock has advanced far enough past the last state
//! change. The clock only moves through [`TimedAutomaton::elapsed`], so a run
//! is fully determined by the order of `feed`/`elapsed` calls.

use std::collections::BTreeMap;
use std::fmt::{self, Display, Write};

/// Logical time, in whatever unit the caller uses consistently (microseconds in this crate).
pub type Micros = u64;

pub struct TimedAutomaton<S, E> {
    start: S,
    state: S,
    now: Micros,
    last_state_change: Micros,
    event_transitions: BTreeMap<(S, E), S>,
    timeout_transitions: BTreeMap<S, (Micros, S)>,
}

impl<S, E> TimedAutomaton<S, E>
where
    S: Copy + Ord,
    E: Copy + Ord,
{
    pub fn new(start: S) -> Self {
        Self {
            start,
            state: start,
            now: 0,
            last_state_change: 0,
            event_transitions: BTreeMap::new(),
            timeout_transitions: BTreeMap::new(),
        }
    }

    pub fn current_state(&self) -> S {
        self.state
    }

    pub fn start_state(&self) -> S {
        self.start
    }

    /// Time spent in the current state according to the logical clock.
    pub fn time_in_state(&self) -> Micros {
        self.now - self.last_state_change
    }

    /// Registers `from --what--> to`. A later registration for the same pair replaces it.
    pub fn add_event_transition(&mut self, from: S, what: E, to: S) {
        self.event_transitions.insert((from, what), to);
    }

    /// Registers `from --after--> to`. Each state has at most one timeout edge;
    /// a later registration replaces it.
    pub fn add_timeout_transition(&mut self, from: S, after: Micros, to: S) {
        self.timeout_transitions.insert(from, (after, to));
    }

    /// Feeds an event. Events without a transition in the current state are ignored.
    pub fn feed(&mut self, what: E) -> bool {
        match self.event_transitions.get(&(self.state, what)) {
            Some(&to) => {
                self.change_state(to);
                true
            }
            None => false,
        }
    }

    /// Advances the clock by `duration` and fires the current state's timeout if it is due.
    ///
    /// At most one timeout fires per call.
    pub fn elapsed(&mut self, duration: Micros) -> bool {
        self.now = self.now.saturating_add(duration);
        match self.timeout_transitions.get(&self.state) {
            Some(&(timeout, to)) if self.time_in_state() >= timeout => {
                self.change_state(to);
                true
            }
            _ => false,
        }
    }

    fn change_state(&mut self, to: S) {
        self.state = to;
        self.last_state_change = self.now;
    }
}

impl<S, E> TimedAutomaton<S, E>
where
    S: Copy + Ord + Display,
    E: Copy + Ord + Display,
{
    /// Renders the transition graph in Graphviz dot syntax.
    ///
    /// The start state is drawn as a double circle, the current state is
    /// filled. Timeout edges are labelled with the duration followed by `unit`.
    pub fn dot(&self, unit: &str) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_dot(&mut out, unit);
        out
    }

    pub fn write_dot<W: Write>(&self, out: &mut W, unit: &str) -> fmt::Result {
        writeln!(out, "digraph timed_finite_automaton {{")?;
        writeln!(out, "node [shape = doublecircle];")?;
        if self.state == self.start {
            writeln!(out, "node [style = filled];")?;
            writeln!(out, "{};", self.start)?;
        } else {
            writeln!(out, "{};", self.start)?;
            writeln!(out, "node [shape = circle, style = filled];")?;
            writeln!(out, "{};", self.state)?;
        }
        writeln!(out, "node [shape = circle, style = \"\"];")?;
        for (from, (after, to)) in &self.timeout_transitions {
            writeln!(out, "{}->{}[label = \"{}{}\"];", from, to, after, unit)?;
        }
        for ((from, what), to) in &self.event_transitions {
            writeln!(out, "{}->{}[label = \"{}\"];", from, to, what)?;
        }
        writeln!(out, "}}")
    }
}
