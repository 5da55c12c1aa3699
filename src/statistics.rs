//! Windowed statistics over noisy sensor values.
//!
//! Two estimators are provided. [`RollingStatistics`] updates mean and variance
//! incrementally in O(1); [`ArrayStatistics`] keeps the last N raw values and
//! recomputes from scratch, which also allows a median.

use fixed_deque::Deque;

/// Mean and variance of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub average: f64,
    pub variance: f64,
}

impl Statistics {
    pub fn stddev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Incremental mean/variance with a Welford-style correction term.
///
/// Each update treats the previously fed value as the one leaving the window,
/// so this is a bounded-lag approximation of a sliding window, not an exact
/// one. Feeding the value the estimator was seeded with leaves it unchanged.
#[derive(Debug, Clone)]
pub struct RollingStatistics {
    window: f64,
    confidence: usize,
    average: f64,
    variance: f64,
    previous: f64,
    updates: usize,
}

impl RollingStatistics {
    /// Creates an estimator over `window` samples seeded with a prior
    /// mean and variance. Results are reported after `window` updates.
    pub fn new(window: usize, average: f64, variance: f64) -> Self {
        Self::with_confidence(window, window, average, variance)
    }

    /// Like [`RollingStatistics::new`], but reports once `confidence` updates
    /// have been made. Never reports before the second update.
    pub fn with_confidence(window: usize, confidence: usize, average: f64, variance: f64) -> Self {
        Self {
            window: window.max(2) as f64,
            confidence: confidence.max(2),
            average,
            variance,
            previous: average,
            updates: 0,
        }
    }

    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn update(&mut self, value: f64) -> Option<Statistics> {
        self.updates += 1;
        let old_average = self.average;
        let new_average = old_average + (value - self.previous) / self.window;
        self.average = new_average;
        self.variance += (value - self.previous) * (value - new_average + self.previous - old_average)
            / (self.window - 1.0);
        self.previous = value;

        (self.updates >= self.confidence).then_some(Statistics {
            average: self.average,
            variance: self.variance,
        })
    }
}

/// Mean, sample variance and median over the last `capacity` values.
pub struct ArrayStatistics {
    values: Deque<f64>,
    capacity: usize,
}

impl ArrayStatistics {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: Deque::new(capacity.max(1)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once the window has been filled and at least two values are present.
    pub fn is_full(&self) -> bool {
        self.capacity >= 2 && self.values.len() >= self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Pushes `value`, evicting the oldest one once full, and returns the
    /// statistics of the window if it has been filled.
    pub fn update(&mut self, value: f64) -> Option<Statistics> {
        self.values.push_back(value);
        self.statistics()
    }

    pub fn statistics(&self) -> Option<Statistics> {
        if !self.is_full() {
            return None;
        }
        let n = self.values.len() as f64;
        let average = self.values.iter().sum::<f64>() / n;
        let variance = self
            .values
            .iter()
            .map(|value| (value - average).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        Some(Statistics { average, variance })
    }

    /// Upper median of the window: the element at index N/2 once sorted.
    pub fn median(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        let mut sorted: Vec<f64> = self.values.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        Some(sorted[sorted.len() / 2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rolling_reports_after_window_updates() {
        let mut stats = RollingStatistics::new(10, 10.0, 1.0);
        for _ in 0..9 {
            assert_eq!(stats.update(10.0), None);
        }
        let result = stats.update(10.0).unwrap();
        assert_eq!(result.average, 10.0);
        assert_eq!(stats.updates(), 10);
    }

    #[test]
    fn rolling_reports_after_explicit_confidence() {
        let mut stats = RollingStatistics::with_confidence(10, 3, 10.0, 1.0);
        assert_eq!(stats.update(10.0), None);
        assert_eq!(stats.update(10.0), None);
        let result = stats.update(10.0).unwrap();
        assert_eq!(result.average, 10.0);
    }

    #[test]
    fn rolling_never_reports_before_two_updates() {
        let mut stats = RollingStatistics::with_confidence(10, 0, 10.0, 0.0);
        assert_eq!(stats.update(10.0), None);
        assert!(stats.update(10.0).is_some());
    }

    #[test]
    fn rolling_constant_input_is_stable() {
        let mut stats = RollingStatistics::new(5, 1013.25, 0.0);
        let mut last = None;
        for _ in 0..50 {
            last = stats.update(1013.25);
        }
        let result = last.unwrap();
        assert_relative_eq!(result.average, 1013.25);
        assert_relative_eq!(result.variance, 0.0);
        assert_relative_eq!(result.stddev(), 0.0);
    }

    #[test]
    fn rolling_seeded_elsewhere_keeps_its_first_step() {
        // Only the first update sees a difference from `previous`; every later
        // update of the same value cancels out, so the estimate stays put.
        let mut stats = RollingStatistics::new(10, 0.0, 0.0);
        let mut last = None;
        for _ in 0..1000 {
            last = stats.update(5.0);
        }
        let result = last.unwrap();
        assert_relative_eq!(result.average, 0.5);
        assert_relative_eq!(result.variance, 2.5);
        assert_eq!(stats.updates(), 1000);
    }

    #[test]
    fn rolling_follows_a_step() {
        let mut stats = RollingStatistics::with_confidence(4, 2, 0.0, 0.0);
        stats.update(0.0);
        let result = stats.update(8.0).unwrap();
        // Only the step between consecutive samples enters the average.
        assert_relative_eq!(result.average, 2.0);
        assert!(result.variance > 0.0);
    }

    #[test]
    fn array_reports_once_filled() {
        let mut stats = ArrayStatistics::new(10);
        for _ in 0..9 {
            assert_eq!(stats.update(10.0), None);
            assert_eq!(stats.median(), None);
        }
        assert!(stats.update(10.0).is_some());
        assert!(stats.update(10.0).is_some());
    }

    #[test]
    fn array_mean_variance_and_median() {
        let mut stats = ArrayStatistics::new(10);
        let mut result = None;
        for i in 1..=10 {
            result = stats.update(i as f64);
        }
        let result = result.unwrap();
        assert_eq!(result.average, 5.5);
        assert_relative_eq!(result.variance, 9.166666666666666, max_relative = 1e-12);
        assert_eq!(stats.median(), Some(6.0));
    }

    #[test]
    fn array_overwrites_oldest() {
        let mut stats = ArrayStatistics::new(3);
        for value in [100.0, 1.0, 2.0, 3.0] {
            stats.update(value);
        }
        let result = stats.statistics().unwrap();
        assert_relative_eq!(result.average, 2.0);
        assert_relative_eq!(result.variance, 1.0);
        assert_eq!(stats.median(), Some(2.0));
    }

    #[test]
    fn array_of_one_is_never_available() {
        let mut stats = ArrayStatistics::new(1);
        assert_eq!(stats.update(1.0), None);
        assert_eq!(stats.update(2.0), None);
        assert_eq!(stats.median(), None);
    }

    #[test]
    fn array_clear_restarts_the_window() {
        let mut stats = ArrayStatistics::new(2);
        stats.update(1.0);
        assert!(stats.update(2.0).is_some());
        stats.clear();
        assert_eq!(stats.update(3.0), None);
    }
}
