//! Least-squares quadratic fit over a fixed window of (x, y) samples.
//!
//! Used to tell a constant sink rate (pressure rising linearly over time)
//! from free fall (pressure rising quadratically). Deciding which curvature
//! counts as "linear" is left to the caller.

use fixed_deque::Deque;
use nalgebra::{Matrix3, Vector3};

/// Coefficients of `y = a·x² + b·x + c`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Quadratic {
    pub fn eval(&self, x: f64) -> f64 {
        self.a * x * x + self.b * x + self.c
    }
}

impl From<Vector3<f64>> for Quadratic {
    fn from(v: Vector3<f64>) -> Self {
        Self {
            a: v[0],
            b: v[1],
            c: v[2],
        }
    }
}

/// Ring buffer of the last `capacity` samples and the fit over them.
///
/// The fit solves the normal equations `(MᵀM)·c = Mᵀy` with rows `[x², x, 1]`.
/// Inputs are not checked for conditioning: a window with fewer than three
/// distinct x makes `MᵀM` singular, and the result is then whatever the
/// LU solve produces (no fit when a pivot is exactly zero).
pub struct QuadraticFit {
    samples: Deque<(f64, f64)>,
    capacity: usize,
    coefficients: Option<Quadratic>,
}

impl QuadraticFit {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Deque::new(capacity.max(1)),
            capacity,
            coefficients: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.len() == 0
    }

    /// Adds a sample, overwriting the oldest once full. Returns true whenever
    /// a complete window is available after this call; the fit is then
    /// recomputed over it.
    pub fn feed(&mut self, x: f64, y: f64) -> bool {
        self.samples.push_back((x, y));
        if self.samples.len() < self.capacity {
            return false;
        }
        self.coefficients = self.solve();
        true
    }

    /// Fit over the most recent complete window, if any.
    pub fn coefficients(&self) -> Option<Quadratic> {
        self.coefficients
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.coefficients = None;
    }

    /// Accumulates `MᵀM` and `Mᵀy` straight from the ring, no allocation.
    fn solve(&self) -> Option<Quadratic> {
        let mut normal = Matrix3::<f64>::zeros();
        let mut rhs = Vector3::<f64>::zeros();
        for &(x, y) in self.samples.iter() {
            let row = Vector3::new(x * x, x, 1.0);
            normal += row * row.transpose();
            rhs += row * y;
        }
        normal.lu().solve(&rhs).map(Quadratic::from)
    }
}
