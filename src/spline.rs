//! One-dimensional cubic interpolation
//!
//! [CubicSpline] is stored in Hermite form: values and first derivatives at the nodes. The
//! derivatives either come from the C2 cubic spline of `ndarray_interp`, or, in regularized
//! mode, from the Fritsch–Carlson construction, which never overshoots the data and keeps
//! monotone segments monotone. The regularized mode is the one to use for noisy or steep
//! profiles.

use ndarray::Array1;
use ndarray_interp::interp1d::{self, Interp1DBuilder};
use thiserror::Error;

/// Errors when constructing an interpolant
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum SplineError {
    /// Fewer than two nodes were supplied
    #[error("At least two points are required for interpolation, got {0}")]
    TooFewPoints(usize),
    /// The abscissae and ordinates have different lengths
    #[error("Length mismatch, got {0} abscissae and {1} ordinates")]
    LengthMismatch(usize, usize),
    /// The abscissae are not strictly increasing at the given index
    #[error("Abscissae must be strictly increasing, violated at index {0}")]
    NotIncreasing(usize),
    /// A node contains a NaN or infinite value
    #[error("Non-finite node at index {0}")]
    NonFinite(usize),
    /// The underlying cubic spline could not be built or evaluated
    #[error("Interpolation failed: {0}")]
    Interpolation(String),
}

/// Piecewise cubic Hermite interpolant with linear extrapolation
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Box<[f64]>,
    y: Box<[f64]>,
    slopes: Box<[f64]>,
}

fn validate(x: &[f64], y: &[f64]) -> Result<(), SplineError> {
    if x.len() != y.len() {
        return Err(SplineError::LengthMismatch(x.len(), y.len()));
    }

    if x.len() < 2 {
        return Err(SplineError::TooFewPoints(x.len()));
    }

    if let Some(i) = (0..x.len()).find(|&i| !x[i].is_finite() || !y[i].is_finite()) {
        return Err(SplineError::NonFinite(i));
    }

    if let Some(i) = (1..x.len()).find(|&i| x[i] <= x[i - 1]) {
        return Err(SplineError::NotIncreasing(i));
    }

    Ok(())
}

/// Node derivatives of the C2 cubic spline through the nodes.
///
/// The spline is evaluated at the thirds of every interval, and each pair of node slopes
/// follows from the four equally spaced values of the cubic on that interval.
fn smooth_slopes(x: &[f64], y: &[f64]) -> Result<Vec<f64>, SplineError> {
    let n = x.len();

    if n == 2 {
        let secant = (y[1] - y[0]) / (x[1] - x[0]);
        return Ok(vec![secant; 2]);
    }

    let thirds = Array1::from_iter(
        x.windows(2)
            .flat_map(|w| [(2. * w[0] + w[1]) / 3., (w[0] + 2. * w[1]) / 3.]),
    );

    let inner = Interp1DBuilder::new(Array1::from_vec(y.to_vec()))
        .x(Array1::from_vec(x.to_vec()))
        .strategy(interp1d::cubic_spline::CubicSpline::new())
        .build()
        .map_err(|err| SplineError::Interpolation(err.to_string()))?
        .interp_array(&thirds)
        .map_err(|err| SplineError::Interpolation(err.to_string()))?;

    let mut slopes = vec![0.0; n];

    for i in 0..n - 1 {
        let step = (x[i + 1] - x[i]) / 3.;
        let (f0, f1, f2, f3) = (y[i], inner[2 * i], inner[2 * i + 1], y[i + 1]);

        slopes[i] = (-11. * f0 + 18. * f1 - 9. * f2 + 2. * f3) / (6. * step);
        if i == n - 2 {
            slopes[n - 1] = (-2. * f0 + 9. * f1 - 18. * f2 + 11. * f3) / (6. * step);
        }
    }

    Ok(slopes)
}

/// Fritsch–Carlson node derivatives (weighted harmonic mean of adjacent secants, zero at local
/// extrema).
fn monotone_slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let secant: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    let mut slopes = vec![0.0; n];
    slopes[0] = secant[0];
    slopes[n - 1] = secant[n - 2];

    for i in 1..n - 1 {
        let (left, right) = (secant[i - 1], secant[i]);

        if left * right <= 0.0 {
            slopes[i] = 0.0;
        } else {
            let w1 = 2. * h[i] + h[i - 1];
            let w2 = h[i] + 2. * h[i - 1];
            slopes[i] = (w1 + w2) / (w1 / left + w2 / right);
        }
    }

    slopes
}

impl CubicSpline {
    /// Interpolate through the nodes `(x[i], y[i])`. `x` must be strictly increasing.
    ///
    /// With `regularize`, the shape-preserving construction is used instead of the C2 spline.
    pub fn new(x: &[f64], y: &[f64], regularize: bool) -> Result<Self, SplineError> {
        validate(x, y)?;

        let slopes = if regularize {
            monotone_slopes(x, y)
        } else {
            smooth_slopes(x, y)?
        };

        Ok(CubicSpline {
            x: x.into(),
            y: y.into(),
            slopes: slopes.into(),
        })
    }

    /// First and last node
    pub fn domain(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Node abscissae
    pub fn nodes(&self) -> &[f64] {
        &self.x
    }

    /// Node values
    pub fn values(&self) -> &[f64] {
        &self.y
    }

    /// Interval index `i` such that `x[i] <= x < x[i + 1]`, clamped to valid intervals
    fn interval(&self, x: f64) -> usize {
        let upper = self.x.partition_point(|&node| node <= x);
        upper.clamp(1, self.x.len() - 1) - 1
    }

    /// Value at `x`. Outside the nodes the spline continues linearly with the end slopes.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.y[0] + self.slopes[0] * (x - self.x[0]);
        }
        if x > self.x[n - 1] {
            return self.y[n - 1] + self.slopes[n - 1] * (x - self.x[n - 1]);
        }

        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        let t = (x - self.x[i]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2. * t3 - 3. * t2 + 1.;
        let h10 = t3 - 2. * t2 + t;
        let h01 = -2. * t3 + 3. * t2;
        let h11 = t3 - t2;

        h00 * self.y[i] + h10 * h * self.slopes[i] + h01 * self.y[i + 1] + h11 * h * self.slopes[i + 1]
    }

    /// First derivative at `x`
    pub fn derivative(&self, x: f64) -> f64 {
        let n = self.x.len();

        if x < self.x[0] {
            return self.slopes[0];
        }
        if x > self.x[n - 1] {
            return self.slopes[n - 1];
        }

        let i = self.interval(x);
        let h = self.x[i + 1] - self.x[i];
        let t = (x - self.x[i]) / h;
        let t2 = t * t;

        let d00 = 6. * t2 - 6. * t;
        let d10 = 3. * t2 - 4. * t + 1.;
        let d01 = -6. * t2 + 6. * t;
        let d11 = 3. * t2 - 2. * t;

        (d00 * self.y[i] + d01 * self.y[i + 1]) / h + d10 * self.slopes[i] + d11 * self.slopes[i + 1]
    }
}
