//! Root finding on a sign-changing bracket

/// Result of a bracket search
#[derive(Debug, Clone, Copy)]
pub struct BracketResult {
    /// Location of the root
    pub root: f64,
    /// Number of function evaluations, not counting the two bracket endpoints
    pub evals: u64,
}

/// Function value at a point
#[derive(Debug, Clone, Copy)]
pub struct Point {
    /// Location
    pub x: f64,
    /// Function value at `x`
    pub f: f64,
}

impl Point {
    /// Evaluate `f` at `x`
    pub fn eval(x: f64, f: impl Fn(f64) -> f64) -> Self {
        Point { x, f: f(x) }
    }
}

/// Searches for a root between two points with function values of opposite sign
pub trait BracketSearcher {
    /// Returns `None` when the endpoints do not bracket a root or when the function value is
    /// not finite somewhere along the search.
    fn search<F: Fn(f64) -> f64>(&self, lower: Point, upper: Point, f: F)
        -> Option<BracketResult>;
}

const MAX_EVALS: u64 = 200;

fn brackets(lower: &Point, upper: &Point) -> bool {
    lower.f.is_finite() && upper.f.is_finite() && lower.f.signum() != upper.f.signum()
}

/// Plain bisection
pub struct Bisection {
    /// Relative tolerance on the root location
    pub rel_epsilon: f64,
    /// Absolute tolerance on the root location
    pub abs_epsilon: f64,
}

impl BracketSearcher for Bisection {
    fn search<F: Fn(f64) -> f64>(
        &self,
        mut lower: Point,
        mut upper: Point,
        f: F,
    ) -> Option<BracketResult> {
        if lower.f == 0.0 {
            return Some(BracketResult { root: lower.x, evals: 0 });
        }
        if upper.f == 0.0 {
            return Some(BracketResult { root: upper.x, evals: 0 });
        }
        if !brackets(&lower, &upper) {
            return None;
        }

        let mut evals = 0;

        loop {
            let delta = (upper.x - lower.x).abs();
            let x = lower.x + 0.5 * (upper.x - lower.x);
            let tolerance = self.abs_epsilon
                + f64::max(upper.x.abs(), lower.x.abs()) * (self.rel_epsilon + f64::EPSILON);

            if delta <= tolerance || evals >= MAX_EVALS {
                return Some(BracketResult { root: x, evals });
            }

            let next = Point::eval(x, &f);
            evals += 1;

            if !next.f.is_finite() {
                return None;
            }

            if upper.f.signum() == next.f.signum() {
                upper = next;
            } else {
                lower = next;
            }
        }
    }
}

/// Brent's method: inverse quadratic interpolation and secant steps, falling back to bisection
pub struct Brent {
    /// Relative tolerance on the root location
    pub rel_epsilon: f64,
    /// Absolute tolerance on the root location
    pub abs_epsilon: f64,
}

impl BracketSearcher for Brent {
    fn search<F: Fn(f64) -> f64>(
        &self,
        lower: Point,
        upper: Point,
        f: F,
    ) -> Option<BracketResult> {
        if lower.f == 0.0 {
            return Some(BracketResult { root: lower.x, evals: 0 });
        }
        if upper.f == 0.0 {
            return Some(BracketResult { root: upper.x, evals: 0 });
        }
        if !brackets(&lower, &upper) {
            return None;
        }

        let mut previous = lower;
        let mut current = upper;
        let mut counterpoint = current;
        let mut d = 0.0;
        let mut e = 0.0;
        let mut evals = 0;

        loop {
            if counterpoint.f.signum() == current.f.signum() {
                counterpoint = previous;
                d = current.x - previous.x;
                e = d;
            }

            if counterpoint.f.abs() < current.f.abs() {
                previous = current;
                (counterpoint, current) = (current, counterpoint);
            }

            let accuracy = 0.5 * (counterpoint.x - current.x);
            let tolerance = self.abs_epsilon
                + (f64::EPSILON + self.rel_epsilon)
                    * f64::max(current.x.abs(), counterpoint.x.abs());

            if accuracy.abs() <= tolerance || current.f == 0.0 || evals >= MAX_EVALS {
                return Some(BracketResult {
                    root: current.x + accuracy,
                    evals,
                });
            }

            if e.abs() >= tolerance && previous.f.abs() >= current.f.abs() {
                let slope = current.f / previous.f;
                let mut p;
                let mut q;

                if previous.f == counterpoint.f {
                    // Secant
                    p = 2.0 * accuracy * slope;
                    q = 1.0 - slope;
                } else {
                    // Inverse quadratic interpolation
                    let slope_ac = previous.f / counterpoint.f;
                    let slope_bc = current.f / counterpoint.f;

                    p = slope
                        * (2.0 * accuracy * slope_ac * (slope_ac - slope_bc)
                            - (current.x - previous.x) * (slope_bc - 1.0));
                    q = (slope_ac - 1.0) * (slope_bc - 1.0) * (slope - 1.0);
                }

                if p > 0.0 {
                    q = -q;
                } else {
                    p = -p;
                }

                let min1 = 3.0 * accuracy * q - (tolerance * q).abs();
                let min2 = (e * q).abs();

                if 2.0 * p < f64::min(min1, min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = accuracy;
                    e = d;
                }
            } else {
                d = accuracy;
                e = d;
            }

            previous = current;

            current.x += if d.abs() > tolerance {
                d
            } else {
                tolerance.copysign(accuracy)
            };
            current.f = f(current.x);
            evals += 1;

            if !current.f.is_finite() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{Bisection, BracketSearcher, Brent, Point};

    fn cubic(x: f64) -> f64 {
        (x - 1.5) * (x * x + 1.)
    }

    #[test]
    fn brent_finds_root() {
        let result = (Brent {
            rel_epsilon: 1e-14,
            abs_epsilon: 0.0,
        })
        .search(Point::eval(0., cubic), Point::eval(4., cubic), cubic)
        .expect("valid bracket");

        assert_relative_eq!(result.root, 1.5, max_relative = 1e-12);
        assert!(result.evals < 50);
    }

    #[test]
    fn bisection_finds_root() {
        let result = (Bisection {
            rel_epsilon: 1e-12,
            abs_epsilon: 0.0,
        })
        .search(Point::eval(0., cubic), Point::eval(4., cubic), cubic)
        .expect("valid bracket");

        assert_relative_eq!(result.root, 1.5, max_relative = 1e-10);
    }

    #[test]
    fn same_sign_is_rejected() {
        let searcher = Brent {
            rel_epsilon: 1e-12,
            abs_epsilon: 0.0,
        };

        assert!(searcher
            .search(Point::eval(2., cubic), Point::eval(4., cubic), cubic)
            .is_none());
    }
}
