//! Small numerical helpers shared by the grids

/// `n` evenly spaced values from `lower` to `upper`, both included. Requires `n >= 2`.
pub fn linspace(lower: f64, upper: f64, n: usize) -> impl Iterator<Item = f64> {
    (0..n).map(move |x| lower + (upper - lower) * (x as f64) / ((n - 1) as f64))
}

/// `n` logarithmically spaced values from `lower` to `upper`. The endpoints are returned
/// exactly, not as `exp(ln(x))`. Requires `n >= 2` and positive bounds.
pub fn logspace(lower: f64, upper: f64, n: usize) -> impl Iterator<Item = f64> {
    linspace(lower.ln(), upper.ln(), n)
        .enumerate()
        .map(move |(i, x)| {
            if i == 0 {
                lower
            } else if i + 1 == n {
                upper
            } else {
                x.exp()
            }
        })
}

/// Derivative of tabulated `y` with respect to `x` at the nodes, using the three-point formula
/// for non-uniform spacing in the interior and one-sided differences at the ends.
pub(crate) fn nodal_derivative(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let mut result = vec![0.0; n];

    if n < 2 {
        return result;
    }

    result[0] = (y[1] - y[0]) / (x[1] - x[0]);
    result[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);

    for i in 1..n - 1 {
        let h0 = x[i] - x[i - 1];
        let h1 = x[i + 1] - x[i];

        result[i] = -h1 / (h0 * (h0 + h1)) * y[i - 1]
            + (h1 - h0) / (h0 * h1) * y[i]
            + h0 / (h1 * (h0 + h1)) * y[i + 1];
    }

    result
}
