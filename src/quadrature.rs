//! Gauss–Legendre quadrature and the gamma function

use std::f64::consts::PI;

/// Gauss–Legendre nodes and weights on \[-1, 1\]
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    nodes: Box<[f64]>,
    weights: Box<[f64]>,
}

/// Legendre polynomial of degree `n` and its derivative at `x`
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;

    for k in 2..=n {
        let k = k as f64;
        let p2 = ((2. * k - 1.) * x * p1 - (k - 1.) * p0) / k;
        p0 = p1;
        p1 = p2;
    }

    if n == 0 {
        return (1.0, 0.0);
    }

    (p1, n as f64 * (x * p1 - p0) / (x * x - 1.))
}

impl GaussLegendre {
    /// Rule with `order` nodes, exact for polynomials up to degree `2 * order - 1`
    pub fn new(order: usize) -> Self {
        let order = order.max(1);
        let mut nodes = vec![0.0; order];
        let mut weights = vec![0.0; order];

        for i in 0..order.div_ceil(2) {
            let mut x = (PI * (i as f64 + 0.75) / (order as f64 + 0.5)).cos();

            for _ in 0..100 {
                let (p, dp) = legendre(order, x);
                let dx = p / dp;
                x -= dx;

                if dx.abs() <= 4. * f64::EPSILON {
                    break;
                }
            }

            let (_, dp) = legendre(order, x);
            let weight = 2. / ((1. - x * x) * dp * dp);

            nodes[i] = -x;
            nodes[order - 1 - i] = x;
            weights[i] = weight;
            weights[order - 1 - i] = weight;
        }

        Self {
            nodes: nodes.into(),
            weights: weights.into(),
        }
    }

    /// Number of nodes
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes mapped onto the open unit interval together with weights summing to one
    pub fn unit(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.nodes
            .iter()
            .zip(self.weights.iter())
            .map(|(&x, &w)| (0.5 * (x + 1.), 0.5 * w))
    }

    /// Integral of `f` over \[lower, upper\]
    pub fn integrate(&self, lower: f64, upper: f64, f: impl Fn(f64) -> f64) -> f64 {
        let half = 0.5 * (upper - lower);
        let mid = 0.5 * (upper + lower);

        half * self
            .nodes
            .iter()
            .zip(self.weights.iter())
            .map(|(&x, &w)| w * f(mid + half * x))
            .sum::<f64>()
    }
}

const LANCZOS_G: f64 = 7.;
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Gamma function (Lanczos approximation, relative accuracy around 1e-15)
pub fn gamma(x: f64) -> f64 {
    if x < 0.5 {
        return PI / ((PI * x).sin() * gamma(1. - x));
    }

    let x = x - 1.;
    let t = x + LANCZOS_G + 0.5;
    let series = LANCZOS_COEFFICIENTS[1..]
        .iter()
        .enumerate()
        .fold(LANCZOS_COEFFICIENTS[0], |acc, (i, c)| {
            acc + c / (x + i as f64 + 1.)
        });

    (2. * PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * series
}
