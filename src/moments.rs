//! Density moments of a distribution function

use std::f64::consts::{FRAC_PI_2, PI};

use ndarray::Array1;
use rayon::prelude::*;

use crate::actions::{radial_action, relative_potential};
use crate::df::DistributionFunction;
use crate::potential::{radius, Point, Potential};
use crate::quadrature::GaussLegendre;

/// Quadrature orders of the velocity-space integral
#[derive(Debug, Clone, PartialEq)]
pub struct MomentConfig {
    /// Nodes in speed
    pub speed_order: usize,
    /// Nodes in the angle between velocity and radius
    pub angle_order: usize,
    /// Nodes of the radial action integral of each orbit
    pub action_order: usize,
}

impl Default for MomentConfig {
    fn default() -> Self {
        MomentConfig {
            speed_order: 32,
            angle_order: 24,
            action_order: 24,
        }
    }
}

struct Rules {
    speed: GaussLegendre,
    angle: GaussLegendre,
    action: GaussLegendre,
}

fn density_at<P: Potential + ?Sized, F: DistributionFunction + ?Sized>(
    potential: &P,
    df: &F,
    r: f64,
    rules: &Rules,
) -> f64 {
    let psi = relative_potential(potential, r);

    if !(psi > 0. && r > 0.) {
        return 0.;
    }

    let escape = (2. * psi).sqrt();
    // With θ = (π/2) s^q the L^(-2β) factor of f turns sin θ dθ into a term linear in s
    let exponent = 1. / (1. - df.anisotropy());

    let mut sum = 0.;

    for (x, speed_weight) in rules.speed.unit() {
        let speed = escape * x;
        let energy = psi - 0.5 * speed * speed;
        let mut angular = 0.;

        for (s, angle_weight) in rules.angle.unit() {
            let theta = FRAC_PI_2 * s.powf(exponent);
            let jacobian = FRAC_PI_2 * exponent * s.powf(exponent - 1.);
            let l = r * speed * theta.sin();

            let Some(jr) = radial_action(potential, energy, l, r, &rules.action) else {
                continue;
            };

            angular += angle_weight * jacobian * theta.sin() * df.value(jr, l);
        }

        sum += speed_weight * x * x * 2. * angular;
    }

    2. * PI * escape.powi(3) * sum
}

/// Density generated by `df` in `potential` at each of `points`.
///
/// The velocity integral runs over speeds up to the local escape speed and angles between
/// velocity and radius, using the symmetry between inward and outward motion. Points are
/// evaluated in parallel, the result is in the order of `points`.
pub fn density<P: Potential + ?Sized, F: DistributionFunction + ?Sized>(
    potential: &P,
    df: &F,
    points: &[Point],
    config: &MomentConfig,
) -> Array1<f64> {
    let rules = Rules {
        speed: GaussLegendre::new(config.speed_order),
        angle: GaussLegendre::new(config.angle_order),
        action: GaussLegendre::new(config.action_order),
    };

    let values: Vec<f64> = points
        .par_iter()
        .map(|&point| density_at(potential, df, radius(point), &rules))
        .collect();

    Array1::from(values)
}
