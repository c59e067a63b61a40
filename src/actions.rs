//! Orbits in spherical potentials
//!
//! Energies are relative energies ε = Ψ − v²/2 with Ψ = −Φ, so bound orbits have ε > 0 and the
//! most bound orbit at angular momentum L is the circular one. Potentials are queried along
//! the x axis, which is exact for spherical models.

use std::f64::consts::{LN_2, PI};

use crate::bracket::{Bisection, BracketSearcher, Brent, Point as Sample};
use crate::potential::Potential;
use crate::quadrature::GaussLegendre;

const MAX_EXPANSIONS: usize = 200;

/// Relative potential Ψ = −Φ at radius `r`
pub fn relative_potential<P: Potential + ?Sized>(potential: &P, r: f64) -> f64 {
    -potential.potential([r, 0., 0.])
}

/// Squared speed of a circular orbit at radius `r`
pub fn circular_speed_squared<P: Potential + ?Sized>(potential: &P, r: f64) -> f64 {
    (-r * potential.force([r, 0., 0.])[0]).max(0.)
}

/// Angular momentum and relative energy of the circular orbit at radius `r`
pub fn circular_orbit<P: Potential + ?Sized>(potential: &P, r: f64) -> (f64, f64) {
    let v2 = circular_speed_squared(potential, r);
    (r * v2.sqrt(), relative_potential(potential, r) - 0.5 * v2)
}

/// v_r² = 2 (Ψ(r) − ε) − L² / r²
pub fn radial_speed_squared<P: Potential + ?Sized>(
    potential: &P,
    energy: f64,
    l: f64,
    r: f64,
) -> f64 {
    2. * (relative_potential(potential, r) - energy) - (l / r).powi(2)
}

/// Innermost and outermost radius of an orbit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurningPoints {
    /// Smallest radius reached, zero for radial orbits
    pub pericentre: f64,
    /// Largest radius reached
    pub apocentre: f64,
}

/// Step through ln r from `start` until `f` drops below zero. Returns the last point where `f`
/// was non-negative together with the first negative one.
fn expand(start: Sample, step: f64, f: &impl Fn(f64) -> f64) -> Option<(Sample, Sample)> {
    let mut inside = start;

    for _ in 0..MAX_EXPANSIONS {
        let next = Sample::eval(inside.x + step, f);

        if !next.f.is_finite() {
            return None;
        }
        if next.f < 0. {
            return Some((inside, next));
        }

        inside = next;
    }

    None
}

/// Turning points of the orbit with relative energy `energy` and angular momentum `l`.
///
/// `inside` must be a radius the orbit passes through. Returns `None` when it is not, or when
/// the orbit is unbound.
pub fn turning_points<P: Potential + ?Sized>(
    potential: &P,
    energy: f64,
    l: f64,
    inside: f64,
) -> Option<TurningPoints> {
    let f = |s: f64| radial_speed_squared(potential, energy, l, s.exp());
    let mut start = Sample::eval(inside.ln(), f);

    let scale = 2. * relative_potential(potential, inside).abs() + (l / inside).powi(2);
    if !(start.f >= -1e-9 * scale) {
        return None;
    }
    // Circular orbits sit exactly on the boundary
    start.f = start.f.max(0.);

    let searcher = Brent {
        rel_epsilon: 0.0,
        abs_epsilon: 1e-10,
    };

    let pericentre = if l == 0. {
        0.
    } else {
        match expand(start, -LN_2, &f) {
            Some((inner, outer)) => searcher.search(outer, inner, f)?.root.exp(),
            None => 0.,
        }
    };

    let (inner, outer) = expand(start, LN_2, &f)?;
    let apocentre = searcher.search(inner, outer, f)?.root.exp();

    Some(TurningPoints {
        pericentre: pericentre.min(inside),
        apocentre: apocentre.max(inside),
    })
}

/// Radial action J_r = (1/π) ∫ v_r dr between the turning points.
///
/// The integral uses r = r̄ − Δ cos η, which removes the square-root singularities at both
/// turning points.
pub fn radial_action<P: Potential + ?Sized>(
    potential: &P,
    energy: f64,
    l: f64,
    inside: f64,
    rule: &GaussLegendre,
) -> Option<f64> {
    let TurningPoints {
        pericentre,
        apocentre,
    } = turning_points(potential, energy, l, inside)?;

    let mid = 0.5 * (apocentre + pericentre);
    let half = 0.5 * (apocentre - pericentre);

    if half <= 0. {
        return Some(0.);
    }

    let integral = rule.integrate(0., PI, |eta| {
        let r = mid - half * eta.cos();
        eta.sin() * radial_speed_squared(potential, energy, l, r).max(0.).sqrt()
    });

    Some(half * integral / PI)
}

/// Radius of the circular orbit with angular momentum `l`
pub fn circular_radius<P: Potential + ?Sized>(potential: &P, l: f64) -> Option<f64> {
    if l == 0. {
        return Some(0.);
    }

    // r v_c² grows outwards in any realistic potential
    let excess = |s: f64| l * l - s.exp() * circular_speed_squared(potential, s.exp());
    let start = Sample::eval(0., excess);

    let (lower, upper) = if start.f >= 0. {
        expand(start, LN_2, &excess)?
    } else {
        let negated = |s: f64| -excess(s);
        let (outer, inner) = expand(Sample { x: 0., f: -start.f }, -LN_2, &negated)?;
        (
            Sample {
                x: inner.x,
                f: -inner.f,
            },
            Sample {
                x: outer.x,
                f: -outer.f,
            },
        )
    };

    let searcher = Bisection {
        rel_epsilon: 0.0,
        abs_epsilon: 1e-12,
    };

    Some(searcher.search(lower, upper, excess)?.root.exp())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::{circular_orbit, circular_radius, radial_action, turning_points};
    use crate::potential::analytic::Plummer;
    use crate::potential::{radius, Density, Point, Potential};
    use crate::quadrature::GaussLegendre;

    /// Φ = −1 / r
    struct Kepler;

    impl Density for Kepler {
        fn density(&self, _point: Point) -> f64 {
            0.
        }
    }

    impl Potential for Kepler {
        fn potential(&self, point: Point) -> f64 {
            -1. / radius(point)
        }

        fn force(&self, point: Point) -> Point {
            let r3 = radius(point).powi(3);
            [-point[0] / r3, -point[1] / r3, -point[2] / r3]
        }
    }

    #[test]
    fn kepler_turning_points_and_action() {
        let rule = GaussLegendre::new(24);
        let (energy, l): (f64, f64) = (0.5, 0.5);

        // 1 / r_p,a are the roots of L² u² − 2u + 2ε = 0
        let discriminant = (1. - 2. * energy * l * l).sqrt();
        let expected_peri = l * l / (1. + discriminant);
        let expected_apo = l * l / (1. - discriminant);

        let points = turning_points(&Kepler, energy, l, 0.25).unwrap();
        assert_relative_eq!(points.pericentre, expected_peri, max_relative = 1e-8);
        assert_relative_eq!(points.apocentre, expected_apo, max_relative = 1e-8);

        let action = radial_action(&Kepler, energy, l, 0.25, &rule).unwrap();
        assert_relative_eq!(action, 1. / (2. * energy).sqrt() - l, max_relative = 1e-8);

        // Radial orbit
        let action = radial_action(&Kepler, energy, 0., 0.5, &rule).unwrap();
        assert_relative_eq!(action, 1. / (2. * energy).sqrt(), max_relative = 1e-3);
    }

    #[test]
    fn circular_orbits_have_no_radial_action() {
        let bulge = Plummer::new(1e10, 0.5);
        let rule = GaussLegendre::new(24);

        for r in [0.1, 1.0, 10.0] {
            let (l, energy) = circular_orbit(&bulge, r);

            assert!(radial_action(&bulge, energy, l, r, &rule).unwrap() < 1e-6 * l);
            assert_relative_eq!(circular_radius(&bulge, l).unwrap(), r, max_relative = 1e-8);
        }
    }

    #[test]
    fn forbidden_radius_is_rejected() {
        // The orbit with ε = 0.5, L = 0.5 never reaches r = 10
        assert!(turning_points(&Kepler, 0.5, 0.5, 10.).is_none());
        // Unbound
        assert!(turning_points(&Kepler, -0.1, 0.5, 1.).is_none());
    }
}
