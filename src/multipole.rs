//! Spherical potentials from a radial density profile
//!
//! [Monopole] is the l = 0 term of a multipole expansion. The density is tabulated on
//! log-spaced nodes over a validity range, the enclosed mass and the outer integral of the
//! potential are integrated node interval by node interval, and both are interpolated in
//! log radius. Outside the validity range the density continues as a power law.

use std::f64::consts::PI;

use itertools::Itertools;

use crate::helpers::logspace;
use crate::potential::{radius, Density, Point, Potential, GRAV};
use crate::quadrature::GaussLegendre;
use crate::spline::{CubicSpline, SplineError};

/// Radial nodes per decade of the validity range
pub const DEFAULT_NODES_PER_DECADE: usize = 25;

const MIN_NODES: usize = 16;

/// Steepest inner slope for which the enclosed mass still converges at the centre
const MIN_INNER_SLOPE: f64 = -2.9;

/// Gauss–Legendre order on each node interval
const INTERVAL_ORDER: usize = 4;

/// ρ = rho0 (r / r0)^slope
#[derive(Debug, Clone, Copy)]
struct PowerLaw {
    r0: f64,
    rho0: f64,
    slope: f64,
}

impl PowerLaw {
    fn density(&self, r: f64) -> f64 {
        self.rho0 * (r / self.r0).powf(self.slope)
    }

    /// ∫ 4π s^(power) ρ(s) ds from r0 to r
    fn moment(&self, r: f64, power: i32) -> f64 {
        let k = (power + 1) as f64 + self.slope;
        let scale = 4. * PI * self.rho0 * self.r0.powi(power + 1);

        if k.abs() < 1e-10 {
            scale * (r / self.r0).ln()
        } else {
            scale * ((r / self.r0).powf(k) - 1.) / k
        }
    }

    fn mass_between(&self, r: f64) -> f64 {
        self.moment(r, 2)
    }

    fn outer_between(&self, r: f64) -> f64 {
        self.moment(r, 1)
    }
}

fn node_radii(rmin: f64, rmax: f64, nodes_per_decade: usize) -> Vec<f64> {
    let decades = (rmax / rmin).log10();
    let n = if decades.is_finite() && decades > 0. {
        ((decades * nodes_per_decade as f64).ceil() as usize + 1).max(MIN_NODES)
    } else {
        MIN_NODES
    };

    logspace(rmin, rmax, n).collect()
}

/// Logarithmic slope of `rho` between nodes `i` and `i + 1`
fn power_law_slope(radii: &[f64], rho: &[f64], i: usize) -> f64 {
    let floor = |rho: f64| rho.max(f64::MIN_POSITIVE);
    (floor(rho[i + 1]) / floor(rho[i])).ln() / (radii[i + 1] / radii[i]).ln()
}

/// Spherically symmetric potential generated by a tabulated density.
///
/// With M(r) the enclosed mass and W(r) = ∫_r^∞ 4π s ρ(s) ds, the potential is
/// Φ = −G (M / r + W), which vanishes at infinity.
#[derive(Debug, Clone)]
pub struct Monopole {
    rmin: f64,
    rmax: f64,
    log_density: CubicSpline,
    mass: CubicSpline,
    outer: CubicSpline,
    inner: PowerLaw,
    tail: Option<PowerLaw>,
}

impl Monopole {
    /// Expand a spherically symmetric `density` over \[rmin, rmax\]. The density is sampled
    /// along the x axis only.
    pub fn from_density<D: Density + ?Sized>(
        density: &D,
        rmin: f64,
        rmax: f64,
        nodes_per_decade: usize,
    ) -> Result<Self, SplineError> {
        Self::from_profile(|r| density.density([r, 0., 0.]), rmin, rmax, nodes_per_decade)
    }

    /// Monopole term of an arbitrary `potential`.
    ///
    /// The enclosed mass comes from [Potential::enclosed_mass], which for non-spherical
    /// models is a flux integral of the force and stays accurate for thin disks where a
    /// sphere average of the density would not. The density is its derivative.
    pub fn from_potential<P: Potential + ?Sized>(
        potential: &P,
        rmin: f64,
        rmax: f64,
        nodes_per_decade: usize,
    ) -> Result<Self, SplineError> {
        let radii = node_radii(rmin, rmax, nodes_per_decade);
        let log_radii = radii.iter().map(|r| r.ln()).collect_vec();
        let masses = radii
            .iter()
            .map(|&r| potential.enclosed_mass(r))
            .collect_vec();

        let cumulative = CubicSpline::new(&log_radii, &masses, false)?;
        let shells = |s: f64| cumulative.derivative(s).max(0.0);

        let rho = radii
            .iter()
            .zip(log_radii.iter())
            .map(|(&r, &s)| shells(s) / (4. * PI * r.powi(3)))
            .collect_vec();

        let rule = GaussLegendre::new(INTERVAL_ORDER);
        let outer_steps = log_radii
            .windows(2)
            .map(|w| rule.integrate(w[0], w[1], |s| shells(s) / s.exp()))
            .collect_vec();

        Self::assemble(&radii, &rho, masses, &outer_steps)
    }

    fn from_profile(
        profile: impl Fn(f64) -> f64,
        rmin: f64,
        rmax: f64,
        nodes_per_decade: usize,
    ) -> Result<Self, SplineError> {
        let radii = node_radii(rmin, rmax, nodes_per_decade);
        // f64::max maps NaN to zero as well
        let rho = radii.iter().map(|&r| profile(r).max(0.0)).collect_vec();
        let inner_slope = power_law_slope(&radii, &rho, 0).max(MIN_INNER_SLOPE);

        let n = radii.len();
        let rule = GaussLegendre::new(INTERVAL_ORDER);
        let mut masses = vec![0.0; n];
        let mut outer_steps = vec![0.0; n - 1];

        masses[0] = 4. * PI * rho[0] * rmin.powi(3) / (3. + inner_slope);

        for i in 0..n - 1 {
            let (lower, upper) = (radii[i].ln(), radii[i + 1].ln());
            let width = upper - lower;
            let mut dm = 0.0;
            let mut dw = 0.0;

            for (x, weight) in rule.unit() {
                let r = (lower + width * x).exp();
                let shell = 4. * PI * r * r * profile(r).max(0.0) * weight * width;
                dm += shell * r;
                dw += shell;
            }

            masses[i + 1] = masses[i] + dm;
            outer_steps[i] = dw;
        }

        Self::assemble(&radii, &rho, masses, &outer_steps)
    }

    /// Build the interpolants from node densities, node masses and the outer integral over
    /// each node interval
    fn assemble(
        radii: &[f64],
        rho: &[f64],
        masses: Vec<f64>,
        outer_steps: &[f64],
    ) -> Result<Self, SplineError> {
        let n = radii.len();
        let (rmin, rmax) = (radii[0], radii[n - 1]);
        let log_radii = radii.iter().map(|r| r.ln()).collect_vec();
        let log_rho = rho
            .iter()
            .map(|&rho| rho.max(f64::MIN_POSITIVE).ln())
            .collect_vec();

        let log_density = CubicSpline::new(&log_radii, &log_rho, true)?;

        let inner = PowerLaw {
            r0: rmin,
            rho0: rho[0],
            slope: power_law_slope(radii, rho, 0).max(MIN_INNER_SLOPE),
        };

        let outer_slope = power_law_slope(radii, rho, n - 2);
        let tail = (outer_slope < -2. && rho[n - 1] > 0.).then_some(PowerLaw {
            r0: rmax,
            rho0: rho[n - 1],
            slope: outer_slope,
        });

        let mut outer = vec![0.0; n];
        outer[n - 1] = tail.map_or(0.0, |tail| {
            -4. * PI * tail.rho0 * rmax * rmax / (2. + tail.slope)
        });

        for i in (0..n - 1).rev() {
            outer[i] = outer[i + 1] + outer_steps[i];
        }

        Ok(Monopole {
            rmin,
            rmax,
            log_density,
            mass: CubicSpline::new(&log_radii, &masses, false)?,
            outer: CubicSpline::new(&log_radii, &outer, false)?,
            inner,
            tail,
        })
    }

    /// Radial validity range
    pub fn range(&self) -> (f64, f64) {
        (self.rmin, self.rmax)
    }

    /// Speed of a circular orbit at radius `r` \[km/s\]
    pub fn circular_velocity(&self, r: f64) -> f64 {
        if r <= 0. {
            return 0.;
        }

        (GRAV * self.mass_and_outer(r).0 / r).max(0.).sqrt()
    }

    /// Enclosed mass and outer integral at `r`
    fn mass_and_outer(&self, r: f64) -> (f64, f64) {
        let first = |spline: &CubicSpline| spline.values()[0];
        let last = |spline: &CubicSpline| spline.values()[spline.values().len() - 1];

        if r < self.rmin {
            let x = r / self.rmin;
            (
                first(&self.mass) * x.powf(3. + self.inner.slope),
                first(&self.outer) - self.inner.outer_between(r),
            )
        } else if r > self.rmax {
            match self.tail {
                Some(tail) => (
                    last(&self.mass) + tail.mass_between(r),
                    last(&self.outer) - tail.outer_between(r),
                ),
                None => (last(&self.mass), 0.0),
            }
        } else {
            let s = r.ln();
            (self.mass.eval(s), self.outer.eval(s))
        }
    }
}

impl Density for Monopole {
    fn density(&self, point: Point) -> f64 {
        let r = radius(point);

        if r < self.rmin {
            self.inner.density(r)
        } else if r > self.rmax {
            self.tail.map_or(0.0, |tail| tail.density(r))
        } else {
            self.log_density.eval(r.ln()).exp()
        }
    }
}

impl Potential for Monopole {
    fn potential(&self, point: Point) -> f64 {
        let r = radius(point);
        let (mass, outer) = self.mass_and_outer(r);

        if r == 0. {
            -GRAV * outer
        } else {
            -GRAV * (mass / r + outer)
        }
    }

    fn force(&self, point: Point) -> Point {
        let r = radius(point);

        if r == 0. {
            return [0.0; 3];
        }

        let scale = -GRAV * self.mass_and_outer(r).0 / (r * r * r);
        [scale * point[0], scale * point[1], scale * point[2]]
    }

    fn enclosed_mass(&self, r: f64) -> f64 {
        if r <= 0. {
            0.
        } else {
            self.mass_and_outer(r).0
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::{Monopole, DEFAULT_NODES_PER_DECADE};
    use crate::potential::analytic::{MiyamotoNagai, Nfw, Plummer};
    use crate::potential::{radius, Density, Point, Potential, Zero, GRAV};

    #[test]
    fn plummer_is_reproduced() {
        let bulge = Plummer::new(1e10, 0.5);
        let monopole = Monopole::from_density(&bulge, 1e-3, 1e3, DEFAULT_NODES_PER_DECADE).unwrap();

        for r in [1e-4, 0.01, 0.5, 3.0, 200., 1e4] {
            let point = [0., r, 0.];

            assert_relative_eq!(
                monopole.enclosed_mass(r),
                bulge.enclosed_mass(r),
                max_relative = 1e-4
            );
            assert_relative_eq!(
                monopole.potential(point),
                bulge.potential(point),
                max_relative = 1e-4
            );
        }

        assert_relative_eq!(
            monopole.density([0., 0., 0.7]),
            bulge.density([0.7, 0., 0.]),
            max_relative = 1e-3
        );
        assert_relative_eq!(
            monopole.circular_velocity(2.0),
            (GRAV * bulge.enclosed_mass(2.0) / 2.0).sqrt(),
            max_relative = 1e-4
        );
    }

    #[test]
    fn nfw_force_and_potential_agree() {
        let halo = Nfw::new(3.487e6, 25.2);
        let monopole = Monopole::from_density(&halo, 1e-3, 1e4, DEFAULT_NODES_PER_DECADE).unwrap();

        for r in [0.05, 1.0, 25.0, 800.] {
            let point = [r, 0., 0.];

            assert_relative_eq!(
                monopole.potential(point),
                halo.potential(point),
                max_relative = 1e-3
            );
            assert_relative_eq!(
                monopole.force(point)[0],
                halo.force(point)[0],
                max_relative = 1e-3
            );
        }
    }

    #[test]
    fn shallow_profile_is_truncated() {
        struct Cusp;

        impl Density for Cusp {
            fn density(&self, point: Point) -> f64 {
                1e8 / radius(point)
            }
        }

        let monopole = Monopole::from_density(&Cusp, 1.0, 10.0, DEFAULT_NODES_PER_DECADE).unwrap();
        let expected = 4. * PI * 1e8 * 50.;

        assert_relative_eq!(monopole.enclosed_mass(10.), expected, max_relative = 1e-6);
        assert_relative_eq!(monopole.enclosed_mass(100.), expected, max_relative = 1e-6);
        assert_relative_eq!(
            monopole.enclosed_mass(0.5),
            4. * PI * 1e8 * 0.125,
            max_relative = 1e-6
        );
        assert_eq!(monopole.density([50., 0., 0.]), 0.);
        assert_relative_eq!(
            monopole.potential([100., 0., 0.]),
            -GRAV * expected / 100.,
            max_relative = 1e-6
        );
    }

    #[test]
    fn disk_monopole_matches_gauss_law() {
        let disk = MiyamotoNagai::new(5e10, 3.0, 0.3);
        let monopole = Monopole::from_potential(&disk, 1e-2, 1e3, 10).unwrap();

        for r in [1.0, 5.0, 20.0] {
            assert_relative_eq!(
                monopole.enclosed_mass(r),
                disk.enclosed_mass(r),
                max_relative = 1e-3
            );
        }

        assert!(monopole.density([2.0, 0., 0.]) > monopole.density([4.0, 0., 0.]));

        let empty = Monopole::from_potential(&Zero, 1e-2, 1e2, 10).unwrap();
        assert_eq!(empty.enclosed_mass(1.0), 0.0);
        assert_eq!(empty.potential([1.0, 0., 0.]), 0.0);
    }

    #[test]
    fn empty_range_is_rejected() {
        let bulge = Plummer::new(1e10, 0.5);

        assert!(Monopole::from_density(&bulge, 10., 1., DEFAULT_NODES_PER_DECADE).is_err());
        assert!(Monopole::from_density(&bulge, -1., 1., DEFAULT_NODES_PER_DECADE).is_err());
    }
}
