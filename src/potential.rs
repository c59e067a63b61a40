//! Density and potential queries
//!
//! Everything the contraction consumes or produces is a [Potential]: the initial halo, the
//! baryons, the sphericalized total and the contracted result. Units are fixed by [GRAV]:
//! masses in solar masses, lengths in kpc and velocities in km/s. Potentials vanish at
//! infinity.

use std::f64::consts::PI;

use ndarray::Array1;

use crate::quadrature::GaussLegendre;

/// Cartesian position
pub type Point = [f64; 3];

/// Gravitational constant \[kpc (km/s)^2 / Msun\]
pub const GRAV: f64 = 4.300_917_270_038e-6;

/// Nodes per angular direction for sphere averages
const ANGULAR_ORDER: usize = 16;

/// Euclidean norm of a point
pub fn radius(point: Point) -> f64 {
    (point[0] * point[0] + point[1] * point[1] + point[2] * point[2]).sqrt()
}

/// Mass density that can be evaluated anywhere. Evaluation is shared across threads.
pub trait Density: Send + Sync {
    /// Density at `point` \[Msun/kpc^3\]
    fn density(&self, point: Point) -> f64;

    /// Density at each of `points`
    fn densities(&self, points: &[Point]) -> Array1<f64> {
        points.iter().map(|&point| self.density(point)).collect()
    }
}

/// Gravitational potential together with the density generating it
pub trait Potential: Density {
    /// Potential at `point` \[(km/s)^2\]
    fn potential(&self, point: Point) -> f64;

    /// Force per unit mass at `point`, the negative gradient of the potential
    fn force(&self, point: Point) -> Point;

    /// Mass within a sphere of radius `r`.
    ///
    /// The default uses Gauss's theorem on the sphere-averaged radial force, so it is exact
    /// for non-spherical distributions as well. Spherical models override it with closed
    /// forms.
    fn enclosed_mass(&self, r: f64) -> f64 {
        if r <= 0.0 {
            return 0.0;
        }

        let radial_force = sphere_average(r, |point| {
            let force = self.force(point);
            (force[0] * point[0] + force[1] * point[1] + force[2] * point[2]) / r
        });

        -radial_force * r * r / GRAV
    }

    /// Potential at each of `points`
    fn potentials(&self, points: &[Point]) -> Array1<f64> {
        points.iter().map(|&point| self.potential(point)).collect()
    }

    /// Force at each of `points`
    fn forces(&self, points: &[Point]) -> Vec<Point> {
        points.iter().map(|&point| self.force(point)).collect()
    }

    /// Enclosed mass at each of `radii`
    fn enclosed_masses(&self, radii: &[f64]) -> Array1<f64> {
        radii.iter().map(|&r| self.enclosed_mass(r)).collect()
    }
}

/// Average of `f` over the sphere of radius `r`, Gauss–Legendre in cos(θ) and uniform in φ
pub fn sphere_average(r: f64, f: impl Fn(Point) -> f64) -> f64 {
    let rule = GaussLegendre::new(ANGULAR_ORDER);
    let n_phi = 2 * ANGULAR_ORDER;
    let mut sum = 0.0;

    for (x, weight) in rule.unit() {
        let cos_theta = 2. * x - 1.;
        let sin_theta = (1. - cos_theta * cos_theta).max(0.0).sqrt();

        for k in 0..n_phi {
            let phi = 2. * PI * (k as f64 + 0.5) / n_phi as f64;
            let point = [
                r * sin_theta * phi.cos(),
                r * sin_theta * phi.sin(),
                r * cos_theta,
            ];
            sum += weight * f(point);
        }
    }

    sum / n_phi as f64
}

/// Sum of several potentials
pub struct Composite<'a> {
    components: Vec<&'a dyn Potential>,
}

impl<'a> Composite<'a> {
    /// Combine `components` into a single potential
    pub fn new(components: Vec<&'a dyn Potential>) -> Self {
        Composite { components }
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether there are no components, in which case everything evaluates to zero
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl Density for Composite<'_> {
    fn density(&self, point: Point) -> f64 {
        self.components.iter().map(|c| c.density(point)).sum()
    }
}

impl Potential for Composite<'_> {
    fn potential(&self, point: Point) -> f64 {
        self.components.iter().map(|c| c.potential(point)).sum()
    }

    fn force(&self, point: Point) -> Point {
        self.components.iter().fold([0.0; 3], |acc, c| {
            let force = c.force(point);
            [acc[0] + force[0], acc[1] + force[1], acc[2] + force[2]]
        })
    }

    fn enclosed_mass(&self, r: f64) -> f64 {
        self.components.iter().map(|c| c.enclosed_mass(r)).sum()
    }
}

/// Empty space
#[derive(Debug, Clone, Copy, Default)]
pub struct Zero;

impl Density for Zero {
    fn density(&self, _point: Point) -> f64 {
        0.0
    }
}

impl Potential for Zero {
    fn potential(&self, _point: Point) -> f64 {
        0.0
    }

    fn force(&self, _point: Point) -> Point {
        [0.0; 3]
    }

    fn enclosed_mass(&self, _r: f64) -> f64 {
        0.0
    }
}

/// Closed-form models
pub mod analytic;

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::analytic::{MiyamotoNagai, Plummer};
    use super::{sphere_average, Composite, Density, Potential, Zero};

    #[test]
    fn sphere_average_of_constant_and_dipole() {
        assert_relative_eq!(sphere_average(2.0, |_| 3.0), 3.0, epsilon = 1e-12);
        assert_relative_eq!(sphere_average(2.0, |p| p[2]), 0.0, epsilon = 1e-12);
        assert_relative_eq!(
            sphere_average(2.0, |p| p[0] * p[0]),
            4.0 / 3.0,
            max_relative = 1e-10
        );
    }

    #[test]
    fn gauss_law_matches_closed_form_mass() {
        struct Unspecialized(Plummer);

        impl Density for Unspecialized {
            fn density(&self, point: super::Point) -> f64 {
                self.0.density(point)
            }
        }

        impl Potential for Unspecialized {
            fn potential(&self, point: super::Point) -> f64 {
                self.0.potential(point)
            }

            fn force(&self, point: super::Point) -> super::Point {
                self.0.force(point)
            }
        }

        let plummer = Plummer::new(1e10, 0.7);
        let generic = Unspecialized(plummer);

        for r in [0.1, 0.7, 5.0] {
            assert_relative_eq!(
                generic.enclosed_mass(r),
                plummer.enclosed_mass(r),
                max_relative = 1e-10
            );
        }
    }

    #[test]
    fn composite_adds_components() {
        let bulge = Plummer::new(1e10, 0.5);
        let disk = MiyamotoNagai::new(5e10, 3.0, 0.3);
        let empty = Zero;
        let components: Vec<&dyn Potential> = vec![&bulge, &disk, &empty];
        let total = Composite::new(components);
        let point = [1.0, 0.5, 0.2];

        assert_eq!(total.len(), 3);
        assert_relative_eq!(
            total.potential(point),
            bulge.potential(point) + disk.potential(point),
            max_relative = 1e-14
        );
        assert_relative_eq!(
            total.enclosed_mass(2.0),
            bulge.enclosed_mass(2.0) + disk.enclosed_mass(2.0),
            max_relative = 1e-12
        );
        assert_eq!(Composite::new(vec![]).potential(point), 0.0);
    }
}
