//! Continuous potentials from sampled density profiles

use tracing::{debug, warn};

use crate::contraction::ContractionError;
use crate::engine::{Engine, Interpolant};
use crate::potential::{radius, Density, Point};
use crate::sphericalize::ValidityMask;

/// Density given by a curve in (ln r, ln ρ)
#[derive(Debug, Clone)]
pub struct LogDensity<C> {
    curve: C,
}

impl<C: Interpolant> LogDensity<C> {
    /// Wrap a curve of ln ρ against ln r
    pub fn new(curve: C) -> Self {
        LogDensity { curve }
    }
}

impl<C: Interpolant> Density for LogDensity<C> {
    fn density(&self, point: Point) -> f64 {
        self.curve.eval(radius(point).ln()).exp()
    }
}

/// Spherical potential whose density interpolates `densities` at `radii`.
///
/// Only strictly positive, finite densities are fitted, in log-log space with a
/// shape-preserving curve. The potential is expanded over \[rmin, rmax\]. Fewer than two
/// usable samples give [ContractionError::DegenerateProfile].
pub fn reconstruct<E: Engine + ?Sized>(
    engine: &E,
    radii: &[f64],
    densities: &[f64],
    rmin: f64,
    rmax: f64,
) -> Result<E::Spherical, ContractionError> {
    let mask = ValidityMask::positive(densities);
    let positive = mask.count();

    if positive < 2 {
        return Err(ContractionError::DegenerateProfile { positive });
    }
    if positive < densities.len() {
        warn!(
            dropped = densities.len() - positive,
            "density is not positive at some radii, excluding them from the fit"
        );
    }

    let log_radii: Vec<f64> = mask.select(radii).iter().map(|r| r.ln()).collect();
    let log_densities: Vec<f64> = mask.select(densities).iter().map(|rho| rho.ln()).collect();

    debug!(samples = positive, rmin, rmax, "fitting density profile");

    let curve = engine.fit_curve(&log_radii, &log_densities, true)?;
    let density = LogDensity::new(curve);

    Ok(engine.monopole_from_density(&density, rmin, rmax)?)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use itertools::Itertools;

    use super::reconstruct;
    use crate::contraction::ContractionError;
    use crate::engine::NativeEngine;
    use crate::helpers::logspace;
    use crate::potential::analytic::Nfw;
    use crate::potential::{Density, Potential};

    #[test]
    fn fitted_radii_are_reproduced() {
        let halo = Nfw::new(3.487e6, 25.2);
        let radii = logspace(1e-2, 1e3, 51).collect_vec();
        let densities = radii
            .iter()
            .map(|&r| halo.density([r, 0., 0.]))
            .collect_vec();

        let result = reconstruct(&NativeEngine::default(), &radii, &densities, 1e-2, 1e3).unwrap();

        for (&r, &rho) in radii.iter().zip(densities.iter()) {
            assert_relative_eq!(result.density([r, 0., 0.]), rho, max_relative = 2e-3);
        }

        for r in logspace(1e-2, 1e3, 400) {
            let rho = result.density([r, 0., 0.]);
            assert!(rho.is_finite() && rho > 0.);
        }

        assert_relative_eq!(
            result.enclosed_mass(50.),
            halo.enclosed_mass(50.),
            max_relative = 2e-3
        );
    }

    #[test]
    fn invalid_samples_are_skipped() {
        let radii = [1., 2., 3., 4., 5.];
        let densities = [f64::NAN, 8., -1., 2., 0.];

        let result = reconstruct(&NativeEngine::default(), &radii, &densities, 1., 5.).unwrap();

        assert_relative_eq!(result.density([2., 0., 0.]), 8., max_relative = 1e-3);
        assert_relative_eq!(result.density([4., 0., 0.]), 2., max_relative = 1e-3);
    }

    #[test]
    fn too_few_positive_samples() {
        let result = reconstruct(
            &NativeEngine::default(),
            &[1., 2., 3.],
            &[1., 0., -1.],
            1.,
            3.,
        );

        assert!(matches!(
            result,
            Err(ContractionError::DegenerateProfile { positive: 1 })
        ));
    }
}
