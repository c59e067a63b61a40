//! Adiabatic contraction through conservation of actions
//!
//! The distribution function of the original halo is a function of actions only. Actions do
//! not change when the potential deepens slowly, so the same distribution function evaluated
//! in the potential of halo plus baryons gives the contracted halo directly, without
//! iterating.

use ndarray::Array1;
use tracing::debug;

use crate::contraction::ContractionError;
use crate::engine::Engine;
use crate::grid::RadialGrid;
use crate::potential::{Composite, Potential};

/// Factor by which the tabulated ranges extend beyond the grid on each side
const RANGE_EXTENSION: f64 = 10.;

/// Contract `dm` by `baryons` on `grid`, for a halo with velocity anisotropy `anisotropy`
pub(crate) fn contract<E: Engine + ?Sized>(
    engine: &E,
    dm: &dyn Potential,
    baryons: &dyn Potential,
    anisotropy: f64,
    grid: &RadialGrid,
) -> Result<Array1<f64>, ContractionError> {
    let rmin = grid.rmin() / RANGE_EXTENSION;
    let rmax = grid.rmax() * RANGE_EXTENSION;

    let df = engine.build_df(dm, anisotropy, rmin, rmax)?;

    let components: Vec<&dyn Potential> = vec![dm, baryons];
    let total = engine.monopole_from_potential(&Composite::new(components), rmin, rmax)?;

    debug!(anisotropy, rmin, rmax, "evaluating distribution function in total potential");

    Ok(engine.df_density(&total, &df, grid.points()))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::contract;
    use crate::contraction::ContractionError;
    use crate::engine::NativeEngine;
    use crate::grid::RadialGrid;
    use crate::potential::analytic::{Nfw, Plummer};
    use crate::potential::{Density, Zero};

    #[test]
    fn no_baryons_no_contraction() {
        let halo = Nfw::new(3.487e6, 25.2);
        let grid = RadialGrid::new(0.5, 20., 4).unwrap();

        let density = contract(&NativeEngine::default(), &halo, &Zero, 0., &grid).unwrap();

        for (value, point) in density.iter().zip(grid.points()) {
            assert_relative_eq!(*value, halo.density(*point), max_relative = 5e-2);
        }
    }

    #[test]
    fn inner_cusp_is_preserved_for_any_supported_anisotropy() {
        // Default range, so the first two radii sit well inside r_s / 100
        let halo = Nfw::new(3.487e6, 25.2);
        let grid = RadialGrid::new(1e-2, 1e4, 7).unwrap();

        for anisotropy in [-0.5, 0., 0.5] {
            let density =
                contract(&NativeEngine::default(), &halo, &Zero, anisotropy, &grid).unwrap();

            for (value, point) in density.iter().zip(grid.points()).take(5) {
                assert_relative_eq!(*value, halo.density(*point), max_relative = 5e-2);
            }
        }
    }

    #[test]
    fn baryons_raise_the_central_density() {
        let halo = Nfw::new(3.487e6, 25.2);
        let bulge = Plummer::new(1e10, 0.5);
        let grid = RadialGrid::new(0.5, 5., 2).unwrap();

        let density = contract(&NativeEngine::default(), &halo, &bulge, 0.2, &grid).unwrap();

        for (value, point) in density.iter().zip(grid.points()) {
            assert!(*value > halo.density(*point));
        }
    }

    #[test]
    fn unsupported_anisotropy_fails_in_the_distribution_function() {
        let halo = Nfw::new(3.487e6, 25.2);
        let grid = RadialGrid::new(0.5, 5., 2).unwrap();

        for anisotropy in [1.0, 0.9] {
            assert!(matches!(
                contract(&NativeEngine::default(), &halo, &Zero, anisotropy, &grid),
                Err(ContractionError::Df(_))
            ));
        }
    }
}
