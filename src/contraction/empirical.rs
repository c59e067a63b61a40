//! Empirical contraction of Cautun et al. (2020)
//!
//! The contracted density follows in closed form from the enclosed masses and densities of
//! the original halo and of the baryons, through η = M_bar / M_dm (1 − f) / f. The relation
//! only holds for the cosmic baryon fraction f it was calibrated on.

use ndarray::Array1;
use tracing::debug;

use crate::contraction::ContractionError;
use crate::engine::Engine;
use crate::grid::RadialGrid;
use crate::potential::{Density, Potential};
use crate::sphericalize::sphericalize;

/// Cosmic baryon fraction of the calibration
pub const BARYON_FRACTION: f64 = 0.157;

/// Contracted density from enclosed masses and densities of the halo and the sphericalized
/// baryons, all sampled at the same radii
pub fn cautun20(
    dm_mass: &Array1<f64>,
    baryon_mass: &Array1<f64>,
    dm_density: &Array1<f64>,
    baryon_density: &Array1<f64>,
) -> Array1<f64> {
    let f = BARYON_FRACTION;

    let eta = baryon_mass / dm_mass * ((1. - f) / f);
    let factor = eta.mapv(|eta| 0.45 + 0.41 * (eta + 0.98).powf(0.53));
    let temp = baryon_density - &(&eta * dm_density * (f / (1. - f)));
    let slope = eta.mapv(|eta| 0.41 * 0.53 * (eta + 0.98).powf(0.53 - 1.) * (1. - f) / f);

    dm_density * &factor + slope * &temp
}

/// Contract `dm` by `baryons` on `grid`
pub(crate) fn contract<E: Engine + ?Sized>(
    engine: &E,
    dm: &dyn Potential,
    baryons: &dyn Potential,
    grid: &RadialGrid,
) -> Result<Array1<f64>, ContractionError> {
    let sphericalized = sphericalize(engine, baryons, grid)?;

    debug!(valid = sphericalized.mask.count(), "sphericalized baryons");

    let dm_mass = dm.enclosed_masses(grid.radii());
    let dm_density = dm.densities(grid.points());
    let baryon_density = sphericalized.density.densities(grid.points());

    Ok(cautun20(
        &dm_mass,
        &sphericalized.masses,
        &dm_density,
        &baryon_density,
    ))
}
