//! Spherically averaged baryon profiles
//!
//! The enclosed mass of an arbitrary mass distribution is sampled on the grid, radii where it
//! fails to grow are discarded, and the remaining cumulative mass is turned back into a
//! density through its derivative, ρ = dM/dr / (4π r²).

use std::f64::consts::PI;

use ndarray::Array1;
use tracing::{debug, warn};

use crate::contraction::ContractionError;
use crate::engine::Engine;
use crate::grid::RadialGrid;
use crate::potential::{radius, Density, Point, Potential};
use crate::spline::{CubicSpline, SplineError};

/// Relative growth below which a cumulative mass sample is considered noise
const MASS_TOLERANCE: f64 = 0.999;

/// Which grid radii carry a trustworthy value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityMask(Box<[bool]>);

impl ValidityMask {
    /// Radius `i` is valid when it is the first one or when its mass exceeds the mass at the
    /// previous radius within a relative tolerance of 0.999
    pub fn increasing_mass(masses: &[f64]) -> Self {
        let valid = (0..masses.len())
            .map(|i| i == 0 || masses[i] * MASS_TOLERANCE > masses[i - 1])
            .collect();

        ValidityMask(valid)
    }

    /// Values that are finite and strictly positive
    pub fn positive(values: &[f64]) -> Self {
        ValidityMask(
            values
                .iter()
                .map(|&value| value.is_finite() && value > 0.)
                .collect(),
        )
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of valid entries
    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&valid| valid).count()
    }

    /// Whether entry `i` is valid
    pub fn is_valid(&self, i: usize) -> bool {
        self.0[i]
    }

    /// Flags in grid order
    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// The entries of `values` marked valid, in order
    pub fn select(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.0.iter())
            .filter_map(|(&value, &valid)| valid.then_some(value))
            .collect()
    }
}

/// Density implied by a cumulative mass profile M(r).
///
/// Between the first and last sample, ρ = max(dM/d ln r, 0) / (4π r³) from a shape-preserving
/// spline of M against ln r. Inside the first sample the density is held at its value there,
/// beyond the last sample it is zero.
#[derive(Debug, Clone)]
pub struct CumulativeMassDensity {
    mass: CubicSpline,
}

impl CumulativeMassDensity {
    /// Build from `masses` enclosed within strictly increasing `radii`
    pub fn new(radii: &[f64], masses: &[f64]) -> Result<Self, SplineError> {
        let log_radii: Vec<f64> = radii.iter().map(|r| r.ln()).collect();

        Ok(CumulativeMassDensity {
            mass: CubicSpline::new(&log_radii, masses, true)?,
        })
    }

    fn shell_density(&self, r: f64) -> f64 {
        self.mass.derivative(r.ln()).max(0.) / (4. * PI * r.powi(3))
    }
}

impl Density for CumulativeMassDensity {
    fn density(&self, point: Point) -> f64 {
        let (first, last) = self.mass.domain();
        let r = radius(point);

        if r == 0. || r.ln() < first {
            self.shell_density(first.exp())
        } else if r.ln() > last {
            0.
        } else {
            self.shell_density(r)
        }
    }
}

/// Sphericalized density, either empty or backed by a cumulative-mass profile
#[derive(Debug, Clone)]
pub enum SphericalDensity<C> {
    /// No mass anywhere on the grid
    Empty,
    /// Density reconstructed from the valid cumulative-mass samples
    Profile(C),
}

impl<C: Density> Density for SphericalDensity<C> {
    fn density(&self, point: Point) -> f64 {
        match self {
            SphericalDensity::Empty => 0.,
            SphericalDensity::Profile(profile) => profile.density(point),
        }
    }
}

/// Result of sphericalizing a mass distribution on a grid
#[derive(Debug, Clone)]
pub struct Sphericalized<C> {
    /// Enclosed mass at every grid radius, valid or not
    pub masses: Array1<f64>,
    /// Radii whose enclosed mass grows
    pub mask: ValidityMask,
    /// Density implied by the valid samples
    pub density: SphericalDensity<C>,
}

/// Spherically average `potential` on `grid`.
///
/// A distribution without any mass produces an empty density. Otherwise at least two radii
/// must pass the increasing-mass test, or [ContractionError::DegenerateInput] is returned.
pub fn sphericalize<E: Engine + ?Sized>(
    engine: &E,
    potential: &dyn Potential,
    grid: &RadialGrid,
) -> Result<Sphericalized<E::Cumulative>, ContractionError> {
    let masses = potential.enclosed_masses(grid.radii());
    let mask = ValidityMask::increasing_mass(&masses.to_vec());

    if masses.iter().all(|&mass| mass == 0.) {
        debug!("sphericalized distribution has no mass");
        return Ok(Sphericalized {
            masses,
            mask,
            density: SphericalDensity::Empty,
        });
    }

    let valid = mask.count();

    if valid < 2 {
        return Err(ContractionError::DegenerateInput { valid });
    }
    if valid < grid.len() {
        warn!(
            dropped = grid.len() - valid,
            "enclosed mass does not grow at some radii, dropping them"
        );
    }

    let radii = mask.select(grid.radii());
    let valid_masses = mask.select(&masses.to_vec());
    let density = engine.cumulative_mass_density(&radii, &valid_masses)?;

    Ok(Sphericalized {
        masses,
        mask,
        density: SphericalDensity::Profile(density),
    })
}
