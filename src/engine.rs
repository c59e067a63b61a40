//! Numerical capabilities a contraction is built on
//!
//! [Engine] groups the collaborators of the contraction algorithms: distribution functions
//! and their moments, monopole expansions and one-dimensional interpolation. Swapping the
//! engine replaces all of them at once, which is how the algorithms are tested against
//! synthetic profiles.

use ndarray::Array1;

use crate::df::{DfConfig, DfError, DistributionFunction, QuasiSpherical};
use crate::moments::{self, MomentConfig};
use crate::multipole::{Monopole, DEFAULT_NODES_PER_DECADE};
use crate::potential::{Density, Point, Potential};
use crate::sphericalize::CumulativeMassDensity;
use crate::spline::{CubicSpline, SplineError};

/// A function of one variable
pub trait Interpolant: Send + Sync {
    /// Value at `x`
    fn eval(&self, x: f64) -> f64;
}

impl Interpolant for CubicSpline {
    fn eval(&self, x: f64) -> f64 {
        CubicSpline::eval(self, x)
    }
}

/// Capability interface of the contraction algorithms
pub trait Engine {
    /// Distribution function type
    type Df: DistributionFunction;
    /// Fitted curve type
    type Curve: Interpolant;
    /// Density reconstructed from a cumulative mass profile
    type Cumulative: Density;
    /// Spherical potential type, also the type of a contracted halo
    type Spherical: Potential;

    /// Distribution function with constant `anisotropy` reproducing the density of the
    /// spherical `potential`, tabulated over \[rmin, rmax\]
    fn build_df(
        &self,
        potential: &dyn Potential,
        anisotropy: f64,
        rmin: f64,
        rmax: f64,
    ) -> Result<Self::Df, DfError>;

    /// Density of `df` in `potential` at `points`
    fn df_density(
        &self,
        potential: &Self::Spherical,
        df: &Self::Df,
        points: &[Point],
    ) -> Array1<f64>;

    /// Monopole term of `potential` over \[rmin, rmax\]
    fn monopole_from_potential(
        &self,
        potential: &dyn Potential,
        rmin: f64,
        rmax: f64,
    ) -> Result<Self::Spherical, SplineError>;

    /// Potential of a spherically symmetric `density` over \[rmin, rmax\]
    fn monopole_from_density(
        &self,
        density: &dyn Density,
        rmin: f64,
        rmax: f64,
    ) -> Result<Self::Spherical, SplineError>;

    /// Density of the cumulative mass profile `masses` at `radii`
    fn cumulative_mass_density(
        &self,
        radii: &[f64],
        masses: &[f64],
    ) -> Result<Self::Cumulative, SplineError>;

    /// Smooth curve through `(x, y)`, shape-preserving with `regularize`
    fn fit_curve(&self, x: &[f64], y: &[f64], regularize: bool)
        -> Result<Self::Curve, SplineError>;
}

/// Resolution of the native numerics
#[derive(Debug, Clone, PartialEq)]
pub struct NativeConfig {
    /// Radial nodes per decade of monopole expansions
    pub nodes_per_decade: usize,
    /// Distribution function tables
    pub df: DfConfig,
    /// Velocity-space quadrature
    pub moments: MomentConfig,
}

impl Default for NativeConfig {
    fn default() -> Self {
        NativeConfig {
            nodes_per_decade: DEFAULT_NODES_PER_DECADE,
            df: DfConfig::default(),
            moments: MomentConfig::default(),
        }
    }
}

/// Engine backed by the numerics of this crate
#[derive(Debug, Clone, Default)]
pub struct NativeEngine {
    config: NativeConfig,
}

impl NativeEngine {
    /// Engine with the given resolution
    pub fn new(config: NativeConfig) -> Self {
        NativeEngine { config }
    }

    /// Resolution in use
    pub fn config(&self) -> &NativeConfig {
        &self.config
    }
}

impl Engine for NativeEngine {
    type Df = QuasiSpherical;
    type Curve = CubicSpline;
    type Cumulative = CumulativeMassDensity;
    type Spherical = Monopole;

    fn build_df(
        &self,
        potential: &dyn Potential,
        anisotropy: f64,
        rmin: f64,
        rmax: f64,
    ) -> Result<QuasiSpherical, DfError> {
        QuasiSpherical::new(potential, anisotropy, rmin, rmax, &self.config.df)
    }

    fn df_density(
        &self,
        potential: &Monopole,
        df: &QuasiSpherical,
        points: &[Point],
    ) -> Array1<f64> {
        moments::density(potential, df, points, &self.config.moments)
    }

    fn monopole_from_potential(
        &self,
        potential: &dyn Potential,
        rmin: f64,
        rmax: f64,
    ) -> Result<Monopole, SplineError> {
        Monopole::from_potential(potential, rmin, rmax, self.config.nodes_per_decade)
    }

    fn monopole_from_density(
        &self,
        density: &dyn Density,
        rmin: f64,
        rmax: f64,
    ) -> Result<Monopole, SplineError> {
        Monopole::from_density(density, rmin, rmax, self.config.nodes_per_decade)
    }

    fn cumulative_mass_density(
        &self,
        radii: &[f64],
        masses: &[f64],
    ) -> Result<CumulativeMassDensity, SplineError> {
        CumulativeMassDensity::new(radii, masses)
    }

    fn fit_curve(&self, x: &[f64], y: &[f64], regularize: bool) -> Result<CubicSpline, SplineError> {
        CubicSpline::new(x, y, regularize)
    }
}
