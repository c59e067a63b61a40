//! Contraction of a dark-matter halo by baryons
//!
//! Both methods produce the contracted density on a logarithmic [RadialGrid]; the samples are
//! then fitted and expanded into a spherical potential by [reconstruct].

use std::fmt::{self, Display};
use std::str::FromStr;

use clap::ValueEnum;
use thiserror::Error;
use tracing::{debug, info};

use crate::df::DfError;
use crate::engine::{Engine, NativeEngine};
use crate::grid::{check_range, RadialGrid, DEFAULT_GRID_SIZE};
use crate::multipole::Monopole;
use crate::potential::Potential;
use crate::reconstruct::reconstruct;
use crate::spline::SplineError;

pub mod adiabatic;
pub mod empirical;

/// Errors of a contraction
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ContractionError {
    /// Unknown method, anisotropy outside \[-0.5, 1\] or invalid radial range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Too few radii where the sphericalized baryon mass grows
    #[error("Sphericalized mass grows at only {valid} grid radii, at least 2 are required")]
    DegenerateInput {
        /// Number of usable radii
        valid: usize,
    },
    /// Too few radii with a positive contracted density
    #[error("Contracted density is positive at only {positive} grid radii, at least 2 are required")]
    DegenerateProfile {
        /// Number of usable radii
        positive: usize,
    },
    /// Interpolation failed
    #[error(transparent)]
    Spline(#[from] SplineError),
    /// The distribution function could not be built
    #[error(transparent)]
    Df(#[from] DfError),
}

/// How the halo responds to the baryons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Method {
    /// Empirical relation of Cautun et al. (2020), calibrated on hydrodynamical simulations
    #[default]
    #[value(name = "C20")]
    Cautun20,
    /// Conservation of actions of the dark-matter orbits
    #[value(name = "adiabatic")]
    Adiabatic,
}

impl FromStr for Method {
    type Err = ContractionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C20" => Ok(Method::Cautun20),
            "adiabatic" => Ok(Method::Adiabatic),
            other => Err(ContractionError::InvalidArgument(format!(
                "unsupported contraction method {other:?}, expected \"C20\" or \"adiabatic\""
            ))),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Cautun20 => write!(f, "C20"),
            Method::Adiabatic => write!(f, "adiabatic"),
        }
    }
}

/// Parameters of a contraction
#[derive(Debug, Clone, PartialEq)]
pub struct ContractionOptions {
    /// Algorithm
    pub method: Method,
    /// Velocity anisotropy β of the halo, in \[-0.5, 1\]. Only the adiabatic method uses it.
    pub anisotropy: f64,
    /// Innermost radius \[kpc\]
    pub rmin: f64,
    /// Outermost radius \[kpc\]
    pub rmax: f64,
    /// Number of grid radii
    pub grid_size: usize,
}

impl Default for ContractionOptions {
    fn default() -> Self {
        ContractionOptions {
            method: Method::default(),
            anisotropy: 0.,
            rmin: 1e-2,
            rmax: 1e4,
            grid_size: DEFAULT_GRID_SIZE,
        }
    }
}

impl ContractionOptions {
    /// Use `method`
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Use velocity anisotropy `anisotropy`
    pub fn with_anisotropy(mut self, anisotropy: f64) -> Self {
        self.anisotropy = anisotropy;
        self
    }

    /// Sample radii from `rmin` to `rmax`
    pub fn with_range(mut self, rmin: f64, rmax: f64) -> Self {
        self.rmin = rmin;
        self.rmax = rmax;
        self
    }

    /// Sample `grid_size` radii
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Check the parameters before any computation. The anisotropy is only checked for the
    /// adiabatic method, the only one that reads it.
    pub fn validate(&self) -> Result<(), ContractionError> {
        if self.method == Method::Adiabatic && !(-0.5..=1.).contains(&self.anisotropy) {
            return Err(ContractionError::InvalidArgument(format!(
                "anisotropy must lie in [-0.5, 1], got {}",
                self.anisotropy
            )));
        }

        check_range(self.rmin, self.rmax, self.grid_size)
    }
}

/// Contract the halo `dm` in response to `baryons` with the native numerics.
///
/// Both inputs are read only. The result is a new spherical potential whose density is the
/// contracted dark-matter density over \[rmin, rmax\].
pub fn contraction(
    dm: &dyn Potential,
    baryons: &dyn Potential,
    options: &ContractionOptions,
) -> Result<Monopole, ContractionError> {
    contraction_with(&NativeEngine::default(), dm, baryons, options)
}

/// Like [contraction], with the method given by name (`"C20"` or `"adiabatic"`) and the
/// default grid size
pub fn contraction_by_name(
    dm: &dyn Potential,
    baryons: &dyn Potential,
    method: &str,
    anisotropy: f64,
    rmin: f64,
    rmax: f64,
) -> Result<Monopole, ContractionError> {
    let options = ContractionOptions::default()
        .with_method(method.parse()?)
        .with_anisotropy(anisotropy)
        .with_range(rmin, rmax);

    contraction(dm, baryons, &options)
}

/// Contract the halo `dm` in response to `baryons` using the numerics of `engine`
pub fn contraction_with<E: Engine + ?Sized>(
    engine: &E,
    dm: &dyn Potential,
    baryons: &dyn Potential,
    options: &ContractionOptions,
) -> Result<E::Spherical, ContractionError> {
    options.validate()?;

    let grid = RadialGrid::new(options.rmin, options.rmax, options.grid_size)?;

    debug!(
        method = %options.method,
        radii = grid.len(),
        rmin = options.rmin,
        rmax = options.rmax,
        "contracting halo"
    );

    let density = match options.method {
        Method::Cautun20 => empirical::contract(engine, dm, baryons, &grid)?,
        Method::Adiabatic => {
            adiabatic::contract(engine, dm, baryons, options.anisotropy, &grid)?
        }
    };

    let result = reconstruct(
        engine,
        grid.radii(),
        &density.to_vec(),
        grid.rmin(),
        grid.rmax(),
    )?;

    info!(method = %options.method, "halo contracted");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array1;

    use super::{
        contraction_by_name, contraction_with, ContractionError, ContractionOptions, Method,
    };
    use crate::df::{DfError, DistributionFunction};
    use crate::engine::{Engine, NativeEngine};
    use crate::multipole::Monopole;
    use crate::potential::analytic::{Nfw, Plummer};
    use crate::potential::{Density, Point, Potential, Zero};
    use crate::sphericalize::CumulativeMassDensity;
    use crate::spline::{CubicSpline, SplineError};

    /// Engine whose distribution function doubles the density of a fixed halo
    struct Doubling {
        halo: Nfw,
        native: NativeEngine,
    }

    struct Flat;

    impl DistributionFunction for Flat {
        fn value(&self, _jr: f64, _l: f64) -> f64 {
            1.
        }
    }

    impl Engine for Doubling {
        type Df = Flat;
        type Curve = CubicSpline;
        type Cumulative = CumulativeMassDensity;
        type Spherical = Monopole;

        fn build_df(
            &self,
            _potential: &dyn Potential,
            _anisotropy: f64,
            _rmin: f64,
            _rmax: f64,
        ) -> Result<Flat, DfError> {
            Ok(Flat)
        }

        fn df_density(&self, _potential: &Monopole, _df: &Flat, points: &[Point]) -> Array1<f64> {
            self.halo.densities(points) * 2.
        }

        fn monopole_from_potential(
            &self,
            potential: &dyn Potential,
            rmin: f64,
            rmax: f64,
        ) -> Result<Monopole, SplineError> {
            self.native.monopole_from_potential(potential, rmin, rmax)
        }

        fn monopole_from_density(
            &self,
            density: &dyn Density,
            rmin: f64,
            rmax: f64,
        ) -> Result<Monopole, SplineError> {
            self.native.monopole_from_density(density, rmin, rmax)
        }

        fn cumulative_mass_density(
            &self,
            radii: &[f64],
            masses: &[f64],
        ) -> Result<CumulativeMassDensity, SplineError> {
            self.native.cumulative_mass_density(radii, masses)
        }

        fn fit_curve(
            &self,
            x: &[f64],
            y: &[f64],
            regularize: bool,
        ) -> Result<CubicSpline, SplineError> {
            self.native.fit_curve(x, y, regularize)
        }
    }

    #[test]
    fn methods_parse_and_print() {
        assert_eq!("C20".parse::<Method>().unwrap(), Method::Cautun20);
        assert_eq!("adiabatic".parse::<Method>().unwrap(), Method::Adiabatic);
        assert_eq!(Method::Cautun20.to_string(), "C20");
        assert_eq!(Method::Adiabatic.to_string(), "adiabatic");
        assert!(matches!(
            "c20".parse::<Method>(),
            Err(ContractionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn options_are_validated() {
        let options = ContractionOptions::default();
        let adiabatic = options.clone().with_method(Method::Adiabatic);

        assert_eq!(options.method, Method::Cautun20);
        assert_eq!(options.grid_size, 101);
        assert!(options.validate().is_ok());
        assert!(adiabatic.clone().with_anisotropy(1.0).validate().is_ok());
        assert!(adiabatic.clone().with_anisotropy(-0.5).validate().is_ok());

        for invalid in [
            adiabatic.clone().with_anisotropy(1.1),
            adiabatic.clone().with_anisotropy(-0.7),
            adiabatic.clone().with_anisotropy(f64::NAN),
            options.clone().with_range(10., 1.),
            options.clone().with_range(0., 1.),
            options.clone().with_grid_size(1),
        ] {
            assert!(matches!(
                invalid.validate(),
                Err(ContractionError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn empirical_method_ignores_anisotropy() {
        let options = ContractionOptions::default();

        for anisotropy in [2., -3., f64::NAN] {
            assert!(options.clone().with_anisotropy(anisotropy).validate().is_ok());
        }

        let halo = Nfw::new(3.487e6, 25.2);
        let options = options.with_anisotropy(2.).with_range(1e-1, 1e2).with_grid_size(21);

        assert!(contraction_with(&NativeEngine::default(), &halo, &Zero, &options).is_ok());
    }

    #[test]
    fn bogus_method_is_rejected_before_any_work() {
        struct Untouchable;

        impl Density for Untouchable {
            fn density(&self, _point: Point) -> f64 {
                panic!("density evaluated")
            }
        }

        impl Potential for Untouchable {
            fn potential(&self, _point: Point) -> f64 {
                panic!("potential evaluated")
            }

            fn force(&self, _point: Point) -> Point {
                panic!("force evaluated")
            }
        }

        let result = contraction_by_name(&Untouchable, &Untouchable, "bogus", 0., 1e-2, 1e4);

        assert!(matches!(result, Err(ContractionError::InvalidArgument(_))));
    }

    #[test]
    fn adiabatic_path_uses_engine() {
        let halo = Nfw::new(3.487e6, 25.2);
        let engine = Doubling {
            halo,
            native: NativeEngine::default(),
        };
        let options = ContractionOptions::default()
            .with_method(Method::Adiabatic)
            .with_range(1e-1, 1e3)
            .with_grid_size(41);

        let result = contraction_with(&engine, &halo, &Zero, &options).unwrap();

        for r in [0.5, 5.0, 50.0] {
            assert_relative_eq!(
                result.density([r, 0., 0.]),
                2. * halo.density([r, 0., 0.]),
                max_relative = 1e-2
            );
        }
    }

    #[test]
    fn baryons_compress_the_halo() {
        let halo = Nfw::new(3.487e6, 25.2);
        let bulge = Plummer::new(1e10, 0.5);
        let options = ContractionOptions::default().with_range(1e-2, 1e3);

        let contracted = contraction_with(&NativeEngine::default(), &halo, &bulge, &options).unwrap();
        let empty = contraction_with(&NativeEngine::default(), &halo, &Zero, &options).unwrap();

        assert!(contracted.density([0.5, 0., 0.]) > empty.density([0.5, 0., 0.]));
        assert!(contracted.enclosed_mass(1.0) > empty.enclosed_mass(1.0));
    }
}
