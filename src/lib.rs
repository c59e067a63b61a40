//! Contraction of dark-matter halos in response to baryons
//!
//! Given the potential of an initial, dark-matter-only halo and the potential of the baryons
//! that settled into it, [contraction] computes the density profile of the contracted halo and
//! returns it as a spherical [multipole::Monopole] potential. Two methods are available, see
//! [Method]:
//!
//! - [Method::Cautun20]: the empirical correction of Cautun et al. (2020), calibrated against
//!   hydrodynamical simulations for a cosmic baryon fraction of 0.157.
//! - [Method::Adiabatic]: invariance of actions. A distribution function is built for the
//!   dark-matter-only system and its density is recomputed in the deepened total potential.
//!
//! The numerical collaborators (distribution functions, moments, interpolation, multipole
//! expansion) are reached through the [engine::Engine] trait, so they can be swapped out.
#![allow(clippy::needless_range_loop)] // Makes math code less readable
#![warn(missing_docs)]

pub mod actions;
pub mod bracket;
pub mod contraction;
pub mod df;
pub mod engine;
pub mod grid;
pub mod helpers;
pub mod moments;
pub mod multipole;
pub mod potential;
pub mod quadrature;
pub mod reconstruct;
pub mod sphericalize;
pub mod spline;

pub use contraction::{
    contraction, contraction_by_name, contraction_with, ContractionError, ContractionOptions,
    Method,
};
