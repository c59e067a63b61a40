//! Radial sampling shared by every stage of a contraction

use crate::contraction::ContractionError;
use crate::helpers::logspace;
use crate::potential::Point;

/// Number of radii used unless configured otherwise
pub const DEFAULT_GRID_SIZE: usize = 101;

/// Rejects ranges that are empty, not positive or not finite, and grids of fewer than two
/// radii
pub(crate) fn check_range(rmin: f64, rmax: f64, n: usize) -> Result<(), ContractionError> {
    if !(rmin.is_finite() && rmax.is_finite() && rmin > 0.) {
        return Err(ContractionError::InvalidArgument(format!(
            "radial range must be positive and finite, got [{rmin}, {rmax}]"
        )));
    }
    if rmin >= rmax {
        return Err(ContractionError::InvalidArgument(format!(
            "rmin must be smaller than rmax, got {rmin} >= {rmax}"
        )));
    }
    if n < 2 {
        return Err(ContractionError::InvalidArgument(format!(
            "grid needs at least two radii, got {n}"
        )));
    }

    Ok(())
}

/// Logarithmically spaced radii and the matching points on the x axis
#[derive(Debug, Clone)]
pub struct RadialGrid {
    radii: Box<[f64]>,
    points: Box<[Point]>,
}

impl RadialGrid {
    /// `n` radii from `rmin` to `rmax`, both included
    pub fn new(rmin: f64, rmax: f64, n: usize) -> Result<Self, ContractionError> {
        check_range(rmin, rmax, n)?;

        let radii: Box<[f64]> = logspace(rmin, rmax, n).collect();
        let points = radii.iter().map(|&r| [r, 0., 0.]).collect();

        Ok(RadialGrid { radii, points })
    }

    /// Number of radii
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    /// Always false, a grid has at least two radii
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }

    /// Radii in increasing order
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// `(r, 0, 0)` for every radius
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Innermost radius
    pub fn rmin(&self) -> f64 {
        self.radii[0]
    }

    /// Outermost radius
    pub fn rmax(&self) -> f64 {
        self.radii[self.radii.len() - 1]
    }
}
