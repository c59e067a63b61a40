//! Distribution functions of spherical systems
//!
//! A [DistributionFunction] is expressed in actions, which are conserved when the potential
//! changes slowly. [QuasiSpherical] is the constant-anisotropy model
//!
//! ```text
//! f(J_r, L) = L^(-2β) g(ε(J_r, L))
//! ```
//!
//! where ε(J_r, L) is the relative energy the orbit has in the potential the model was built
//! for, and g follows from the density of that potential by the generalized Eddington
//! inversion.

use std::f64::consts::PI;

use itertools::Itertools;
use rayon::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::actions::{circular_orbit, radial_action, relative_potential};
use crate::helpers::{linspace, logspace, nodal_derivative};
use crate::potential::Potential;
use crate::quadrature::{gamma, GaussLegendre};
use crate::spline::SplineError;

/// Phase-space density as a function of the radial action and the angular momentum
pub trait DistributionFunction: Send + Sync {
    /// Value at radial action `jr` and total angular momentum `l`
    fn value(&self, jr: f64, l: f64) -> f64;

    /// Velocity anisotropy β = 1 − σ_t² / (2 σ_r²)
    fn anisotropy(&self) -> f64 {
        0.
    }
}

/// Errors when constructing a distribution function
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum DfError {
    /// The anisotropy cannot be represented
    #[error("Anisotropy {0} is not supported, it must lie in [-0.5, 1)")]
    UnsupportedAnisotropy(f64),
    /// The radial range is empty or not positive
    #[error("Invalid radial range [{0}, {1}]")]
    InvalidRange(f64, f64),
    /// The density/potential pair does not define a distribution function
    #[error("Degenerate density profile: {0}")]
    DegenerateDensity(String),
    /// The density cannot be generated by a non-negative distribution function with this
    /// anisotropy, usually because its cusp is shallower than r^(-2β)
    #[error(
        "No non-negative distribution function with anisotropy {anisotropy}: \
         it turns negative inside r = {radius}"
    )]
    NegativeDistribution {
        /// Requested anisotropy
        anisotropy: f64,
        /// Outermost radius at which g(ε) is negative
        radius: f64,
    },
    /// Interpolation failed
    #[error(transparent)]
    Spline(#[from] SplineError),
}

/// Resolution of [QuasiSpherical]
#[derive(Debug, Clone, PartialEq)]
pub struct DfConfig {
    /// Radii at which the density and potential are tabulated for the energy inversion
    pub radial_nodes: usize,
    /// Circular orbits (rows) in the action table
    pub table_rows: usize,
    /// Binding energies per circular orbit (columns) in the action table
    pub table_columns: usize,
    /// Gauss–Legendre order of the radial action integral
    pub action_order: usize,
}

impl Default for DfConfig {
    fn default() -> Self {
        DfConfig {
            radial_nodes: 400,
            table_rows: 160,
            table_columns: 64,
            action_order: 24,
        }
    }
}

/// Smallest non-zero binding fraction 1 − ε / ε_circ in the action table
const MIN_BINDING: f64 = 1e-7;

/// Largest binding fraction in the action table
const MAX_BINDING: f64 = 1. - 1e-3;

/// Negative g(ε), relative to its maximum, beyond which no distribution function exists
const NEGATIVE_TOLERANCE: f64 = 1e-3;

/// C(β) in ρ r^(2β) = C(β) ∫_0^Ψ g(ε) (Ψ − ε)^(1/2 − β) dε
fn normalization(anisotropy: f64) -> f64 {
    2. * PI * PI.sqrt() * gamma(1. - anisotropy) / gamma(1.5 - anisotropy)
        * 2f64.powf(0.5 - anisotropy)
}

/// Riemann–Liouville integral of order `nu` at the last knot of a piecewise-linear function
fn fractional_integral(knots: &[f64], values: &[f64], nu: f64) -> f64 {
    let n = knots.len();

    if nu == 0. {
        return values[n - 1];
    }

    let energy = knots[n - 1];
    let mut sum = 0.;

    for i in 0..n - 1 {
        let (wa, wb) = (energy - knots[i], energy - knots[i + 1]);
        let (pa, pb) = (wa.powf(nu), wb.powf(nu));
        let base = (pa - pb) / nu;
        let slope = (values[i] - values[i + 1]) / (wa - wb);

        sum += values[i + 1] * base + slope * ((wa * pa - wb * pb) / (nu + 1.) - wb * base);
    }

    sum / gamma(nu)
}

/// g(ε) tabulated on increasing relative energies
#[derive(Debug, Clone)]
struct EnergyDistribution {
    energies: Box<[f64]>,
    values: Box<[f64]>,
}

impl EnergyDistribution {
    fn new<P: Potential + ?Sized>(
        potential: &P,
        anisotropy: f64,
        radii: &[f64],
    ) -> Result<Self, DfError> {
        let n = radii.len();
        let log_radii = radii.iter().map(|r| r.ln()).collect_vec();
        let psi = radii
            .iter()
            .map(|&r| relative_potential(potential, r))
            .collect_vec();

        if let Some(i) = (1..n).find(|&i| !(psi[i] < psi[i - 1])) {
            return Err(DfError::DegenerateDensity(format!(
                "potential does not increase outwards at r = {}",
                radii[i]
            )));
        }
        if !(psi[n - 1] > 0.) {
            return Err(DfError::DegenerateDensity(
                "potential must be negative and vanish at infinity".into(),
            ));
        }

        let scaled = radii
            .iter()
            .map(|&r| r.powf(2. * anisotropy) * potential.density([r, 0., 0.]).max(0.))
            .collect_vec();

        if scaled.iter().all(|&rho| rho == 0.) {
            return Err(DfError::DegenerateDensity("density vanishes".into()));
        }

        let mu = 1.5 - anisotropy;

        // g = D^μ ρ̃ / (C Γ(μ)), written as d/dε I^ν[h]
        let (mut h, nu) = if mu <= 1. {
            (scaled, 1. - mu)
        } else {
            let slopes = nodal_derivative(&log_radii, &scaled);
            let h = radii
                .iter()
                .zip(slopes)
                .map(|(&r, slope)| slope / (r * potential.force([r, 0., 0.])[0]))
                .collect_vec();

            (h, 2. - mu)
        };

        if h.iter().any(|value| !value.is_finite()) {
            return Err(DfError::DegenerateDensity(
                "density derivative with respect to the potential is not finite".into(),
            ));
        }

        let mut energies = psi;
        energies.reverse();
        h.reverse();

        // h grows linearly from zero at ε = 0 to its first node
        let knots = std::iter::once(0.).chain(energies.iter().copied()).collect_vec();
        let values = std::iter::once(0.).chain(h).collect_vec();

        let integrals = (2..=knots.len())
            .map(|end| fractional_integral(&knots[..end], &values[..end], nu))
            .collect_vec();

        let scale = normalization(anisotropy) * gamma(mu);
        let values = nodal_derivative(&energies, &integrals)
            .into_iter()
            .map(|derivative| derivative / scale)
            .collect_vec();

        // A density cusp shallower than r^(-2β) has no non-negative solution
        let largest = values.iter().copied().fold(0., f64::max);
        if let Some(i) = values
            .iter()
            .position(|&value| value < -NEGATIVE_TOLERANCE * largest)
        {
            return Err(DfError::NegativeDistribution {
                anisotropy,
                radius: radii[n - 1 - i],
            });
        }

        let values = values.into_iter().map(|value| value.max(0.)).collect();

        Ok(EnergyDistribution {
            energies: energies.into(),
            values,
        })
    }

    fn eval(&self, energy: f64) -> f64 {
        let n = self.energies.len();
        let (lowest, highest) = (self.energies[0], self.energies[n - 1]);

        if !(energy > 0.) {
            return 0.;
        }
        if energy <= lowest {
            return self.values[0] * energy / lowest;
        }
        if energy >= highest {
            return self.values[n - 1];
        }

        let i = self.energies.partition_point(|&e| e <= energy).clamp(1, n - 1) - 1;
        let (e0, e1) = (self.energies[i], self.energies[i + 1]);
        let (g0, g1) = (self.values[i], self.values[i + 1]);

        if g0 > 0. && g1 > 0. {
            g0 * (g1 / g0).powf((energy / e0).ln() / (e1 / e0).ln())
        } else {
            g0 + (energy - e0) / (e1 - e0) * (g1 - g0)
        }
    }
}

/// Binding fractions b = 1 − ε / ε_circ of the action table columns: the circular orbit,
/// then values uniform in ln(b / (1 − b)) so both near-circular and near-radial orbits are
/// resolved
fn binding_fractions(columns: usize) -> Vec<f64> {
    let logit = |b: f64| (b / (1. - b)).ln();

    std::iter::once(0.)
        .chain(
            linspace(logit(MIN_BINDING), logit(MAX_BINDING), columns.max(3) - 1)
                .map(|x| 1. / (1. + (-x).exp())),
        )
        .collect()
}

/// Radial actions on a grid of circular orbits and binding fractions of their energy
#[derive(Debug, Clone)]
struct ActionTable {
    /// ln L of each row, increasing
    log_momenta: Box<[f64]>,
    /// Relative energy of the circular orbit of each row
    circular_energies: Box<[f64]>,
    /// 1 − ε / ε_circ of each column, increasing from zero
    bindings: Box<[f64]>,
    /// Radial action per row and column, non-decreasing along a row
    actions: Box<[Box<[f64]>]>,
}

impl ActionTable {
    fn new<P: Potential + ?Sized>(
        potential: &P,
        radii: &[f64],
        columns: usize,
        rule: &GaussLegendre,
    ) -> Result<Self, DfError> {
        let bindings = binding_fractions(columns);

        let rows = radii
            .par_iter()
            .map(|&r| {
                let (l, energy) = circular_orbit(potential, r);

                if !(energy > 0. && l > 0.) {
                    return Err(DfError::DegenerateDensity(format!(
                        "no bound circular orbit at r = {r}"
                    )));
                }

                let mut actions = Vec::with_capacity(bindings.len());
                actions.push(0.);

                for &binding in &bindings[1..] {
                    let orbit_energy = (1. - binding) * energy;
                    let action = radial_action(potential, orbit_energy, l, r, rule)
                        .ok_or_else(|| {
                            DfError::DegenerateDensity(format!(
                                "no bound orbit with energy {orbit_energy} and angular momentum {l}"
                            ))
                        })?;
                    let previous = actions[actions.len() - 1];
                    actions.push(f64::max(action, previous));
                }

                Ok((l.ln(), energy, actions.into_boxed_slice()))
            })
            .collect::<Result<Vec<_>, DfError>>()?;

        if let Some(i) = rows.windows(2).position(|w| !(w[1].0 > w[0].0)) {
            return Err(DfError::DegenerateDensity(format!(
                "angular momentum of circular orbits does not increase at r = {}",
                radii[i + 1]
            )));
        }

        let (log_momenta, circular_energies, actions): (Vec<_>, Vec<_>, Vec<_>) =
            rows.into_iter().multiunzip();

        Ok(ActionTable {
            log_momenta: log_momenta.into(),
            circular_energies: circular_energies.into(),
            bindings: bindings.into(),
            actions: actions.into(),
        })
    }

    /// Binding fraction at radial action `jr` in row `row`.
    ///
    /// Linear in J_r up to the first column, where the orbit is epicyclic, power-law
    /// between columns and clamped beyond the last one.
    fn binding(&self, row: usize, jr: f64) -> f64 {
        let actions = &self.actions[row];
        let bindings = &self.bindings;
        let m = actions.len();

        if !(jr > 0.) {
            return 0.;
        }
        if jr < actions[1] {
            return bindings[1] * jr / actions[1];
        }
        if jr >= actions[m - 1] {
            return bindings[m - 1];
        }

        let k = actions.partition_point(|&a| a <= jr).clamp(1, m - 1) - 1;
        let (a0, a1) = (actions[k], actions[k + 1]);

        if !(a1 > a0 && a0 > 0.) {
            return bindings[k];
        }

        let t = (jr / a0).ln() / (a1 / a0).ln();
        bindings[k] * (bindings[k + 1] / bindings[k]).powf(t)
    }

    /// Relative energy of the orbit with radial action `jr` in row `row`
    fn row_energy(&self, row: usize, jr: f64) -> f64 {
        self.circular_energies[row] * (1. - self.binding(row, jr))
    }

    /// Relative energy of the orbit with actions (`jr`, `l`).
    ///
    /// Rows are interpolated linearly in ln L. Below the first row the energy is
    /// extrapolated linearly in L, towards radial orbits; above the last row it is clamped.
    fn energy(&self, jr: f64, l: f64) -> f64 {
        let n = self.log_momenta.len();
        let s = l.ln();

        let (i, t) = if !(s > self.log_momenta[0]) {
            let (l0, l1) = (self.log_momenta[0].exp(), self.log_momenta[1].exp());
            (0, (l.max(0.) - l0) / (l1 - l0))
        } else if s >= self.log_momenta[n - 1] {
            (n - 2, 1.)
        } else {
            let i = self.log_momenta.partition_point(|&x| x <= s).clamp(1, n - 1) - 1;
            let t = (s - self.log_momenta[i]) / (self.log_momenta[i + 1] - self.log_momenta[i]);
            (i, t)
        };

        let (e0, e1) = (self.row_energy(i, jr), self.row_energy(i + 1, jr));

        e0 + t * (e1 - e0)
    }
}

/// Constant-anisotropy distribution function of a spherical potential-density pair
#[derive(Debug, Clone)]
pub struct QuasiSpherical {
    anisotropy: f64,
    energy: EnergyDistribution,
    table: ActionTable,
}

impl QuasiSpherical {
    /// Distribution function reproducing the density of `potential`, tabulated over
    /// \[rmin, rmax\]. The anisotropy must lie in \[-0.5, 1) and, for a central cusp
    /// ρ ∝ r^(-γ), must not exceed γ / 2.
    pub fn new<P: Potential + ?Sized>(
        potential: &P,
        anisotropy: f64,
        rmin: f64,
        rmax: f64,
        config: &DfConfig,
    ) -> Result<Self, DfError> {
        if !(-0.5..1.).contains(&anisotropy) {
            return Err(DfError::UnsupportedAnisotropy(anisotropy));
        }
        if !(rmin > 0. && rmin < rmax && rmax.is_finite()) {
            return Err(DfError::InvalidRange(rmin, rmax));
        }

        let radii = logspace(rmin, rmax, config.radial_nodes.max(16)).collect_vec();
        let energy = EnergyDistribution::new(potential, anisotropy, &radii)?;

        let rule = GaussLegendre::new(config.action_order);
        let rows = logspace(rmin, rmax, config.table_rows.max(2)).collect_vec();
        let table = ActionTable::new(potential, &rows, config.table_columns, &rule)?;

        debug!(
            anisotropy,
            energies = energy.energies.len(),
            rows = rows.len(),
            "built distribution function"
        );

        Ok(QuasiSpherical {
            anisotropy,
            energy,
            table,
        })
    }

    /// g(ε), the energy part of the distribution function
    pub fn energy_distribution(&self, energy: f64) -> f64 {
        self.energy.eval(energy)
    }

    /// Relative energy in the original potential of the orbit with actions (`jr`, `l`)
    pub fn energy(&self, jr: f64, l: f64) -> f64 {
        self.table.energy(jr, l)
    }
}

impl DistributionFunction for QuasiSpherical {
    fn value(&self, jr: f64, l: f64) -> f64 {
        let angular = if self.anisotropy == 0. {
            1.
        } else {
            l.powf(-2. * self.anisotropy)
        };

        angular * self.energy.eval(self.table.energy(jr, l))
    }

    fn anisotropy(&self) -> f64 {
        self.anisotropy
    }
}
