use std::f64::consts::PI;

use super::{radius, Density, Point, Potential, GRAV};

fn radial_force(point: Point, r: f64, mass: f64) -> Point {
    if r == 0.0 {
        return [0.0; 3];
    }

    let scale = -GRAV * mass / (r * r * r);
    [scale * point[0], scale * point[1], scale * point[2]]
}

/// Navarro–Frenk–White halo, ρ = ρ_s / (x (1 + x)^2) with x = r / r_s
#[derive(Debug, Clone, Copy)]
pub struct Nfw {
    /// Characteristic density \[Msun/kpc^3\]
    pub rho_s: f64,
    /// Scale radius \[kpc\]
    pub r_s: f64,
}

impl Nfw {
    /// Halo with characteristic density `rho_s` and scale radius `r_s`
    pub fn new(rho_s: f64, r_s: f64) -> Self {
        Nfw { rho_s, r_s }
    }

    fn mass_scale(&self) -> f64 {
        4. * PI * self.rho_s * self.r_s.powi(3)
    }
}

impl Density for Nfw {
    fn density(&self, point: Point) -> f64 {
        let x = radius(point) / self.r_s;
        self.rho_s / (x * (1. + x).powi(2))
    }
}

impl Potential for Nfw {
    fn potential(&self, point: Point) -> f64 {
        let x = radius(point) / self.r_s;

        // ln(1 + x) / x, which tends to 1 at the centre
        let shape = if x < 1e-8 { 1. - 0.5 * x } else { x.ln_1p() / x };

        -GRAV * self.mass_scale() / self.r_s * shape
    }

    fn force(&self, point: Point) -> Point {
        let r = radius(point);
        radial_force(point, r, self.enclosed_mass(r))
    }

    fn enclosed_mass(&self, r: f64) -> f64 {
        let x = r / self.r_s;

        // ln(1 + x) - x / (1 + x) loses all digits for small x
        let shape = if x < 1e-4 {
            x * x * (0.5 - 2. / 3. * x + 0.75 * x * x)
        } else {
            x.ln_1p() - x / (1. + x)
        };

        self.mass_scale() * shape
    }
}

/// Plummer sphere
#[derive(Debug, Clone, Copy)]
pub struct Plummer {
    /// Total mass \[Msun\]
    pub mass: f64,
    /// Scale radius \[kpc\]
    pub scale: f64,
}

impl Plummer {
    /// Plummer sphere of total `mass` and scale radius `scale`
    pub fn new(mass: f64, scale: f64) -> Self {
        Plummer { mass, scale }
    }
}

impl Density for Plummer {
    fn density(&self, point: Point) -> f64 {
        let r = radius(point);
        3. * self.mass / (4. * PI * self.scale.powi(3))
            * (1. + (r / self.scale).powi(2)).powf(-2.5)
    }
}

impl Potential for Plummer {
    fn potential(&self, point: Point) -> f64 {
        let r = radius(point);
        -GRAV * self.mass / (r * r + self.scale * self.scale).sqrt()
    }

    fn force(&self, point: Point) -> Point {
        let r = radius(point);
        radial_force(point, r, self.enclosed_mass(r))
    }

    fn enclosed_mass(&self, r: f64) -> f64 {
        self.mass * r.powi(3) / (r * r + self.scale * self.scale).powf(1.5)
    }
}

/// Jaffe sphere, ρ = M a / (4π r^2 (r + a)^2). Its r^(-2) cusp supports radial anisotropy
/// up to β = 1.
#[derive(Debug, Clone, Copy)]
pub struct Jaffe {
    /// Total mass \[Msun\]
    pub mass: f64,
    /// Scale radius \[kpc\]
    pub scale: f64,
}

impl Jaffe {
    /// Jaffe sphere of total `mass` and scale radius `scale`
    pub fn new(mass: f64, scale: f64) -> Self {
        Jaffe { mass, scale }
    }
}

impl Density for Jaffe {
    fn density(&self, point: Point) -> f64 {
        let r = radius(point);
        self.mass * self.scale / (4. * PI * r * r * (r + self.scale).powi(2))
    }
}

impl Potential for Jaffe {
    fn potential(&self, point: Point) -> f64 {
        let r = radius(point);
        -GRAV * self.mass / self.scale * (self.scale / r).ln_1p()
    }

    fn force(&self, point: Point) -> Point {
        let r = radius(point);
        radial_force(point, r, self.enclosed_mass(r))
    }

    fn enclosed_mass(&self, r: f64) -> f64 {
        self.mass * r / (r + self.scale)
    }
}

/// Miyamoto–Nagai disk, an axisymmetric flattened model. Its enclosed mass uses the generic
/// sphere-averaged force, which is what sphericalizes it.
#[derive(Debug, Clone, Copy)]
pub struct MiyamotoNagai {
    /// Total mass \[Msun\]
    pub mass: f64,
    /// Radial scale length \[kpc\]
    pub a: f64,
    /// Vertical scale height \[kpc\]
    pub b: f64,
}

impl MiyamotoNagai {
    /// Disk of total `mass`, scale length `a` and scale height `b`
    pub fn new(mass: f64, a: f64, b: f64) -> Self {
        MiyamotoNagai { mass, a, b }
    }
}

impl Density for MiyamotoNagai {
    fn density(&self, point: Point) -> f64 {
        let r2 = point[0] * point[0] + point[1] * point[1];
        let zeta = (point[2] * point[2] + self.b * self.b).sqrt();
        let az = self.a + zeta;

        self.b * self.b * self.mass / (4. * PI)
            * (self.a * r2 + (self.a + 3. * zeta) * az * az)
            / ((r2 + az * az).powf(2.5) * zeta.powi(3))
    }
}

impl Potential for MiyamotoNagai {
    fn potential(&self, point: Point) -> f64 {
        let r2 = point[0] * point[0] + point[1] * point[1];
        let zeta = (point[2] * point[2] + self.b * self.b).sqrt();

        -GRAV * self.mass / (r2 + (self.a + zeta).powi(2)).sqrt()
    }

    fn force(&self, point: Point) -> Point {
        let r2 = point[0] * point[0] + point[1] * point[1];
        let zeta = (point[2] * point[2] + self.b * self.b).sqrt();
        let az = self.a + zeta;
        let scale = -GRAV * self.mass / (r2 + az * az).powf(1.5);

        [
            scale * point[0],
            scale * point[1],
            scale * point[2] * az / zeta,
        ]
    }
}
