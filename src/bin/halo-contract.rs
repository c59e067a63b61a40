use clap::Parser;
use color_eyre::{eyre::Context, Result};
use tracing_subscriber::EnvFilter;

use halocontract::grid::RadialGrid;
use halocontract::multipole::Monopole;
use halocontract::potential::analytic::{MiyamotoNagai, Nfw, Plummer};
use halocontract::potential::{Composite, Density, Potential};
use halocontract::{contraction, ContractionOptions, Method};

/// Contract an NFW halo in response to a bulge and a disk, and print the radial profiles
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Contraction algorithm
    #[arg(short, long, value_enum, default_value_t = ContractionOptions::default().method)]
    method: Method,

    /// Velocity anisotropy of the halo, used by the adiabatic method
    #[arg(
        short,
        long,
        default_value_t = ContractionOptions::default().anisotropy,
        allow_hyphen_values = true
    )]
    anisotropy: f64,

    /// Innermost radius [kpc]
    #[arg(long, default_value_t = ContractionOptions::default().rmin)]
    rmin: f64,

    /// Outermost radius [kpc]
    #[arg(long, default_value_t = ContractionOptions::default().rmax)]
    rmax: f64,

    /// Number of radii
    #[arg(short = 'n', long, default_value_t = ContractionOptions::default().grid_size)]
    grid_size: usize,

    /// Characteristic density of the halo [Msun/kpc^3]
    #[arg(long, default_value_t = 3.487e6)]
    halo_density: f64,

    /// Scale radius of the halo [kpc]
    #[arg(long, default_value_t = 25.2)]
    halo_radius: f64,

    /// Plummer bulge mass [Msun]
    #[arg(long, default_value_t = 1e10)]
    bulge_mass: f64,

    /// Plummer bulge scale radius [kpc]
    #[arg(long, default_value_t = 0.5)]
    bulge_radius: f64,

    /// Miyamoto-Nagai disk mass [Msun]
    #[arg(long, default_value_t = 5e10)]
    disk_mass: f64,

    /// Miyamoto-Nagai disk scale length [kpc]
    #[arg(long, default_value_t = 3.0)]
    disk_length: f64,

    /// Miyamoto-Nagai disk scale height [kpc]
    #[arg(long, default_value_t = 0.3)]
    disk_height: f64,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let halo = Nfw::new(args.halo_density, args.halo_radius);
    let bulge = Plummer::new(args.bulge_mass, args.bulge_radius);
    let disk = MiyamotoNagai::new(args.disk_mass, args.disk_length, args.disk_height);
    let components: Vec<&dyn Potential> = vec![&bulge, &disk];
    let baryons = Composite::new(components);

    let options = ContractionOptions::default()
        .with_method(args.method)
        .with_anisotropy(args.anisotropy)
        .with_range(args.rmin, args.rmax)
        .with_grid_size(args.grid_size);

    let contracted: Monopole = contraction(&halo, &baryons, &options)
        .wrap_err_with(|| format!("{} contraction failed", args.method))?;

    let grid = RadialGrid::new(args.rmin, args.rmax, args.grid_size)
        .wrap_err("Invalid output grid")?;

    println!("r rho_initial rho_contracted v_circ");
    for (r, point) in grid.radii().iter().zip(grid.points()) {
        println!(
            "{:.6e} {:.6e} {:.6e} {:.6e}",
            r,
            halo.density(*point),
            contracted.density(*point),
            contracted.circular_velocity(*r)
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Args;
    use halocontract::{ContractionOptions, Method};

    #[test]
    fn defaults_match_the_library() {
        Args::command().debug_assert();

        let args = Args::try_parse_from(["halo-contract"]).unwrap();
        let options = ContractionOptions::default();

        assert_eq!(args.method, options.method);
        assert_eq!(args.anisotropy, options.anisotropy);
        assert_eq!(args.rmin, options.rmin);
        assert_eq!(args.rmax, options.rmax);
        assert_eq!(args.grid_size, options.grid_size);
    }

    #[test]
    fn negative_anisotropy_is_accepted() {
        let args =
            Args::try_parse_from(["halo-contract", "-m", "adiabatic", "-a", "-0.5"]).unwrap();

        assert_eq!(args.method, Method::Adiabatic);
        assert_eq!(args.anisotropy, -0.5);
    }
}
