use halocontract::contraction::empirical;
use halocontract::engine::NativeEngine;
use halocontract::grid::RadialGrid;
use halocontract::multipole::{Monopole, DEFAULT_NODES_PER_DECADE};
use halocontract::potential::analytic::{MiyamotoNagai, Nfw, Plummer};
use halocontract::potential::{Composite, Density, Potential};
use halocontract::{contraction_with, ContractionOptions, Method};
use tango_bench::{benchmark_fn, tango_benchmarks, tango_main, IntoBenchmarks};

fn halo() -> Nfw {
    Nfw::new(3.487e6, 25.2)
}

pub fn contract(method: Method, grid_size: usize) -> f64 {
    let halo = halo();
    let bulge = Plummer::new(1e10, 0.5);
    let disk = MiyamotoNagai::new(5e10, 3.0, 0.3);
    let components: Vec<&dyn Potential> = vec![&bulge, &disk];
    let options = ContractionOptions::default()
        .with_method(method)
        .with_range(1e-2, 1e3)
        .with_grid_size(grid_size);

    contraction_with(
        &NativeEngine::default(),
        &halo,
        &Composite::new(components),
        &options,
    )
    .map(|result| result.enclosed_mass(1.))
    .unwrap_or(f64::NAN)
}

fn contraction_benchmark() -> impl IntoBenchmarks {
    [
        benchmark_fn("c20_plummer_disk", |b| {
            b.iter(move || contract(Method::Cautun20, 101))
        }),
        benchmark_fn("adiabatic_plummer_disk", |b| {
            b.iter(move || contract(Method::Adiabatic, 21))
        }),
    ]
}

fn numerics_benchmark() -> impl IntoBenchmarks {
    [
        benchmark_fn("monopole_nfw", |b| {
            let halo = halo();
            b.iter(move || {
                Monopole::from_density(&halo, 1e-3, 1e4, DEFAULT_NODES_PER_DECADE)
                    .map(|monopole| monopole.potential([1., 0., 0.]))
            })
        }),
        benchmark_fn("cautun20_formula", |b| {
            let halo = halo();
            let bulge = Plummer::new(1e10, 0.5);
            let grid = RadialGrid::new(1e-2, 1e3, 1001).ok();
            let inputs = grid.map(|grid| {
                (
                    halo.enclosed_masses(grid.radii()),
                    bulge.enclosed_masses(grid.radii()),
                    halo.densities(grid.points()),
                    bulge.densities(grid.points()),
                )
            });
            b.iter(move || {
                inputs
                    .as_ref()
                    .map(|(dm_mass, baryon_mass, dm_density, baryon_density)| {
                        empirical::cautun20(dm_mass, baryon_mass, dm_density, baryon_density)
                    })
            })
        }),
    ]
}

tango_benchmarks!(contraction_benchmark(), numerics_benchmark());
tango_main!();
