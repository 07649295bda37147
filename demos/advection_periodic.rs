use transfer1d::{
    stability, Discretization, Driver, Logger, ProfileKind, ProfileShape, Resolution, SchemeKind,
    Simulation,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let shape: ProfileShape = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("gauss")
        .parse()?;

    let d = Discretization::new(10., 5., 2, 2)?
        .with_space_resolution(Resolution::Points(65))?
        .with_time_resolution(Resolution::Delta(0.1))?;
    tracing::info!("{d}");

    for curve in stability::compare(&d, 33)? {
        tracing::info!(
            "`{}`: max dissipation {:.3e}, max |dispersion| {:.3e}",
            curve.scheme(),
            curve.max_dissipation(),
            curve.max_abs_dispersion()
        );
    }

    for scheme in SchemeKind::ALL {
        let sim = Simulation::new(d)
            .with_profile(ProfileKind::preset(shape, d.length()))?
            .with_scheme(scheme);

        let report = Driver::new(sim)
            .with_sampling_period(1.)?
            .with_observer(Logger)
            .run()?;

        if let Some(last) = report.last() {
            let (node, peak) = last.peak();
            println!(
                "{scheme:>15}: {:?}, {} frames, peak {peak:.4} at x = {:.3}, error vs exact {:.3e}",
                report.status,
                report.frames.len(),
                node as f64 * d.dx(),
                last.max_error_against(&sim.exact(last.time)),
            );
        }
    }

    Ok(())
}
