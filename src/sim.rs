use std::fmt;

use faer_core::Mat;

use crate::{
    mesh::{ConfigError, Discretization},
    profile::{ProfileKind, ProfileShape},
    scheme::{Integrator, SchemeKind},
    Float,
};

/// Everything a run needs, fixed before it starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    pub(crate) discretization: Discretization,
    pub(crate) profile: ProfileKind,
    pub(crate) scheme: SchemeKind,
}

impl Simulation {
    pub fn new(discretization: Discretization) -> Self {
        Self {
            discretization,
            profile: ProfileKind::preset(ProfileShape::Gauss, discretization.length()),
            scheme: SchemeKind::Upwind,
        }
    }

    pub fn with_profile(self, profile: ProfileKind) -> Result<Self, ConfigError> {
        profile.validate()?;
        Ok(Self { profile, ..self })
    }

    pub fn with_scheme(self, scheme: SchemeKind) -> Self {
        Self { scheme, ..self }
    }

    pub fn discretization(&self) -> &Discretization {
        &self.discretization
    }

    pub fn profile(&self) -> ProfileKind {
        self.profile
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn initial_field(&self) -> Result<Mat<Float>, ConfigError> {
        self.profile.generate(&self.discretization)
    }

    pub(crate) fn integrator(&self) -> Result<Integrator, ConfigError> {
        let u0 = self.initial_field()?;
        Integrator::new(self.scheme, self.discretization.courant(), u0.as_ref())
    }

    /// The initial profile carried `c·t` to the right, wrapped onto the
    /// periodic cell `[0, NX·dx)`.
    pub fn exact(&self, t: Float) -> Vec<Float> {
        let d = &self.discretization;
        let shift = d.speed() * t;
        let period = d.period();
        d.space()
            .iter()
            .map(|x| self.profile.eval((x - shift).rem_euclid(period)))
            .collect()
    }
}

impl fmt::Display for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.discretization;
        write!(
            f,
            "transfer of `{}`:\n\t- `{}` scheme\n\t- Δx = {:e} ({} points)\n\t- Δt = {:e} ({} points)\n\t- α = {}",
            self.profile,
            self.scheme,
            d.dx(),
            d.nx(),
            d.dt(),
            d.nt(),
            d.courant()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_builders() {
        let d = Discretization::default();
        let sim = Simulation::new(d);
        assert_eq!(sim.scheme(), SchemeKind::Upwind);
        assert_eq!(sim.profile().shape(), ProfileShape::Gauss);

        let sim = sim.with_scheme(SchemeKind::LaxWendroff);
        assert_eq!(sim.scheme(), SchemeKind::LaxWendroff);
        assert!(sim
            .with_profile(ProfileKind::Rectangle {
                center: 1.,
                width: 0.
            })
            .is_err());
    }

    #[test]
    fn exact_solution_wraps() {
        let d = Discretization::new(0.9, 1., 10, 11).unwrap();
        let sim = Simulation::new(d)
            .with_profile(ProfileKind::rectangle(0.05, 0.12).unwrap())
            .unwrap();
        let at_start = sim.exact(0.);
        assert_eq!(at_start[0], 1.);
        // a full period brings the pulse back
        let after_period = sim.exact(d.period());
        for (a, b) in at_start.iter().zip(&after_period) {
            assert_eq!(a, b);
        }
        let shifted = sim.exact(0.25);
        assert_eq!(shifted[3], 1.);
        assert_eq!(shifted[0], 0.);
    }

    #[test]
    fn display_mentions_scheme_and_courant() {
        let s = Simulation::new(Discretization::default()).to_string();
        assert!(s.contains("Upwind"));
        assert!(s.contains("α = 0.8"));
    }
}
