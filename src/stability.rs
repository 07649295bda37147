//! Von Neumann analysis of the schemes.
//!
//! Substituting `u^n_j = G^n e^{i j θ}` into an update rule gives the
//! amplification factor `G(θ)` of the Fourier mode with wavenumber
//! `θ = k·dx`. The exact solution multiplies that mode by `e^{-i α θ}` each
//! step, so `1 - |G|` measures the amplitude lost per step and
//! `arg G / (-α θ) - 1` the relative phase-speed error.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::{
    mesh::{ConfigError, Discretization},
    scheme::SchemeKind,
    Float,
};

pub fn amplification(scheme: SchemeKind, courant: Float, theta: Float) -> Complex64 {
    let a = courant;
    let (s, c) = theta.sin_cos();
    match scheme {
        SchemeKind::Upwind => Complex64::new(1. - a * (1. - c), -a * s),
        SchemeKind::LaxFriedrichs => Complex64::new(c, -a * s),
        SchemeKind::LaxWendroff => Complex64::new(1. - a * a * (1. - c), -a * s),
    }
}

/// Both errors, plus the raw factor they derive from, at one wavenumber.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorPoint {
    pub theta: Float,
    pub amplification: Complex64,
    /// `1 - |G|`
    pub dissipation: Float,
    /// `arg G / (-α θ) - 1`, 0 at `θ = 0`
    pub dispersion: Float,
    /// `-α θ`, the phase the exact solution turns per step
    pub exact_phase: Float,
}

impl ErrorPoint {
    pub fn evaluate(scheme: SchemeKind, courant: Float, theta: Float) -> Self {
        let g = amplification(scheme, courant, theta);
        let exact_phase = -courant * theta;
        let dispersion = if theta == 0. {
            0.
        } else {
            g.arg() / exact_phase - 1.
        };
        Self {
            theta,
            amplification: g,
            dissipation: 1. - g.norm(),
            dispersion,
            exact_phase,
        }
    }

    /// Phase turned per step by the scheme, `arg G`.
    pub fn phase(&self) -> Float {
        self.amplification.arg()
    }

    /// `arg G / (-α θ)`; 1 means the mode travels at the exact speed.
    pub fn relative_phase(&self) -> Float {
        1. + self.dispersion
    }

    /// `-ln|G|`, the logarithmic amplitude decay per step.
    pub fn decay_rate(&self) -> Float {
        -self.amplification.norm().ln()
    }
}

/// One scheme's error curve over `θ ∈ [0, π]` at a fixed Courant number.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorCurve {
    scheme: SchemeKind,
    courant: Float,
    points: Vec<ErrorPoint>,
}

impl ErrorCurve {
    /// `samples` evenly spaced wavenumbers from 0 to π inclusive.
    pub fn sample(scheme: SchemeKind, courant: Float, samples: usize) -> Result<Self, ConfigError> {
        if samples < 2 {
            return Err(ConfigError::TooFewPoints {
                axis: "wavenumber",
                points: samples,
            });
        }
        let last = samples - 1;
        Ok(Self::from_thetas(
            scheme,
            courant,
            (0..samples).map(move |j| {
                if j == last {
                    PI
                } else {
                    (PI * j as Float / last as Float).min(PI)
                }
            }),
        ))
    }

    /// The `NX/2 + 1` modes the grid can carry, `θ_j = 2πj/NX`.
    pub fn resolvable(scheme: SchemeKind, d: &Discretization) -> Self {
        let nx = d.nx();
        Self::from_thetas(
            scheme,
            d.courant(),
            (0..=nx / 2).map(|j| (2. * PI * j as Float / nx as Float).min(PI)),
        )
    }

    fn from_thetas(
        scheme: SchemeKind,
        courant: Float,
        thetas: impl Iterator<Item = Float>,
    ) -> Self {
        Self {
            scheme,
            courant,
            points: thetas
                .map(|theta| ErrorPoint::evaluate(scheme, courant, theta))
                .collect(),
        }
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn courant(&self) -> Float {
        self.courant
    }

    pub fn points(&self) -> &[ErrorPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// `(θ, dissipation)` pairs.
    pub fn dissipation(&self) -> impl Iterator<Item = (Float, Float)> + '_ {
        self.points.iter().map(|p| (p.theta, p.dissipation))
    }

    /// `(θ, dispersion)` pairs.
    pub fn dispersion(&self) -> impl Iterator<Item = (Float, Float)> + '_ {
        self.points.iter().map(|p| (p.theta, p.dispersion))
    }

    pub fn max_dissipation(&self) -> Float {
        self.points
            .iter()
            .map(|p| p.dissipation)
            .fold(Float::NEG_INFINITY, Float::max)
    }

    pub fn max_abs_dispersion(&self) -> Float {
        self.points
            .iter()
            .map(|p| p.dispersion.abs())
            .fold(0., Float::max)
    }

    /// `|G| <= 1` everywhere, up to rounding.
    pub fn is_stable(&self) -> bool {
        self.points
            .iter()
            .all(|p| p.amplification.norm() <= 1. + 1e-12)
    }
}

/// Curves of every scheme at the discretization's Courant number, in
/// `SchemeKind::ALL` order.
pub fn compare(d: &Discretization, samples: usize) -> Result<Vec<ErrorCurve>, ConfigError> {
    SchemeKind::ALL
        .into_iter()
        .map(|scheme| ErrorCurve::sample(scheme, d.courant(), samples))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_vanish_at_zero_wavenumber() {
        for scheme in SchemeKind::ALL {
            for a in [0.1, 0.5, 0.9, 1.0, 1.7] {
                let p = ErrorPoint::evaluate(scheme, a, 0.);
                assert_eq!(p.dissipation, 0.);
                assert_eq!(p.dispersion, 0.);
            }
        }
    }

    #[test]
    fn small_wavenumber_limit_is_continuous() {
        for scheme in SchemeKind::ALL {
            let p = ErrorPoint::evaluate(scheme, 0.6, 1e-6);
            assert!(p.dispersion.abs() < 1e-6, "{scheme}: {}", p.dispersion);
        }
    }

    #[test]
    fn upwind_at_unit_courant_is_exact() {
        let curve = ErrorCurve::sample(SchemeKind::Upwind, 1., 101).unwrap();
        for p in curve.points() {
            assert!(p.dissipation.abs() < 1e-14, "θ={}", p.theta);
            assert!(p.dispersion.abs() < 1e-14, "θ={}", p.theta);
        }
    }

    #[test]
    fn stable_courant_numbers_never_amplify() {
        for scheme in SchemeKind::ALL {
            for a in [0.0, 0.25, 0.5, 0.75, 0.999, 1.0] {
                let curve = ErrorCurve::sample(scheme, a, 181).unwrap();
                assert!(curve.is_stable(), "{scheme} at α={a}");
                assert!(curve.points().iter().all(|p| p.dissipation >= -1e-12));
            }
        }
    }

    #[test]
    fn unstable_courant_numbers_amplify() {
        for scheme in SchemeKind::ALL {
            let curve = ErrorCurve::sample(scheme, 1.5, 64).unwrap();
            assert!(!curve.is_stable(), "{scheme}");
            assert!(curve.points().iter().any(|p| p.dissipation < 0.));
        }
    }

    #[test]
    fn lax_wendroff_lags_at_the_grid_scale() {
        // at θ = π the mode does not move at all for α < 1/√2
        let p = ErrorPoint::evaluate(SchemeKind::LaxWendroff, 0.5, PI);
        assert!((p.dispersion + 1.).abs() < 1e-12);
        assert!((p.dissipation - 0.5).abs() < 1e-12);
        // Lax-Friedrichs runs ahead: arg G = -π, exact phase -απ
        let p = ErrorPoint::evaluate(SchemeKind::LaxFriedrichs, 0.5, PI);
        assert!((p.dispersion - 1.).abs() < 1e-12);
    }

    #[test]
    fn logarithmic_and_linear_measures_agree() {
        let p = ErrorPoint::evaluate(SchemeKind::Upwind, 0.3, 1.2);
        assert!((p.decay_rate() - (-(1. - p.dissipation).ln())).abs() < 1e-14);
        assert!((p.relative_phase() - p.phase() / p.exact_phase).abs() < 1e-14);
    }

    #[test]
    fn resolvable_modes_follow_the_grid() {
        let d = Discretization::new(10., 5., 16, 11).unwrap();
        let curve = ErrorCurve::resolvable(SchemeKind::LaxWendroff, &d);
        assert_eq!(curve.len(), 9);
        assert_eq!(curve.points()[0].theta, 0.);
        assert!((curve.points()[8].theta - PI).abs() < 1e-15);
        assert_eq!(curve.courant(), d.courant());
    }

    #[test]
    fn compare_covers_every_scheme() {
        let d = Discretization::default();
        let curves = compare(&d, 33).unwrap();
        let schemes: Vec<_> = curves.iter().map(ErrorCurve::scheme).collect();
        assert_eq!(schemes, SchemeKind::ALL.to_vec());
        assert!(curves.iter().all(|c| c.len() == 33));
        assert!(ErrorCurve::sample(SchemeKind::Upwind, 0.5, 1).is_err());
    }

    #[test]
    fn sampled_wavenumbers_end_exactly_at_pi() {
        for samples in 2..400 {
            let curve = ErrorCurve::sample(SchemeKind::LaxFriedrichs, 0.5, samples).unwrap();
            assert!(curve.points().iter().all(|p| p.theta <= PI), "{samples}");
            let last = curve.points()[samples - 1];
            assert_eq!(last.theta, PI);
            // arg G = -π, so the relative phase is 1/α
            assert!((last.dispersion - 1.).abs() < 1e-12, "{samples}: {}", last.dispersion);
        }
    }

    #[test]
    fn second_order_scheme_disperses_less_for_long_waves() {
        let lw = ErrorPoint::evaluate(SchemeKind::LaxWendroff, 0.5, 0.3);
        let lf = ErrorPoint::evaluate(SchemeKind::LaxFriedrichs, 0.5, 0.3);
        assert!(lw.dissipation.abs() < lf.dissipation.abs());
        assert!(lw.dispersion.abs() < lf.dispersion.abs());
    }
}
