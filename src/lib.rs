//! Explicit finite-difference solvers for the 1D linear transfer equation
//! `u_t + c u_x = 0` on a periodic grid, with closed-form dispersion and
//! dissipation analysis of the schemes.

pub mod bc;
pub mod driver;
pub mod mesh;
pub mod profile;
pub mod scheme;
pub mod sim;
pub mod stability;

pub type Float = f64;

pub use driver::{
    CancellationToken, Driver, Logger, ObsCtx, Observer, Progress, RunReport, RunStatus,
    SimError, SolutionFrame, UnstableRun,
};
pub use mesh::{ConfigError, Discretization, Grid, Resolution};
pub use profile::{ProfileKind, ProfileShape};
pub use scheme::{Ctx, Integrator, SchemeKind};
pub use sim::Simulation;
pub use stability::{ErrorCurve, ErrorPoint};
