use std::fmt;

use thiserror::Error;

use crate::Float;

/// Rejected inputs, reported before any run starts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("`{parameter}` must be strictly positive and finite (got {value})")]
    NonPositive {
        parameter: &'static str,
        value: Float,
    },
    #[error("`{parameter}` must be finite (got {value})")]
    NonFinite {
        parameter: &'static str,
        value: Float,
    },
    #[error("{axis} grid needs at least 2 points (got {points})")]
    TooFewPoints { axis: &'static str, points: usize },
    #[error("super-Gauss order must be at least 1 (got {0})")]
    SuperGaussOrder(Float),
    #[error("{axis} spacing {delta} needs more points than can be addressed")]
    TooManyPoints { axis: &'static str, delta: Float },
    #[error("sampling stride must be at least one step")]
    ZeroStride,
    #[error("unknown scheme `{0}`")]
    UnknownScheme(String),
    #[error("unknown initial profile `{0}`")]
    UnknownProfile(String),
}

pub(crate) fn positive(parameter: &'static str, value: Float) -> Result<Float, ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

pub(crate) fn finite(parameter: &'static str, value: Float) -> Result<Float, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { parameter, value })
    }
}

/// Either a target spacing or an explicit point count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Delta(Float),
    Points(usize),
}

// grid[0] <-> lower
// grid[i] <-> lower + i * delta forall i
// grid[steps] <-> upper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    lower: Float,
    upper: Float,
    delta: Float,
    steps: usize,
}

impl Grid {
    fn from_points(axis: &'static str, upper: Float, points: usize) -> Result<Self, ConfigError> {
        if points < 2 {
            return Err(ConfigError::TooFewPoints { axis, points });
        }
        let steps = points - 1;
        Ok(Self {
            lower: 0.,
            upper,
            delta: upper / steps as Float,
            steps,
        })
    }

    fn points_for_delta(
        axis: &'static str,
        upper: Float,
        delta: Float,
    ) -> Result<usize, ConfigError> {
        let delta = positive("delta", delta)?;
        let steps = (upper / delta).ceil();
        // usize::MAX as Float rounds up, so the bound is exclusive
        if !steps.is_finite() || steps >= usize::MAX as Float {
            return Err(ConfigError::TooManyPoints { axis, delta });
        }
        (steps as usize)
            .checked_add(1)
            .ok_or(ConfigError::TooManyPoints { axis, delta })
    }

    pub fn lower(&self) -> Float {
        self.lower
    }

    pub fn upper(&self) -> Float {
        self.upper
    }

    pub fn delta(&self) -> Float {
        self.delta
    }

    /// Number of intervals.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of nodes, `steps + 1`.
    pub fn points(&self) -> usize {
        self.steps + 1
    }

    pub fn iter(self) -> impl Iterator<Item = Float> {
        (0..self.points()).map(move |i| self.lower + self.delta * i as Float)
    }
}

/// Uniform space/time discretization of the periodic transfer problem.
///
/// Every derived quantity (`dx`, `dt`, `α`) is a function of the stored
/// inputs, and the `with_*` methods hand back a freshly validated value
/// instead of patching one in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Discretization {
    space: Grid,
    time: Grid,
    speed: Float,
}

impl Discretization {
    pub fn new(length: Float, time: Float, nx: usize, nt: usize) -> Result<Self, ConfigError> {
        Self::build(length, time, nx, nt, 1.)
    }

    fn build(
        length: Float,
        time: Float,
        nx: usize,
        nt: usize,
        speed: Float,
    ) -> Result<Self, ConfigError> {
        let length = positive("length", length)?;
        let time = positive("time", time)?;
        let speed = positive("speed", speed)?;
        Ok(Self {
            space: Grid::from_points("space", length, nx)?,
            time: Grid::from_points("time", time, nt)?,
            speed,
        })
    }

    pub fn with_length(self, length: Float) -> Result<Self, ConfigError> {
        Self::build(length, self.time(), self.nx(), self.nt(), self.speed)
    }

    pub fn with_time(self, time: Float) -> Result<Self, ConfigError> {
        Self::build(self.length(), time, self.nx(), self.nt(), self.speed)
    }

    pub fn with_nx(self, nx: usize) -> Result<Self, ConfigError> {
        Self::build(self.length(), self.time(), nx, self.nt(), self.speed)
    }

    pub fn with_nt(self, nt: usize) -> Result<Self, ConfigError> {
        Self::build(self.length(), self.time(), self.nx(), nt, self.speed)
    }

    pub fn with_speed(self, speed: Float) -> Result<Self, ConfigError> {
        Self::build(self.length(), self.time(), self.nx(), self.nt(), speed)
    }

    pub fn with_space_resolution(self, r: Resolution) -> Result<Self, ConfigError> {
        let nx = match r {
            Resolution::Delta(delta) => Grid::points_for_delta("space", self.length(), delta)?,
            Resolution::Points(points) => points,
        };
        self.with_nx(nx)
    }

    pub fn with_time_resolution(self, r: Resolution) -> Result<Self, ConfigError> {
        let nt = match r {
            Resolution::Delta(delta) => Grid::points_for_delta("time", self.time(), delta)?,
            Resolution::Points(points) => points,
        };
        self.with_nt(nt)
    }

    pub fn space(&self) -> Grid {
        self.space
    }

    pub fn time_grid(&self) -> Grid {
        self.time
    }

    pub fn length(&self) -> Float {
        self.space.upper
    }

    pub fn time(&self) -> Float {
        self.time.upper
    }

    pub fn nx(&self) -> usize {
        self.space.points()
    }

    pub fn nt(&self) -> usize {
        self.time.points()
    }

    pub fn dx(&self) -> Float {
        self.space.delta
    }

    pub fn dt(&self) -> Float {
        self.time.delta
    }

    pub fn speed(&self) -> Float {
        self.speed
    }

    /// Courant number `α = c·dt/dx`.
    pub fn courant(&self) -> Float {
        self.speed * self.dt() / self.dx()
    }

    /// Length of the periodic cell, `NX·dx` (node `NX` wraps onto node 0).
    pub fn period(&self) -> Float {
        self.nx() as Float * self.dx()
    }
}

impl Default for Discretization {
    fn default() -> Self {
        Self {
            space: Grid {
                lower: 0.,
                upper: 10.,
                delta: 10. / 16.,
                steps: 16,
            },
            time: Grid {
                lower: 0.,
                upper: 5.,
                delta: 5. / 10.,
                steps: 10,
            },
            speed: 1.,
        }
    }
}

impl fmt::Display for Discretization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Δx = {:e} ({} points), Δt = {:e} ({} points), α = {}",
            self.dx(),
            self.nx(),
            self.dt(),
            self.nt(),
            self.courant()
        )
    }
}
