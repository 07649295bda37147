use std::{fmt, str::FromStr};

use faer_core::Mat;

use crate::{
    mesh::{finite, positive, ConfigError, Discretization},
    Float,
};

/// Initial pulse shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileKind {
    /// `exp(-((x - center) / width)^2)`
    Gauss { center: Float, width: Float },
    /// `exp(-((x - center) / width)^(2 order))`
    SuperGauss {
        center: Float,
        width: Float,
        order: Float,
    },
    /// 1 on `|x - center| <= width / 2`, 0 elsewhere
    Rectangle { center: Float, width: Float },
    /// 1 on `x >= location`, 0 elsewhere
    Step { location: Float },
}

/// Shape tag without parameters, as picked from a list of names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileShape {
    Gauss,
    SuperGauss,
    Rectangle,
    Step,
}

impl ProfileShape {
    pub const ALL: [ProfileShape; 4] = [
        ProfileShape::Gauss,
        ProfileShape::SuperGauss,
        ProfileShape::Rectangle,
        ProfileShape::Step,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ProfileShape::Gauss => "Gauss",
            ProfileShape::SuperGauss => "SuperGauss",
            ProfileShape::Rectangle => "Rectangle",
            ProfileShape::Step => "Step",
        }
    }
}

impl fmt::Display for ProfileShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileShape {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|shape| shape.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownProfile(s.to_string()))
    }
}

impl ProfileKind {
    pub fn gauss(center: Float, width: Float) -> Result<Self, ConfigError> {
        Self::Gauss { center, width }.validated()
    }

    pub fn super_gauss(center: Float, width: Float, order: Float) -> Result<Self, ConfigError> {
        Self::SuperGauss {
            center,
            width,
            order,
        }
        .validated()
    }

    pub fn rectangle(center: Float, width: Float) -> Result<Self, ConfigError> {
        Self::Rectangle { center, width }.validated()
    }

    pub fn step(location: Float) -> Result<Self, ConfigError> {
        Self::Step { location }.validated()
    }

    /// Pulse placed a quarter of the way into a domain of the given length:
    /// unit-width Gauss and order-4 super-Gauss, a rectangle spanning
    /// `(L/8, 3L/8)`, a step at `L/4`.
    pub fn preset(shape: ProfileShape, length: Float) -> Self {
        let center = length / 4.;
        match shape {
            ProfileShape::Gauss => Self::Gauss { center, width: 1. },
            ProfileShape::SuperGauss => Self::SuperGauss {
                center,
                width: 1.,
                order: 4.,
            },
            ProfileShape::Rectangle => Self::Rectangle {
                center,
                width: length / 4.,
            },
            ProfileShape::Step => Self::Step { location: center },
        }
    }

    pub fn shape(&self) -> ProfileShape {
        match self {
            Self::Gauss { .. } => ProfileShape::Gauss,
            Self::SuperGauss { .. } => ProfileShape::SuperGauss,
            Self::Rectangle { .. } => ProfileShape::Rectangle,
            Self::Step { .. } => ProfileShape::Step,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::Gauss { center, width } | Self::Rectangle { center, width } => {
                finite("center", center)?;
                positive("width", width)?;
            }
            Self::SuperGauss {
                center,
                width,
                order,
            } => {
                finite("center", center)?;
                positive("width", width)?;
                if !(order >= 1.) || !order.is_finite() {
                    return Err(ConfigError::SuperGaussOrder(order));
                }
            }
            Self::Step { location } => {
                finite("location", location)?;
            }
        }
        Ok(())
    }

    fn validated(self) -> Result<Self, ConfigError> {
        self.validate().map(|()| self)
    }

    pub fn eval(&self, x: Float) -> Float {
        match *self {
            Self::Gauss { center, width } => {
                let s = (x - center) / width;
                (-s * s).exp()
            }
            Self::SuperGauss {
                center,
                width,
                order,
            } => {
                let s = (x - center) / width;
                // (s^2)^order stays real for fractional orders
                (-(s * s).powf(order)).exp()
            }
            Self::Rectangle { center, width } => {
                if (x - center).abs() <= 0.5 * width {
                    1.
                } else {
                    0.
                }
            }
            Self::Step { location } => {
                if x >= location {
                    1.
                } else {
                    0.
                }
            }
        }
    }

    /// Samples the shape at every node `x_i = i·dx`, as a column.
    pub fn generate(&self, d: &Discretization) -> Result<Mat<Float>, ConfigError> {
        self.validate()?;
        let dx = d.dx();
        Ok(Mat::from_fn(d.nx(), 1, |i, _| self.eval(i as Float * dx)))
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gauss { center, width } => write!(f, "Gauss(center={center}, width={width})"),
            Self::SuperGauss {
                center,
                width,
                order,
            } => write!(
                f,
                "SuperGauss(center={center}, width={width}, order={order})"
            ),
            Self::Rectangle { center, width } => {
                write!(f, "Rectangle(center={center}, width={width})")
            }
            Self::Step { location } => write!(f, "Step(location={location})"),
        }
    }
}
