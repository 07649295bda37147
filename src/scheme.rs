use std::{fmt, str::FromStr};

use faer_core::{zipped, Mat, MatMut, MatRef};
use reborrow::*;

use crate::{bc::Periodic, mesh::ConfigError, Float};

/// The three explicit two-level schemes for `u_t + c u_x = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeKind {
    Upwind,
    LaxFriedrichs,
    LaxWendroff,
}

impl SchemeKind {
    pub const ALL: [SchemeKind; 3] = [
        SchemeKind::Upwind,
        SchemeKind::LaxFriedrichs,
        SchemeKind::LaxWendroff,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemeKind::Upwind => "Upwind",
            SchemeKind::LaxFriedrichs => "Lax-Friedrichs",
            SchemeKind::LaxWendroff => "Lax-Wendroff",
        }
    }

    /// Formal order of accuracy.
    pub fn order(self) -> usize {
        match self {
            SchemeKind::Upwind | SchemeKind::LaxFriedrichs => 1,
            SchemeKind::LaxWendroff => 2,
        }
    }

    /// Largest `|α|` for which the scheme is von Neumann stable.
    pub fn stability_limit(self) -> Float {
        match self {
            SchemeKind::Upwind | SchemeKind::LaxFriedrichs | SchemeKind::LaxWendroff => 1.,
        }
    }

    pub fn is_stable(self, courant: Float) -> bool {
        courant.abs() <= self.stability_limit()
    }

    /// New value at node `i` from `u_{i-1}`, `u_i`, `u_{i+1}` of the previous level.
    #[inline]
    pub fn stencil(self, a: Float, um: Float, u: Float, up: Float) -> Float {
        match self {
            SchemeKind::Upwind => u - a * (u - um),
            SchemeKind::LaxFriedrichs => 0.5 * (up + um) - 0.5 * a * (up - um),
            SchemeKind::LaxWendroff => {
                u - 0.5 * a * (up - um) + 0.5 * a * a * (up - 2. * u + um)
            }
        }
    }

    /// Writes level `n+1` into `v` from the level held by `ctx`.
    pub fn apply(self, ctx: Ctx<'_>, v: MatMut<'_, Float>) {
        let a = ctx.courant;
        zipped!(v, ctx.left(), ctx.center(), ctx.right()).for_each(|mut v, um, u, up| {
            v.write(self.stencil(a, um.read(), u.read(), up.read()))
        })
    }
}

impl fmt::Display for SchemeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchemeKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "upwind" => Ok(SchemeKind::Upwind),
            "lax" | "laxfriedrichs" => Ok(SchemeKind::LaxFriedrichs),
            "laxwendroff" => Ok(SchemeKind::LaxWendroff),
            _ => Err(ConfigError::UnknownScheme(s.to_string())),
        }
    }
}

/// Read-only view of the current time level, ghost cells included.
#[derive(Clone, Copy)]
pub struct Ctx<'a> {
    pub courant: Float,
    u: MatRef<'a, Float>,
}

impl<'a> Ctx<'a> {
    /// `u` holds one ghost cell on each side of the interior nodes.
    pub fn new(courant: Float, u: MatRef<'a, Float>) -> Self {
        Self { courant, u }
    }

    fn interior(&self) -> usize {
        self.u.nrows() - 2
    }

    /// `u_{i-1}` for every interior `i`.
    pub fn left(&self) -> MatRef<'a, Float> {
        self.u.subrows(0, self.interior())
    }

    pub fn center(&self) -> MatRef<'a, Float> {
        self.u.subrows(1, self.interior())
    }

    /// `u_{i+1}` for every interior `i`.
    pub fn right(&self) -> MatRef<'a, Float> {
        self.u.subrows(2, self.interior())
    }
}

/// Time marcher owning the double buffer of one run.
///
/// Column `current` of `buffer` holds level `n`, the other column receives
/// level `n+1`; the roles flip after every step. Row 0 and row `NX+1` are
/// the periodic ghosts.
pub struct Integrator {
    scheme: SchemeKind,
    courant: Float,
    nx: usize,
    buffer: Mat<Float>,
    current: usize,
    steps: usize,
}

impl Integrator {
    /// `initial` is a single column holding at least one node.
    pub fn new(
        scheme: SchemeKind,
        courant: Float,
        initial: MatRef<'_, Float>,
    ) -> Result<Self, ConfigError> {
        let nx = initial.nrows();
        if nx == 0 || initial.ncols() != 1 {
            return Err(ConfigError::TooFewPoints {
                axis: "space",
                points: nx,
            });
        }
        let mut buffer = Mat::<Float>::zeros(nx + 2, 2);
        {
            let [u, _] = buffer.as_mut().split_at_col(1);
            let [left, rest] = u.split_at_row(1);
            let [mut center, right] = rest.split_at_row(nx);
            center.clone_from(initial);
            Periodic.apply(left, center.rb(), right);
        }
        Ok(Self {
            scheme,
            courant,
            nx,
            buffer,
            current: 0,
            steps: 0,
        })
    }

    pub fn scheme(&self) -> SchemeKind {
        self.scheme
    }

    pub fn courant(&self) -> Float {
        self.courant
    }

    /// Steps taken so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn step(&mut self) {
        let [first, second] = self.buffer.as_mut().split_at_col(1);
        let (u, v) = if self.current == 0 {
            (first, second)
        } else {
            (second, first)
        };

        let ctx = Ctx::new(self.courant, u.rb());
        let [v_left, v_rest] = v.split_at_row(1);
        let [mut v_center, v_right] = v_rest.split_at_row(self.nx);

        // apply numerical method to u into v
        self.scheme.apply(ctx, v_center.rb_mut());
        // then refresh v's ghosts
        Periodic.apply(v_left, v_center.rb(), v_right);

        self.current = 1 - self.current;
        self.steps += 1;
    }

    /// Interior nodes of the current level.
    pub fn current(&self) -> MatRef<'_, Float> {
        self.buffer.as_ref().col(self.current).subrows(1, self.nx)
    }

    pub fn to_vec(&self) -> Vec<Float> {
        let u = self.current();
        (0..u.nrows()).map(|i| u.read(i, 0)).collect()
    }

    /// Index of the first non-finite node, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        let u = self.current();
        (0..u.nrows()).find(|&i| !u.read(i, 0).is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn integrator(scheme: SchemeKind, courant: Float, values: &[Float]) -> Integrator {
        let initial = Mat::<Float>::from_fn(values.len(), 1, |i, _| values[i]);
        Integrator::new(scheme, courant, initial.as_ref()).unwrap()
    }

    fn mass(values: &[Float]) -> Float {
        values.iter().sum()
    }

    const PULSE: [Float; 8] = [0., 0.1, 0.7, 1., 0.4, 0.2, 0., 0.];

    #[test]
    fn upwind_at_unit_courant_shifts_one_cell() {
        let mut it = integrator(SchemeKind::Upwind, 1., &PULSE);
        it.step();
        let u = it.to_vec();
        for i in 0..PULSE.len() {
            let im = (i + PULSE.len() - 1) % PULSE.len();
            assert!((u[i] - PULSE[im]).abs() < 1e-15);
        }
    }

    #[test]
    fn stencils_match_formulas() {
        let (a, um, u, up) = (0.4, 0.2, 1.0, 0.6);
        assert!((SchemeKind::Upwind.stencil(a, um, u, up) - 0.68).abs() < 1e-15);
        assert!((SchemeKind::LaxFriedrichs.stencil(a, um, u, up) - 0.32).abs() < 1e-15);
        let lw = 1.0 - 0.5 * 0.4 * 0.4 + 0.5 * 0.16 * (0.6 - 2.0 + 0.2);
        assert!((SchemeKind::LaxWendroff.stencil(a, um, u, up) - lw).abs() < 1e-15);
    }

    #[test]
    fn wraps_around_both_ends() {
        let mut values = [0.; 6];
        values[0] = 1.;
        let mut it = integrator(SchemeKind::LaxFriedrichs, 0., &values);
        it.step();
        let u = it.to_vec();
        // node 0 is averaged away onto its two neighbours, node 5 being one of them
        assert_eq!(u, vec![0., 0.5, 0., 0., 0., 0.5]);
    }

    #[test]
    fn all_schemes_conserve_mass() {
        for scheme in SchemeKind::ALL {
            let mut it = integrator(scheme, 0.7, &PULSE);
            for _ in 0..25 {
                it.step();
            }
            assert!(
                (mass(&it.to_vec()) - mass(&PULSE)).abs() < 1e-12,
                "{scheme} lost mass"
            );
            assert_eq!(it.steps(), 25);
        }
    }

    #[test]
    fn levels_do_not_leak_into_neighbour_reads() {
        // an in-place sweep would carry the pulse all the way through in one step
        let mut values = [0.; 5];
        values[1] = 1.;
        let mut it = integrator(SchemeKind::Upwind, 1., &values);
        it.step();
        assert_eq!(it.to_vec(), vec![0., 0., 1., 0., 0.]);
    }

    #[test]
    fn detects_non_finite() {
        let mut it = integrator(SchemeKind::LaxWendroff, 0.5, &[0., Float::NAN, 0., 0.]);
        assert_eq!(it.first_non_finite(), Some(1));
        it.step();
        assert!(it.first_non_finite().is_some());
        let it = integrator(SchemeKind::LaxWendroff, 0.5, &PULSE);
        assert_eq!(it.first_non_finite(), None);
    }

    #[test]
    fn single_node_wraps_onto_itself_and_empty_is_rejected() {
        let mut it = integrator(SchemeKind::LaxWendroff, 0.5, &[2.]);
        it.step();
        assert_eq!(it.to_vec(), vec![2.]);

        let empty = Mat::<Float>::zeros(0, 1);
        assert!(matches!(
            Integrator::new(SchemeKind::Upwind, 0.5, empty.as_ref()),
            Err(ConfigError::TooFewPoints { points: 0, .. })
        ));
    }

    #[test]
    fn names_round_trip() {
        for scheme in SchemeKind::ALL {
            assert_eq!(scheme.to_string().parse::<SchemeKind>(), Ok(scheme));
        }
        assert_eq!("lax".parse::<SchemeKind>(), Ok(SchemeKind::LaxFriedrichs));
        assert_eq!("LAX_WENDROFF".parse::<SchemeKind>(), Ok(SchemeKind::LaxWendroff));
        assert!("beam-warming".parse::<SchemeKind>().is_err());
        assert!(SchemeKind::Upwind.is_stable(1.));
        assert!(!SchemeKind::LaxWendroff.is_stable(1.5));
    }
}
