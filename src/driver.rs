use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use faer_core::MatRef;
use thiserror::Error;

use crate::{
    mesh::{positive, ConfigError, Resolution},
    sim::Simulation,
    Float,
};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),
    #[error("Courant number {courant} exceeds the stability limit {limit}")]
    UnstableRun { courant: Float, limit: Float },
    #[error("observer failed: {0}")]
    Observer(String),
    /// An observer failed mid-run; the levels recorded up to then are kept.
    #[error("run aborted at step {step}")]
    Aborted {
        step: usize,
        #[source]
        source: Box<SimError>,
        partial: Box<RunReport>,
    },
}

/// Shared flag a caller trips to stop a run between two steps.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release)
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Snapshot of the field at one recorded step.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionFrame {
    pub step: usize,
    pub time: Float,
    pub values: Vec<Float>,
}

impl SolutionFrame {
    fn capture(step: usize, time: Float, u: MatRef<'_, Float>) -> Self {
        Self {
            step,
            time,
            values: (0..u.nrows()).map(|i| u.read(i, 0)).collect(),
        }
    }

    /// `Σ u_i`
    pub fn mass(&self) -> Float {
        self.values.iter().sum()
    }

    /// Node index and value of the maximum.
    pub fn peak(&self) -> (usize, Float) {
        self.values
            .iter()
            .copied()
            .enumerate()
            .fold((0, Float::NEG_INFINITY), |best, (i, u)| {
                if u > best.1 {
                    (i, u)
                } else {
                    best
                }
            })
    }

    pub fn max_abs(&self) -> Float {
        self.values.iter().fold(0., |m, u| u.abs().max(m))
    }

    /// Largest pointwise deviation from a reference field of the same length.
    pub fn max_error_against(&self, reference: &[Float]) -> Float {
        self.values
            .iter()
            .zip(reference)
            .fold(0., |m, (u, r)| (u - r).abs().max(m))
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunStatus {
    Completed,
    /// Stopped on request after `step` steps.
    Cancelled { step: usize },
    /// Step `step` produced a non-finite value at `node`.
    NumericalBlowUp { step: usize, node: usize },
    /// An observer returned an error at `step`.
    Aborted { step: usize },
}

/// Advisory attached to runs whose Courant number exceeds the scheme's limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnstableRun {
    pub courant: Float,
    pub limit: Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: RunStatus,
    pub frames: Vec<SolutionFrame>,
    pub unstable: Option<UnstableRun>,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    pub fn first(&self) -> Option<&SolutionFrame> {
        self.frames.first()
    }

    pub fn last(&self) -> Option<&SolutionFrame> {
        self.frames.last()
    }
}

pub struct ObsCtx<'ctx> {
    sim: &'ctx Simulation,
    time_sampling: usize,
    iter: usize,
    time: Float,
    solution: MatRef<'ctx, Float>,
}

impl<'ctx> ObsCtx<'ctx> {
    pub fn sim(&self) -> &Simulation {
        self.sim
    }

    pub fn iter(&self) -> usize {
        self.iter
    }

    /// Steps of the whole run, `NT - 1`.
    pub fn total(&self) -> usize {
        self.sim.discretization.nt() - 1
    }

    pub fn time(&self) -> Float {
        self.time
    }

    pub fn solution(&self) -> MatRef<'_, Float> {
        self.solution
    }

    pub fn sampling_period(&self) -> usize {
        self.time_sampling
    }
}

/// Hooks called with the initial level, every recorded level and the last
/// level reached.
#[allow(unused_variables)]
pub trait Observer {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        Ok(())
    }
}

pub struct Driver<'d> {
    pub(crate) sim: Simulation,
    pub(crate) observers: Vec<Box<dyn Observer + Send + 'd>>,
    pub(crate) time_sampling: usize,
    pub(crate) cancellation: CancellationToken,
    pub(crate) strict: bool,
}

impl<'d> Driver<'d> {
    pub fn new(sim: Simulation) -> Self {
        let time_sampling = 1 + (sim.discretization.nt() - 1) / 10;
        Self {
            sim,
            observers: Vec::new(),
            time_sampling,
            cancellation: CancellationToken::new(),
            strict: false,
        }
    }

    /// Record every `stride` steps (the last step is always recorded).
    pub fn with_stride(mut self, stride: usize) -> Result<Self, ConfigError> {
        if stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        self.time_sampling = stride;
        Ok(self)
    }

    /// Record roughly every `period` units of time.
    pub fn with_sampling_period(self, period: Float) -> Result<Self, ConfigError> {
        let period = positive("sampling period", period)?;
        let stride = (period / self.sim.discretization.dt()).ceil() as usize;
        self.with_stride(stride.max(1))
    }

    /// `Delta(period)` records roughly every `period` units of time,
    /// `Points(n)` every `n` steps.
    pub fn with_time_sampling(self, sampling: Resolution) -> Result<Self, ConfigError> {
        match sampling {
            Resolution::Delta(period) => self.with_sampling_period(period),
            Resolution::Points(stride) => self.with_stride(stride),
        }
    }

    pub fn with_observer(mut self, observer: impl Observer + Send + 'd) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Refuse to start when the Courant number exceeds the stability limit.
    pub fn with_strict_stability(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn run(&mut self) -> Result<RunReport, SimError> {
        let sim = &self.sim;
        let observers = &mut self.observers;
        let time_sampling = self.time_sampling;
        let d = sim.discretization;

        let courant = d.courant();
        let limit = sim.scheme.stability_limit();
        let unstable = (!sim.scheme.is_stable(courant)).then_some(UnstableRun { courant, limit });
        if unstable.is_some() {
            if self.strict {
                return Err(SimError::UnstableRun { courant, limit });
            }
            tracing::warn!(
                "`{}` scheme is unstable at α={} (limit {}), running anyway",
                sim.scheme,
                courant,
                limit
            );
        }

        let mut integrator = sim.integrator()?;
        let total = d.nt() - 1;
        let mut frames = Vec::with_capacity(2 + total / time_sampling);

        frames.push(SolutionFrame::capture(0, 0., integrator.current()));
        let mut failure = None;
        for o in observers.iter_mut() {
            if let Err(e) = o.at_startup(ObsCtx {
                sim,
                time_sampling,
                iter: 0,
                time: 0.,
                solution: integrator.current(),
            }) {
                failure = Some((0, e));
                break;
            }
        }

        let mut status = RunStatus::Completed;
        'steps: for n in 1..=total {
            if failure.is_some() {
                break;
            }
            if self.cancellation.is_cancelled() {
                tracing::info!("run cancelled after {} of {} steps", n - 1, total);
                status = RunStatus::Cancelled { step: n - 1 };
                break;
            }

            integrator.step();

            if let Some(node) = integrator.first_non_finite() {
                tracing::warn!(
                    "numerical blow-up at step {} (node {}), halting",
                    n,
                    node
                );
                status = RunStatus::NumericalBlowUp { step: n, node };
                break;
            }

            if n % time_sampling == 0 || n == total {
                let t = n as Float * d.dt();
                frames.push(SolutionFrame::capture(n, t, integrator.current()));
                for o in observers.iter_mut() {
                    if let Err(e) = o.at_each_iteration(ObsCtx {
                        sim,
                        time_sampling,
                        iter: n,
                        time: t,
                        solution: integrator.current(),
                    }) {
                        failure = Some((n, e));
                        break 'steps;
                    }
                }
            }
        }

        // cleanup runs even after a failure
        let reached = integrator.steps();
        for o in observers.iter_mut() {
            let cleanup = o.at_cleanup(ObsCtx {
                sim,
                time_sampling,
                iter: reached,
                time: reached as Float * d.dt(),
                solution: integrator.current(),
            });
            if let Err(e) = cleanup {
                if failure.is_none() {
                    failure = Some((reached, e));
                }
            }
        }

        match failure {
            None => Ok(RunReport {
                status,
                frames,
                unstable,
            }),
            Some((step, source)) => {
                tracing::warn!("observer failed at step {}: {}", step, source);
                Err(SimError::Aborted {
                    step,
                    source: Box::new(source),
                    partial: Box::new(RunReport {
                        status: RunStatus::Aborted { step },
                        frames,
                        unstable,
                    }),
                })
            }
        }
    }
}

impl Driver<'static> {
    /// Runs on a background thread; pair with [`Driver::cancellation`] to
    /// stop it from the caller's side.
    pub fn spawn(mut self) -> thread::JoinHandle<Result<RunReport, SimError>> {
        thread::spawn(move || self.run())
    }
}

pub struct Logger;

impl Observer for Logger {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        let d = ctx.sim().discretization();
        tracing::event!(
            tracing::Level::INFO,
            "start of `{}` run on `{}` (Δx={:e} ({} points), Δt={:e} ({} points), α={})",
            ctx.sim().scheme(),
            ctx.sim().profile(),
            d.dx(),
            d.nx(),
            d.dt(),
            d.nt(),
            d.courant(),
        );
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::TRACE,
            "`{}`: step {}/{} (t={:e})",
            ctx.sim().scheme(),
            ctx.iter(),
            ctx.total(),
            ctx.time()
        );
        Ok(())
    }

    fn at_cleanup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        tracing::event!(
            tracing::Level::INFO,
            "finished `{}` run after {} steps",
            ctx.sim().scheme(),
            ctx.iter()
        );
        Ok(())
    }
}

/// Calls `f(step, total)` for the initial level and every recorded level.
pub struct Progress<F>(pub F);

impl<F: FnMut(usize, usize)> Observer for Progress<F> {
    fn at_startup(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (self.0)(0, ctx.total());
        Ok(())
    }

    fn at_each_iteration(&mut self, ctx: ObsCtx) -> Result<(), SimError> {
        (self.0)(ctx.iter(), ctx.total());
        Ok(())
    }
}
