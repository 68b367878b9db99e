use crate::error::Result;
use crate::traits::{Derivative, Steppable};

/// Explicit (forward) Euler, first order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl Steppable for Euler {
    fn step(&mut self, f: &impl Derivative, t: &mut f64, y: &mut f64, dt: f64) -> Result<()> {
        let slope = f.slope(*t, *y)?;
        *y += dt * slope;
        *t += dt;
        Ok(())
    }
}

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RK4;

impl Steppable for RK4 {
    fn step(&mut self, f: &impl Derivative, t: &mut f64, y: &mut f64, dt: f64) -> Result<()> {
        let t0 = *t;
        let y0 = *y;

        // k1 = f(t, y)
        let k1 = f.slope(t0, y0)?;
        // k2 = f(t + dt/2, y + dt*k1/2)
        let k2 = f.slope(t0 + dt / 2.0, y0 + dt * k1 / 2.0)?;
        // k3 = f(t + dt/2, y + dt*k2/2)
        let k3 = f.slope(t0 + dt / 2.0, y0 + dt * k2 / 2.0)?;
        // k4 = f(t + dt, y + dt*k3)
        let k4 = f.slope(t0 + dt, y0 + dt * k3)?;

        // y_next = y + dt * (k1 + 2k2 + 2k3 + k4) / 6
        *y = y0 + dt * (k1 + 2.0 * k2 + 2.0 * k3 + k4) / 6.0;
        *t = t0 + dt;
        Ok(())
    }
}

/// A solution point together with the derivative evaluated there.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    t: f64,
    y: f64,
    slope: f64,
}

impl Sample {
    fn new(f: &impl Derivative, t: f64, y: f64) -> Result<Self> {
        Ok(Self {
            t,
            y,
            slope: f.slope(t, y)?,
        })
    }
}

/// Explicit 4-step Adams-Bashforth predictor.
///
/// Holds the last four points (oldest first). The window is seeded by
/// [`AdamsBashforth4::bootstrap`], which takes three RK4 steps from the initial point.
/// Derivatives are cached per point, so each step costs one evaluation of `f`.
#[derive(Debug, Clone)]
pub struct AdamsBashforth4 {
    window: [Sample; 4],
}

impl AdamsBashforth4 {
    /// Number of points the method needs before it can extrapolate.
    pub const HISTORY: usize = 4;

    /// Builds the starting window `s0..s3` at `t0 + k*dt` from RK4 steps.
    pub fn bootstrap(f: &impl Derivative, t0: f64, y0: f64, dt: f64) -> Result<Self> {
        let s0 = Sample::new(f, t0, y0)?;
        let mut window = [s0; 4];

        let mut rk4 = RK4;
        let mut t = t0;
        let mut y = y0;
        for (k, slot) in window.iter_mut().enumerate().skip(1) {
            rk4.step(f, &mut t, &mut y, dt)?;
            *slot = Sample::new(f, t0 + k as f64 * dt, y)?;
        }

        Ok(Self { window })
    }

    /// The `(t, y)` points currently in the window, oldest first.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.window.iter().map(|sample| (sample.t, sample.y))
    }

    /// The newest point of the window.
    pub fn current(&self) -> (f64, f64) {
        let newest = self.window[3];
        (newest.t, newest.y)
    }
}

impl Steppable for AdamsBashforth4 {
    /// Advances from the newest window point; the incoming `t`/`y` are overwritten with
    /// the new point.
    fn step(&mut self, f: &impl Derivative, t: &mut f64, y: &mut f64, dt: f64) -> Result<()> {
        let [s0, s1, s2, s3] = self.window;

        let y_next = s3.y
            + dt * (55.0 * s3.slope - 59.0 * s2.slope + 37.0 * s1.slope - 9.0 * s0.slope) / 24.0;
        let t_next = s3.t + dt;

        self.window = [s1, s2, s3, Sample::new(f, t_next, y_next)?];
        *t = t_next;
        *y = y_next;
        Ok(())
    }
}
