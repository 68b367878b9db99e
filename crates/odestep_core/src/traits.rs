use crate::error::Result;

/// The right-hand side `f(t, y)` of a scalar ODE `y' = f(t, y)`.
///
/// Evaluation may fail (an unbound identifier in a compiled expression, for example);
/// integrators abort on the first failure.
pub trait Derivative {
    fn slope(&self, t: f64, y: f64) -> Result<f64>;
}

impl<F> Derivative for F
where
    F: Fn(f64, f64) -> Result<f64>,
{
    fn slope(&self, t: f64, y: f64) -> Result<f64> {
        self(t, y)
    }
}

/// A trait for solvers that can step a scalar equation forward.
pub trait Steppable {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// y: current value (updated after step)
    fn step(&mut self, f: &impl Derivative, t: &mut f64, y: &mut f64, dt: f64) -> Result<()>;
}
