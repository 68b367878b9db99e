//! Step-table drivers for the fixed-step integrators.
//!
//! Every driver starts the table at `(t0, y0)` and keeps stepping while the next
//! candidate time, the current time plus `step`, does not exceed `destination`.
//! Adams-Bashforth first bootstraps its history with RK4 and falls back to RK4
//! entirely when the span is too short to hold that history.

use crate::equation_engine::compile;
use crate::error::{Error, Result};
use crate::solvers::{AdamsBashforth4, Euler, RK4};
use crate::traits::{Derivative, Steppable};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Index-aligned solution table: `y_values[i]` approximates `y(t_values[i])`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTable {
    pub t_values: Vec<f64>,
    pub y_values: Vec<f64>,
}

impl StepTable {
    pub fn starting_at(t0: f64, y0: f64) -> Self {
        Self {
            t_values: vec![t0],
            y_values: vec![y0],
        }
    }

    pub fn push(&mut self, t: f64, y: f64) {
        self.t_values.push(t);
        self.y_values.push(y);
    }

    pub fn len(&self) -> usize {
        self.t_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t_values.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.t_values
            .iter()
            .copied()
            .zip(self.y_values.iter().copied())
    }

    /// The approximation at the last reached time.
    pub fn last(&self) -> Option<(f64, f64)> {
        Some((*self.t_values.last()?, *self.y_values.last()?))
    }
}

/// A numeric parameter given either as a number or as expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamInput {
    Number(f64),
    Text(String),
}

impl ParamInput {
    fn resolve(&self, name: &'static str) -> Result<f64> {
        match self {
            ParamInput::Number(value) => Ok(*value),
            ParamInput::Text(text) => evaluate_parameter(name, text),
        }
    }
}

impl From<f64> for ParamInput {
    fn from(value: f64) -> Self {
        ParamInput::Number(value)
    }
}

impl From<&str> for ParamInput {
    fn from(text: &str) -> Self {
        ParamInput::Text(text.to_string())
    }
}

/// Parameter text is itself an expression (`pi`, `1/10`), evaluated at `t = 0`.
fn evaluate_parameter(name: &'static str, text: &str) -> Result<f64> {
    compile(text)
        .and_then(|f| f.eval(&[("t", 0.0)]))
        .map_err(|source| Error::ParameterExpression {
            name,
            value: text.to_string(),
            source: Box::new(source),
        })
}

#[derive(Deserialize)]
struct RawSpan {
    t0: ParamInput,
    y0: ParamInput,
    destination: ParamInput,
    step: ParamInput,
}

/// Initial condition, integration end point and step size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpan")]
pub struct Span {
    pub t0: f64,
    pub y0: f64,
    pub destination: f64,
    pub step: f64,
}

impl TryFrom<RawSpan> for Span {
    type Error = Error;

    fn try_from(raw: RawSpan) -> Result<Self> {
        Span::new(
            raw.t0.resolve("t0")?,
            raw.y0.resolve("y0")?,
            raw.destination.resolve("destination")?,
            raw.step.resolve("step")?,
        )
    }
}

impl Span {
    pub fn new(t0: f64, y0: f64, destination: f64, step: f64) -> Result<Self> {
        let span = Self {
            t0,
            y0,
            destination,
            step,
        };
        span.validate()?;
        Ok(span)
    }

    /// Builds a span from the text a form would supply. Each field may be any
    /// expression that evaluates at `t = 0`.
    pub fn parse(t0: &str, y0: &str, destination: &str, step: &str) -> Result<Self> {
        Span::new(
            evaluate_parameter("t0", t0)?,
            evaluate_parameter("y0", y0)?,
            evaluate_parameter("destination", destination)?,
            evaluate_parameter("step", step)?,
        )
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("t0", self.t0),
            ("y0", self.y0),
            ("destination", self.destination),
        ] {
            if !value.is_finite() {
                return Err(Error::InvalidParameter {
                    name,
                    value: value.to_string(),
                });
            }
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(Error::InvalidStep { step: self.step });
        }
        Ok(())
    }

    /// `(destination - t0) / step`, the number of steps the span holds.
    pub fn step_count(&self) -> f64 {
        (self.destination - self.t0) / self.step
    }

    fn estimated_steps(&self) -> usize {
        // Saturating float-to-int cast; negative spans need no steps.
        self.step_count().max(0.0).floor() as usize
    }
}

/// Tunables shared by every integrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntegrationSettings {
    /// Upper bound on the number of steps a single integration may take.
    pub max_steps: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "euler")]
    Euler,
    #[serde(rename = "rk4", alias = "runge-kutta")]
    RungeKutta4,
    #[serde(rename = "adams-bashforth", alias = "ab4", alias = "adams")]
    AdamsBashforth4,
}

impl Method {
    pub fn name(self) -> &'static str {
        match self {
            Method::Euler => "euler",
            Method::RungeKutta4 => "rk4",
            Method::AdamsBashforth4 => "adams-bashforth",
        }
    }

    /// Integrates `f` over `span`, returning the full table or the first error.
    pub fn integrate(
        self,
        f: &impl Derivative,
        span: &Span,
        settings: &IntegrationSettings,
    ) -> Result<StepTable> {
        span.validate()?;
        let required = span.estimated_steps();
        if required > settings.max_steps {
            return Err(Error::StepLimitExceeded {
                required,
                limit: settings.max_steps,
            });
        }

        debug!(
            "integrating with {} from t={} (y={}) to {} by {}",
            self.name(),
            span.t0,
            span.y0,
            span.destination,
            span.step
        );

        let mut table = StepTable::starting_at(span.t0, span.y0);
        let mut budget = StepBudget::new(required, settings.max_steps);
        match self {
            Method::Euler => march(&mut Euler, f, span, &mut table, &mut budget)?,
            Method::RungeKutta4 => march(&mut RK4, f, span, &mut table, &mut budget)?,
            Method::AdamsBashforth4 => {
                if span.step_count() <= (AdamsBashforth4::HISTORY - 1) as f64 {
                    // Too short for a four-point history.
                    march(&mut RK4, f, span, &mut table, &mut budget)?;
                } else {
                    let mut stepper =
                        AdamsBashforth4::bootstrap(f, span.t0, span.y0, span.step)?;
                    for (t, y) in stepper.points().skip(1) {
                        budget.take()?;
                        table.push(t, y);
                    }
                    march(&mut stepper, f, span, &mut table, &mut budget)?;
                }
            }
        }

        debug!(
            "{} finished with {} rows, final point {:?}",
            self.name(),
            table.len(),
            table.last()
        );
        Ok(table)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Method::Euler),
            "rk4" | "runge-kutta" | "runge_kutta" => Ok(Method::RungeKutta4),
            "adams-bashforth" | "adams_bashforth" | "adams" | "ab4" => {
                Ok(Method::AdamsBashforth4)
            }
            _ => Err(Error::UnknownMethod {
                name: s.to_string(),
            }),
        }
    }
}

/// Counts steps against `IntegrationSettings::max_steps`.
struct StepBudget {
    taken: usize,
    required: usize,
    limit: usize,
}

impl StepBudget {
    fn new(required: usize, limit: usize) -> Self {
        Self {
            taken: 0,
            required,
            limit,
        }
    }

    fn take(&mut self) -> Result<()> {
        if self.taken >= self.limit {
            return Err(Error::StepLimitExceeded {
                required: self.required.max(self.limit + 1),
                limit: self.limit,
            });
        }
        self.taken += 1;
        Ok(())
    }
}

/// Steps from the last table row while the next time stays within the destination.
fn march(
    stepper: &mut impl Steppable,
    f: &impl Derivative,
    span: &Span,
    table: &mut StepTable,
    budget: &mut StepBudget,
) -> Result<()> {
    let Some((mut t, mut y)) = table.last() else {
        return Ok(());
    };

    loop {
        let next = t + span.step;
        if next > span.destination {
            return Ok(());
        }
        if next <= t {
            // The step vanishes against t; the loop would never end.
            return Err(Error::InvalidStep { step: span.step });
        }
        budget.take()?;
        stepper.step(f, &mut t, &mut y, span.step)?;
        trace!("t={t} y={y}");
        table.push(t, y);
    }
}

/// Euler's method over `span` with default settings.
pub fn euler(f: &impl Derivative, span: &Span) -> Result<StepTable> {
    Method::Euler.integrate(f, span, &IntegrationSettings::default())
}

/// Classical RK4 over `span` with default settings.
pub fn runge_kutta(f: &impl Derivative, span: &Span) -> Result<StepTable> {
    Method::RungeKutta4.integrate(f, span, &IntegrationSettings::default())
}

/// 4-step Adams-Bashforth over `span` with default settings.
pub fn adams_bashforth(f: &impl Derivative, span: &Span) -> Result<StepTable> {
    Method::AdamsBashforth4.integrate(f, span, &IntegrationSettings::default())
}
