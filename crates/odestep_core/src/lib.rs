//! The `odestep_core` crate is the numerical engine behind odestep.
//! It turns a user-typed expression in `t` and `y` into a reusable function and
//! integrates the initial value problem `y' = f(t, y)` with fixed-step methods.
//!
//! Key components:
//! - **Equation Engine**: tokenizer, recursive-descent parser, scoped evaluator and the
//!   `compile` facade producing a `CompiledFn`.
//! - **Traits**: `Derivative` (anything yielding `f(t, y)`), `Steppable` (single-step methods).
//! - **Solvers**: Euler, classical RK4 and the 4-step Adams-Bashforth predictor.
//! - **Integration**: span/settings configuration and the drivers that build step tables.
pub mod equation_engine;
pub mod error;
pub mod integration;
pub mod solvers;
pub mod traits;

pub use equation_engine::{compile, CompiledFn};
pub use error::{Error, ParseError, Result};
pub use integration::{IntegrationSettings, Method, Span, StepTable};
