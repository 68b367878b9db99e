//! Expression engine: tokenizer, parser, scoped evaluator and the `compile` facade.
//!
//! `compile` parses a source string once and returns a [`CompiledFn`], a cheap-to-clone
//! callable that evaluates the cached tree against fresh variable bindings.

pub mod environment;
pub mod eval;
pub mod lexer;
pub mod parser;

use crate::error::Result;
use crate::traits::Derivative;
use environment::Environment;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use parser::parse;

/// Variable values supplied at call time.
pub type Bindings = HashMap<String, f64>;

/// Arithmetic operators of [`Expr::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// Plain IEEE-754 arithmetic; Inf and NaN propagate.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinaryOp::Add => left + right,
            BinaryOp::Sub => left - right,
            BinaryOp::Mul => left * right,
            BinaryOp::Div => left / right,
            BinaryOp::Pow => left.powf(right),
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
            BinaryOp::Pow => '^',
        };
        write!(f, "{symbol}")
    }
}

/// Abstract Syntax Tree nodes for expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `name(a, b)` or juxtaposition such as `sin x` / `2x`.
    Call { callee: Callee, args: Vec<Expr> },
    /// A quoted sub-expression. It evaluates to a function value, not a number.
    Nested(CompiledFn),
}

/// The head of a call. A numeric head multiplies its argument instead of applying it.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    Name(String),
    Number(f64),
}

impl fmt::Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Name(name) => f.write_str(name),
            Callee::Number(value) => write!(f, "{value}"),
        }
    }
}

struct Compiled {
    source: String,
    expr: Expr,
}

/// A parsed expression ready to be evaluated any number of times.
#[derive(Clone)]
pub struct CompiledFn {
    inner: Arc<Compiled>,
}

impl CompiledFn {
    pub(crate) fn new(source: &str, expr: Expr) -> Self {
        Self {
            inner: Arc::new(Compiled {
                source: source.to_string(),
                expr,
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn expr(&self) -> &Expr {
        &self.inner.expr
    }

    /// Evaluates with `bindings` layered over the global environment.
    pub fn call(&self, bindings: &Bindings) -> Result<f64> {
        let env = Environment::with_map(bindings, Environment::global());
        self.eval_in(&env)
    }

    /// Like [`CompiledFn::call`], without building a map.
    pub fn eval(&self, vars: &[(&str, f64)]) -> Result<f64> {
        let env = Environment::with_vars(vars, Environment::global());
        self.eval_in(&env)
    }

    /// Evaluates against an existing scope. Nested expressions use this to see the
    /// variables of the expression that quotes them.
    pub fn eval_in(&self, env: &Environment<'_>) -> Result<f64> {
        eval::evaluate_number(&self.inner.expr, env)
    }
}

impl fmt::Debug for CompiledFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFn")
            .field("source", &self.inner.source)
            .field("expr", &self.inner.expr)
            .finish()
    }
}

impl PartialEq for CompiledFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.source == other.inner.source && self.inner.expr == other.inner.expr)
    }
}

impl Derivative for CompiledFn {
    fn slope(&self, t: f64, y: f64) -> Result<f64> {
        self.eval(&[("t", t), ("y", y)])
    }
}

/// Parses `source` and returns a reusable function of its variables.
pub fn compile(source: &str) -> Result<CompiledFn> {
    let expr = parse(source)?;
    debug!("compiled expression {source:?}");
    Ok(CompiledFn::new(source, expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ParseError};

    fn value(source: &str) -> f64 {
        compile(source)
            .expect("expression should compile")
            .eval(&[])
            .expect("expression should evaluate")
    }

    fn value_with(source: &str, vars: &[(&str, f64)]) -> f64 {
        compile(source)
            .expect("expression should compile")
            .eval(vars)
            .expect("expression should evaluate")
    }

    #[test]
    fn evaluates_literals_and_trims_whitespace() {
        assert_eq!(value("100"), 100.0);
        assert_eq!(value(" 10    "), 10.0);
    }

    #[test]
    fn arithmetic_follows_precedence() {
        assert_eq!(value("10 + 2 - 3"), 9.0);
        assert_eq!(value("7 * 6 / 2"), 21.0);
        assert_eq!(value("(3 + 2 * (2 - 2))"), 3.0);
        assert_eq!(value("10 + ((2 ^ 2) - 1) * 2"), 16.0);
    }

    #[test]
    fn exponentiation_is_left_associative() {
        assert_eq!(value("2 ^ 2 ^ 2"), 16.0);
        assert_eq!(value("2 ^ 3 ^ 2"), 64.0);
    }

    #[test]
    fn subtraction_without_spaces() {
        assert_eq!(value("3-2"), 1.0);
        assert_eq!(value("3 -2"), 1.0);
        assert_eq!(value("-3 + 5"), 2.0);
        assert_eq!(value("2 - -3"), 5.0);
    }

    #[test]
    fn unary_minus_binds_tighter_than_power() {
        assert_eq!(value("-2 ^ 2"), 4.0);
        assert_eq!(value("0 - 2 ^ 2"), -4.0);
    }

    #[test]
    fn juxtaposition_applies_functions() {
        assert_eq!(value_with("sin 2 * t", &[("t", 1.0)]), 2.0_f64.sin());
        assert_eq!(value_with("cos 2 * (t + 1)", &[("t", 2.0)]), 6.0_f64.cos());
        assert_eq!(value_with("(tan x) ^ 2", &[("x", 1.0)]), 1.0_f64.tan().powf(2.0));
        assert_eq!(value_with("tanh x ^ (0 - 1)", &[("x", 2.0)]), 0.5_f64.tanh());
        assert_eq!(value_with("sqrt 100 ^ x", &[("x", 2.0)]), 100.0);
        assert_eq!(value_with("sqrt 100 ^ x", &[("x", 1.0)]), 10.0);
        assert_eq!(value_with("cosh 3 * x", &[("x", 1.0)]), 3.0_f64.cosh());
    }

    #[test]
    fn negated_calls() {
        assert_eq!(value_with("-sin t", &[("t", 0.5)]), -(0.5_f64.sin()));
        assert_eq!(value_with("-sin(t)", &[("t", 0.5)]), -(0.5_f64.sin()));
        assert_eq!(
            value_with("y * -cos t", &[("t", 0.5), ("y", 3.0)]),
            3.0 * -(0.5_f64.cos())
        );
        assert_eq!(value_with("1 - -sin t", &[("t", 0.5)]), 1.0 + 0.5_f64.sin());
    }

    #[test]
    fn juxtaposed_number_multiplies() {
        assert_eq!(value_with("2x", &[("x", 3.0)]), 6.0);
        assert_eq!(value_with("3 sin x", &[("x", 0.5)]), 3.0 * 0.5_f64.sin());
        assert_eq!(value_with("t y", &[("t", 2.0), ("y", 5.0)]), 10.0);
        assert_eq!(value("2(3 + 1)"), 8.0);
    }

    #[test]
    fn explicit_call_syntax() {
        assert_eq!(value_with("sin(x)", &[("x", 0.25)]), 0.25_f64.sin());
        assert_eq!(value_with("ln(x) + 1", &[("x", 1.0)]), 1.0);
    }

    #[test]
    fn global_functions_and_constants() {
        assert_eq!(value_with("ln x", &[("x", 1.0)]), 0.0);
        assert_eq!(value_with("ln x", &[("x", 2.0)]), 2.0_f64.ln());
        assert_eq!(value_with("arcsin x", &[("x", 1.0)]), 1.0_f64.asin());
        assert_eq!(value_with("arccos 2 * x", &[("x", 0.5)]), 0.0);
        assert_eq!(value_with("arctan x", &[("x", 1.0)]), 1.0_f64.atan());
        assert_eq!(value_with("sinh x", &[("x", 1.0)]), 1.0_f64.sinh());
        assert_eq!(value("pi"), std::f64::consts::PI);
        assert_eq!(value("e ^ (0 - 2)"), std::f64::consts::E.powf(-2.0));
    }

    #[test]
    fn quoted_expression_sees_enclosing_variables() {
        assert_eq!(value_with("2 * \"t + 1\"", &[("t", 3.0)]), 8.0);
        assert_eq!(value_with("sin(\"t\")", &[("t", 0.5)]), 0.5_f64.sin());
        assert_eq!(value_with("\"t ^ 2\"", &[("t", 3.0)]), 9.0);
    }

    #[test]
    fn quoted_expression_errors_surface_at_compile_time() {
        assert!(matches!(
            compile("1 + \"2 +\""),
            Err(Error::Parse(ParseError::UnexpectedEnd { .. }))
        ));
    }

    #[test]
    fn call_with_map_bindings() {
        let f = compile("2 * t - y").expect("compile");
        let mut bindings = Bindings::new();
        bindings.insert("t".to_string(), 2.0);
        bindings.insert("y".to_string(), 1.0);
        assert_eq!(f.call(&bindings).unwrap(), 3.0);
        bindings.insert("y".to_string(), 4.0);
        assert_eq!(f.call(&bindings).unwrap(), 0.0);
    }

    #[test]
    fn repeated_evaluation_is_deterministic() {
        let f = compile("e ^ (sin t) + (cos y) ^ t").expect("compile");
        let first = f.eval(&[("t", 1.3), ("y", -0.7)]).unwrap();
        let second = f.eval(&[("t", 1.3), ("y", -0.7)]).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn unbound_identifier_fails() {
        let f = compile("x + 1").expect("compile");
        assert_eq!(
            f.eval(&[("t", 1.0)]),
            Err(Error::UnboundIdentifier {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn arithmetic_specials_are_not_errors() {
        assert_eq!(value("1 / 0"), f64::INFINITY);
        assert!(value("0 / 0").is_nan());
        assert!(value("(0 - 8) ^ 0.5").is_nan());
        assert!(value_with("ln x", &[("x", -1.0)]).is_nan());
    }

    #[test]
    fn compiled_fn_is_shareable_across_threads() {
        let f = compile("t * y").expect("compile");
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = f.clone();
                std::thread::spawn(move || f.eval(&[("t", i as f64), ("y", 2.0)]).unwrap())
            })
            .collect();
        let results: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, vec![0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn derivative_binds_t_and_y() {
        let f = compile("2 * t + y").expect("compile");
        assert_eq!(f.slope(1.5, 4.0).unwrap(), 7.0);
    }
}
