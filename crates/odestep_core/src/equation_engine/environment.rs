//! Chained name-resolution scopes.
//!
//! Every per-call scope borrows its parent, and every chain ends at the process-wide
//! global scope holding the built-in functions and constants.

use super::CompiledFn;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::f64::consts;
use std::fmt;
use std::sync::LazyLock;

/// A built-in real function of one argument.
#[derive(Clone, Copy)]
pub struct NativeFn {
    pub name: &'static str,
    pub apply: fn(f64) -> f64,
}

impl NativeFn {
    pub const ARITY: usize = 1;
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// What a name can resolve to.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Native(NativeFn),
    /// A quoted sub-expression, still unevaluated.
    Compiled(CompiledFn),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Native(_) => "function",
            Value::Compiled(_) => "expression",
        }
    }
}

enum Frame<'a> {
    Table(HashMap<String, Value>),
    Map(&'a HashMap<String, f64>),
    Vars(&'a [(&'a str, f64)]),
}

impl Frame<'_> {
    fn get(&self, name: &str) -> Option<Value> {
        match self {
            Frame::Table(table) => table.get(name).cloned(),
            Frame::Map(map) => map.get(name).copied().map(Value::Number),
            Frame::Vars(vars) => vars
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| Value::Number(*value)),
        }
    }
}

/// A read-only scope with an optional borrowed parent.
pub struct Environment<'a> {
    frame: Frame<'a>,
    parent: Option<&'a Environment<'a>>,
}

static GLOBAL: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let natives: [(&'static str, fn(f64) -> f64); 11] = [
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("ln", f64::ln),
        ("arcsin", f64::asin),
        ("arccos", f64::acos),
        ("arctan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("sqrt", f64::sqrt),
    ];

    let mut table: HashMap<String, Value> = natives
        .into_iter()
        .map(|(name, apply)| (name.to_string(), Value::Native(NativeFn { name, apply })))
        .collect();
    table.insert("pi".to_string(), Value::Number(consts::PI));
    table.insert("e".to_string(), Value::Number(consts::E));

    Environment::new(table, None)
});

impl<'a> Environment<'a> {
    pub fn new(bindings: HashMap<String, Value>, parent: Option<&'a Environment<'a>>) -> Self {
        Self {
            frame: Frame::Table(bindings),
            parent,
        }
    }

    pub fn with_map(bindings: &'a HashMap<String, f64>, parent: &'a Environment<'a>) -> Self {
        Self {
            frame: Frame::Map(bindings),
            parent: Some(parent),
        }
    }

    pub fn with_vars(vars: &'a [(&'a str, f64)], parent: &'a Environment<'a>) -> Self {
        Self {
            frame: Frame::Vars(vars),
            parent: Some(parent),
        }
    }

    /// The built-in scope shared by every compiled expression.
    pub fn global() -> &'static Environment<'static> {
        &GLOBAL
    }

    /// Resolves `name` in this scope, then up the parent chain.
    pub fn lookup(&self, name: &str) -> Result<Value> {
        let mut scope = Some(self);
        while let Some(env) = scope {
            if let Some(value) = env.frame.get(name) {
                return Ok(value);
            }
            scope = env.parent;
        }
        Err(Error::UnboundIdentifier {
            name: name.to_string(),
        })
    }
}
