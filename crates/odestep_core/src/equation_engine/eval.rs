//! Tree-walking evaluator.

use super::environment::{Environment, NativeFn, Value};
use super::{Callee, Expr};
use crate::error::{Error, Result};

/// Evaluates `expr` against `env`.
///
/// A quoted sub-expression yields [`Value::Compiled`]; everything else yields a number.
pub fn evaluate(expr: &Expr, env: &Environment<'_>) -> Result<Value> {
    match expr {
        Expr::Number(value) => Ok(Value::Number(*value)),
        Expr::Ident(name) => match env.lookup(name)? {
            Value::Native(native) => Err(Error::TypeMismatch {
                name: native.name.to_string(),
                expected: "number",
                found: "function",
            }),
            value => Ok(value),
        },
        Expr::Neg(operand) => Ok(Value::Number(-evaluate_number(operand, env)?)),
        Expr::Binary { op, left, right } => {
            let left = evaluate_number(left, env)?;
            let right = evaluate_number(right, env)?;
            Ok(Value::Number(op.apply(left, right)))
        }
        Expr::Call { callee, args } => call(callee, args, env).map(Value::Number),
        Expr::Nested(compiled) => Ok(Value::Compiled(compiled.clone())),
    }
}

/// Evaluates `expr` in a position that needs a number. Quoted sub-expressions are
/// invoked against the current scope.
pub fn evaluate_number(expr: &Expr, env: &Environment<'_>) -> Result<f64> {
    let value = evaluate(expr, env)?;
    into_number(value, env)
}

fn into_number(value: Value, env: &Environment<'_>) -> Result<f64> {
    match value {
        Value::Number(number) => Ok(number),
        Value::Compiled(compiled) => compiled.eval_in(env),
        Value::Native(native) => Err(Error::TypeMismatch {
            name: native.name.to_string(),
            expected: "number",
            found: "function",
        }),
    }
}

fn resolve_callee(callee: &Callee, env: &Environment<'_>) -> Result<Value> {
    match callee {
        Callee::Name(name) => env.lookup(name),
        Callee::Number(number) => Ok(Value::Number(*number)),
    }
}

fn call(callee: &Callee, args: &[Expr], env: &Environment<'_>) -> Result<f64> {
    match resolve_callee(callee, env)? {
        Value::Native(native) => apply_native(native, args, env),
        // Juxtaposition with a number is multiplication, not application.
        value => {
            let [arg] = args else {
                return Err(Error::TypeMismatch {
                    name: callee.to_string(),
                    expected: "function",
                    found: value.kind(),
                });
            };
            let factor = into_number(value, env)?;
            Ok(factor * evaluate_number(arg, env)?)
        }
    }
}

fn apply_native(native: NativeFn, args: &[Expr], env: &Environment<'_>) -> Result<f64> {
    let [arg] = args else {
        return Err(Error::Arity {
            name: native.name.to_string(),
            expected: NativeFn::ARITY,
            found: args.len(),
        });
    };
    Ok((native.apply)(evaluate_number(arg, env)?))
}
