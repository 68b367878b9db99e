//! Expression checking and one-off evaluation.

use crate::to_js_error;
use anyhow::Context;
use odestep_core::compile;
use odestep_core::equation_engine::Bindings;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

/// Compiles `expression` and reports the first lexical or syntactic error.
#[wasm_bindgen]
pub fn validate_expression(expression: &str) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    check(expression).map_err(to_js_error)
}

/// Evaluates `expression` once. `bindings` is a `{ name: number }` object and may be
/// `undefined`, in which case only the built-ins are visible.
#[wasm_bindgen]
pub fn evaluate_expression(expression: &str, bindings: JsValue) -> Result<f64, JsValue> {
    console_error_panic_hook::set_once();

    let bindings: Option<Bindings> = from_value(bindings)
        .map_err(|e| JsValue::from_str(&format!("Invalid bindings: {}", e)))?;
    evaluate_with(expression, &bindings.unwrap_or_default()).map_err(to_js_error)
}

pub(crate) fn check(expression: &str) -> anyhow::Result<()> {
    compile(expression)
        .map(|_| ())
        .with_context(|| format!("Invalid expression \"{}\"", expression))
}

pub(crate) fn evaluate_with(expression: &str, bindings: &Bindings) -> anyhow::Result<f64> {
    let compiled =
        compile(expression).with_context(|| format!("Invalid expression \"{}\"", expression))?;
    compiled
        .call(bindings)
        .with_context(|| format!("Failed to evaluate \"{}\"", expression))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, f64)]) -> Bindings {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[test]
    fn check_accepts_valid_and_rejects_malformed_input() {
        assert!(check("sin t + 2y").is_ok());

        let message = format!("{:#}", check("2 +").unwrap_err());
        assert!(message.starts_with("Invalid expression \"2 +\""));
        assert!(message.contains("unexpected termination"));

        let message = format!("{:#}", check("2 $ 3").unwrap_err());
        assert!(message.contains("'$' at position 2"));
    }

    #[test]
    fn evaluate_uses_bindings() {
        let value = evaluate_with("2 * t + y", &bindings(&[("t", 1.5), ("y", 2.0)])).unwrap();
        assert_eq!(value, 5.0);
        assert_eq!(evaluate_with("cos 0", &Bindings::new()).unwrap(), 1.0);
    }

    #[test]
    fn evaluate_reports_unbound_names() {
        let message = format!("{:#}", evaluate_with("t + 1", &Bindings::new()).unwrap_err());
        assert!(message.contains("Failed to evaluate \"t + 1\""));
        assert!(message.contains("unspecified identifier \"t\""));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::{evaluate_expression, validate_expression};
    use serde::Serialize;
    use std::collections::BTreeMap;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::wasm_bindgen_test;

    fn object(pairs: &[(&str, f64)]) -> JsValue {
        let map: BTreeMap<&str, f64> = pairs.iter().copied().collect();
        map.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .expect("bindings")
    }

    #[wasm_bindgen_test]
    fn evaluate_expression_reads_plain_objects() {
        let value = evaluate_expression("t y", object(&[("t", 3.0), ("y", 4.0)])).unwrap();
        assert_eq!(value, 12.0);
        assert_eq!(evaluate_expression("2 ^ 3", JsValue::UNDEFINED).unwrap(), 8.0);
    }

    #[wasm_bindgen_test]
    fn errors_cross_as_strings() {
        let message = validate_expression("(1 + 2")
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("unexpected termination"));

        let message = evaluate_expression("x", JsValue::UNDEFINED)
            .err()
            .and_then(|err| err.as_string())
            .unwrap_or_default();
        assert!(message.contains("unspecified identifier \"x\""));
    }
}
