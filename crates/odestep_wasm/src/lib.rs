//! WebAssembly bindings for `odestep_core`.
//!
//! Each export installs the panic hook, converts its JS arguments with
//! `serde_wasm_bindgen` and reports failures as plain JS strings. The conversions
//! live in small `anyhow`-returning helpers so they can be tested natively.

mod expression;
mod integrator;

pub use expression::{evaluate_expression, validate_expression};
pub use integrator::{integrate_equation, WasmIntegrator};

use wasm_bindgen::JsValue;

/// Flattens an error chain into the string handed to JS.
pub(crate) fn to_js_error(err: anyhow::Error) -> JsValue {
    JsValue::from_str(&format!("{err:#}"))
}
