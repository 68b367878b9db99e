//! Integration entry points: a one-shot function and a reusable runner.

use crate::to_js_error;
use anyhow::Context;
use log::debug;
use odestep_core::{compile, CompiledFn, IntegrationSettings, Method, Span, StepTable};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

/// Integrates `y' = expression` over `span_val` (`{t0, y0, destination, step}`,
/// numbers or decimal strings) and returns `{t_values, y_values}`.
#[wasm_bindgen]
pub fn integrate_equation(
    expression: &str,
    method: &str,
    span_val: JsValue,
    settings_val: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let span = span_from_js(span_val)?;
    let settings = settings_from_js(settings_val)?;
    let integrator = WasmIntegrator::build(expression, method, settings).map_err(to_js_error)?;
    let table = integrator.integrate(&span).map_err(to_js_error)?;
    table_to_js(&table)
}

/// Holds a compiled right-hand side so the UI can re-integrate as the initial
/// condition or step size is edited without parsing the expression again.
#[wasm_bindgen]
pub struct WasmIntegrator {
    function: CompiledFn,
    method: Method,
    settings: IntegrationSettings,
}

#[wasm_bindgen]
impl WasmIntegrator {
    #[wasm_bindgen(constructor)]
    pub fn new(
        expression: &str,
        method: &str,
        settings_val: JsValue,
    ) -> Result<WasmIntegrator, JsValue> {
        console_error_panic_hook::set_once();

        let settings = settings_from_js(settings_val)?;
        WasmIntegrator::build(expression, method, settings).map_err(to_js_error)
    }

    /// Integrates over a `{t0, y0, destination, step}` object.
    pub fn run(&self, span_val: JsValue) -> Result<JsValue, JsValue> {
        let span = span_from_js(span_val)?;
        let table = self.integrate(&span).map_err(to_js_error)?;
        table_to_js(&table)
    }

    /// Integrates over the raw text of four form fields.
    pub fn run_text(
        &self,
        t0: &str,
        y0: &str,
        destination: &str,
        step: &str,
    ) -> Result<JsValue, JsValue> {
        let table = Span::parse(t0, y0, destination, step)
            .context("Invalid integration span")
            .and_then(|span| self.integrate(&span))
            .map_err(to_js_error)?;
        table_to_js(&table)
    }

    #[wasm_bindgen(getter)]
    pub fn expression(&self) -> String {
        self.function.source().to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn method(&self) -> String {
        self.method.name().to_string()
    }
}

impl WasmIntegrator {
    pub(crate) fn build(
        expression: &str,
        method: &str,
        settings: IntegrationSettings,
    ) -> anyhow::Result<Self> {
        let method: Method = method.parse()?;
        let function =
            compile(expression).with_context(|| format!("Invalid expression \"{}\"", expression))?;
        debug!(
            "integrator ready: {} for y' = {} (max {} steps)",
            method,
            function.source(),
            settings.max_steps
        );
        Ok(Self {
            function,
            method,
            settings,
        })
    }

    pub(crate) fn integrate(&self, span: &Span) -> anyhow::Result<StepTable> {
        self.method
            .integrate(&self.function, span, &self.settings)
            .with_context(|| {
                format!(
                    "{} integration of \"{}\" failed",
                    self.method,
                    self.function.source()
                )
            })
    }
}

fn span_from_js(span_val: JsValue) -> Result<Span, JsValue> {
    from_value(span_val).map_err(|e| JsValue::from_str(&format!("Invalid integration span: {}", e)))
}

fn settings_from_js(settings_val: JsValue) -> Result<IntegrationSettings, JsValue> {
    let settings: Option<IntegrationSettings> = from_value(settings_val)
        .map_err(|e| JsValue::from_str(&format!("Invalid integration settings: {}", e)))?;
    Ok(settings.unwrap_or_default())
}

fn table_to_js(table: &StepTable) -> Result<JsValue, JsValue> {
    to_value(table).map_err(|e| JsValue::from_str(&format!("Failed to serialize step table: {}", e)))
}
