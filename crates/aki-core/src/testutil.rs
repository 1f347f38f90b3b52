//! Test utilities for Aki
//!
//! Helpers that run a fragment through the whole pipeline in a fresh
//! session and check the shape of the result.

use std::rc::Rc;

use crate::error::{AkiError, ErrorCategory};
use crate::jit::{JitEngine, NativeValue};
use crate::session::Session;
use crate::types::TypeInterner;

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// An engine and a session that persist across several commands
pub struct TestSession {
    engine: JitEngine,
    session: Session,
}

impl TestSession {
    /// # Errors
    /// Returns error if the host is not supported by the JIT
    pub fn new() -> TestResult<Self> {
        let engine = JitEngine::new().map_err(|e| format!("JIT error: {e}"))?;
        let session = Session::for_engine(Rc::new(TypeInterner::new()), &engine);
        Ok(Self { engine, session })
    }

    /// Run one command, keeping the error value
    ///
    /// # Errors
    /// Returns the command's error unchanged
    pub fn try_run(&mut self, source: &str) -> Result<Option<NativeValue>, AkiError> {
        self.session.eval(&mut self.engine, source)
    }

    /// Run one command
    ///
    /// # Errors
    /// Returns the rendered diagnostic if the command fails
    pub fn run(&mut self, source: &str) -> TestResult<Option<NativeValue>> {
        self.try_run(source).map_err(|e| e.render(source))
    }

    pub fn session(&mut self) -> &mut Session {
        &mut self.session
    }
}

/// Evaluate a fragment in a fresh session
///
/// # Errors
/// Returns the rendered diagnostic if any stage fails
pub fn eval(source: &str) -> TestResult<Option<NativeValue>> {
    TestSession::new()?.run(source)
}

/// Evaluate a fragment and expect it to produce a value
///
/// # Errors
/// Returns error if evaluation fails or the fragment only defines functions
pub fn eval_value(source: &str) -> TestResult<NativeValue> {
    eval(source)?.ok_or_else(|| "Expected a value, got none".to_string())
}

/// Evaluate a fragment and expect a signed integer result
///
/// # Errors
/// Returns error if evaluation fails or the result is not a signed integer
pub fn eval_int(source: &str) -> TestResult<i64> {
    let value = eval_value(source)?;
    value
        .as_i64()
        .ok_or_else(|| format!("Expected i64, got {}", value.type_name()))
}

/// Evaluate a fragment and expect an unsigned integer result
///
/// # Errors
/// Returns error if evaluation fails or the result is not an unsigned integer
pub fn eval_uint(source: &str) -> TestResult<u64> {
    let value = eval_value(source)?;
    value
        .as_u64()
        .ok_or_else(|| format!("Expected u64, got {}", value.type_name()))
}

/// Evaluate a fragment and expect a boolean result
///
/// # Errors
/// Returns error if evaluation fails or the result is not a boolean
pub fn eval_bool(source: &str) -> TestResult<bool> {
    let value = eval_value(source)?;
    value
        .as_bool()
        .ok_or_else(|| format!("Expected bool, got {}", value.type_name()))
}

/// Evaluate a fragment and expect a float result of any width
///
/// # Errors
/// Returns error if evaluation fails or the result is not a float
pub fn eval_float(source: &str) -> TestResult<f64> {
    let value = eval_value(source)?;
    value
        .as_f64()
        .ok_or_else(|| format!("Expected float, got {}", value.type_name()))
}

/// Evaluate a fragment that should fail
///
/// # Errors
/// Returns error if the fragment succeeds
pub fn eval_error(source: &str) -> TestResult<AkiError> {
    match TestSession::new()?.try_run(source) {
        Ok(value) => Err(format!("Expected an error, got {value:?}")),
        Err(err) => Ok(err),
    }
}

/// Evaluate a fragment that should fail and return its category
///
/// # Errors
/// Returns error if the fragment succeeds
pub fn eval_error_category(source: &str) -> TestResult<ErrorCategory> {
    eval_error(source).map(|err| err.category())
}
