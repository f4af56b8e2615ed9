//! Prepared-path and direct-path executors.
//!
//! Both paths end in the same [`ResultSet`] shape so callers cannot observe
//! which one ran. The prepared path owns its statement handle through an RAII
//! guard: release happens on success, on error, and when the future is
//! dropped mid-flight by cancellation.

use mallard_engine::{ParamValue, SqlEngine, StatementHandle};
use tracing::debug;

use crate::classify::ErrorSignatures;
use crate::error::ExecutionError;
use crate::result::ResultSet;
use crate::sqlscan;

/// Scoped ownership of a prepared handle. Dropping the guard returns the
/// handle to the engine, whatever exit path got us here.
struct HandleGuard<'a> {
    engine: &'a dyn SqlEngine,
    handle: Option<StatementHandle>,
}

impl<'a> HandleGuard<'a> {
    fn new(engine: &'a dyn SqlEngine, handle: StatementHandle) -> Self {
        Self {
            engine,
            handle: Some(handle),
        }
    }

    fn handle(&self) -> &StatementHandle {
        self.handle.as_ref().expect("guard holds handle until drop")
    }
}

impl Drop for HandleGuard<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.engine.release(handle);
        }
    }
}

/// Executes `sql` through the prepared-statement API.
///
/// Placeholder arity is checked before any engine call so an arity mismatch
/// is a caller error, not an engine round trip. Prepare-stage failures are
/// classified separately from execution-stage failures: only the former may
/// produce the fallback-triggering `PrepareUnsupported`.
pub(crate) async fn execute_prepared(
    engine: &dyn SqlEngine,
    signatures: &dyn ErrorSignatures,
    sql: &str,
    params: &[ParamValue],
) -> Result<ResultSet, ExecutionError> {
    let placeholders = sqlscan::count_placeholders(sql);
    if placeholders != params.len() {
        return Err(ExecutionError::ParameterBindingError(format!(
            "statement expects {placeholders} parameters, {} provided",
            params.len()
        )));
    }

    let handle = engine
        .prepare(sql)
        .await
        .map_err(|error| signatures.classify_prepare(&error))?;
    let guard = HandleGuard::new(engine, handle);

    let native = engine
        .bind_and_execute(guard.handle(), params)
        .await
        .map_err(|error| signatures.classify_execution(&error))?;

    Ok(ResultSet::from_native(native))
}

/// Executes `sql` through the engine's non-prepared entry point.
///
/// Parameters are substituted textually; the engine runs any internal
/// statement sequence to completion and the final statement's result is
/// adapted. No construct is special-cased by name, which makes this path the
/// correctness reference for any query that succeeds on it.
pub(crate) async fn execute_direct(
    engine: &dyn SqlEngine,
    signatures: &dyn ErrorSignatures,
    sql: &str,
    params: &[ParamValue],
) -> Result<ResultSet, ExecutionError> {
    let text = if params.is_empty() {
        sql.to_string()
    } else {
        sqlscan::substitute_placeholders(sql, params).map_err(|mismatch| {
            // Substitution problems on this path are execution errors, not
            // precondition violations.
            ExecutionError::RuntimeExecutionError(format!(
                "cannot substitute parameters: statement has {} placeholders, {} values provided",
                mismatch.placeholders, mismatch.supplied
            ))
        })?
    };

    debug!("direct execution of statement text");
    let native = engine
        .execute_direct(&text)
        .await
        .map_err(|error| signatures.classify_execution(&error))?;

    Ok(ResultSet::from_native(native))
}
