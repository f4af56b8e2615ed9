//! Embedded analytical-engine boundary for the mallard SQL front end.
//!
//! The front end treats its SQL engine as an opaque executor: statement text
//! and parameters go in, a prepared handle or a columnar result comes out.
//! This crate defines that seam — the [`SqlEngine`] trait plus the value types
//! crossing it — and an in-memory engine used by tests and local harnesses.

pub mod memory;

use std::fmt;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryEngine;

/// Failure reported by the embedded engine.
///
/// The message is kept verbatim: downstream classification works on the
/// engine's own diagnostic text, and callers expect to see it unchanged.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct EngineError {
    /// Diagnostic text exactly as produced by the engine.
    pub message: String,
    /// Optional engine-specific error code, when the engine exposes one.
    pub code: Option<String>,
}

impl EngineError {
    /// Creates an error carrying only a diagnostic message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Creates an error carrying a message and an engine error code.
    pub fn with_code(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: Some(code.into()),
        }
    }
}

/// Typed parameter value bound to one `?` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Text(String),
    /// Calendar day in ISO `YYYY-MM-DD` form.
    Date(String),
    /// Exact numeric in decimal string form, scale preserved.
    Decimal(String),
}

impl ParamValue {
    /// Renders the value as a SQL literal for non-prepared execution.
    ///
    /// Single quotes in text values are doubled so the rendered literal stays
    /// a single token to the engine's own lexer.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int64(value) => value.to_string(),
            Self::Float64(value) => {
                if value.is_finite() {
                    value.to_string()
                } else {
                    // Non-finite floats have no portable literal form; quote
                    // the engine-recognized spellings instead.
                    format!("'{value}'")
                }
            }
            Self::Text(value) => format!("'{}'", value.replace('\'', "''")),
            Self::Date(day) => format!("DATE '{}'", day.replace('\'', "''")),
            // The engine parses a bare decimal token at full scale; routing
            // it through a float literal would lose precision.
            Self::Decimal(value) => value.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql_literal())
    }
}

/// Resource representing one compiled, parameter-bindable plan.
///
/// Handles are exclusively owned by one execution attempt and are not `Clone`;
/// ownership moves back to the engine through [`SqlEngine::release`].
#[derive(Debug)]
pub struct StatementHandle {
    id: u64,
}

impl StatementHandle {
    /// Creates a handle wrapping an engine-assigned identifier.
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    /// Engine-assigned identifier for this compiled plan.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Columnar result in the engine's native representation.
///
/// For a statement sequence run inside the engine, this is the final
/// statement's result. Mutations report `rows_affected` and usually carry an
/// empty schema.
#[derive(Debug, Clone)]
pub struct NativeResult {
    /// Ordered column schema.
    pub schema: SchemaRef,
    /// Ordered row batches.
    pub batches: Vec<RecordBatch>,
    /// Rows changed by a mutation, when the engine reports one.
    pub rows_affected: Option<u64>,
}

impl NativeResult {
    /// Creates a query result from a schema and its row batches.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Self {
        Self {
            schema,
            batches,
            rows_affected: None,
        }
    }

    /// Creates an empty, zero-column result.
    pub fn empty() -> Self {
        Self::new(SchemaRef::new(arrow::datatypes::Schema::empty()), Vec::new())
    }

    /// Creates a result describing a mutation that changed `rows` rows.
    pub fn mutation(rows: u64) -> Self {
        let mut result = Self::empty();
        result.rows_affected = Some(rows);
        result
    }
}

/// Opaque executor contract for the embedded analytical engine.
///
/// `prepare`/`bind_and_execute`/`execute_direct` are the only operations that
/// may block or yield. `release` is synchronous and infallible so callers can
/// guarantee it on every exit path, including drop during cancellation.
#[async_trait]
pub trait SqlEngine: Send + Sync {
    /// Compiles `sql` into a parameter-bindable plan.
    async fn prepare(&self, sql: &str) -> Result<StatementHandle, EngineError>;

    /// Binds `params` positionally and executes the compiled plan.
    async fn bind_and_execute(
        &self,
        handle: &StatementHandle,
        params: &[ParamValue],
    ) -> Result<NativeResult, EngineError>;

    /// Executes raw SQL text without a prepared handle, running any internal
    /// statement sequence to completion.
    async fn execute_direct(&self, sql: &str) -> Result<NativeResult, EngineError>;

    /// Returns a compiled plan's resources to the engine.
    fn release(&self, handle: StatementHandle);

    /// Whether a `prepare` failure is guaranteed to leave no partial side
    /// effects behind.
    ///
    /// Fallback after a failed prepare of a mutating statement is only sound
    /// under this guarantee; engines that cannot give it must override.
    fn prepare_failures_are_side_effect_free(&self) -> bool {
        true
    }
}
