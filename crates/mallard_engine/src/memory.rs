//! In-memory [`SqlEngine`] used by tests and local harnesses.
//!
//! `MemoryEngine` sits beside the production engine the way an in-memory
//! store sits beside a persistent one: same contract, observable internals.
//! Statements can be scripted with canned results or stage failures; text
//! that is not scripted gets engine-faithful front-end behavior (prepare
//! rejects multi-statement batches and internally-rewritten constructs).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::{EngineError, NativeResult, ParamValue, SqlEngine, StatementHandle};

/// Diagnostic produced when a statement sequence reaches the prepare API.
///
/// This is the signature the dispatcher's default classifier matches on, kept
/// verbatim from the embedded engine.
pub const MULTI_STATEMENT_PREPARE_ERROR: &str = "Cannot prepare multiple statements at once";

/// Canned behavior for one scripted statement.
#[derive(Debug, Clone, Default)]
struct ScriptedStatement {
    prepare_error: Option<EngineError>,
    execute_error: Option<EngineError>,
    result: Option<NativeResult>,
}

/// Scriptable in-memory engine with call and handle accounting.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    scripts: Mutex<HashMap<String, ScriptedStatement>>,
    /// Live handle id -> statement text owned by that handle.
    handles: Mutex<HashMap<u64, String>>,
    /// Successful executions per statement text, both paths combined.
    executions: Mutex<HashMap<String, u64>>,
    next_handle_id: AtomicU64,
    prepare_calls: AtomicU64,
    direct_calls: AtomicU64,
    opened_handles: AtomicU64,
    released_handles: AtomicU64,
    /// Artificial latency applied at execution suspension points.
    execution_latency: Mutex<Duration>,
    prepare_has_side_effects: AtomicBool,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a successful result for `sql` on either execution path.
    pub fn script_result(&self, sql: &str, result: NativeResult) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(sql.trim().to_string())
            .or_default()
            .result = Some(result);
    }

    /// Scripts a prepare-time failure for `sql`.
    pub fn script_prepare_error(&self, sql: &str, message: &str) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(sql.trim().to_string())
            .or_default()
            .prepare_error = Some(EngineError::new(message));
    }

    /// Scripts a prepare-time failure carrying an engine error code, for
    /// engine builds that report codes instead of recognizable messages.
    pub fn script_prepare_error_with_code(&self, sql: &str, message: &str, code: &str) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(sql.trim().to_string())
            .or_default()
            .prepare_error = Some(EngineError::with_code(message, code));
    }

    /// Scripts an execution-time failure for `sql` on either path.
    pub fn script_execute_error(&self, sql: &str, message: &str) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(sql.trim().to_string())
            .or_default()
            .execute_error = Some(EngineError::new(message));
    }

    /// Applies `latency` at the start of every execution call, so tests can
    /// cancel a dispatch while its handle is live.
    pub fn set_execution_latency(&self, latency: Duration) {
        *self.execution_latency.lock().expect("latency lock") = latency;
    }

    /// Marks prepare failures as potentially side-effecting, exercising the
    /// dispatcher's mutation-fallback guard.
    pub fn set_prepare_has_side_effects(&self, value: bool) {
        self.prepare_has_side_effects.store(value, Ordering::SeqCst);
    }

    /// Number of `prepare` calls observed.
    pub fn prepare_calls(&self) -> u64 {
        self.prepare_calls.load(Ordering::SeqCst)
    }

    /// Number of `execute_direct` calls observed.
    pub fn direct_calls(&self) -> u64 {
        self.direct_calls.load(Ordering::SeqCst)
    }

    /// Handles acquired and not yet released.
    pub fn open_handles(&self) -> u64 {
        self.opened_handles.load(Ordering::SeqCst) - self.released_handles.load(Ordering::SeqCst)
    }

    /// Successful executions of `sql` across both paths.
    pub fn executions_of(&self, sql: &str) -> u64 {
        self.executions
            .lock()
            .expect("executions lock")
            .get(sql.trim())
            .copied()
            .unwrap_or(0)
    }

    fn scripted(&self, sql: &str) -> ScriptedStatement {
        self.scripts
            .lock()
            .expect("scripts lock")
            .get(sql.trim())
            .cloned()
            .unwrap_or_default()
    }

    fn record_execution(&self, sql: &str) {
        *self
            .executions
            .lock()
            .expect("executions lock")
            .entry(sql.trim().to_string())
            .or_insert(0) += 1;
    }

    async fn apply_execution_latency(&self) {
        let latency = *self.execution_latency.lock().expect("latency lock");
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn default_result(sql: &str) -> NativeResult {
        if is_mutating_text(sql) {
            NativeResult::mutation(1)
        } else {
            NativeResult::empty()
        }
    }
}

#[async_trait]
impl SqlEngine for MemoryEngine {
    async fn prepare(&self, sql: &str) -> Result<StatementHandle, EngineError> {
        self.prepare_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.scripted(sql);
        if let Some(error) = script.prepare_error {
            return Err(error);
        }
        if rejects_prepare(sql) {
            return Err(EngineError::new(MULTI_STATEMENT_PREPARE_ERROR));
        }
        let id = self.next_handle_id.fetch_add(1, Ordering::SeqCst);
        self.handles
            .lock()
            .expect("handles lock")
            .insert(id, sql.trim().to_string());
        self.opened_handles.fetch_add(1, Ordering::SeqCst);
        Ok(StatementHandle::new(id))
    }

    async fn bind_and_execute(
        &self,
        handle: &StatementHandle,
        params: &[ParamValue],
    ) -> Result<NativeResult, EngineError> {
        self.apply_execution_latency().await;
        let sql = self
            .handles
            .lock()
            .expect("handles lock")
            .get(&handle.id())
            .cloned()
            .ok_or_else(|| EngineError::new("unknown statement handle"))?;
        let script = self.scripted(&sql);
        if let Some(error) = script.execute_error {
            return Err(error);
        }
        let expected = count_placeholders(&sql);
        if expected != params.len() {
            return Err(EngineError::new(format!(
                "Invalid Input Error: expected {expected} prepared statement parameters, but {} were provided",
                params.len()
            )));
        }
        self.record_execution(&sql);
        Ok(script.result.unwrap_or_else(|| Self::default_result(&sql)))
    }

    async fn execute_direct(&self, sql: &str) -> Result<NativeResult, EngineError> {
        self.direct_calls.fetch_add(1, Ordering::SeqCst);
        self.apply_execution_latency().await;
        let script = self.scripted(sql);
        if let Some(error) = script.execute_error {
            return Err(error);
        }
        self.record_execution(sql);
        Ok(script.result.unwrap_or_else(|| Self::default_result(sql)))
    }

    fn release(&self, handle: StatementHandle) {
        if self
            .handles
            .lock()
            .expect("handles lock")
            .remove(&handle.id())
            .is_some()
        {
            self.released_handles.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn prepare_failures_are_side_effect_free(&self) -> bool {
        !self.prepare_has_side_effects.load(Ordering::SeqCst)
    }
}

/// Whether the engine's own front end would refuse to prepare `sql`.
///
/// Mirrors the embedded engine: a second top-level statement, or a construct
/// it expands into an internal statement sequence, cannot share one handle.
fn rejects_prepare(sql: &str) -> bool {
    has_second_statement(sql) || has_keyword(sql, &["PIVOT", "UNPIVOT"])
}

fn is_mutating_text(sql: &str) -> bool {
    matches!(
        leading_word(sql).as_deref(),
        Some("INSERT") | Some("UPDATE") | Some("DELETE")
    )
}

/// Minimal quote- and comment-aware walk shared by the front-end checks
/// below. The engine has its own lexer; this stand-in strips literals, `--`
/// comments, and nested `/* */` comments.
fn code_chars(sql: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push(' ');
                while let Some(inner) = chars.next() {
                    if inner == quote {
                        if chars.peek() == Some(&quote) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        break;
                    }
                }
                out.push(' ');
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut depth = 1usize;
                while depth > 0 {
                    match chars.next() {
                        Some('/') if chars.peek() == Some(&'*') => {
                            chars.next();
                            depth += 1;
                        }
                        Some('*') if chars.peek() == Some(&'/') => {
                            chars.next();
                            depth -= 1;
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

fn has_second_statement(sql: &str) -> bool {
    let mut seen_terminator = false;
    for c in code_chars(sql) {
        if c == ';' {
            seen_terminator = true;
        } else if seen_terminator && !c.is_whitespace() {
            return true;
        }
    }
    false
}

fn has_keyword(sql: &str, keywords: &[&str]) -> bool {
    let mut word = String::new();
    let mut chars = code_chars(sql);
    chars.push(' ');
    for c in chars {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c.to_ascii_uppercase());
        } else if !word.is_empty() {
            if keywords.contains(&word.as_str()) {
                return true;
            }
            word.clear();
        }
    }
    false
}

fn leading_word(sql: &str) -> Option<String> {
    let mut word = String::new();
    for c in code_chars(sql) {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c.to_ascii_uppercase());
        } else if !word.is_empty() {
            break;
        }
    }
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

fn count_placeholders(sql: &str) -> usize {
    code_chars(sql).iter().filter(|c| **c == '?').count()
}
