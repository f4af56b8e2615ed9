//! Execution dispatcher: the per-statement path decision state machine.
//!
//! `Start → ConsultCache → {AttemptPrepared | AttemptDirect} →
//! {Success | ReclassifyAndRetryDirect | Fail}`. The dispatcher recovers only
//! a prepare-stage "cannot be prepared" rejection, with exactly one direct
//! retry; every other failure surfaces to the caller unchanged. There is no
//! further fallback beneath direct execution.

use std::sync::Arc;

use mallard_engine::{ParamValue, SqlEngine};
use tracing::{debug, warn};

use crate::analyzer::{self, ExecutionHint};
use crate::cache::{ClassificationCache, PlanDecision};
use crate::classify::{AnalyticSignatures, ErrorSignatures};
use crate::config::DispatchConfig;
use crate::error::ExecutionError;
use crate::executor;
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::metrics::{DispatchMetrics, DispatchMetricsSnapshot};
use crate::result::ResultSet;

/// Decides per statement whether the prepared or the direct path runs, and
/// guarantees identical observable results either way.
///
/// One dispatcher is shared by all connections of a session scope; `submit`
/// is safe to call from concurrent tasks. A single statement is dispatched
/// sequentially through the state machine on its calling task, with the
/// classification cache as the only shared state.
pub struct Dispatcher {
    engine: Arc<dyn SqlEngine>,
    signatures: Arc<dyn ErrorSignatures>,
    cache: ClassificationCache,
    metrics: DispatchMetrics,
    config: DispatchConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with the embedded engine's default error
    /// signatures.
    pub fn new(engine: Arc<dyn SqlEngine>, config: DispatchConfig) -> Self {
        Self::with_signatures(engine, Arc::new(AnalyticSignatures), config)
    }

    /// Creates a dispatcher with a replacement signature classifier, for
    /// engine versions whose diagnostics differ.
    pub fn with_signatures(
        engine: Arc<dyn SqlEngine>,
        signatures: Arc<dyn ErrorSignatures>,
        config: DispatchConfig,
    ) -> Self {
        let cache = ClassificationCache::new(config.classification_cache_capacity);
        Self {
            engine,
            signatures,
            cache,
            metrics: DispatchMetrics::default(),
            config,
        }
    }

    /// Sole execution entry point: runs one statement with its parameters
    /// and returns the unified result or the classified error.
    pub async fn submit(
        &self,
        sql: &str,
        params: &[ParamValue],
    ) -> Result<ResultSet, ExecutionError> {
        if self.config.log_statements {
            debug!(statement = sql, "dispatching statement");
        }
        // Conservative invalidation policy: any DDL dispatched here could
        // change which shapes remain preparable.
        if analyzer::is_ddl(sql) {
            self.invalidate_classifications();
        }

        let shape = fingerprint(sql);
        let cached = self.cache.get(&shape);
        if cached.is_some() {
            self.metrics.record_cache_hit();
        } else {
            self.metrics.record_cache_miss();
        }

        let outcome = match cached {
            Some(PlanDecision::Direct) => self.attempt_direct(sql, params, shape, true).await,
            Some(PlanDecision::Prepared) => self.attempt_prepared(sql, params, shape, true).await,
            None => match analyzer::analyze(sql) {
                ExecutionHint::LikelyDirect => self.attempt_direct(sql, params, shape, false).await,
                ExecutionHint::LikelyPrepared => {
                    self.attempt_prepared(sql, params, shape, false).await
                }
            },
        };

        if let Err(error) = &outcome {
            if matches!(error, ExecutionError::ParameterBindingError(_)) {
                self.metrics.record_binding_error();
            }
            self.metrics.record_terminal_failure();
        }
        outcome
    }

    /// Invalidates all learned classifications before any later `submit`
    /// consults the cache. Called by the protocol layer whenever it observes
    /// a schema-mutating statement outside this dispatcher.
    pub fn notify_ddl_observed(&self) {
        self.invalidate_classifications();
    }

    /// Point-in-time dispatch counters.
    pub fn metrics_snapshot(&self) -> DispatchMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Number of statement shapes with a learned decision.
    pub fn classification_count(&self) -> usize {
        self.cache.len()
    }

    fn invalidate_classifications(&self) {
        self.cache.invalidate_all();
        self.metrics.record_cache_invalidation();
        debug!("classification cache invalidated after observed DDL");
    }

    /// Optimistic prepared attempt with at most one direct retry.
    async fn attempt_prepared(
        &self,
        sql: &str,
        params: &[ParamValue],
        shape: Fingerprint,
        known: bool,
    ) -> Result<ResultSet, ExecutionError> {
        self.metrics.record_prepared_attempt();
        let attempt = executor::execute_prepared(
            self.engine.as_ref(),
            self.signatures.as_ref(),
            sql,
            params,
        )
        .await;

        match attempt {
            Ok(result) => {
                self.metrics.record_prepared_success();
                if !known {
                    self.cache.insert(shape, PlanDecision::Prepared);
                }
                Ok(result)
            }
            Err(ExecutionError::PrepareUnsupported(message)) => {
                self.metrics.record_prepare_unsupported();
                // Fallback re-executes from scratch. A prepare rejection is
                // defined to happen before any part of the statement ran,
                // but for mutating statements that definition is only worth
                // what the engine guarantees.
                if analyzer::is_mutating(sql) && !self.mutation_fallback_is_safe() {
                    warn!(
                        "mutating statement rejected by prepare; fallback disabled, surfacing original error"
                    );
                    return Err(ExecutionError::PrepareUnsupported(message));
                }
                self.cache.replace(shape, PlanDecision::Direct);
                debug!(
                    shape = shape.value(),
                    "statement shape not preparable, falling back to direct execution"
                );
                self.metrics.record_fallback_execution();
                self.metrics.record_direct_execution();
                executor::execute_direct(
                    self.engine.as_ref(),
                    self.signatures.as_ref(),
                    sql,
                    params,
                )
                .await
            }
            Err(other) => Err(other),
        }
    }

    /// Terminal direct attempt; records the learned decision on success for
    /// previously unseen shapes.
    async fn attempt_direct(
        &self,
        sql: &str,
        params: &[ParamValue],
        shape: Fingerprint,
        known: bool,
    ) -> Result<ResultSet, ExecutionError> {
        self.metrics.record_direct_execution();
        let outcome = executor::execute_direct(
            self.engine.as_ref(),
            self.signatures.as_ref(),
            sql,
            params,
        )
        .await;
        if outcome.is_ok() && !known {
            self.cache.insert(shape, PlanDecision::Direct);
        }
        outcome
    }

    fn mutation_fallback_is_safe(&self) -> bool {
        self.config.allow_mutation_fallback
            && self.engine.prepare_failures_are_side_effect_free()
    }
}
