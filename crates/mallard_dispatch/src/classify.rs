//! Engine-error classification by message signature.
//!
//! Mapping engine diagnostics into the dispatch taxonomy is the one piece of
//! engine-specific knowledge the dispatcher needs. It lives behind a trait so
//! a new engine version's signatures can be swapped in without touching the
//! state machine.

use mallard_engine::EngineError;

use crate::error::ExecutionError;

/// Classifies engine failures per execution stage.
///
/// The prepare stage is the only place `PrepareUnsupported` may come from:
/// by the engine's contract, those failures happen strictly before any part
/// of the statement has executed.
pub trait ErrorSignatures: Send + Sync {
    /// Classifies a failure reported while acquiring a prepared handle.
    fn classify_prepare(&self, error: &EngineError) -> ExecutionError;

    /// Classifies a failure reported during binding or execution.
    fn classify_execution(&self, error: &EngineError) -> ExecutionError;
}

/// Message and error-code signatures of the embedded analytical engine.
///
/// A failure is classified by its attached SQLSTATE-style code when the
/// engine supplies one, with the message patterns as the fallback for engine
/// builds that report text only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyticSignatures;

/// Prepare-stage signatures meaning "this shape cannot use a prepared
/// handle" — the only failures that trigger fallback.
const PREPARE_UNSUPPORTED_SIGNATURES: &[&str] = &[
    "cannot prepare multiple statements at once",
    "cannot be prepared",
    "not supported in prepared statement",
];

const PARSE_SIGNATURES: &[&str] = &["parser error", "syntax error"];

const RESOURCE_SIGNATURES: &[&str] = &[
    "out of memory",
    "memory limit",
    "resource exhausted",
    "too many open",
];

const BINDING_SIGNATURES: &[&str] = &[
    "prepared statement parameter",
    "parameter count mismatch",
    "values were not provided",
    "invalid input error: expected",
];

/// `0A000`: feature_not_supported, the code the engine attaches to
/// prepare-API rejections of rewritten statement shapes.
const PREPARE_UNSUPPORTED_CODES: &[&str] = &["0A000"];

/// `42601`: syntax_error.
const PARSE_CODES: &[&str] = &["42601"];

/// `53xxx`/`54000`: insufficient resources and program limits.
const RESOURCE_CODES: &[&str] = &["53100", "53200", "53400", "54000"];

/// `07001`/`07002`: dynamic-SQL parameter mismatch.
const BINDING_CODES: &[&str] = &["07001", "07002"];

fn matches_any(message: &str, signatures: &[&str]) -> bool {
    signatures
        .iter()
        .any(|signature| message.contains(signature))
}

fn matches_code(error: &EngineError, codes: &[&str]) -> bool {
    error
        .code
        .as_deref()
        .is_some_and(|code| codes.contains(&code))
}

impl ErrorSignatures for AnalyticSignatures {
    fn classify_prepare(&self, error: &EngineError) -> ExecutionError {
        let message = error.message.to_ascii_lowercase();
        if matches_code(error, PREPARE_UNSUPPORTED_CODES)
            || matches_any(&message, PREPARE_UNSUPPORTED_SIGNATURES)
        {
            ExecutionError::PrepareUnsupported(error.message.clone())
        } else if matches_code(error, PARSE_CODES) || matches_any(&message, PARSE_SIGNATURES) {
            ExecutionError::ParseError(error.message.clone())
        } else if matches_code(error, RESOURCE_CODES) || matches_any(&message, RESOURCE_SIGNATURES)
        {
            ExecutionError::ResourceExhausted(error.message.clone())
        } else {
            ExecutionError::RuntimeExecutionError(error.message.clone())
        }
    }

    fn classify_execution(&self, error: &EngineError) -> ExecutionError {
        let message = error.message.to_ascii_lowercase();
        if matches_code(error, BINDING_CODES) || matches_any(&message, BINDING_SIGNATURES) {
            ExecutionError::ParameterBindingError(error.message.clone())
        } else if matches_code(error, PARSE_CODES) || matches_any(&message, PARSE_SIGNATURES) {
            ExecutionError::ParseError(error.message.clone())
        } else if matches_code(error, RESOURCE_CODES) || matches_any(&message, RESOURCE_SIGNATURES)
        {
            ExecutionError::ResourceExhausted(error.message.clone())
        } else {
            ExecutionError::RuntimeExecutionError(error.message.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare(message: &str) -> ExecutionError {
        AnalyticSignatures.classify_prepare(&EngineError::new(message))
    }

    fn execution(message: &str) -> ExecutionError {
        AnalyticSignatures.classify_execution(&EngineError::new(message))
    }

    #[test]
    fn multi_statement_prepare_failures_trigger_fallback() {
        let classified = prepare("Cannot prepare multiple statements at once");
        assert!(classified.is_prepare_unsupported());
    }

    #[test]
    fn prepare_stage_keeps_diagnostics_verbatim() {
        let classified = prepare("Parser Error: syntax error at or near \"FORM\"");
        assert!(matches!(classified, ExecutionError::ParseError(_)));
        assert_eq!(
            classified.engine_message(),
            "Parser Error: syntax error at or near \"FORM\""
        );
    }

    #[test]
    fn catalog_failures_are_runtime_errors_not_fallback() {
        let classified = prepare("Catalog Error: Table with name missing does not exist!");
        assert!(matches!(classified, ExecutionError::RuntimeExecutionError(_)));
    }

    #[test]
    fn binding_signatures_classify_at_execution_stage() {
        let classified = execution(
            "Invalid Input Error: expected 2 prepared statement parameters, but 1 were provided",
        );
        assert!(matches!(classified, ExecutionError::ParameterBindingError(_)));
    }

    #[test]
    fn memory_pressure_is_resource_exhaustion_at_both_stages() {
        assert!(matches!(
            prepare("Out of Memory Error: could not allocate block"),
            ExecutionError::ResourceExhausted(_)
        ));
        assert!(matches!(
            execution("Out of Memory Error: could not allocate block"),
            ExecutionError::ResourceExhausted(_)
        ));
    }

    #[test]
    fn unsupported_signature_never_fires_at_execution_stage() {
        let classified = execution("Cannot prepare multiple statements at once");
        assert!(!classified.is_prepare_unsupported());
    }

    #[test]
    fn error_codes_classify_without_a_message_match() {
        let coded = AnalyticSignatures
            .classify_prepare(&EngineError::with_code("statement shape refused", "0A000"));
        assert!(coded.is_prepare_unsupported());

        let binding = AnalyticSignatures
            .classify_execution(&EngineError::with_code("bad bind list", "07002"));
        assert!(matches!(binding, ExecutionError::ParameterBindingError(_)));

        let resource = AnalyticSignatures
            .classify_prepare(&EngineError::with_code("allocation refused", "53200"));
        assert!(matches!(resource, ExecutionError::ResourceExhausted(_)));
    }

    #[test]
    fn unsupported_code_is_a_runtime_error_at_execution_stage() {
        let classified = AnalyticSignatures
            .classify_execution(&EngineError::with_code("statement shape refused", "0A000"));
        assert!(matches!(classified, ExecutionError::RuntimeExecutionError(_)));
    }

    #[test]
    fn unknown_codes_fall_back_to_message_signatures() {
        let classified = AnalyticSignatures.classify_prepare(&EngineError::with_code(
            "Cannot prepare multiple statements at once",
            "XX000",
        ));
        assert!(classified.is_prepare_unsupported());
    }
}
