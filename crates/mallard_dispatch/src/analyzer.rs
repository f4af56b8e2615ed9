//! Lightweight lexical classification of statement text.
//!
//! The analyzer predicts whether a statement can go through the prepared
//! path without parsing it. The prediction is advisory: the dispatcher always
//! treats engine-reported failures as ground truth, because no lexical rule
//! set is exhaustive against new constructs or vendor-specific rewriting.

use crate::sqlscan;

/// Constructs the embedded engine expands into an internal statement
/// sequence, which the prepared-statement API refuses.
const ENGINE_REWRITTEN_KEYWORDS: &[&str] = &["PIVOT", "UNPIVOT"];

const DDL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP"];

const MUTATING_KEYWORDS: &[&str] = &["INSERT", "UPDATE", "DELETE"];

/// Advisory execution-path prediction for one statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionHint {
    /// No reason to expect the prepared path to refuse this statement.
    LikelyPrepared,
    /// Syntactically certain to require direct execution.
    LikelyDirect,
}

/// Classifies `text` without full parsing.
///
/// `LikelyDirect` is returned for multi-statement batches and for whole-word
/// occurrences of engine-rewritten keywords outside literals and comments;
/// everything else is `LikelyPrepared`.
pub fn analyze(text: &str) -> ExecutionHint {
    if !sqlscan::is_single_statement(text) {
        return ExecutionHint::LikelyDirect;
    }
    if sqlscan::contains_keyword(text, ENGINE_REWRITTEN_KEYWORDS) {
        return ExecutionHint::LikelyDirect;
    }
    ExecutionHint::LikelyPrepared
}

/// Whether the statement's leading keyword is schema-mutating DDL.
pub fn is_ddl(text: &str) -> bool {
    matches!(sqlscan::leading_keyword(text), Some(word) if DDL_KEYWORDS.contains(&word.as_str()))
}

/// Whether the statement's leading keyword is data-mutating DML.
pub fn is_mutating(text: &str) -> bool {
    matches!(sqlscan::leading_keyword(text), Some(word) if MUTATING_KEYWORDS.contains(&word.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_selects_are_likely_prepared() {
        assert_eq!(analyze("SELECT 1"), ExecutionHint::LikelyPrepared);
        assert_eq!(
            analyze("SELECT * FROM sales WHERE league = ?;"),
            ExecutionHint::LikelyPrepared
        );
    }

    #[test]
    fn pivot_and_unpivot_are_likely_direct() {
        assert_eq!(
            analyze("PIVOT (select * from sales) ON league USING sum(amount) GROUP BY category"),
            ExecutionHint::LikelyDirect
        );
        assert_eq!(
            analyze("select * from monthly UNPIVOT (amount FOR month IN (jan, feb))"),
            ExecutionHint::LikelyDirect
        );
    }

    #[test]
    fn statement_batches_are_likely_direct() {
        assert_eq!(
            analyze("CREATE TEMP TABLE t AS SELECT 1; SELECT * FROM t"),
            ExecutionHint::LikelyDirect
        );
    }

    #[test]
    fn literals_and_comments_do_not_trigger_direct() {
        assert_eq!(
            analyze("SELECT 'PIVOT; UNPIVOT' AS label -- PIVOT\n"),
            ExecutionHint::LikelyPrepared
        );
        assert_eq!(
            analyze("SELECT pivoted_total FROM summary"),
            ExecutionHint::LikelyPrepared
        );
    }

    #[test]
    fn leading_keyword_classification() {
        assert!(is_ddl("CREATE TABLE t (a INT)"));
        assert!(is_ddl("  -- rebuild\n  drop table t"));
        assert!(!is_ddl("SELECT 'CREATE' FROM t"));
        assert!(is_mutating("INSERT INTO t VALUES (1)"));
        assert!(is_mutating("update t set a = 1"));
        assert!(!is_mutating("SELECT * FROM updates"));
    }
}
