//! Quote- and comment-aware lexical scan over SQL text.
//!
//! Everything the dispatcher learns about a statement without parsing it goes
//! through this walker: statement counting, keyword detection, placeholder
//! counting, and literal substitution for the direct path. String literals
//! (with `''` doubling), quoted identifiers, `--` line comments, and nested
//! `/* */` block comments are opaque to all checks.

use mallard_engine::ParamValue;

/// Lexical region a character belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    Code,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Visits every character of `text` together with its lexical region.
///
/// Quote and comment delimiters are visited as part of the region they open.
pub(crate) fn walk(text: &str, mut visit: impl FnMut(char, Region)) {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let quote = c;
                let region = if quote == '\'' {
                    Region::SingleQuoted
                } else {
                    Region::DoubleQuoted
                };
                visit(c, region);
                i += 1;
                while i < chars.len() {
                    let inner = chars[i];
                    visit(inner, region);
                    i += 1;
                    if inner == quote {
                        // A doubled quote is an escaped character, not a close.
                        if i < chars.len() && chars[i] == quote {
                            visit(quote, region);
                            i += 1;
                        } else {
                            break;
                        }
                    }
                }
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    visit(chars[i], Region::LineComment);
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let mut depth = 0usize;
                while i < chars.len() {
                    if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
                        depth += 1;
                        visit('/', Region::BlockComment);
                        visit('*', Region::BlockComment);
                        i += 2;
                    } else if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        depth -= 1;
                        visit('*', Region::BlockComment);
                        visit('/', Region::BlockComment);
                        i += 2;
                        if depth == 0 {
                            break;
                        }
                    } else {
                        visit(chars[i], Region::BlockComment);
                        i += 1;
                    }
                }
            }
            _ => {
                visit(c, Region::Code);
                i += 1;
            }
        }
    }
}

/// Whether `text` holds at most one top-level statement.
///
/// A trailing terminator, or a terminator followed only by whitespace and
/// comments, still counts as a single statement.
pub(crate) fn is_single_statement(text: &str) -> bool {
    let mut seen_terminator = false;
    let mut second_statement = false;
    walk(text, |c, region| match region {
        Region::LineComment | Region::BlockComment => {}
        Region::Code => {
            if c == ';' {
                seen_terminator = true;
            } else if seen_terminator && !c.is_whitespace() {
                second_statement = true;
            }
        }
        Region::SingleQuoted | Region::DoubleQuoted => {
            if seen_terminator {
                second_statement = true;
            }
        }
    });
    !second_statement
}

/// Whether any whole-word token of `text` matches one of `keywords`.
///
/// Keywords must be given uppercased; matching is case-insensitive and never
/// fires inside literals, identifiers, or comments.
pub(crate) fn contains_keyword(text: &str, keywords: &[&str]) -> bool {
    let mut word = String::new();
    let mut found = false;
    walk(text, |c, region| {
        if region == Region::Code && (c.is_ascii_alphanumeric() || c == '_') {
            word.push(c.to_ascii_uppercase());
        } else if !word.is_empty() {
            if keywords.contains(&word.as_str()) {
                found = true;
            }
            word.clear();
        }
    });
    found || keywords.contains(&word.as_str())
}

/// First code token of `text`, uppercased.
pub(crate) fn leading_keyword(text: &str) -> Option<String> {
    let mut word = String::new();
    let mut complete = false;
    walk(text, |c, region| {
        if complete {
            return;
        }
        if region == Region::Code && (c.is_ascii_alphanumeric() || c == '_') {
            word.push(c.to_ascii_uppercase());
        } else if !word.is_empty() {
            complete = true;
        }
    });
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

/// Number of `?` placeholders outside literals and comments.
pub(crate) fn count_placeholders(text: &str) -> usize {
    let mut count = 0;
    walk(text, |c, region| {
        if region == Region::Code && c == '?' {
            count += 1;
        }
    });
    count
}

/// Placeholder/parameter arity mismatch found during substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SubstitutionMismatch {
    pub placeholders: usize,
    pub supplied: usize,
}

/// Replaces each `?` placeholder with the positional parameter's literal form.
///
/// Comments and literals pass through verbatim. An arity mismatch is reported
/// as a value so the direct path can surface it as an execution error.
pub(crate) fn substitute_placeholders(
    text: &str,
    params: &[ParamValue],
) -> Result<String, SubstitutionMismatch> {
    let mut out = String::with_capacity(text.len() + params.len() * 8);
    let mut placeholders = 0usize;
    walk(text, |c, region| {
        if region == Region::Code && c == '?' {
            if let Some(param) = params.get(placeholders) {
                out.push_str(&param.to_sql_literal());
            }
            placeholders += 1;
        } else {
            out.push(c);
        }
    });
    if placeholders != params.len() {
        return Err(SubstitutionMismatch {
            placeholders,
            supplied: params.len(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_statement_allows_trailing_terminator_and_comments() {
        assert!(is_single_statement("SELECT 1"));
        assert!(is_single_statement("SELECT 1;"));
        assert!(is_single_statement("SELECT 1; -- follow-up note; SELECT 2"));
        assert!(is_single_statement("SELECT 1; /* batch; of; notes */"));
    }

    #[test]
    fn second_statement_is_detected_at_top_level_only() {
        assert!(!is_single_statement("SELECT 1; SELECT 2"));
        assert!(!is_single_statement(
            "CREATE TEMP TABLE t AS SELECT 1;\nSELECT * FROM t"
        ));
        assert!(is_single_statement("SELECT 'a; b' FROM t"));
        assert!(is_single_statement("SELECT \"odd;name\" FROM t"));
    }

    #[test]
    fn keyword_detection_requires_whole_code_tokens() {
        assert!(contains_keyword("SELECT * FROM t PIVOT (x)", &["PIVOT"]));
        assert!(contains_keyword("select * from t pivot (x)", &["PIVOT"]));
        assert!(!contains_keyword("SELECT pivoted FROM t", &["PIVOT"]));
        assert!(!contains_keyword("SELECT 'PIVOT' FROM t", &["PIVOT"]));
        assert!(!contains_keyword("SELECT 1 -- PIVOT", &["PIVOT"]));
        assert!(!contains_keyword("SELECT \"PIVOT\" FROM t", &["PIVOT"]));
    }

    #[test]
    fn keyword_at_end_of_text_is_still_a_token() {
        assert!(contains_keyword("SELECT * FROM sales PIVOT", &["PIVOT"]));
    }

    #[test]
    fn leading_keyword_skips_comments_and_whitespace() {
        assert_eq!(
            leading_keyword("  /* hint */ -- note\n  insert into t values (1)").as_deref(),
            Some("INSERT")
        );
        assert_eq!(leading_keyword("SELECT 1").as_deref(), Some("SELECT"));
        assert_eq!(leading_keyword("   "), None);
    }

    #[test]
    fn placeholders_inside_literals_do_not_count() {
        assert_eq!(count_placeholders("SELECT * FROM t WHERE a = ?"), 1);
        assert_eq!(
            count_placeholders("SELECT '?' FROM t WHERE a = ? AND b = ?"),
            2
        );
        assert_eq!(count_placeholders("SELECT 1 /* ? */ -- ?"), 0);
    }

    #[test]
    fn substitution_renders_positional_literals() {
        let substituted = substitute_placeholders(
            "SELECT * FROM t WHERE name = ? AND amount > ?",
            &[
                ParamValue::Text("O'Brien".to_string()),
                ParamValue::Int64(10),
            ],
        )
        .expect("substitute");
        assert_eq!(
            substituted,
            "SELECT * FROM t WHERE name = 'O''Brien' AND amount > 10"
        );
    }

    #[test]
    fn substitution_renders_date_and_decimal_literals() {
        let substituted = substitute_placeholders(
            "SELECT * FROM sales WHERE period >= ? AND amount > ?",
            &[
                ParamValue::Date("2024-01-01".to_string()),
                ParamValue::Decimal("15000000.00".to_string()),
            ],
        )
        .expect("substitute");
        assert_eq!(
            substituted,
            "SELECT * FROM sales WHERE period >= DATE '2024-01-01' AND amount > 15000000.00"
        );
    }

    #[test]
    fn substitution_reports_arity_mismatch() {
        let err = substitute_placeholders("SELECT ? + ?", &[ParamValue::Int64(1)])
            .expect_err("mismatch");
        assert_eq!(err.placeholders, 2);
        assert_eq!(err.supplied, 1);
    }

    #[test]
    fn nested_block_comments_close_with_outermost_delimiter() {
        assert!(is_single_statement("SELECT 1 /* outer /* inner; */ still; */"));
        assert!(!is_single_statement("SELECT 1 /* c */; SELECT 2"));
    }
}
