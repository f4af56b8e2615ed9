//! Stable fingerprints for classification-cache keys.
//!
//! Two spellings of the same statement shape — differing in whitespace,
//! keyword case, or comments — share one fingerprint, so a learned execution
//! path is reused across them. Quoted literals are hashed verbatim: parameter
//! values never reach the fingerprint (they live outside the text), but
//! inline literal case still distinguishes shapes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::sqlscan::{self, Region};

/// 64-bit digest of normalized statement text.
///
/// Cache key only; never a security boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Raw digest value, mostly useful for logging.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Computes the fingerprint of `text`. Pure and total.
pub fn fingerprint(text: &str) -> Fingerprint {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;
    sqlscan::walk(text, |c, region| match region {
        // Comments normalize to a token boundary so commentary does not
        // split otherwise identical shapes.
        Region::LineComment | Region::BlockComment => pending_space = true,
        Region::Code => {
            if c.is_whitespace() {
                pending_space = true;
            } else {
                if pending_space && !normalized.is_empty() {
                    normalized.push(' ');
                }
                pending_space = false;
                normalized.push(c.to_ascii_lowercase());
            }
        }
        Region::SingleQuoted | Region::DoubleQuoted => {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.push(c);
        }
    });

    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    Fingerprint(hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_case_do_not_change_the_fingerprint() {
        let a = fingerprint("SELECT  *\n  FROM sales WHERE league = ?");
        let b = fingerprint("select * from sales where league = ?");
        assert_eq!(a, b);
    }

    #[test]
    fn comments_do_not_change_the_fingerprint() {
        let a = fingerprint("SELECT 1 -- tally\n");
        let b = fingerprint("SELECT /* quick */ 1");
        assert_eq!(a, b);
    }

    #[test]
    fn literal_case_is_preserved() {
        let upper = fingerprint("SELECT * FROM t WHERE tag = 'A'");
        let lower = fingerprint("SELECT * FROM t WHERE tag = 'a'");
        assert_ne!(upper, lower);
    }

    #[test]
    fn different_statements_do_not_collide() {
        let a = fingerprint("SELECT 1");
        let b = fingerprint("SELECT 2");
        assert_ne!(a, b);
    }
}
