//! Runtime configuration for the dispatcher.

use anyhow::{Context, Result};

/// Tunables for one dispatcher instance.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Maximum number of learned statement-shape decisions retained.
    pub classification_cache_capacity: usize,
    /// Permits fallback for mutating statements when the engine guarantees
    /// side-effect-free prepare failures. Disabling forces mutating
    /// statements to surface their original prepare error instead.
    pub allow_mutation_fallback: bool,
    /// Logs statement text at debug level on every dispatch.
    pub log_statements: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            classification_cache_capacity: 1024,
            allow_mutation_fallback: true,
            log_statements: false,
        }
    }
}

impl DispatchConfig {
    /// Loads configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self> {
        let classification_cache_capacity = parse_usize(
            std::env::var("MALLARD_DISPATCH_CACHE_CAPACITY").ok(),
            1024,
        )?
        .max(1);
        let allow_mutation_fallback = parse_bool(
            std::env::var("MALLARD_DISPATCH_ALLOW_MUTATION_FALLBACK").ok(),
            true,
        )?;
        let log_statements =
            parse_bool(std::env::var("MALLARD_DISPATCH_LOG_STATEMENTS").ok(), false)?;

        Ok(Self {
            classification_cache_capacity,
            allow_mutation_fallback,
            log_statements,
        })
    }
}

fn parse_usize(value: Option<String>, default: usize) -> Result<usize> {
    match value {
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid unsigned integer value: {raw}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, default: bool) -> Result<bool> {
    match value {
        Some(raw) => raw
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .with_context(|| format!("invalid boolean value: {raw}")),
        None => Ok(default),
    }
}
