//! CLI configuration via environment variables
//!
//! Packaging settings live in `farpack-config`; these only shape CLI output.

use std::env;

/// Environment variable holding the log filter
pub const ENV_LOG: &str = "FARPACK_LOG";

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON output (FARPACK_JSON=1)
    pub default_json: bool,
    /// Disable colored output (FARPACK_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Log filter directive (FARPACK_LOG=debug)
    pub log_filter: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            default_json: lookup("FARPACK_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: lookup("FARPACK_NO_COLOR").is_some() || lookup("NO_COLOR").is_some(),
            log_filter: lookup(ENV_LOG).filter(|v| !v.trim().is_empty()),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    !(lower.is_empty() || lower == "0" || lower == "false" || lower == "off")
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
