//! # Runtime Configuration Module
//!
//! Environment variable based tuning for the router's runtime behavior.
//!
//! ## Environment Variables
//!
//! ### `RULEROUTER_SLOW_MATCH_US`
//!
//! Route matches slower than this many microseconds are logged at `warn`
//! ("Slow route matching detected") instead of `info`. Accepts values in:
//! - Decimal: `1000` (1 ms)
//! - Hexadecimal: `0x3e8` (1 ms)
//!
//! Default: `1000`. Unparseable values fall back to the default.
//!
//! ## Usage
//!
//! ```rust
//! use rulerouter::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Slow match threshold: {:?}", config.slow_match_threshold);
//! ```

use std::env;
use std::time::Duration;

/// Default slow-match threshold in microseconds.
pub const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Matches slower than this are logged as slow (default: 1 ms)
    pub slow_match_threshold: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            slow_match_threshold: Duration::from_micros(DEFAULT_SLOW_MATCH_US),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let micros = env::var("RULEROUTER_SLOW_MATCH_US")
            .ok()
            .and_then(|val| parse_number(&val))
            .unwrap_or(DEFAULT_SLOW_MATCH_US);
        RuntimeConfig {
            slow_match_threshold: Duration::from_micros(micros),
        }
    }
}

fn parse_number(val: &str) -> Option<u64> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_decimal_and_hex() {
        assert_eq!(parse_number("1000"), Some(1000));
        assert_eq!(parse_number("0x3e8"), Some(1000));
        assert_eq!(parse_number(" 250 "), Some(250));
        assert_eq!(parse_number("fast"), None);
    }

    #[test]
    fn default_is_one_millisecond() {
        assert_eq!(
            RuntimeConfig::default().slow_match_threshold,
            Duration::from_millis(1)
        );
    }
}
