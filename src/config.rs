//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::RefTier;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds, 0 disables the sweep
    pub sweep_interval: u64,
    /// How strongly values are held
    pub value_tier: RefTier,
    /// Whether reads restart an entry's TTL
    pub expire_after_access: bool,
    /// Whether keys are lowercased before use
    pub case_insensitive_keys: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds, 0 = off (default: 1)
    /// - `VALUE_TIER` - `strong`, `weak` or `soft` (default: strong)
    /// - `EXPIRE_AFTER_ACCESS` - Sliding expiration (default: false)
    /// - `CASE_INSENSITIVE_KEYS` - Lowercase keys (default: false)
    ///
    /// Flags accept `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`,
    /// case-insensitively. Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
            value_tier: parse_var("VALUE_TIER").unwrap_or(defaults.value_tier),
            expire_after_access: flag_var("EXPIRE_AFTER_ACCESS")
                .unwrap_or(defaults.expire_after_access),
            case_insensitive_keys: flag_var("CASE_INSENSITIVE_KEYS")
                .unwrap_or(defaults.case_insensitive_keys),
        }
    }

    pub fn default_expire(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// The sweep interval, or `None` when sweeping is disabled.
    pub fn sweep_every(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn flag_var(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_flag(&v))
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            server_port: 3000,
            sweep_interval: 1,
            value_tier: RefTier::Strong,
            expire_after_access: false,
            case_insensitive_keys: false,
        }
    }
}
