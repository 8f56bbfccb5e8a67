//! Runtime configuration from the environment.
//!
//! CLI flags in `main` override these values; `.env` files are loaded by
//! the binary before this module reads the environment.

use std::env;
use std::time::Duration;

pub const DEFAULT_TTL_MS: u64 = 5000;
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream GTFS-RT feed URL. Optional at startup: its absence fails
    /// each snapshot request rather than the process.
    pub feed_url: Option<String>,
    /// Maximum age at which a cached snapshot is still served.
    pub ttl: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            feed_url: env::var("GTFS_RT_URL").ok().filter(|u| !u.is_empty()),
            ttl: Duration::from_millis(parse_ttl_ms(
                env::var("CACHE_TTL_MS").ok().as_deref(),
            )),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Parses a TTL in milliseconds, falling back to the default when the
/// value is missing, non-numeric, or not strictly positive.
pub fn parse_ttl_ms(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|&v| v > 0)
        .map(|v| v as u64)
        .unwrap_or(DEFAULT_TTL_MS)
}
