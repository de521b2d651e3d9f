//! Runtime configuration.
//!
//! Kept deliberately small: the engine has exactly three knobs (where the
//! store lives, the bulk-insert threshold of §4.G, and the per-operation
//! deadline of §5). `from_env` follows the pack's convention of plain
//! `std::env::var` reads into a `serde`-derivable struct rather than pulling
//! in a dedicated config crate for three fields.

use std::time::Duration;

const DEFAULT_BULK_THRESHOLD: usize = 100;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    #[serde(default = "default_bulk_threshold")]
    pub bulk_insert_threshold: usize,
    #[serde(default)]
    pub statement_timeout: Option<Duration>,
}

fn default_bulk_threshold() -> usize {
    DEFAULT_BULK_THRESHOLD
}

impl Config {
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let database_url = std::env::var("METACAT_DATABASE_URL")?;
        let bulk_insert_threshold = std::env::var("METACAT_BULK_THRESHOLD")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_BULK_THRESHOLD);
        let statement_timeout = std::env::var("METACAT_STATEMENT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);
        Ok(Config {
            database_url,
            bulk_insert_threshold,
            statement_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_100() {
        assert_eq!(default_bulk_threshold(), 100);
    }
}
