//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and validates them
//! into a `StartupConfig`: the response cache TTL, the API base URL, and the
//! log verbosity.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::api::DEFAULT_BASE_URL;

/// Default lifetime of a cached API response, in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Longest accepted cache TTL, one day
pub const MAX_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache TTL must be at least one second
    #[error("Invalid cache ttl: must be at least 1 second")]
    ZeroCacheTtl,

    /// The cache TTL is longer than a day
    #[error("Invalid cache ttl: {0} seconds is more than the maximum of {MAX_CACHE_TTL_SECS}")]
    CacheTtlTooLarge(u64),

    /// The base URL is not an http(s) URL
    #[error("Invalid base URL: '{0}'. It must start with http:// or https://")]
    InvalidBaseUrl(String),
}

/// Pokedex CLI - explore PokeAPI from an interactive prompt
#[derive(Parser, Debug)]
#[command(name = "pokedexcli")]
#[command(about = "Explore location areas and catch pokemon from an interactive prompt")]
#[command(version)]
pub struct Cli {
    /// Seconds an API response stays cached
    ///
    /// Expired responses are swept on the same period, so a response may be
    /// served for up to twice this long.
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Base URL of the PokeAPI v2 endpoints
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Log cache and network activity to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Entry lifetime and sweep period of the response cache
    pub cache_ttl: Duration,
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Whether debug logging is enabled
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
            verbose: false,
        }
    }
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the TTL is zero or over a day, or the base URL is not http(s)
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_ttl == 0 {
            return Err(CliError::ZeroCacheTtl);
        }
        if cli.cache_ttl > MAX_CACHE_TTL_SECS {
            return Err(CliError::CacheTtlTooLarge(cli.cache_ttl));
        }

        let base_url = cli.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(CliError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(StartupConfig {
            cache_ttl: Duration::from_secs(cli.cache_ttl),
            base_url: base_url.trim_end_matches('/').to_string(),
            verbose: cli.verbose,
        })
    }

    /// The tracing filter used when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "pokedexcli=debug"
        } else {
            "pokedexcli=warn"
        }
    }
}
