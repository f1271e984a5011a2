//! Pokedex CLI - explore PokeAPI from an interactive prompt
//!
//! Browses location areas, lists the pokemon found in them, and lets the user
//! catch and inspect pokemon. API responses are kept in a short-lived in-memory
//! cache so repeated lookups do not hit the network.

use std::io;
use std::process;

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pokedexcli::api::PokeApiClient;
use pokedexcli::cache::Cache;
use pokedexcli::cli::{Cli, StartupConfig};
use pokedexcli::commands::Session;
use pokedexcli::repl;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(2);
        }
    };

    // Logs go to stderr so they never interleave with prompt output
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    tracing::debug!(ttl = ?config.cache_ttl, base_url = %config.base_url, "starting");

    let cache = Cache::new(config.cache_ttl);
    let client = PokeApiClient::new(config.base_url, cache);
    let mut session = Session::new(client);

    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let result = repl::run(&mut session, input, &mut stdout).await;

    session.close().await;
    result?;

    Ok(())
}
