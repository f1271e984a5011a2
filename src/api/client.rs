//! Cache-backed HTTP client for PokeAPI
//!
//! Every request is keyed by its full URL. The client checks the response cache
//! before going to the network and stores raw response bodies after a
//! successful fetch, so repeated lookups within the cache TTL cost nothing.

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use super::{LocationArea, LocationAreaPage, Pokemon};
use crate::cache::Cache;

/// Base URL for the public PokeAPI
pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Number of location areas shown per page
const PAGE_SIZE: u32 = 20;

/// Errors that can occur when fetching from PokeAPI
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Server answered with a non-success status
    #[error("Response failed with status code {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for PokeAPI that owns the response cache
#[derive(Debug)]
pub struct PokeApiClient {
    client: Client,
    base_url: String,
    cache: Cache,
}

impl PokeApiClient {
    /// Creates a client for `base_url` backed by `cache`
    pub fn new(base_url: impl Into<String>, cache: Cache) -> Self {
        Self::with_client(Client::new(), base_url, cache)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>, cache: Cache) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            cache,
        }
    }

    /// The response cache
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// URL of the first page of the location-area listing
    pub fn first_page_url(&self) -> String {
        format!("{}/location-area/?offset=0&limit={}", self.base_url, PAGE_SIZE)
    }

    /// URL of a single location area
    pub fn location_area_url(&self, name: &str) -> String {
        format!("{}/location-area/{}", self.base_url, name)
    }

    /// URL of a single pokemon
    pub fn pokemon_url(&self, name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, name)
    }

    /// Fetches one page of location areas.
    ///
    /// `url` is either [`first_page_url`](Self::first_page_url) or a `next` /
    /// `previous` link from an earlier page.
    pub async fn location_areas(&self, url: &str) -> Result<LocationAreaPage, ApiError> {
        let body = self.fetch_bytes(url).await?;
        decode(&body)
    }

    /// Fetches the details of a location area by name
    pub async fn location_area(&self, name: &str) -> Result<LocationArea, ApiError> {
        let body = self.fetch_bytes(&self.location_area_url(name)).await?;
        decode(&body)
    }

    /// Fetches a pokemon by name.
    ///
    /// Returns the decoded pokemon together with the raw response body so callers
    /// can keep the original payload.
    pub async fn pokemon(&self, name: &str) -> Result<(Pokemon, Vec<u8>), ApiError> {
        let body = self.fetch_bytes(&self.pokemon_url(name)).await?;
        let pokemon = decode(&body)?;
        Ok((pokemon, body))
    }

    /// Returns the body for `url`, from the cache when present.
    ///
    /// # Behavior
    /// - A cached body is returned as-is, however old it is
    /// - Otherwise the URL is fetched; a non-2xx status is an error and is not cached
    /// - A successful body is added to the cache before it is returned
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        if let Some(body) = self.cache.get(url) {
            debug!(url, "serving response from cache");
            return Ok(body);
        }

        debug!(url, "fetching from network");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            warn!(url, status = status.as_u16(), "request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        self.cache.add(url, body.clone());
        Ok(body)
    }

    /// Stops the cache's reaper and waits for it to exit
    pub async fn close(self) {
        self.cache.close().await;
    }
}

/// Decodes a JSON body into `T`
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_client(base_url: &str) -> PokeApiClient {
        PokeApiClient::new(base_url, Cache::new(Duration::from_secs(60)))
    }

    #[tokio::test]
    async fn test_urls_are_built_from_base() {
        let client = test_client("https://pokeapi.example/api/v2");

        assert_eq!(
            client.first_page_url(),
            "https://pokeapi.example/api/v2/location-area/?offset=0&limit=20"
        );
        assert_eq!(
            client.location_area_url("pastoria-city-area"),
            "https://pokeapi.example/api/v2/location-area/pastoria-city-area"
        );
        assert_eq!(
            client.pokemon_url("pikachu"),
            "https://pokeapi.example/api/v2/pokemon/pikachu"
        );
        client.close().await;
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let client = test_client("https://pokeapi.example/api/v2/");

        assert_eq!(
            client.pokemon_url("eevee"),
            "https://pokeapi.example/api/v2/pokemon/eevee"
        );
        client.close().await;
    }

    #[tokio::test]
    async fn test_cached_body_skips_network() {
        // Nothing listens here; a network attempt would fail
        let client = test_client("http://127.0.0.1:9");
        let url = client.pokemon_url("ditto");
        client.cache().add(
            url,
            br#"{"name": "ditto", "height": 3, "weight": 40, "base_experience": 101}"#.to_vec(),
        );

        let (pokemon, raw) = client.pokemon("ditto").await.expect("served from cache");

        assert_eq!(pokemon.name, "ditto");
        assert_eq!(pokemon.base_experience, Some(101));
        assert!(!raw.is_empty());
        client.close().await;
    }

    #[tokio::test]
    async fn test_cached_garbage_is_a_parse_error() {
        let client = test_client("http://127.0.0.1:9");
        client
            .cache()
            .add(client.location_area_url("nowhere"), b"not json".to_vec());

        let result = client.location_area("nowhere").await;

        assert!(matches!(result, Err(ApiError::ParseError(_))));
        client.close().await;
    }

    #[test]
    fn test_status_error_message() {
        let err = ApiError::Status {
            status: 404,
            body: "Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Response failed with status code 404: Not Found"
        );
    }
}
