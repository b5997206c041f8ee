//! Geolocation lookups.
//!
//! Maps an IPv4 source address to a country name through an external JSON
//! lookup service. IPv6 geolocation is permanently unresolved; the pipeline
//! never asks for it. Any lookup failure is fatal to the invocation, so the
//! error variants distinguish transport trouble from a refusing service and
//! from an unusable payload.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::GeolocationConfig;

/// Geolocation lookup failures.
#[derive(Debug, Error)]
pub enum GeolocationError {
    /// The service could not be reached (including timeouts)
    #[error("geolocation service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with a non-success status
    #[error("geolocation service returned status {0}")]
    Status(u16),

    /// The response body did not carry a usable country
    #[error("malformed geolocation response: {0}")]
    Malformed(String),
}

/// Resolves an IPv4 address to a country name.
#[async_trait]
pub trait GeolocationResolver: Send + Sync {
    async fn resolve(&self, address: Ipv4Addr) -> Result<String, GeolocationError>;
}

#[derive(Debug, Deserialize)]
struct CountryPayload {
    #[serde(default)]
    country: String,
}

/// Resolver backed by an HTTP JSON lookup service. The address is appended
/// to the configured URL and the `country` field is read from the body.
pub struct HttpGeolocationResolver {
    client: reqwest::Client,
    api_url: String,
}

impl HttpGeolocationResolver {
    pub fn new(config: &GeolocationConfig) -> Result<Self, GeolocationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl GeolocationResolver for HttpGeolocationResolver {
    async fn resolve(&self, address: Ipv4Addr) -> Result<String, GeolocationError> {
        let url = format!("{}{}", self.api_url, address);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GeolocationError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeolocationError::Status(status.as_u16()));
        }

        let payload: CountryPayload = response
            .json()
            .await
            .map_err(|e| GeolocationError::Malformed(e.to_string()))?;

        if payload.country.is_empty() {
            return Err(GeolocationError::Malformed(
                "response carried no country".to_string(),
            ));
        }

        debug!(address = %address, country = %payload.country, "geolocation resolved");
        Ok(payload.country)
    }
}

/// Caching wrapper around a resolver. Successful lookups are kept for the
/// configured TTL; failures are never cached.
pub struct CachingResolver {
    inner: Arc<dyn GeolocationResolver>,
    cache: Cache<Ipv4Addr, String>,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn GeolocationResolver>, config: &GeolocationConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.cache_size)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds))
            .build();
        Self { inner, cache }
    }
}

#[async_trait]
impl GeolocationResolver for CachingResolver {
    async fn resolve(&self, address: Ipv4Addr) -> Result<String, GeolocationError> {
        if let Some(country) = self.cache.get(&address).await {
            return Ok(country);
        }

        let country = self.inner.resolve(address).await?;
        self.cache.insert(address, country.clone()).await;
        Ok(country)
    }
}
