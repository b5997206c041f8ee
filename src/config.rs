//! Configuration types for the bad-bots classifier.

use serde::{Deserialize, Serialize};

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BadBotsConfig {
    /// Confidence scoring settings
    pub scoring: ScoringConfig,

    /// Geolocation lookup settings
    pub geolocation: GeolocationConfig,

    /// Shared block-list settings
    pub block_list: BlockListConfig,

    /// Crawler signature settings
    pub signatures: SignatureConfig,
}

impl Default for BadBotsConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            geolocation: GeolocationConfig::default(),
            block_list: BlockListConfig::default(),
            signatures: SignatureConfig::default(),
        }
    }
}

/// Confidence scoring settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score at or above which a request is treated as a bot
    pub confidence_threshold: u32,

    /// Countries whose traffic is expected; geolocation outside this list
    /// raises the confidence score
    pub allowed_countries: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 7,
            allowed_countries: vec![
                "Netherlands".to_string(),
                "Belgium".to_string(),
                "Germany".to_string(),
            ],
        }
    }
}

/// Geolocation lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// Lookup endpoint; the IPv4 address is appended verbatim
    pub api_url: String,

    /// Hard bound on a single lookup in seconds
    pub timeout_seconds: u64,

    /// Country cache size
    pub cache_size: u64,

    /// Country cache TTL in seconds
    pub cache_ttl_seconds: u64,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            api_url: "https://extreme-ip-lookup.com/json/".to_string(),
            timeout_seconds: 3,
            cache_size: 10_000,
            cache_ttl_seconds: 3600,
        }
    }
}

/// Shared block-list settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockListConfig {
    /// Store scope identifier for both lists
    pub scope: String,

    /// Name of the IPv4 list
    pub ipv4_set_name: String,

    /// Name of the IPv6 list
    pub ipv6_set_name: String,

    /// Read-merge-write cycles attempted before giving up on a conflicted
    /// update
    pub max_update_attempts: u32,

    /// Base backoff between conflicted attempts in milliseconds; doubles
    /// per attempt
    pub retry_backoff_ms: u64,
}

impl Default for BlockListConfig {
    fn default() -> Self {
        Self {
            scope: "REGIONAL".to_string(),
            ipv4_set_name: "ip_set_bad_bots_ipv4".to_string(),
            ipv6_set_name: "ip_set_bad_bots_ipv6".to_string(),
            max_update_attempts: 5,
            retry_backoff_ms: 50,
        }
    }
}

/// Crawler signature settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Extra signature patterns matched alongside the built-in set
    pub custom_patterns: Vec<String>,
}
