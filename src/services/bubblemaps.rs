//! Bubblemaps legacy API client.
//!
//! Three read-only GET endpoints keyed by chain + token: availability,
//! metadata and the full holder graph. A `status` other than `"OK"` is a
//! well-formed failure carried in the payload, not an HTTP error.

use super::{get_json, ServiceError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

/// Availability flag for a token's map.
#[derive(Debug, Clone, Deserialize)]
pub struct MapAvailability {
    /// `"OK"` or `"KO"`
    pub status: String,
    /// Whether a map has been computed for this token
    #[serde(default)]
    pub availability: Option<bool>,
    /// Service-provided explanation on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// Identified supply split, percentages of total supply.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentifiedSupply {
    /// Share held on centralized exchanges
    #[serde(default)]
    pub percent_in_cexs: Option<f64>,
    /// Share held in contracts
    #[serde(default)]
    pub percent_in_contracts: Option<f64>,
}

/// Decentralization metadata for a token.
#[derive(Debug, Clone, Deserialize)]
pub struct MapMetadata {
    /// `"OK"` or `"KO"`
    pub status: String,
    /// Score out of 100; absent when not computed
    #[serde(default)]
    pub decentralisation_score: Option<f64>,
    /// Supply split; fields may be individually absent
    #[serde(default)]
    pub identified_supply: Option<IdentifiedSupply>,
    /// Last refresh timestamp (RFC 3339)
    #[serde(default)]
    pub dt_update: Option<String>,
    /// Service-provided explanation on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// One holder node of the bubble map graph.
#[derive(Debug, Clone, Deserialize)]
pub struct MapNode {
    /// Holder address
    pub address: String,
    /// Label when the address is known (exchange, deployer, ...)
    #[serde(default)]
    pub name: Option<String>,
    /// Held amount in token units
    pub amount: f64,
    /// Share of supply, already in percent
    pub percentage: f64,
    /// Whether the holder is a contract
    pub is_contract: bool,
    /// Transactions seen for this node
    #[serde(default)]
    pub transaction_count: u64,
    /// Transfers seen for this node
    #[serde(default)]
    pub transfer_count: u64,
}

/// Full holder graph for a token.
#[derive(Debug, Clone, Deserialize)]
pub struct MapData {
    /// Token full name
    #[serde(default)]
    pub full_name: String,
    /// Token ticker symbol
    #[serde(default)]
    pub symbol: String,
    /// Last refresh timestamp (RFC 3339)
    #[serde(default)]
    pub dt_update: String,
    /// Holder nodes, largest first
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    /// Present (`"KO"`) when the fetch failed service-side
    #[serde(default)]
    pub status: Option<String>,
    /// Service-provided explanation on failure
    #[serde(default)]
    pub message: Option<String>,
}

/// Read-only access to the holder-graph service.
#[async_trait]
pub trait HolderGraph: Send + Sync {
    /// Check whether a map exists for this token.
    async fn availability(&self, chain: &str, token: &str)
        -> Result<MapAvailability, ServiceError>;

    /// Fetch decentralization metadata.
    async fn metadata(&self, chain: &str, token: &str) -> Result<MapMetadata, ServiceError>;

    /// Fetch the full holder graph.
    async fn map_data(&self, chain: &str, token: &str) -> Result<MapData, ServiceError>;
}

/// HTTP client for the Bubblemaps legacy API.
pub struct BubblemapsClient {
    http: HttpClient,
    base_url: String,
}

impl BubblemapsClient {
    /// Build a client against `base_url`.
    #[must_use]
    pub fn new(http: HttpClient, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl HolderGraph for BubblemapsClient {
    async fn availability(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<MapAvailability, ServiceError> {
        let url = format!(
            "{}/map-availability?chain={chain}&token={token}",
            self.base_url
        );
        get_json(&self.http, &url).await
    }

    async fn metadata(&self, chain: &str, token: &str) -> Result<MapMetadata, ServiceError> {
        let url = format!("{}/map-metadata?chain={chain}&token={token}", self.base_url);
        get_json(&self.http, &url).await
    }

    async fn map_data(&self, chain: &str, token: &str) -> Result<MapData, ServiceError> {
        let url = format!("{}/map-data?chain={chain}&token={token}", self.base_url);
        get_json(&self.http, &url).await
    }
}

/// Public URL of the interactive bubble map for a token.
#[must_use]
pub fn map_url(chain: &str, token: &str) -> String {
    format!("https://app.bubblemaps.io/{chain}/token/{token}")
}
