//! Market data API client: price/volume history per token, balances and
//! PnL per wallet.

use super::{get_json, ServiceError};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;

/// One price/volume period.
#[derive(Debug, Clone, Deserialize)]
pub struct Candle {
    /// Unix timestamp, seconds
    pub time: i64,
    /// Closing price in USD
    pub close: f64,
    /// Traded volume in USD
    #[serde(rename = "volumeUsd")]
    pub volume_usd: f64,
}

/// One token position held by a wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenBalance {
    /// Ticker symbol
    pub symbol: String,
    /// Held amount in token units
    #[serde(default)]
    pub amount: f64,
    /// Position value in USD
    #[serde(rename = "valueUsd")]
    pub value_usd: f64,
}

/// Profit-and-loss summary for a wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletPnl {
    /// Realized PnL in USD
    #[serde(rename = "realizedUsd")]
    pub realized_usd: f64,
    /// Unrealized PnL in USD
    #[serde(rename = "unrealizedUsd")]
    pub unrealized_usd: f64,
    /// Total PnL in USD
    #[serde(rename = "totalUsd")]
    pub total_usd: f64,
    /// Trades counted into the summary
    #[serde(rename = "tradeCount", default)]
    pub trade_count: u64,
}

/// Read-only access to the market data service.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Recent price/volume history for a token.
    async fn price_history(&self, token: &str) -> Result<Vec<Candle>, ServiceError>;

    /// Current token balances of a wallet.
    async fn wallet_balances(&self, wallet: &str) -> Result<Vec<TokenBalance>, ServiceError>;

    /// PnL summary of a wallet.
    async fn wallet_pnl(&self, wallet: &str) -> Result<WalletPnl, ServiceError>;
}

/// HTTP client for the market data API. The whole API is optional: when
/// no base URL is configured, every call reports unavailable and the
/// wallet/chart commands answer with that explanation.
pub struct MarketClient {
    http: HttpClient,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl MarketClient {
    /// Build a client; `base_url: None` disables the API.
    #[must_use]
    pub fn new(http: HttpClient, base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    fn url(&self, path: &str) -> Result<String, ServiceError> {
        let base = self.base_url.as_deref().ok_or_else(|| {
            ServiceError::Unavailable("Market data service is not configured.".to_string())
        })?;
        let key = self.api_key.as_deref().unwrap_or_default();
        Ok(format!("{base}{path}&api_key={key}"))
    }
}

#[async_trait]
impl MarketData for MarketClient {
    async fn price_history(&self, token: &str) -> Result<Vec<Candle>, ServiceError> {
        let url = self.url(&format!("/price-history?token={token}"))?;
        get_json(&self.http, &url).await
    }

    async fn wallet_balances(&self, wallet: &str) -> Result<Vec<TokenBalance>, ServiceError> {
        let url = self.url(&format!("/wallet-balances?wallet={wallet}"))?;
        get_json(&self.http, &url).await
    }

    async fn wallet_pnl(&self, wallet: &str) -> Result<WalletPnl, ServiceError> {
        let url = self.url(&format!("/wallet-pnl?wallet={wallet}"))?;
        get_json(&self.http, &url).await
    }
}
