//! Render service client: bubble-map screenshots and chart images.
//!
//! The pipeline consumes rendering as an opaque collaborator: domain
//! parameters in, PNG bytes or an explicit unavailable signal out. The
//! orchestrator degrades to text-only output when a render fails, except
//! for the screenshot command where the image is the point.

use super::{post_json_bytes, ServiceError};
use crate::services::market::{Candle, TokenBalance};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::json;

/// Asynchronous image generation.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Headless-browser screenshot of the interactive bubble map.
    async fn map_screenshot(&self, chain: &str, token: &str) -> Result<Vec<u8>, ServiceError>;

    /// Price/volume line chart for a candle series.
    async fn line_chart(&self, title: &str, candles: &[Candle]) -> Result<Vec<u8>, ServiceError>;

    /// Balance-distribution pie chart for a wallet.
    async fn pie_chart(&self, balances: &[TokenBalance]) -> Result<Vec<u8>, ServiceError>;
}

/// HTTP client for the render service. When no URL is configured, every
/// render reports unavailable.
pub struct RenderClient {
    http: HttpClient,
    base_url: Option<String>,
}

impl RenderClient {
    /// Build a client; `base_url: None` disables rendering.
    #[must_use]
    pub fn new(http: HttpClient, base_url: Option<String>) -> Self {
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> Result<String, ServiceError> {
        let base = self.base_url.as_deref().ok_or_else(|| {
            ServiceError::Unavailable("Render service is not configured.".to_string())
        })?;
        Ok(format!("{base}{path}"))
    }
}

#[async_trait]
impl Renderer for RenderClient {
    async fn map_screenshot(&self, chain: &str, token: &str) -> Result<Vec<u8>, ServiceError> {
        let url = self.url("/api/screenshot")?;
        post_json_bytes(&self.http, &url, &json!({ "chain": chain, "token": token })).await
    }

    async fn line_chart(&self, title: &str, candles: &[Candle]) -> Result<Vec<u8>, ServiceError> {
        let url = self.url("/api/line-chart")?;
        let series: Vec<_> = candles
            .iter()
            .map(|c| json!({ "time": c.time, "close": c.close, "volumeUsd": c.volume_usd }))
            .collect();
        post_json_bytes(&self.http, &url, &json!({ "title": title, "series": series })).await
    }

    async fn pie_chart(&self, balances: &[TokenBalance]) -> Result<Vec<u8>, ServiceError> {
        let url = self.url("/api/pie-chart")?;
        let slices: Vec<_> = balances
            .iter()
            .map(|b| json!({ "symbol": b.symbol, "valueUsd": b.value_usd }))
            .collect();
        post_json_bytes(&self.http, &url, &json!({ "slices": slices })).await
    }
}
