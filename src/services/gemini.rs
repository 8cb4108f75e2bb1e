//! Gemini analysis client.
//!
//! Builds the holder-distribution and price/volume prompts and calls
//! `generateContent`. Analysis is strictly best-effort: any failure
//! degrades to [`ANALYSIS_FALLBACK`] instead of propagating, so a broken
//! AI dependency never costs the user the rest of the response.

use super::{post_json, ServiceError};
use crate::config::GEMINI_MODEL;
use crate::services::bubblemaps::MapNode;
use crate::services::market::Candle;
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client as HttpClient;
use serde_json::json;
use tracing::warn;

/// Fixed fallback shown when the analysis call fails for any reason.
pub const ANALYSIS_FALLBACK: &str =
    "Analysis failed. Unable to provide recommendation due to technical error.";

/// Best-effort commentary over gathered data.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Verdict on a token from its top-holder distribution.
    async fn analyze_holders(&self, token: &str, holders: &[MapNode]) -> String;

    /// Verdict on a token's recent price/volume trend.
    async fn analyze_price_volume(&self, token: &str, candles: &[Candle]) -> String;
}

/// HTTP client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: HttpClient,
    api_key: String,
}

impl GeminiClient {
    /// Build a client with the given API key.
    #[must_use]
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self { http, api_key }
    }

    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{GEMINI_MODEL}:generateContent?key={}",
            self.api_key
        );
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}]
            }]
        });

        let response = post_json(&self.http, &url, &body).await?;
        response["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::Json("no text candidate in response".to_string()))
    }
}

fn holders_prompt(token: &str, holders: &[MapNode]) -> String {
    let holders_info = holders
        .iter()
        .enumerate()
        .map(|(i, h)| {
            format!(
                "Holder {}: {}, Balance: {}, Percentage: {:.2}%",
                i + 1,
                h.address,
                h.amount,
                h.percentage
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Token Address: {token}\n\n\
         Top Holders Information:\n{holders_info}\n\n\
         Based solely on this token address and holder distribution information, \
         provide a concise 2-3 line verdict on whether this appears to be a good \
         token investment. Consider holder concentration, distribution patterns, \
         and potential red flags. Format your response as a direct recommendation. \
         Use a single emoji at the start to indicate the emotion of the response \
         (e.g., \u{1f7e2} for bullish, \u{26a0}\u{fe0f} for caution, \u{1f6d1} for bearish)."
    )
}

fn price_volume_prompt(token: &str, candles: &[Candle]) -> String {
    let history_info = candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let time = DateTime::from_timestamp(c.time, 0)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_else(|| c.time.to_string());
            format!(
                "Period {}: Time: {time}, Close: {}, VolumeUSD: {}",
                i + 1,
                c.close,
                c.volume_usd
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Token Address: {token}\n\n\
         Recent Price and Volume History:\n{history_info}\n\n\
         Based solely on this price and volume history, provide a concise 2-3 line \
         verdict on the token's recent trend and trading activity. Consider price \
         movement, volume spikes, and any notable patterns. Format your response as \
         a direct recommendation. Use a single emoji at the start to indicate the \
         emotion of the response (e.g., \u{1f680} for bullish, \u{26a0}\u{fe0f} for \
         caution, \u{1f6d1} for bearish)."
    )
}

#[async_trait]
impl Analyst for GeminiClient {
    async fn analyze_holders(&self, token: &str, holders: &[MapNode]) -> String {
        if holders.is_empty() {
            return ANALYSIS_FALLBACK.to_string();
        }
        match self.generate(&holders_prompt(token, holders)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Holder analysis failed: {e}");
                ANALYSIS_FALLBACK.to_string()
            }
        }
    }

    async fn analyze_price_volume(&self, token: &str, candles: &[Candle]) -> String {
        if candles.is_empty() {
            return ANALYSIS_FALLBACK.to_string();
        }
        match self.generate(&price_volume_prompt(token, candles)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Price/volume analysis failed: {e}");
                ANALYSIS_FALLBACK.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(address: &str, pct: f64) -> MapNode {
        MapNode {
            address: address.to_string(),
            name: None,
            amount: 1000.0,
            percentage: pct,
            is_contract: false,
            transaction_count: 0,
            transfer_count: 0,
        }
    }

    #[test]
    fn holders_prompt_enumerates_entries() {
        let prompt = holders_prompt("0xdead", &[node("0x1", 40.0), node("0x2", 2.5)]);
        assert!(prompt.contains("Token Address: 0xdead"));
        assert!(prompt.contains("Holder 1: 0x1"));
        assert!(prompt.contains("Percentage: 2.50%"));
        assert!(prompt.contains("direct recommendation"));
    }

    #[test]
    fn price_volume_prompt_formats_timestamps() {
        let candles = vec![Candle {
            time: 1_700_000_000,
            close: 0.5,
            volume_usd: 1234.0,
        }];
        let prompt = price_volume_prompt("0xdead", &candles);
        assert!(prompt.contains("Period 1"));
        assert!(prompt.contains("2023-11-14"));
    }
}
