//! Configuration and settings management
//!
//! Loads settings from environment variables and defines pipeline constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Gemini API key for token analysis
    pub gemini_api_key: String,

    /// Base URL of the Bubblemaps legacy API
    #[serde(default = "default_bubblemaps_base_url")]
    pub bubblemaps_base_url: String,

    /// Base URL of the market data API (price history, balances, PnL)
    pub market_api_base_url: Option<String>,
    /// API key for the market data API
    pub market_api_key: Option<String>,

    /// Base URL of the screenshot/chart render service.
    /// When absent, every render reports unavailable and commands
    /// degrade to text-only output.
    pub render_service_url: Option<String>,

    /// Public base URL for webhook registration. Long polling is used
    /// when absent.
    pub webhook_base_url: Option<String>,
}

fn default_bubblemaps_base_url() -> String {
    "https://api-legacy.bubblemaps.io".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required credential
    /// is missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Environment::default() auto-converts UPPER_SNAKE_CASE to snake_case;
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

/// Chain assumed by commands that take only a token address.
pub const DEFAULT_CHAIN: &str = "eth";

/// Telegram's hard limit on message text length, in characters.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Interval between placeholder animation edits.
pub const PROGRESS_INTERVAL_MS: u64 = 800;

/// Maximum holder entries enumerated in a single response; the rest are
/// summarized with a remaining count.
pub const MAX_HOLDERS_DISPLAYED: usize = 10;

/// Number of top holders summarized into the analysis prompt.
pub const TOP_HOLDERS_FOR_ANALYSIS: usize = 5;

/// Gemini model used for token analysis
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

/// HTTP client timeout for all remote service calls, in seconds.
/// Remote calls must settle as failures instead of hanging.
pub fn get_http_timeout_secs() -> u64 {
    std::env::var("HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_base_url_points_at_legacy_api() {
        assert_eq!(
            default_bubblemaps_base_url(),
            "https://api-legacy.bubblemaps.io"
        );
    }

    #[test]
    fn http_timeout_falls_back_to_default() {
        std::env::remove_var("HTTP_TIMEOUT_SECS");
        assert_eq!(get_http_timeout_secs(), 30);
    }
}
