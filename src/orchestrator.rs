//! Dependency-ordered sequencing of remote calls.
//!
//! Each command's required calls run in a fixed order: availability check,
//! then primary data, then dependent metadata/analysis. A hard failure of
//! a required call aborts the remaining chain; optional visualization
//! steps degrade softly. Independent calls (analysis and render) are
//! issued together and both settle before assembly. No call is retried.

use crate::config::TOP_HOLDERS_FOR_ANALYSIS;
use crate::services::bubblemaps::{map_url, HolderGraph, MapData, MapMetadata};
use crate::services::gemini::Analyst;
use crate::services::market::{Candle, MarketData, TokenBalance, WalletPnl};
use crate::services::render::Renderer;
use crate::services::ServiceError;
use std::sync::Arc;
use tracing::{info, warn};

/// Tagged outcome of one command's data gathering.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Everything required and optional succeeded.
    Success(T),
    /// Required calls succeeded; an optional step failed and the payload
    /// carries reduced content. The reason is logged, never shown.
    Degraded {
        /// Partial payload, still renderable
        payload: T,
        /// What was lost
        reason: String,
    },
    /// A required call failed; the command aborts with one user-facing
    /// error message.
    Failed(ServiceError),
}

/// Data for the token detail card.
#[derive(Debug)]
pub struct TokenDetail {
    /// Chain keyword
    pub chain: String,
    /// Token address
    pub token: String,
    /// Holder graph (name, symbol, update time)
    pub map: MapData,
    /// Interactive map URL
    pub map_url: String,
}

/// Data for the decentralization score card.
#[derive(Debug)]
pub struct ScoreReport {
    /// Chain keyword
    pub chain: String,
    /// Token address
    pub token: String,
    /// Holder graph for name/symbol
    pub map: MapData,
    /// Score and supply split
    pub metadata: MapMetadata,
}

/// Data for the top-holders listing.
#[derive(Debug)]
pub struct HoldersReport {
    /// Holder graph, nodes largest first
    pub map: MapData,
}

/// Data for the full analytics response.
#[derive(Debug)]
pub struct AnalyticsReport {
    /// Chain keyword
    pub chain: String,
    /// Token address
    pub token: String,
    /// Holder graph
    pub map: MapData,
    /// Score and supply split
    pub metadata: MapMetadata,
    /// AI verdict (or the fixed fallback string)
    pub analysis: String,
    /// Bubble map image; absent on soft render failure
    pub screenshot: Option<Vec<u8>>,
    /// Interactive map URL
    pub map_url: String,
}

/// Data for the screenshot command, where the image is required.
#[derive(Debug)]
pub struct ScreenshotReport {
    /// Chain keyword
    pub chain: String,
    /// Token address
    pub token: String,
    /// Rendered bubble map
    pub png: Vec<u8>,
    /// Holder graph for the caption
    pub map: MapData,
    /// Score for the caption
    pub metadata: MapMetadata,
}

/// Data for the price chart response.
#[derive(Debug)]
pub struct ChartReport {
    /// Token address the series describes
    pub token: String,
    /// Price/volume history, oldest first
    pub candles: Vec<Candle>,
    /// AI trend verdict (or the fixed fallback string)
    pub analysis: String,
    /// Line chart image; absent on soft render failure
    pub chart: Option<Vec<u8>>,
}

/// Data for the wallet balances response.
#[derive(Debug)]
pub struct BalancesReport {
    /// Wallet address
    pub wallet: String,
    /// Positions, largest first as returned
    pub balances: Vec<TokenBalance>,
    /// Pie chart image; absent on soft render failure
    pub chart: Option<Vec<u8>>,
}

/// Data for the wallet PnL response.
#[derive(Debug)]
pub struct PnlReport {
    /// Wallet address
    pub wallet: String,
    /// PnL summary
    pub pnl: WalletPnl,
}

/// Issues a command's remote calls against the injected service clients.
pub struct Orchestrator {
    graph: Arc<dyn HolderGraph>,
    market: Arc<dyn MarketData>,
    analyst: Arc<dyn Analyst>,
    renderer: Arc<dyn Renderer>,
}

impl Orchestrator {
    /// Bundle the service clients a command may need.
    #[must_use]
    pub fn new(
        graph: Arc<dyn HolderGraph>,
        market: Arc<dyn MarketData>,
        analyst: Arc<dyn Analyst>,
        renderer: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            graph,
            market,
            analyst,
            renderer,
        }
    }

    /// Availability gate: a `KO` status or `availability: false` aborts
    /// the chain with the service's own explanation.
    async fn require_available(&self, chain: &str, token: &str) -> Result<(), ServiceError> {
        let avail = self.graph.availability(chain, token).await?;
        if avail.status != "OK" || !avail.availability.unwrap_or(false) {
            let mut reason = "Map not available for this token.".to_string();
            if let Some(message) = avail.message {
                reason.push(' ');
                reason.push_str(&message);
            }
            return Err(ServiceError::Unavailable(reason));
        }
        Ok(())
    }

    /// The data endpoint reports its own failures in-band via `message`.
    async fn fetch_map(&self, chain: &str, token: &str) -> Result<MapData, ServiceError> {
        let map = self.graph.map_data(chain, token).await?;
        if let Some(message) = &map.message {
            return Err(ServiceError::Unavailable(message.clone()));
        }
        Ok(map)
    }

    async fn fetch_metadata(&self, chain: &str, token: &str) -> Result<MapMetadata, ServiceError> {
        let metadata = self.graph.metadata(chain, token).await?;
        if metadata.status != "OK" {
            return Err(ServiceError::Unavailable(
                metadata
                    .message
                    .unwrap_or_else(|| "Failed to fetch metadata".to_string()),
            ));
        }
        Ok(metadata)
    }

    /// `/token`: availability, then the holder graph.
    pub async fn token_detail(&self, chain: &str, token: &str) -> Outcome<TokenDetail> {
        self.token_detail_inner(chain, token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn token_detail_inner(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<Outcome<TokenDetail>, ServiceError> {
        self.require_available(chain, token).await?;
        let map = self.fetch_map(chain, token).await?;
        Ok(Outcome::Success(TokenDetail {
            chain: chain.to_string(),
            token: token.to_string(),
            map,
            map_url: map_url(chain, token),
        }))
    }

    /// `/map`: availability, holder graph, metadata; then analysis and
    /// screenshot concurrently. The screenshot is optional.
    pub async fn analytics(&self, chain: &str, token: &str) -> Outcome<AnalyticsReport> {
        self.analytics_inner(chain, token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn analytics_inner(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<Outcome<AnalyticsReport>, ServiceError> {
        self.require_available(chain, token).await?;
        let map = self.fetch_map(chain, token).await?;
        let metadata = self.fetch_metadata(chain, token).await?;

        let top = &map.nodes[..map.nodes.len().min(TOP_HOLDERS_FOR_ANALYSIS)];
        let (analysis, screenshot) = tokio::join!(
            self.analyst.analyze_holders(token, top),
            self.renderer.map_screenshot(chain, token)
        );

        let report = |screenshot| AnalyticsReport {
            chain: chain.to_string(),
            token: token.to_string(),
            map,
            metadata,
            analysis,
            screenshot,
            map_url: map_url(chain, token),
        };

        Ok(match screenshot {
            Ok(png) => Outcome::Success(report(Some(png))),
            Err(e) => Outcome::Degraded {
                payload: report(None),
                reason: format!("bubble map render unavailable: {e}"),
            },
        })
    }

    /// `/score`: metadata first (it carries its own availability
    /// signal), then the holder graph for the name and symbol.
    pub async fn score(&self, chain: &str, token: &str) -> Outcome<ScoreReport> {
        self.score_inner(chain, token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn score_inner(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<Outcome<ScoreReport>, ServiceError> {
        let metadata = self.fetch_metadata(chain, token).await?;
        let map = self.fetch_map(chain, token).await?;
        Ok(Outcome::Success(ScoreReport {
            chain: chain.to_string(),
            token: token.to_string(),
            map,
            metadata,
        }))
    }

    /// `/holders`: availability, then the holder graph.
    pub async fn holders(&self, chain: &str, token: &str) -> Outcome<HoldersReport> {
        self.holders_inner(chain, token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn holders_inner(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<Outcome<HoldersReport>, ServiceError> {
        self.require_available(chain, token).await?;
        let map = self.fetch_map(chain, token).await?;
        Ok(Outcome::Success(HoldersReport { map }))
    }

    /// `/screenshot`: availability, render (required here), then graph
    /// and metadata together for the caption.
    pub async fn screenshot(&self, chain: &str, token: &str) -> Outcome<ScreenshotReport> {
        self.screenshot_inner(chain, token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn screenshot_inner(
        &self,
        chain: &str,
        token: &str,
    ) -> Result<Outcome<ScreenshotReport>, ServiceError> {
        self.require_available(chain, token).await?;
        let png = self.renderer.map_screenshot(chain, token).await?;
        let (map, metadata) = tokio::join!(
            self.fetch_map(chain, token),
            self.fetch_metadata(chain, token)
        );
        Ok(Outcome::Success(ScreenshotReport {
            chain: chain.to_string(),
            token: token.to_string(),
            png,
            map: map?,
            metadata: metadata?,
        }))
    }

    /// `/chart`: price history, then trend analysis and line chart
    /// concurrently. The chart is optional.
    pub async fn price_chart(&self, token: &str) -> Outcome<ChartReport> {
        self.price_chart_inner(token)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn price_chart_inner(
        &self,
        token: &str,
    ) -> Result<Outcome<ChartReport>, ServiceError> {
        let candles = self.market.price_history(token).await?;
        if candles.is_empty() {
            return Err(ServiceError::Unavailable(
                "No price history available for this token.".to_string(),
            ));
        }

        let title = format!("Price & Volume - {token}");
        let (analysis, chart) = tokio::join!(
            self.analyst.analyze_price_volume(token, &candles),
            self.renderer.line_chart(&title, &candles)
        );

        let report = |chart| ChartReport {
            token: token.to_string(),
            candles,
            analysis,
            chart,
        };

        Ok(match chart {
            Ok(png) => Outcome::Success(report(Some(png))),
            Err(e) => Outcome::Degraded {
                payload: report(None),
                reason: format!("line chart render unavailable: {e}"),
            },
        })
    }

    /// `/balances`: balances, then the pie chart (optional).
    pub async fn wallet_balances(&self, wallet: &str) -> Outcome<BalancesReport> {
        self.wallet_balances_inner(wallet)
            .await
            .unwrap_or_else(Outcome::Failed)
    }

    async fn wallet_balances_inner(
        &self,
        wallet: &str,
    ) -> Result<Outcome<BalancesReport>, ServiceError> {
        let balances = self.market.wallet_balances(wallet).await?;
        if balances.is_empty() {
            return Err(ServiceError::Unavailable(
                "No token balances found for this wallet.".to_string(),
            ));
        }

        let chart = self.renderer.pie_chart(&balances).await;
        let report = |chart| BalancesReport {
            wallet: wallet.to_string(),
            balances,
            chart,
        };

        Ok(match chart {
            Ok(png) => Outcome::Success(report(Some(png))),
            Err(e) => Outcome::Degraded {
                payload: report(None),
                reason: format!("pie chart render unavailable: {e}"),
            },
        })
    }

    /// `/pnl`: a single required call.
    pub async fn wallet_pnl(&self, wallet: &str) -> Outcome<PnlReport> {
        match self.market.wallet_pnl(wallet).await {
            Ok(pnl) => {
                info!("PnL gathered for wallet {wallet}");
                Outcome::Success(PnlReport {
                    wallet: wallet.to_string(),
                    pnl,
                })
            }
            Err(e) => Outcome::Failed(e),
        }
    }
}

impl<T> Outcome<T> {
    /// Log a degraded outcome's reason; absence of the image is the only
    /// user-visible effect of an optional render failure.
    pub fn log_degradation(&self) {
        if let Self::Degraded { reason, .. } = self {
            warn!("Continuing with partial result: {reason}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bubblemaps::MapAvailability;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every remote call in issue order.
    #[derive(Default)]
    struct CallLog(Mutex<Vec<&'static str>>);

    impl CallLog {
        fn push(&self, call: &'static str) {
            self.0.lock().expect("lock").push(call);
        }
        fn calls(&self) -> Vec<&'static str> {
            self.0.lock().expect("lock").clone()
        }
    }

    struct StubGraph {
        log: Arc<CallLog>,
        available: bool,
        status: &'static str,
    }

    #[async_trait]
    impl HolderGraph for StubGraph {
        async fn availability(
            &self,
            _chain: &str,
            _token: &str,
        ) -> Result<MapAvailability, ServiceError> {
            self.log.push("availability");
            Ok(MapAvailability {
                status: self.status.to_string(),
                availability: Some(self.available),
                message: None,
            })
        }

        async fn metadata(&self, _chain: &str, _token: &str) -> Result<MapMetadata, ServiceError> {
            self.log.push("metadata");
            Ok(MapMetadata {
                status: "OK".to_string(),
                decentralisation_score: Some(74.0),
                identified_supply: None,
                dt_update: None,
                message: None,
            })
        }

        async fn map_data(&self, _chain: &str, _token: &str) -> Result<MapData, ServiceError> {
            self.log.push("map_data");
            Ok(MapData {
                full_name: "Test Token".to_string(),
                symbol: "TST".to_string(),
                dt_update: "2024-01-01T00:00:00Z".to_string(),
                nodes: Vec::new(),
                status: None,
                message: None,
            })
        }
    }

    struct StubMarket;

    #[async_trait]
    impl MarketData for StubMarket {
        async fn price_history(&self, _token: &str) -> Result<Vec<Candle>, ServiceError> {
            Ok(Vec::new())
        }
        async fn wallet_balances(
            &self,
            _wallet: &str,
        ) -> Result<Vec<TokenBalance>, ServiceError> {
            Ok(Vec::new())
        }
        async fn wallet_pnl(&self, _wallet: &str) -> Result<WalletPnl, ServiceError> {
            Err(ServiceError::Network("down".to_string()))
        }
    }

    struct StubAnalyst;

    #[async_trait]
    impl Analyst for StubAnalyst {
        async fn analyze_holders(
            &self,
            _token: &str,
            _holders: &[crate::services::bubblemaps::MapNode],
        ) -> String {
            "🟢 Looks fine.".to_string()
        }
        async fn analyze_price_volume(&self, _token: &str, _candles: &[Candle]) -> String {
            "🚀 Up only.".to_string()
        }
    }

    struct StubRenderer {
        log: Arc<CallLog>,
        fail: bool,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        async fn map_screenshot(
            &self,
            _chain: &str,
            _token: &str,
        ) -> Result<Vec<u8>, ServiceError> {
            self.log.push("screenshot");
            if self.fail {
                Err(ServiceError::Network("render down".to_string()))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
        async fn line_chart(
            &self,
            _title: &str,
            _candles: &[Candle],
        ) -> Result<Vec<u8>, ServiceError> {
            Err(ServiceError::Unavailable("not configured".to_string()))
        }
        async fn pie_chart(&self, _balances: &[TokenBalance]) -> Result<Vec<u8>, ServiceError> {
            Err(ServiceError::Unavailable("not configured".to_string()))
        }
    }

    fn orchestrator(
        log: &Arc<CallLog>,
        status: &'static str,
        available: bool,
        render_fails: bool,
    ) -> Orchestrator {
        Orchestrator::new(
            Arc::new(StubGraph {
                log: log.clone(),
                available,
                status,
            }),
            Arc::new(StubMarket),
            Arc::new(StubAnalyst),
            Arc::new(StubRenderer {
                log: log.clone(),
                fail: render_fails,
            }),
        )
    }

    #[tokio::test]
    async fn ko_availability_short_circuits_the_chain() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "KO", false, false);

        let outcome = orch.analytics("bsc", "0xabc").await;
        assert!(matches!(outcome, Outcome::Failed(ref e) if e.is_unavailable()));
        // Nothing issued after the failed gate
        assert_eq!(log.calls(), vec!["availability"]);
    }

    #[tokio::test]
    async fn ok_but_unavailable_is_a_hard_failure() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "OK", false, false);

        let Outcome::Failed(e) = orch.token_detail("bsc", "0xabc").await else {
            panic!("expected hard failure");
        };
        assert!(e.to_string().contains("not available"));
        assert_eq!(log.calls(), vec!["availability"]);
    }

    #[tokio::test]
    async fn calls_run_in_dependency_order() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "OK", true, false);

        let outcome = orch.analytics("bsc", "0xabc").await;
        assert!(matches!(outcome, Outcome::Success(_)));

        let calls = log.calls();
        assert_eq!(&calls[..3], &["availability", "map_data", "metadata"]);
        assert!(calls.contains(&"screenshot"));
    }

    #[tokio::test]
    async fn failed_screenshot_degrades_softly() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "OK", true, true);

        let Outcome::Degraded { payload, reason } = orch.analytics("bsc", "0xabc").await else {
            panic!("expected degraded outcome");
        };
        assert!(payload.screenshot.is_none());
        assert_eq!(payload.analysis, "🟢 Looks fine.");
        assert!(reason.contains("render"));
    }

    #[tokio::test]
    async fn empty_price_history_is_unavailable() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "OK", true, false);

        let Outcome::Failed(e) = orch.price_chart("0xabc").await else {
            panic!("expected hard failure");
        };
        assert!(e.is_unavailable());
    }

    #[tokio::test]
    async fn pnl_transport_failure_is_hard() {
        let log = Arc::new(CallLog::default());
        let orch = orchestrator(&log, "OK", true, false);

        assert!(matches!(
            orch.wallet_pnl("0xwallet").await,
            Outcome::Failed(ServiceError::Network(_))
        ));
    }
}
