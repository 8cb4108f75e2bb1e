//! Mapping of gathered data into outbound message items.
//!
//! Output is Telegram HTML. Blocks are separated by blank lines so the
//! chunker can split long responses without severing an entry. The AI
//! narrative is always its own block appended after any list, never
//! interleaved. Genuinely missing optional fields render `N/A`; `0` is
//! reserved for a value the service actually returned.

use crate::config::MAX_HOLDERS_DISPLAYED;
use crate::orchestrator::{
    AnalyticsReport, BalancesReport, ChartReport, HoldersReport, PnlReport, ScoreReport,
    ScreenshotReport, TokenDetail,
};
use crate::services::bubblemaps::{MapMetadata, MapNode};
use crate::services::ServiceError;
use chrono::DateTime;
use html_escape::encode_text;

/// One outbound message to deliver, in order.
#[derive(Debug)]
pub enum OutputItem {
    /// HTML text; chunked at delivery when over the transport limit.
    Text(String),
    /// PNG image with an HTML caption.
    Photo {
        /// Image bytes
        png: Vec<u8>,
        /// Caption under the image
        caption: String,
    },
}

/// Single terminal notice for a hard failure, marked so failures stand
/// out in the transcript.
#[must_use]
pub fn error_notice(err: &ServiceError) -> String {
    if err.is_unavailable() {
        format!("❌ {err}")
    } else {
        "❌ An error occurred while fetching the data. Please try again later.".to_string()
    }
}

/// Currency-like value with a magnitude suffix: `$1.23`, `$45.60K`,
/// `$1.20M`, `$3.40B`.
#[must_use]
pub fn format_usd(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{sign}${:.2}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}${:.2}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}${:.2}K", abs / 1e3)
    } else {
        format!("{sign}${abs:.2}")
    }
}

/// Plain amount with a magnitude suffix, no currency sign.
#[must_use]
pub fn format_amount(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.2}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.2}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.2}K", value / 1e3)
    } else {
        format!("{value:.2}")
    }
}

/// Ratio already expressed in percent, two decimals.
#[must_use]
pub fn format_pct(value: f64) -> String {
    format!("{value:.2}%")
}

fn format_opt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_pct)
}

fn format_opt_score(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |s| format!("{s:.1}"))
}

/// RFC 3339 service timestamps rendered compactly; unparsable input is
/// passed through as-is.
fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn score_emoji(score: Option<f64>) -> &'static str {
    match score {
        Some(s) if s < 50.0 => "🔴",
        Some(s) if s < 70.0 => "🟠",
        _ => "🟢",
    }
}

fn title_line(full_name: &str, symbol: &str) -> String {
    format!(
        "🔵 <b>{} ({})</b>",
        encode_text(full_name),
        encode_text(symbol)
    )
}

/// Holder display label: known name or address, capped at 20 characters.
fn holder_label(node: &MapNode) -> String {
    let name = node.name.as_deref().unwrap_or(&node.address);
    let label: String = name.chars().take(20).collect();
    if name.chars().count() > 20 {
        format!("{label}...")
    } else {
        label
    }
}

/// Enumerated holder list, blank line between entries, extras summarized.
fn holders_block(nodes: &[MapNode], max_display: usize) -> String {
    let mut blocks: Vec<String> = nodes
        .iter()
        .take(max_display)
        .enumerate()
        .map(|(i, node)| {
            format!(
                "<b>{}.</b> {}\n   <b>Percentage:</b> {}\n   <b>Amount:</b> {}\n   <b>Type:</b> {}",
                i + 1,
                encode_text(&holder_label(node)),
                format_pct(node.percentage),
                format_amount(node.amount),
                if node.is_contract { "Contract" } else { "Wallet" }
            )
        })
        .collect();

    if nodes.len() > max_display {
        blocks.push(format!("… and {} more", nodes.len() - max_display));
    }
    blocks.join("\n\n")
}

fn supply_block(metadata: &MapMetadata) -> String {
    let supply = metadata.identified_supply.clone().unwrap_or_default();
    format!(
        "<b>Score:</b> {}/100\n<b>Supply in CEXs:</b> {}\n<b>Supply in Contracts:</b> {}",
        format_opt_score(metadata.decentralisation_score),
        format_opt_pct(supply.percent_in_cexs),
        format_opt_pct(supply.percent_in_contracts),
    )
}

/// `/token` card.
#[must_use]
pub fn assemble_token_detail(report: &TokenDetail) -> Vec<OutputItem> {
    let text = format!(
        "{}\n\n<b>Token Address:</b> <code>{}</code>\n<b>Chain:</b> {}\n<b>Last Updated:</b> {}\n\n\
         <b>View the interactive bubble map:</b>\n{}",
        title_line(&report.map.full_name, &report.map.symbol),
        encode_text(&report.token),
        report.chain.to_uppercase(),
        format_timestamp(&report.map.dt_update),
        report.map_url,
    );
    vec![OutputItem::Text(text)]
}

/// `/score` card.
#[must_use]
pub fn assemble_score(report: &ScoreReport) -> Vec<OutputItem> {
    let text = format!(
        "{} <b>Decentralization Score for {} ({})</b>\n\n{}\n<b>Last Updated:</b> {}\n\n\
         <b>Token Address:</b> <code>{}</code>\n<b>Chain:</b> {}",
        score_emoji(report.metadata.decentralisation_score),
        encode_text(&report.map.full_name),
        encode_text(&report.map.symbol),
        supply_block(&report.metadata),
        report
            .metadata
            .dt_update
            .as_deref()
            .map_or_else(|| "N/A".to_string(), format_timestamp),
        encode_text(&report.token),
        report.chain.to_uppercase(),
    );
    vec![OutputItem::Text(text)]
}

/// `/holders` listing.
#[must_use]
pub fn assemble_holders(report: &HoldersReport, max_display: usize) -> Vec<OutputItem> {
    let text = format!(
        "👥 <b>Top Holders of {} ({})</b>\n\n{}\n\n<b>Total Holders Analyzed:</b> {}",
        encode_text(&report.map.full_name),
        encode_text(&report.map.symbol),
        holders_block(&report.map.nodes, max_display),
        report.map.nodes.len(),
    );
    vec![OutputItem::Text(text)]
}

/// `/map` analytics: optional screenshot first, then the combined card
/// with the AI verdict as its own final block.
#[must_use]
pub fn assemble_analytics(report: &AnalyticsReport) -> Vec<OutputItem> {
    let mut items = Vec::new();

    if let Some(png) = &report.screenshot {
        items.push(OutputItem::Photo {
            png: png.clone(),
            caption: title_line(&report.map.full_name, &report.map.symbol),
        });
    }

    let text = format!(
        "{}\n\n<b>Token Address:</b> <code>{}</code>\n<b>Chain:</b> {}\n<b>Last Updated:</b> {}\n\n\
         {}\n\n{}\n\n<b>Total Holders Analyzed:</b> {}\n\n\
         <b>View the interactive bubble map:</b>\n{}\n\n🤖 <b>AI Verdict</b>\n{}",
        title_line(&report.map.full_name, &report.map.symbol),
        encode_text(&report.token),
        report.chain.to_uppercase(),
        format_timestamp(&report.map.dt_update),
        supply_block(&report.metadata),
        holders_block(&report.map.nodes, MAX_HOLDERS_DISPLAYED),
        report.map.nodes.len(),
        report.map_url,
        encode_text(&report.analysis),
    );
    items.push(OutputItem::Text(text));
    items
}

/// `/screenshot`: the photo is the whole answer.
#[must_use]
pub fn assemble_screenshot(report: &ScreenshotReport) -> Vec<OutputItem> {
    let caption = format!(
        "{}\n<b>Chain:</b> {}\n<b>Decentralization Score:</b> {}/100\n\
         <b>Token Address:</b> <code>{}</code>",
        title_line(&report.map.full_name, &report.map.symbol),
        report.chain.to_uppercase(),
        format_opt_score(report.metadata.decentralisation_score),
        encode_text(&report.token),
    );
    vec![OutputItem::Photo {
        png: report.png.clone(),
        caption,
    }]
}

/// `/chart`: optional line chart, then a trend summary with the AI
/// verdict as its own block.
#[must_use]
pub fn assemble_chart(report: &ChartReport) -> Vec<OutputItem> {
    let mut items = Vec::new();

    if let Some(png) = &report.chart {
        items.push(OutputItem::Photo {
            png: png.clone(),
            caption: format!("📈 <b>Price &amp; Volume</b> - <code>{}</code>", encode_text(&report.token)),
        });
    }

    // Candles arrive oldest first; summarize the latest period.
    let latest = report.candles.last();
    let text = format!(
        "📈 <b>Price &amp; Volume for</b> <code>{}</code>\n\n\
         <b>Periods:</b> {}\n<b>Latest Close:</b> {}\n<b>Latest Volume:</b> {}\n\n\
         🤖 <b>AI Verdict</b>\n{}",
        encode_text(&report.token),
        report.candles.len(),
        latest.map_or_else(|| "N/A".to_string(), |c| format_usd(c.close)),
        latest.map_or_else(|| "N/A".to_string(), |c| format_usd(c.volume_usd)),
        encode_text(&report.analysis),
    );
    items.push(OutputItem::Text(text));
    items
}

/// `/balances`: optional pie chart, then the enumerated positions.
#[must_use]
pub fn assemble_balances(report: &BalancesReport, max_display: usize) -> Vec<OutputItem> {
    let mut items = Vec::new();

    if let Some(png) = &report.chart {
        items.push(OutputItem::Photo {
            png: png.clone(),
            caption: "🥧 <b>Token Balance Distribution</b>".to_string(),
        });
    }

    let total: f64 = report.balances.iter().map(|b| b.value_usd).sum();
    let mut blocks: Vec<String> = report
        .balances
        .iter()
        .take(max_display)
        .enumerate()
        .map(|(i, b)| {
            format!(
                "<b>{}.</b> {}\n   <b>Amount:</b> {}\n   <b>Value:</b> {}",
                i + 1,
                encode_text(&b.symbol),
                format_amount(b.amount),
                format_usd(b.value_usd),
            )
        })
        .collect();
    if report.balances.len() > max_display {
        blocks.push(format!("… and {} more", report.balances.len() - max_display));
    }

    let text = format!(
        "💼 <b>Token Balances for</b> <code>{}</code>\n\n{}\n\n<b>Total Value:</b> {}",
        encode_text(&report.wallet),
        blocks.join("\n\n"),
        format_usd(total),
    );
    items.push(OutputItem::Text(text));
    items
}

/// `/pnl` summary card.
#[must_use]
pub fn assemble_pnl(report: &PnlReport) -> Vec<OutputItem> {
    let trend = if report.pnl.total_usd >= 0.0 { "🟢" } else { "🔴" };
    let text = format!(
        "{trend} <b>PnL for</b> <code>{}</code>\n\n\
         <b>Realized:</b> {}\n<b>Unrealized:</b> {}\n<b>Total:</b> {}\n<b>Trades:</b> {}",
        encode_text(&report.wallet),
        format_usd(report.pnl.realized_usd),
        format_usd(report.pnl.unrealized_usd),
        format_usd(report.pnl.total_usd),
        report.pnl.trade_count,
    );
    vec![OutputItem::Text(text)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::bubblemaps::MapData;

    fn node(i: usize) -> MapNode {
        MapNode {
            address: format!("0xholder{i:038}"),
            name: None,
            amount: 1_500_000.0,
            percentage: 4.5,
            is_contract: i % 2 == 0,
            transaction_count: 10,
            transfer_count: 20,
        }
    }

    fn map_with_nodes(n: usize) -> MapData {
        MapData {
            full_name: "Test Token".to_string(),
            symbol: "TST".to_string(),
            dt_update: "2024-05-01T12:00:00Z".to_string(),
            nodes: (0..n).map(node).collect(),
            status: None,
            message: None,
        }
    }

    #[test]
    fn usd_magnitude_suffixes() {
        assert_eq!(format_usd(12.3), "$12.30");
        assert_eq!(format_usd(45_600.0), "$45.60K");
        assert_eq!(format_usd(1_200_000.0), "$1.20M");
        assert_eq!(format_usd(3_400_000_000.0), "$3.40B");
        assert_eq!(format_usd(-2_500.0), "-$2.50K");
    }

    #[test]
    fn percentages_have_two_decimals() {
        assert_eq!(format_pct(4.5), "4.50%");
        assert_eq!(format_opt_pct(None), "N/A");
    }

    #[test]
    fn missing_optional_fields_render_na_not_zero() {
        let metadata = MapMetadata {
            status: "OK".to_string(),
            decentralisation_score: None,
            identified_supply: None,
            dt_update: None,
            message: None,
        };
        let block = supply_block(&metadata);
        assert!(block.contains("<b>Score:</b> N/A/100"));
        assert!(block.contains("<b>Supply in CEXs:</b> N/A"));
        assert!(!block.contains("0.00%"));
    }

    #[test]
    fn score_thresholds() {
        assert_eq!(score_emoji(Some(82.0)), "🟢");
        assert_eq!(score_emoji(Some(61.0)), "🟠");
        assert_eq!(score_emoji(Some(34.0)), "🔴");
        assert_eq!(score_emoji(None), "🟢");
    }

    // 12 entries with a display cap of 10 enumerate exactly 10 plus a
    // "2 more" summary line.
    #[test]
    fn twelve_holders_capped_at_ten_plus_summary() {
        let report = HoldersReport {
            map: map_with_nodes(12),
        };
        let items = assemble_holders(&report, 10);
        let OutputItem::Text(text) = &items[0] else {
            panic!("expected text output");
        };

        assert!(text.contains("<b>10.</b>"));
        assert!(!text.contains("<b>11.</b>"));
        assert!(text.contains("… and 2 more"));
        assert!(text.contains("<b>Total Holders Analyzed:</b> 12"));
    }

    #[test]
    fn hard_failure_notices_are_marked() {
        let notice = error_notice(&ServiceError::Unavailable(
            "Map not available for this token.".to_string(),
        ));
        assert_eq!(notice, "❌ Map not available for this token.");

        let generic = error_notice(&ServiceError::Network("timeout".to_string()));
        assert!(generic.starts_with('❌'));
        assert!(!generic.contains("timeout"));
    }

    #[test]
    fn long_holder_names_are_truncated() {
        let mut n = node(1);
        n.name = Some("An Extremely Long Exchange Wallet Label".to_string());
        assert_eq!(holder_label(&n), "An Extremely Long Ex...");
    }

    #[test]
    fn analytics_narrative_is_a_separate_trailing_block() {
        let report = AnalyticsReport {
            chain: "bsc".to_string(),
            token: "0xabc".to_string(),
            map: map_with_nodes(3),
            metadata: MapMetadata {
                status: "OK".to_string(),
                decentralisation_score: Some(74.0),
                identified_supply: None,
                dt_update: None,
                message: None,
            },
            analysis: "🟢 Well distributed.".to_string(),
            screenshot: None,
            map_url: "https://app.bubblemaps.io/bsc/token/0xabc".to_string(),
        };
        let items = assemble_analytics(&report);
        assert_eq!(items.len(), 1);
        let OutputItem::Text(text) = &items[0] else {
            panic!("expected text output");
        };
        let verdict_block = text
            .split("\n\n")
            .last()
            .expect("blocks");
        assert!(verdict_block.starts_with("🤖 <b>AI Verdict</b>"));
        assert!(verdict_block.contains("Well distributed."));
    }
}
