//! Per-command handlers.
//!
//! Every remote-calling command follows the same shape: send the animated
//! placeholder, gather data through the orchestrator, stop the animation,
//! then resolve the placeholder exactly once with either the first result
//! chunk or a single error notice. Malformed arguments are answered
//! directly from the router's usage message and never reach this path.

use crate::assembler::{self, OutputItem};
use crate::chunker::{frame_chunks, split_message};
use crate::commands::{route, Command, Route};
use crate::config::{DEFAULT_CHAIN, MAX_HOLDERS_DISPLAYED, TELEGRAM_MESSAGE_LIMIT};
use crate::orchestrator::{Orchestrator, Outcome};
use crate::progress::{
    ProgressIndicator, FRAMES_ANALYZE, FRAMES_CAMERA, FRAMES_FETCH, FRAMES_HOLDERS,
};
use crate::transport::Transport;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use teloxide::types::{ChatId, ParseMode};
use tracing::info;

const HELP_TEXT: &str = "Here are the available commands:

🔹 Basic Commands:
/start - Welcome message
/help - Show this help message
/echo [text] - Echo back your text
/time - Show current time

🔹 Bubblemaps Commands:
/map [chain] [token] - Full token analytics with AI verdict
Example: /map bsc 0x603c7f932ed1fc6575303d8fb018fdcbb0f39a95
/token [token] - Basic token info and map link
/score [chain] [token] - Get token decentralization score
/screenshot [chain] [token] - Get a screenshot of the bubble map
/holders [chain] [token] - Get top token holders

🔹 Market Commands:
/chart [token] - Price and volume chart with trend analysis
/balances [wallet] - Wallet token balances
/pnl [wallet] - Wallet profit and loss

Available chains: eth, bsc, ftm, avax, cro, arbi, poly, base, sol, sonic";

/// What the dispatcher extracts from one inbound Telegram message.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Chat to answer in
    pub chat_id: ChatId,
    /// Sender's first name, when Telegram provides one
    pub user_name: Option<String>,
    /// Raw message text
    pub text: String,
}

/// Route one inbound message and run its handler to completion.
///
/// # Errors
///
/// Fails only on outbound delivery errors; remote data failures are
/// already folded into the user-facing notice by the orchestrator.
pub async fn handle_message(
    transport: Arc<dyn Transport>,
    orchestrator: Arc<Orchestrator>,
    session: SessionContext,
) -> Result<()> {
    let chat = session.chat_id;
    match route(&session.text) {
        Route::PlainText => {
            let reply = format!(
                "🤖 I received: \"{}\". Type /help for options.",
                session.text.trim()
            );
            transport.send_message(chat, &reply, None).await?;
            Ok(())
        }
        Route::Unknown => {
            transport
                .send_message(chat, "Unknown command. Type /help to see available commands.", None)
                .await?;
            Ok(())
        }
        Route::Invalid { usage } => {
            // Answered locally; no placeholder, no remote calls.
            transport.send_message(chat, &usage, None).await?;
            Ok(())
        }
        Route::Command(command) => {
            info!("Handling {command:?} for chat {chat}");
            run_command(transport, orchestrator, &session, command).await
        }
    }
}

async fn run_command(
    transport: Arc<dyn Transport>,
    orchestrator: Arc<Orchestrator>,
    session: &SessionContext,
    command: Command,
) -> Result<()> {
    let chat = session.chat_id;
    match command {
        Command::Start => {
            let name = session.user_name.as_deref().unwrap_or("there");
            let greeting = format!(
                "👋 Hello {name}! Welcome to the Bubblemaps Telegram Bot.\n\n\
                 Type /help to see available commands."
            );
            transport.send_message(chat, &greeting, None).await?;
            Ok(())
        }
        Command::Help => {
            transport.send_message(chat, HELP_TEXT, None).await?;
            Ok(())
        }
        Command::Time => {
            let now = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
            transport
                .send_message(chat, &format!("⏰ Current time: {now}"), None)
                .await?;
            Ok(())
        }
        Command::Echo { text } => {
            transport.send_message(chat, &text, None).await?;
            Ok(())
        }
        Command::TokenDetail { token } => {
            let phrase = format!("🔍 Fetching token data for {token}");
            let progress =
                ProgressIndicator::start(transport.clone(), chat, &phrase, FRAMES_FETCH).await?;
            let outcome = orchestrator.token_detail(DEFAULT_CHAIN, &token).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_token_detail)
                .await
        }
        Command::Analytics { chain, token } => {
            let phrase = format!("🔍 Fetching map data for {token} on {chain}");
            let progress =
                ProgressIndicator::start(transport.clone(), chat, &phrase, FRAMES_FETCH).await?;
            let outcome = orchestrator.analytics(&chain, &token).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_analytics).await
        }
        Command::Score { chain, token } => {
            let progress =
                ProgressIndicator::start(transport.clone(), chat, "Analyzing token", FRAMES_ANALYZE)
                    .await?;
            let outcome = orchestrator.score(&chain, &token).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_score).await
        }
        Command::Holders { chain, token } => {
            let progress = ProgressIndicator::start(
                transport.clone(),
                chat,
                "🔍 Fetching top holders",
                FRAMES_HOLDERS,
            )
            .await?;
            let outcome = orchestrator.holders(&chain, &token).await;
            deliver(transport.as_ref(), &progress, &outcome, |report| {
                assembler::assemble_holders(report, MAX_HOLDERS_DISPLAYED)
            })
            .await
        }
        Command::Screenshot { chain, token } => {
            let progress = ProgressIndicator::start(
                transport.clone(),
                chat,
                "📸 Generating screenshot",
                FRAMES_CAMERA,
            )
            .await?;
            let outcome = orchestrator.screenshot(&chain, &token).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_screenshot).await
        }
        Command::PriceChart { token } => {
            let phrase = format!("📈 Fetching price history for {token}");
            let progress =
                ProgressIndicator::start(transport.clone(), chat, &phrase, FRAMES_FETCH).await?;
            let outcome = orchestrator.price_chart(&token).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_chart).await
        }
        Command::WalletBalances { wallet } => {
            let phrase = format!("💼 Fetching balances for {wallet}");
            let progress =
                ProgressIndicator::start(transport.clone(), chat, &phrase, FRAMES_FETCH).await?;
            let outcome = orchestrator.wallet_balances(&wallet).await;
            deliver(transport.as_ref(), &progress, &outcome, |report| {
                assembler::assemble_balances(report, MAX_HOLDERS_DISPLAYED)
            })
            .await
        }
        Command::WalletPnl { wallet } => {
            let phrase = format!("📊 Calculating PnL for {wallet}");
            let progress =
                ProgressIndicator::start(transport.clone(), chat, &phrase, FRAMES_ANALYZE).await?;
            let outcome = orchestrator.wallet_pnl(&wallet).await;
            deliver(transport.as_ref(), &progress, &outcome, assembler::assemble_pnl).await
        }
    }
}

/// Resolve the placeholder with the gathered result.
///
/// On failure the placeholder becomes the single error notice. On success
/// the first text chunk replaces the placeholder and the remaining chunks
/// follow as fresh messages; when the first item is a photo the
/// placeholder is deleted instead, because a text message cannot be
/// edited into an image.
async fn deliver<T>(
    transport: &dyn Transport,
    progress: &ProgressIndicator,
    outcome: &Outcome<T>,
    render: impl FnOnce(&T) -> Vec<OutputItem>,
) -> Result<()> {
    progress.stop().await;
    outcome.log_degradation();
    let chat = progress.chat_id();
    let placeholder = progress.message_id();

    let items = match outcome {
        Outcome::Failed(e) => {
            transport
                .edit_message(chat, placeholder, &assembler::error_notice(e), None)
                .await?;
            return Ok(());
        }
        Outcome::Success(payload) | Outcome::Degraded { payload, .. } => render(payload),
    };

    let mut placeholder_live = true;
    for item in items {
        match item {
            OutputItem::Text(text) => {
                for chunk in frame_chunks(split_message(&text, TELEGRAM_MESSAGE_LIMIT)) {
                    if placeholder_live {
                        transport
                            .edit_message(chat, placeholder, &chunk, Some(ParseMode::Html))
                            .await?;
                        placeholder_live = false;
                    } else {
                        transport
                            .send_message(chat, &chunk, Some(ParseMode::Html))
                            .await?;
                    }
                }
            }
            OutputItem::Photo { png, caption } => {
                if placeholder_live {
                    transport.delete_message(chat, placeholder).await?;
                    placeholder_live = false;
                }
                transport.send_photo(chat, png, &caption).await?;
            }
        }
    }
    Ok(())
}
