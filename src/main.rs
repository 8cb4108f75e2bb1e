use bubblemap_bot::bot::{handle_message, SessionContext};
use bubblemap_bot::config::Settings;
use bubblemap_bot::orchestrator::Orchestrator;
use bubblemap_bot::services::bubblemaps::BubblemapsClient;
use bubblemap_bot::services::gemini::GeminiClient;
use bubblemap_bot::services::market::MarketClient;
use bubblemap_bot::services::render::RenderClient;
use bubblemap_bot::services::create_http_client;
use bubblemap_bot::transport::{TelegramTransport, Transport};
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting credentials from log output
struct RedactionPatterns {
    bot_token_url: Regex,
    bot_token: Regex,
    api_key: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            bot_token_url: Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
            bot_token: Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
            api_key: Regex::new(r"([?&]key=)[A-Za-z0-9_-]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .bot_token_url
            .replace_all(&output, "$1[TELEGRAM_TOKEN]$3")
            .to_string();
        output = self
            .bot_token
            .replace_all(&output, "[TELEGRAM_TOKEN]")
            .to_string();
        output = self
            .api_key
            .replace_all(&output, "$1[API_KEY]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Report the original length to satisfy the contract even if the
        // redacted string length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: (self.make_inner)(),
            patterns: self.patterns.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv().ok();

    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);
    init_logging(patterns);

    info!("Starting Bubblemap Telegram Bot...");

    let settings = init_settings();

    let http = create_http_client();

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(BubblemapsClient::new(
            http.clone(),
            settings.bubblemaps_base_url.clone(),
        )),
        Arc::new(MarketClient::new(
            http.clone(),
            settings.market_api_base_url.clone(),
            settings.market_api_key.clone(),
        )),
        Arc::new(GeminiClient::new(
            http.clone(),
            settings.gemini_api_key.clone(),
        )),
        Arc::new(RenderClient::new(
            http,
            settings.render_service_url.clone(),
        )),
    ));

    if settings.render_service_url.is_none() {
        info!("Render service not configured; image output disabled.");
    }
    if let Some(url) = &settings.webhook_base_url {
        // Webhook registration is not wired up; long polling always runs.
        info!("webhook_base_url is set ({url}) but long polling is used.");
    }

    let bot = Bot::new(settings.telegram_token.clone());
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));

    info!("Bot is running...");

    let handler = Update::filter_message().endpoint(on_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![transport, orchestrator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter {
        make_inner: io::stderr,
        patterns,
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> Arc<Settings> {
    match Settings::new() {
        Ok(s) => {
            info!("Configuration loaded successfully.");
            Arc::new(s)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    }
}

async fn on_message(
    msg: Message,
    transport: Arc<dyn Transport>,
    orchestrator: Arc<Orchestrator>,
) -> Result<(), teloxide::RequestError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let session = SessionContext {
        chat_id: msg.chat.id,
        user_name: msg.from.as_ref().map(|u| u.first_name.clone()),
        text: text.to_string(),
    };
    if let Err(e) = handle_message(transport, orchestrator, session).await {
        error!("Failed to handle message in chat {}: {e:#}", msg.chat.id);
    }
    Ok(())
}
