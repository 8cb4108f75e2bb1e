//! Bubblemap Telegram bot.
//!
//! A chat-bot front end over the Bubblemaps holder-graph API, a Gemini
//! analysis endpoint, market-data endpoints and a headless render service.
//! Commands fan out to the remote services, progress is animated on a
//! placeholder message, and large results are delivered in bounded chunks.

/// Rendering of gathered data into outbound messages
pub mod assembler;
/// Telegram handlers and dispatch glue
pub mod bot;
/// Message chunking under the transport limit
pub mod chunker;
/// Command routing and argument extraction
pub mod commands;
/// Configuration management
pub mod config;
/// Dependency-ordered remote call sequencing
pub mod orchestrator;
/// Placeholder-message progress animation
pub mod progress;
/// Remote service clients
pub mod services;
/// Outbound transport abstraction
pub mod transport;
