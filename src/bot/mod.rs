//! Telegram front end: inbound message handling and delivery.

mod handlers;

pub use handlers::{handle_message, SessionContext};
