//! Progress animation on a placeholder message.
//!
//! Each command invocation sends one placeholder and owns it exclusively
//! until its terminal edit or delete. A background task cycles a small set
//! of status frames at a fixed interval; edit failures never terminate the
//! invocation, and stopping an already-stopped indicator is a no-op.

use crate::config::PROGRESS_INTERVAL_MS;
use crate::transport::{edit_message_safe, Transport};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Animation frames for the data-fetching commands.
pub const FRAMES_FETCH: &[&str] = &["⏳", "⌛️"];
/// Animation frames for the score command.
pub const FRAMES_ANALYZE: &[&str] = &["🔍", "🔎"];
/// Animation frames for the screenshot command.
pub const FRAMES_CAMERA: &[&str] = &["📷", "📸"];
/// Animation frames for the holders command.
pub const FRAMES_HOLDERS: &[&str] = &["👥", "👤"];

/// Handle to one running progress animation.
///
/// Keyed by the placeholder's own message id, not the conversation, so
/// interleaved invocations in the same chat never touch each other's
/// placeholder. The animation is cancelled on drop, which covers every
/// early-return path of the owning handler.
pub struct ProgressIndicator {
    chat_id: ChatId,
    message_id: MessageId,
    cancel: CancellationToken,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl ProgressIndicator {
    /// Send the placeholder message and spawn the animation task.
    ///
    /// # Errors
    ///
    /// Fails only if the placeholder itself cannot be sent; animation
    /// edit failures are swallowed.
    pub async fn start(
        transport: Arc<dyn Transport>,
        chat_id: ChatId,
        phrase: &str,
        frames: &'static [&'static str],
    ) -> Result<Self> {
        let message_id = transport
            .send_message(chat_id, &format!("{phrase}..."), None)
            .await?;

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let phrase = phrase.to_string();

        let task = tokio::spawn(async move {
            let mut frame = 0usize;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    () = tokio::time::sleep(Duration::from_millis(PROGRESS_INTERVAL_MS)) => {
                        let text = format!("{phrase}... {}", frames[frame % frames.len()]);
                        // Abandon an in-flight edit the moment the owner
                        // stops; a late edit must never land after the
                        // terminal action on the placeholder.
                        tokio::select! {
                            () = token.cancelled() => break,
                            _ = edit_message_safe(transport.as_ref(), chat_id, message_id, &text) => {
                                frame += 1;
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            chat_id,
            message_id,
            cancel,
            task: tokio::sync::Mutex::new(Some(task)),
        })
    }

    /// Chat that owns the placeholder.
    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Id of the placeholder message, for the terminal edit or delete.
    #[must_use]
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Stop the animation and wait until the task has quit, so no edit
    /// can land after this returns. Idempotent; must be called before
    /// any terminal action on the placeholder.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
