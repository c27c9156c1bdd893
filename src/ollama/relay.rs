//! The stream relay: bridges the model's newline-delimited JSON output
//! to the HTTP response body while accumulating the full reply.
//!
//! The producer side (this module, driven from a spawned task) and the
//! consumer side (the response body) communicate only through an
//! unbounded channel, so reading the next upstream chunk never waits on
//! a slow client.

use std::fmt::Display;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;

use super::core::ChatChunk;
use crate::chat::{Chat, ChatMessage, Role, TranscriptStore};

/// Forwards decoded content from `stream` to `tx` and returns the
/// accumulated reply.
///
/// Each chunk is decoded as text and split on newlines; every non-empty
/// line must parse as a standalone JSON object. Lines that don't parse
/// (partial lines from network chunking, corrupt data) are logged and
/// skipped, never fatal. A failed read from the stream ends the relay
/// with whatever was accumulated so far.
pub async fn relay<S, E>(mut stream: S, tx: &mpsc::UnboundedSender<Bytes>) -> String
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let mut reply = String::new();

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                tracing::error!("Reading from model stream failed: {}", e);
                break;
            }
        };

        let text = String::from_utf8_lossy(&chunk);
        for line in text.split('\n').filter(|l| !l.trim().is_empty()) {
            let parsed: ChatChunk = match serde_json::from_str(line) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("Skipping unparseable stream line: {}", e);
                    continue;
                }
            };

            if let Some(content) = parsed.message.and_then(|m| m.content) {
                if content.is_empty() {
                    continue;
                }
                reply.push_str(&content);
                // The receiver may already be gone if the client
                // disconnected. Keep draining so the transcript still
                // gets persisted.
                let _ = tx.send(Bytes::from(content));
            }
        }
    }

    reply
}

/// Runs the relay to completion, persists the reply, then closes the
/// sink.
///
/// Persistence happens exactly once per relay, on either exit path: a
/// non-empty reply is appended to the conversation as an assistant
/// message and saved together with the pending user message. An empty
/// reply saves nothing. Save failures are logged, not retried. Dropping
/// the sender afterwards signals end-of-stream to the response body
/// regardless of whether the save succeeded.
pub async fn run_relay<S, E>(
    stream: S,
    tx: mpsc::UnboundedSender<Bytes>,
    store: Arc<dyn TranscriptStore>,
    mut chat: Chat,
) where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let reply = relay(stream, &tx).await;

    if !reply.is_empty() {
        let msg = ChatMessage::new(Role::Assistant, &reply);
        if let Err(e) = store.append_and_save(&mut chat, msg).await {
            tracing::error!("Failed to save transcript for chat {}: {}", chat.id, e);
        }
    }

    drop(tx);
}
