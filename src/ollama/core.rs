//! Ollama chat API client.

use anyhow::{Error, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::chat::{ChatMessage, Role};

/// Message shape sent to the model: role and content only, timestamps
/// stripped.
#[derive(Serialize, Debug)]
pub(crate) struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role,
            content: &msg.content,
        }
    }
}

/// One newline-delimited JSON object from the streamed response body.
/// Only `message.content` matters here; everything else (`model`,
/// `created_at`, `done`, timing stats) is ignored.
#[derive(Deserialize, Debug)]
pub(crate) struct ChatChunk {
    #[serde(default)]
    pub message: Option<ChunkMessage>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct ChunkMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Sends the context to the Ollama chat endpoint and returns the
/// response, whose body is the raw newline-delimited JSON stream.
///
/// A non-success status is surfaced as an error (with the response body
/// for diagnostics) before any streaming begins. There are no retries;
/// any failure is terminal for the request.
pub async fn completion_stream(
    url: &str,
    model: &str,
    context: &[ChatMessage],
) -> Result<reqwest::Response, Error> {
    let messages: Vec<WireMessage> = context.iter().map(WireMessage::from).collect();
    let payload = json!({
        "model": model,
        "messages": messages,
        "stream": true,
    });

    let response = reqwest::Client::new()
        .post(url)
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("Ollama API error: {} {}", status, body);
    }

    Ok(response)
}
