//! Router for the chat API

use std::convert::Infallible;
use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_stream::StreamExt as _;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::public;
use crate::api::public::ApiError;
use crate::api::state::AppState;
use crate::chat::{Chat, ChatMessage, Role};
use crate::ollama::{completion_stream, run_relay};

type SharedState = Arc<RwLock<AppState>>;

/// Get a conversation transcript by id
async fn chat_transcript(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let store = state
        .read()
        .expect("Unable to read shared state")
        .store
        .clone();

    match store.load(&id).await.map_err(ApiError::from_load)? {
        Some(chat) => {
            Ok(axum::Json(public::ChatTranscriptResponse::from(&chat)).into_response())
        }
        None => Ok((StatusCode::NOT_FOUND, format!("Chat {} not found", id)).into_response()),
    }
}

/// Initiate or add to a conversation and stream the model's reply back
/// as a plain text body.
///
/// One request runs as two tasks: this handler returns the streaming
/// response immediately, while a spawned producer drives the upstream
/// read / forward / persist-on-exit loop. They share nothing but the
/// channel.
async fn chat_handler(
    State(state): State<SharedState>,
    axum::Json(payload): axum::Json<public::ChatRequest>,
) -> Result<Response, ApiError> {
    let message = payload.message.unwrap_or_default();
    if message.is_empty() {
        return Err(ApiError::BadRequest("Message is required"));
    }

    let (store, ollama_api_url, ollama_model) = {
        let shared_state = state.read().expect("Unable to read shared state");
        (
            shared_state.store.clone(),
            shared_state.config.ollama_api_url.clone(),
            shared_state.config.ollama_model.clone(),
        )
    };

    // The store must be reachable whether or not a conversation id was
    // supplied; the turn is persisted either way
    store.connect().await.map_err(ApiError::from_load)?;

    // Load the conversation, falling back to a fresh one when no id was
    // given or the id doesn't resolve
    let mut chat = match payload.chat_id.as_deref() {
        Some(id) => store
            .load(id)
            .await
            .map_err(ApiError::from_load)?
            .unwrap_or_else(Chat::new),
        None => Chat::new(),
    };

    // The user message is only durably saved together with the
    // assistant reply; if generation fails before that single save, the
    // turn is lost from storage (kept from the original design)
    chat.push(ChatMessage::new(Role::User, &message));

    let context = chat.context_window();
    let response = completion_stream(&ollama_api_url, &ollama_model, context)
        .await
        .map_err(ApiError::Upstream)?;

    let (tx, rx) = mpsc::unbounded_channel::<Bytes>();
    tokio::spawn(run_relay(response.bytes_stream(), tx, store, chat));

    // Headers go out before any content exists so delivery is truly
    // incremental; the body ends when the producer drops its sender
    let body = Body::from_stream(
        UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>),
    );
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        body,
    )
        .into_response())
}

/// Create the chat router
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/chat-api", post(chat_handler))
        .route("/chat-api/{id}", get(chat_transcript))
}
