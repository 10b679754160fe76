// Course forum: a flat message list plus a WebSocket feed that pushes new
// messages to connected clients. Append-only, cosmetic realtime — not a
// coordination primitive.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension,
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::auth_middleware;
use crate::models::auth::Claims;
use crate::models::forum::{ForumMessage, PostForumMessageRequest};
use crate::AppState;

pub fn forum_routes() -> Router {
    let protected = Router::new()
        .route("/api/forum", get(list_messages).post(post_message))
        .layer(axum::middleware::from_fn(auth_middleware));

    // Browsers cannot attach Authorization headers to WebSocket upgrades
    let live = Router::new().route("/ws/forum", get(forum_ws));

    protected.merge(live)
}

async fn list_messages(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, StatusCode> {
    let messages = sqlx::query_as::<_, ForumMessage>(
        "SELECT * FROM forum_messages ORDER BY created_at DESC LIMIT 50",
    )
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list forum messages: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "messages": messages })))
}

async fn post_message(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PostForumMessageRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.content.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let message = sqlx::query_as::<_, ForumMessage>(
        "INSERT INTO forum_messages (id, user_id, username, content)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(claims.user_id())
    .bind(&claims.username)
    .bind(&payload.content)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to post forum message: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    // Fan out to live subscribers; no subscribers is fine
    let _ = state.forum_tx.send(message.clone());

    Ok(Json(json!({ "success": true, "message": message })))
}

async fn forum_ws(
    ws: WebSocketUpgrade,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| forum_feed(socket, state))
}

async fn forum_feed(stream: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = stream.split();
    let mut feed = state.forum_tx.subscribe();

    tracing::debug!("Forum feed subscriber connected");

    loop {
        tokio::select! {
            broadcast = feed.recv() => {
                match broadcast {
                    Ok(message) => {
                        let payload = match serde_json::to_string(&message) {
                            Ok(payload) => payload,
                            Err(e) => {
                                tracing::error!("Failed to serialize forum message: {}", e);
                                continue;
                            }
                        };
                        if sender.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    // Slow subscriber dropped messages; skip ahead
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Forum feed subscriber lagged by {} messages", n);
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // The feed is one-way; ignore anything the client sends
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    tracing::debug!("Forum feed subscriber disconnected");
}
