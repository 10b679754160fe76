// HTTP surface of the response interpreter: one endpoint that interprets a
// raw assistant reply, and the generic bulk-action endpoint the UI calls
// directly.

use axum::{extract::Extension, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::handlers::events::bulk_delete_events;
use crate::interpreter::commands::{apply_create_events, dispatch};
use crate::interpreter::{parse_ai_response, AiResponse, IncomingEvent};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::Claims;
use crate::models::event::BulkDeleteCriteria;
use crate::AppState;

pub fn interpreter_routes() -> Router {
    Router::new()
        .route("/api/process-response", post(process_response))
        .route("/api/apply-events", post(apply_events))
        .layer(axum::middleware::from_fn(auth_middleware))
}

#[derive(Debug, Deserialize)]
struct ProcessResponseRequest {
    #[serde(rename = "aiResponse")]
    ai_response: String,
}

async fn process_response(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ProcessResponseRequest>,
) -> Result<Json<Value>, StatusCode> {
    let user_id = claims.user_id();

    match parse_ai_response(&payload.ai_response) {
        AiResponse::Text(message) => Ok(Json(json!({
            "type": "text",
            "message": message
        }))),

        AiResponse::CreateEvents(events) => {
            match apply_create_events(&state.db_pool, user_id, events).await {
                Ok((events_created, assignments_created)) => Ok(Json(json!({
                    "type": "events_created",
                    "events_created": events_created,
                    "assignments_created": assignments_created
                }))),
                Err(e) => {
                    tracing::error!("Bulk create failed: {}", e);
                    Ok(Json(json!({
                        "type": "error",
                        "message": format!("Could not create the entries: {}", e)
                    })))
                }
            }
        }

        AiResponse::Command { command, params } => {
            // Best-effort: any failure becomes a summary string, never a retry
            let message = match dispatch(&state.db_pool, user_id, command, &params).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!("Command {} failed: {}", command.as_str(), e);
                    format!("Could not run {}: {}", command.as_str(), e)
                }
            };
            Ok(Json(json!({
                "type": "command",
                "command": command.as_str(),
                "message": message
            })))
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApplyEventsRequest {
    action: String,
    events: Option<Vec<IncomingEvent>>,
    criteria: Option<BulkDeleteCriteria>,
}

async fn apply_events(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ApplyEventsRequest>,
) -> Result<Json<Value>, StatusCode> {
    let user_id = claims.user_id();

    match payload.action.as_str() {
        "create" => {
            let events = payload.events.ok_or(StatusCode::BAD_REQUEST)?;
            let (events_created, assignments_created) =
                apply_create_events(&state.db_pool, user_id, events)
                    .await
                    .map_err(|e| {
                        tracing::error!("Bulk create failed: {}", e);
                        StatusCode::INTERNAL_SERVER_ERROR
                    })?;
            Ok(Json(json!({
                "ok": true,
                "events_created": events_created,
                "assignments_created": assignments_created
            })))
        }
        "delete" => {
            let criteria = payload.criteria.ok_or(StatusCode::BAD_REQUEST)?;
            let deleted = bulk_delete_events(&state.db_pool, user_id, &criteria)
                .await
                .map_err(|e| {
                    tracing::error!("Bulk delete failed: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                })?;
            Ok(Json(json!({ "ok": true, "deleted": deleted })))
        }
        _ => Err(StatusCode::BAD_REQUEST),
    }
}
