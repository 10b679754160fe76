// Google Calendar OAuth bridge and the event export endpoint.
//
// The OAuth flow runs in a browser popup, so these routes are keyed by a
// `uid` query parameter instead of a bearer header: the consent redirect and
// callback cannot carry Authorization headers. The state token ties the
// callback back to the user.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{Html, Json, Redirect},
    routing::{get, post},
    Router,
};
use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::google_calendar::{self, GoogleTokenResponse};
use crate::models::event::Event;
use crate::models::google::{ExportReport, ExportRequest, ExportedEvent, GoogleOAuthState, GoogleToken};
use crate::AppState;

pub fn google_routes() -> Router {
    Router::new()
        .route("/api/auth/google/start", get(start))
        .route("/api/auth/google/callback", get(callback))
        .route("/api/auth/google/status", get(status))
        .route("/api/auth/google/logout", post(logout))
        .route("/api/export/google", post(export))
}

#[derive(Debug, Deserialize)]
struct UidQuery {
    uid: i32,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
}

async fn start(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Redirect, (StatusCode, Json<Value>)> {
    let (client_id, _) = google_credentials(&state)?;
    let redirect_uri = state.google_redirect_uri.as_deref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Google OAuth is not configured"})),
        )
    })?;

    let oauth_state: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();

    sqlx::query("INSERT INTO google_oauth_states (state, user_id) VALUES ($1, $2)")
        .bind(&oauth_state)
        .bind(query.uid)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist OAuth state: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to start Google authorization"})),
            )
        })?;

    let url = google_calendar::build_oauth_url(
        client_id,
        redirect_uri,
        &state.google_calendar_scope,
        &oauth_state,
    );

    Ok(Redirect::temporary(&url))
}

async fn callback(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Html<String>, (StatusCode, Html<String>)> {
    // Consent denied: Google redirects back without a code
    let code = query.code.ok_or((
        StatusCode::BAD_REQUEST,
        Html("<h1>Authorization failed</h1><p>No authorization code received.</p>".to_string()),
    ))?;
    let oauth_state = query.state.ok_or((
        StatusCode::BAD_REQUEST,
        Html("<h1>Authorization failed</h1><p>Missing state parameter.</p>".to_string()),
    ))?;

    let state_row = sqlx::query_as::<_, GoogleOAuthState>(
        "SELECT * FROM google_oauth_states WHERE state = $1",
    )
    .bind(&oauth_state)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to look up OAuth state: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Authorization failed</h1><p>Internal error.</p>".to_string()),
        )
    })?;

    let state_row = match state_row {
        Some(row) => row,
        None => {
            // Diagnostic page: the popup may have been reloaded or the state expired
            return Ok(Html(
                "<h1>Session not found</h1>\
                 <p>This authorization link is no longer valid. Close this window \
                 and start the Google Calendar connection again.</p>"
                    .to_string(),
            ));
        }
    };

    let (client_id, client_secret) = google_credentials(&state).map_err(|_| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Html("<h1>Google OAuth is not configured</h1>".to_string()),
        )
    })?;
    let redirect_uri = state.google_redirect_uri.as_deref().unwrap_or_default();

    let token_response: GoogleTokenResponse = google_calendar::exchange_code_for_token(
        &reqwest::Client::new(),
        &code,
        client_id,
        client_secret,
        redirect_uri,
    )
    .await
    .map_err(|e| {
        tracing::error!("Token exchange failed: {}", e);
        (
            StatusCode::BAD_GATEWAY,
            Html(format!("<h1>Authorization failed</h1><p>{}</p>", e)),
        )
    })?;

    let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);

    // A re-consent may omit the refresh token; keep the stored one then
    sqlx::query(
        "INSERT INTO google_tokens (user_id, access_token, refresh_token, expires_at, updated_at)
         VALUES ($1, $2, $3, $4, NOW())
         ON CONFLICT (user_id) DO UPDATE SET
            access_token = EXCLUDED.access_token,
            refresh_token = COALESCE(NULLIF(EXCLUDED.refresh_token, ''), google_tokens.refresh_token),
            expires_at = EXCLUDED.expires_at,
            updated_at = NOW()",
    )
    .bind(state_row.user_id)
    .bind(&token_response.access_token)
    .bind(token_response.refresh_token.as_deref().unwrap_or(""))
    .bind(expires_at)
    .execute(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store Google tokens: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html("<h1>Authorization failed</h1><p>Could not store tokens.</p>".to_string()),
        )
    })?;

    // State tokens are single-use
    let _ = sqlx::query("DELETE FROM google_oauth_states WHERE state = $1")
        .bind(&oauth_state)
        .execute(&state.db_pool)
        .await;

    Ok(Html(
        "<html><body>\
         <h1>Google Calendar connected</h1>\
         <p>You can close this window.</p>\
         <script>\
           if (window.opener) { window.opener.postMessage('google-calendar-connected', '*'); }\
           window.close();\
         </script>\
         </body></html>"
            .to_string(),
    ))
}

async fn status(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Json<Value>, StatusCode> {
    let token = sqlx::query_as::<_, GoogleToken>(
        "SELECT * FROM google_tokens WHERE user_id = $1",
    )
    .bind(query.uid)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to check Google token: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "connected": token.is_some() })))
}

async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<UidQuery>,
) -> Result<Json<Value>, StatusCode> {
    sqlx::query("DELETE FROM google_tokens WHERE user_id = $1")
        .bind(query.uid)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete Google token: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(json!({ "success": true })))
}

/// Export every event to the user's primary Google Calendar, one POST per
/// event, sequentially. A stale access token is refreshed once before any
/// Calendar call; partial failures are logged and skipped.
async fn export(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ExportRequest>,
) -> Result<Json<ExportReport>, (StatusCode, Json<Value>)> {
    let token = sqlx::query_as::<_, GoogleToken>(
        "SELECT * FROM google_tokens WHERE user_id = $1",
    )
    .bind(payload.user_id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load Google token: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        )
    })?
    .ok_or((
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Google Calendar is not connected"})),
    ))?;

    let access_token = if token.expires_at <= Utc::now() + Duration::minutes(1) {
        let (client_id, client_secret) = google_credentials(&state)?;

        // Single refresh attempt; on failure no Calendar call is made
        let refreshed = state
            .google_calendar
            .refresh_access_token(&token.refresh_token, client_id, client_secret)
            .await
            .map_err(|e| {
                tracing::error!("Token refresh failed for user {}: {}", payload.user_id, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": format!("Token refresh failed: {}", e)})),
                )
            })?;

        let new_expiry = Utc::now() + Duration::seconds(refreshed.expires_in);
        sqlx::query(
            "UPDATE google_tokens SET access_token = $1, expires_at = $2, updated_at = NOW()
             WHERE user_id = $3",
        )
        .bind(&refreshed.access_token)
        .bind(new_expiry)
        .bind(payload.user_id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to persist refreshed token: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Failed to persist refreshed token"})),
            )
        })?;

        refreshed.access_token
    } else {
        token.access_token
    };

    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE user_id = $1 ORDER BY start_date",
    )
    .bind(payload.user_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load events for export: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "Internal server error"})),
        )
    })?;

    let mut exported = Vec::new();
    let mut failed = 0usize;

    for event in &events {
        match state.google_calendar.insert_event(&access_token, event).await {
            Ok(created) => exported.push(ExportedEvent {
                id: event.id,
                title: event.title.clone(),
                google_event_id: created.id,
            }),
            Err(e) => {
                tracing::warn!("Failed to export event {} ({}): {}", event.id, event.title, e);
                failed += 1;
            }
        }
    }

    tracing::info!(
        "Google export for user {}: {} exported, {} failed",
        payload.user_id,
        exported.len(),
        failed
    );

    Ok(Json(ExportReport {
        success: true,
        exported,
        failed,
    }))
}

fn google_credentials(
    state: &Arc<AppState>,
) -> Result<(&str, &str), (StatusCode, Json<Value>)> {
    match (
        state.google_client_id.as_deref(),
        state.google_client_secret.as_deref(),
    ) {
        (Some(id), Some(secret)) => Ok((id, secret)),
        _ => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "Google OAuth is not configured"})),
        )),
    }
}
