// src/handlers/chat.rs
//
// The chat endpoint assembles one large prompt — instruction block, the
// user's full event history, semester metadata, the course catalog, recent
// conversation turns, today's date — and forwards it to the completion API
// in a single attempt. Both the user message and the raw reply land in the
// message log; the reply is returned to the caller unmodified.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::catalog::{self, Semester};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::{Claims, ErrorResponse};
use crate::models::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::models::course::Course;
use crate::models::event::Event;
use crate::openai_client::OpenAiMessage;
use crate::AppState;

/// Conversation turns included in the prompt.
const HISTORY_WINDOW: i64 = 10;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/history", get(get_chat_history))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims.user_id();

    let openai = state.openai_client.as_ref().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            success: false,
            message: "AI assistant is not configured".to_string(),
        }),
    ))?;

    if payload.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "Message must not be empty".to_string(),
            }),
        ));
    }

    // Context: full event history, static reference data, recent turns.
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE user_id = $1 ORDER BY start_date",
    )
    .bind(user_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(internal_error("Failed to load events for chat context"))?;

    let history = sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM messages WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(HISTORY_WINDOW)
    .fetch_all(&state.db_pool)
    .await
    .map_err(internal_error("Failed to load chat history"))?;

    let semesters = catalog::load_semesters().unwrap_or_else(|e| {
        tracing::warn!("Semester metadata unavailable: {}", e);
        Vec::new()
    });
    let courses = catalog::load_courses().unwrap_or_else(|e| {
        tracing::warn!("Course catalog unavailable: {}", e);
        Vec::new()
    });

    let today = chrono::Utc::now().date_naive();
    let system = build_system_prompt(today, &events, &semesters, &courses);

    let mut messages: Vec<OpenAiMessage> = history
        .iter()
        .rev() // query is newest-first, the API wants oldest-first
        .map(|m| OpenAiMessage {
            role: m.role.clone(),
            content: m.content.clone(),
        })
        .collect();
    messages.push(OpenAiMessage {
        role: "user".to_string(),
        content: payload.message.clone(),
    });

    log_message(&state, user_id, "user", &payload.message).await;

    let reply = match openai.complete(system, messages).await {
        Ok(reply) => reply,
        Err(e) => {
            // Upstream failure is relayed to the caller verbatim
            return Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    success: false,
                    message: e,
                }),
            ));
        }
    };

    log_message(&state, user_id, "assistant", &reply).await;

    Ok(Json(ChatResponse { reply }))
}

async fn get_chat_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, StatusCode> {
    let messages = sqlx::query_as::<_, ChatMessage>(
        "SELECT * FROM messages WHERE user_id = $1 ORDER BY created_at",
    )
    .bind(claims.user_id())
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to load chat history: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "messages": messages })))
}

/// Append one row to the conversation log. Logging failures are reported but
/// never fail the chat call itself.
async fn log_message(state: &Arc<AppState>, user_id: i32, role: &str, content: &str) {
    let result = sqlx::query(
        "INSERT INTO messages (id, user_id, role, content) VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(role)
    .bind(content)
    .execute(&state.db_pool)
    .await;

    if let Err(e) = result {
        tracing::error!("Failed to log {} message: {}", role, e);
    }
}

pub fn build_system_prompt(
    today: NaiveDate,
    events: &[Event],
    semesters: &[Semester],
    courses: &[Course],
) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "You are a study-planning assistant for a university student. You manage \
         their calendar and assignment list.\n",
    );
    prompt.push_str(&format!("Today's date: {}\n\n", today));

    prompt.push_str(
        "Reply in exactly one of three ways:\n\
         1. Plain text, for questions and conversation.\n\
         2. A calendar action, to create entries. Output ONLY raw JSON, no prose, \
         no markdown, no code fences:\n\
         {\"action\":\"create_events\",\"events\":[{\"title\":\"<string>\",\
         \"start\":\"<RFC3339 datetime>\",\"end\":\"<RFC3339 datetime>\",\
         \"all_day\":false,\"description\":\"<optional>\",\"course\":\"<optional course id>\"}]}\n\
         Deadlines get a start time of 23:59 on the due day.\n\
         3. A command, for modifications the user asks for in natural language. \
         Output ONLY raw JSON of one of these shapes:\n\
         {\"command\":\"cancel_last_change\",\"parameters\":{}}\n\
         {\"command\":\"reschedule_meeting\",\"parameters\":{\"title\":\"<substring>\",\
         \"date\":\"<YYYY-MM-DD>\",\"new_date\":\"<YYYY-MM-DD>\"}}\n\
         {\"command\":\"delete_course\",\"parameters\":{\"course\":\"<course name or abbreviation>\"}}\n\
         {\"command\":\"delete_meeting\",\"parameters\":{\"date\":\"<YYYY-MM-DD>\",\
         \"title\":\"<optional substring>\"}}\n\n",
    );

    prompt.push_str("The student's current calendar:\n");
    if events.is_empty() {
        prompt.push_str("(no events)\n");
    }
    for event in events {
        prompt.push_str(&format!(
            "- {} | {} to {}{}\n",
            event.title,
            event.start_date.to_rfc3339(),
            event.end_date.to_rfc3339(),
            if event.all_day { " (all day)" } else { "" }
        ));
    }

    prompt.push_str("\nSemester calendar:\n");
    for semester in semesters {
        prompt.push_str(&format!(
            "- {} ({}): {} to {}\n",
            semester.name, semester.id, semester.start_date, semester.end_date
        ));
    }

    prompt.push_str("\nCourse catalog:\n");
    for course in courses {
        prompt.push_str(&format!(
            "- {} ({}): {} credits lecture, {} credits exercise, semester {}\n",
            course.course,
            course.id,
            course.lecture_credits,
            course.exercise_credits,
            course.semester
        ));
    }

    prompt
}

#[allow(clippy::type_complexity)]
fn internal_error(
    context: &'static str,
) -> impl Fn(sqlx::Error) -> (StatusCode, Json<ErrorResponse>) {
    move |e: sqlx::Error| {
        tracing::error!("{}: {}", context, e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                success: false,
                message: "Internal server error".to_string(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn prompt_embeds_date_events_and_catalog() {
        let events = vec![Event {
            id: Uuid::new_v4(),
            user_id: 1,
            title: "DSP Lecture".to_string(),
            description: None,
            start_date: Utc.with_ymd_and_hms(2026, 3, 3, 8, 15, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 3, 3, 10, 0, 0).unwrap(),
            all_day: false,
            color: "#3788d8".to_string(),
            background_color: None,
            extended_props: None,
            created_at: Utc::now(),
        }];
        let courses = catalog::load_courses().unwrap();
        let semesters = catalog::load_semesters().unwrap();

        let prompt = build_system_prompt(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            &events,
            &semesters,
            &courses,
        );

        assert!(prompt.contains("Today's date: 2026-03-02"));
        assert!(prompt.contains("DSP Lecture"));
        assert!(prompt.contains("Digital Signal Processing"));
        assert!(prompt.contains("Autumn semester 2025"));
        assert!(prompt.contains("cancel_last_change"));
    }

    #[test]
    fn prompt_handles_empty_calendar() {
        let prompt = build_system_prompt(
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            &[],
            &[],
            &[],
        );
        assert!(prompt.contains("(no events)"));
    }
}
