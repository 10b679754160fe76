// Calendar event CRUD and the criteria-based bulk delete.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Datelike, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::auth_middleware;
use crate::models::auth::Claims;
use crate::models::event::{BulkDeleteCriteria, CreateEventRequest, Event, UpdateEventRequest};
use crate::AppState;

pub fn event_routes() -> Router {
    Router::new()
        .route("/api/events", get(list_events).post(create_event))
        .route(
            "/api/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn list_events(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, StatusCode> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE user_id = $1 ORDER BY start_date",
    )
    .bind(claims.user_id())
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list events: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "events": events })))
}

async fn get_event(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, StatusCode> {
    let event =
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(claims.user_id())
            .fetch_optional(&state.db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch event {}: {}", id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({ "success": true, "event": event })))
}

async fn create_event(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.title.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if payload.end_date < payload.start_date {
        return Err(StatusCode::BAD_REQUEST);
    }

    let event = sqlx::query_as::<_, Event>(
        "INSERT INTO events
         (id, user_id, title, description, start_date, end_date, all_day, color, background_color, extended_props)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.all_day)
    .bind(payload.color.as_deref().unwrap_or("#3788d8"))
    .bind(&payload.background_color)
    .bind(&payload.extended_props)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create event: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "event": event })))
}

async fn update_event(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<Value>, StatusCode> {
    // COALESCE keeps any field the request leaves out
    let event = sqlx::query_as::<_, Event>(
        "UPDATE events SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            start_date = COALESCE($3, start_date),
            end_date = COALESCE($4, end_date),
            all_day = COALESCE($5, all_day),
            color = COALESCE($6, color),
            background_color = COALESCE($7, background_color),
            extended_props = COALESCE($8, extended_props)
         WHERE id = $9 AND user_id = $10
         RETURNING *",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.all_day)
    .bind(&payload.color)
    .bind(&payload.background_color)
    .bind(&payload.extended_props)
    .bind(id)
    .bind(claims.user_id())
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update event {}: {}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({ "success": true, "event": event })))
}

async fn delete_event(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, StatusCode> {
    let result = sqlx::query("DELETE FROM events WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(claims.user_id())
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete event {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "success": true })))
}

/// Delete events matching compound criteria. Title and date-range criteria
/// are store predicates; weekday filtering has no store predicate, so when
/// `days` is present candidates are selected first, filtered here, and
/// deleted by id list.
pub async fn bulk_delete_events(
    pool: &PgPool,
    user_id: i32,
    criteria: &BulkDeleteCriteria,
) -> Result<u64, sqlx::Error> {
    match &criteria.days {
        None => {
            let result = sqlx::query(
                "DELETE FROM events
                 WHERE user_id = $1
                   AND ($2::timestamptz IS NULL OR start_date >= $2)
                   AND ($3::timestamptz IS NULL OR start_date <= $3)
                   AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')
                   AND ($5::text IS NULL OR lower(title) = lower($5))",
            )
            .bind(user_id)
            .bind(criteria.start)
            .bind(criteria.end)
            .bind(&criteria.title_contains)
            .bind(&criteria.title_exact)
            .execute(pool)
            .await?;
            Ok(result.rows_affected())
        }
        Some(days) => {
            let candidates = sqlx::query_as::<_, Event>(
                "SELECT * FROM events
                 WHERE user_id = $1
                   AND ($2::timestamptz IS NULL OR start_date >= $2)
                   AND ($3::timestamptz IS NULL OR start_date <= $3)
                   AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%')
                   AND ($5::text IS NULL OR lower(title) = lower($5))",
            )
            .bind(user_id)
            .bind(criteria.start)
            .bind(criteria.end)
            .bind(&criteria.title_contains)
            .bind(&criteria.title_exact)
            .fetch_all(pool)
            .await?;

            let ids: Vec<Uuid> = candidates
                .iter()
                .filter(|e| weekday_matches(&e.start_date, days))
                .map(|e| e.id)
                .collect();

            if ids.is_empty() {
                return Ok(0);
            }

            let result = sqlx::query("DELETE FROM events WHERE user_id = $1 AND id = ANY($2)")
                .bind(user_id)
                .bind(&ids)
                .execute(pool)
                .await?;
            Ok(result.rows_affected())
        }
    }
}

/// Whether the event's start falls on one of the named weekdays ("Monday",
/// ...), case-insensitively, in UTC.
pub fn weekday_matches(start: &DateTime<Utc>, days: &[String]) -> bool {
    let weekday = match start.weekday() {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    };
    days.iter().any(|d| d.trim().eq_ignore_ascii_case(weekday))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn weekday_matching_is_case_insensitive() {
        // 2026-03-02 is a Monday
        let monday = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        assert!(weekday_matches(&monday, &["Monday".to_string()]));
        assert!(weekday_matches(&monday, &["MONDAY".to_string()]));
        assert!(!weekday_matches(&monday, &["Tuesday".to_string()]));
    }

    #[test]
    fn weekday_matching_accepts_any_listed_day() {
        let tuesday = Utc.with_ymd_and_hms(2026, 3, 3, 8, 15, 0).unwrap();
        let days = vec!["Monday".to_string(), "Tuesday".to_string()];
        assert!(weekday_matches(&tuesday, &days));
    }

    #[test]
    fn late_evening_stays_on_its_utc_day() {
        // 23:59 UTC on a Sunday must not leak into Monday
        let sunday_night = Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap();
        assert!(!weekday_matches(&sunday_night, &["Monday".to_string()]));
        assert!(weekday_matches(&sunday_night, &["Sunday".to_string()]));
    }
}
