// Course evaluations: one per (course, user), upserted so a resubmission
// edits the earlier one.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::auth_middleware;
use crate::models::auth::Claims;
use crate::models::evaluation::{CourseEvaluation, SubmitEvaluationRequest};
use crate::AppState;

pub fn evaluation_routes() -> Router {
    Router::new()
        .route("/api/evaluations", post(submit_evaluation))
        .route("/api/evaluations/mine", get(list_my_evaluations))
        .route("/api/evaluations/:course_id", get(list_course_evaluations))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn submit_evaluation(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitEvaluationRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.ratings().iter().any(|r| !(1..=5).contains(r)) {
        return Err(StatusCode::BAD_REQUEST);
    }

    let course_exists = sqlx::query("SELECT id FROM courses WHERE id = $1")
        .bind(&payload.course_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check course {}: {}", payload.course_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    if course_exists.is_none() {
        return Err(StatusCode::NOT_FOUND);
    }

    let evaluation = sqlx::query_as::<_, CourseEvaluation>(
        "INSERT INTO course_evaluations
         (id, course_id, user_id, clarity, interest, materials, instructor, satisfaction,
          hours_per_week, group_work, attendance_mandatory, would_recommend, feedback)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (course_id, user_id) DO UPDATE SET
            clarity = EXCLUDED.clarity,
            interest = EXCLUDED.interest,
            materials = EXCLUDED.materials,
            instructor = EXCLUDED.instructor,
            satisfaction = EXCLUDED.satisfaction,
            hours_per_week = EXCLUDED.hours_per_week,
            group_work = EXCLUDED.group_work,
            attendance_mandatory = EXCLUDED.attendance_mandatory,
            would_recommend = EXCLUDED.would_recommend,
            feedback = EXCLUDED.feedback
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.course_id)
    .bind(claims.user_id())
    .bind(payload.clarity)
    .bind(payload.interest)
    .bind(payload.materials)
    .bind(payload.instructor)
    .bind(payload.satisfaction)
    .bind(&payload.hours_per_week)
    .bind(&payload.group_work)
    .bind(&payload.attendance_mandatory)
    .bind(&payload.would_recommend)
    .bind(&payload.feedback)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to submit evaluation: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "evaluation": evaluation })))
}

async fn list_course_evaluations(
    Extension(state): Extension<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let evaluations = sqlx::query_as::<_, CourseEvaluation>(
        "SELECT * FROM course_evaluations WHERE course_id = $1 ORDER BY created_at DESC",
    )
    .bind(&course_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list evaluations for {}: {}", course_id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "evaluations": evaluations })))
}

async fn list_my_evaluations(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, StatusCode> {
    let evaluations = sqlx::query_as::<_, CourseEvaluation>(
        "SELECT * FROM course_evaluations WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(claims.user_id())
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list own evaluations: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "evaluations": evaluations })))
}
