// Todo/assignment CRUD.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::middleware::auth::auth_middleware;
use crate::models::assignment::{Assignment, CreateAssignmentRequest, UpdateAssignmentRequest};
use crate::models::auth::Claims;
use crate::AppState;

pub fn assignment_routes() -> Router {
    Router::new()
        .route("/api/assignments", get(list_assignments).post(create_assignment))
        .route(
            "/api/assignments/:id",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn list_assignments(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>, StatusCode> {
    let assignments = sqlx::query_as::<_, Assignment>(
        "SELECT * FROM assignments WHERE user_id = $1 ORDER BY due_date, due_time NULLS LAST",
    )
    .bind(claims.user_id())
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list assignments: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "assignments": assignments })))
}

async fn get_assignment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, StatusCode> {
    let assignment = sqlx::query_as::<_, Assignment>(
        "SELECT * FROM assignments WHERE id = $1 AND user_id = $2",
    )
    .bind(id)
    .bind(claims.user_id())
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch assignment {}: {}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({ "success": true, "assignment": assignment })))
}

async fn create_assignment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateAssignmentRequest>,
) -> Result<Json<Value>, StatusCode> {
    if payload.title.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let assignment = sqlx::query_as::<_, Assignment>(
        "INSERT INTO assignments
         (id, user_id, title, description, due_date, due_time, course, assignment_type, priority)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(claims.user_id())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.due_date)
    .bind(payload.due_time)
    .bind(&payload.course)
    .bind(payload.assignment_type.as_deref().unwrap_or("homework"))
    .bind(payload.priority.as_deref().unwrap_or("medium"))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create assignment: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "assignment": assignment })))
}

async fn update_assignment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAssignmentRequest>,
) -> Result<Json<Value>, StatusCode> {
    let assignment = sqlx::query_as::<_, Assignment>(
        "UPDATE assignments SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            due_date = COALESCE($3, due_date),
            due_time = COALESCE($4, due_time),
            course = COALESCE($5, course),
            assignment_type = COALESCE($6, assignment_type),
            completed = COALESCE($7, completed),
            priority = COALESCE($8, priority)
         WHERE id = $9 AND user_id = $10
         RETURNING *",
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.due_date)
    .bind(payload.due_time)
    .bind(&payload.course)
    .bind(&payload.assignment_type)
    .bind(payload.completed)
    .bind(&payload.priority)
    .bind(id)
    .bind(claims.user_id())
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update assignment {}: {}", id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({ "success": true, "assignment": assignment })))
}

async fn delete_assignment(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, StatusCode> {
    let result = sqlx::query("DELETE FROM assignments WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(claims.user_id())
        .execute(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete assignment {}: {}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    if result.rows_affected() == 0 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "success": true })))
}
