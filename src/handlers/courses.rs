// Course catalog endpoints. The catalog itself is read-only reference data;
// listings come from the `courses_with_stats` view so evaluation averages
// ride along. Semester metadata is served straight from the JSON file.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::catalog;
use crate::models::course::CourseWithStats;
use crate::AppState;

pub fn course_routes() -> Router {
    Router::new()
        .route("/api/courses", get(list_courses))
        .route("/api/courses/:id", get(get_course))
        .route("/api/semesters", get(list_semesters))
}

async fn list_courses(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, StatusCode> {
    let courses = sqlx::query_as::<_, CourseWithStats>(
        "SELECT * FROM courses_with_stats ORDER BY semester, id",
    )
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list courses: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "courses": courses })))
}

async fn get_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    let course =
        sqlx::query_as::<_, CourseWithStats>("SELECT * FROM courses_with_stats WHERE id = $1")
            .bind(&id)
            .fetch_optional(&state.db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to fetch course {}: {}", id, e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(json!({ "success": true, "course": course })))
}

async fn list_semesters() -> Result<Json<Value>, StatusCode> {
    let semesters = catalog::load_semesters().map_err(|e| {
        tracing::error!("Failed to load semesters: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(json!({ "success": true, "semesters": semesters })))
}
