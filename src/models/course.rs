use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Read-only reference data seeded from `data/courses.json`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: String,
    pub course: String,
    pub short_name: String,
    pub semester: String,
    pub level: String,
    pub lecture_credits: f64,
    pub exercise_credits: f64,
    pub lecture: serde_json::Value,
    pub exercise: serde_json::Value,
    pub description: Option<String>,
    pub study_topics: Option<serde_json::Value>,
    pub learning_outcomes: Option<serde_json::Value>,
    pub related_fields: Option<serde_json::Value>,
    pub career_paths: Option<serde_json::Value>,
    pub top_companies: Option<serde_json::Value>,
}

/// One row of the `courses_with_stats` view: the course plus aggregated
/// evaluation averages. Averages are NULL until the first evaluation lands.
#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct CourseWithStats {
    pub id: String,
    pub course: String,
    pub short_name: String,
    pub semester: String,
    pub level: String,
    pub lecture_credits: f64,
    pub exercise_credits: f64,
    pub lecture: serde_json::Value,
    pub exercise: serde_json::Value,
    pub description: Option<String>,
    pub study_topics: Option<serde_json::Value>,
    pub learning_outcomes: Option<serde_json::Value>,
    pub related_fields: Option<serde_json::Value>,
    pub career_paths: Option<serde_json::Value>,
    pub top_companies: Option<serde_json::Value>,
    pub evaluation_count: i64,
    pub avg_clarity: Option<f64>,
    pub avg_interest: Option<f64>,
    pub avg_materials: Option<f64>,
    pub avg_instructor: Option<f64>,
    pub avg_satisfaction: Option<f64>,
}
