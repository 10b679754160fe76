use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseEvaluation {
    pub id: Uuid,
    pub course_id: String,
    pub user_id: i32,
    pub clarity: i16,
    pub interest: i16,
    pub materials: i16,
    pub instructor: i16,
    pub satisfaction: i16,
    pub hours_per_week: String,
    pub group_work: String,
    pub attendance_mandatory: String,
    pub would_recommend: String,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitEvaluationRequest {
    pub course_id: String,
    pub clarity: i16,
    pub interest: i16,
    pub materials: i16,
    pub instructor: i16,
    pub satisfaction: i16,
    pub hours_per_week: String,
    pub group_work: String,
    pub attendance_mandatory: String,
    pub would_recommend: String,
    pub feedback: Option<String>,
}

impl SubmitEvaluationRequest {
    pub fn ratings(&self) -> [i16; 5] {
        [
            self.clarity,
            self.interest,
            self.materials,
            self.instructor,
            self.satisfaction,
        ]
    }
}
