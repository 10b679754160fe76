use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GoogleToken {
    pub user_id: i32,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct GoogleOAuthState {
    pub state: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub user_id: i32,
}

#[derive(Debug, Serialize)]
pub struct ExportedEvent {
    pub id: uuid::Uuid,
    pub title: String,
    pub google_event_id: String,
}

#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub success: bool,
    pub exported: Vec<ExportedEvent>,
    pub failed: usize,
}
