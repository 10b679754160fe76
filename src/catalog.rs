// Static reference data: the course catalog and semester calendar metadata.
// Both files are read from disk at request time, matching the original
// deployment where they lived next to the function code (no caching).

use serde::{Deserialize, Serialize};

use crate::models::course::Course;

const COURSES_PATH: &str = "data/courses.json";
const SEMESTERS_PATH: &str = "data/semesters.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub exam_period: serde_json::Value,
    pub breaks: serde_json::Value,
}

pub fn load_courses() -> Result<Vec<Course>, String> {
    let raw = std::fs::read_to_string(COURSES_PATH)
        .map_err(|e| format!("Failed to read {}: {}", COURSES_PATH, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", COURSES_PATH, e))
}

pub fn load_semesters() -> Result<Vec<Semester>, String> {
    let raw = std::fs::read_to_string(SEMESTERS_PATH)
        .map_err(|e| format!("Failed to read {}: {}", SEMESTERS_PATH, e))?;
    serde_json::from_str(&raw).map_err(|e| format!("Failed to parse {}: {}", SEMESTERS_PATH, e))
}
