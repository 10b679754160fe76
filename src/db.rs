// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use std::time::Duration;

use crate::catalog;

pub async fn create_pool() -> Result<PgPool, sqlx::Error> {
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&db_url)
        .await?;

    // Run migrations on startup
    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

/// Seed the read-only course catalog from `data/courses.json`. Existing rows
/// are left untouched so manual corrections in the database survive restarts.
pub async fn seed_courses(pool: &PgPool) -> Result<(), String> {
    let courses = catalog::load_courses()?;
    let mut inserted = 0u32;

    for course in &courses {
        let result = sqlx::query(
            "INSERT INTO courses
             (id, course, short_name, semester, level, lecture_credits, exercise_credits,
              lecture, exercise, description, study_topics, learning_outcomes,
              related_fields, career_paths, top_companies)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(&course.id)
        .bind(&course.course)
        .bind(&course.short_name)
        .bind(&course.semester)
        .bind(&course.level)
        .bind(course.lecture_credits)
        .bind(course.exercise_credits)
        .bind(&course.lecture)
        .bind(&course.exercise)
        .bind(&course.description)
        .bind(&course.study_topics)
        .bind(&course.learning_outcomes)
        .bind(&course.related_fields)
        .bind(&course.career_paths)
        .bind(&course.top_companies)
        .execute(pool)
        .await
        .map_err(|e| format!("Failed to seed course {}: {}", course.id, e))?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tracing::info!(
        "Course catalog seeded: {} new, {} total",
        inserted,
        courses.len()
    );
    Ok(())
}
