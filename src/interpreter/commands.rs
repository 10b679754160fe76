// The four command handlers recognized by the interpreter, plus the bulk
// create path. Every handler is a best-effort database operation: the caller
// turns any error into a human-readable summary, nothing is retried.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::aliases::{course_variants, mentions_course, resolve_course};
use super::classify::{parse_timestamp, split_events};
use super::{CommandError, CommandKind, CommandParams, IncomingEvent};
use crate::models::assignment::Assignment;
use crate::models::event::Event;

/// Rows created within this trailing window are considered "the last change".
/// Heuristic carried over from the original: there is no operation log, so a
/// manual edit inside the window is undone together with the chat action.
pub const UNDO_WINDOW_MINUTES: i64 = 10;

pub async fn dispatch(
    pool: &PgPool,
    user_id: i32,
    command: CommandKind,
    params: &CommandParams,
) -> Result<String, CommandError> {
    match command {
        CommandKind::CancelLastChange => cancel_last_change(pool, user_id).await,
        CommandKind::RescheduleMeeting => reschedule_meeting(pool, user_id, params).await,
        CommandKind::DeleteCourse => delete_course(pool, user_id, params).await,
        CommandKind::DeleteMeeting => delete_meeting(pool, user_id, params).await,
    }
}

/// Bulk-insert a classified batch. Returns (events inserted, assignments
/// inserted). Items whose timestamp cannot be parsed are skipped with a
/// warning rather than failing the batch.
pub async fn apply_create_events(
    pool: &PgPool,
    user_id: i32,
    events: Vec<IncomingEvent>,
) -> Result<(usize, usize), CommandError> {
    let (calendar_items, assignment_items) = split_events(events);

    let mut events_created = 0usize;
    for item in &calendar_items {
        let start = match parse_timestamp(&item.start) {
            Some(ts) => ts,
            None => {
                tracing::warn!("Skipping event with unparseable start: {:?}", item.start);
                continue;
            }
        };
        let end = item
            .end
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(start + Duration::hours(1));

        sqlx::query(
            "INSERT INTO events (id, user_id, title, description, start_date, end_date, all_day, color)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(start)
        .bind(end)
        .bind(item.all_day)
        .bind(item.color.as_deref().unwrap_or("#3788d8"))
        .execute(pool)
        .await?;
        events_created += 1;
    }

    let mut assignments_created = 0usize;
    for item in &assignment_items {
        let start = match parse_timestamp(&item.start) {
            Some(ts) => ts,
            None => {
                tracing::warn!("Skipping assignment with unparseable start: {:?}", item.start);
                continue;
            }
        };
        let due_time = if item.all_day || start.time() == NaiveTime::MIN {
            None
        } else {
            Some(start.time())
        };

        sqlx::query(
            "INSERT INTO assignments (id, user_id, title, description, due_date, due_time, course)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&item.title)
        .bind(&item.description)
        .bind(start.date_naive())
        .bind(due_time)
        .bind(&item.course)
        .execute(pool)
        .await?;
        assignments_created += 1;
    }

    Ok((events_created, assignments_created))
}

pub async fn cancel_last_change(pool: &PgPool, user_id: i32) -> Result<String, CommandError> {
    let cutoff = Utc::now() - Duration::minutes(UNDO_WINDOW_MINUTES);

    let events_deleted = sqlx::query("DELETE FROM events WHERE user_id = $1 AND created_at >= $2")
        .bind(user_id)
        .bind(cutoff)
        .execute(pool)
        .await?
        .rows_affected();

    let assignments_deleted =
        sqlx::query("DELETE FROM assignments WHERE user_id = $1 AND created_at >= $2")
            .bind(user_id)
            .bind(cutoff)
            .execute(pool)
            .await?
            .rows_affected();

    Ok(format!(
        "Removed {} event(s) and {} assignment(s) created in the last {} minutes.",
        events_deleted, assignments_deleted, UNDO_WINDOW_MINUTES
    ))
}

pub async fn reschedule_meeting(
    pool: &PgPool,
    user_id: i32,
    params: &CommandParams,
) -> Result<String, CommandError> {
    let title = params
        .title
        .as_deref()
        .ok_or(CommandError::MissingParameter("title"))?;
    let date = params.date.ok_or(CommandError::MissingParameter("date"))?;
    let new_date = params
        .new_date
        .ok_or(CommandError::MissingParameter("new_date"))?;

    let (day_start, day_end) = day_bounds_utc(date);

    let matches = sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE user_id = $1 AND title ILIKE '%' || $2 || '%'
           AND start_date >= $3 AND start_date < $4",
    )
    .bind(user_id)
    .bind(title)
    .bind(day_start)
    .bind(day_end)
    .fetch_all(pool)
    .await?;

    if matches.is_empty() {
        return Ok(format!("No events matching \"{}\" found on {}.", title, date));
    }

    for event in &matches {
        let (new_start, new_end) = shift_to_day(event.start_date, event.end_date, new_date);
        sqlx::query("UPDATE events SET start_date = $1, end_date = $2 WHERE id = $3")
            .bind(new_start)
            .bind(new_end)
            .bind(event.id)
            .execute(pool)
            .await?;
    }

    Ok(format!(
        "Rescheduled {} event(s) matching \"{}\" from {} to {}.",
        matches.len(),
        title,
        date,
        new_date
    ))
}

pub async fn delete_course(
    pool: &PgPool,
    user_id: i32,
    params: &CommandParams,
) -> Result<String, CommandError> {
    let input = params
        .course
        .as_deref()
        .ok_or(CommandError::MissingParameter("course"))?;
    let canonical =
        resolve_course(input).ok_or_else(|| CommandError::UnknownCourse(input.to_string()))?;
    let variants = course_variants(canonical);

    // Word-boundary matching is not expressible as a store predicate, so
    // candidates are selected and filtered here, then deleted by id list.
    let events = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    let event_ids: Vec<Uuid> = events
        .iter()
        .filter(|e| {
            mentions_course(&e.title, variants)
                || e.description
                    .as_deref()
                    .is_some_and(|d| mentions_course(d, variants))
        })
        .map(|e| e.id)
        .collect();

    let events_deleted = if event_ids.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM events WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(&event_ids)
            .execute(pool)
            .await?
            .rows_affected()
    };

    let assignments =
        sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await?;
    let assignment_ids: Vec<Uuid> = assignments
        .iter()
        .filter(|a| {
            mentions_course(&a.title, variants)
                || a.description
                    .as_deref()
                    .is_some_and(|d| mentions_course(d, variants))
                || a.course
                    .as_deref()
                    .is_some_and(|c| mentions_course(c, variants))
        })
        .map(|a| a.id)
        .collect();

    let assignments_deleted = if assignment_ids.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM assignments WHERE user_id = $1 AND id = ANY($2)")
            .bind(user_id)
            .bind(&assignment_ids)
            .execute(pool)
            .await?
            .rows_affected()
    };

    Ok(format!(
        "Deleted {} event(s) and {} assignment(s) for {}.",
        events_deleted, assignments_deleted, canonical
    ))
}

pub async fn delete_meeting(
    pool: &PgPool,
    user_id: i32,
    params: &CommandParams,
) -> Result<String, CommandError> {
    let date = params.date.ok_or(CommandError::MissingParameter("date"))?;
    let (day_start, day_end) = day_bounds_utc(date);

    let deleted = match params.title.as_deref() {
        Some(title) => {
            sqlx::query(
                "DELETE FROM events
                 WHERE user_id = $1 AND start_date >= $2 AND start_date < $3
                   AND title ILIKE '%' || $4 || '%'",
            )
            .bind(user_id)
            .bind(day_start)
            .bind(day_end)
            .bind(title)
            .execute(pool)
            .await?
            .rows_affected()
        }
        None => {
            sqlx::query(
                "DELETE FROM events
                 WHERE user_id = $1 AND start_date >= $2 AND start_date < $3",
            )
            .bind(user_id)
            .bind(day_start)
            .bind(day_end)
            .execute(pool)
            .await?
            .rows_affected()
        }
    };

    Ok(format!("Deleted {} event(s) on {}.", deleted, date))
}

/// UTC half-open bounds [00:00, next day 00:00) of a calendar day.
pub fn day_bounds_utc(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}

/// Move an event to another day, keeping time-of-day and duration.
pub fn shift_to_day(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    new_date: NaiveDate,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let duration = end - start;
    let new_start = new_date.and_time(start.time()).and_utc();
    (new_start, new_start + duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn day_bounds_cover_exactly_one_day() {
        let (start, end) = day_bounds_utc(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap());
    }

    #[test]
    fn shift_preserves_time_of_day_and_duration() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap();
        let (new_start, new_end) =
            shift_to_day(start, end, NaiveDate::from_ymd_opt(2026, 3, 9).unwrap());
        assert_eq!(new_start, Utc.with_ymd_and_hms(2026, 3, 9, 10, 15, 0).unwrap());
        assert_eq!(new_end - new_start, end - start);
    }

    #[test]
    fn shift_handles_events_crossing_midnight() {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 3, 1, 0, 0).unwrap();
        let (new_start, new_end) =
            shift_to_day(start, end, NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
        assert_eq!(new_start, Utc.with_ymd_and_hms(2026, 3, 10, 23, 0, 0).unwrap());
        assert_eq!(new_end, Utc.with_ymd_and_hms(2026, 3, 11, 1, 0, 0).unwrap());
    }
}
