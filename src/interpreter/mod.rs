// Interpreter for assistant replies. The model is instructed to answer with
// plain text, a calendar action object, or a command object; anything that
// does not strictly parse as one of the known JSON shapes degrades to text.

pub mod aliases;
pub mod classify;
pub mod commands;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("unknown course: {0}")]
    UnknownCourse(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// An event as emitted by the model inside a `create_events` action.
/// Timestamps stay as strings until insertion; the classification heuristic
/// inspects the raw string (a literal `23:59` marks a deadline).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IncomingEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    CancelLastChange,
    RescheduleMeeting,
    DeleteCourse,
    DeleteMeeting,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CancelLastChange => "cancel_last_change",
            CommandKind::RescheduleMeeting => "reschedule_meeting",
            CommandKind::DeleteCourse => "delete_course",
            CommandKind::DeleteMeeting => "delete_meeting",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CommandParams {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub new_date: Option<chrono::NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ActionKind {
    CreateEvents,
}

// The two structured shapes. Untagged: a reply with an unknown command or
// action name fails both variants and falls back to Text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawReply {
    Command {
        command: CommandKind,
        #[serde(default)]
        parameters: CommandParams,
    },
    Action {
        #[allow(dead_code)]
        action: ActionKind,
        events: Vec<IncomingEvent>,
    },
}

#[derive(Debug, PartialEq)]
pub enum AiResponse {
    Text(String),
    CreateEvents(Vec<IncomingEvent>),
    Command {
        command: CommandKind,
        params: CommandParams,
    },
}

/// Parse a raw assistant reply, failing closed: anything that is not strict
/// JSON matching a known shape is returned as `Text` untouched.
pub fn parse_ai_response(raw: &str) -> AiResponse {
    let candidate = strip_code_fences(raw);

    match serde_json::from_str::<RawReply>(candidate) {
        Ok(RawReply::Command {
            command,
            parameters,
        }) => AiResponse::Command {
            command,
            params: parameters,
        },
        Ok(RawReply::Action { events, .. }) => AiResponse::CreateEvents(events),
        Err(_) => AiResponse::Text(raw.to_string()),
    }
}

/// Models frequently wrap JSON in a markdown fence despite instructions.
/// Accept ```json ... ``` and bare ``` ... ``` wrappers.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(inner) = rest.strip_suffix("```") {
            return inner.trim();
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn plain_text_passes_through() {
        let reply = "You have three lectures next week.";
        assert_eq!(parse_ai_response(reply), AiResponse::Text(reply.to_string()));
    }

    #[test]
    fn invalid_json_degrades_to_text() {
        let reply = r#"{"action": "create_events", "events": [broken"#;
        assert_eq!(parse_ai_response(reply), AiResponse::Text(reply.to_string()));
    }

    #[test]
    fn unknown_command_degrades_to_text() {
        let reply = r#"{"command": "format_disk", "parameters": {}}"#;
        assert_eq!(parse_ai_response(reply), AiResponse::Text(reply.to_string()));
    }

    #[test]
    fn create_events_action_parses() {
        let reply = r#"{
            "action": "create_events",
            "events": [
                {"title": "DSP Lecture", "start": "2026-03-03T08:15:00Z", "end": "2026-03-03T10:00:00Z"}
            ]
        }"#;
        match parse_ai_response(reply) {
            AiResponse::CreateEvents(events) => {
                assert_eq!(events.len(), 1);
                assert_eq!(events[0].title, "DSP Lecture");
            }
            other => panic!("expected CreateEvents, got {:?}", other),
        }
    }

    #[test]
    fn command_with_parameters_parses() {
        let reply = r#"{
            "command": "reschedule_meeting",
            "parameters": {"title": "study group", "date": "2026-03-02", "new_date": "2026-03-04"}
        }"#;
        match parse_ai_response(reply) {
            AiResponse::Command { command, params } => {
                assert_eq!(command, CommandKind::RescheduleMeeting);
                assert_eq!(params.title.as_deref(), Some("study group"));
                assert_eq!(params.date, NaiveDate::from_ymd_opt(2026, 3, 2));
                assert_eq!(params.new_date, NaiveDate::from_ymd_opt(2026, 3, 4));
            }
            other => panic!("expected Command, got {:?}", other),
        }
    }

    #[test]
    fn fenced_json_is_unwrapped() {
        let reply = "```json\n{\"command\": \"cancel_last_change\"}\n```";
        match parse_ai_response(reply) {
            AiResponse::Command { command, .. } => {
                assert_eq!(command, CommandKind::CancelLastChange)
            }
            other => panic!("expected Command, got {:?}", other),
        }
    }
}
