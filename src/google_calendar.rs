// Google Calendar API client and OAuth helpers.
// Docs: https://developers.google.com/calendar/api/v3/reference

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::models::event::Event;

pub const DEFAULT_CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    client: Client,
}

// ============================================================================
// OAuth Helpers
// ============================================================================

/// Build the Google OAuth consent URL. `access_type=offline` is required to
/// receive a refresh token on first consent.
pub fn build_oauth_url(client_id: &str, redirect_uri: &str, scope: &str, state: &str) -> String {
    format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}&prompt=consent",
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(scope),
        urlencoding::encode(state)
    )
}

/// Exchange an authorization code for an access/refresh token pair.
pub async fn exchange_code_for_token(
    client: &Client,
    code: &str,
    client_id: &str,
    client_secret: &str,
    redirect_uri: &str,
) -> Result<GoogleTokenResponse, String> {
    let url = "https://oauth2.googleapis.com/token";

    let params = json!({
        "code": code,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": redirect_uri,
        "grant_type": "authorization_code"
    });

    let response = client
        .post(url)
        .json(&params)
        .send()
        .await
        .map_err(|e| format!("Token exchange request failed: {}", e))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(format!("Failed to exchange code: {}", error_text));
    }

    response
        .json::<GoogleTokenResponse>()
        .await
        .map_err(|e| format!("Failed to parse token response: {}", e))
}

#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
    pub token_type: String,
    pub scope: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct InsertedEventResponse {
    pub id: String,
}

impl GoogleCalendarClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Refresh an expired access token. Single attempt; a failed refresh is
    /// surfaced to the caller, which must not proceed to Calendar API calls.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenRefreshResponse, String> {
        let url = "https://oauth2.googleapis.com/token";

        let params = json!({
            "client_id": client_id,
            "client_secret": client_secret,
            "refresh_token": refresh_token,
            "grant_type": "refresh_token"
        });

        let response = self
            .client
            .post(url)
            .json(&params)
            .send()
            .await
            .map_err(|e| format!("Token refresh request failed: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to refresh token: {}", error_text));
        }

        response
            .json::<TokenRefreshResponse>()
            .await
            .map_err(|e| format!("Failed to parse refresh response: {}", e))
    }

    /// Create one event in the user's primary calendar.
    pub async fn insert_event(
        &self,
        access_token: &str,
        event: &Event,
    ) -> Result<InsertedEventResponse, String> {
        let url = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

        let body = event_to_google_payload(event);

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("Calendar insert request failed: {}", e))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Failed to create calendar event: {}", error_text));
        }

        response
            .json::<InsertedEventResponse>()
            .await
            .map_err(|e| format!("Failed to parse calendar response: {}", e))
    }
}

/// Map a calendar row to the Calendar API's event resource. All-day events
/// use `date`; timed events use `dateTime` in UTC.
fn event_to_google_payload(event: &Event) -> serde_json::Value {
    if event.all_day {
        json!({
            "summary": event.title,
            "description": event.description,
            "start": { "date": event.start_date.format("%Y-%m-%d").to_string() },
            "end": { "date": event.end_date.format("%Y-%m-%d").to_string() }
        })
    } else {
        json!({
            "summary": event.title,
            "description": event.description,
            "start": { "dateTime": event.start_date.to_rfc3339(), "timeZone": "UTC" },
            "end": { "dateTime": event.end_date.to_rfc3339(), "timeZone": "UTC" }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_event(all_day: bool) -> Event {
        Event {
            id: Uuid::new_v4(),
            user_id: 1,
            title: "Lecture".to_string(),
            description: Some("Room K1".to_string()),
            start_date: Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
            all_day,
            color: "#3788d8".to_string(),
            background_color: None,
            extended_props: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn timed_event_uses_datetime_fields() {
        let payload = event_to_google_payload(&sample_event(false));
        assert_eq!(
            payload["start"]["dateTime"].as_str().unwrap(),
            "2026-03-02T10:15:00+00:00"
        );
        assert!(payload["start"].get("date").is_none());
    }

    #[test]
    fn all_day_event_uses_date_fields() {
        let payload = event_to_google_payload(&sample_event(true));
        assert_eq!(payload["start"]["date"].as_str().unwrap(), "2026-03-02");
        assert!(payload["start"].get("dateTime").is_none());
    }

    #[test]
    fn oauth_url_encodes_all_parameters() {
        let url = build_oauth_url(
            "client-id",
            "http://localhost:3000/api/auth/google/callback",
            DEFAULT_CALENDAR_SCOPE,
            "abc123",
        );
        assert!(url.contains("client_id=client-id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("state=abc123"));
    }
}
