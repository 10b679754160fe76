// OpenAI Chat Completions client for the study assistant.
// Docs: https://platform.openai.com/docs/api-reference/chat

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
        }
    }

    /// One chat completion, single attempt. An oversized prompt or an
    /// upstream outage fails the call and the upstream body is relayed
    /// verbatim to the caller.
    pub async fn complete(
        &self,
        system: String,
        messages: Vec<OpenAiMessage>,
    ) -> Result<String, String> {
        let mut all_messages = vec![OpenAiMessage {
            role: "system".to_string(),
            content: system,
        }];
        all_messages.extend(messages);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: all_messages,
            max_tokens: 2000,
            temperature: 0.3,
        };

        tracing::debug!(
            "OpenAI request: {} messages, model {}",
            request.messages.len(),
            request.model
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("OpenAI request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read OpenAI response body: {}", e))?;

        if !status.is_success() {
            tracing::error!("OpenAI API error {}: {}", status, body);
            return Err(format!("OpenAI API error {}: {}", status, body));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| format!("Failed to parse OpenAI response: {}\nRaw body: {}", e, body))?;

        if let Some(usage) = &parsed.usage {
            tracing::debug!(
                "OpenAI usage: {} prompt tokens, {} completion tokens",
                usage.prompt_tokens,
                usage.completion_tokens
            );
        }

        parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .ok_or_else(|| "No choices in OpenAI response".to_string())
    }
}
