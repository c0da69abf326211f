use async_trait::async_trait;
use openrouter_api::{
    models::provider_preferences::ProviderPreferences,
    models::provider_preferences::ProviderSort,
    types::chat::{ChatCompletionRequest, Message},
};
use serde::Serialize;

use crate::error::QaError;

pub const DEFAULT_MODEL: &str = "google/gemini-flash-1.5";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// "Generate text from a prompt", independent of the backend serving it.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, QaError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

#[derive(Debug)]
pub struct OpenRouterClient {
    client: openrouter_api::OpenRouterClient<openrouter_api::Ready>,
    config: ModelConfig,
}

impl OpenRouterClient {
    /// Reads the API key from `OPENROUTER_API_KEY`.
    pub fn new(config: ModelConfig) -> Result<Self, QaError> {
        let client = openrouter_api::OpenRouterClient::quick().map_err(|e| {
            QaError::Completion(format!("Failed to create OpenRouter client: {}", e))
        })?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextCompletion for OpenRouterClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, QaError> {
        let messages = messages
            .iter()
            .map(|m| Message::text(m.role.as_str(), &m.content))
            .collect();

        let provider = ProviderPreferences::new().with_sort(ProviderSort::Throughput);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            provider: Some(provider),
            stream: None,
            response_format: None,
            tools: None,
            tool_choice: None,
            models: None,
            transforms: None,
            route: None,
            user: None,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            repetition_penalty: None,
            min_p: None,
            top_a: None,
            seed: None,
            stop: None,
            logit_bias: None,
            logprobs: None,
            top_logprobs: None,
            prediction: None,
            parallel_tool_calls: None,
            verbosity: None,
        };

        let response = self
            .client
            .chat()
            .map_err(|e| QaError::Completion(e.to_string()))?
            .chat_completion(request)
            .await
            .map_err(|e| QaError::Completion(format!("OpenRouter API error: {}", e)))?;

        let Some(choice) = response.choices.first() else {
            return Err(QaError::Completion(
                "No response choices received".to_string(),
            ));
        };

        match &choice.message.content {
            openrouter_api::MessageContent::Text(text) => Ok(text.clone()),
            openrouter_api::MessageContent::Parts(parts) => {
                let text_parts: Vec<String> = parts
                    .iter()
                    .filter_map(|p| {
                        if let openrouter_api::ContentPart::Text(tc) = p {
                            Some(tc.text.clone())
                        } else {
                            None
                        }
                    })
                    .collect();
                Ok(text_parts.join("\n"))
            }
        }
    }
}

#[cfg(test)]
pub use scripted::ScriptedCompletion;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tags() {
        assert_eq!(ChatRole::System.as_str(), "system");
        assert_eq!(ChatMessage::user("hi").role, ChatRole::User);
    }

    #[test]
    fn test_default_model_config() {
        let config = ModelConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, Some(0.7));
    }

    #[tokio::test]
    async fn test_scripted_completion_replays_in_order() {
        let client = ScriptedCompletion::new(vec![Ok("first".to_string()), Err("boom".to_string())]);
        let prompt = vec![ChatMessage::user("q")];

        assert_eq!(client.complete(&prompt).await.unwrap(), "first");
        assert!(matches!(
            client.complete(&prompt).await,
            Err(QaError::Completion(_))
        ));
        assert!(client.complete(&prompt).await.is_err());
        assert_eq!(client.call_count(), 3);
    }
}
