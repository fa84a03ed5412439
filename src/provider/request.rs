//! Chat request construction

use super::GenerationConfig;
use crate::message::ChatTurn;
use crate::prompt::PromptTemplate;
use serde::Serialize;

/// Body of a streaming chat-completions call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Builds requests from the static model/prompt/generation settings
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    model: &'a str,
    prompt: &'a PromptTemplate,
    generation: &'a GenerationConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(
        model: &'a str,
        prompt: &'a PromptTemplate,
        generation: &'a GenerationConfig,
    ) -> Self {
        Self {
            model,
            prompt,
            generation,
        }
    }

    /// Assemble `[system, history..., user]` plus sampling parameters.
    ///
    /// Inputs are not validated; history is copied as given.
    pub fn build(
        &self,
        user_message: &str,
        context: Option<&str>,
        history: Option<&[ChatTurn]>,
    ) -> ChatRequest {
        let history = history.unwrap_or_default();

        tracing::info!(
            target: "llm",
            user_message_len = user_message.len(),
            context_len = context.map_or(0, str::len),
            history_len = history.len(),
            "Building chat request"
        );

        let system = self.prompt.render(context);
        tracing::debug!(target: "llm", system_len = system.len(), "Rendered system turn");

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatTurn::system(system));
        messages.extend_from_slice(history);
        messages.push(ChatTurn::user(user_message));

        ChatRequest {
            model: self.model.to_string(),
            messages,
            stream: true,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
            max_tokens: self.generation.max_tokens,
        }
    }
}
