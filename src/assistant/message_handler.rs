use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::tool_registry::ToolRegistry;
use crate::extract::{Payload, ResultSanitizer, UrlHarvester};
use crate::shared::models::{ChatMessage, ChatSession, ToolCall};
use crate::shared::{ChatModel, Result};

/// Messages of prior conversation sent with each turn.
const HISTORY_LIMIT: usize = 20;

const EMPTY_INPUT_REPLY: &str = "Please type a question about phones.";
const NO_ANSWER_REPLY: &str = "Sorry, I don't have an answer for that.";
const ROUNDS_EXHAUSTED_REPLY: &str =
    "Sorry, I couldn't finish looking that up. Please try a more specific question.";

pub const SYSTEM_PROMPT: &str = r#"You are a shopping assistant for smartphones sold in India.

Tools:
- SerpSearch: live prices, offers and reviews. Use it for anything about price, budget or "best phone under X".
- WikiSpecs: hardware specifications (camera, battery, display, storage) of a named model.
- PhoneImages: picture links for a named model. Include the returned links verbatim in your answer.

Rules:
- Quote prices in Indian rupees (₹).
- Call a tool when you need current facts; do not invent prices or specs.
- If a tool reports an error, say what you could not find and answer with what you have.
- Keep answers short and refuse requests for adult or unsafe content."#;

/// Result of one user turn, ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutput {
    pub reply: String,
    pub images: Vec<String>,
}

impl TurnOutput {
    fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            images: Vec::new(),
        }
    }
}

pub struct MessageHandler {
    model: Arc<dyn ChatModel>,
    tool_registry: Arc<ToolRegistry>,
    sanitizer: Arc<ResultSanitizer>,
    image_harvester: UrlHarvester,
    session: ChatSession,
    max_tool_rounds: usize,
    max_images: usize,
}

impl MessageHandler {
    pub fn new(
        model: Arc<dyn ChatModel>,
        tool_registry: Arc<ToolRegistry>,
        sanitizer: Arc<ResultSanitizer>,
        max_tool_rounds: usize,
        max_images: usize,
    ) -> Self {
        Self {
            model,
            tool_registry,
            sanitizer,
            image_harvester: UrlHarvester::images(),
            session: ChatSession::new(),
            max_tool_rounds: max_tool_rounds.max(1),
            max_images,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn reset(&mut self) {
        info!("Resetting chat session");
        self.session.clear();
    }

    /// Answer one user message. Failures are rendered into the reply so the
    /// session keeps going.
    pub async fn handle_turn(&mut self, text: &str) -> TurnOutput {
        let text = text.trim();
        if text.is_empty() {
            return TurnOutput::text(EMPTY_INPUT_REPLY);
        }

        self.session.push_user(text);

        let answer = match self.run_rounds().await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Turn failed: {}", e);
                return TurnOutput::text(format!("Sorry, something went wrong: {}", e));
            }
        };

        let reply = self.sanitizer.sanitize(&answer);
        self.session.push_assistant(&reply);

        let images = self
            .image_harvester
            .harvest(&Payload::Text(reply.clone()), self.max_images);
        debug!(images = images.len(), "Turn complete");

        TurnOutput { reply, images }
    }

    async fn run_rounds(&self) -> Result<String> {
        let tools = self.tool_registry.function_definitions().await;
        let mut transcript = self.session.history_for_model(HISTORY_LIMIT);

        for round in 1..=self.max_tool_rounds {
            let response = self
                .model
                .complete(&transcript, Some(SYSTEM_PROMPT), &tools)
                .await?;

            if let Some(tokens) = response.total_tokens {
                debug!(round, tokens, "Model response received");
            }

            if response.tool_calls.is_empty() {
                return Ok(response
                    .content
                    .unwrap_or_else(|| NO_ANSWER_REPLY.to_string()));
            }

            info!(round, calls = response.tool_calls.len(), "Model requested tools");
            let mut request = ChatMessage::assistant_tool_calls(response.tool_calls.clone());
            if let Some(content) = response.content {
                request.content = content;
            }
            transcript.push(request);

            for call in &response.tool_calls {
                let output = self.run_tool(call).await;
                transcript.push(ChatMessage::tool_result(call.id.clone(), output));
            }
        }

        warn!(
            max_rounds = self.max_tool_rounds,
            "Tool rounds exhausted without a final answer"
        );
        Ok(ROUNDS_EXHAUSTED_REPLY.to_string())
    }

    async fn run_tool(&self, call: &ToolCall) -> String {
        match self
            .tool_registry
            .execute_tool(&call.name, &call.arguments)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Tool '{}' failed: {}", call.name, e)
            }
        }
    }
}
