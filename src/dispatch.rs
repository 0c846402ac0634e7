use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::capability::{CapabilitySlot, ChatBackend};
use crate::error::ToolError;
use crate::tools::PromptTemplate;

#[derive(Clone)]
pub struct ToolRequest {
    pub template: PromptTemplate,
    pub user_input: String,
    pub language: Option<&'static str>,
}

impl fmt::Debug for ToolRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRequest")
            .field("user_input", &self.user_input)
            .field("language", &self.language)
            .finish()
    }
}

impl ToolRequest {
    pub fn prompt(&self) -> String {
        (self.template)(&self.user_input, self.language)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    #[allow(dead_code)]
    pub raw: Value,
    pub text: String,
}

/// The shapes an AI chat payload comes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatPayload {
    PlainText(String),
    StructuredMessage { content: String },
    Unrecognized,
}

impl ChatPayload {
    pub fn classify(raw: &Value) -> Self {
        match raw {
            Value::String(text) => ChatPayload::PlainText(text.clone()),
            Value::Object(map) => match map
                .get("message")
                .and_then(|message| message.get("content"))
            {
                Some(Value::String(content)) => ChatPayload::StructuredMessage {
                    content: content.clone(),
                },
                _ => ChatPayload::Unrecognized,
            },
            _ => ChatPayload::Unrecognized,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ChatPayload::PlainText(text) => text,
            ChatPayload::StructuredMessage { content } => content,
            ChatPayload::Unrecognized => String::new(),
        }
    }
}

pub fn normalize(raw: Value) -> ToolResponse {
    let text = ChatPayload::classify(&raw).into_text().trim().to_string();
    ToolResponse { raw, text }
}

/// Sends tool prompts to whatever backend the capability slot holds.
#[derive(Clone)]
pub struct Dispatcher {
    slot: Arc<CapabilitySlot>,
}

impl Dispatcher {
    pub fn new(slot: Arc<CapabilitySlot>) -> Self {
        Self { slot }
    }

    /// Checks the request can go out. Nothing is sent on failure.
    pub fn prepare(&self, request: &ToolRequest, ready: bool) -> Result<PreparedCall, ToolError> {
        if request.user_input.trim().is_empty() {
            return Err(ToolError::EmptyInput);
        }
        if !ready {
            return Err(ToolError::ServiceNotReady);
        }
        let backend = self.slot.get().ok_or(ToolError::ServiceNotReady)?;

        Ok(PreparedCall {
            backend,
            prompt: request.prompt(),
        })
    }

    #[allow(dead_code)]
    pub async fn dispatch(&self, request: &ToolRequest, ready: bool) -> Result<ToolResponse, ToolError> {
        self.prepare(request, ready)?.send().await
    }
}

pub struct PreparedCall {
    backend: Arc<dyn ChatBackend>,
    prompt: String,
}

impl PreparedCall {
    /// One call, no retry.
    pub async fn send(self) -> Result<ToolResponse, ToolError> {
        tracing::debug!(
            backend = self.backend.name(),
            prompt_len = self.prompt.len(),
            "sending prompt"
        );

        match self.backend.chat(&self.prompt).await {
            Ok(raw) => Ok(normalize(raw)),
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "AI request failed");
                Err(ToolError::service(&e))
            }
        }
    }
}
