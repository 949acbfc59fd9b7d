//! Conversation Messages
//!
//! Message and transcript types shared by the reasoning loop and the
//! provider adapters.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::tool::{ToolCall, ToolResult};

/// Role of a message sender
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) response or tool request
    Assistant,
    /// Tool result (injected as context)
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Tool => write!(f, "tool"),
        }
    }
}

/// Message body: plain text or a structured payload
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Structured(serde_json::Value),
}

impl Content {
    /// Text view of the content; structured payloads are rendered as JSON
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Structured(value) => Cow::Owned(value.to_string()),
        }
    }
    
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Structured(value) => value.is_null(),
        }
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Links a tool message back to the call it answers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolReference {
    /// Call ID of the originating tool call
    pub call_id: String,
    
    /// Name of the tool that ran
    pub name: String,
    
    /// Whether the tool result is an error
    #[serde(default)]
    pub is_error: bool,
    
    /// Structured payload the tool attached, kept alongside the text output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// A single message in a transcript
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,
    
    /// Message body
    pub content: Content,
    
    /// Tool call requested by the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    
    /// Tool call this message answers (tool messages)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolReference>,
    
    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a new message
    pub fn new(role: Role, content: impl Into<Content>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            tool_result: None,
            timestamp: Utc::now(),
        }
    }
    
    /// Create a user message
    pub fn user(content: impl Into<Content>) -> Self {
        Self::new(Role::User, content)
    }
    
    /// Create an assistant message
    pub fn assistant(content: impl Into<Content>) -> Self {
        Self::new(Role::Assistant, content)
    }
    
    /// Create an assistant message recording a requested tool call
    pub fn tool_request(call: ToolCall) -> Self {
        let mut msg = Self::new(Role::Assistant, Content::Text(String::new()));
        msg.tool_call = Some(call);
        msg
    }
    
    /// Create a tool result message
    ///
    /// The text output is what the model reads; structured data only stands
    /// in for it when the tool produced no text.
    pub fn tool(result: &ToolResult) -> Self {
        let content = match &result.data {
            Some(data) if result.output.is_empty() => Content::Structured(data.clone()),
            _ => Content::Text(result.output.clone()),
        };
        let mut msg = Self::new(Role::Tool, content);
        msg.tool_result = Some(ToolReference {
            call_id: result.id.clone().unwrap_or_default(),
            name: result.name.clone(),
            is_error: !result.success,
            data: result.data.clone(),
        });
        msg
    }
    
    /// Text view of the content
    pub fn text(&self) -> Cow<'_, str> {
        self.content.as_text()
    }
}

/// Ordered, append-only message history of one run
#[derive(Clone, Debug, Default, Serialize)]
pub struct Transcript {
    messages: Vec<Message>,
    
    /// Entry ceiling, if any
    #[serde(skip)]
    limit: Option<usize>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }
    
    /// Transcript that refuses to grow past `limit` entries
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: Vec::with_capacity(limit.min(64)),
            limit: Some(limit),
        }
    }
    
    /// Append a message
    pub fn push(&mut self, message: Message) -> Result<()> {
        if let Some(limit) = self.limit
            && self.messages.len() >= limit
        {
            return Err(AgentError::TranscriptOverflow { limit });
        }
        self.messages.push(message);
        Ok(())
    }
    
    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }
    
    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
    
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
    
    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }
    
    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
    
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.text(), "Hello");
        assert!(msg.tool_call.is_none());
    }

    #[test]
    fn test_tool_message_links_call() {
        let result = ToolResult::failure("internet_search", "quota exhausted").with_id("call_1");
        let msg = Message::tool(&result);
        
        assert_eq!(msg.role, Role::Tool);
        let reference = msg.tool_result.as_ref().unwrap();
        assert_eq!(reference.call_id, "call_1");
        assert!(reference.is_error);
        assert_eq!(msg.text(), "quota exhausted");
    }

    #[test]
    fn test_tool_text_wins_over_data() {
        let result = ToolResult::success("lookup", "1. Paris")
            .with_data(serde_json::json!([{"title": "Paris"}]));
        let msg = Message::tool(&result);
        assert_eq!(msg.text(), "1. Paris");
        assert_eq!(
            msg.tool_result.as_ref().and_then(|r| r.data.clone()),
            Some(serde_json::json!([{"title": "Paris"}]))
        );
    }

    #[test]
    fn test_structured_tool_content_without_text() {
        let result = ToolResult::success("lookup", "")
            .with_data(serde_json::json!({"hits": 3}));
        let msg = Message::tool(&result);
        assert_eq!(msg.content, Content::Structured(serde_json::json!({"hits": 3})));
        assert_eq!(msg.text(), r#"{"hits":3}"#);
    }

    #[test]
    fn test_transcript_limit() {
        let mut transcript = Transcript::with_limit(2);
        transcript.push(Message::user("Hi")).unwrap();
        transcript.push(Message::assistant("Hello!")).unwrap();
        
        let err = transcript.push(Message::user("again")).unwrap_err();
        assert!(matches!(err, AgentError::TranscriptOverflow { limit: 2 }));
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().role, Role::Assistant);
    }
}
