//! ReAct Text Grammar
//!
//! For providers without structured tool calling: the tool list and calling
//! convention go into a system prompt, and tool calls are parsed back out of
//! the model's plain-text reply.

use std::fmt::Write;

use crate::message::{Message, Role};
use crate::provider::ModelResponse;
use crate::tool::{new_call_id, ToolCall, ToolSpec};

const TOOL_FENCE: &str = "```tool";
const FENCE_END: &str = "```";
const FINAL_ANSWER_PREFIX: &str = "Final Answer:";

const SYSTEM_PREAMBLE: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format and nothing else:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, continue reasoning until you can answer.
When you can answer directly, reply with the answer as plain text.
Be concise and accurate."#;

/// Chat role for text-only chat APIs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextRole {
    System,
    User,
    Assistant,
}

/// Describe the available tools and the calling grammar
pub fn tool_prompt_section(tools: &[ToolSpec]) -> String {
    let mut prompt = String::from("## Available Tools\n\n");
    prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
    prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");
    
    for spec in tools {
        let _ = writeln!(prompt, "### {}", spec.name);
        let _ = writeln!(prompt, "{}", spec.description);
        
        if !spec.parameters.is_empty() {
            prompt.push_str("**Parameters:**\n");
            for param in &spec.parameters {
                let required = if param.required { " (required)" } else { "" };
                let _ = writeln!(
                    prompt,
                    "- `{}` ({}){}: {}",
                    param.name, param.param_type, required, param.description
                );
            }
        }
        prompt.push('\n');
    }
    
    prompt
}

/// Full system prompt for a text-mode model
pub fn system_prompt(tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return "You are a helpful AI assistant. Be concise and accurate.".into();
    }
    format!("{SYSTEM_PREAMBLE}\n\n{}", tool_prompt_section(tools))
}

/// Turn a transcript into text-only chat messages, system prompt first
pub fn render_transcript(transcript: &[Message], tools: &[ToolSpec]) -> Vec<(TextRole, String)> {
    let mut rendered = Vec::with_capacity(transcript.len() + 1);
    rendered.push((TextRole::System, system_prompt(tools)));
    rendered.extend(transcript.iter().map(render_message));
    rendered
}

/// Render a single message for a text-only chat API
pub fn render_message(message: &Message) -> (TextRole, String) {
    match message.role {
        Role::User => (TextRole::User, message.text().into_owned()),
        Role::Assistant => match &message.tool_call {
            Some(call) => {
                let body = serde_json::json!({"tool": call.name, "arguments": call.arguments});
                (TextRole::Assistant, format!("{TOOL_FENCE}\n{body}\n{FENCE_END}"))
            }
            None => (TextRole::Assistant, message.text().into_owned()),
        },
        // Tools appear as user-side observations
        Role::Tool => {
            let (name, failed) = message
                .tool_result
                .as_ref()
                .map_or(("unknown", false), |r| (r.name.as_str(), r.is_error));
            let verb = if failed { "failed" } else { "returned" };
            (TextRole::User, format!("[Tool '{name}' {verb}]\n{}", message.text()))
        }
    }
}

/// Parse a plain-text model reply into the next step
pub fn parse_reply(content: &str) -> ModelResponse {
    match parse_tool_call(content) {
        Some(call) => ModelResponse::tool_call(call),
        None => ModelResponse::FinalAnswer(strip_final_answer(content)),
    }
}

/// Parse a tool call from LLM response
fn parse_tool_call(content: &str) -> Option<ToolCall> {
    // Look for ```tool ... ``` blocks
    if let Some(start_idx) = content.find(TOOL_FENCE) {
        let after_marker = &content[start_idx + TOOL_FENCE.len()..];
        if let Some(end_idx) = after_marker.find(FENCE_END) {
            let json_str = after_marker[..end_idx].trim();
            if let Some(call) = tool_call_from_json(json_str) {
                return Some(call);
            }
        }
    }
    
    // Fallback: raw JSON with a "tool" key
    parse_inline_tool_call(content)
}

fn parse_inline_tool_call(content: &str) -> Option<ToolCall> {
    if !content.contains(r#""tool""#) {
        return None;
    }
    
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    
    tool_call_from_json(&content[start..=end])
}

fn tool_call_from_json(json_str: &str) -> Option<ToolCall> {
    let value: serde_json::Value = serde_json::from_str(json_str).ok()?;
    value.get("tool")?.as_str()?;
    
    let mut call: ToolCall = serde_json::from_value(value).ok()?;
    if call.id.is_empty() {
        call.id = new_call_id();
    }
    Some(call)
}

fn strip_final_answer(content: &str) -> String {
    let trimmed = content.trim();
    trimmed
        .find(FINAL_ANSWER_PREFIX)
        .map_or(trimmed, |idx| trimmed[idx + FINAL_ANSWER_PREFIX.len()..].trim())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamType, ParameterSchema, ToolResult};
    use serde_json::json;

    fn search_spec() -> ToolSpec {
        ToolSpec {
            name: "internet_search".into(),
            description: "Search the internet".into(),
            parameters: vec![ParameterSchema::required("query", ParamType::String, "Query")],
        }
    }

    #[test]
    fn test_parse_fenced_tool_call() {
        let content = r#"Let me look that up.
```tool
{"tool": "internet_search", "arguments": {"query": "rust 2024 edition"}}
```"#;
        
        let ModelResponse::ToolCalls(calls) = parse_reply(content) else {
            panic!("expected a tool call");
        };
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "internet_search");
        assert_eq!(calls[0].arguments, json!({"query": "rust 2024 edition"}));
        assert!(calls[0].id.starts_with("call_"));
    }

    #[test]
    fn test_parse_inline_tool_call() {
        let content = r#"{"tool": "python_interpreter", "arguments": {"code": "print(6*7)"}}"#;
        let ModelResponse::ToolCalls(calls) = parse_reply(content) else {
            panic!("expected a tool call");
        };
        assert_eq!(calls[0].str_arg("code"), Some("print(6*7)"));
    }

    #[test]
    fn test_plain_text_is_final_answer() {
        assert_eq!(
            parse_reply("Thought: I know this.\nFinal Answer: 42"),
            ModelResponse::FinalAnswer("42".into())
        );
        assert_eq!(
            parse_reply("  Paris is the capital of France. "),
            ModelResponse::FinalAnswer("Paris is the capital of France.".into())
        );
        // JSON without a tool key stays an answer
        assert!(parse_reply(r#"{"answer": 42}"#).is_final());
    }

    #[test]
    fn test_render_transcript() {
        let call = ToolCall::new("internet_search", json!({"query": "weather"}));
        let result = ToolResult::failure("internet_search", "timeout").with_id(call.id.clone());
        let transcript = vec![
            Message::user("What's the weather?"),
            Message::tool_request(call),
            Message::tool(&result),
        ];
        
        let rendered = render_transcript(&transcript, &[search_spec()]);
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[0].0, TextRole::System);
        assert!(rendered[0].1.contains("### internet_search"));
        assert!(rendered[0].1.contains("- `query` (string) (required): Query"));
        assert_eq!(rendered[2].0, TextRole::Assistant);
        assert!(rendered[2].1.starts_with("```tool"));
        assert_eq!(rendered[3], (TextRole::User, "[Tool 'internet_search' failed]\ntimeout".to_string()));
        
        // The rendered request parses back to the same call
        let ModelResponse::ToolCalls(calls) = parse_reply(&rendered[2].1) else {
            panic!("expected a tool call");
        };
        assert_eq!(calls[0].arguments, json!({"query": "weather"}));
    }
}
