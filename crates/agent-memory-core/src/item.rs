//! Typed records stored in session memory.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role given to the message synthesized from a turn's final output.
pub const ASSISTANT_ROLE: &str = "assistant";

/// Discriminant of a [`RunItem`], used for type filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Message,
    ToolCall,
    ToolResult,
    Handoff,
}

impl ItemType {
    /// Tag string for this item type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::Handoff => "handoff",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown item type tag.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown item type: {0}")]
pub struct UnknownItemType(pub String);

impl FromStr for ItemType {
    type Err = UnknownItemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(Self::Message),
            "tool_call" => Ok(Self::ToolCall),
            "tool_result" => Ok(Self::ToolResult),
            "handoff" => Ok(Self::Handoff),
            other => Err(UnknownItemType(other.to_string())),
        }
    }
}

/// One stored unit of session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunItem {
    /// Conversational message.
    Message { role: String, content: String },
    /// Tool invocation requested by the model.
    ToolCall {
        name: String,
        #[serde(default)]
        parameters: HashMap<String, Value>,
    },
    /// Result returned by a tool.
    ToolResult { name: String, result: Value },
    /// Transfer of control to another agent.
    Handoff { agent_name: String, input: String },
}

impl RunItem {
    /// Create a message with an arbitrary role.
    pub fn message(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Message {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::message("user", content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::message(ASSISTANT_ROLE, content)
    }

    /// Create a tool call.
    pub fn tool_call(name: impl Into<String>, parameters: HashMap<String, Value>) -> Self {
        Self::ToolCall {
            name: name.into(),
            parameters,
        }
    }

    /// Create a tool result.
    pub fn tool_result(name: impl Into<String>, result: Value) -> Self {
        Self::ToolResult {
            name: name.into(),
            result,
        }
    }

    /// Create a handoff to the named agent.
    pub fn handoff(agent_name: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Handoff {
            agent_name: agent_name.into(),
            input: input.into(),
        }
    }

    /// Discriminant of this item.
    #[must_use]
    pub const fn item_type(&self) -> ItemType {
        match self {
            Self::Message { .. } => ItemType::Message,
            Self::ToolCall { .. } => ItemType::ToolCall,
            Self::ToolResult { .. } => ItemType::ToolResult,
            Self::Handoff { .. } => ItemType::Handoff,
        }
    }

    /// Target agent name, for handoff items only.
    #[must_use]
    pub fn handoff_agent(&self) -> Option<&str> {
        match self {
            Self::Handoff { agent_name, .. } => Some(agent_name.as_str()),
            _ => None,
        }
    }
}

/// Output of a single agent turn, as handed to memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Input that started the turn.
    #[serde(default)]
    pub input: String,
    /// Records produced during the turn, in order.
    #[serde(default)]
    pub new_items: Vec<RunItem>,
    /// Final textual output, if the turn produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_output: Option<String>,
}

impl RunResult {
    /// Create a result from a batch of items.
    #[must_use]
    pub fn new(new_items: Vec<RunItem>) -> Self {
        Self {
            new_items,
            ..Self::default()
        }
    }

    /// Set the turn input.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = input.into();
        self
    }

    /// Set the final output.
    #[must_use]
    pub fn with_final_output(mut self, output: impl Into<String>) -> Self {
        self.final_output = Some(output.into());
        self
    }

    /// Number of records `Memory::add` appends for this result.
    #[must_use]
    pub fn recorded_len(&self) -> usize {
        self.new_items.len() + usize::from(self.final_output.is_some())
    }
}
