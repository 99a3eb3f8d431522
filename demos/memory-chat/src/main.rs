//! Example multi-turn conversation with session memory.
//!
//! Run with: cargo run -p memory-chat-example
//!
//! Uses a scripted executor in place of a model provider so the output is
//! deterministic. Set `MEMORY_CHAT_SESSION` to change the session ID.

use std::collections::HashMap;

use agent_memory_core::{ItemType, Memory, MemoryContext, RunItem, RunResult};
use agent_memory_session::{ExecutorError, SessionRunner, TurnExecutor, storage::InMemoryStorage};
use async_trait::async_trait;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_SESSION: &str = "alice-session";

/// Deterministic stand-in for a model-backed turn engine.
struct ScriptedExecutor;

#[async_trait]
impl TurnExecutor for ScriptedExecutor {
    async fn run_turn(
        &self,
        _ctx: &MemoryContext,
        input: &str,
        history: &[RunItem],
    ) -> Result<RunResult, ExecutorError> {
        let lower = input.to_lowercase();
        let mut items = vec![RunItem::user(input)];

        let reply = if lower.contains("time") {
            items.push(RunItem::tool_call("get_time_info", HashMap::new()));
            items.push(RunItem::tool_result(
                "get_time_info",
                json!({ "current_time": "2024-01-01T12:00:00Z", "timezone": "UTC" }),
            ));
            "It is 12:00 UTC.".to_string()
        } else if lower.contains("summarize") {
            items.push(RunItem::handoff("Summarizer", input));
            format!("So far we have exchanged {} items.", history.len())
        } else if let Some(name) = recall(history, "my name is") {
            format!("Your name is {name}.")
        } else {
            "Nice to meet you!".to_string()
        };

        Ok(RunResult::new(items)
            .with_input(input)
            .with_final_output(reply))
    }
}

/// Find the word following `phrase` in an earlier user message.
fn recall(history: &[RunItem], phrase: &str) -> Option<String> {
    history.iter().find_map(|item| match item {
        RunItem::Message { role, content } if role == "user" => {
            let start = content.find(phrase)? + phrase.len();
            content[start..]
                .split(|c: char| !c.is_alphanumeric())
                .find(|w| !w.is_empty())
                .map(str::to_string)
        }
        _ => None,
    })
}

fn describe(item: &RunItem) -> String {
    match item {
        RunItem::Message { role, content } => format!("{role}: {content}"),
        RunItem::ToolCall { name, .. } => format!("tool call: {name}"),
        RunItem::ToolResult { name, result } => format!("tool result ({name}): {result}"),
        RunItem::Handoff { agent_name, input } => format!("handoff to {agent_name}: {input}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let session_id =
        std::env::var("MEMORY_CHAT_SESSION").unwrap_or_else(|_| DEFAULT_SESSION.to_string());
    let ctx = MemoryContext::background();
    let runner = SessionRunner::new(InMemoryStorage::new(), ScriptedExecutor);

    println!("Memory-enabled Chat Agent Example");
    println!("================================");

    let conversation = [
        "Hi, my name is Alice and I'm a software engineer.",
        "What's my name?",
        "What time is it?",
        "Can you summarize our conversation so far?",
    ];

    for (turn, input) in conversation.iter().enumerate() {
        println!("\n--- Turn {} ---", turn + 1);
        println!("User: {input}");

        match runner.run(&ctx, &session_id, input).await {
            Ok(result) => {
                println!("Assistant: {}", result.final_output.unwrap_or_default());
            }
            Err(e) => {
                tracing::error!("Turn failed: {e}");
                continue;
            }
        }

        let size = runner.memory().size(&ctx, &session_id).await?;
        println!("Memory size: {size} items");
    }

    println!("\n--- Memory Analysis ---");
    let memory = runner.memory();

    let all = memory.get_all(&ctx, &session_id).await?;
    println!("Total memory items: {}", all.len());

    let messages = memory
        .get_by_type(&ctx, &session_id, &[ItemType::Message])
        .await?;
    println!("Message items: {}", messages.len());

    println!("\nConversation history:");
    for (i, item) in messages.iter().enumerate() {
        println!("{}. {}", i + 1, describe(item));
    }

    println!("\nMost recent items:");
    for item in memory.get_recent(&ctx, &session_id, 3).await? {
        println!("  {}", describe(&item));
    }

    // A second, independent session.
    let scratch = uuid::Uuid::new_v4().to_string();
    runner.run(&ctx, &scratch, "Hello from another session").await?;

    println!("\nActive sessions:");
    for id in memory.sessions(&ctx).await? {
        println!("  {id}: {} items", memory.size(&ctx, &id).await?);
    }

    memory.clear(&ctx, &scratch).await?;
    println!(
        "\nAfter clearing {scratch}: {} session(s), {} items in {session_id}",
        memory.sessions(&ctx).await?.len(),
        memory.size(&ctx, &session_id).await?
    );

    Ok(())
}
