//! In-memory session storage.

use std::{
    collections::{BTreeSet, HashMap},
    sync::RwLock,
};

use agent_memory_core::{
    GetCriteria, MemoryContext, RunItem, RunResult,
    retrieval,
    traits::{Memory, MemoryError, validate_session_id},
};
use async_trait::async_trait;

/// In-memory storage implementation.
///
/// Useful for development and single-process deployments.
/// Data is lost on restart.
pub struct InMemoryStorage {
    sessions: RwLock<HashMap<String, Vec<RunItem>>>,
}

impl InMemoryStorage {
    /// Create a new in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> MemoryError {
    MemoryError::Internal(e.to_string())
}

#[async_trait]
impl Memory for InMemoryStorage {
    async fn add(
        &self,
        _ctx: &MemoryContext,
        session_id: &str,
        result: &RunResult,
    ) -> Result<(), MemoryError> {
        validate_session_id(session_id)?;

        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let items = sessions.entry(session_id.to_string()).or_default();

        items.extend(result.new_items.iter().cloned());
        if let Some(output) = &result.final_output {
            items.push(RunItem::assistant(output.clone()));
        }

        tracing::debug!(
            session_id,
            appended = result.recorded_len(),
            size = items.len(),
            "Added run result to memory"
        );
        Ok(())
    }

    async fn get(
        &self,
        _ctx: &MemoryContext,
        session_id: &str,
        criteria: Option<&GetCriteria>,
    ) -> Result<Vec<RunItem>, MemoryError> {
        validate_session_id(session_id)?;

        let default = GetCriteria::default();
        let criteria = criteria.unwrap_or(&default);

        let sessions = self.sessions.read().map_err(poisoned)?;
        let items = sessions
            .get(session_id)
            .map(|items| retrieval::apply(items, criteria))
            .unwrap_or_default();

        tracing::trace!(session_id, returned = items.len(), "Retrieved memory items");
        Ok(items)
    }

    async fn clear(&self, _ctx: &MemoryContext, session_id: &str) -> Result<(), MemoryError> {
        validate_session_id(session_id)?;

        let removed = self
            .sessions
            .write()
            .map_err(poisoned)?
            .remove(session_id);

        tracing::debug!(
            session_id,
            removed = removed.as_ref().map_or(0, Vec::len),
            "Cleared session memory"
        );
        Ok(())
    }

    async fn clear_all(&self, _ctx: &MemoryContext) -> Result<(), MemoryError> {
        let mut sessions = self.sessions.write().map_err(poisoned)?;
        let count = sessions.len();
        sessions.clear();

        tracing::debug!(sessions = count, "Cleared all session memory");
        Ok(())
    }

    async fn size(&self, _ctx: &MemoryContext, session_id: &str) -> Result<usize, MemoryError> {
        validate_session_id(session_id)?;

        Ok(self
            .sessions
            .read()
            .map_err(poisoned)?
            .get(session_id)
            .map_or(0, Vec::len))
    }

    async fn sessions(&self, _ctx: &MemoryContext) -> Result<BTreeSet<String>, MemoryError> {
        Ok(self
            .sessions
            .read()
            .map_err(poisoned)?
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc, thread};

    use agent_memory_core::ItemType;
    use serde_json::json;

    use super::*;

    fn ctx() -> MemoryContext {
        MemoryContext::background()
    }

    fn mixed_result() -> RunResult {
        RunResult::new(vec![
            RunItem::user("Message 1"),
            RunItem::tool_call(
                "tool1",
                HashMap::from([("param".to_string(), json!("value"))]),
            ),
            RunItem::assistant("Message 2"),
            RunItem::tool_result("tool1", json!("result")),
            RunItem::handoff("Agent1", "handoff input"),
        ])
    }

    #[tokio::test]
    async fn test_size_of_unknown_session_is_zero() {
        let store = InMemoryStorage::new();
        assert_eq!(store.size(&ctx(), "test-session").await.unwrap(), 0);
        assert!(store.get_all(&ctx(), "test-session").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_final_output_appended_as_assistant_message() {
        let store = InMemoryStorage::new();
        let result = RunResult::new(vec![RunItem::user("hi")]).with_final_output("hello");

        store.add(&ctx(), "s", &result).await.unwrap();

        assert_eq!(store.size(&ctx(), "s").await.unwrap(), 2);
        let items = store.get_all(&ctx(), "s").await.unwrap();
        assert_eq!(items[0], RunItem::user("hi"));
        assert_eq!(items[1], RunItem::message("assistant", "hello"));
    }

    #[tokio::test]
    async fn test_size_sums_batches_and_final_outputs() {
        let store = InMemoryStorage::new();
        let batches = [
            RunResult::new(vec![RunItem::user("a"), RunItem::assistant("b")])
                .with_final_output("b"),
            RunResult::new(vec![]),
            RunResult::new(vec![]).with_final_output("only output"),
            mixed_result(),
        ];

        let mut expected = 0;
        for batch in &batches {
            store.add(&ctx(), "s", batch).await.unwrap();
            expected += batch.recorded_len();
            assert_eq!(store.size(&ctx(), "s").await.unwrap(), expected);
        }
        assert_eq!(expected, 9);
    }

    #[tokio::test]
    async fn test_empty_batch_creates_session() {
        let store = InMemoryStorage::new();
        store.add(&ctx(), "empty", &RunResult::default()).await.unwrap();

        assert_eq!(store.size(&ctx(), "empty").await.unwrap(), 0);
        let sessions = store.sessions(&ctx()).await.unwrap();
        assert!(sessions.contains("empty"));
    }

    #[tokio::test]
    async fn test_get_with_criteria() {
        let store = InMemoryStorage::new();
        store.add(&ctx(), "s", &mixed_result()).await.unwrap();

        let messages = store
            .get_by_type(&ctx(), "s", &[ItemType::Message])
            .await
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|i| i.item_type() == ItemType::Message));

        let limited = store
            .get(&ctx(), "s", Some(&GetCriteria::all().with_limit(3)))
            .await
            .unwrap();
        assert_eq!(limited.len(), 3);
        assert_eq!(limited[0], RunItem::user("Message 1"));

        let recent = store.get_recent(&ctx(), "s", 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].item_type(), ItemType::Handoff);
        assert_eq!(recent[1].item_type(), ItemType::ToolResult);
    }

    #[tokio::test]
    async fn test_agent_filter_keeps_non_handoff_items() {
        let store = InMemoryStorage::new();
        let result = RunResult::new(vec![RunItem::user("hi"), RunItem::handoff("Y", "go")]);
        store.add(&ctx(), "s", &result).await.unwrap();

        let items = store
            .get(&ctx(), "s", Some(&GetCriteria::all().with_agent("X")))
            .await
            .unwrap();
        assert_eq!(items, vec![RunItem::user("hi")]);
    }

    #[tokio::test]
    async fn test_reverse_does_not_mutate_stored_order() {
        let store = InMemoryStorage::new();
        store.add(&ctx(), "s", &mixed_result()).await.unwrap();

        let _ = store.get_recent(&ctx(), "s", 10).await.unwrap();

        let all = store.get_all(&ctx(), "s").await.unwrap();
        assert_eq!(all, mixed_result().new_items);
    }

    #[tokio::test]
    async fn test_returned_items_are_copies() {
        let store = InMemoryStorage::new();
        store.add(&ctx(), "s", &mixed_result()).await.unwrap();

        let mut typed = store
            .get_by_type(&ctx(), "s", &[ItemType::Message])
            .await
            .unwrap();
        typed[0] = RunItem::user("changed");
        let mut all = store.get_all(&ctx(), "s").await.unwrap();
        all.clear();

        let stored = store.get_all(&ctx(), "s").await.unwrap();
        assert_eq!(stored[0], RunItem::user("Message 1"));
        assert_eq!(stored.len(), 5);
    }

    #[tokio::test]
    async fn test_clear_isolated_to_session() {
        let store = InMemoryStorage::new();
        store
            .add(&ctx(), "a", &RunResult::new(vec![RunItem::user("a")]))
            .await
            .unwrap();
        store.add(&ctx(), "b", &mixed_result()).await.unwrap();

        store.clear(&ctx(), "a").await.unwrap();

        assert_eq!(store.size(&ctx(), "a").await.unwrap(), 0);
        assert_eq!(store.size(&ctx(), "b").await.unwrap(), 5);
        let sessions = store.sessions(&ctx()).await.unwrap();
        assert_eq!(sessions.into_iter().collect::<Vec<_>>(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_unknown_session_is_noop() {
        let store = InMemoryStorage::new();
        store.clear(&ctx(), "missing").await.unwrap();
        assert!(store.sessions(&ctx()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_all() {
        let store = InMemoryStorage::new();
        for id in ["a", "b", "c"] {
            store
                .add(&ctx(), id, &RunResult::new(vec![RunItem::user(id)]))
                .await
                .unwrap();
        }

        store.clear_all(&ctx()).await.unwrap();

        assert!(store.sessions(&ctx()).await.unwrap().is_empty());
        for id in ["a", "b", "c"] {
            assert_eq!(store.size(&ctx(), id).await.unwrap(), 0);
        }
    }

    #[tokio::test]
    async fn test_empty_session_id_rejected() {
        let store = InMemoryStorage::new();
        let ctx = ctx();

        assert!(matches!(
            store.add(&ctx, "", &RunResult::default()).await,
            Err(MemoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.get(&ctx, "", None).await,
            Err(MemoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.clear(&ctx, "").await,
            Err(MemoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            store.size(&ctx, "").await,
            Err(MemoryError::InvalidArgument(_))
        ));
        assert!(store.sessions(&ctx).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryStorage::new();
        let a = uuid::Uuid::new_v4().to_string();
        let b = uuid::Uuid::new_v4().to_string();

        store
            .add(&ctx(), &b, &RunResult::new(vec![RunItem::user("b")]))
            .await
            .unwrap();
        let before = store.get_all(&ctx(), &b).await.unwrap();

        store.add(&ctx(), &a, &mixed_result()).await.unwrap();
        store.clear(&ctx(), &a).await.unwrap();
        store.add(&ctx(), &a, &mixed_result()).await.unwrap();

        assert_eq!(store.get_all(&ctx(), &b).await.unwrap(), before);
        assert_eq!(store.size(&ctx(), &b).await.unwrap(), 1);
        assert_eq!(store.size(&ctx(), &a).await.unwrap(), 5);
    }

    #[test]
    fn test_concurrent_adds_from_threads() {
        const WRITERS: usize = 8;
        const ADDS: usize = 10;

        let store = Arc::new(InMemoryStorage::new());

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let ctx = MemoryContext::background();
                    for i in 0..ADDS {
                        let result = RunResult::new(vec![RunItem::user(format!("{w}:{i}"))]);
                        tokio_test::block_on(store.add(&ctx, "shared", &result)).unwrap();
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let ctx = MemoryContext::background();
                    for _ in 0..ADDS {
                        let size = tokio_test::block_on(store.size(&ctx, "shared")).unwrap();
                        assert!(size <= WRITERS * ADDS);
                        let items = tokio_test::block_on(store.get_recent(&ctx, "shared", 5)).unwrap();
                        assert!(items.len() <= 5);
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        let ctx = MemoryContext::background();
        assert_eq!(
            tokio_test::block_on(store.size(&ctx, "shared")).unwrap(),
            WRITERS * ADDS
        );

        // Each writer's items appear exactly once and in its own order.
        let items = tokio_test::block_on(store.get_all(&ctx, "shared")).unwrap();
        for w in 0..WRITERS {
            let seen: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    RunItem::Message { content, .. } if content.starts_with(&format!("{w}:")) => {
                        Some(content.clone())
                    }
                    _ => None,
                })
                .collect();
            let expected: Vec<String> = (0..ADDS).map(|i| format!("{w}:{i}")).collect();
            assert_eq!(seen, expected);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_from_tasks() {
        let store = Arc::new(InMemoryStorage::new());

        let tasks = (0..16).map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let ctx = MemoryContext::background();
                for _ in 0..10 {
                    let result = RunResult::new(vec![RunItem::user("x")]);
                    store.add(&ctx, "shared", &result).await.unwrap();
                    store.size(&ctx, "shared").await.unwrap();
                }
            })
        });

        for joined in futures::future::join_all(tasks).await {
            joined.unwrap();
        }

        assert_eq!(store.size(&ctx(), "shared").await.unwrap(), 160);
    }
}
