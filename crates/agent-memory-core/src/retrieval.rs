//! Retrieval criteria and the filter/order/limit pipeline.

use std::collections::HashSet;

use crate::item::{ItemType, RunItem};

/// Criteria for retrieving items from a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetCriteria {
    /// Maximum number of items to return (0 = unbounded).
    pub limit: usize,
    /// Item types to keep (empty = all types).
    pub item_types: Vec<ItemType>,
    /// Handoff target to keep (`None` or empty = no filter).
    pub agent_name: Option<String>,
    /// Most recent first.
    pub reverse: bool,
}

impl GetCriteria {
    /// Criteria that return the whole session in insertion order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// The `n` most recently appended items, newest first.
    #[must_use]
    pub fn recent(n: usize) -> Self {
        Self {
            limit: n,
            reverse: true,
            ..Self::default()
        }
    }

    /// Items of the given types, in insertion order.
    #[must_use]
    pub fn by_type(types: &[ItemType]) -> Self {
        Self {
            item_types: types.to_vec(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_types(mut self, types: &[ItemType]) -> Self {
        self.item_types = types.to_vec();
        self
    }

    #[must_use]
    pub fn with_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    #[must_use]
    pub fn reversed(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    fn agent_filter(&self) -> Option<&str> {
        self.agent_name.as_deref().filter(|name| !name.is_empty())
    }
}

/// Apply `criteria` to a session's items and return an owned copy.
///
/// Stages run in a fixed order: type filter, agent filter, reverse, limit.
/// Limiting after reversal is what makes `recent(n)` return the newest `n`.
///
/// The agent filter only narrows [`RunItem::Handoff`] items; every other
/// item passes through it untouched.
#[must_use]
pub fn apply(items: &[RunItem], criteria: &GetCriteria) -> Vec<RunItem> {
    let types: HashSet<ItemType> = criteria.item_types.iter().copied().collect();
    let agent = criteria.agent_filter();

    let mut filtered: Vec<RunItem> = items
        .iter()
        .filter(|item| types.is_empty() || types.contains(&item.item_type()))
        .filter(|item| match (agent, item.handoff_agent()) {
            (Some(wanted), Some(target)) => wanted == target,
            _ => true,
        })
        .cloned()
        .collect();

    if criteria.reverse {
        filtered.reverse();
    }

    if criteria.limit > 0 {
        filtered.truncate(criteria.limit);
    }

    filtered
}
