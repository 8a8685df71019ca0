//! Bookkeeping for suspended click-waits.
//!
//! A wait-for-click node registers a resume token keyed by its resolved
//! target item id; a later click dispatch on that id drains and fires every
//! token for it exactly once.

use std::collections::HashMap;

use crate::{
    ShareLock,
    graph::node::NodeId,
    model::{ItemId, OwnerId},
};

/// Resume bookmark for one suspended wait-for-click branch.
#[derive(Debug, Clone)]
pub struct ResumeToken {
    /// owner of the graph the suspended node belongs to
    pub owner: OwnerId,
    pub node_id: NodeId,
    /// session generation at suspension time; stale tokens are dropped
    pub generation: u64,
}

#[derive(Default)]
pub struct ListenerRegistry {
    inner: ShareLock<HashMap<ItemId, Vec<ResumeToken>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        item_id: ItemId,
        token: ResumeToken,
    ) {
        self.inner.write().unwrap().entry(item_id).or_default().push(token);
    }

    /// Remove and return every token registered for `item_id`.
    pub fn resolve(
        &self,
        item_id: &ItemId,
    ) -> Vec<ResumeToken> {
        self.inner.write().unwrap().remove(item_id).unwrap_or_default()
    }

    /// Drop every registered token, used on page change and reset.
    pub fn clear(&self) {
        self.inner.write().unwrap().clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_drains_once() {
        let registry = ListenerRegistry::new();
        registry.register("item".to_string(), ResumeToken {
            owner: "o".to_string(),
            node_id: "n".to_string(),
            generation: 1,
        });

        let first = registry.resolve(&"item".to_string());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].node_id, "n");

        // second resolve finds nothing
        assert!(registry.resolve(&"item".to_string()).is_empty());
    }
}
