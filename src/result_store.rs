//! # Result Store Module
//!
//! Per-user memory of the latest search results, used by the "show more"
//! button. One entry per user, replaced on every new search, never evicted.
//!
//! Writes are last-writer-wins. Readers get an `Arc` snapshot, so a list
//! being replaced while another update pages through the old one is never
//! observed half-written.

use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::UserId;
use tokio::sync::RwLock;
use tracing::debug;

use crate::pinterest::SearchResult;

#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    entries: Arc<RwLock<HashMap<UserId, Arc<[SearchResult]>>>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the user's results with `results`
    pub async fn store(&self, user_id: UserId, results: Vec<SearchResult>) {
        let count = results.len();
        let mut entries = self.entries.write().await;
        entries.insert(user_id, Arc::from(results));
        debug!(user_id = %user_id, results = count, "Stored search results");
    }

    pub async fn get(&self, user_id: UserId) -> Option<Arc<[SearchResult]>> {
        let entries = self.entries.read().await;
        entries.get(&user_id).cloned()
    }

    /// Number of users with stored results
    pub async fn user_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(n: usize) -> SearchResult {
        SearchResult {
            image_url: format!("https://i.pinimg.com/{n}.jpg"),
            title: format!("Pin {n}"),
            link: String::new(),
        }
    }

    #[tokio::test]
    async fn test_store_overwrites_previous_results() {
        let store = ResultStore::new();
        store.store(UserId(1), vec![result(1), result(2), result(3)]).await;
        store.store(UserId(1), vec![result(9)]).await;

        let stored = store.get(UserId(1)).await.unwrap();
        assert_eq!(&*stored, &[result(9)]);
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = ResultStore::new();
        store.store(UserId(1), vec![result(1)]).await;
        store.store(UserId(2), vec![result(2), result(3)]).await;

        assert_eq!(store.get(UserId(1)).await.unwrap().len(), 1);
        assert_eq!(store.get(UserId(2)).await.unwrap().len(), 2);
        assert!(store.get(UserId(3)).await.is_none());
    }

    #[tokio::test]
    async fn test_snapshot_survives_replacement() {
        let store = ResultStore::new();
        store.store(UserId(1), vec![result(1), result(2)]).await;

        let snapshot = store.get(UserId(1)).await.unwrap();
        store.store(UserId(1), vec![result(5)]).await;

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[1], result(2));
    }
}
