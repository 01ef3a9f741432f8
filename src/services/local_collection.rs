use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;

use crate::db::BlobStore;
use crate::error::AppResult;

/// An in-process collection mirrored to one blob store key
///
/// The persisted blob is the whole collection and is rewritten on every
/// mutation. Mutations run against a copy and only replace the in-memory
/// collection once the write went through, so a failed write leaves both
/// sides on the previous state.
pub struct LocalCollection<T> {
    key: &'static str,
    items: RwLock<Vec<T>>,
    store: Arc<dyn BlobStore>,
}

impl<T> LocalCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Loads the persisted collection, falling back to `seed`
    ///
    /// A blob that no longer parses (schema drift) is ignored in favour of
    /// the seed; it gets overwritten by the next mutation.
    pub async fn load(key: &'static str, store: Arc<dyn BlobStore>, seed: Vec<T>) -> AppResult<Self> {
        let items = match store.get(key).await? {
            Some(blob) => match serde_json::from_str::<Vec<T>>(&blob) {
                Ok(items) => {
                    tracing::debug!(key = %key, count = items.len(), store = store.name(), "Loaded collection");
                    items
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        key = %key,
                        "Stored collection is unreadable, starting from seed data"
                    );
                    seed
                }
            },
            None => seed,
        };

        Ok(Self {
            key,
            items: RwLock::new(items),
            store,
        })
    }

    pub async fn snapshot(&self) -> Vec<T> {
        self.items.read().await.clone()
    }

    pub async fn find<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.read().await.iter().find(|item| predicate(item)).cloned()
    }

    pub async fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    /// Applies `change` and persists the result
    pub async fn mutate<R, F>(&self, change: F) -> AppResult<R>
    where
        F: FnOnce(&mut Vec<T>) -> AppResult<R>,
    {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        let result = change(&mut next)?;

        let blob = serde_json::to_string(&next)?;
        self.store.set(self.key, blob).await?;
        *items = next;

        tracing::debug!(key = %self.key, count = items.len(), "Collection persisted");
        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::MemoryBlobStore;
    use crate::error::AppError;

    /// Blob store whose writes always fail
    pub(crate) struct FailingBlobStore;

    #[async_trait::async_trait]
    impl BlobStore for FailingBlobStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Ok(None)
        }

        async fn set(&self, key: &str, _value: String) -> AppResult<()> {
            Err(AppError::Storage(format!("quota exceeded for {}", key)))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_load_prefers_persisted_blob() {
        let store = Arc::new(MemoryBlobStore::new());
        store.set("k", "[\"persisted\"]".to_string()).await.unwrap();

        let collection =
            LocalCollection::<String>::load("k", store, vec!["seed".to_string()]).await.unwrap();
        assert_eq!(collection.snapshot().await, vec!["persisted".to_string()]);
    }

    #[tokio::test]
    async fn test_load_falls_back_to_seed_on_corrupt_blob() {
        let store = Arc::new(MemoryBlobStore::new());
        store.set("k", "{not json".to_string()).await.unwrap();

        let collection =
            LocalCollection::<String>::load("k", store, vec!["seed".to_string()]).await.unwrap();
        assert_eq!(collection.snapshot().await, vec!["seed".to_string()]);
    }

    #[tokio::test]
    async fn test_mutate_rewrites_whole_blob() {
        let store = Arc::new(MemoryBlobStore::new());
        let collection =
            LocalCollection::<String>::load("k", store.clone(), vec!["a".to_string()]).await.unwrap();

        collection
            .mutate(|items| {
                items.push("b".to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(store.get("k").await.unwrap(), Some("[\"a\",\"b\"]".to_string()));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_state() {
        let collection = LocalCollection::<String>::load(
            "k",
            Arc::new(FailingBlobStore),
            vec!["a".to_string()],
        )
        .await
        .unwrap();

        let err = collection
            .mutate(|items| {
                items.clear();
                Ok(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(collection.snapshot().await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_change_is_not_persisted() {
        let store = Arc::new(MemoryBlobStore::new());
        let collection =
            LocalCollection::<String>::load("k", store.clone(), vec![]).await.unwrap();

        let result: AppResult<()> = collection
            .mutate(|_| Err(AppError::NotFound("missing".to_string())))
            .await;

        assert!(result.unwrap_err().is_not_found());
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
