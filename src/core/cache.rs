use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Session-lifetime, in-memory cache. Nothing here survives a restart.
#[derive(Clone)]
pub struct Cache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<HashMap<K, V>>>,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Send + Sync + Debug,
    V: Clone + Send + Sync,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached value, building and storing it first on a miss.
    ///
    /// The lock is held while `build` runs, so concurrent callers for the
    /// same cache never build twice.
    pub async fn get_or_insert_with<F>(&self, key: K, build: F) -> V
    where
        F: FnOnce() -> V,
    {
        let mut cache = self.inner.lock().await;
        if let Some(value) = cache.get(&key) {
            debug!("Cache HIT for key: {:?}", key);
            return value.clone();
        }
        debug!("Cache MISS for key: {:?}, building", key);
        let value = build();
        cache.insert(key, value.clone());
        value
    }

    pub async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Send + Sync + Debug,
    V: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_insert_builds_once() {
        let cache = Cache::<&'static str, Vec<f64>>::new();
        let mut builds = 0;

        let first = cache
            .get_or_insert_with("1M", || {
                builds += 1;
                vec![1.0, 2.0]
            })
            .await;
        let second = cache
            .get_or_insert_with("1M", || {
                builds += 1;
                vec![9.0]
            })
            .await;

        assert_eq!(first, second);
        assert_eq!(builds, 1);
    }

    #[tokio::test]
    async fn test_clear_forces_rebuild() {
        let cache = Cache::<u8, u8>::new();
        assert_eq!(cache.get_or_insert_with(1, || 10).await, 10);
        assert_eq!(cache.get_or_insert_with(1, || 20).await, 10);

        cache.clear().await;
        assert_eq!(cache.get_or_insert_with(1, || 30).await, 30);
    }
}
