use common::models::WeatherModel;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

struct CacheEntry {
    data: WeatherModel,
    fetched_at: Instant,
}

/// Recent weather results keyed by location.
///
/// Entries are never evicted; a refetch overwrites them.
pub struct WeatherCache {
    cache: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
}

impl WeatherCache {
    pub fn with_ttl(ttl_seconds: u64) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_seconds),
        }
    }

    pub async fn get(&self, location: &str) -> Option<WeatherModel> {
        let cache = self.cache.read().await;
        if let Some(entry) = cache.get(location)
            && entry.fetched_at + self.ttl > Instant::now()
        {
            return Some(entry.data.clone());
        }
        None
    }

    pub async fn set(&self, location: String, data: WeatherModel) {
        let mut cache = self.cache.write().await;
        cache.insert(
            location,
            CacheEntry {
                data,
                fetched_at: Instant::now(),
            },
        );
    }

    pub async fn fetched_at(&self, location: &str) -> Option<Instant> {
        self.cache.read().await.get(location).map(|e| e.fetched_at)
    }
}
