//! In-memory catalog cache
//!
//! Volatile and process-local; cleared on restart.
//! Uses Moka for concurrent TTL caching. Every catalog write must call
//! [`CatalogCache::invalidate`] so listings never outlive an admin edit.

use moka::future::Cache;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::models::{CatalogFilter, Material, Subject, Test};
use crate::error::AppError;

/// Catalog listing cache
///
/// Holds the subject list and the material/test listings per filter.
///
/// Every [`invalidate`](Self::invalidate) bumps `generation`; a load that
/// started under an older generation is returned to its caller but never
/// stored.
pub struct CatalogCache {
    subjects: Cache<(), Arc<Vec<Subject>>>,
    materials: Cache<CatalogFilter, Arc<Vec<Material>>>,
    tests: Cache<CatalogFilter, Arc<Vec<Test>>>,
    generation: AtomicU64,
}

fn record_lookup(cache_name: &str, hit: bool) {
    use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL};
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[cache_name]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[cache_name]).inc();
    }
}

async fn get_or_load<K, V, F>(
    cache: &Cache<K, Arc<V>>,
    generation: &AtomicU64,
    cache_name: &str,
    key: K,
    load: F,
) -> Result<Arc<V>, AppError>
where
    K: std::hash::Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    F: Future<Output = Result<V, AppError>>,
{
    // Read before the lookup so an invalidation during the load is seen
    let started = generation.load(Ordering::Acquire);
    if let Some(value) = cache.get(&key).await {
        record_lookup(cache_name, true);
        return Ok(value);
    }
    record_lookup(cache_name, false);

    let value = Arc::new(load.await?);
    cache.insert(key.clone(), value.clone()).await;
    // Checked after the insert: an invalidation after this point clears the
    // entry itself, one before it is caught here
    if generation.load(Ordering::Acquire) != started {
        cache.invalidate(&key).await;
        tracing::debug!(cache = cache_name, "Discarded listing loaded before invalidation");
    }
    Ok(value)
}

impl CatalogCache {
    /// Create new catalog cache
    ///
    /// # Arguments
    /// * `ttl` - Time to live of every entry
    pub fn new(ttl: Duration) -> Self {
        Self {
            subjects: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            materials: Cache::builder().max_capacity(256).time_to_live(ttl).build(),
            tests: Cache::builder().max_capacity(256).time_to_live(ttl).build(),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn subjects<F>(&self, load: F) -> Result<Arc<Vec<Subject>>, AppError>
    where
        F: Future<Output = Result<Vec<Subject>, AppError>>,
    {
        get_or_load(&self.subjects, &self.generation, "subjects", (), load).await
    }

    pub async fn materials<F>(
        &self,
        filter: &CatalogFilter,
        load: F,
    ) -> Result<Arc<Vec<Material>>, AppError>
    where
        F: Future<Output = Result<Vec<Material>, AppError>>,
    {
        get_or_load(&self.materials, &self.generation, "materials", filter.clone(), load).await
    }

    pub async fn tests<F>(&self, filter: &CatalogFilter, load: F) -> Result<Arc<Vec<Test>>, AppError>
    where
        F: Future<Output = Result<Vec<Test>, AppError>>,
    {
        get_or_load(&self.tests, &self.generation, "tests", filter.clone(), load).await
    }

    /// Drop every cached listing
    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.subjects.invalidate_all();
        self.materials.invalidate_all();
        self.tests.invalidate_all();
        tracing::debug!("Catalog cache invalidated");
    }
}
