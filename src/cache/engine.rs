//! Cache Engine Module
//!
//! Composes the entry store, frequency index and expiry index behind per-page
//! optimistic transactions, with the capacity controller running on every upsert.

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::cache::{
    current_timestamp, Budget, CacheStats, EvictionPolicy, LeastFrequent, PageEntry, RetryPolicy,
    ScoredPage, EVICTION_SCAN,
};
use crate::error::{CacheError, Result};
use crate::store::{PageStore, WriteBatch};

// == Cache Engine ==
/// Page cache over a [`PageStore`].
///
/// There is no engine-wide lock. Each mutating operation watches one url,
/// stages its writes and commits only if nothing touched that url meanwhile;
/// a conflicting commit restarts the whole operation.
pub struct CacheEngine<S> {
    store: S,
    budget: Budget,
    /// Seconds added to now for entries without an explicit ttl
    default_ttl: u64,
    eviction: Box<dyn EvictionPolicy>,
    retry: RetryPolicy,
    stats: CacheStats,
}

impl<S: PageStore> CacheEngine<S> {
    // == Constructor ==
    /// Creates an engine with the least-frequent eviction policy and unbounded retries.
    ///
    /// # Arguments
    /// * `store` - Backing store, already connected
    /// * `capacity` - Byte budget for all live pages
    /// * `default_ttl` - TTL in seconds for entries upserted without one
    pub fn new(store: S, capacity: u64, default_ttl: u64) -> Self {
        Self {
            store,
            budget: Budget::new(capacity),
            default_ttl,
            eviction: Box::new(LeastFrequent),
            retry: RetryPolicy::default(),
            stats: CacheStats::new(),
        }
    }

    pub fn with_eviction_policy(mut self, policy: impl EvictionPolicy + 'static) -> Self {
        self.eviction = Box::new(policy);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn capacity(&self) -> u64 {
        self.budget.capacity
    }

    // == Get ==
    /// Returns the content of `url` and adds one to its frequency score.
    ///
    /// Content and score increment come from the same transaction, so a
    /// concurrent upsert or remove is seen entirely or not at all.
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (mut guard, meta) = self.store.watch(url).await?;
            if meta.is_none() {
                self.store.release(guard).await;
                self.stats.record_miss();
                return Err(CacheError::NotFound(url.to_string()));
            }

            let Some(content) = self.store.read_content(&mut guard).await? else {
                self.store.release(guard).await;
                self.on_conflict("get", url, attempts).await?;
                continue;
            };

            match self.store.commit(guard, WriteBatch::Touch).await? {
                Some(_) => {
                    self.stats.record_hit();
                    return Ok(content);
                }
                None => self.on_conflict("get", url, attempts).await?,
            }
        }
    }

    // == Upsert ==
    /// Stores `entry`, creating or overwriting its page.
    ///
    /// Makes room through the capacity controller first, then writes content,
    /// score increment and expiry in one commit. Returns true when the write
    /// created the content rather than replacing it.
    pub async fn upsert(&self, entry: PageEntry) -> Result<bool> {
        if !self.budget.admits(entry.total_size) {
            return Err(CacheError::CapacityError {
                requested: entry.total_size,
                capacity: self.budget.capacity,
            });
        }
        let expires_at = entry.expires_at(self.default_ttl);

        let mut attempts = 0;
        loop {
            attempts += 1;
            let (mut guard, current) = self.store.watch(&entry.url).await?;
            let previous = current.map_or(0, |meta| meta.size);
            let room = self
                .ensure_capacity(&mut guard, &entry.url, previous, entry.total_size)
                .await?;
            if !room {
                // The page changed under the watch, so `previous` is stale
                self.store.release(guard).await;
                self.on_conflict("upsert", &entry.url, attempts).await?;
                continue;
            }

            let batch = WriteBatch::Put {
                content: entry.content.clone(),
                size: entry.total_size,
                expires_at,
            };
            match self.store.commit(guard, batch).await? {
                Some(committed) => {
                    debug!(url = %entry.url, size = entry.total_size, created = committed.created, "Upserted page");
                    return Ok(committed.created);
                }
                None => self.on_conflict("upsert", &entry.url, attempts).await?,
            }
        }
    }

    // == Remove ==
    /// Deletes `url` from all three structures and returns its accounted size.
    pub async fn remove(&self, url: &str) -> Result<u64> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (guard, current) = self.store.watch(url).await?;
            let Some(meta) = current else {
                self.store.release(guard).await;
                return Err(CacheError::NotFound(url.to_string()));
            };

            match self.store.commit(guard, WriteBatch::Delete).await? {
                Some(_) => return Ok(meta.size),
                None => self.on_conflict("remove", url, attempts).await?,
            }
        }
    }

    // == Top ==
    /// The `n` most accessed pages, highest score first.
    pub async fn top(&self, n: usize) -> Result<Vec<ScoredPage>> {
        self.store.top(n).await
    }

    // == Expire Sweep ==
    /// Removes every page whose expiry is at or before now.
    ///
    /// Each page is re-checked under its own watch, so one refreshed or
    /// removed since the scan is left alone. A page whose removal fails is
    /// logged and skipped. Returns the bytes freed.
    pub async fn expire_sweep(&self) -> Result<u64> {
        let now = current_timestamp();
        let due = self.store.expired(now).await?;

        let mut freed = 0;
        let mut removed = 0;
        for url in due {
            match self.expire_page(&url, now).await {
                Ok(Some(size)) => {
                    freed += size;
                    removed += 1;
                }
                Ok(None) => debug!(url = %url, "Page no longer due, skipped"),
                Err(err) => warn!(url = %url, error = %err, "Failed to remove expired page"),
            }
        }

        self.stats.record_expired(removed);
        Ok(freed)
    }

    /// Deletes `url` if its expiry is still at or before `now`.
    ///
    /// Returns the bytes freed, or None when the page is gone or carries a
    /// later expiry than the one the sweep scanned.
    async fn expire_page(&self, url: &str, now: i64) -> Result<Option<u64>> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let (guard, current) = self.store.watch(url).await?;
            let meta = match current {
                Some(meta) if meta.expires_at <= now => meta,
                _ => {
                    self.store.release(guard).await;
                    return Ok(None);
                }
            };

            match self.store.commit(guard, WriteBatch::Delete).await? {
                Some(_) => return Ok(Some(meta.size)),
                None => self.on_conflict("expire", url, attempts).await?,
            }
        }
    }

    // == Ensure Capacity ==
    /// Evicts pages until replacing `previous` bytes of `url` with `incoming`
    /// bytes fits the budget.
    ///
    /// Returns false without evicting when `url` itself was modified since
    /// `guard` watched it, since `previous` no longer describes it.
    async fn ensure_capacity(
        &self,
        guard: &mut S::Guard,
        url: &str,
        previous: u64,
        incoming: u64,
    ) -> Result<bool> {
        loop {
            let used = self.store.used_bytes().await?;
            if self.budget.fits(used, previous, incoming) {
                return Ok(true);
            }
            if !self.store.is_current(guard).await? {
                return Ok(false);
            }

            let candidates = self.store.least_accessed(EVICTION_SCAN).await?;
            let Some(victim) = self.eviction.select_victim(&candidates, url) else {
                return Err(CacheError::CapacityError {
                    requested: incoming,
                    capacity: self.budget.capacity,
                });
            };

            match self.remove(&victim.url).await {
                Ok(freed) => {
                    self.stats.record_eviction();
                    info!(
                        victim = %victim.url,
                        score = victim.score,
                        freed,
                        policy = self.eviction.name(),
                        "Evicted page to admit {}",
                        url
                    );
                }
                // Already gone: re-measure and pick again
                Err(CacheError::NotFound(_)) => {}
                Err(err) => return Err(err),
            }
        }
    }

    // == On Conflict ==
    /// Records a lost optimistic race and waits out the backoff, or gives up
    /// once the retry policy is exhausted.
    async fn on_conflict(&self, operation: &str, url: &str, attempts: u32) -> Result<()> {
        self.stats.record_conflict();
        if self.retry.exhausted(attempts) {
            return Err(CacheError::ConflictRetryExhausted {
                url: url.to_string(),
                attempts,
            });
        }

        warn!("Concurrent modification during {} of {}, retry", operation, url);
        let backoff = self.retry.backoff(attempts);
        if !backoff.is_zero() {
            tokio::time::sleep(backoff).await;
        }
        Ok(())
    }
}
