//! Store Module
//!
//! The capability set the cache engine needs from its backing store: per-page
//! field storage, sorted-score indices, and a watch / commit-if-unmodified
//! transaction primitive.
//!
//! # Backends
//! - [`MemoryStore`]: in-process maps, used by default and in tests
//! - [`RedisStore`]: external Redis server using `WATCH`/`MULTI`/`EXEC`

mod memory;
mod redis_store;

use async_trait::async_trait;
use bytes::Bytes;

use crate::cache::{PageMeta, ScoredPage};
use crate::error::Result;

pub use memory::{MemoryGuard, MemoryStore, Presence};
pub use redis_store::{KeySpace, RedisGuard, RedisStore};

// == Write Batch ==
/// The writes staged by one transaction, applied all-or-nothing on commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteBatch {
    /// Set content, size and expiry, and add one to the frequency score.
    Put {
        content: Bytes,
        size: u64,
        expires_at: i64,
    },
    /// Add one to the frequency score of a live page.
    Touch,
    /// Drop content and both scores.
    Delete,
}

// == Committed ==
/// Outcome of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Committed {
    /// True when a `Put` created the content field rather than overwriting it
    pub created: bool,
}

// == Page Store ==
/// Backing store for the cache engine.
///
/// Every mutation goes through [`PageStore::watch`] followed by
/// [`PageStore::commit`] or [`PageStore::release`]. A commit returns `Ok(None)`
/// when the watched page was modified in between; the caller is expected to
/// start over.
#[async_trait]
pub trait PageStore: Send + Sync + 'static {
    /// Transaction handle tying a commit to the state observed by a watch.
    type Guard: Send;

    /// Liveness check.
    async fn ping(&self) -> Result<()>;

    /// Starts watching `url` and returns its current metadata.
    async fn watch(&self, url: &str) -> Result<(Self::Guard, Option<PageMeta>)>;

    /// Reads the content of the watched page. `None` if it is absent or no
    /// longer matches the watched state.
    async fn read_content(&self, guard: &mut Self::Guard) -> Result<Option<Bytes>>;

    /// True while the watched page still matches the state the watch observed.
    async fn is_current(&self, guard: &mut Self::Guard) -> Result<bool>;

    /// Ends a transaction without writing anything.
    async fn release(&self, guard: Self::Guard);

    /// Applies `batch` atomically if the watched page is unmodified.
    async fn commit(&self, guard: Self::Guard, batch: WriteBatch) -> Result<Option<Committed>>;

    /// `n` highest frequency scores, descending.
    async fn top(&self, n: usize) -> Result<Vec<ScoredPage>>;

    /// `n` lowest frequency scores, ascending.
    async fn least_accessed(&self, n: usize) -> Result<Vec<ScoredPage>>;

    /// Urls whose expiry is at or before `now`.
    async fn expired(&self, now: i64) -> Result<Vec<String>>;

    /// Sum of the accounted sizes of all live pages.
    async fn used_bytes(&self) -> Result<u64>;
}
