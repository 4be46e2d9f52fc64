//! In-Memory Store
//!
//! Entry store, frequency index and expiry index held in process, with a
//! per-page version number standing in for a watched key.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::cache::{ExpiryIndex, FrequencyIndex, PageMeta, ScoredPage};
use crate::error::Result;
use crate::store::{Committed, PageStore, WriteBatch};

// == Memory Store ==
/// In-process [`PageStore`].
///
/// The mutex only covers the few map operations of a single call; it is never
/// held across an await or for the duration of a transaction.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    pages: HashMap<String, StoredPage>,
    hits: FrequencyIndex,
    expiry: ExpiryIndex,
    used: u64,
    last_version: u64,
}

#[derive(Debug)]
struct StoredPage {
    content: Bytes,
    size: u64,
    version: u64,
}

/// Watch handle: the page version seen by the watch, None if it was absent.
#[derive(Debug)]
pub struct MemoryGuard {
    url: String,
    version: Option<u64>,
}

// == Presence ==
/// Where a url currently appears; used to check that the three structures agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Presence {
    pub content: bool,
    pub score: Option<u64>,
    pub expires_at: Option<i64>,
}

impl Presence {
    /// All three present or all three absent.
    pub fn is_consistent(&self) -> bool {
        self.content == self.score.is_some() && self.content == self.expires_at.is_some()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports which structures hold `url`.
    pub fn presence(&self, url: &str) -> Presence {
        let state = self.state.lock();
        Presence {
            content: state.pages.contains_key(url),
            score: state.hits.score(url),
            expires_at: state.expiry.get(url),
        }
    }

    /// Frequency score of `url`.
    pub fn score(&self, url: &str) -> Option<u64> {
        self.state.lock().hits.score(url)
    }

    /// Number of live pages.
    pub fn len(&self) -> usize {
        self.state.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Urls of all live pages, unordered.
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().pages.keys().cloned().collect()
    }
}

#[async_trait]
impl PageStore for MemoryStore {
    type Guard = MemoryGuard;

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn watch(&self, url: &str) -> Result<(MemoryGuard, Option<PageMeta>)> {
        let state = self.state.lock();
        let page = state.pages.get(url);
        let meta = page.map(|page| PageMeta {
            size: page.size,
            expires_at: state.expiry.get(url).unwrap_or_default(),
        });
        let guard = MemoryGuard {
            url: url.to_string(),
            version: page.map(|page| page.version),
        };
        Ok((guard, meta))
    }

    async fn read_content(&self, guard: &mut MemoryGuard) -> Result<Option<Bytes>> {
        let state = self.state.lock();
        Ok(state
            .pages
            .get(&guard.url)
            .filter(|page| Some(page.version) == guard.version)
            .map(|page| page.content.clone()))
    }

    async fn is_current(&self, guard: &mut MemoryGuard) -> Result<bool> {
        let state = self.state.lock();
        Ok(state.pages.get(&guard.url).map(|page| page.version) == guard.version)
    }

    async fn release(&self, _guard: MemoryGuard) {}

    async fn commit(&self, guard: MemoryGuard, batch: WriteBatch) -> Result<Option<Committed>> {
        let mut state = self.state.lock();
        let state = &mut *state;
        let url = guard.url;

        if state.pages.get(&url).map(|page| page.version) != guard.version {
            return Ok(None);
        }

        let committed = match batch {
            WriteBatch::Put {
                content,
                size,
                expires_at,
            } => {
                state.last_version += 1;
                let page = StoredPage {
                    content,
                    size,
                    version: state.last_version,
                };
                let previous = state.pages.insert(url.clone(), page);
                let previous_size = previous.as_ref().map_or(0, |page| page.size);
                state.used = state.used.saturating_sub(previous_size) + size;
                state.hits.increment(&url);
                state.expiry.set(&url, expires_at);
                Committed {
                    created: previous.is_none(),
                }
            }
            WriteBatch::Touch => {
                // Only score changes; the version stays so concurrent readers don't conflict
                if state.pages.contains_key(&url) {
                    state.hits.increment(&url);
                }
                Committed { created: false }
            }
            WriteBatch::Delete => {
                if let Some(page) = state.pages.remove(&url) {
                    state.used = state.used.saturating_sub(page.size);
                    state.hits.remove(&url);
                    state.expiry.remove(&url);
                }
                Committed { created: false }
            }
        };

        Ok(Some(committed))
    }

    async fn top(&self, n: usize) -> Result<Vec<ScoredPage>> {
        Ok(self.state.lock().hits.top(n))
    }

    async fn least_accessed(&self, n: usize) -> Result<Vec<ScoredPage>> {
        Ok(self.state.lock().hits.lowest(n))
    }

    async fn expired(&self, now: i64) -> Result<Vec<String>> {
        Ok(self.state.lock().expiry.due(now))
    }

    async fn used_bytes(&self) -> Result<u64> {
        Ok(self.state.lock().used)
    }
}
