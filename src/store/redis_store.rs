//! Redis Store
//!
//! Pages live in one hash per url (`content`, `size`, `ttl` fields), scores in
//! the `hits` and `ttl` sorted sets, and the byte total in the `used` counter.
//! Transactions `WATCH` the page hash on a connection of their own and commit
//! with `MULTI`/`EXEC`, which Redis aborts if the hash changed.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::{debug, info};

use crate::cache::{PageMeta, ScoredPage};
use crate::error::Result;
use crate::store::{Committed, PageStore, WriteBatch};

/// Maximum number of idle transaction connections kept for reuse
const TX_POOL_SIZE: usize = 16;

// == Key Space ==
/// Redis key names under a common prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn page(&self, url: &str) -> String {
        format!("{}:page:{}", self.prefix, url)
    }

    pub fn hits(&self) -> String {
        format!("{}:hits", self.prefix)
    }

    pub fn ttl(&self) -> String {
        format!("{}:ttl", self.prefix)
    }

    pub fn used(&self) -> String {
        format!("{}:used", self.prefix)
    }
}

// == Redis Store ==
pub struct RedisStore {
    client: Client,
    /// Shared connection for reads outside transactions
    conn: MultiplexedConnection,
    /// Transaction connections with no pending `WATCH`. A guard owns its
    /// connection exclusively until it is committed or released.
    idle: Mutex<Vec<MultiplexedConnection>>,
    keys: KeySpace,
}

/// Watch handle: the connection holding the `WATCH` and the page metadata it saw.
pub struct RedisGuard {
    url: String,
    conn: MultiplexedConnection,
    observed: Option<PageMeta>,
}

impl RedisStore {
    // == Connect ==
    /// Connects to `host:port` and pings the server.
    ///
    /// Any failure is returned as `StoreUnavailable`; no reconnect is attempted.
    pub async fn connect(host: &str, port: u16, prefix: impl Into<String>) -> Result<Self> {
        let client = Client::open(format!("redis://{}:{}/", host, port))?;
        let conn = client.get_multiplexed_async_connection().await?;
        let store = Self {
            client,
            conn,
            idle: Mutex::new(Vec::with_capacity(TX_POOL_SIZE)),
            keys: KeySpace::new(prefix),
        };
        store.ping().await?;
        info!("Connected to Redis at {}:{}", host, port);
        Ok(store)
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    /// Takes an idle transaction connection, opening a new one if none is left.
    async fn checkout(&self) -> Result<MultiplexedConnection> {
        let pooled = self.idle.lock().pop();
        match pooled {
            Some(conn) => Ok(conn),
            None => Ok(self.client.get_multiplexed_async_connection().await?),
        }
    }

    /// Returns a connection whose `WATCH` has been cleared by `EXEC` or `UNWATCH`.
    fn checkin(&self, conn: MultiplexedConnection) {
        let mut idle = self.idle.lock();
        if idle.len() < TX_POOL_SIZE {
            idle.push(conn);
        }
    }

    async fn read_meta(&self, conn: &mut MultiplexedConnection, url: &str) -> Result<Option<PageMeta>> {
        let (size, expires_at): (Option<u64>, Option<i64>) = redis::cmd("HMGET")
            .arg(self.keys.page(url))
            .arg("size")
            .arg("ttl")
            .query_async(conn)
            .await?;

        Ok(match (size, expires_at) {
            (Some(size), Some(expires_at)) => Some(PageMeta { size, expires_at }),
            _ => None,
        })
    }

    async fn ranked(&self, command: &str, n: usize) -> Result<Vec<ScoredPage>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let ranked: Vec<(String, f64)> = redis::cmd(command)
            .arg(self.keys.hits())
            .arg(0)
            .arg(range_stop(n))
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?;
        Ok(ranked
            .into_iter()
            .map(|(url, score)| ScoredPage::new(url, score as u64))
            .collect())
    }
}

/// Inclusive stop index selecting the first `n` members of a sorted set.
fn range_stop(n: usize) -> isize {
    (n.min(isize::MAX as usize) as isize) - 1
}

#[async_trait]
impl PageStore for RedisStore {
    type Guard = RedisGuard;

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn watch(&self, url: &str) -> Result<(RedisGuard, Option<PageMeta>)> {
        // WATCH is connection state, so each transaction gets its own connection
        let mut conn = self.checkout().await?;
        let _: () = redis::cmd("WATCH")
            .arg(self.keys.page(url))
            .query_async(&mut conn)
            .await?;
        let observed = self.read_meta(&mut conn, url).await?;

        let guard = RedisGuard {
            url: url.to_string(),
            conn,
            observed,
        };
        Ok((guard, observed))
    }

    async fn read_content(&self, guard: &mut RedisGuard) -> Result<Option<Bytes>> {
        let content: Option<Vec<u8>> = redis::cmd("HGET")
            .arg(self.keys.page(&guard.url))
            .arg("content")
            .query_async(&mut guard.conn)
            .await?;
        Ok(content.map(Bytes::from))
    }

    async fn is_current(&self, guard: &mut RedisGuard) -> Result<bool> {
        let url = guard.url.clone();
        let meta = self.read_meta(&mut guard.conn, &url).await?;
        Ok(meta == guard.observed)
    }

    async fn release(&self, guard: RedisGuard) {
        let mut conn = guard.conn;
        let unwatched: redis::RedisResult<()> = redis::cmd("UNWATCH").query_async(&mut conn).await;
        match unwatched {
            Ok(()) => self.checkin(conn),
            Err(err) => debug!(error = %err, "Dropping transaction connection"),
        }
    }

    async fn commit(&self, guard: RedisGuard, batch: WriteBatch) -> Result<Option<Committed>> {
        let RedisGuard {
            url,
            mut conn,
            observed,
        } = guard;
        let page = self.keys.page(&url);
        let mut pipe = redis::pipe();
        pipe.atomic();

        let committed = match batch {
            WriteBatch::Put {
                content,
                size,
                expires_at,
            } => {
                let delta = size as i64 - observed.map_or(0, |meta| meta.size as i64);
                pipe.cmd("HSET")
                    .arg(&page)
                    .arg("content")
                    .arg(&content[..])
                    .cmd("HSET")
                    .arg(&page)
                    .arg("size")
                    .arg(size)
                    .arg("ttl")
                    .arg(expires_at)
                    .ignore()
                    .cmd("ZINCRBY")
                    .arg(self.keys.hits())
                    .arg(1)
                    .arg(&url)
                    .ignore()
                    .cmd("ZADD")
                    .arg(self.keys.ttl())
                    .arg(expires_at)
                    .arg(&url)
                    .ignore()
                    .cmd("INCRBY")
                    .arg(self.keys.used())
                    .arg(delta)
                    .ignore();

                // Only the content HSET reply is kept: the number of fields it created
                let reply: Option<Vec<i64>> = pipe.query_async(&mut conn).await?;
                reply.map(|created| Committed {
                    created: created.first().copied().unwrap_or(0) > 0,
                })
            }
            WriteBatch::Touch => {
                if observed.is_none() {
                    let _: () = redis::cmd("UNWATCH").query_async(&mut conn).await?;
                    self.checkin(conn);
                    return Ok(Some(Committed { created: false }));
                }
                pipe.cmd("ZINCRBY")
                    .arg(self.keys.hits())
                    .arg(1)
                    .arg(&url)
                    .ignore();

                let reply: Option<()> = pipe.query_async(&mut conn).await?;
                reply.map(|_| Committed { created: false })
            }
            WriteBatch::Delete => {
                let size = observed.map_or(0, |meta| meta.size);
                pipe.cmd("DEL")
                    .arg(&page)
                    .ignore()
                    .cmd("ZREM")
                    .arg(self.keys.hits())
                    .arg(&url)
                    .ignore()
                    .cmd("ZREM")
                    .arg(self.keys.ttl())
                    .arg(&url)
                    .ignore()
                    .cmd("DECRBY")
                    .arg(self.keys.used())
                    .arg(size)
                    .ignore();

                let reply: Option<()> = pipe.query_async(&mut conn).await?;
                reply.map(|_| Committed { created: false })
            }
        };

        // EXEC clears the WATCH whether or not the transaction ran
        self.checkin(conn);
        Ok(committed)
    }

    async fn top(&self, n: usize) -> Result<Vec<ScoredPage>> {
        self.ranked("ZREVRANGE", n).await
    }

    async fn least_accessed(&self, n: usize) -> Result<Vec<ScoredPage>> {
        self.ranked("ZRANGE", n).await
    }

    async fn expired(&self, now: i64) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        let urls: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(self.keys.ttl())
            .arg("-inf")
            .arg(now)
            .query_async(&mut conn)
            .await?;
        Ok(urls)
    }

    async fn used_bytes(&self) -> Result<u64> {
        let mut conn = self.conn.clone();
        let used: Option<i64> = redis::cmd("GET")
            .arg(self.keys.used())
            .query_async(&mut conn)
            .await?;
        Ok(used.unwrap_or(0).max(0) as u64)
    }
}
