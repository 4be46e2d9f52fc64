//! Expiry Sweep Task
//!
//! Background task that periodically removes expired pages.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::CacheEngine;
use crate::store::PageStore;

/// Spawns a background task that runs the expiry sweep every `interval_secs`.
///
/// A failed sweep (store unreachable) is logged and retried on the next tick;
/// it never ends the task.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let engine = Arc::new(CacheEngine::new(MemoryStore::new(), 1 << 20, 300));
/// let sweep_handle = spawn_sweep_task(engine.clone(), 1);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<S: PageStore>(
    engine: Arc<CacheEngine<S>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match engine.expire_sweep().await {
                Ok(0) => debug!("Expiry sweep: nothing to remove"),
                Ok(freed) => info!("Expiry sweep: freed {} bytes", freed),
                Err(err) => warn!(error = %err, "Expiry sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{current_timestamp, PageEntry};
    use crate::store::MemoryStore;

    fn engine() -> Arc<CacheEngine<MemoryStore>> {
        Arc::new(CacheEngine::new(MemoryStore::new(), 1 << 20, 300))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_pages() {
        let engine = engine();
        engine
            .upsert(PageEntry::new("expire_soon", "value", Some(current_timestamp())))
            .await
            .unwrap();

        let handle = spawn_sweep_task(engine.clone(), 1);

        // Wait for the first tick to run
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(!engine.store().presence("expire_soon").content);
        assert!(engine.store().presence("expire_soon").is_consistent());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_live_pages() {
        let engine = engine();
        engine
            .upsert(PageEntry::new("long_lived", "value", Some(current_timestamp() + 3600)))
            .await
            .unwrap();

        let handle = spawn_sweep_task(engine.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let content = engine.get("long_lived").await.unwrap();
        assert_eq!(content, bytes::Bytes::from_static(b"value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let handle = spawn_sweep_task(engine(), 1);

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
