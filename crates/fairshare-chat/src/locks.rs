use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async mutex per thread id
///
/// Entries nobody holds or waits on are pruned on the next acquisition, so
/// the map stays proportional to the number of busy threads.
#[derive(Default)]
pub(crate) struct ThreadLocks {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ThreadLocks {
    fn handle(&self, thread_id: &str) -> Arc<AsyncMutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(map.entry(thread_id.to_string()).or_default())
    }

    pub(crate) async fn acquire(&self, thread_id: &str) -> OwnedMutexGuard<()> {
        self.handle(thread_id).lock_owned().await
    }

    /// Acquire several locks in a stable order
    pub(crate) async fn acquire_many(&self, thread_ids: &[String]) -> Vec<OwnedMutexGuard<()>> {
        let mut ids: Vec<&String> = thread_ids.iter().collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            guards.push(self.acquire(id).await);
        }
        guards
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
