//! In-memory remote store with failure injection.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::{BoxFuture, RemoteStore, StoreError};
use crate::location::LocationSample;

#[derive(Debug, Default)]
struct MemoryStoreInner {
    samples: Vec<LocationSample>,
    offline: bool,
    fail_next: u32,
    /// Per-call outcomes consumed before `offline`/`fail_next` are considered.
    script: VecDeque<bool>,
    single_calls: u64,
    batch_calls: u64,
    remove_calls: u64,
}

impl MemoryStoreInner {
    /// Decide the outcome of the next call.
    fn next_outcome(&mut self) -> Result<(), StoreError> {
        if let Some(ok) = self.script.pop_front() {
            return if ok {
                Ok(())
            } else {
                Err(StoreError::Unreachable("scripted failure".to_string()))
            };
        }
        if self.offline {
            return Err(StoreError::Unreachable("store is offline".to_string()));
        }
        if self.fail_next > 0 {
            self.fail_next -= 1;
            return Err(StoreError::Unreachable("injected failure".to_string()));
        }
        Ok(())
    }
}

/// Remote store held in process memory.
///
/// Behaves like a real store that can go offline: failures are injected
/// with [`set_offline`](Self::set_offline), [`fail_next`](Self::fail_next)
/// or a per-call [`script`](Self::script). `remove_outdated` always succeeds
/// so stale cleanup never masks the outcome under test.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

impl MemoryStore {
    /// Create an empty, online store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every add until switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    /// Fail the next `n` add calls.
    pub fn fail_next(&self, n: u32) {
        self.inner.lock().fail_next = n;
    }

    /// Queue explicit outcomes (`true` = success) for upcoming add calls.
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.inner.lock().script.extend(outcomes);
    }

    /// Everything stored so far, in arrival order.
    pub fn samples(&self) -> Vec<LocationSample> {
        self.inner.lock().samples.clone()
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `add_location` calls, successful or not.
    pub fn single_calls(&self) -> u64 {
        self.inner.lock().single_calls
    }

    /// Number of `add_locations` calls, successful or not.
    pub fn batch_calls(&self) -> u64 {
        self.inner.lock().batch_calls
    }

    /// Number of `remove_outdated` calls.
    pub fn remove_calls(&self) -> u64 {
        self.inner.lock().remove_calls
    }
}

impl RemoteStore for MemoryStore {
    fn add_location<'a>(&'a self, sample: &'a LocationSample) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            inner.single_calls += 1;
            inner.next_outcome()?;
            inner.samples.push(*sample);
            Ok(())
        })
    }

    fn add_locations<'a>(
        &'a self,
        samples: &'a [LocationSample],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            inner.batch_calls += 1;
            inner.next_outcome()?;
            inner.samples.extend_from_slice(samples);
            Ok(())
        })
    }

    fn remove_outdated(&self, before_ms: i64) -> BoxFuture<'_, Result<Option<u64>, StoreError>> {
        Box::pin(async move {
            let mut inner = self.inner.lock();
            inner.remove_calls += 1;
            let before = inner.samples.len();
            inner.samples.retain(|s| s.timestamp_ms >= before_ms);
            Ok(Some((before - inner.samples.len()) as u64))
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: i64) -> LocationSample {
        LocationSample::new(53.5, 10.0, ts)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let store = MemoryStore::new();
        store.add_location(&sample(1)).await.unwrap();
        store
            .add_locations(&[sample(2), sample(3)])
            .await
            .unwrap();

        let stored: Vec<i64> = store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stored, vec![1, 2, 3]);
        assert_eq!(store.single_calls(), 1);
        assert_eq!(store.batch_calls(), 1);
    }

    #[tokio::test]
    async fn test_offline_rejects_and_stores_nothing() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.add_location(&sample(1)).await.is_err());
        assert!(store.add_locations(&[sample(2), sample(3)]).await.is_err());
        assert!(store.is_empty());

        store.set_offline(false);
        assert!(store.add_location(&sample(4)).await.is_ok());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_counts_down() {
        let store = MemoryStore::new();
        store.fail_next(2);
        assert!(store.add_location(&sample(1)).await.is_err());
        assert!(store.add_location(&sample(2)).await.is_err());
        assert!(store.add_location(&sample(3)).await.is_ok());
    }

    #[tokio::test]
    async fn test_script_takes_precedence() {
        let store = MemoryStore::new();
        store.set_offline(true);
        store.script([true, false]);
        assert!(store.add_location(&sample(1)).await.is_ok());
        assert!(store.add_location(&sample(2)).await.is_err());
        // Script exhausted, offline applies again
        assert!(store.add_location(&sample(3)).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_outdated() {
        let store = MemoryStore::new();
        store
            .add_locations(&[sample(10), sample(20), sample(30)])
            .await
            .unwrap();

        let removed = store.remove_outdated(20).await.unwrap();
        assert_eq!(removed, Some(1));
        let remaining: Vec<i64> = store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(remaining, vec![20, 30]);
    }
}
