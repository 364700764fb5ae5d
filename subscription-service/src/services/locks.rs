use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async mutual exclusion scoped by string key.
///
/// Guards read-then-write sequences (plan version minting, subscriber flag
/// recomputation) inside one process. Cross-process races are left to the
/// store's unique indexes.
/// Key shared by plan deletion and subscription writes naming that plan.
pub fn plan_reference_key(plan_id: &str) -> String {
    format!("plan-ref:{}", plan_id)
}

#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

/// Held lock for one key. Dropping it releases the key and forgets the
/// entry once nobody else holds or awaits it.
pub struct KeyedGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: &str) -> KeyedGuard {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        KeyedGuard {
            key: key.to_string(),
            locks: self.locks.clone(),
            guard: Some(mutex.lock_owned().await),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_exclusive() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("subscriber:SUBS000001").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock("subscriber:SUBS000001").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("lock was never released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock("plan:a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("plan:b"))
            .await
            .expect("distinct keys must not contend");
    }

    #[tokio::test]
    async fn test_released_keys_are_forgotten() {
        let locks = KeyedLocks::new();
        let held = locks.lock("held").await;
        drop(locks.lock("released").await);
        assert_eq!(locks.len(), 1);

        drop(held);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_until_done() {
        let locks = KeyedLocks::new();
        let guard = locks.lock("subscriber:SUBS000001").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.lock("subscriber:SUBS000001").await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);

        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("lock was never released")
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_many_keys_leave_no_entries() {
        let locks = KeyedLocks::new();
        for n in 0..200 {
            let _guard = locks.lock(&format!("subscriber:SUBS{:06}", n)).await;
        }
        assert!(locks.is_empty());
    }
}
