//! Per-(user, asset) serialization for balance work.
//!
//! The admission check and the recalculator both run a read-sum-then-write
//! sequence with no transactional guard. Holding the pair lock across the
//! whole sequence keeps two concurrent withdrawals from both reading the
//! same available balance, and keeps concurrent recalculations from
//! interleaving their create/delete decisions.

use crate::domain::{AssetId, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lazily-created async mutexes keyed by (user, asset).
///
/// Locks are never removed; the key space is bounded by users x assets.
#[derive(Default)]
pub struct PairLocks {
    inner: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl PairLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a (user, asset) pair, creating it on first use.
    /// The guard is owned, so it can be held across await points.
    pub async fn lock(&self, user_id: &UserId, asset_id: &AssetId) -> OwnedMutexGuard<()> {
        let key = (user_id.as_str().to_string(), asset_id.as_str().to_string());
        let pair_lock = {
            let mut map = self.inner.lock().await;
            map.entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        pair_lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_pair_serializes() {
        let locks = Arc::new(PairLocks::new());
        let user = UserId::new("u1");
        let asset = AssetId::new("a1");

        let guard = locks.lock(&user, &asset).await;

        let locks2 = locks.clone();
        let user2 = user.clone();
        let asset2 = asset.clone();
        let contender = tokio::spawn(async move {
            let _g = locks2.lock(&user2, &asset2).await;
        });

        // The second lock cannot complete while the first guard is held.
        tokio::task::yield_now().await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_pairs_do_not_block() {
        let locks = PairLocks::new();
        let _g1 = locks.lock(&UserId::new("u1"), &AssetId::new("a1")).await;
        let _g2 = locks.lock(&UserId::new("u1"), &AssetId::new("a2")).await;
        let _g3 = locks.lock(&UserId::new("u2"), &AssetId::new("a1")).await;
    }
}
