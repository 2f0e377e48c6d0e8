//! New-transaction feed over the shared cache.
//!
//! Each feed owns its cursor. A poll reads everything past the cursor, the
//! feed yields those ids one by one, then sleeps for the poll interval. The
//! first poll happens immediately.

use crate::domain::{FeedCursor, PendingTxCache};
use crate::ports::TransactionFeed;
use futures::StreamExt;
use parking_lot::Mutex;
use shared_types::TxId;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct FeedState {
    cache: Arc<Mutex<PendingTxCache>>,
    cursor: FeedCursor,
    buffer: VecDeque<TxId>,
    polled: bool,
    interval: Duration,
    cancel: CancellationToken,
    shutdown: CancellationToken,
}

impl FeedState {
    fn stopped(&self) -> bool {
        self.cancel.is_cancelled() || self.shutdown.is_cancelled()
    }
}

/// Build a feed that ends when either token fires.
pub(crate) fn cache_feed(
    cache: Arc<Mutex<PendingTxCache>>,
    cursor: FeedCursor,
    interval: Duration,
    cancel: CancellationToken,
    shutdown: CancellationToken,
) -> TransactionFeed {
    let state = FeedState {
        cache,
        cursor,
        buffer: VecDeque::new(),
        polled: false,
        interval,
        cancel,
        shutdown,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if st.stopped() {
                return None;
            }
            if let Some(id) = st.buffer.pop_front() {
                return Some((id, st));
            }
            if st.polled {
                tokio::select! {
                    _ = st.cancel.cancelled() => return None,
                    _ = st.shutdown.cancelled() => return None,
                    _ = tokio::time::sleep(st.interval) => {}
                }
            }
            st.polled = true;
            let (ids, next) = st.cache.lock().read_from(st.cursor);
            st.cursor = next;
            st.buffer.extend(ids);
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{p2pkh_script, raw_transaction as build_tx};
    use crate::domain::Transaction;
    use chrono::Utc;

    fn tx(n: u8) -> Transaction {
        Transaction::parse(&build_tx(&[(5_500, p2pkh_script(&[n; 20]))])).unwrap()
    }

    fn shared_cache(max: usize, batch: usize) -> Arc<Mutex<PendingTxCache>> {
        Arc::new(Mutex::new(PendingTxCache::new(max, batch)))
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_yields_existing_then_new() {
        let cache = shared_cache(100, 50);
        let first = tx(1);
        let second = tx(2);
        cache.lock().insert(first.clone(), Utc::now());

        let cancel = CancellationToken::new();
        let mut feed = cache_feed(
            Arc::clone(&cache),
            FeedCursor::Position(0),
            Duration::from_secs(5),
            cancel.clone(),
            CancellationToken::new(),
        );
        assert_eq!(feed.next().await, Some(first.txid));

        cache.lock().insert(second.clone(), Utc::now());
        // Arrives after one poll interval
        assert_eq!(feed.next().await, Some(second.txid));

        cancel.cancel();
        assert_eq!(feed.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_cursors() {
        let cache = shared_cache(100, 50);
        let first = tx(1);
        cache.lock().insert(first.clone(), Utc::now());
        let make = || {
            cache_feed(
                Arc::clone(&cache),
                FeedCursor::Position(0),
                Duration::from_secs(5),
                CancellationToken::new(),
                CancellationToken::new(),
            )
        };
        let mut a = make();
        let mut b = make();
        assert_eq!(a.next().await, Some(first.txid));
        assert_eq!(b.next().await, Some(first.txid));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_ends_feed() {
        let shutdown = CancellationToken::new();
        let mut feed = cache_feed(
            shared_cache(100, 50),
            FeedCursor::Position(0),
            Duration::from_secs(5),
            CancellationToken::new(),
            shutdown.clone(),
        );
        let waiter = tokio::spawn(async move { feed.next().await });
        tokio::task::yield_now().await;
        shutdown.cancel();
        assert_eq!(waiter.await.unwrap(), None);
    }
}
