//! TTL-bounded, request-coalescing cache over the feed pipeline.
//!
//! `get` serves a stored snapshot while it is younger than the TTL.
//! On a miss, exactly one refresh (fetch, decode, normalize) runs on
//! behalf of all concurrently waiting callers; every waiter observes that
//! refresh's single outcome. A failed refresh leaves the prior snapshot
//! untouched and is propagated to each waiter as-is.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::fetch::FeedSource;
use crate::normalize::{FeedSnapshot, normalize};
use crate::parser::parse_feed;

type RefreshOutcome = Result<Arc<FeedSnapshot>, Arc<FeedError>>;
type RefreshChannel = watch::Receiver<Option<RefreshOutcome>>;

pub struct FeedCache<S> {
    inner: Arc<Inner<S>>,
}

// Derived Clone would require S: Clone.
impl<S> Clone for FeedCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<S> {
    source: S,
    ttl: Duration,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    snapshot: Option<StoredSnapshot>,
    inflight: Option<RefreshChannel>,
}

struct StoredSnapshot {
    snapshot: Arc<FeedSnapshot>,
    captured_at: Instant,
}

impl<S: FeedSource + 'static> FeedCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Returns the current snapshot, refreshing from upstream if the
    /// stored one is missing or older than the TTL.
    ///
    /// Freshness check, attaching to an in-flight refresh, and starting
    /// a new one form a single decision under the state lock, so two
    /// racing callers can never trigger two upstream fetches.
    pub async fn get(&self) -> RefreshOutcome {
        let rx = {
            let mut state = self.inner.state.lock().await;

            if let Some(stored) = &state.snapshot {
                if stored.captured_at.elapsed() < self.inner.ttl {
                    debug!("serving cached snapshot");
                    return Ok(Arc::clone(&stored.snapshot));
                }
            }

            match &state.inflight {
                Some(rx) => rx.clone(),
                None => {
                    let (tx, rx) = watch::channel(None);
                    state.inflight = Some(rx.clone());
                    // The refresh runs as its own task so it completes
                    // even if the caller that started it is dropped.
                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move { inner.refresh(tx).await });
                    rx
                }
            }
        };

        await_outcome(rx).await
    }
}

impl<S: FeedSource> Inner<S> {
    async fn refresh(self: Arc<Self>, tx: watch::Sender<Option<RefreshOutcome>>) {
        let outcome = self.run_pipeline().await;

        {
            let mut state = self.state.lock().await;
            match &outcome {
                Ok(snapshot) => {
                    // Snapshot and capture time are replaced together so
                    // no caller sees a pair from two different refreshes.
                    state.snapshot = Some(StoredSnapshot {
                        snapshot: Arc::clone(snapshot),
                        captured_at: Instant::now(),
                    });
                }
                Err(err) => {
                    warn!(error = %err, "feed refresh failed");
                }
            }
            state.inflight = None;
        }

        // A send error just means no waiter is still listening.
        let _ = tx.send(Some(outcome));
    }

    async fn run_pipeline(&self) -> RefreshOutcome {
        let bytes = self.source.fetch().await.map_err(Arc::new)?;
        let feed = parse_feed(&bytes).map_err(Arc::new)?;
        let snapshot = normalize(&feed);
        info!(
            entities = snapshot.vehicles.len(),
            header_timestamp = snapshot.header_timestamp,
            "feed refreshed"
        );
        Ok(Arc::new(snapshot))
    }
}

/// Waits for the single published outcome of an in-flight refresh.
async fn await_outcome(mut rx: RefreshChannel) -> RefreshOutcome {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            // The refresh task publishes exactly once before dropping
            // the sender, so a closed channel still holds the outcome.
            return rx
                .borrow()
                .clone()
                .expect("refresh outcome published before channel close");
        }
    }
}
