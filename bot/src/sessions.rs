use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use passage_core::catalog::Catalog;
use passage_core::error::FlowError;
use passage_core::flow::{FlowEvent, SelectionSession, Transition};
use passage_core::session::{Clock, SessionKey, SessionStore, SystemClock};
use tokio::sync::Mutex;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// Per-session turn lock. Held from the moment an event is applied until its
/// re-render has been sent.
pub type Lane = Arc<Mutex<()>>;

/// Shared selection sessions plus one lane per open session.
pub struct SessionRegistry<C: Clock = SystemClock> {
    store: Mutex<SessionStore<C>>,
    lanes: Mutex<HashMap<SessionKey, Lane>>,
}

impl SessionRegistry<SystemClock> {
    pub fn new(timeout_secs: i64) -> Self {
        Self::with_clock(SystemClock, timeout_secs)
    }
}

impl<C: Clock> SessionRegistry<C> {
    pub fn with_clock(clock: C, timeout_secs: i64) -> Self {
        Self {
            store: Mutex::new(SessionStore::new(clock, Duration::seconds(timeout_secs))),
            lanes: Mutex::new(HashMap::new()),
        }
    }

    pub async fn open(&self, session: SelectionSession) -> SessionKey {
        self.store.lock().await.open(session)
    }

    pub async fn lane(&self, key: SessionKey) -> Lane {
        self.lanes.lock().await.entry(key).or_default().clone()
    }

    /// Apply an event. The lane is dropped once the session leaves the store
    /// (confirmed, expired or unknown); waiters still holding it will see
    /// `SessionNotFound`.
    pub async fn apply(
        &self,
        key: &SessionKey,
        event: &FlowEvent,
        catalog: &Catalog,
    ) -> Result<Transition, FlowError> {
        let result = self.store.lock().await.apply(key, event, catalog);
        let finished = match &result {
            Ok(step) => step.draft().is_some(),
            Err(_) => true,
        };
        if finished {
            self.lanes.lock().await.remove(key);
        }
        result
    }

    /// Evict idle sessions and their lanes. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let expired = self.store.lock().await.evict_expired();
        if !expired.is_empty() {
            let mut lanes = self.lanes.lock().await;
            for key in &expired {
                lanes.remove(key);
            }
        }
        expired.len()
    }
}

/// Background eviction loop; runs for the lifetime of the process.
pub async fn sweep_forever(registry: Arc<SessionRegistry>) {
    let mut tick = tokio::time::interval(StdDuration::from_secs(SWEEP_INTERVAL_SECS));
    loop {
        tick.tick().await;
        let evicted = registry.sweep().await;
        if evicted > 0 {
            tracing::debug!(evicted, "evicted idle selection sessions");
        }
    }
}
