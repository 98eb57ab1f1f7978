use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::FlowError;
use crate::flow::{FlowEvent, SelectionSession, Stage, Transition, transition};
use crate::identity::MemberId;

/// Inactivity window after which a selection session is discarded.
pub const SESSION_TIMEOUT_SECS: i64 = 900;

/// Opaque session identifier, rendered as 32 hex chars inside control ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() != 32 {
            return None;
        }
        Uuid::try_parse(raw).ok().map(Self)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub requester: MemberId,
    pub session: SessionId,
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct Entry {
    session: SelectionSession,
    last_seen: DateTime<Utc>,
}

/// Open selection sessions keyed by `(requester, session)`.
///
/// The store is synchronous; callers serialize access per session so that a
/// transition and its re-render complete before the next event is applied.
#[derive(Debug)]
pub struct SessionStore<C: Clock> {
    clock: C,
    timeout: Duration,
    entries: HashMap<SessionKey, Entry>,
}

impl<C: Clock> SessionStore<C> {
    pub fn new(clock: C, timeout: Duration) -> Self {
        Self {
            clock,
            timeout,
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn open(&mut self, session: SelectionSession) -> SessionKey {
        self.evict_expired();
        let key = SessionKey {
            requester: session.requester(),
            session: session.id(),
        };
        let last_seen = self.clock.now();
        self.entries.insert(key, Entry { session, last_seen });
        key
    }

    pub fn get(&self, key: &SessionKey) -> Option<&SelectionSession> {
        let now = self.clock.now();
        self.entries
            .get(key)
            .filter(|entry| !self.is_expired(entry, now))
            .map(|entry| &entry.session)
    }

    /// Apply `event` to the session behind `key`. A confirmed session is
    /// removed from the store; an expired one is removed and reported.
    pub fn apply(
        &mut self,
        key: &SessionKey,
        event: &FlowEvent,
        catalog: &Catalog,
    ) -> Result<Transition, FlowError> {
        let now = self.clock.now();
        let entry = self.entries.remove(key).ok_or(FlowError::SessionNotFound)?;
        if self.is_expired(&entry, now) {
            return Err(FlowError::SessionExpired);
        }

        let step = transition(entry.session, event, catalog);
        if step.session.stage() != Stage::Confirmed {
            self.entries.insert(
                *key,
                Entry {
                    session: step.session.clone(),
                    last_seen: now,
                },
            );
        }
        Ok(step)
    }

    /// Drop every session idle for longer than the timeout. Returns the evicted keys.
    pub fn evict_expired(&mut self) -> Vec<SessionKey> {
        let now = self.clock.now();
        let expired: Vec<SessionKey> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| *key)
            .collect();
        for key in &expired {
            self.entries.remove(key);
        }
        expired
    }

    fn is_expired(&self, entry: &Entry, now: DateTime<Utc>) -> bool {
        now - entry.last_seen > self.timeout
    }
}
