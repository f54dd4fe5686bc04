//! In-memory session store.

use super::model::Session;
use crate::types::SessionId;
use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle to one stored session. Lock it to read or mutate.
pub(crate) type SessionSlot = Arc<Mutex<Session>>;

/// Active sessions keyed by id, plus the ids that ever received a code.
///
/// Each session sits behind its own async mutex so that a poll and a timer
/// racing on one id serialize, while unrelated ids never contend. Map shard
/// guards are only held for the duration of a lookup, never across an await.
#[derive(Debug, Default)]
pub(crate) struct SessionStore {
    sessions: DashMap<SessionId, SessionSlot>,
    succeeded: DashSet<SessionId>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Insert a new session. Returns `None` if the id is already present.
    pub(crate) fn insert(&self, session: Session) -> Option<SessionSlot> {
        match self.sessions.entry(session.id.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let slot = Arc::new(Mutex::new(session));
                vacant.insert(Arc::clone(&slot));
                Some(slot)
            }
        }
    }

    pub(crate) fn get(&self, id: &SessionId) -> Option<SessionSlot> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove the entry for `id` if it still holds `slot`.
    pub(crate) fn remove(&self, id: &SessionId, slot: &SessionSlot) -> bool {
        self.sessions
            .remove_if(id, |_, current| Arc::ptr_eq(current, slot))
            .is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    pub(crate) fn slots(&self) -> Vec<SessionSlot> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Record that `id` received a code. Returns true the first time.
    pub(crate) fn mark_succeeded(&self, id: &SessionId) -> bool {
        self.succeeded.insert(id.clone())
    }

    pub(crate) fn has_succeeded(&self, id: &SessionId) -> bool {
        self.succeeded.contains(id)
    }

    pub(crate) fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }
}
