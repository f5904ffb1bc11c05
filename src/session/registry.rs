//! Live session registry
//!
//! Maps session identifiers to their shared handles. A session is present
//! exactly while its connection is open. DashMap provides sharded locking so
//! connection tasks never serialize on one another.

use std::sync::Arc;

use dashmap::DashMap;

use super::{SessionHandle, SessionId};

/// Concurrent map of open sessions, cheap to clone
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<SessionId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session; returns `false` if the identifier is already taken
    pub fn insert(&self, handle: Arc<SessionHandle>) -> bool {
        match self.sessions.entry(handle.id().to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a session, returning it only on the first removal
    pub fn remove(&self, id: &str) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
