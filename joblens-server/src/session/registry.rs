//! Session registry
//!
//! Maps authenticated identity to in-memory session state. Sessions are
//! created lazily on first access and removed only on explicit logout;
//! there is no TTL-based expiry. The registry is an owned value injected
//! through application state, not a process-wide global.

use super::bus::LogBus;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Per-identity in-memory state bundle
pub struct Session {
    pub identity: String,
    /// Log fan-out for this session's streaming clients
    pub bus: LogBus,
    /// Held for the duration of one update run; a second concurrent run for
    /// the same identity fails to acquire it and is rejected.
    pub run_lock: tokio::sync::Mutex<()>,
}

impl Session {
    fn new(identity: String) -> Self {
        Self {
            identity,
            bus: LogBus::default(),
            run_lock: tokio::sync::Mutex::new(()),
        }
    }
}

/// Owner of the identity-to-session mapping.
///
/// Mutated from both the serving loop (subscribe, logout) and worker-side
/// request tasks, so the map sits behind an RwLock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `identity`, creating an empty one on first call
    pub fn get_or_create(&self, identity: &str) -> Arc<Session> {
        if let Some(session) = self
            .sessions
            .read()
            .expect("session registry lock poisoned")
            .get(identity)
        {
            return Arc::clone(session);
        }

        let mut sessions = self
            .sessions
            .write()
            .expect("session registry lock poisoned");
        // A racing request may have created it between the two locks.
        Arc::clone(
            sessions
                .entry(identity.to_string())
                .or_insert_with(|| {
                    debug!(identity, "Creating session");
                    Arc::new(Session::new(identity.to_string()))
                }),
        )
    }

    /// Look up an existing session without creating one
    pub fn get(&self, identity: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .get(identity)
            .map(Arc::clone)
    }

    /// Discard the session for `identity`.
    ///
    /// Any live subscribers are discarded with it; their streams end when
    /// the last sender is dropped.
    pub fn remove(&self, identity: &str) -> bool {
        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .remove(identity)
            .is_some()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
