use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::debugger::Debugger;
use crate::session::DebuggerSession;

/// Indexed collection of active sessions.
///
/// Indexes are assigned sequentially and never reused.
pub struct SessionRegistry<D: Debugger> {
    inner: RwLock<Registry<D>>,
}

struct Registry<D: Debugger> {
    sessions: IndexMap<usize, Arc<DebuggerSession<D>>>,
    next_index: usize,
}

impl<D: Debugger> SessionRegistry<D> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Registry {
                sessions: IndexMap::new(),
                next_index: 0,
            }),
        }
    }

    /// Registers a session, and returns its index.
    pub fn register(&self, session: DebuggerSession<D>) -> usize {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let index = inner.next_index;
        inner.next_index += 1;
        inner.sessions.insert(index, Arc::new(session));

        tracing::debug!(index, "session registered");

        index
    }

    /// Returns the session registered at `index`, if any.
    pub fn lookup(&self, index: usize) -> Option<Arc<DebuggerSession<D>>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.sessions.get(&index).cloned()
    }

    /// Removes the session registered at `index`, and returns it.
    ///
    /// The session is not released.
    pub fn unregister(&self, index: usize) -> Option<Arc<DebuggerSession<D>>> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.sessions.shift_remove(&index)
    }

    /// Returns the number of registered sessions.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.sessions.len()
    }

    /// Returns whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the registered sessions, ordered by index.
    pub fn snapshot(&self) -> Vec<(usize, Arc<DebuggerSession<D>>)> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);

        inner
            .sessions
            .iter()
            .map(|(index, session)| (*index, session.clone()))
            .collect()
    }
}

impl<D: Debugger> Default for SessionRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}
