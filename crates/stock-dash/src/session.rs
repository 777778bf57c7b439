//! Per-browser session state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{DashboardError, Result};

/// Ordered set of symbols
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol; returns false if it was already present
    pub fn add(&mut self, symbol: impl Into<String>) -> bool {
        let symbol = symbol.into();
        if self.contains(&symbol) {
            return false;
        }
        self.symbols.push(symbol);
        true
    }

    /// Remove a symbol; returns false if it was not present
    pub fn remove(&mut self, symbol: &str) -> bool {
        if let Some(pos) = self.symbols.iter().position(|s| s == symbol) {
            self.symbols.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// State held for one browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSession {
    pub id: Uuid,
    pub watchlist: Watchlist,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl DashboardSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            watchlist: Watchlist::new(),
            created_at: now,
            last_active: now,
        }
    }

    pub fn update_activity(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        Utc::now() - self.last_active > max_age
    }

    pub fn watch(&mut self, symbol: impl Into<String>) -> bool {
        self.update_activity();
        self.watchlist.add(symbol)
    }

    pub fn unwatch(&mut self, symbol: &str) -> bool {
        self.update_activity();
        self.watchlist.remove(symbol)
    }
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory session store shared by request handlers
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, DashboardSession>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Existing live session for `id`, or a fresh one
    pub fn get_or_create(&self, id: Option<Uuid>) -> Result<DashboardSession> {
        self.update(id, |_| ()).map(|(session, ())| session)
    }

    pub fn get(&self, id: Uuid) -> Option<DashboardSession> {
        self.sessions.read().ok()?.get(&id).cloned()
    }

    pub fn set(&self, session: DashboardSession) -> Result<()> {
        self.sessions
            .write()
            .map_err(|e| DashboardError::Other(format!("Lock error: {e}")))?
            .insert(session.id, session);
        Ok(())
    }

    /// Load the session, apply `f`, and store the result.
    ///
    /// The write lock is held throughout, so concurrent updates to one
    /// session are applied one after another.
    pub fn update<T>(
        &self,
        id: Option<Uuid>,
        f: impl FnOnce(&mut DashboardSession) -> T,
    ) -> Result<(DashboardSession, T)> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|e| DashboardError::Other(format!("Lock error: {e}")))?;

        let live = id.filter(|id| {
            sessions
                .get(id)
                .is_some_and(|session| !session.is_expired(self.ttl))
        });
        let session = match live {
            Some(id) => sessions.entry(id).or_default(),
            None => {
                if let Some(id) = id {
                    sessions.remove(&id);
                }
                let session = DashboardSession::new();
                tracing::debug!(session = %session.id, "Created session");
                sessions.entry(session.id).or_insert(session)
            }
        };

        let out = f(session);
        session.update_activity();
        Ok((session.clone(), out))
    }

    pub fn delete(&self, id: Uuid) -> bool {
        self.sessions
            .write()
            .ok()
            .and_then(|mut sessions| sessions.remove(&id))
            .is_some()
    }

    /// Drop idle sessions; returns how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };

        let initial_count = sessions.len();
        sessions.retain(|_, session| !session.is_expired(self.ttl));
        initial_count - sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watchlist_has_set_semantics() {
        let mut watchlist = Watchlist::new();
        assert!(watchlist.add("TCS.NS"));
        assert!(watchlist.add("INFY.NS"));
        assert!(!watchlist.add("TCS.NS"));

        assert_eq!(watchlist.len(), 2);
        assert_eq!(watchlist.iter().collect::<Vec<_>>(), vec!["TCS.NS", "INFY.NS"]);
    }

    #[test]
    fn test_watchlist_remove() {
        let mut watchlist = Watchlist::new();
        watchlist.add("TCS.NS");
        assert!(watchlist.remove("TCS.NS"));
        assert!(!watchlist.remove("TCS.NS"));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn test_watchlist_serializes_as_array() {
        let mut watchlist = Watchlist::new();
        watchlist.add("TCS.NS");
        assert_eq!(serde_json::to_string(&watchlist).unwrap(), r#"["TCS.NS"]"#);
    }

    #[test]
    fn test_store_reuses_live_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        let first = store.get_or_create(None).unwrap();
        let again = store.get_or_create(Some(first.id)).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(store.active_count(), 1);

        let other = store.get_or_create(Some(Uuid::new_v4())).unwrap();
        assert_ne!(other.id, first.id);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_store_update_persists() {
        let store = SessionStore::new(Duration::from_secs(60));
        let (session, added) = store.update(None, |s| s.watch("TCS.NS")).unwrap();
        assert!(added);

        let (_, added_again) = store.update(Some(session.id), |s| s.watch("TCS.NS")).unwrap();
        assert!(!added_again);
        assert_eq!(store.get(session.id).unwrap().watchlist.len(), 1);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut stale = DashboardSession::new();
        stale.last_active = Utc::now() - chrono::Duration::minutes(5);
        store.set(stale.clone()).unwrap();
        store.get_or_create(None).unwrap();

        assert_eq!(store.cleanup_expired(), 1);
        assert!(store.get(stale.id).is_none());
        assert!(!store.delete(stale.id));
    }

    #[test]
    fn test_expired_session_is_replaced() {
        let store = SessionStore::new(Duration::from_secs(60));
        let mut stale = DashboardSession::new();
        stale.last_active = Utc::now() - chrono::Duration::minutes(5);
        store.set(stale.clone()).unwrap();

        let session = store.get_or_create(Some(stale.id)).unwrap();
        assert_ne!(session.id, stale.id);
        assert!(store.get(stale.id).is_none());
        assert_eq!(store.active_count(), 1);
    }

    #[test]
    fn test_concurrent_updates_keep_every_write() {
        const WRITERS: usize = 64;

        let store = SessionStore::new(Duration::from_secs(60));
        let id = store.get_or_create(None).unwrap().id;
        let barrier = std::sync::Barrier::new(WRITERS);

        std::thread::scope(|scope| {
            for i in 0..WRITERS {
                let (store, barrier) = (&store, &barrier);
                scope.spawn(move || {
                    barrier.wait();
                    let (session, added) = store
                        .update(Some(id), |s| s.watch(format!("S{i}.NS")))
                        .unwrap();
                    assert!(added);
                    assert_eq!(session.id, id);
                });
            }
        });

        let session = store.get(id).unwrap();
        assert_eq!(session.watchlist.len(), WRITERS);
        assert_eq!(store.active_count(), 1);
    }
}
