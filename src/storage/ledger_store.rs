//! Durable session collection: one serialized blob holding every session.

use std::collections::HashSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{common::position_by_id, Session};
use crate::errors::{Result, TinError};

use super::StorageBackend;

/// Key the session blob is stored under.
pub const DEFAULT_STORE_KEY: &str = "cookie-tin-v1";

pub struct LedgerStore {
    backend: Box<dyn StorageBackend>,
    key: String,
}

impl LedgerStore {
    pub fn new(backend: Box<dyn StorageBackend>) -> Self {
        Self::with_key(backend, DEFAULT_STORE_KEY)
    }

    pub fn with_key(backend: Box<dyn StorageBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the collection, failing soft: absent data is an empty collection and
    /// unreadable data is logged and replaced by an empty collection.
    pub fn load(&self) -> Vec<Session> {
        match self.try_load() {
            Ok(sessions) => sessions,
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding unreadable session data");
                Vec::new()
            }
        }
    }

    /// Like [`LedgerStore::load`] but reports why the stored data could not be used.
    pub fn try_load(&self) -> Result<Vec<Session>> {
        let raw = match self.backend.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %self.key, "no stored sessions");
                return Ok(Vec::new());
            }
            Err(err) => return Err(TinError::CorruptState(err.to_string())),
        };
        let sessions: Vec<Session> =
            serde_json::from_str(&raw).map_err(|err| TinError::CorruptState(err.to_string()))?;
        for session in &sessions {
            session.validate_stored().map_err(|err| {
                TinError::CorruptState(format!("session {}: {err}", session.id()))
            })?;
        }
        Ok(dedupe(sessions))
    }

    /// Serializes and writes the whole collection in one go, replacing prior state.
    pub fn save(&self, sessions: &[Session]) -> Result<()> {
        let json = serde_json::to_string(sessions)
            .map_err(|err| TinError::PersistenceFailure(err.to_string()))?;
        self.backend.write(&self.key, &json)?;
        debug!(key = %self.key, count = sessions.len(), "saved sessions");
        Ok(())
    }
}

/// The session a reload resumes into: the first open one in storage order.
pub fn select_initial_active(sessions: &[Session]) -> Option<&Session> {
    sessions.iter().find(|session| !session.is_closed())
}

/// Replaces the session sharing `updated`'s id. Never inserts.
pub fn upsert(sessions: &[Session], updated: Session) -> Result<Vec<Session>> {
    let index = position_by_id(sessions, updated.id())
        .ok_or_else(|| TinError::SessionNotFound(updated.id()))?;
    let mut next = sessions.to_vec();
    next[index] = updated;
    Ok(next)
}

/// Appends a new session, enforcing id uniqueness.
pub fn insert(sessions: &[Session], session: Session) -> Result<Vec<Session>> {
    if position_by_id(sessions, session.id()).is_some() {
        return Err(TinError::DuplicateSession(session.id()));
    }
    let mut next = sessions.to_vec();
    next.push(session);
    Ok(next)
}

/// Drops the session with `id`; removing an absent id is a no-op.
pub fn remove(sessions: &[Session], id: Uuid) -> Vec<Session> {
    sessions
        .iter()
        .filter(|session| session.id() != id)
        .cloned()
        .collect()
}

fn dedupe(sessions: Vec<Session>) -> Vec<Session> {
    let mut seen = HashSet::new();
    sessions
        .into_iter()
        .filter(|session| {
            let fresh = seen.insert(session.id());
            if !fresh {
                warn!(session = %session.id(), "dropping duplicate session id from stored data");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Expense, ExpenseCandidate, OpenSession};
    use crate::storage::MemoryStorage;
    use chrono::Utc;
    use serde_json::json;

    fn session(label: &str) -> Session {
        Session::open(OpenSession::new(label, 50.0), Utc::now()).unwrap()
    }

    fn closed(label: &str) -> Session {
        let mut session = session(label);
        session.close();
        session
    }

    #[test]
    fn load_of_empty_storage_is_empty() {
        let store = LedgerStore::new(Box::new(MemoryStorage::new()));
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_blob_fails_soft() {
        let store = LedgerStore::new(Box::new(MemoryStorage::with_blob(
            DEFAULT_STORE_KEY,
            "{not json",
        )));
        assert!(store.load().is_empty());
        assert!(matches!(store.try_load(), Err(TinError::CorruptState(_))));
    }

    fn store_with(value: serde_json::Value) -> LedgerStore {
        LedgerStore::new(Box::new(MemoryStorage::with_blob(
            DEFAULT_STORE_KEY,
            value.to_string(),
        )))
    }

    fn stored_tin() -> serde_json::Value {
        let mut tin = session("Christmas");
        let candidate = ExpenseCandidate::new("Tree", 40.0, Some(10)).unwrap();
        tin.push_expense(Expense::from_candidate(candidate, Utc::now()))
            .unwrap();
        serde_json::to_value(vec![tin]).unwrap()
    }

    #[test]
    fn blobs_breaking_field_rules_are_corrupt() {
        let mut negative_amount = stored_tin();
        negative_amount[0]["items"][0]["amount"] = json!(-5);
        let mut empty_label = stored_tin();
        empty_label[0]["label"] = json!("  ");
        let mut zero_calorie_limit = stored_tin();
        zero_calorie_limit[0]["calorieLimit"] = json!(0);
        let mut empty_item_name = stored_tin();
        empty_item_name[0]["items"][0]["name"] = json!("");
        let mut empty_currency = stored_tin();
        empty_currency[0]["currencySymbol"] = json!("");

        for blob in [
            negative_amount,
            empty_label,
            zero_calorie_limit,
            empty_item_name,
            empty_currency,
        ] {
            let store = store_with(blob.clone());
            assert!(
                matches!(store.try_load(), Err(TinError::CorruptState(_))),
                "accepted {blob}"
            );
            assert!(store.load().is_empty());
        }
    }

    #[test]
    fn degenerate_budget_still_loads() {
        let mut blob = stored_tin();
        blob[0]["budget"] = json!(0);
        let sessions = store_with(blob).try_load().unwrap();
        assert_eq!(sessions.len(), 1);
        assert!(!sessions[0].has_budget_constraint());
    }

    #[test]
    fn save_then_load_roundtrip() {
        let store = LedgerStore::new(Box::new(MemoryStorage::new()));
        let sessions = vec![session("Christmas"), closed("Easter")];
        store.save(&sessions).unwrap();
        assert_eq!(store.load(), sessions);
    }

    #[test]
    fn duplicate_ids_are_dropped_on_load() {
        let original = session("Christmas");
        let json = serde_json::to_string(&vec![original.clone(), original.clone()]).unwrap();
        let store = LedgerStore::new(Box::new(MemoryStorage::with_blob(DEFAULT_STORE_KEY, json)));
        assert_eq!(store.load(), vec![original]);
    }

    #[test]
    fn initial_active_is_first_open_session() {
        let sessions = vec![closed("Easter"), session("Halloween"), session("Christmas")];
        let active = select_initial_active(&sessions).unwrap();
        assert_eq!(active.label(), "Halloween");
        assert!(select_initial_active(&[closed("Easter")]).is_none());
        assert!(select_initial_active(&[]).is_none());
    }

    #[test]
    fn upsert_replaces_but_never_inserts() {
        let original = session("Christmas");
        let sessions = vec![original.clone()];
        let mut changed = original.clone();
        changed.close();

        let next = upsert(&sessions, changed.clone()).unwrap();
        assert_eq!(next, vec![changed]);

        let stranger = session("Diwali");
        let stranger_id = stranger.id();
        assert!(matches!(
            upsert(&sessions, stranger),
            Err(TinError::SessionNotFound(id)) if id == stranger_id
        ));
    }

    #[test]
    fn insert_enforces_unique_ids() {
        let original = session("Christmas");
        let sessions = insert(&[], original.clone()).unwrap();
        assert!(matches!(
            insert(&sessions, original),
            Err(TinError::DuplicateSession(_))
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let keep = session("Christmas");
        let drop = session("Easter");
        let sessions = vec![keep.clone(), drop.clone()];
        let once = remove(&sessions, drop.id());
        let twice = remove(&once, drop.id());
        assert_eq!(once, vec![keep.clone()]);
        assert_eq!(twice, vec![keep]);
    }
}
