use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::core::clock::{Clock, SystemClock};
use crate::core::gate::{BudgetGate, Decision, PendingChallenge, Resolution};
use crate::core::lookup::{candidate_from_lookup, NutritionLookup};
use crate::core::metrics::SessionMetrics;
use crate::core::services::SessionService;
use crate::domain::{ExpenseCandidate, OpenSession, Session, SettingsUpdate};
use crate::errors::{Result, TinError};
use crate::storage::{self, LedgerStore};

/// Result of proposing an expense.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The expense was appended and persisted; carries the updated session.
    Committed(Session),
    /// Over budget: nothing was written until the challenge is answered.
    ChallengeRequired(PendingChallenge),
}

/// Facade the presentation layer talks to. Owns the in-memory collection, the
/// active session id and the budget gate, and persists every mutation.
///
/// Mutations build the next collection, write it, and only then replace the
/// in-memory copy, so a failed write leaves memory and storage in agreement.
pub struct LedgerManager {
    store: LedgerStore,
    sessions: Vec<Session>,
    active: Option<Uuid>,
    gate: BudgetGate,
    clock: Arc<dyn Clock>,
}

impl LedgerManager {
    pub fn new(store: LedgerStore) -> Self {
        Self::with_parts(store, BudgetGate::default(), Arc::new(SystemClock))
    }

    pub fn with_parts(store: LedgerStore, gate: BudgetGate, clock: Arc<dyn Clock>) -> Self {
        let sessions = store.load();
        let active = storage::select_initial_active(&sessions).map(Session::id);
        info!(count = sessions.len(), resumed = ?active, "loaded sessions");
        Self {
            store,
            sessions,
            active,
            gate,
            clock,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: Uuid) -> Option<&Session> {
        self.sessions.iter().find(|session| session.id() == id)
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|id| self.session(id))
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    /// Switches the dashboard to `id`; closed sessions can be viewed too.
    pub fn activate(&mut self, id: Uuid) -> Result<&Session> {
        let index = self
            .sessions
            .iter()
            .position(|session| session.id() == id)
            .ok_or(TinError::SessionNotFound(id))?;
        self.active = Some(id);
        Ok(&self.sessions[index])
    }

    /// Returns to the session picker.
    pub fn deactivate(&mut self) {
        self.active = None;
    }

    pub fn open_session(&mut self, request: OpenSession) -> Result<Session> {
        let session = SessionService::open(request, self.clock.now())?;
        let next = storage::insert(&self.sessions, session.clone())?;
        self.store.save(&next)?;
        self.sessions = next;
        self.active = Some(session.id());
        Ok(session)
    }

    pub fn add_expense(&mut self, id: Uuid, candidate: ExpenseCandidate) -> Result<AddOutcome> {
        let session = self
            .sessions
            .iter()
            .find(|session| session.id() == id)
            .ok_or(TinError::SessionNotFound(id))?;
        match self.gate.evaluate(session, candidate)? {
            Decision::Accept(candidate) => self.append(id, candidate).map(AddOutcome::Committed),
            Decision::RequireChallenge(pending) => Ok(AddOutcome::ChallengeRequired(pending)),
        }
    }

    /// Answers a pending challenge against the session it was raised on.
    /// A wrong answer yields a fresh challenge.
    pub fn answer_challenge(
        &mut self,
        pending: PendingChallenge,
        answer: &str,
    ) -> Result<AddOutcome> {
        let id = pending.session();
        self.require(id)?.ensure_open()?;
        match self.gate.resolve_input(pending, answer) {
            Resolution::Accept(candidate) => self.append(id, candidate).map(AddOutcome::Committed),
            Resolution::Retry(next) => Ok(AddOutcome::ChallengeRequired(next)),
        }
    }

    /// Looks up a scanned barcode and proposes the product like a manual entry.
    /// Returns `Ok(None)` when the lookup finds nothing; no session is touched then.
    pub fn add_scanned(
        &mut self,
        id: Uuid,
        lookup: &dyn NutritionLookup,
        barcode: &str,
        price: &str,
    ) -> Result<Option<AddOutcome>> {
        self.require(id)?.ensure_open()?;
        match candidate_from_lookup(lookup.lookup(barcode), price)? {
            Some(candidate) => self.add_expense(id, candidate).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove_expense(&mut self, id: Uuid, expense_id: Uuid) -> Result<Session> {
        let session = self.require(id)?.clone();
        self.commit(SessionService::remove_expense(session, expense_id)?)
    }

    pub fn update_settings(&mut self, id: Uuid, update: SettingsUpdate) -> Result<Session> {
        let session = self.require(id)?.clone();
        self.commit(SessionService::update_settings(session, update)?)
    }

    pub fn close_session(&mut self, id: Uuid) -> Result<Session> {
        let session = self.require(id)?.clone();
        self.commit(SessionService::close(session))
    }

    /// Removes a session for good. Deleting an unknown id is a no-op.
    pub fn delete_session(&mut self, id: Uuid) -> Result<()> {
        if self.session(id).is_none() {
            return Ok(());
        }
        let next = storage::remove(&self.sessions, id);
        self.store.save(&next)?;
        self.sessions = next;
        if self.active == Some(id) {
            self.active = None;
        }
        info!(session = %id, "deleted session");
        Ok(())
    }

    pub fn metrics(&self, id: Uuid, warning_ratio: f64) -> Result<SessionMetrics> {
        let session = self.require(id)?;
        Ok(SessionMetrics::compute(
            session,
            self.clock.now(),
            warning_ratio,
        ))
    }

    fn append(&mut self, id: Uuid, candidate: ExpenseCandidate) -> Result<Session> {
        let session = self.require(id)?.clone();
        self.commit(SessionService::append(session, candidate, self.clock.now())?)
    }

    fn commit(&mut self, updated: Session) -> Result<Session> {
        let next = storage::upsert(&self.sessions, updated.clone())?;
        self.store.save(&next)?;
        self.sessions = next;
        Ok(updated)
    }

    fn require(&self, id: Uuid) -> Result<&Session> {
        self.session(id).ok_or(TinError::SessionNotFound(id))
    }
}
