//! Validated mutators behind the presentation-layer calls on a single session.

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::domain::{Expense, ExpenseCandidate, OpenSession, Session, SettingsUpdate};
use crate::errors::Result;

/// Each operation consumes a session value and hands back the updated one, so a
/// caller can drop the result if persisting it fails.
pub struct SessionService;

impl SessionService {
    /// Creates a fresh, open session.
    pub fn open(request: OpenSession, now: DateTime<Utc>) -> Result<Session> {
        let session = Session::open(request, now)?;
        info!(session = %session.id(), label = session.label(), "opened session");
        Ok(session)
    }

    /// Commits an accepted candidate. Callers run the budget gate first.
    pub fn append(
        mut session: Session,
        candidate: ExpenseCandidate,
        now: DateTime<Utc>,
    ) -> Result<Session> {
        session.push_expense(Expense::from_candidate(candidate, now))?;
        Ok(session)
    }

    pub fn remove_expense(mut session: Session, expense_id: Uuid) -> Result<Session> {
        session.remove_expense(expense_id)?;
        Ok(session)
    }

    pub fn update_settings(mut session: Session, update: SettingsUpdate) -> Result<Session> {
        session.apply_settings(update)?;
        Ok(session)
    }

    pub fn close(mut session: Session) -> Session {
        if !session.is_closed() {
            info!(session = %session.id(), "closed session");
        }
        session.close();
        session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics;
    use crate::errors::TinError;

    fn open() -> Session {
        SessionService::open(OpenSession::new("Christmas", 100.0), Utc::now()).unwrap()
    }

    fn candidate(name: &str, amount: f64) -> ExpenseCandidate {
        ExpenseCandidate::new(name, amount, None).unwrap()
    }

    #[test]
    fn remove_then_re_add_restores_total() {
        let mut session = open();
        for (name, amount) in [("Tree", 35.0), ("Lights", 12.5), ("Star", 4.0)] {
            session = SessionService::append(session, candidate(name, amount), Utc::now()).unwrap();
        }
        let before = metrics::total_spent(&session);
        let removed = session.items()[1].clone();

        session = SessionService::remove_expense(session, removed.id()).unwrap();
        assert_eq!(metrics::total_spent(&session), before - removed.amount());

        session = SessionService::append(session, removed.to_candidate(), Utc::now()).unwrap();
        assert_eq!(metrics::total_spent(&session), before);
    }

    #[test]
    fn append_to_closed_session_fails() {
        let session = SessionService::close(open());
        let err = SessionService::append(session, candidate("Late gift", 5.0), Utc::now())
            .expect_err("closed sessions take no new items");
        assert!(matches!(err, TinError::SessionClosed(_)));
    }

    #[test]
    fn close_is_idempotent() {
        let session = SessionService::close(SessionService::close(open()));
        assert!(session.is_closed());
    }

    #[test]
    fn update_settings_changes_currency() {
        let session = SessionService::update_settings(
            open(),
            SettingsUpdate {
                currency_symbol: Some("£".into()),
                ..SettingsUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(session.currency_symbol(), "£");
    }
}
