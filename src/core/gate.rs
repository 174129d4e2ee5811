//! Overspend confirmation gate.
//!
//! Additions that keep a session within budget are accepted outright. Additions
//! that would push cumulative spend past the budget must first pass a small
//! arithmetic challenge. The gate is friction, not access control: wrong answers
//! simply produce a fresh challenge.

use std::fmt;

use rand::{rngs::StdRng, Rng, RngCore, SeedableRng};
use tracing::debug;
use uuid::Uuid;

use crate::core::metrics;
use crate::domain::{ExpenseCandidate, Session};
use crate::errors::Result;

pub const CHALLENGE_OPERAND_MIN: u8 = 2;
pub const CHALLENGE_OPERAND_MAX: u8 = 11;

const BUDGET_TOLERANCE: f64 = 1e-9;

/// Two operands whose sum the user must type back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Challenge {
    left: u8,
    right: u8,
}

impl Challenge {
    fn draw(rng: &mut dyn RngCore) -> Self {
        Self {
            left: rng.gen_range(CHALLENGE_OPERAND_MIN..=CHALLENGE_OPERAND_MAX),
            right: rng.gen_range(CHALLENGE_OPERAND_MIN..=CHALLENGE_OPERAND_MAX),
        }
    }

    pub fn operands(&self) -> (u8, u8) {
        (self.left, self.right)
    }

    pub fn expected(&self) -> u32 {
        u32::from(self.left) + u32::from(self.right)
    }

    pub fn is_answered_by(&self, answer: i64) -> bool {
        answer == i64::from(self.expected())
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} + {} = ?", self.left, self.right)
    }
}

/// An over-budget candidate waiting for the user to solve its challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingChallenge {
    session: Uuid,
    candidate: ExpenseCandidate,
    challenge: Challenge,
}

impl PendingChallenge {
    /// Session the candidate was evaluated against.
    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn candidate(&self) -> &ExpenseCandidate {
        &self.candidate
    }

    pub fn challenge(&self) -> Challenge {
        self.challenge
    }
}

/// Outcome of evaluating a candidate against a session.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accept(ExpenseCandidate),
    RequireChallenge(PendingChallenge),
}

/// Outcome of answering a pending challenge.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Accept(ExpenseCandidate),
    Retry(PendingChallenge),
}

pub struct BudgetGate {
    rng: Box<dyn RngCore + Send>,
}

impl Default for BudgetGate {
    fn default() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl fmt::Debug for BudgetGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetGate").finish_non_exhaustive()
    }
}

impl BudgetGate {
    pub fn new(rng: impl RngCore + Send + 'static) -> Self {
        Self { rng: Box::new(rng) }
    }

    /// Deterministic gate for reproducible challenge sequences.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Decides whether `candidate` may be appended to `session`. Never mutates the session.
    pub fn evaluate(&mut self, session: &Session, candidate: ExpenseCandidate) -> Result<Decision> {
        session.ensure_open()?;
        if !session.has_budget_constraint() {
            debug!(session = %session.id(), "session has no effective budget, accepting");
            return Ok(Decision::Accept(candidate));
        }
        let projected = metrics::total_spent(session) + candidate.amount();
        if projected <= session.budget() + BUDGET_TOLERANCE {
            debug!(session = %session.id(), projected, "candidate within budget");
            Ok(Decision::Accept(candidate))
        } else {
            debug!(
                session = %session.id(),
                projected,
                budget = session.budget(),
                "candidate exceeds budget, challenge required"
            );
            Ok(Decision::RequireChallenge(
                self.challenge(session.id(), candidate),
            ))
        }
    }

    /// Checks `answer` against the pending challenge; a mismatch draws a new one.
    pub fn resolve(&mut self, pending: PendingChallenge, answer: i64) -> Resolution {
        if pending.challenge.is_answered_by(answer) {
            Resolution::Accept(pending.candidate)
        } else {
            debug!("challenge answer mismatch, issuing a new challenge");
            Resolution::Retry(self.challenge(pending.session, pending.candidate))
        }
    }

    /// Like [`BudgetGate::resolve`] for raw text; anything that is not an integer is a mismatch.
    pub fn resolve_input(&mut self, pending: PendingChallenge, input: &str) -> Resolution {
        match input.trim().parse::<i64>() {
            Ok(answer) => self.resolve(pending, answer),
            Err(_) => Resolution::Retry(self.challenge(pending.session, pending.candidate)),
        }
    }

    fn challenge(&mut self, session: Uuid, candidate: ExpenseCandidate) -> PendingChallenge {
        PendingChallenge {
            session,
            candidate,
            challenge: Challenge::draw(self.rng.as_mut()),
        }
    }
}
