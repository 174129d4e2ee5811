//! Derived figures over a session. Everything here is pure and recomputed on
//! every read; nothing is cached on the session.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{Expense, Session};

pub const DEFAULT_WARNING_RATIO: f64 = 0.8;

pub fn total_spent(session: &Session) -> f64 {
    session.items().iter().map(Expense::amount).sum()
}

/// Sum of recorded calories; items without calories count as zero.
pub fn total_calories(session: &Session) -> u64 {
    session
        .items()
        .iter()
        .filter_map(Expense::calories)
        .map(u64::from)
        .sum()
}

/// `total_spent / budget`. A degenerate budget yields an unbounded ratio, left to the renderer.
pub fn spend_ratio(session: &Session) -> f64 {
    total_spent(session) / session.budget()
}

/// `None` when the session has no calorie limit.
pub fn calorie_ratio(session: &Session) -> Option<f64> {
    session
        .calorie_limit()
        .map(|limit| total_calories(session) as f64 / f64::from(limit))
}

/// Budget left to spend; negative once the tin is over its limit.
pub fn remaining(session: &Session) -> f64 {
    session.budget() - total_spent(session)
}

/// Whole days until the event, rounded up: 0 is today, negative once it has passed.
/// The event day starts at midnight UTC.
pub fn days_until(session: &Session, now: DateTime<Utc>) -> Option<i64> {
    let event = session.event_date()?.and_hms_opt(0, 0, 0)?.and_utc();
    let delta = event - now;
    let days = delta.num_days();
    if delta > Duration::days(days) {
        Some(days + 1)
    } else {
        Some(days)
    }
}

/// Case-insensitive substring match on expense names, preserving order.
/// Whitespace in the query is significant; only an empty query matches everything.
pub fn search<'a>(session: &'a Session, query: &str) -> Vec<&'a Expense> {
    let needle = query.to_lowercase();
    session
        .items()
        .iter()
        .filter(|item| needle.is_empty() || item.name().to_lowercase().contains(&needle))
        .collect()
}

/// Three-band verdict shown on the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpendLevel {
    Clear,
    Tricky,
    Full,
}

impl SpendLevel {
    pub fn from_ratio(ratio: f64, warning_ratio: f64) -> Self {
        if ratio >= 1.0 || ratio.is_nan() {
            SpendLevel::Full
        } else if ratio >= warning_ratio {
            SpendLevel::Tricky
        } else {
            SpendLevel::Clear
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            SpendLevel::Clear => "IN THE CLEAR",
            SpendLevel::Tricky => "TRICKY...",
            SpendLevel::Full => "CODE RED!",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self {
            SpendLevel::Clear => "Sweet savings!",
            SpendLevel::Tricky => "Watch the crumbs!",
            SpendLevel::Full => "Tin is full!",
        }
    }
}

/// Snapshot of every derived figure for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub total_spent: f64,
    pub remaining: f64,
    pub spend_ratio: f64,
    pub level: SpendLevel,
    pub total_calories: u64,
    pub calorie_ratio: Option<f64>,
    pub days_until: Option<i64>,
    pub item_count: usize,
}

impl SessionMetrics {
    pub fn compute(session: &Session, now: DateTime<Utc>, warning_ratio: f64) -> Self {
        let spend_ratio = spend_ratio(session);
        Self {
            total_spent: total_spent(session),
            remaining: remaining(session),
            spend_ratio,
            level: SpendLevel::from_ratio(spend_ratio, warning_ratio),
            total_calories: total_calories(session),
            calorie_ratio: calorie_ratio(session),
            days_until: days_until(session, now),
            item_count: session.items().len(),
        }
    }
}
