use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, TinError};

use super::common::{position_by_id, Identifiable};
use super::expense::Expense;

pub const DEFAULT_CURRENCY_SYMBOL: &str = "$";

/// One holiday or occasion ledger: a budget, an optional calorie limit and the
/// expenses recorded against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: Uuid,
    label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    event_date: Option<NaiveDate>,
    #[serde(default = "default_currency_symbol")]
    currency_symbol: String,
    budget: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calorie_limit: Option<u32>,
    #[serde(default)]
    items: Vec<Expense>,
    #[serde(default)]
    is_closed: bool,
    created_at: DateTime<Utc>,
}

/// Parameters of the "open tin" action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenSession {
    pub custom_name: Option<String>,
    pub holiday_name: Option<String>,
    pub budget: f64,
    pub calorie_limit: Option<u32>,
    pub event_date: Option<NaiveDate>,
    pub currency_symbol: Option<String>,
}

impl OpenSession {
    pub fn new(holiday_name: impl Into<String>, budget: f64) -> Self {
        Self {
            holiday_name: Some(holiday_name.into()),
            budget,
            ..Self::default()
        }
    }

    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = Some(name.into());
        self
    }

    pub fn with_calorie_limit(mut self, limit: u32) -> Self {
        self.calorie_limit = Some(limit);
        self
    }

    pub fn with_event_date(mut self, date: NaiveDate) -> Self {
        self.event_date = Some(date);
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = Some(symbol.into());
        self
    }

    /// Custom name wins over the holiday name; blank values do not count.
    fn resolve_label(&self) -> Result<String> {
        [self.custom_name.as_deref(), self.holiday_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|label| !label.is_empty())
            .map(str::to_string)
            .ok_or_else(|| TinError::invalid("a session needs a custom name or a holiday name"))
    }
}

/// Partial settings change. `None` leaves a field untouched; the nested
/// options on calorie limit and event date allow clearing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsUpdate {
    pub budget: Option<f64>,
    pub calorie_limit: Option<Option<u32>>,
    pub currency_symbol: Option<String>,
    pub event_date: Option<Option<NaiveDate>>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.budget.is_none()
            && self.calorie_limit.is_none()
            && self.currency_symbol.is_none()
            && self.event_date.is_none()
    }
}

impl Session {
    pub fn open(request: OpenSession, created_at: DateTime<Utc>) -> Result<Self> {
        let label = request.resolve_label()?;
        let budget = validate_budget(request.budget)?;
        let calorie_limit = validate_calorie_limit(request.calorie_limit)?;
        let currency_symbol = match request.currency_symbol {
            Some(symbol) => validate_currency_symbol(&symbol)?,
            None => default_currency_symbol(),
        };
        Ok(Self {
            id: Uuid::new_v4(),
            label,
            event_date: request.event_date,
            currency_symbol,
            budget,
            calorie_limit,
            items: Vec::new(),
            is_closed: false,
            created_at,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn event_date(&self) -> Option<NaiveDate> {
        self.event_date
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn calorie_limit(&self) -> Option<u32> {
        self.calorie_limit
    }

    /// Expenses, newest first.
    pub fn items(&self) -> &[Expense] {
        &self.items
    }

    pub fn expense(&self, id: Uuid) -> Option<&Expense> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// False only for hand-edited data whose budget is not a positive finite number.
    pub fn has_budget_constraint(&self) -> bool {
        self.budget.is_finite() && self.budget > 0.0
    }

    /// Re-checks field invariants on a session read back from storage.
    /// A degenerate budget is tolerated; see [`Session::has_budget_constraint`].
    pub(crate) fn validate_stored(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(TinError::invalid("session label must not be empty"));
        }
        validate_calorie_limit(self.calorie_limit)?;
        validate_currency_symbol(&self.currency_symbol)?;
        self.items.iter().try_for_each(Expense::validate_stored)
    }

    pub fn ensure_open(&self) -> Result<()> {
        if self.is_closed {
            Err(TinError::SessionClosed(self.id))
        } else {
            Ok(())
        }
    }

    /// Prepends the expense, keeping the newest-first order.
    pub fn push_expense(&mut self, expense: Expense) -> Result<()> {
        self.ensure_open()?;
        self.items.insert(0, expense);
        Ok(())
    }

    pub fn remove_expense(&mut self, id: Uuid) -> Result<Expense> {
        self.ensure_open()?;
        let index = position_by_id(&self.items, id).ok_or(TinError::ExpenseNotFound(id))?;
        Ok(self.items.remove(index))
    }

    /// Validates every field of the update before assigning any of them.
    pub fn apply_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        self.ensure_open()?;
        let budget = update.budget.map(validate_budget).transpose()?;
        let calorie_limit = update
            .calorie_limit
            .map(validate_calorie_limit)
            .transpose()?;
        let currency_symbol = update
            .currency_symbol
            .as_deref()
            .map(validate_currency_symbol)
            .transpose()?;

        if let Some(budget) = budget {
            self.budget = budget;
        }
        if let Some(limit) = calorie_limit {
            self.calorie_limit = limit;
        }
        if let Some(symbol) = currency_symbol {
            self.currency_symbol = symbol;
        }
        if let Some(date) = update.event_date {
            self.event_date = date;
        }
        Ok(())
    }

    /// Archives the session. Closing twice is a no-op.
    pub fn close(&mut self) {
        self.is_closed = true;
    }
}

impl Identifiable for Session {
    fn id(&self) -> Uuid {
        self.id
    }
}

fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}

fn validate_budget(budget: f64) -> Result<f64> {
    if budget.is_finite() && budget > 0.0 {
        Ok(budget)
    } else {
        Err(TinError::invalid("budget must be a positive number"))
    }
}

fn validate_calorie_limit(limit: Option<u32>) -> Result<Option<u32>> {
    match limit {
        Some(0) => Err(TinError::invalid("calorie limit must be positive")),
        other => Ok(other),
    }
}

fn validate_currency_symbol(symbol: &str) -> Result<String> {
    let trimmed = symbol.trim();
    if trimmed.is_empty() {
        Err(TinError::invalid("currency symbol must not be empty"))
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExpenseCandidate;

    fn session() -> Session {
        Session::open(OpenSession::new("Christmas", 100.0), Utc::now()).unwrap()
    }

    fn expense(name: &str, amount: f64) -> Expense {
        Expense::from_candidate(ExpenseCandidate::new(name, amount, None).unwrap(), Utc::now())
    }

    #[test]
    fn open_prefers_custom_name() {
        let request = OpenSession::new("Christmas", 50.0).with_custom_name("Office party");
        let session = Session::open(request, Utc::now()).unwrap();
        assert_eq!(session.label(), "Office party");
        assert_eq!(session.currency_symbol(), DEFAULT_CURRENCY_SYMBOL);
        assert!(!session.is_closed());
    }

    #[test]
    fn open_falls_back_to_holiday_when_custom_is_blank() {
        let request = OpenSession::new("Hanukkah", 50.0).with_custom_name("   ");
        let session = Session::open(request, Utc::now()).unwrap();
        assert_eq!(session.label(), "Hanukkah");
    }

    #[test]
    fn open_rejects_missing_label_and_bad_limits() {
        let nameless = OpenSession {
            budget: 10.0,
            ..OpenSession::default()
        };
        assert!(matches!(
            Session::open(nameless, Utc::now()),
            Err(TinError::InvalidInput(_))
        ));
        for budget in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                Session::open(OpenSession::new("Eid", budget), Utc::now()),
                Err(TinError::InvalidInput(_))
            ));
        }
        let zero_calories = OpenSession::new("Eid", 10.0).with_calorie_limit(0);
        assert!(Session::open(zero_calories, Utc::now()).is_err());
    }

    #[test]
    fn expenses_are_kept_newest_first() {
        let mut session = session();
        session.push_expense(expense("first", 1.0)).unwrap();
        session.push_expense(expense("second", 2.0)).unwrap();
        let names: Vec<_> = session.items().iter().map(|item| item.name()).collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn closed_session_rejects_writes() {
        let mut session = session();
        let kept = expense("kept", 5.0);
        let kept_id = kept.id();
        session.push_expense(kept).unwrap();
        session.close();

        let err = session.push_expense(expense("late", 1.0)).unwrap_err();
        assert!(matches!(err, TinError::SessionClosed(id) if id == session.id()));
        assert!(session.remove_expense(kept_id).is_err());
        assert_eq!(session.items().len(), 1);
    }

    #[test]
    fn remove_unknown_expense_reports_not_found() {
        let mut session = session();
        let missing = Uuid::new_v4();
        assert!(matches!(
            session.remove_expense(missing),
            Err(TinError::ExpenseNotFound(id)) if id == missing
        ));
    }

    #[test]
    fn invalid_settings_leave_session_untouched() {
        let mut session = session();
        let before = session.clone();
        let update = SettingsUpdate {
            currency_symbol: Some("€".into()),
            budget: Some(-1.0),
            ..SettingsUpdate::default()
        };
        assert!(session.apply_settings(update).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn settings_can_clear_optional_fields() {
        let request = OpenSession::new("Diwali", 80.0)
            .with_calorie_limit(2_000)
            .with_event_date(NaiveDate::from_ymd_opt(2026, 11, 8).unwrap());
        let mut session = Session::open(request, Utc::now()).unwrap();
        session
            .apply_settings(SettingsUpdate {
                calorie_limit: Some(None),
                event_date: Some(None),
                budget: Some(120.0),
                ..SettingsUpdate::default()
            })
            .unwrap();
        assert_eq!(session.calorie_limit(), None);
        assert_eq!(session.event_date(), None);
        assert_eq!(session.budget(), 120.0);
    }

    #[test]
    fn deserializes_blob_without_optional_fields() {
        let json = r#"{
            "id": "4b4f5c2e-8f0e-4a55-9b53-0d6b1c1d8a10",
            "label": "Easter",
            "budget": 40,
            "createdAt": "2025-04-01T10:00:00Z"
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.currency_symbol(), "$");
        assert!(session.items().is_empty());
        assert!(!session.is_closed());
    }
}
