use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, TinError};

use super::common::Identifiable;

/// A single recorded purchase. Immutable once created; edits are delete + add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    id: Uuid,
    name: String,
    amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calories: Option<u32>,
    created_at: DateTime<Utc>,
}

impl Expense {
    /// Materializes a validated candidate into a stored expense.
    pub fn from_candidate(candidate: ExpenseCandidate, created_at: DateTime<Utc>) -> Self {
        let ExpenseCandidate {
            name,
            amount,
            calories,
        } = candidate;
        Self {
            id: Uuid::new_v4(),
            name,
            amount,
            calories,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn calories(&self) -> Option<u32> {
        self.calories
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Re-checks candidate invariants on an expense read back from storage.
    pub(crate) fn validate_stored(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TinError::invalid(format!("expense {} has an empty name", self.id)));
        }
        validate_amount(self.amount).map(|_| ())
    }

    /// Returns the fields needed to re-add an identical expense.
    pub fn to_candidate(&self) -> ExpenseCandidate {
        ExpenseCandidate {
            name: self.name.clone(),
            amount: self.amount,
            calories: self.calories,
        }
    }
}

impl Identifiable for Expense {
    fn id(&self) -> Uuid {
        self.id
    }
}

/// A proposed expense that has passed field validation but is not yet committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseCandidate {
    name: String,
    amount: f64,
    calories: Option<u32>,
}

impl ExpenseCandidate {
    /// Validates already-typed fields.
    pub fn new(name: impl Into<String>, amount: f64, calories: Option<u32>) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(TinError::invalid("expense name must not be empty"));
        }
        Ok(Self {
            name,
            amount: validate_amount(amount)?,
            calories,
        })
    }

    /// Validates raw text as typed into a form.
    pub fn parse(name: &str, amount: &str, calories: Option<&str>) -> Result<Self> {
        let parsed_amount = parse_amount(amount)?;
        let parsed_calories = match calories.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                TinError::invalid(format!(
                    "calories `{raw}` must be a non-negative whole number"
                ))
            })?),
            None => None,
        };
        Self::new(name, parsed_amount, parsed_calories)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn calories(&self) -> Option<u32> {
        self.calories
    }
}

/// Parses a money amount; rejects anything that is not a finite non-negative number.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    let value = trimmed
        .parse::<f64>()
        .map_err(|_| TinError::invalid(format!("amount `{trimmed}` is not a number")))?;
    validate_amount(value)
}

fn validate_amount(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(TinError::invalid("amount must be a finite number"));
    }
    if value < 0.0 {
        return Err(TinError::invalid("amount must not be negative"));
    }
    // normalizes -0.0
    Ok(value + 0.0)
}
