//! Contract with the barcode nutrition lookup collaborator.
//!
//! The real lookup lives outside this crate (camera + network). The engine only
//! turns a successful result into a candidate expense; "not found" and errors
//! propose nothing.

use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{parse_amount, ExpenseCandidate};
use crate::errors::{Result, TinError};

/// Shape returned by a lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupResult {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_per_100g: Option<f64>,
}

impl LookupResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(name: impl Into<String>, calories_per_100g: Option<f64>) -> Self {
        Self {
            found: true,
            name: Some(name.into()),
            calories_per_100g,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

pub trait NutritionLookup {
    fn lookup(&self, barcode: &str) -> std::result::Result<LookupResult, LookupError>;
}

/// Builds a candidate from a lookup outcome and the price the user typed.
///
/// Returns `Ok(None)` for "not found", lookup errors, and nameless results. The
/// price is validated like any manual entry.
pub fn candidate_from_lookup(
    outcome: std::result::Result<LookupResult, LookupError>,
    price: &str,
) -> Result<Option<ExpenseCandidate>> {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, "nutrition lookup failed");
            return Ok(None);
        }
    };
    let name = match result.name.as_deref().map(str::trim) {
        Some(name) if result.found && !name.is_empty() => name.to_string(),
        _ => {
            debug!("nutrition lookup returned no product");
            return Ok(None);
        }
    };
    let amount = parse_amount(price)?;
    let calories = result
        .calories_per_100g
        .filter(|kcal| kcal.is_finite() && *kcal >= 0.0)
        .map(|kcal| kcal.round().min(f64::from(u32::MAX)) as u32);
    ExpenseCandidate::new(name, amount, calories).map(Some)
}

/// Offline barcode catalog, typically loaded from a JSON file mapping barcodes
/// to `{ "name": ..., "caloriesPer100g": ... }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogLookup {
    products: HashMap<String, CatalogEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_per_100g: Option<f64>,
}

impl CatalogLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, barcode: impl Into<String>, entry: CatalogEntry) {
        self.products.insert(barcode.into(), entry);
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let products: HashMap<String, CatalogEntry> = serde_json::from_str(&data)
            .map_err(|err| TinError::ConfigError(format!("catalog {}: {err}", path.display())))?;
        Ok(Self { products })
    }
}

impl NutritionLookup for CatalogLookup {
    fn lookup(&self, barcode: &str) -> std::result::Result<LookupResult, LookupError> {
        Ok(match self.products.get(barcode.trim()) {
            Some(entry) => LookupResult::found(entry.name.clone(), entry.calories_per_100g),
            None => LookupResult::not_found(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn found_product_becomes_candidate() {
        let outcome = Ok(LookupResult::found("Gingerbread", Some(389.6)));
        let candidate = candidate_from_lookup(outcome, "3.20").unwrap().unwrap();
        assert_eq!(candidate.name(), "Gingerbread");
        assert_eq!(candidate.amount(), 3.2);
        assert_eq!(candidate.calories(), Some(390));
    }

    #[test]
    fn not_found_and_errors_propose_nothing() {
        assert!(candidate_from_lookup(Ok(LookupResult::not_found()), "1")
            .unwrap()
            .is_none());
        let nameless = LookupResult {
            found: true,
            name: Some("  ".into()),
            calories_per_100g: None,
        };
        assert!(candidate_from_lookup(Ok(nameless), "1").unwrap().is_none());
        let failed = Err(LookupError::Unavailable("offline".into()));
        assert!(candidate_from_lookup(failed, "1").unwrap().is_none());
    }

    #[test]
    fn bad_price_is_invalid_input() {
        let outcome = Ok(LookupResult::found("Stollen", None));
        assert!(matches!(
            candidate_from_lookup(outcome, "free"),
            Err(TinError::InvalidInput(_))
        ));
    }

    #[test]
    fn catalog_resolves_known_barcodes() {
        let mut catalog = CatalogLookup::new();
        catalog.insert(
            "5000159407236",
            CatalogEntry {
                name: "Mince pies".into(),
                calories_per_100g: Some(370.0),
            },
        );
        let hit = catalog.lookup(" 5000159407236 ").unwrap();
        assert!(hit.found);
        assert_eq!(hit.name.as_deref(), Some("Mince pies"));
        assert!(!catalog.lookup("0000").unwrap().found);
    }
}
