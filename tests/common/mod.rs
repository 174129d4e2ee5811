#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use chrono::{TimeZone, Utc};
use cookie_tin::{
    core::{BudgetGate, FixedClock},
    storage::{JsonStorage, LedgerStore},
    LedgerManager,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn json_store(root: &Path) -> LedgerStore {
    let storage = JsonStorage::new(root.join("data")).expect("create json storage backend");
    LedgerStore::new(Box::new(storage))
}

/// Manager over JSON files in `root` with a seeded gate and a pinned clock.
pub fn manager_in(root: &Path) -> LedgerManager {
    LedgerManager::with_parts(
        json_store(root),
        BudgetGate::seeded(42),
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 12, 1, 8, 0, 0).unwrap(),
        )),
    )
}
