use std::{
    fs, io,
    path::PathBuf,
};

use crate::errors::Result;
use crate::utils::persistence::write_atomic;

use super::StorageBackend;

const BLOB_EXTENSION: &str = "json";

/// Filesystem backend: each key is one `<key>.json` file under `root`.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
}

impl JsonStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_key(key), BLOB_EXTENSION))
    }
}

impl StorageBackend for JsonStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write(&self, key: &str, data: &str) -> Result<()> {
        write_atomic(&self.blob_path(key), data)?;
        Ok(())
    }
}

/// Keeps keys filesystem-safe: lowercase alphanumerics plus `-`, everything else `_`.
fn canonical_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches(|c| c == '_' || c == '-').is_empty() {
        "sessions".into()
    } else {
        sanitized
    }
}
