//! Anonymous voter identity.
//!
//! One opaque fingerprint per installation: created on first use, persisted,
//! and returned unchanged on every later call. The server keys vote dedup on
//! it, so it must never regenerate unless the storage slot is cleared
//! externally. No network I/O here.

use crate::persistence::{self, PersistedIdentity, PersistenceError};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub struct FingerprintStore {
    path: PathBuf,
    cached: OnceCell<String>,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: OnceCell::new(),
        }
    }

    /// Return the stable fingerprint, creating and persisting it on first
    /// call. Idempotent within a process and across restarts.
    pub fn get(&self) -> Result<&str, PersistenceError> {
        let value = self
            .cached
            .get_or_try_init(|| load_or_create(&self.path))?;
        Ok(value.as_str())
    }
}

fn load_or_create(path: &Path) -> Result<String, PersistenceError> {
    if let Some(identity) = persistence::load(path)? {
        return Ok(identity.fingerprint);
    }
    let fingerprint = generate_fingerprint();
    persistence::save(
        path,
        &PersistedIdentity {
            fingerprint: fingerprint.clone(),
        },
    )?;
    Ok(fingerprint)
}

/// Uniqueness, not unpredictability, is the requirement: the value only has
/// to distinguish anonymous voters from one another.
fn generate_fingerprint() -> String {
    Uuid::new_v4().to_string()
}
