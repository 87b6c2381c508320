//! Session token storage
//!
//! The token lives in a single key-value slot named `ds_token`. No shape
//! validation happens here; only the server decides whether a token is good.
//!
//! Backends:
//! - `MemoryStore`: process-local slot
//! - `FileStore`: JSON file under the config dir (0600 on Unix), shared by
//!   every process of the same user

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

use crate::TOKEN_KEY;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access session file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize session file: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Session directory not found")]
    NoDirFound,
}

/// Persistent slot holding the session token
pub trait TokenStore: Send + Sync {
    /// True iff a token is currently persisted
    fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    fn get_token(&self) -> Option<String>;

    /// Persist `token`, overwriting any prior value
    fn set_token(&self, token: &str) -> Result<(), StoreError>;

    fn clear_token(&self) -> Result<(), StoreError>;
}

/// In-memory token slot
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: RwLock<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryStore {
    fn get_token(&self) -> Option<String> {
        self.slot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_token(&self, token: &str) -> Result<(), StoreError> {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), StoreError> {
        *self
            .slot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// File-backed token slot
///
/// The file is a flat JSON object of string values; keys other than
/// `ds_token` are kept untouched on write.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the platform default location
    pub fn at_default_path() -> Result<Self, StoreError> {
        Ok(Self::new(Self::default_path()?))
    }

    /// Get default session file path
    pub fn default_path() -> Result<PathBuf, StoreError> {
        dirs::config_dir()
            .map(|p| p.join("dsbase").join("session.json"))
            .ok_or(StoreError::NoDirFound)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current slots; an absent file is empty, an unreadable one is an error
    fn read_slots(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
            BTreeMap::new()
        }))
    }

    fn write_slots(&self, slots: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(slots)?;
        std::fs::write(&self.path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get_token(&self) -> Option<String> {
        match self.read_slots() {
            Ok(mut slots) => slots.remove(TOKEN_KEY),
            Err(e) => {
                tracing::warn!("Failed to read session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<(), StoreError> {
        let mut slots = self.read_slots()?;
        slots.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_slots(&slots)
    }

    fn clear_token(&self) -> Result<(), StoreError> {
        let mut slots = self.read_slots()?;
        if slots.remove(TOKEN_KEY).is_none() {
            return Ok(());
        }
        if slots.is_empty() {
            match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        } else {
            self.write_slots(&slots)
        }
    }
}
