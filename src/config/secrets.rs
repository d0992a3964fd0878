//! Per-profile API key storage.
//!
//! Keys are addressed by profile alias only. The file-backed store keeps them
//! in a JSON document beside the config file, readable by the owner only.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::SecretError;

/// Storage for API keys keyed by profile alias.
pub trait SecretStore: Send + Sync {
    fn get(&self, alias: &str) -> Result<Option<String>, SecretError>;

    /// Store a key. Surrounding whitespace is trimmed; an empty key is rejected.
    fn set(&self, alias: &str, api_key: &str) -> Result<(), SecretError>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&self, alias: &str) -> Result<(), SecretError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SecretsDocument {
    #[serde(default)]
    profiles: BTreeMap<String, String>,
}

/// JSON-file secret store.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SecretsDocument, SecretError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(SecretsDocument::default());
            }
            Err(source) => {
                return Err(SecretError::ReadFailed {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| SecretError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Write via a temp file in the same directory so a crash never leaves a
    /// half-written secrets file behind.
    fn save(&self, doc: &SecretsDocument) -> Result<(), SecretError> {
        let write_err = |source| SecretError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let json = serde_json::to_string_pretty(doc).map_err(|e| SecretError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.write_all(b"\n").map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }

        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, alias: &str) -> Result<Option<String>, SecretError> {
        Ok(self.load()?.profiles.remove(alias))
    }

    fn set(&self, alias: &str, api_key: &str) -> Result<(), SecretError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SecretError::EmptyKey);
        }
        let mut doc = self.load()?;
        doc.profiles.insert(alias.to_string(), api_key.to_string());
        self.save(&doc)
    }

    fn remove(&self, alias: &str) -> Result<(), SecretError> {
        let mut doc = self.load()?;
        if doc.profiles.remove(alias).is_some() {
            self.save(&doc)?;
        }
        Ok(())
    }
}

/// In-process store, for tests and one-shot invocations.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    keys: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(alias: &str, api_key: &str) -> Self {
        let store = Self::new();
        store
            .keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(alias.to_string(), api_key.to_string());
        store
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, alias: &str) -> Result<Option<String>, SecretError> {
        let keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        Ok(keys.get(alias).cloned())
    }

    fn set(&self, alias: &str, api_key: &str) -> Result<(), SecretError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(SecretError::EmptyKey);
        }
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.insert(alias.to_string(), api_key.to_string());
        Ok(())
    }

    fn remove(&self, alias: &str) -> Result<(), SecretError> {
        let mut keys = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        keys.remove(alias);
        Ok(())
    }
}
