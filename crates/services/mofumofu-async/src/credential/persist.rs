//! Durable storage backends for the access token

use atomicwrites::{AtomicFile, OverwriteBehavior::AllowOverwrite};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::MofuError;

/// Trait for durable access-token storage
pub trait TokenPersistence: Send + Sync {
    /// Loads the saved token, `None` if nothing was saved
    fn load(&self) -> Result<Option<String>, MofuError>;
    /// Saves the token, replacing any previous value
    fn save(&self, token: &str) -> Result<(), MofuError>;
    /// Removes the saved token; removing a missing token is not an error
    fn remove(&self) -> Result<(), MofuError>;
}

/// Single-file token storage with atomic replacement
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Stores the token at `path`; parent directories are created on first save
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the token file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenPersistence for FilePersistence {
    fn load(&self) -> Result<Option<String>, MofuError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw.trim().to_string()).filter(|t| !t.is_empty())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MofuError::Storage(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, token: &str) -> Result<(), MofuError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MofuError::Storage(e.to_string()))?;
        }
        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|f| {
                // Owner-only before any byte lands; the rename keeps the mode
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    f.set_permissions(std::fs::Permissions::from_mode(0o600))?;
                }
                f.write_all(token.as_bytes())
            })
            .map_err(|e| {
                MofuError::Storage(format!("Failed to write {}: {e}", self.path.display()))
            })?;
        Ok(())
    }

    fn remove(&self) -> Result<(), MofuError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MofuError::Storage(e.to_string())),
        }
    }
}

/// In-process token storage, useful for tests and isolated sessions
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    token: Mutex<Option<String>>,
}

impl MemoryPersistence {
    /// Creates an empty in-memory backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend that already holds `token`
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }

    /// Current saved value
    #[must_use]
    pub fn saved(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<String>, MofuError> {
        Ok(self.saved())
    }

    fn save(&self, token: &str) -> Result<(), MofuError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), MofuError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
