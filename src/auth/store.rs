use std::fs;
use std::path::{Path, PathBuf};

use super::error::AuthError;
use super::token::TokenRecord;

pub const DEFAULT_DIR_NAME: &str = ".better-auth";
pub const TOKEN_FILE_NAME: &str = "token.json";

/// Storage abstraction for the single persisted credential.
///
/// `load` and `delete` never fail: a missing or unreadable record is the same
/// as never having logged in. Concurrent writers are not coordinated.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<TokenRecord>;
    fn save(&self, record: &TokenRecord) -> Result<(), AuthError>;
    /// Returns `true` only if a record was actually removed.
    fn delete(&self) -> bool;
}

/// Configuration for file-backed token storage.
#[derive(Debug, Clone)]
pub struct TokenStoreConfig {
    pub base_dir: PathBuf,
}

impl TokenStoreConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(DEFAULT_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIR_NAME))
    }
}

/// File-backed token store writing pretty-printed JSON.
///
/// # Example
/// ```no_run
/// use orbit::auth::{FileTokenStore, TokenRecord, TokenStore};
///
/// let store = FileTokenStore::new_default();
/// store.save(&TokenRecord::new("tok_abc", None, None))?;
/// assert!(store.load().is_some());
/// # Ok::<(), orbit::auth::AuthError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(config: TokenStoreConfig) -> Self {
        Self {
            path: config.base_dir.join(TOKEN_FILE_NAME),
        }
    }

    pub fn new_default() -> Self {
        Self::new(TokenStoreConfig::new(TokenStoreConfig::default_dir()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(path: &Path) -> Result<(), AuthError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<TokenRecord> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token file unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token file malformed");
                None
            }
        }
    }

    fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        Self::ensure_parent(&self.path)?;
        let serialized = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, serialized)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        tracing::debug!(path = %self.path.display(), "token saved");
        Ok(())
    }

    fn delete(&self) -> bool {
        match fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => false,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "token file not removed");
                false
            }
        }
    }
}
