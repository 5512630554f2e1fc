use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Cannot find config directory")]
    NoConfigDir,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt key store {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredKeys {
    keys: BTreeMap<String, String>,
}

/// API credentials persisted as a small JSON file, one entry per named key.
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub const MISTRAL_KEY: &'static str = "mistral_api_key";
    pub const UNSPLASH_KEY: &'static str = "unsplash_access_key";
    pub const PEXELS_KEY: &'static str = "pexels_api_key";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("credentials.json"),
        }
    }

    /// Store under `<config dir>/slide`.
    pub fn default_location() -> Result<Self, KeyStoreError> {
        let dir = dirs::config_dir()
            .ok_or(KeyStoreError::NoConfigDir)?
            .join("slide");
        Ok(Self::new(dir))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self, name: &str) -> Result<Option<String>, KeyStoreError> {
        Ok(self.read_all().await?.keys.remove(name))
    }

    pub async fn save(&self, name: &str, value: &str) -> Result<(), KeyStoreError> {
        let mut stored = self.read_all().await?;
        stored.keys.insert(name.to_string(), value.to_string());
        self.write_all(&stored).await?;
        tracing::info!("Saved key {} to {}", name, self.path.display());
        Ok(())
    }

    /// Returns whether a key was actually removed.
    pub async fn remove(&self, name: &str) -> Result<bool, KeyStoreError> {
        let mut stored = self.read_all().await?;
        let removed = stored.keys.remove(name).is_some();
        if removed {
            self.write_all(&stored).await?;
        }
        Ok(removed)
    }

    async fn read_all(&self) -> Result<StoredKeys, KeyStoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoredKeys::default())
            }
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_str(&content).map_err(|source| KeyStoreError::Parse {
            path: self.path.display().to_string(),
            source,
        })
    }

    async fn write_all(&self, stored: &StoredKeys) -> Result<(), KeyStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        let content = serde_json::to_string_pretty(stored).map_err(|source| {
            KeyStoreError::Parse {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: std::io::Error) -> KeyStoreError {
        KeyStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::new(temp_dir.path().join("nested"));

        assert_eq!(store.load(KeyStore::MISTRAL_KEY).await.unwrap(), None);

        store.save(KeyStore::MISTRAL_KEY, "sk-test").await.unwrap();
        store.save(KeyStore::PEXELS_KEY, "px-test").await.unwrap();

        assert_eq!(
            store.load(KeyStore::MISTRAL_KEY).await.unwrap().as_deref(),
            Some("sk-test")
        );
        assert_eq!(
            store.load(KeyStore::PEXELS_KEY).await.unwrap().as_deref(),
            Some("px-test")
        );
    }

    #[tokio::test]
    async fn test_remove_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::new(temp_dir.path());

        store.save(KeyStore::UNSPLASH_KEY, "abc").await.unwrap();
        assert!(store.remove(KeyStore::UNSPLASH_KEY).await.unwrap());
        assert!(!store.remove(KeyStore::UNSPLASH_KEY).await.unwrap());
        assert_eq!(store.load(KeyStore::UNSPLASH_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_store_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = KeyStore::new(temp_dir.path());
        std::fs::write(store.path(), "not json").unwrap();

        let err = store.load(KeyStore::MISTRAL_KEY).await.unwrap_err();
        assert!(matches!(err, KeyStoreError::Parse { .. }));
    }
}
