//! File-backed session store.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, instrument};

use super::{SESSION_KEY, SessionError, SessionStore, SessionToken};

/// Stores session keys as a JSON object in a single file.
///
/// The file holds a flat string map so that `clear` can drop every key the
/// client ever wrote by removing the file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store backed by `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_map(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(map)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn store(&self, token: &SessionToken) -> Result<(), SessionError> {
        let mut map = self.read_map().await?;
        map.insert(SESSION_KEY.to_string(), token.expose().to_string());
        self.write_map(&map).await?;
        debug!("Session token stored");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<SessionToken>, SessionError> {
        let map = self.read_map().await?;
        Ok(map
            .get(SESSION_KEY)
            .filter(|token| !token.is_empty())
            .map(SessionToken::new))
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn clear(&self) -> Result<(), SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Session storage cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
