//! The session token cell.
//!
//! Exactly one copy of the access token exists at runtime: this cell.
//! It is initialized from the persisted snapshot once, at construction,
//! and every outbound request reads it from here, never from disk.
//! Single writer contract: only login, refresh and logout (and the
//! gateway's forced logout on a rejected token) mutate it.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use storefront_core::state::{read_state_file, remove_state_file, write_state_file, StateError};
use storefront_core::{traceable_path, Version};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to load session state")]
    Load(#[source] StateError),
    #[error("failed to persist session state")]
    Persist(#[source] StateError),
}

/// On-disk form of the session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionOnDisk {
    version: Version<1>,
    access_token: String,
}

#[derive(Debug)]
pub struct Session {
    token: Mutex<Option<String>>,
    file: Option<PathBuf>,
}

impl Session {
    /// Initializes the session from its persisted snapshot.
    ///
    /// A missing or unreadable snapshot starts the session signed out;
    /// it is not an error.
    pub fn load(file: PathBuf) -> Result<Self, SessionError> {
        let (on_disk, _lock) =
            read_state_file::<SessionOnDisk>(&file).map_err(SessionError::Load)?;
        let token = on_disk.map(|s| s.access_token);
        debug!(
            file = traceable_path(&file),
            restored = token.is_some(),
            "loaded session snapshot"
        );
        Ok(Session {
            token: Mutex::new(token),
            file: Some(file),
        })
    }

    /// A session that is never persisted. Used by tests and one-shot
    /// embedders.
    pub fn ephemeral(token: Option<String>) -> Self {
        Session {
            token: Mutex::new(token),
            file: None,
        }
    }

    /// The current access token, if signed in.
    pub fn token(&self) -> Option<String> {
        self.token.lock().expect("session lock poisoned").clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    /// Stores a fresh access token and persists the snapshot.
    pub fn set(&self, token: String) -> Result<(), SessionError> {
        *self.token.lock().expect("session lock poisoned") = Some(token.clone());
        let Some(ref file) = self.file else {
            return Ok(());
        };
        let (_, lock) = read_state_file::<SessionOnDisk>(file).map_err(SessionError::Persist)?;
        write_state_file(
            &SessionOnDisk {
                version: Version,
                access_token: token,
            },
            file,
            lock,
        )
        .map_err(SessionError::Persist)?;
        Ok(())
    }

    /// Signs the session out, removing the persisted snapshot.
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.token.lock().expect("session lock poisoned") = None;
        let Some(ref file) = self.file else {
            return Ok(());
        };
        let (_, lock) = read_state_file::<SessionOnDisk>(file).map_err(SessionError::Persist)?;
        remove_state_file(file, lock).map_err(SessionError::Persist)?;
        debug!(file = traceable_path(file), "cleared session snapshot");
        Ok(())
    }
}
