//! Lock-guarded persisted state files.
//!
//! Every piece of client state that survives a restart (session token,
//! checkout selection, last catalog page) lives in its own JSON file next
//! to a `.lock` file. Reads return the lock so that a read-modify-write
//! sequence holds it for the whole cycle.

use std::path::{Path, PathBuf};

use fslock::LockFile;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{serialize_atomically, traceable_path, SerializeError};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to create state directory {}", .0.display())]
    CreateDir(PathBuf, #[source] std::io::Error),
    #[error("failed to open lockfile {}", .0.display())]
    OpenLock(PathBuf, #[source] fslock::Error),
    #[error("failed to lock lockfile {}", .0.display())]
    Lock(PathBuf, #[source] fslock::Error),
    #[error("failed to read state file {}", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to remove state file {}", .0.display())]
    Remove(PathBuf, #[source] std::io::Error),
    #[error(transparent)]
    Write(#[from] SerializeError),
}

/// Acquires the filesystem-based lock guarding a state file.
pub fn acquire_state_lock(state_path: impl AsRef<Path>) -> Result<LockFile, StateError> {
    let lock_path = state_lock_path(&state_path);
    let lock_parent = lock_path.parent().expect("lock path has parent");
    if !lock_parent.exists() {
        std::fs::create_dir_all(lock_parent)
            .map_err(|e| StateError::CreateDir(lock_parent.to_path_buf(), e))?;
    }
    let mut lock =
        LockFile::open(&lock_path).map_err(|e| StateError::OpenLock(lock_path.clone(), e))?;
    lock.lock().map_err(|e| StateError::Lock(lock_path, e))?;
    Ok(lock)
}

/// Returns the path to the lock file for a state file.
/// The presence of the lock file does not indicate an active lock because the
/// file isn't removed after use.
/// This is a separate file because the state file is replaced on write.
fn state_lock_path(state_path: impl AsRef<Path>) -> PathBuf {
    state_path.as_ref().with_extension("lock")
}

/// Returns the parsed state file or `None` if the file does not exist or no
/// longer parses (a stale or older-version file is discarded, not an error).
///
/// This function acquires a lock on the file,
/// which should be reused for writing, to avoid TOCTOU issues.
pub fn read_state_file<T>(path: impl AsRef<Path>) -> Result<(Option<T>, LockFile), StateError>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let lock = acquire_state_lock(path)?;

    if !path.exists() {
        debug!(path = traceable_path(path), "state file not found");
        return Ok((None, lock));
    }

    let contents =
        std::fs::read_to_string(path).map_err(|e| StateError::Read(path.to_path_buf(), e))?;
    match serde_json::from_str(&contents) {
        Ok(parsed) => Ok((Some(parsed), lock)),
        Err(err) => {
            warn!(
                path = traceable_path(path),
                %err,
                "discarding unparseable state file"
            );
            Ok((None, lock))
        },
    }
}

/// Writes a state file atomically and releases the lock afterwards.
///
/// This uses [serialize_atomically] and inherits its requirements:
/// * `path` must have a parent directory.
/// * The lock must correspond to the file being written.
pub fn write_state_file<T>(
    value: &T,
    path: impl AsRef<Path>,
    lock: LockFile,
) -> Result<(), StateError>
where
    T: ?Sized + Serialize,
{
    serialize_atomically(value, &path.as_ref(), lock)?;
    Ok(())
}

/// Removes a state file while holding its lock.
pub fn remove_state_file(path: impl AsRef<Path>, _lock: LockFile) -> Result<(), StateError> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StateError::Remove(path.to_path_buf(), e)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::Version;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestState {
        version: Version<1>,
        token: Option<String>,
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let (state, _lock) = read_state_file::<TestState>(&path).unwrap();
        assert_eq!(state, None);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let (state, lock) = read_state_file::<TestState>(&path).unwrap();
        assert_eq!(state, None);
        let value = TestState {
            version: Version,
            token: Some("tok".to_string()),
        };
        write_state_file(&value, &path, lock).unwrap();

        let (state, _lock) = read_state_file::<TestState>(&path).unwrap();
        assert_eq!(state, Some(value));
    }

    #[test]
    fn version_mismatch_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, r#"{"version": 9, "token": "tok"}"#).unwrap();

        let (state, _lock) = read_state_file::<TestState>(&path).unwrap();
        assert_eq!(state, None);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let (_, lock) = read_state_file::<TestState>(&path).unwrap();
        remove_state_file(&path, lock).unwrap();

        let (_, lock) = read_state_file::<TestState>(&path).unwrap();
        remove_state_file(&path, lock).unwrap();
    }
}
