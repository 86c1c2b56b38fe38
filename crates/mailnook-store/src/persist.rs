//! Persistence boundary for flag changes.
//!
//! A flag mutation on a [`Message`](crate::Message) computes the new path
//! first, asks the persister to move the file, and only then updates its
//! in-memory state.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};

/// Moves a message file when its name or directory changes.
pub trait FlagPersister: Send + Sync {
    /// Moves `from` to `to` if they differ.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the move fails.
    fn rename_if_needed(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Renames files on disk.
///
/// A source that no longer exists is not an error: the message was removed
/// behind our back, and the in-memory handle is still allowed to change.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenamePersister;

impl FlagPersister for RenamePersister {
    fn rename_if_needed(&self, from: &Path, to: &Path) -> io::Result<()> {
        if from == to {
            return Ok(());
        }
        match fs::rename(from, to) {
            Ok(()) => {
                debug!(from = %from.display(), to = %to.display(), "Renamed message");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !from.exists() => {
                warn!(path = %from.display(), "Message file vanished, updating handle only");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Never touches the filesystem.
///
/// For callers that relocate files themselves, or for in-memory use.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedPersister;

impl FlagPersister for DetachedPersister {
    fn rename_if_needed(&self, _from: &Path, _to: &Path) -> io::Result<()> {
        Ok(())
    }
}
