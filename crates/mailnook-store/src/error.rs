//! Error types for the store.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in store operations.
///
/// Discovery and classification never fail: a missing or unreadable path is
/// reported as "not a mailbox" or an empty result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Flag character outside the recognized alphabet.
    #[error("Invalid flag character: {0:?}")]
    InvalidFlag(char),

    /// MIME parsing or decoding failed.
    #[error("MIME error: {0}")]
    Mime(#[from] mailnook_mime::Error),

    /// Path is not a directory with `new`, `cur` and `tmp` subdirectories.
    #[error("Not a mailbox: {}", .0.display())]
    NotAMailbox(PathBuf),

    /// Moving a message file to its new name failed.
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    Persist {
        /// Current location.
        from: PathBuf,
        /// Requested location.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
