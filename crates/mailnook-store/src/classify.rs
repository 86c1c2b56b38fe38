//! Path classification: which directories are mailboxes.
//!
//! Every check here fails closed. A path that cannot be stat'ed (missing,
//! permission denied, broken symlink) is simply "not a directory".

use std::fs;
use std::path::Path;

/// Subdirectory holding messages not yet seen by any client.
pub const NEW_DIR: &str = "new";
/// Subdirectory holding messages already picked up by a client.
pub const CUR_DIR: &str = "cur";
/// Subdirectory used for in-progress deliveries.
pub const TMP_DIR: &str = "tmp";

/// The three subdirectories every mailbox must have.
pub const MAILDIR_SUBDIRS: [&str; 3] = [CUR_DIR, NEW_DIR, TMP_DIR];

/// Returns true if `path` resolves (following symlinks) to a directory.
#[must_use]
pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Returns true if `path` resolves (following symlinks) to a regular file.
#[must_use]
pub fn is_message_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

/// Returns true if `path` is a directory containing `cur`, `new` and `tmp`
/// subdirectories.
#[must_use]
pub fn is_mailbox(path: &Path) -> bool {
    is_directory(path)
        && MAILDIR_SUBDIRS
            .iter()
            .all(|sub| is_directory(&path.join(sub)))
}
