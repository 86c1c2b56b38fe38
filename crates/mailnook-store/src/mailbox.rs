//! Listing the messages of one mailbox.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::classify::{CUR_DIR, NEW_DIR, is_mailbox, is_message_file};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::message::Message;

/// Message counts for a mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Messages in `new/` and `cur/`.
    pub total: usize,
    /// Messages without the seen flag.
    pub unread: usize,
    /// Messages that are new (see [`Message::is_new`]).
    pub new: usize,
}

/// A validated mailbox directory.
#[derive(Debug, Clone)]
pub struct Mailbox {
    path: PathBuf,
}

impl Mailbox {
    /// Opens a mailbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAMailbox`] if `path` lacks any of the `cur`, `new`
    /// and `tmp` subdirectories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !is_mailbox(&path) {
            return Err(Error::NotAMailbox(path));
        }
        Ok(Self { path })
    }

    /// Mailbox directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mailbox name: the last path component.
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    /// Returns the message files in `new/` and `cur/`, sorted.
    ///
    /// Dotfiles and directories are skipped; `tmp/` is never listed. An
    /// unreadable subdirectory contributes nothing.
    #[must_use]
    pub fn message_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for sub in [NEW_DIR, CUR_DIR] {
            let dir = self.path.join(sub);
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Cannot list messages");
                    continue;
                }
            };
            for entry in entries.flatten() {
                if entry.file_name().as_encoded_bytes().starts_with(b".") {
                    continue;
                }
                let path = entry.path();
                if is_message_file(&path) {
                    paths.push(path);
                }
            }
        }
        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        debug!(mailbox = %self.path.display(), count = paths.len(), "Listed messages");
        paths
    }

    /// Returns a [`Message`] for every file in [`Mailbox::message_paths`].
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.messages_with(&Context::default())
    }

    /// Like [`Mailbox::messages`], sharing `context` between all messages.
    #[must_use]
    pub fn messages_with(&self, context: &Context) -> Vec<Message> {
        self.message_paths()
            .into_iter()
            .map(|p| Message::with_context(p, context.clone()))
            .collect()
    }

    /// Counts messages by state. Only filenames are inspected.
    #[must_use]
    pub fn stats(&self) -> MailboxStats {
        self.messages_with(&Context::detached())
            .iter()
            .fold(MailboxStats::default(), |mut stats, m| {
                stats.total += 1;
                if m.is_unread() {
                    stats.unread += 1;
                }
                if m.is_new() {
                    stats.new += 1;
                }
                stats
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::{MAILDIR_SUBDIRS, TMP_DIR};
    use tempfile::TempDir;

    fn make_mailbox(path: &Path) {
        for sub in MAILDIR_SUBDIRS {
            fs::create_dir_all(path.join(sub)).unwrap();
        }
    }

    #[test]
    fn open_rejects_plain_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("cur")).unwrap();
        assert!(matches!(Mailbox::open(tmp.path()), Err(Error::NotAMailbox(_))));
        assert!(Mailbox::open(tmp.path().join("missing")).is_err());
    }

    #[test]
    fn lists_new_and_cur_only() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("inbox");
        make_mailbox(&root);
        fs::write(root.join(NEW_DIR).join("2.host"), b"").unwrap();
        fs::write(root.join(CUR_DIR).join("1.host:2,S"), b"").unwrap();
        fs::write(root.join(CUR_DIR).join(".hidden"), b"").unwrap();
        fs::create_dir(root.join(CUR_DIR).join("subdir")).unwrap();
        fs::write(root.join(TMP_DIR).join("3.host"), b"").unwrap();

        let mailbox = Mailbox::open(&root).unwrap();
        assert_eq!(mailbox.name(), "inbox");
        assert_eq!(
            mailbox.message_paths(),
            vec![
                root.join(CUR_DIR).join("1.host:2,S"),
                root.join(NEW_DIR).join("2.host"),
            ]
        );
    }

    #[test]
    fn stats_counts_states() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(root);
        fs::write(root.join(NEW_DIR).join("1.host"), b"").unwrap();
        fs::write(root.join(CUR_DIR).join("2.host:2,S"), b"").unwrap();
        fs::write(root.join(CUR_DIR).join("3.host:2,"), b"").unwrap();
        fs::write(root.join(CUR_DIR).join("4.host:2,FN"), b"").unwrap();

        let stats = Mailbox::open(root).unwrap().stats();
        assert_eq!(
            stats,
            MailboxStats {
                total: 4,
                unread: 3,
                new: 2,
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_listed_verbatim() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        make_mailbox(tmp.path());
        let path = tmp.path().join(CUR_DIR).join(OsStr::from_bytes(b"1.ho\xffst:2,S"));
        fs::write(&path, b"Subject: latin\n\nbody\n").unwrap();

        let messages = Mailbox::open(tmp.path()).unwrap().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].path(), path);
        assert_eq!(messages[0].subject(), Some("latin"));
    }

    #[test]
    fn empty_mailbox() {
        let tmp = TempDir::new().unwrap();
        make_mailbox(tmp.path());
        let mailbox = Mailbox::open(tmp.path()).unwrap();
        assert!(mailbox.messages().is_empty());
        assert_eq!(mailbox.stats(), MailboxStats::default());
    }
}
