//! Recursive mailbox discovery.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::classify::{MAILDIR_SUBDIRS, is_directory, is_mailbox};

/// Options controlling a discovery walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Maximum number of directory levels below the root to descend.
    pub max_depth: usize,
    /// Whether symlinked directories are descended into.
    pub follow_symlinks: bool,
    /// Whether dot-directories (Maildir++ `.Folder`s) are scanned.
    pub include_hidden: bool,
}

impl DiscoveryOptions {
    /// Default depth limit.
    pub const DEFAULT_MAX_DEPTH: usize = 32;

    /// Creates an options builder.
    #[must_use]
    pub fn builder() -> DiscoveryOptionsBuilder {
        DiscoveryOptionsBuilder::new()
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            follow_symlinks: true,
            include_hidden: true,
        }
    }
}

/// Builder for discovery options.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptionsBuilder {
    options: DiscoveryOptions,
}

impl DiscoveryOptionsBuilder {
    /// Creates a new builder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the depth limit.
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    /// Sets whether symlinked directories are followed.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.options.follow_symlinks = follow;
        self
    }

    /// Sets whether dot-directories are scanned.
    #[must_use]
    pub const fn include_hidden(mut self, include: bool) -> Self {
        self.options.include_hidden = include;
        self
    }

    /// Builds the options.
    #[must_use]
    pub fn build(self) -> DiscoveryOptions {
        self.options
    }
}

/// Returns every mailbox at or below `root`, sorted and without duplicates.
///
/// Uses [`DiscoveryOptions::default`]. See [`discover_with`].
#[must_use]
pub fn discover(root: impl AsRef<Path>) -> Vec<PathBuf> {
    discover_with(root, &DiscoveryOptions::default())
}

/// Returns every mailbox at or below `root`, sorted and without duplicates.
///
/// The root itself is included when it is a mailbox. Mailboxes nested inside
/// other mailboxes are found too, but the `cur`, `new` and `tmp`
/// subdirectories of a mailbox are never scanned. An empty root means the
/// current directory.
///
/// Never fails: an unreadable root yields an empty list, and unreadable
/// subdirectories are skipped. A directory whose canonical path is already
/// on the current descent path is not entered again, so symlink loops
/// terminate while symlinked aliases of a mailbox are still reported.
#[must_use]
pub fn discover_with(root: impl AsRef<Path>, options: &DiscoveryOptions) -> Vec<PathBuf> {
    let root = root.as_ref();
    let root = if root.as_os_str().is_empty() {
        Path::new(".")
    } else {
        root
    };

    let mut walk = Walk {
        options,
        ancestors: HashSet::new(),
        found: Vec::new(),
    };
    walk.visit(root, 0);

    let mut found = walk.found;
    found.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    found.dedup();
    debug!(root = %root.display(), count = found.len(), "Mailbox discovery finished");
    found
}

struct Walk<'a> {
    options: &'a DiscoveryOptions,
    /// Canonical paths of the directories currently being descended.
    ancestors: HashSet<PathBuf>,
    found: Vec<PathBuf>,
}

impl Walk<'_> {
    fn visit(&mut self, dir: &Path, depth: usize) {
        let Ok(canonical) = fs::canonicalize(dir) else {
            trace!(path = %dir.display(), "Skipping unresolvable directory");
            return;
        };
        if !self.ancestors.insert(canonical.clone()) {
            warn!(path = %dir.display(), "Directory loops back to an ancestor, skipping");
            return;
        }

        let mailbox = is_mailbox(dir);
        if mailbox {
            debug!(path = %dir.display(), "Found mailbox");
            self.found.push(dir.to_path_buf());
        }

        if depth >= self.options.max_depth {
            debug!(path = %dir.display(), depth, "Depth limit reached");
        } else {
            for child in self.subdirectories(dir, mailbox) {
                self.visit(&child, depth + 1);
            }
        }

        self.ancestors.remove(&canonical);
    }

    /// Lists the subdirectories of `dir` worth descending into, sorted.
    ///
    /// The directory handle is closed before this returns.
    fn subdirectories(&self, dir: &Path, mailbox: bool) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %dir.display(), error = %e, "Cannot read directory");
                return Vec::new();
            }
        };

        let mut children = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            let name = entry.file_name();
            if mailbox && MAILDIR_SUBDIRS.iter().any(|sub| name == *sub) {
                continue;
            }
            if !self.options.include_hidden && name.as_encoded_bytes().starts_with(b".") {
                continue;
            }

            let path = entry.path();
            let descend = if self.options.follow_symlinks {
                is_directory(&path)
            } else {
                entry.file_type().is_ok_and(|t| t.is_dir())
            };
            if descend {
                trace!(path = %path.display(), "Queued directory");
                children.push(path);
            }
        }
        children.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        children
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_mailbox(path: &Path) {
        for sub in MAILDIR_SUBDIRS {
            fs::create_dir_all(path.join(sub)).unwrap();
        }
    }

    #[test]
    fn nested_mailboxes() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("inbox"));
        make_mailbox(&root.join("inbox/archive"));

        let found = discover(root);
        assert_eq!(found, vec![root.join("inbox"), root.join("inbox/archive")]);
    }

    #[test]
    fn root_is_mailbox() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(root);
        make_mailbox(&root.join(".Sent"));

        let found = discover(root);
        assert_eq!(found, vec![root.to_path_buf(), root.join(".Sent")]);
    }

    #[test]
    fn deep_non_mailbox_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("a/b/c/work"));
        fs::create_dir_all(root.join("a/empty")).unwrap();
        fs::write(root.join("a/file"), b"not a dir").unwrap();

        assert_eq!(discover(root), vec![root.join("a/b/c/work")]);
    }

    #[test]
    fn required_subdirectories_are_not_scanned() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("inbox"));
        // A mailbox hidden inside cur/ must not be reported
        make_mailbox(&root.join("inbox/cur/odd"));

        assert_eq!(discover(root), vec![root.join("inbox")]);
    }

    #[test]
    fn lexicographic_order() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("inbox"));
        make_mailbox(&root.join("inbox/archive"));
        make_mailbox(&root.join("inbox-2"));
        make_mailbox(&root.join("Drafts"));

        let found = discover(root);
        assert_eq!(
            found,
            vec![
                root.join("Drafts"),
                root.join("inbox"),
                root.join("inbox-2"),
                root.join("inbox/archive"),
            ]
        );
    }

    #[test]
    fn missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(discover(tmp.path().join("missing")).is_empty());
    }

    #[test]
    fn file_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"").unwrap();
        assert!(discover(&file).is_empty());
    }

    #[test]
    fn depth_limit() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("one"));
        make_mailbox(&root.join("x/y/three"));

        let options = DiscoveryOptions::builder().max_depth(1).build();
        assert_eq!(discover_with(root, &options), vec![root.join("one")]);
    }

    #[test]
    fn hidden_directories_can_be_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join(".Trash"));
        make_mailbox(&root.join("inbox"));

        let options = DiscoveryOptions::builder().include_hidden(false).build();
        assert_eq!(discover_with(root, &options), vec![root.join("inbox")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_terminates() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("a/box"));
        std::os::unix::fs::symlink(root, root.join("a/loop")).unwrap();

        assert_eq!(discover(root), vec![root.join("a/box")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_aliases_are_all_reported() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("inbox"));
        std::os::unix::fs::symlink(root.join("inbox"), root.join("alias")).unwrap();
        std::os::unix::fs::symlink(root.join("inbox"), root.join("zz")).unwrap();

        assert_eq!(
            discover(root),
            vec![root.join("alias"), root.join("inbox"), root.join("zz")]
        );
    }

    /// Locks `path` and reports whether the lock is enforced (it is not for
    /// a privileged user).
    #[cfg(unix)]
    fn lock(path: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
        fs::read_dir(path).is_err()
    }

    #[cfg(unix)]
    fn unlock(path: &Path) {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_mailbox(&root.join("inbox"));

        let enforced = lock(&root);
        let found = discover(&root);
        unlock(&root);

        if enforced {
            assert!(found.is_empty());
        }
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_subdirectory_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        make_mailbox(&root.join("a-inbox"));
        make_mailbox(&root.join("locked/inner"));
        make_mailbox(&root.join("z-work"));

        let enforced = lock(&root.join("locked"));
        let found = discover(root);
        unlock(&root.join("locked"));

        if enforced {
            assert_eq!(found, vec![root.join("a-inbox"), root.join("z-work")]);
        } else {
            assert!(found.contains(&root.join("a-inbox")));
            assert!(found.contains(&root.join("z-work")));
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_not_followed_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("root");
        make_mailbox(&tmp.path().join("elsewhere/box"));
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("elsewhere"), root.join("link")).unwrap();

        assert_eq!(discover(&root), vec![root.join("link/box")]);

        let options = DiscoveryOptions::builder().follow_symlinks(false).build();
        assert!(discover_with(&root, &options).is_empty());
    }
}
