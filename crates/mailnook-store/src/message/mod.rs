//! Message entity: one maildir message file.
//!
//! The path is derived from `(directory, MaildirName)`, so flags and path
//! never disagree. Headers and parts are parsed on first use and cached
//! until [`Message::refresh`] is called.

mod part;

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use mailnook_mime::{Headers, Part};
use tracing::{debug, warn};

pub use part::MessagePart;

use crate::classify::{CUR_DIR, NEW_DIR};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::filename::MaildirName;
use crate::flags::Flags;

/// Reads the header block of a file, up to and including the blank line.
fn read_header_block(path: &Path) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut block = Vec::new();
    loop {
        let start = block.len();
        if reader.read_until(b'\n', &mut block)? == 0 {
            break;
        }
        let line = &block[start..];
        if line == b"\n" || line == b"\r\n" {
            break;
        }
    }
    Ok(block)
}

/// Builds the name -> value map: first occurrence wins, names keep their
/// source case, values are RFC 2047-decoded where possible.
fn header_map(headers: &Headers) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers.iter() {
        if map.keys().any(|k: &String| k.eq_ignore_ascii_case(name)) {
            continue;
        }
        let value = Headers::decode_value(value).unwrap_or_else(|_| value.to_string());
        map.insert(name.to_string(), value);
    }
    map
}

/// A single message stored in a maildir.
#[derive(Debug)]
pub struct Message {
    dir: PathBuf,
    name: MaildirName,
    context: Context,
    headers: OnceCell<BTreeMap<String, String>>,
    parts: OnceCell<Vec<MessagePart>>,
}

impl Message {
    /// Creates a message handle with the default [`Context`].
    ///
    /// Nothing is read from disk until headers or parts are requested.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_context(path, Context::default())
    }

    /// Creates a message handle with explicit collaborators.
    #[must_use]
    pub fn with_context(path: impl AsRef<Path>, context: Context) -> Self {
        let (dir, name) = split_path(path.as_ref());
        Self {
            dir,
            name,
            context,
            headers: OnceCell::new(),
            parts: OnceCell::new(),
        }
    }

    /// Current on-disk location.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(self.name.render())
    }

    /// Points the handle at a new location without moving any file.
    ///
    /// Flags are re-derived from the new filename. Cached headers and parts
    /// are kept; call [`Message::refresh`] if the content may differ.
    pub fn set_path(&mut self, path: impl AsRef<Path>) {
        let (dir, name) = split_path(path.as_ref());
        self.dir = dir;
        self.name = name;
    }

    /// Stable unique identifier (the filename without its flag suffix).
    #[must_use]
    pub fn id(&self) -> &OsStr {
        self.name.id()
    }

    /// Drops cached headers and parts so the next access re-reads the file.
    pub fn refresh(&mut self) {
        self.headers.take();
        self.parts.take();
    }

    /// Reads the raw message bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn raw(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.path())?)
    }

    /// Returns the value of a header, looked up case-insensitively.
    ///
    /// Returns `None` if the header is absent or the message cannot be
    /// parsed.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers()
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Like [`Message::header`], but an absent header is `""`.
    #[must_use]
    pub fn header_or_empty(&self, name: &str) -> &str {
        self.header(name).unwrap_or_default()
    }

    /// Returns all headers, one entry per distinct name.
    ///
    /// An unreadable message, or one without a single well-formed header
    /// line, yields an empty map.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        self.headers.get_or_init(|| self.load_headers())
    }

    fn load_headers(&self) -> BTreeMap<String, String> {
        let path = self.path();
        let block = match read_header_block(&path) {
            Ok(block) => block,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read message headers");
                return BTreeMap::new();
            }
        };
        match self.context.parser().headers(&block) {
            Ok(headers) => {
                debug!(path = %path.display(), count = headers.len(), "Parsed headers");
                header_map(&headers)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed message headers");
                BTreeMap::new()
            }
        }
    }

    /// Returns the `Subject` header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("subject")
    }

    /// Returns the `From` header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.header("from")
    }

    /// Returns the `To` header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.header("to")
    }

    /// Parses the `Date` header.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is present but not an RFC 2822 date.
    pub fn date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.header("date")
            .map(|d| {
                DateTime::parse_from_rfc2822(d.trim())
                    .map_err(|e| Error::Mime(mailnook_mime::Error::from(e)))
            })
            .transpose()
    }

    /// Returns the leaf MIME parts of the message, depth first.
    ///
    /// - An unreadable file has no parts.
    /// - A single-part message has one part holding the whole body.
    /// - A message whose structure cannot be parsed has one part holding the
    ///   whole file.
    pub fn parts(&self) -> &[MessagePart] {
        self.parts.get_or_init(|| self.load_parts())
    }

    fn load_parts(&self) -> Vec<MessagePart> {
        let path = self.path();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cannot read message");
                return Vec::new();
            }
        };
        let leaves = match self.context.parser().parse(&raw) {
            Ok(message) => message.into_leaves(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed message, using raw content");
                vec![Part::new(Headers::new(), raw)]
            }
        };
        debug!(path = %path.display(), count = leaves.len(), "Decomposed message");
        leaves.into_iter().map(MessagePart::new).collect()
    }

    /// Returns the parts declared as attachments.
    pub fn attachments(&self) -> impl Iterator<Item = &MessagePart> {
        self.parts().iter().filter(|p| p.is_attachment())
    }

    /// Current flag string, in ASCII order.
    #[must_use]
    pub fn flags(&self) -> String {
        self.name.flags().to_string()
    }

    /// Current flag set.
    #[must_use]
    pub const fn flag_set(&self) -> &Flags {
        self.name.flags()
    }

    /// Returns true if the flag is set.
    #[must_use]
    pub fn has_flag(&self, flag: char) -> bool {
        self.name.flags().contains(flag)
    }

    /// Replaces all flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] if any character is outside the
    /// alphabet (nothing changes), or [`Error::Persist`] if the rename fails.
    pub fn set_flags(&mut self, flags: &str) -> Result<()> {
        let flags: Flags = flags.parse()?;
        let name = self.name.with_flags(flags);
        self.commit(self.dir.clone(), name)
    }

    /// Adds a flag.
    ///
    /// Returns `Ok(true)` if the flag was added and the file renamed,
    /// `Ok(false)` if it was already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] or [`Error::Persist`]; the message is
    /// unchanged in both cases.
    pub fn add_flag(&mut self, flag: char) -> Result<bool> {
        let mut name = self.name.clone();
        if !name.flags_mut().insert(flag)? {
            return Ok(false);
        }
        self.commit(self.dir.clone(), name)?;
        Ok(true)
    }

    /// Removes a flag.
    ///
    /// Returns `Ok(true)` if the flag was removed and the file renamed,
    /// `Ok(false)` if it was absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] or [`Error::Persist`]; the message is
    /// unchanged in both cases.
    pub fn remove_flag(&mut self, flag: char) -> Result<bool> {
        let mut name = self.name.clone();
        if !name.flags_mut().remove(flag)? {
            return Ok(false);
        }
        self.commit(self.dir.clone(), name)?;
        Ok(true)
    }

    /// Returns true if the message lives in a `new/` directory.
    #[must_use]
    pub fn in_new_dir(&self) -> bool {
        self.dir.file_name().is_some_and(|n| n == NEW_DIR)
    }

    /// Returns true if the message is new: not seen, and either still in
    /// `new/` or explicitly marked with `N`.
    #[must_use]
    pub fn is_new(&self) -> bool {
        let flags = self.name.flags();
        !flags.is_seen() && (self.in_new_dir() || flags.contains('N'))
    }

    /// Returns true if the message has not been seen.
    #[must_use]
    pub fn is_unread(&self) -> bool {
        !self.name.flags().is_seen()
    }

    /// Marks the message as read: sets `S`, clears `N`, and moves it from
    /// `new/` to `cur/`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn mark_seen(&mut self) -> Result<()> {
        let mut name = self.name.clone();
        name.flags_mut().insert('S')?;
        name.flags_mut().remove('N')?;

        let dir = if self.in_new_dir() {
            self.dir.with_file_name(CUR_DIR)
        } else {
            self.dir.clone()
        };
        self.commit(dir, name)
    }

    /// Clears the seen flag. The message stays where it is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn mark_unseen(&mut self) -> Result<()> {
        self.remove_flag('S').map(drop)
    }

    /// Toggles the flagged state, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn toggle_flagged(&mut self) -> Result<bool> {
        if self.has_flag('F') {
            self.remove_flag('F')?;
            Ok(false)
        } else {
            self.add_flag('F')?;
            Ok(true)
        }
    }

    /// Records that a reply was sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn mark_replied(&mut self) -> Result<()> {
        self.add_flag('R').map(drop)
    }

    /// Marks the message for deletion.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn mark_trashed(&mut self) -> Result<()> {
        self.add_flag('T').map(drop)
    }

    /// Clears the deletion mark.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persist`] if the rename fails.
    pub fn untrash(&mut self) -> Result<()> {
        self.remove_flag('T').map(drop)
    }

    /// Moves the file to `dir/name` through the persister, then adopts the
    /// new location. On failure nothing changes.
    fn commit(&mut self, dir: PathBuf, name: MaildirName) -> Result<()> {
        let from = self.path();
        let to = dir.join(name.render());
        self.context
            .persister()
            .rename_if_needed(&from, &to)
            .map_err(|source| Error::Persist {
                from,
                to,
                source,
            })?;
        self.dir = dir;
        self.name = name;
        Ok(())
    }
}

/// Splits a message path into its directory and parsed filename.
fn split_path(path: &Path) -> (PathBuf, MaildirName) {
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let file_name = path.file_name().unwrap_or(path.as_os_str());
    (dir, MaildirName::parse(file_name))
}
