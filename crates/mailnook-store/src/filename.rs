//! Maildir filename model.
//!
//! Format: `<unique>[:2,<flags>]`, e.g. `1733356800.M12P345.host:2,FS`.
//! The unique part identifies the message for its whole life; only the
//! info part changes when flags do.
//!
//! Names are handled as raw OS strings: the unique part may hold bytes that
//! are not valid UTF-8 and must survive a rename untouched.

use std::ffi::{OsStr, OsString};

use crate::flags::Flags;

/// Separator between the unique part and the flag list.
pub const INFO_SEPARATOR: &str = ":2,";

/// Parsed maildir filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaildirName {
    id: OsString,
    flags: Flags,
    has_info: bool,
}

impl MaildirName {
    /// Parses a filename as found in `new/` or `cur/`.
    ///
    /// Names without an info part (typical for fresh deliveries) have no
    /// flags. A name whose info part is not UTF-8 is kept whole as the
    /// unique part.
    #[must_use]
    pub fn parse(filename: impl AsRef<OsStr>) -> Self {
        let filename = filename.as_ref();
        match split_info(filename) {
            Some((id, info)) => Self {
                id,
                flags: Flags::from_info(info),
                has_info: true,
            },
            None => Self {
                id: filename.to_os_string(),
                flags: Flags::new(),
                has_info: false,
            },
        }
    }

    /// Stable unique part of the name.
    #[must_use]
    pub fn id(&self) -> &OsStr {
        &self.id
    }

    /// Current flags.
    #[must_use]
    pub const fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Mutable access to the flags.
    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Returns a copy of this name carrying `flags`.
    #[must_use]
    pub fn with_flags(&self, flags: Flags) -> Self {
        Self {
            id: self.id.clone(),
            flags,
            has_info: self.has_info,
        }
    }

    /// Renders the filename. The info part is written whenever the original
    /// name had one or there is at least one flag.
    #[must_use]
    pub fn render(&self) -> OsString {
        let mut name = self.id.clone();
        if self.has_info || !self.flags.is_empty() {
            name.push(INFO_SEPARATOR);
            name.push(self.flags.to_string());
        }
        name
    }
}

/// Splits `name` at its last info separator.
///
/// Returns `None` if there is no separator or the info part is not UTF-8.
fn split_info(name: &OsStr) -> Option<(OsString, &str)> {
    let bytes = name.as_encoded_bytes();
    let separator = INFO_SEPARATOR.as_bytes();
    let at = bytes
        .windows(separator.len())
        .rposition(|w| w == separator)?;
    let info = std::str::from_utf8(&bytes[at + separator.len()..]).ok()?;
    Some((id_prefix(name, at)?, info))
}

/// The first `len` bytes of `name`; `len` always sits on an ASCII boundary.
#[cfg(unix)]
#[allow(clippy::unnecessary_wraps)]
fn id_prefix(name: &OsStr, len: usize) -> Option<OsString> {
    use std::os::unix::ffi::OsStrExt;

    Some(OsStr::from_bytes(&name.as_bytes()[..len]).to_os_string())
}

#[cfg(not(unix))]
fn id_prefix(name: &OsStr, len: usize) -> Option<OsString> {
    name.to_str().and_then(|s| s.get(..len)).map(OsString::from)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_with_flags() {
        let name = MaildirName::parse("1234.host:2,S");
        assert_eq!(name.id(), "1234.host");
        assert!(name.flags().is_seen());
        assert_eq!(name.render(), "1234.host:2,S");
    }

    #[test]
    fn parse_without_info() {
        let name = MaildirName::parse("1234.host");
        assert_eq!(name.id(), "1234.host");
        assert!(name.flags().is_empty());
        assert_eq!(name.render(), "1234.host");
    }

    #[test]
    fn parse_empty_info() {
        let name = MaildirName::parse("1234.host:2,");
        assert!(name.flags().is_empty());
        assert_eq!(name.render(), "1234.host:2,");
    }

    #[test]
    fn render_sorts_flags() {
        let name = MaildirName::parse("1234.host:2,SRF");
        assert_eq!(name.render(), "1234.host:2,FRS");
    }

    #[test]
    fn adding_flag_creates_info() {
        let mut name = MaildirName::parse("1234.host");
        name.flags_mut().insert('S').unwrap();
        assert_eq!(name.render(), "1234.host:2,S");
    }

    #[test]
    fn with_flags_keeps_id() {
        let name = MaildirName::parse("1234.host,S=42:2,S");
        let renamed = name.with_flags("FS".parse().unwrap());
        assert_eq!(renamed.id(), "1234.host,S=42");
        assert_eq!(renamed.render(), "1234.host,S=42:2,FS");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_id_survives_rename() {
        use std::os::unix::ffi::OsStrExt;

        let name = MaildirName::parse(OsStr::from_bytes(b"1.ho\xffst:2,S"));
        assert_eq!(name.id().as_bytes(), b"1.ho\xffst");
        assert!(name.flags().is_seen());

        let renamed = name.with_flags("FS".parse().unwrap());
        assert_eq!(renamed.render().as_bytes(), b"1.ho\xffst:2,FS");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_info_is_opaque() {
        use std::os::unix::ffi::OsStrExt;

        let raw = OsStr::from_bytes(b"1.host:2,S\xfe");
        let name = MaildirName::parse(raw);
        assert_eq!(name.id(), raw);
        assert!(name.flags().is_empty());
        assert_eq!(name.render(), raw);
    }

    proptest! {
        #[test]
        fn id_survives_flag_changes(id in "[0-9]{1,10}\\.[A-Za-z0-9_.]{1,20}", flags in "[DFPRST]{0,6}") {
            let name = MaildirName::parse(&id);
            let renamed = name.with_flags(flags.parse().unwrap());
            let reparsed = MaildirName::parse(renamed.render());
            prop_assert_eq!(reparsed.id(), OsStr::new(&id));
            prop_assert_eq!(reparsed.flags(), renamed.flags());
        }
    }
}
