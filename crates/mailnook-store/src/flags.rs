//! Maildir message flags.
//!
//! Flags are single characters stored in the info part of a maildir
//! filename (`<id>:2,<flags>`). The recognized alphabet is the standard
//! maildir set plus `N` (explicit "new" marker) and the lowercase keyword
//! letters `a`-`z`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A single maildir flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    /// Message is a draft (`D`).
    Draft,
    /// Message is flagged for special attention (`F`).
    Flagged,
    /// Message is explicitly marked as new/unseen (`N`).
    New,
    /// Message has been forwarded, bounced or resent (`P`).
    Passed,
    /// Message has been replied to (`R`).
    Replied,
    /// Message has been read (`S`).
    Seen,
    /// Message is marked for deletion (`T`).
    Trashed,
    /// Keyword flag, one of `a`-`z`.
    Keyword(char),
}

impl Flag {
    /// Parses a flag character.
    ///
    /// Returns `None` for characters outside the recognized alphabet.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'D' => Some(Self::Draft),
            'F' => Some(Self::Flagged),
            'N' => Some(Self::New),
            'P' => Some(Self::Passed),
            'R' => Some(Self::Replied),
            'S' => Some(Self::Seen),
            'T' => Some(Self::Trashed),
            'a'..='z' => Some(Self::Keyword(c)),
            _ => None,
        }
    }

    /// Returns the flag as its filename character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Draft => 'D',
            Self::Flagged => 'F',
            Self::New => 'N',
            Self::Passed => 'P',
            Self::Replied => 'R',
            Self::Seen => 'S',
            Self::Trashed => 'T',
            Self::Keyword(c) => c,
        }
    }

    /// Returns true if `c` is in the recognized alphabet.
    #[must_use]
    pub const fn is_valid(c: char) -> bool {
        Self::from_char(c).is_some()
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl TryFrom<char> for Flag {
    type Error = Error;

    fn try_from(c: char) -> Result<Self> {
        Self::from_char(c).ok_or(Error::InvalidFlag(c))
    }
}

/// Set of flag characters, rendered in ASCII order.
///
/// Mutators only accept the recognized alphabet. Characters outside it can
/// only enter through [`Flags::from_info`], so that unknown flags written by
/// other programs survive a rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    chars: BTreeSet<char>,
}

impl Flags {
    /// Creates an empty flag set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a flag set from the info part of a filename, keeping every
    /// character (deduplicated).
    #[must_use]
    pub fn from_info(info: &str) -> Self {
        Self {
            chars: info.chars().collect(),
        }
    }

    /// Adds a flag.
    ///
    /// Returns `Ok(true)` if the flag was added, `Ok(false)` if it was
    /// already present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] if `c` is outside the alphabet.
    pub fn insert(&mut self, c: char) -> Result<bool> {
        let flag = Flag::try_from(c)?;
        Ok(self.chars.insert(flag.as_char()))
    }

    /// Removes a flag.
    ///
    /// Returns `Ok(true)` if the flag was removed, `Ok(false)` if it was
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFlag`] if `c` is outside the alphabet.
    pub fn remove(&mut self, c: char) -> Result<bool> {
        let flag = Flag::try_from(c)?;
        Ok(self.chars.remove(&flag.as_char()))
    }

    /// Returns true if the character is present.
    #[must_use]
    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    /// Returns true if the message has been seen.
    #[must_use]
    pub fn is_seen(&self) -> bool {
        self.contains('S')
    }

    /// Returns true if the message has been replied to.
    #[must_use]
    pub fn is_replied(&self) -> bool {
        self.contains('R')
    }

    /// Returns true if the message is flagged.
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.contains('F')
    }

    /// Returns true if the message is marked for deletion.
    #[must_use]
    pub fn is_trashed(&self) -> bool {
        self.contains('T')
    }

    /// Returns true if the message is a draft.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.contains('D')
    }

    /// Returns an iterator over the recognized flags, skipping unknown
    /// characters.
    pub fn iter(&self) -> impl Iterator<Item = Flag> + '_ {
        self.chars.iter().filter_map(|&c| Flag::from_char(c))
    }

    /// Returns the number of characters in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl FromStr for Flags {
    type Err = Error;

    /// Parses a caller-supplied flag string, rejecting unknown characters.
    fn from_str(s: &str) -> Result<Self> {
        let mut flags = Self::new();
        for c in s.chars() {
            flags.insert(c)?;
        }
        Ok(flags)
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.chars.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        Self {
            chars: iter.into_iter().map(Flag::as_char).collect(),
        }
    }
}
