//! Collaborators injected into message entities.

use std::fmt;
use std::sync::Arc;

use mailnook_mime::{Headers, Message as MimeMessage};

use crate::persist::{DetachedPersister, FlagPersister, RenamePersister};

/// Turns raw message bytes into headers and a part tree.
pub trait MimeParser: Send + Sync {
    /// Parses only the header block.
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is malformed.
    fn headers(&self, raw: &[u8]) -> mailnook_mime::Result<Headers>;

    /// Parses the whole message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message structure cannot be parsed.
    fn parse(&self, raw: &[u8]) -> mailnook_mime::Result<MimeMessage>;
}

/// [`MimeParser`] backed by `mailnook-mime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardMimeParser;

impl MimeParser for StandardMimeParser {
    fn headers(&self, raw: &[u8]) -> mailnook_mime::Result<Headers> {
        Headers::parse(&String::from_utf8_lossy(raw))
    }

    fn parse(&self, raw: &[u8]) -> mailnook_mime::Result<MimeMessage> {
        MimeMessage::parse(raw)
    }
}

/// Collaborators a [`Message`](crate::Message) uses for parsing and for
/// persisting flag changes.
#[derive(Clone)]
pub struct Context {
    parser: Arc<dyn MimeParser>,
    persister: Arc<dyn FlagPersister>,
}

impl Context {
    /// Creates a context from explicit collaborators.
    #[must_use]
    pub fn new(parser: Arc<dyn MimeParser>, persister: Arc<dyn FlagPersister>) -> Self {
        Self { parser, persister }
    }

    /// Standard parser, flag changes stay in memory.
    #[must_use]
    pub fn detached() -> Self {
        Self::new(Arc::new(StandardMimeParser), Arc::new(DetachedPersister))
    }

    /// Replaces the MIME parser.
    #[must_use]
    pub fn with_parser(mut self, parser: Arc<dyn MimeParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Replaces the flag persister.
    #[must_use]
    pub fn with_persister(mut self, persister: Arc<dyn FlagPersister>) -> Self {
        self.persister = persister;
        self
    }

    pub(crate) fn parser(&self) -> &dyn MimeParser {
        self.parser.as_ref()
    }

    pub(crate) fn persister(&self) -> &dyn FlagPersister {
        self.persister.as_ref()
    }
}

impl Default for Context {
    /// Standard parser, flag changes rename files on disk.
    fn default() -> Self {
        Self::new(Arc::new(StandardMimeParser), Arc::new(RenamePersister))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}
