//! # mailnook-store
//!
//! Maildir storage: finding mailboxes, listing their messages, and reading
//! and flagging individual messages.
//!
//! ## Features
//!
//! - **Discovery**: recursive, cycle-safe search for mailbox directories
//! - **Flags**: validated maildir flag sets encoded in filenames
//! - **Messages**: lazily parsed headers and MIME parts, flag changes that
//!   rename the file
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailnook_store::{Mailbox, discover};
//!
//! for path in discover("/home/me/Maildir") {
//!     let mailbox = Mailbox::open(&path)?;
//!     for mut message in mailbox.messages() {
//!         if message.is_new() {
//!             println!("{}", message.subject().unwrap_or("(no subject)"));
//!             message.mark_seen()?;
//!         }
//!     }
//! }
//! # Ok::<(), mailnook_store::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod classify;
mod context;
mod discovery;
mod error;
mod filename;
mod flags;
mod mailbox;
mod message;
mod persist;

pub use classify::{
    CUR_DIR, MAILDIR_SUBDIRS, NEW_DIR, TMP_DIR, is_directory, is_mailbox, is_message_file,
};
pub use context::{Context, MimeParser, StandardMimeParser};
pub use discovery::{DiscoveryOptions, DiscoveryOptionsBuilder, discover, discover_with};
pub use error::{Error, Result};
pub use filename::{INFO_SEPARATOR, MaildirName};
pub use flags::{Flag, Flags};
pub use mailbox::{Mailbox, MailboxStats};
pub use message::{Message, MessagePart};
pub use persist::{DetachedPersister, FlagPersister, RenamePersister};
