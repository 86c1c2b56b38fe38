//! # mailnook-mime
//!
//! MIME message parsing for the mailnook maildir store.
//!
//! ## Features
//!
//! - **Message parsing**: RFC 5322 header block plus recursive multipart bodies
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Content types**: `Content-Type` and `Content-Disposition` parameters
//!
//! ## Quick Start
//!
//! ```
//! use mailnook_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: Test\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw).unwrap();
//! assert_eq!(message.subject(), Some("Test"));
//!
//! let parts = message.into_leaves();
//! assert_eq!(parts[0].body, b"Hello, World!");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::{ContentDisposition, ContentType, DispositionKind};
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
