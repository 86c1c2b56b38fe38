//! Read-only view of one decomposed MIME part.

use std::borrow::Cow;

use mailnook_mime::encoding::decode_charset;
use mailnook_mime::{ContentType, Headers, Part};
use tracing::warn;

/// One leaf of a message's MIME structure.
///
/// Only produced by [`Message::parts`](crate::Message::parts).
#[derive(Debug, Clone)]
pub struct MessagePart {
    inner: Part,
    content_type: ContentType,
}

impl MessagePart {
    pub(crate) fn new(inner: Part) -> Self {
        let content_type = inner.content_type().unwrap_or_else(|e| {
            warn!(error = %e, "Invalid Content-Type, assuming text/plain");
            ContentType::text_plain()
        });
        Self {
            inner,
            content_type,
        }
    }

    /// Returns `type/subtype`, lowercased.
    #[must_use]
    pub fn content_type(&self) -> String {
        self.content_type.mime_type()
    }

    /// Returns the charset parameter, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.content_type.charset()
    }

    /// Returns the disposition type (`inline`, `attachment`, ...), if the
    /// part declares one.
    #[must_use]
    pub fn disposition(&self) -> Option<String> {
        let value = self.inner.headers.get("content-disposition")?;
        let kind = value.split(';').next().unwrap_or_default().trim();
        (!kind.is_empty()).then(|| kind.to_ascii_lowercase())
    }

    /// Returns true if the part is declared as an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.inner
            .disposition()
            .ok()
            .flatten()
            .is_some_and(|d| d.is_attachment())
    }

    /// Returns the suggested filename, from the disposition or the legacy
    /// `name` content-type parameter.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let disposition = self.inner.disposition().ok().flatten();
        let raw = disposition
            .as_ref()
            .and_then(|d| d.filename())
            .or_else(|| self.content_type.name())?;
        Some(Headers::decode_value(raw).unwrap_or_else(|_| raw.to_string()))
    }

    /// Returns the part headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.inner.headers
    }

    /// Returns the content, either as stored or with its transfer encoding
    /// removed.
    ///
    /// If decoding fails the stored bytes are returned.
    #[must_use]
    pub fn content(&self, decode: bool) -> Cow<'_, [u8]> {
        if !decode {
            return Cow::Borrowed(&self.inner.body);
        }
        match self.inner.decode_body() {
            Ok(bytes) => Cow::Owned(bytes),
            Err(e) => {
                warn!(error = %e, "Cannot decode part body, returning raw content");
                Cow::Borrowed(&self.inner.body)
            }
        }
    }

    /// Returns the decoded content as text, using the declared charset.
    #[must_use]
    pub fn text(&self) -> String {
        decode_charset(self.charset().unwrap_or("utf-8"), &self.content(true))
    }

    /// Size of the stored (still encoded) content in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.body.len()
    }
}
