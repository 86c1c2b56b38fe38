//! MIME message structure and parsing.

use crate::content_type::{ContentDisposition, ContentType};
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use chrono::{DateTime, FixedOffset};

/// Multipart nesting deeper than this is kept as an opaque leaf.
const MAX_NESTING: usize = 32;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit binary.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses transfer encoding from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit, // Default (includes "7bit")
        }
    }
}

/// MIME message part.
///
/// A multipart part carries its children in `parts`; a leaf part carries its
/// content in `body`.
#[derive(Debug, Clone, Default)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Part body (raw bytes, still transfer-encoded).
    pub body: Vec<u8>,
    /// Child parts of a multipart part.
    pub parts: Vec<Part>,
}

impl Part {
    /// Creates a new leaf part.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self {
            headers,
            body,
            parts: Vec::new(),
        }
    }

    /// Parses a part from raw bytes (headers, blank line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if the header block is malformed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        parse_entity(raw, 0)
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the content disposition, if the part has one.
    ///
    /// # Errors
    ///
    /// Returns an error if the disposition header is invalid.
    pub fn disposition(&self) -> Result<Option<ContentDisposition>> {
        self.headers
            .get("content-disposition")
            .map(ContentDisposition::parse)
            .transpose()
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns true if this part has child parts.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Decodes the body according to the transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&self.body),
            TransferEncoding::QuotedPrintable => decode_quoted_printable(&self.body),
            _ => Ok(self.body.clone()),
        }
    }

    /// Consumes the part, returning its leaves depth first.
    #[must_use]
    pub fn into_leaves(self) -> Vec<Self> {
        if self.parts.is_empty() {
            return vec![self];
        }
        self.parts.into_iter().flat_map(Self::into_leaves).collect()
    }
}

/// MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    /// Message headers.
    pub headers: Headers,
    /// Message parts (empty for single-part messages).
    pub parts: Vec<Part>,
    /// Body for single-part messages.
    pub body: Option<Vec<u8>>,
}

impl Message {
    /// Parses a complete RFC 5322 message.
    ///
    /// A `multipart/*` message whose boundary is missing, or never appears in
    /// the body, is treated as single-part.
    ///
    /// # Errors
    ///
    /// Returns an error if the top-level header block is malformed.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let root = parse_entity(raw, 0)?;
        if root.parts.is_empty() {
            Ok(Self {
                headers: root.headers,
                parts: Vec::new(),
                body: Some(root.body),
            })
        } else {
            Ok(Self {
                headers: root.headers,
                parts: root.parts,
                body: None,
            })
        }
    }

    /// Gets the content type.
    ///
    /// # Errors
    ///
    /// Returns an error if content type header is invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Checks if the message was decomposed into parts.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.headers.get("to")
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Parses the Date header.
    ///
    /// Returns `Ok(None)` when the header is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is not a valid RFC 2822 date.
    pub fn date(&self) -> Result<Option<DateTime<FixedOffset>>> {
        self.headers
            .get("date")
            .map(|d| DateTime::parse_from_rfc2822(d.trim()).map_err(Error::from))
            .transpose()
    }

    /// Returns the leaf parts of the message, depth first.
    ///
    /// A single-part message yields one part holding the message headers
    /// and the whole body.
    #[must_use]
    pub fn into_leaves(self) -> Vec<Part> {
        match self.body {
            Some(body) => vec![Part::new(self.headers, body)],
            None => self.parts.into_iter().flat_map(Part::into_leaves).collect(),
        }
    }
}

/// Splits raw bytes at the first empty line.
///
/// Without an empty line, everything is header and the body is empty.
fn split_header_body(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in raw.split_inclusive(|&b| b == b'\n') {
        if line == b"\n" || line == b"\r\n" {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}

/// Strips one trailing line break (`\n` or `\r\n`).
fn strip_line_break(bytes: &[u8]) -> &[u8] {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes.strip_suffix(b"\r").unwrap_or(bytes)
}

/// Splits a multipart body into the raw bytes of each body part.
///
/// Returns `None` if no delimiter line is found.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Option<Vec<&'a [u8]>> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();
    let mut sections = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;
    let mut seen_delimiter = false;

    for line in body.split_inclusive(|&b| b == b'\n') {
        let trimmed = line.trim_ascii_end();
        if let Some(rest) = trimmed.strip_prefix(delimiter) {
            let closing = rest == b"--";
            if closing || rest.is_empty() {
                seen_delimiter = true;
                if let Some(s) = start {
                    // The line break before a delimiter belongs to the delimiter
                    sections.push(strip_line_break(&body[s..offset]));
                }
                if closing {
                    return Some(sections);
                }
                start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }

    if !seen_delimiter {
        return None;
    }
    // Missing close delimiter: keep what follows the last delimiter
    if let Some(s) = start {
        sections.push(&body[s..]);
    }
    Some(sections)
}

fn parse_entity(raw: &[u8], depth: usize) -> Result<Part> {
    let (head, body) = split_header_body(raw);
    let headers = Headers::parse(&String::from_utf8_lossy(head))?;
    let mut part = Part::new(headers, body.to_vec());

    let boundary = match part.content_type() {
        Ok(ct) if ct.is_multipart() && depth < MAX_NESTING => ct.boundary().map(str::to_string),
        _ => None,
    };
    let Some(boundary) = boundary else {
        return Ok(part);
    };
    let Some(sections) = split_multipart(body, &boundary) else {
        return Ok(part);
    };

    for section in sections {
        // A body part may legitimately start with the blank line (no headers)
        let child = if section.starts_with(b"\n") || section.starts_with(b"\r\n") {
            let content = section.strip_prefix(b"\r\n").unwrap_or(section);
            let content = content.strip_prefix(b"\n").unwrap_or(content);
            Part::new(Headers::new(), content.to_vec())
        } else {
            // A broken body part must not hide its siblings
            parse_entity(section, depth + 1)
                .unwrap_or_else(|_| Part::new(Headers::new(), section.to_vec()))
        };
        part.parts.push(child);
    }

    if part.parts.is_empty() {
        return Ok(part);
    }
    part.body.clear();
    Ok(part)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    const MULTIPART: &str = concat!(
        "From: alice@example.com\r\n",
        "Subject: Report\r\n",
        "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
        "\r\n",
        "This is the preamble.\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain; charset=utf-8\r\n",
        "\r\n",
        "Plain body\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>HTML body</p>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: application/pdf; name=\"r.pdf\"\r\n",
        "Content-Disposition: attachment; filename=\"r.pdf\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "SGVsbG8s\r\n",
        "IFdvcmxkIQ==\r\n",
        "--outer--\r\n",
        "Epilogue\r\n"
    );

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::parse("BASE64"), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
    }

    #[test]
    fn test_split_header_body() {
        let (head, body) = split_header_body(b"A: b\r\n\r\nbody\r\n");
        assert_eq!(head, b"A: b\r\n");
        assert_eq!(body, b"body\r\n");

        let (head, body) = split_header_body(b"A: b\n");
        assert_eq!(head, b"A: b\n");
        assert!(body.is_empty());
    }

    #[test]
    fn test_parse_single_part() {
        let raw = b"From: sender@example.com\nSubject: Test\n\nHello, World!\nSecond line\n";
        let message = Message::parse(raw).unwrap();

        assert!(!message.is_multipart());
        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.subject(), Some("Test"));
        assert_eq!(
            message.body.as_deref(),
            Some(&b"Hello, World!\nSecond line\n"[..])
        );

        let leaves = message.into_leaves();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].body, b"Hello, World!\nSecond line\n");
    }

    #[test]
    fn test_parse_nested_multipart() {
        let message = Message::parse(MULTIPART.as_bytes()).unwrap();
        assert!(message.is_multipart());
        assert_eq!(message.parts.len(), 2);
        assert_eq!(message.parts[0].parts.len(), 2);

        let leaves = message.into_leaves();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[0].content_type().unwrap().mime_type(), "text/plain");
        assert_eq!(leaves[0].body, b"Plain body");
        assert_eq!(leaves[1].body, b"<p>HTML body</p>");

        let attachment = &leaves[2];
        assert!(attachment.disposition().unwrap().unwrap().is_attachment());
        assert_eq!(attachment.decode_body().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_multipart_without_boundary_is_single_part() {
        let raw = b"Content-Type: multipart/mixed\n\n--x\nbody\n--x--\n";
        let message = Message::parse(raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.body.as_deref(), Some(&b"--x\nbody\n--x--\n"[..]));
    }

    #[test]
    fn test_multipart_with_absent_boundary_is_single_part() {
        let raw = b"Content-Type: multipart/mixed; boundary=zzz\n\nno delimiters here\n";
        let message = Message::parse(raw).unwrap();
        assert!(!message.is_multipart());
        assert_eq!(message.into_leaves().len(), 1);
    }

    #[test]
    fn test_multipart_missing_close_delimiter() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\n\nfirst\n--b\n\nsecond\n";
        let leaves = Message::parse(raw).unwrap().into_leaves();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].body, b"first");
        assert_eq!(leaves[1].body, b"second\n");
    }

    #[test]
    fn test_part_without_headers_defaults_to_text_plain() {
        let raw = b"Content-Type: multipart/mixed; boundary=b\n\n--b\n\nbare\n--b--\n";
        let leaves = Message::parse(raw).unwrap().into_leaves();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].headers.is_empty());
        assert_eq!(leaves[0].content_type().unwrap().mime_type(), "text/plain");
    }

    #[test]
    fn test_parse_malformed_headers() {
        assert!(Message::parse(b"not a header line\n\nbody").is_err());
    }

    #[test]
    fn test_quoted_printable_body() {
        let raw = b"Content-Transfer-Encoding: quoted-printable\n\ncaf=C3=A9=\n au lait";
        let leaves = Message::parse(raw).unwrap().into_leaves();
        let decoded = leaves[0].decode_body().unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "café au lait");
    }

    #[test]
    fn test_date() {
        let message = Message::parse(b"Date: Tue, 1 Jul 2003 10:52:37 +0200\n\n").unwrap();
        let date = message.date().unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "2003-07-01T10:52:37+02:00");

        let message = Message::parse(b"Date: yesterday\n\n").unwrap();
        assert!(message.date().is_err());

        let message = Message::parse(b"Subject: x\n\n").unwrap();
        assert!(message.date().unwrap().is_none());
    }
}
