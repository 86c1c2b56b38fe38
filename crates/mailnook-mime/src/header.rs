//! MIME header handling.

use crate::encoding::decode_rfc2047;
use crate::error::{Error, Result};
use tracing::warn;

/// Collection of email headers.
///
/// Names keep the case they were written with; lookups ignore ASCII case.
/// Insertion order is preserved, so repeated headers (e.g. `Received`) stay
/// in the order they appeared in the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns an iterator over all headers in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of header lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///  folded continuation
    /// ```
    ///
    /// Parsing stops at the first empty line. A stray line (no colon, a bad
    /// name, or a continuation with nothing to continue) is skipped with a
    /// warning; the headers around it are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the block has lines but none of them is a header.
    pub fn parse(text: &str) -> Result<Self> {
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;
        let mut first_stray: Option<&str> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    if !value.is_empty() {
                        value.push(' ');
                    }
                    value.push_str(line.trim());
                } else {
                    warn!(line, "Skipping continuation without header");
                    first_stray.get_or_insert(line);
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }

            match line.split_once(':') {
                Some((name, value))
                    if !name.trim_end().is_empty()
                        && !name.trim_end().contains(char::is_whitespace) =>
                {
                    current = Some((name.trim_end().to_string(), value.trim().to_string()));
                }
                _ => {
                    warn!(line, "Skipping malformed header line");
                    first_stray.get_or_insert(line);
                }
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        match first_stray {
            Some(line) if headers.is_empty() => {
                Err(Error::InvalidHeader(format!("no header found before {line:?}")))
            }
            _ => Ok(headers),
        }
    }

    /// Decodes a header value from RFC 2047 if encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails.
    pub fn decode_value(value: &str) -> Result<String> {
        decode_rfc2047(value)
    }
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
    use proptest::prelude::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert_eq!(headers.get("content-type"), Some("text/plain")); // Case insensitive
    }

    #[test]
    fn test_headers_keep_source_case() {
        let mut headers = Headers::new();
        headers.add("X-Mailer", "mutt");
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["X-Mailer"]);
    }

    #[test]
    fn test_headers_parse() {
        let text = concat!(
            "From: sender@example.com\r\n",
            "To: recipient@example.com\r\n",
            "Subject: Test Message\r\n",
            "Content-Type: text/plain;\r\n",
            " charset=utf-8\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(text).unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("From"), Some("sender@example.com"));
        assert_eq!(headers.get("To"), Some("recipient@example.com"));
        assert_eq!(headers.get("Subject"), Some("Test Message"));
        assert_eq!(
            headers.get("Content-Type"),
            Some("text/plain; charset=utf-8")
        );
        assert!(headers.get("Body").is_none());
    }

    #[test]
    fn test_headers_parse_empty_value() {
        let headers = Headers::parse("Subject:\nTo: a@b\n").unwrap();
        assert_eq!(headers.get("Subject"), Some(""));
        assert_eq!(headers.get("To"), Some("a@b"));
    }

    #[test]
    fn test_headers_parse_rejects_garbage() {
        assert!(Headers::parse("this is not a header\n").is_err());
        assert!(Headers::parse(" leading continuation\n").is_err());
        assert!(Headers::parse("From bob@example.com Mon Jan 1\n").is_err());
    }

    #[test]
    fn test_headers_parse_skips_stray_lines() {
        let text = concat!(
            "From: alice@example.com\n",
            "this line is junk\n",
            "  and so is its continuation\n",
            "Subject: Still here\n",
            "Bad Name: value\n",
            "To: bob@example.com\n",
            "\n",
        );

        let headers = Headers::parse(text).unwrap();
        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["From", "Subject", "To"]);
        assert_eq!(headers.get("subject"), Some("Still here"));
    }

    #[test]
    fn test_headers_parse_mbox_separator() {
        let headers = Headers::parse("From bob@example.com Mon Jan 1\nSubject: hi\n").unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Subject"), Some("hi"));
    }

    #[test]
    fn test_headers_parse_empty_block() {
        assert!(Headers::parse("").unwrap().is_empty());
        assert!(Headers::parse("\nBody: text\n").unwrap().is_empty());
    }

    #[test]
    fn test_headers_iter() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("Received", "from b");

        let values: Vec<_> = headers.iter().map(|(_, v)| v).collect();
        assert_eq!(values, vec!["from a", "from b"]);
    }

    proptest! {
        #[test]
        fn prop_lookup_ignores_ascii_case(
            name in "[A-Za-z][A-Za-z0-9-]{0,20}",
            value in "[ -~]{0,40}",
        ) {
            let headers = Headers::parse(&format!("{name}: {value}\n")).unwrap();
            prop_assert_eq!(headers.get(&name.to_ascii_uppercase()), Some(value.trim()));
            prop_assert_eq!(headers.get(&name.to_ascii_lowercase()), Some(value.trim()));
        }

        #[test]
        fn prop_garbage_lines_never_drop_valid_headers(
            junk in prop::collection::vec("[a-z][a-z ]{0,19}", 0..5),
        ) {
            let mut text = String::from("Subject: kept\n");
            for line in &junk {
                text.push_str(line);
                text.push('\n');
            }
            text.push_str("To: also@kept\n");

            let headers = Headers::parse(&text).unwrap();
            prop_assert_eq!(headers.len(), 2);
            prop_assert_eq!(headers.get("Subject"), Some("kept"));
            prop_assert_eq!(headers.get("To"), Some("also@kept"));
        }
    }
}
