//! MIME message: the root [`Part`] plus the parsing pipeline.

use crate::body::{Body, Encoding};
use crate::encoding::decode_rfc2047;
use crate::header::Header;
use crate::part::Part;
use regex::Regex;
use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static HEADER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([A-Za-z0-9-]+):").expect("header name pattern is valid"));

#[allow(clippy::expect_used)]
static FOLDED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n[ \t]+").expect("folding pattern is valid"));

/// A complete MIME message.
///
/// A message is a root [`Part`]; every part operation is available through
/// `Deref`. Rendering a composite message emits the preamble line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    root: Part,
}

/// Result of parsing one boundary-delimited segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPart {
    /// A leaf part.
    Single(Part),
    /// The children of a nested multipart segment.
    Many(Vec<Part>),
}

impl ParsedPart {
    /// Adds the result to `parent`; nested children are wrapped in a group.
    pub fn attach_to(self, parent: &mut Part) {
        match self {
            Self::Single(part) => {
                parent.add_part(part);
            }
            Self::Many(parts) => {
                parent.add_group(parts);
            }
        }
    }

    /// Converts the result into one part; nested children become a group.
    #[must_use]
    pub fn into_part(self) -> Part {
        match self {
            Self::Single(part) => part,
            Self::Many(parts) => Part::group(parts),
        }
    }
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the root part.
    #[must_use]
    pub fn into_part(self) -> Part {
        self.root
    }

    /// Parses a raw message into a tree.
    ///
    /// Parsing is lenient: malformed input yields the best tree it can
    /// rather than an error.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (headers, body) = match split_blank_line(text) {
            Some((head, body)) if starts_with_header(head) => (Self::parse_headers(head), body),
            None if starts_with_header(text) => (Self::parse_headers(text), ""),
            _ => {
                tracing::debug!("message has no header block");
                (Vec::new(), text)
            }
        };

        let boundary = find_boundary(&headers);
        let mut message = Self::new();
        message.add_headers(headers);
        if let Some(boundary) = &boundary {
            message.set_boundary(boundary.as_str());
        }

        let segments = Self::parse_body(body, boundary.as_deref());
        tracing::debug!(
            boundary = boundary.as_deref().unwrap_or_default(),
            segments = segments.len(),
            "parsed message body"
        );
        for segment in segments {
            Self::parse_part(segment).attach_to(&mut message);
        }

        message
    }

    /// Parses a header block into headers.
    ///
    /// Folded continuation lines are joined, and repeated names are merged
    /// into one multi-valued header.
    #[must_use]
    pub fn parse_headers(text: &str) -> Vec<Header> {
        let unfolded = FOLDED_LINE.replace_all(text, " ");
        let names: Vec<_> = HEADER_NAME.find_iter(&unfolded).collect();
        if names.is_empty() {
            tracing::warn!("no headers found in header block");
            return Vec::new();
        }

        let mut headers: Vec<Header> = Vec::new();
        for (index, name) in names.iter().enumerate() {
            let end = names
                .get(index + 1)
                .map_or(unfolded.len(), regex::Match::start);
            let value = unfolded[name.end()..end].trim();
            let header = Header::parse(&format!("{} {value}", name.as_str()));
            tracing::trace!(name = header.name(), "parsed header");

            match headers
                .iter_mut()
                .find(|h| h.name().eq_ignore_ascii_case(header.name()))
            {
                Some(existing) => {
                    for value in header.values() {
                        existing.add_value(value.clone());
                    }
                }
                None => headers.push(header),
            }
        }

        headers
    }

    /// Splits a body into segments on `--boundary`.
    ///
    /// Text before the first delimiter and after the closing delimiter is
    /// dropped, as are blank segments. Without a boundary (or when the
    /// delimiter never occurs) the whole text is one segment.
    #[must_use]
    pub fn parse_body<'a>(text: &'a str, boundary: Option<&str>) -> Vec<&'a str> {
        let whole = || {
            if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        };

        let Some(boundary) = boundary.filter(|b| !b.is_empty()) else {
            return whole();
        };
        let delimiter = format!("--{boundary}");
        if !text.contains(&delimiter) {
            tracing::debug!(boundary, "boundary not found in body");
            return whole();
        }

        let mut segments = Vec::new();
        for segment in text.split(delimiter.as_str()).skip(1) {
            if segment.starts_with("--") {
                break;
            }
            let segment = strip_leading_line_break(segment);
            if !segment.trim().is_empty() {
                segments.push(segment);
            }
        }
        segments
    }

    /// Parses one segment into a leaf part, or into the children of a
    /// nested multipart when the segment declares its own boundary.
    #[must_use]
    pub fn parse_part(segment: &str) -> ParsedPart {
        let (headers, body) = match split_blank_line(segment) {
            Some((head, body)) if starts_with_header(head) => (Self::parse_headers(head), body),
            _ => (Vec::new(), segment),
        };

        if let Some(boundary) = find_boundary(&headers) {
            tracing::trace!(%boundary, "nested multipart segment");
            let children = Self::parse_body(body, Some(&boundary))
                .into_iter()
                .map(|child| Self::parse_part(child).into_part())
                .collect();
            return ParsedPart::Many(children);
        }

        let mut part = Part::new();
        part.add_headers(headers);

        let content = strip_trailing_line_break(body);
        if !content.trim().is_empty() {
            let encoding = match part
                .header("Content-Transfer-Encoding")
                .and_then(Header::first_value)
            {
                Some(name) => Encoding::from_transfer_encoding(name),
                None if is_form_field(&part) => Some(Encoding::RawUrl),
                None => None,
            };

            let mut body = Body::new(content);
            if let Some(encoding) = encoding {
                body.set_encoding(encoding).set_as_encoded(true);
            }
            if part
                .header("Content-Disposition")
                .is_some_and(Header::is_attachment)
            {
                body.set_as_file(true);
            }
            part.set_body(body);
        }

        ParsedPart::Single(part)
    }

    /// Decodes RFC 2047 encoded words, returning the input unchanged if it
    /// cannot be decoded.
    #[must_use]
    pub fn decode_text(text: &str) -> String {
        decode_rfc2047(text).unwrap_or_else(|e| {
            tracing::warn!(?e, "Failed to decode header text");
            text.to_string()
        })
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.header("Subject").and_then(Header::first_value)
    }

    /// Gets the From header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.header("From").and_then(Header::first_value)
    }

    /// Gets the To header.
    #[must_use]
    pub fn to(&self) -> Option<&str> {
        self.header("To").and_then(Header::first_value)
    }

    /// Gets the Date header.
    #[must_use]
    pub fn date(&self) -> Option<&str> {
        self.header("Date").and_then(Header::first_value)
    }

    /// Gets the Message-ID header.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.header("Message-ID").and_then(Header::first_value)
    }
}

impl From<Part> for Message {
    fn from(root: Part) -> Self {
        Self { root }
    }
}

impl Deref for Message {
    type Target = Part;

    fn deref(&self) -> &Part {
        &self.root
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut Part {
        &mut self.root
    }
}

fn split_blank_line(text: &str) -> Option<(&str, &str)> {
    text.split_once("\r\n\r\n")
        .or_else(|| text.split_once("\n\n"))
}

fn starts_with_header(text: &str) -> bool {
    HEADER_NAME.find(text).is_some_and(|m| m.start() == 0)
}

fn strip_leading_line_break(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

fn strip_trailing_line_break(text: &str) -> &str {
    text.strip_suffix("\r\n")
        .or_else(|| text.strip_suffix('\n'))
        .unwrap_or(text)
}

fn find_boundary(headers: &[Header]) -> Option<String> {
    headers
        .iter()
        .find_map(|header| header.parameter("boundary"))
        .map(ToString::to_string)
}

fn is_form_field(part: &Part) -> bool {
    part.header("Content-Disposition").is_some_and(|header| {
        header
            .first_value()
            .is_some_and(|value| value.eq_ignore_ascii_case("form-data"))
            && !header.has_parameter("filename")
    })
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
    use crate::header::HeaderValue;

    const ALTERNATIVE: &str = "From: sender@example.com\r\n\
        To: recipient@example.com\r\n\
        Subject: Test\r\n\
        Content-Type: multipart/alternative; boundary=abc123\r\n\
        \r\n\
        This is a multi-part message in MIME format.\r\n\
        --abc123\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        Hello, World!\r\n\
        --abc123\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <b>Hello, World!</b>\r\n\
        --abc123--\r\n";

    #[test]
    fn test_parse_headers_simple() {
        let headers = Message::parse_headers("Subject: Hi\r\nTo: a@example.com");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].name(), "Subject");
        assert_eq!(headers[0].first_value(), Some("Hi"));
        assert_eq!(headers[1].first_value(), Some("a@example.com"));
    }

    #[test]
    fn test_parse_headers_folded() {
        let headers = Message::parse_headers(
            "Content-Type: multipart/mixed;\r\n\tboundary=\"xyz\"\r\nSubject: Long\r\n subject line",
        );
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].parameter("boundary"), Some("xyz"));
        assert_eq!(headers[1].first_value(), Some("Long subject line"));
    }

    #[test]
    fn test_parse_headers_merges_repeated() {
        let headers = Message::parse_headers("Received: one\r\nX-A: 1\r\nReceived: two");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].len(), 2);
        assert_eq!(headers[0].value(1).unwrap().value(), Some("two"));
    }

    #[test]
    fn test_parse_headers_ignores_colons_mid_line() {
        let headers = Message::parse_headers("Subject: Re: hello\r\nTo: a@example.com");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].first_value(), Some("Re: hello"));
    }

    #[test]
    fn test_parse_headers_empty() {
        assert!(Message::parse_headers("no headers here").is_empty());
    }

    #[test]
    fn test_parse_body_without_boundary() {
        let text = "Hello World! What's up?!";
        assert_eq!(Message::parse_body(text, None), vec![text]);
        assert_eq!(Message::parse_body(text, Some("missing")), vec![text]);
        assert!(Message::parse_body("  \r\n", None).is_empty());
    }

    #[test]
    fn test_parse_body_segments() {
        let body = "preamble\r\n--b\r\nA: 1\r\n\r\none\r\n--b\r\nA: 2\r\n\r\ntwo\r\n--b--\r\nepilogue";
        let segments = Message::parse_body(body, Some("b"));
        assert_eq!(
            segments,
            vec!["A: 1\r\n\r\none\r\n", "A: 2\r\n\r\ntwo\r\n"]
        );
    }

    #[test]
    fn test_parse_part_plain_body() {
        let ParsedPart::Single(part) = Message::parse_part("Hello World! What's up?!") else {
            panic!("expected a leaf");
        };
        assert!(!part.has_headers());
        assert_eq!(part.contents_as_string().unwrap(), "Hello World! What's up?!");
    }

    #[test]
    fn test_parse_part_base64_attachment() {
        let segment = "Content-Disposition: attachment; filename=notes.txt\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            SGVsbG8gV29ybGQh\r\n";
        let ParsedPart::Single(part) = Message::parse_part(segment) else {
            panic!("expected a leaf");
        };
        let body = part.body().unwrap();
        assert!(body.is_base64());
        assert!(body.is_encoded());
        assert!(body.is_file());
        assert_eq!(part.filename().as_deref(), Some("notes.txt"));
        assert_eq!(part.contents_as_string().unwrap(), "Hello World!");
    }

    #[test]
    fn test_parse_part_form_field_defaults_to_raw_url() {
        let segment = "Content-Disposition: form-data; name=email\r\n\r\nadmin%40example.com\r\n";
        let ParsedPart::Single(part) = Message::parse_part(segment) else {
            panic!("expected a leaf");
        };
        assert!(part.body().unwrap().is_raw_url());
        assert_eq!(part.contents_as_string().unwrap(), "admin@example.com");
    }

    #[test]
    fn test_parse_part_transfer_encoding_wins_for_form_field() {
        let segment = "Content-Disposition: form-data; name=note\r\n\
            Content-Transfer-Encoding: quoted-printable\r\n\
            \r\n\
            caf=C3=A9\r\n";
        let ParsedPart::Single(part) = Message::parse_part(segment) else {
            panic!("expected a leaf");
        };
        assert!(part.body().unwrap().is_quoted());
        assert_eq!(part.contents_as_string().unwrap(), "café");
    }

    #[test]
    fn test_parse_part_empty_body() {
        let ParsedPart::Single(part) = Message::parse_part("X-Empty: yes\r\n\r\n\r\n") else {
            panic!("expected a leaf");
        };
        assert!(part.has_header("X-Empty"));
        assert!(!part.has_body());
    }

    #[test]
    fn test_parse_part_nested() {
        let segment = "Content-Type: multipart/alternative; boundary=inner\r\n\
            \r\n\
            --inner\r\n\
            Content-Type: text/plain\r\n\
            \r\n\
            plain\r\n\
            --inner\r\n\
            Content-Type: text/html\r\n\
            \r\n\
            html\r\n\
            --inner--\r\n";
        let ParsedPart::Many(children) = Message::parse_part(segment) else {
            panic!("expected nested parts");
        };
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].content_type(), Some("text/html"));
    }

    #[test]
    fn test_parse_message() {
        let message = Message::parse(ALTERNATIVE);
        assert_eq!(message.headers().len(), 4);
        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.to(), Some("recipient@example.com"));
        assert_eq!(message.subject(), Some("Test"));
        assert_eq!(message.boundary(), Some("abc123"));
        assert_eq!(message.parts().len(), 2);
        assert_eq!(
            message.parts()[0].contents_as_string().unwrap(),
            "Hello, World!"
        );
        assert_eq!(message.parts()[1].content_type(), Some("text/html"));
    }

    #[test]
    fn test_parse_message_single_part() {
        let message = Message::parse("Subject: Note\r\nMessage-ID: <1@example.com>\r\n\r\nJust text.");
        assert_eq!(message.subject(), Some("Note"));
        assert_eq!(message.message_id(), Some("<1@example.com>"));
        assert_eq!(message.parts().len(), 1);
        assert_eq!(message.parts()[0].contents_as_string().unwrap(), "Just text.");
    }

    #[test]
    fn test_parse_message_without_headers() {
        let message = Message::parse("Hello World! What's up?!");
        assert!(!message.has_headers());
        assert_eq!(message.parts().len(), 1);
    }

    #[test]
    fn test_parse_keeps_boundary_on_render() {
        let mut message = Message::parse(ALTERNATIVE);
        let rendered = message.render().unwrap();
        assert!(rendered.contains("--abc123\r\n"));
        assert!(rendered.ends_with("--abc123--\r\n"));

        let reparsed = Message::parse(&rendered);
        assert_eq!(reparsed.headers().len(), message.headers().len());
        assert_eq!(reparsed.parts().len(), 2);
    }

    #[test]
    fn test_decode_text() {
        assert_eq!(Message::decode_text("=?UTF-8?Q?caf=C3=A9?="), "café");
        assert_eq!(Message::decode_text("plain"), "plain");
    }

    #[test]
    fn test_deref_builds_tree() {
        let mut message = Message::new();
        message
            .set_header("Subject", "Built")
            .set_sub_type("mixed")
            .set_boundary("b1")
            .add_part(
                Part::new()
                    .with_header(Header::with_value(
                        "Content-Type",
                        HeaderValue::new("text/plain").with_parameter("charset", "utf-8"),
                    ))
                    .with_body("Hi"),
            );

        let rendered = message.render().unwrap();
        assert_eq!(
            rendered,
            "Subject: Built\r\n\
             Content-Type: multipart/mixed; boundary=b1\r\n\
             \r\n\
             This is a multi-part message in MIME format.\r\n\
             --b1\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             Hi\r\n\
             --b1--\r\n"
        );
        assert_eq!(message.into_part().parts().len(), 1);
    }
}
