//! MIME header handling.
//!
//! A [`Header`] is a name with one or more [`HeaderValue`]s. Multi-valued
//! headers (`Set-Cookie` style) render as one line per value.

mod value;

pub use value::{DEFAULT_DELIMITER, HeaderValue};

use crate::error::Result;
use std::fmt;

/// Default continuation indent for wrapped header lines.
pub const DEFAULT_INDENT: &str = "\t";

/// A named header with one or more values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    name: String,
    values: Vec<HeaderValue>,
    wrap: usize,
    indent: String,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            name: String::new(),
            values: Vec::new(),
            wrap: 0,
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

impl Header {
    /// Creates a header with no values.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates a header with a single value.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        let mut header = Self::new(name);
        header.values.push(value.into());
        header
    }

    /// Creates a header with several values.
    #[must_use]
    pub fn with_values<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<HeaderValue>,
    {
        let mut header = Self::new(name);
        header.values.extend(values.into_iter().map(Into::into));
        header
    }

    /// Parses a raw `Name: value` header.
    ///
    /// If `Name:` occurs again at the start of a later line (repeated headers
    /// joined together, name compared ASCII case-insensitively), every
    /// occurrence contributes one value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let Some((name, rest)) = raw.split_once(':') else {
            let mut header = Self::new("");
            header.values.push(HeaderValue::parse(raw));
            return header;
        };

        let name = name.trim();
        let mut header = Self::new(name);
        let segments = split_repeated(rest, name);

        if segments.len() > 1 {
            header.values.extend(
                segments
                    .into_iter()
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(HeaderValue::parse),
            );
        } else {
            header.values.push(HeaderValue::parse(rest));
        }

        header
    }

    /// Returns the header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a value.
    pub fn add_value(&mut self, value: impl Into<HeaderValue>) -> &mut Self {
        self.values.push(value.into());
        self
    }

    /// Returns all values.
    #[must_use]
    pub fn values(&self) -> &[HeaderValue] {
        &self.values
    }

    /// Returns the value at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&HeaderValue> {
        self.values.get(index)
    }

    /// Returns the value at `index` for modification.
    pub fn value_mut(&mut self, index: usize) -> Option<&mut HeaderValue> {
        self.values.get_mut(index)
    }

    /// Returns the bare text of the first value.
    #[must_use]
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().and_then(HeaderValue::value)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the header has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if a value's bare text equals `value` exactly.
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.value() == Some(value))
    }

    /// Adds a parameter to every value.
    pub fn add_parameter(&mut self, name: &str, value: impl ToString) -> &mut Self {
        let value = value.to_string();
        for header_value in &mut self.values {
            header_value.add_parameter(name, &value);
        }
        self
    }

    /// Returns the first value's parameter.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.values.iter().find_map(|v| v.parameter(name))
    }

    /// Returns true if any value carries the parameter.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Sets the wrap width (0 disables wrapping).
    pub const fn set_wrap(&mut self, wrap: usize) -> &mut Self {
        self.wrap = wrap;
        self
    }

    /// Returns the wrap width.
    #[must_use]
    pub const fn wrap(&self) -> usize {
        self.wrap
    }

    /// Returns true if wrapping is enabled.
    #[must_use]
    pub const fn has_wrap(&self) -> bool {
        self.wrap > 0
    }

    /// Sets the continuation indent.
    pub fn set_indent(&mut self, indent: impl Into<String>) -> &mut Self {
        self.indent = indent.into();
        self
    }

    /// Returns the continuation indent.
    #[must_use]
    pub fn indent(&self) -> &str {
        &self.indent
    }

    /// Returns true if a continuation indent is set.
    #[must_use]
    pub fn has_indent(&self) -> bool {
        !self.indent.is_empty()
    }

    /// Returns true for a `Content-Disposition` marking an attachment.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.name.eq_ignore_ascii_case("Content-Disposition")
            && self.values.iter().any(|v| {
                v.value().is_some_and(|text| {
                    let text = text.to_ascii_lowercase();
                    text.contains("attachment") || text.contains("inline")
                })
            })
    }

    /// Renders one `Name: value` line per value, CRLF-joined.
    ///
    /// # Errors
    ///
    /// Returns an error if a value with parameters has no delimiter.
    pub fn render(&self) -> Result<String> {
        let lines = self
            .values
            .iter()
            .map(|value| {
                let line = format!("{}: {}", self.name, value.render()?);
                Ok(if self.wrap > 0 {
                    wrap_line(&line, self.wrap, &self.indent)
                } else {
                    line
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(lines.join("\r\n"))
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Splits `rest` at every line that starts with `name:`, ignoring ASCII case.
fn split_repeated<'a>(rest: &'a str, name: &str) -> Vec<&'a str> {
    if name.is_empty() {
        return vec![rest];
    }

    // ASCII lowercasing keeps byte offsets valid for `rest`
    let marker = format!("\n{}:", name.to_ascii_lowercase());
    let lowered = rest.to_ascii_lowercase();
    let mut segments = Vec::new();
    let mut start = 0;
    for (index, _) in lowered.match_indices(&marker) {
        segments.push(&rest[start..index]);
        start = index + marker.len();
    }
    segments.push(&rest[start..]);
    segments
}

/// Word-wraps at spaces; words longer than `width` are not cut.
fn wrap_line(line: &str, width: usize, indent: &str) -> String {
    let mut wrapped = String::with_capacity(line.len() + 8);
    let mut current = 0;

    for (index, word) in line.split(' ').enumerate() {
        if index > 0 {
            if current + 1 + word.len() > width {
                wrapped.push_str("\r\n");
                wrapped.push_str(indent);
                current = indent.len();
            } else {
                wrapped.push(' ');
                current += 1;
            }
        }
        wrapped.push_str(word);
        current += word.len();
    }

    wrapped
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

    #[test]
    fn test_header_new() {
        let header = Header::new("X-Test");
        assert_eq!(header.name(), "X-Test");
        assert!(header.is_empty());
        assert!(!header.has_wrap());
        assert!(header.has_indent());
    }

    #[test]
    fn test_wrap_and_indent() {
        let mut header = Header::new("X-Test");
        header.set_wrap(100).set_indent("    ");
        assert!(header.has_wrap());
        assert_eq!(header.wrap(), 100);
        assert_eq!(header.indent(), "    ");
    }

    #[test]
    fn test_multiple_values() {
        let header = Header::with_values("Set-Cookie", ["123456", "987654"]);
        let rendered = header.render().unwrap();
        assert_eq!(rendered, "Set-Cookie: 123456\r\nSet-Cookie: 987654");
    }

    #[test]
    fn test_multiple_values_with_parameters() {
        let mut header = Header::with_values("Set-Cookie", ["123456", "987654"]);
        header.add_parameter("foo", "bar");
        let rendered = header.render().unwrap();
        assert!(rendered.contains("Set-Cookie: 123456; foo=bar"));
        assert!(rendered.contains("Set-Cookie: 987654; foo=bar"));
    }

    #[test]
    fn test_has_value_ignores_parameters() {
        let header = Header::with_value(
            "Content-Disposition",
            HeaderValue::new("form-data").with_parameter("name", "x"),
        );
        assert!(header.has_value("form-data"));
        assert!(!header.has_value("form-data; name=x"));
    }

    #[test]
    fn test_parse_single() {
        let header =
            Header::parse("Content-Disposition: form-data; name=file; filename=\"some file.pdf\"");
        assert_eq!(header.name(), "Content-Disposition");
        assert_eq!(header.len(), 1);
        let value = header.value(0).unwrap();
        assert_eq!(value.value(), Some("form-data"));
        assert_eq!(value.parameter("name"), Some("file"));
        assert_eq!(value.parameter("filename"), Some("some file.pdf"));
    }

    #[test]
    fn test_parse_repeated() {
        let header = Header::parse("Set-Cookie: a=1; Path=/\r\nSet-Cookie: b=2; Path=/");
        assert_eq!(header.len(), 2);
        assert_eq!(header.value(0).unwrap().parameter("a"), Some("1"));
        assert_eq!(header.value(1).unwrap().parameter("b"), Some("2"));
    }

    #[test]
    fn test_parse_repeated_ignores_case() {
        let header = Header::parse("Set-Cookie: a=1\r\nset-cookie: b=2\r\nSET-COOKIE: c=3");
        assert_eq!(header.name(), "Set-Cookie");
        assert_eq!(header.len(), 3);
        assert_eq!(header.value(1).unwrap().value(), Some("b=2"));
        assert_eq!(header.value(2).unwrap().value(), Some("c=3"));
    }

    #[test]
    fn test_parse_name_inside_value() {
        let header = Header::parse("Subject: Re: Subject: hello");
        assert_eq!(header.len(), 1);
        assert_eq!(header.first_value(), Some("Re: Subject: hello"));
    }

    #[test]
    fn test_is_attachment() {
        assert!(Header::parse("Content-Disposition: attachment; filename=x").is_attachment());
        assert!(Header::parse("Content-Disposition: INLINE").is_attachment());
        assert!(!Header::parse("Content-Disposition: form-data; name=x").is_attachment());
        assert!(!Header::parse("X-Note: attachment").is_attachment());
    }

    #[test]
    fn test_wrap_render() {
        let mut header = Header::with_value(
            "Content-Disposition",
            HeaderValue::new("form-data")
                .with_parameter("name", "image")
                .with_parameter("filename", "/tmp/some image.jpg")
                .with_parameter("foo", "Some other param"),
        );
        header.set_wrap(40);
        let rendered = header.render().unwrap();
        assert!(rendered.contains("\r\n\t"));
        for line in rendered.split("\r\n") {
            assert!(line.len() <= 40);
        }
        assert_eq!(
            rendered.replace("\r\n\t", " "),
            "Content-Disposition: form-data; name=image; filename=\"/tmp/some image.jpg\"; foo=\"Some other param\""
        );
    }

    #[test]
    fn test_display() {
        let header = Header::with_value("Content-Type", "text/plain");
        assert_eq!(header.to_string(), "Content-Type: text/plain");
    }
}
