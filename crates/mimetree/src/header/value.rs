//! Single header value: `[scheme ]value[; name=value[; name="quoted value"]]`.

use crate::error::{Error, Result};
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// Default parameter delimiter.
pub const DEFAULT_DELIMITER: char = ';';

/// HTTP authentication schemes recognized as a value prefix.
const AUTH_SCHEMES: [&str; 3] = ["Basic", "Bearer", "Digest"];

/// First `name=value` looking token. Base64 padding (`abc==`) does not match.
#[allow(clippy::expect_used)]
static PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w-]+=[^=;,]").expect("parameter pattern is valid"));

/// One value of a header, with optional scheme prefix and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderValue {
    scheme: Option<String>,
    value: Option<String>,
    parameters: Vec<(String, String)>,
    delimiter: Option<char>,
    force_quote: bool,
}

impl Default for HeaderValue {
    fn default() -> Self {
        Self {
            scheme: None,
            value: None,
            parameters: Vec::new(),
            delimiter: Some(DEFAULT_DELIMITER),
            force_quote: false,
        }
    }
}

impl HeaderValue {
    /// Creates a header value from bare text (no parsing).
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the scheme prefix (e.g. `"Bearer "`).
    #[must_use]
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.add_parameter(name, value);
        self
    }

    /// Sets the parameter delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Forces every parameter value to be quoted on render.
    #[must_use]
    pub const fn with_force_quote(mut self, force_quote: bool) -> Self {
        self.force_quote = force_quote;
        self
    }

    /// Parses a raw header value.
    ///
    /// Never fails: when a delimiter is present but no `name=value` token
    /// can be found, the whole trimmed text becomes the value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let mut parsed = Self::default();

        if !raw.contains([';', ',']) {
            parsed.value = non_empty(raw);
            return parsed;
        }

        let delimiter = if raw.contains(';') { ';' } else { ',' };
        parsed.delimiter = Some(delimiter);

        let Some(found) = PARAMETER.find(raw) else {
            tracing::trace!(raw, "no parameters found in header value");
            parsed.value = non_empty(raw);
            return parsed;
        };

        let head = raw[..found.start()].trim();
        let head = head.strip_suffix(delimiter).unwrap_or(head).trim();
        parsed.split_scheme(head);

        for param in split_unquoted(&raw[found.start()..], delimiter) {
            if let Some((name, value)) = Self::parse_parameter(param) {
                let value = value.trim_end_matches(delimiter).trim_end();
                parsed.add_parameter(name, value);
            }
        }

        parsed
    }

    /// Splits a `name=value` parameter. A quoted-string value loses its
    /// surrounding quotes and its `\"` / `\\` escapes.
    #[must_use]
    pub fn parse_parameter(parameter: &str) -> Option<(&str, Cow<'_, str>)> {
        let (name, value) = parameter.trim().split_once('=')?;
        let value = value.trim();
        let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
            Some(quoted) if quoted.contains('\\') => Cow::Owned(unescape(quoted)),
            Some(quoted) => Cow::Borrowed(quoted),
            None => Cow::Borrowed(value),
        };
        Some((name.trim(), value))
    }

    fn split_scheme(&mut self, head: &str) {
        let scheme = AUTH_SCHEMES.iter().find(|scheme| {
            head.get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
                && matches!(head.as_bytes().get(scheme.len()), None | Some(b' '))
        });

        match scheme {
            Some(scheme) => {
                let (prefix, rest) = head.split_at(scheme.len());
                self.scheme = Some(format!("{prefix} "));
                self.value = non_empty(rest.trim());
            }
            None => self.value = non_empty(head),
        }
    }

    /// Sets the scheme prefix.
    pub fn set_scheme(&mut self, scheme: impl Into<String>) -> &mut Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Returns the scheme prefix.
    #[must_use]
    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    /// Returns true if a scheme prefix is set.
    #[must_use]
    pub const fn has_scheme(&self) -> bool {
        self.scheme.is_some()
    }

    /// Sets the bare value.
    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    /// Returns the bare value (without scheme or parameters).
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Adds a parameter, replacing an existing one with the same name.
    pub fn add_parameter(&mut self, name: impl Into<String>, value: impl ToString) -> &mut Self {
        let name = name.into();
        let value = value.to_string();
        match self.parameters.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.parameters.push((name, value)),
        }
        self
    }

    /// Adds several parameters.
    pub fn add_parameters<I, K, V>(&mut self, parameters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        for (name, value) in parameters {
            self.add_parameter(name, value);
        }
        self
    }

    /// Returns a parameter value.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns all parameters in insertion order.
    #[must_use]
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    /// Returns true if any parameter is set.
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    /// Returns true if the named parameter is set.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }

    /// Sets the parameter delimiter.
    pub const fn set_delimiter(&mut self, delimiter: char) -> &mut Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Removes the parameter delimiter.
    pub const fn clear_delimiter(&mut self) -> &mut Self {
        self.delimiter = None;
        self
    }

    /// Returns the parameter delimiter.
    #[must_use]
    pub const fn delimiter(&self) -> Option<char> {
        self.delimiter
    }

    /// Returns true if a delimiter is set.
    #[must_use]
    pub const fn has_delimiter(&self) -> bool {
        self.delimiter.is_some()
    }

    /// Sets whether parameter values are always quoted.
    pub const fn set_force_quote(&mut self, force_quote: bool) -> &mut Self {
        self.force_quote = force_quote;
        self
    }

    /// Returns true if parameter values are always quoted.
    #[must_use]
    pub const fn is_force_quote(&self) -> bool {
        self.force_quote
    }

    /// Renders the parameters as `name=value` pairs joined by the delimiter.
    ///
    /// Values with a space, a quote or the delimiter (or every value, with
    /// force-quote) are written as quoted strings with `"` and `\` escaped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDelimiter`] if the delimiter was cleared.
    pub fn parameters_as_string(&self) -> Result<String> {
        let delimiter = self.delimiter.ok_or(Error::MissingDelimiter)?;

        let rendered: Vec<String> = self
            .parameters
            .iter()
            .map(|(name, value)| {
                let needs_quotes = self.force_quote
                    || value.contains([' ', '"', delimiter]);
                if needs_quotes {
                    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                    format!("{name}=\"{escaped}\"")
                } else {
                    format!("{name}={value}")
                }
            })
            .collect();

        Ok(rendered.join(&format!("{delimiter} ")))
    }

    /// Renders the value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingDelimiter`] if parameters are set but the
    /// delimiter was cleared.
    pub fn render(&self) -> Result<String> {
        let mut rendered = format!(
            "{}{}",
            self.scheme.as_deref().unwrap_or_default(),
            self.value.as_deref().unwrap_or_default()
        );

        if self.has_parameters() {
            let parameters = self.parameters_as_string()?;
            if !rendered.is_empty() && !rendered.ends_with(' ') {
                if let Some(delimiter) = self.delimiter {
                    rendered.push(delimiter);
                }
                rendered.push(' ');
            }
            rendered.push_str(&parameters);
        }

        Ok(rendered)
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.render().map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

/// Splits on `delimiter` outside of double quotes.
fn unescape(quoted: &str) -> String {
    let mut unescaped = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => unescaped.extend(chars.next()),
            _ => unescaped.push(ch),
        }
    }
    unescaped
}

fn split_unquoted(text: &str, delimiter: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        if escaped {
            escaped = false;
        } else if in_quotes && ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            in_quotes = !in_quotes;
        } else if ch == delimiter && !in_quotes {
            pieces.push(&text[start..index]);
            start = index + ch.len_utf8();
        }
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect()
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
    fn test_scheme() {
        let mut value = HeaderValue::default();
        value.set_scheme("Basic ");
        assert!(value.has_scheme());
        assert_eq!(value.scheme(), Some("Basic "));
    }

    #[test]
    fn test_parameters() {
        let value = HeaderValue::new("test").with_parameter("foo", "bar");
        assert!(value.has_parameters());
        assert_eq!(value.parameter("foo"), Some("bar"));
        assert_eq!(value.render().unwrap(), "test; foo=bar");
    }

    #[test]
    fn test_numeric_parameter_stringified() {
        let value = HeaderValue::new("test").with_parameter("size", 123);
        assert_eq!(value.parameter("size"), Some("123"));
    }

    #[test]
    fn test_parameter_replaced_in_place() {
        let mut value = HeaderValue::new("v");
        value.add_parameter("a", "1").add_parameter("b", "2").add_parameter("a", "3");
        assert_eq!(value.render().unwrap(), "v; a=3; b=2");
    }

    #[test]
    fn test_delimiter() {
        let value = HeaderValue::new("test")
            .with_scheme("Basic ")
            .with_parameter("foo", "bar")
            .with_delimiter(',');
        assert_eq!(value.delimiter(), Some(','));
        assert_eq!(value.render().unwrap(), "Basic test, foo=bar");
    }

    #[test]
    fn test_missing_delimiter() {
        let mut value = HeaderValue::new("test").with_parameter("foo", "bar");
        value.clear_delimiter();
        assert!(!value.has_delimiter());
        assert!(matches!(
            value.parameters_as_string(),
            Err(Error::MissingDelimiter)
        ));
        assert!(value.render().is_err());
    }

    #[test]
    fn test_quoting() {
        let value = HeaderValue::new("form-data")
            .with_parameter("name", "file")
            .with_parameter("filename", "some file.pdf");
        assert_eq!(
            value.render().unwrap(),
            "form-data; name=file; filename=\"some file.pdf\""
        );

        let value = HeaderValue::new("form-data")
            .with_parameter("name", "file")
            .with_force_quote(true);
        assert_eq!(value.render().unwrap(), "form-data; name=\"file\"");

        let value = HeaderValue::new("x").with_parameter("list", "a;b");
        assert_eq!(value.render().unwrap(), "x; list=\"a;b\"");
    }

    #[test]
    fn test_parse_plain() {
        let value = HeaderValue::parse("  text/plain ");
        assert_eq!(value.value(), Some("text/plain"));
        assert!(!value.has_parameters());
    }

    #[test]
    fn test_parse_parameters() {
        let value = HeaderValue::parse("form-data; name=file; filename=\"some file.pdf\"");
        assert_eq!(value.value(), Some("form-data"));
        assert_eq!(value.parameter("name"), Some("file"));
        assert_eq!(value.parameter("filename"), Some("some file.pdf"));
        assert_eq!(value.delimiter(), Some(';'));
    }

    #[test]
    fn test_parse_quoted_delimiter() {
        let value = HeaderValue::parse("attachment; filename=\"a;b.txt\"; size=3");
        assert_eq!(value.parameter("filename"), Some("a;b.txt"));
        assert_eq!(value.parameter("size"), Some("3"));
    }

    #[test]
    fn test_parse_bearer_scheme() {
        let value = HeaderValue::parse("Bearer abc123; foo=bar");
        assert_eq!(value.scheme(), Some("Bearer "));
        assert_eq!(value.value(), Some("abc123"));
        assert_eq!(value.parameter("foo"), Some("bar"));
        assert_eq!(value.render().unwrap(), "Bearer abc123; foo=bar");
    }

    #[test]
    fn test_parse_digest_comma_delimited() {
        let value = HeaderValue::parse("Digest username=\"Mufasa\", realm=\"test@host.com\"");
        assert_eq!(value.scheme(), Some("Digest "));
        assert_eq!(value.value(), None);
        assert_eq!(value.delimiter(), Some(','));
        assert_eq!(value.parameter("username"), Some("Mufasa"));
        assert_eq!(value.parameter("realm"), Some("test@host.com"));
    }

    #[test]
    fn test_parse_scheme_needs_word_boundary() {
        let value = HeaderValue::parse("Basically; foo=bar");
        assert_eq!(value.scheme(), None);
        assert_eq!(value.value(), Some("Basically"));
    }

    #[test]
    fn test_parse_no_parameter_fallback() {
        let value = HeaderValue::parse("Mon, 18 Oct 2026 10:00:00 +0000");
        assert_eq!(value.value(), Some("Mon, 18 Oct 2026 10:00:00 +0000"));
        assert!(!value.has_parameters());
        assert_eq!(value.delimiter(), Some(','));
    }

    #[test]
    fn test_parse_base64_padding_not_a_parameter() {
        let value = HeaderValue::parse("Basic dXNlcjpwYXNzd29yZA==; realm=x");
        assert_eq!(value.scheme(), Some("Basic "));
        assert_eq!(value.value(), Some("dXNlcjpwYXNzd29yZA=="));
        assert_eq!(value.parameter("realm"), Some("x"));
    }

    #[test]
    fn test_parse_parameter() {
        assert_eq!(
            HeaderValue::parse_parameter("filename=\"a b.txt\""),
            Some(("filename", Cow::Borrowed("a b.txt")))
        );
        assert_eq!(
            HeaderValue::parse_parameter(r#"filename="say \"hi\".txt""#),
            Some(("filename", Cow::Owned(r#"say "hi".txt"#.to_string())))
        );
        assert_eq!(HeaderValue::parse_parameter("novalue"), None);
    }

    #[test]
    fn test_quotes_in_parameter_value() {
        let value =
            HeaderValue::new("attachment").with_parameter("filename", "my \"best\" file.txt");
        let rendered = value.render().unwrap();
        assert_eq!(rendered, r#"attachment; filename="my \"best\" file.txt""#);

        let parsed = HeaderValue::parse(&rendered);
        assert_eq!(parsed.parameter("filename"), Some("my \"best\" file.txt"));
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_backslash_round_trip() {
        let value = HeaderValue::new("attachment")
            .with_parameter("filename", r"C:\docs\a;b.txt")
            .with_parameter("size", 3);
        let rendered = value.render().unwrap();
        assert_eq!(
            rendered,
            r#"attachment; filename="C:\\docs\\a;b.txt"; size=3"#
        );
        let parsed = HeaderValue::parse(&rendered);
        assert_eq!(parsed.parameter("filename"), Some(r"C:\docs\a;b.txt"));
        assert_eq!(parsed.parameter("size"), Some("3"));
    }
}
