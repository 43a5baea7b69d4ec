//! MIME part tree: headers plus either a body or nested parts.

use crate::body::{Body, Encoding, Split};
use crate::encoding::decode_rfc2047;
use crate::error::Result;
use crate::header::{Header, HeaderValue};
use rand::Rng;
use std::fmt::Write as _;
use std::path::Path;

/// Line emitted between the headers and the first boundary of a composite.
pub const PREAMBLE: &str = "This is a multi-part message in MIME format.";

/// A node in the MIME tree.
///
/// A part is either a leaf (headers and a [`Body`]) or a composite (headers
/// and child parts). When both are populated, the children are rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Part {
    headers: Vec<Header>,
    body: Option<Body>,
    parts: Vec<Part>,
    sub_type: Option<String>,
    boundary: Option<String>,
}

impl Part {
    /// Creates an empty part.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, header: Header) -> Self {
        self.add_header(header);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Adds a child part.
    #[must_use]
    pub fn with_part(mut self, part: Self) -> Self {
        self.parts.push(part);
        self
    }

    /// Sets the multipart subtype.
    #[must_use]
    pub fn with_sub_type(mut self, sub_type: impl Into<String>) -> Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    // --- Headers ---

    /// Adds a header, replacing one with the same name in place.
    pub fn add_header(&mut self, header: Header) -> &mut Self {
        match self
            .headers
            .iter_mut()
            .find(|h| h.name().eq_ignore_ascii_case(header.name()))
        {
            Some(existing) => *existing = header,
            None => self.headers.push(header),
        }
        self
    }

    /// Sets a single-valued header from a name and value.
    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) -> &mut Self {
        self.add_header(Header::with_value(name, value))
    }

    /// Adds several headers.
    pub fn add_headers(&mut self, headers: impl IntoIterator<Item = Header>) -> &mut Self {
        for header in headers {
            self.add_header(header);
        }
        self
    }

    /// Returns all headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Returns a header by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&Header> {
        self.headers
            .iter()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }

    /// Returns a header by name for modification.
    pub fn header_mut(&mut self, name: &str) -> Option<&mut Header> {
        self.headers
            .iter_mut()
            .find(|h| h.name().eq_ignore_ascii_case(name))
    }

    /// Returns true if the header is present.
    #[must_use]
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Returns true if any header is present.
    #[must_use]
    pub fn has_headers(&self) -> bool {
        !self.headers.is_empty()
    }

    /// Removes a header.
    pub fn remove_header(&mut self, name: &str) -> Option<Header> {
        let index = self
            .headers
            .iter()
            .position(|h| h.name().eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(index))
    }

    // --- Body ---

    /// Sets the body.
    pub fn set_body(&mut self, body: impl Into<Body>) -> &mut Self {
        self.body = Some(body.into());
        self
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// Returns the body for modification.
    pub const fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }

    /// Returns true if a body is set.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Attaches a file as the body with `attachment` disposition, Base64
    /// encoding and default line chunking.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.add_file_with(
            path,
            Some("attachment"),
            Some(Encoding::Base64),
            Some(Split::Default),
        )
    }

    /// Attaches a file as the body.
    ///
    /// With a `disposition`, a `Content-Disposition` header carrying the
    /// file's base name as `filename` is added. Without an `encoding` the
    /// bytes are sent as `binary`; use [`Part::render_bytes`] for such parts,
    /// since [`Part::render`] replaces invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    pub fn add_file_with(
        &mut self,
        path: impl AsRef<Path>,
        disposition: Option<&str>,
        encoding: Option<Encoding>,
        split: Option<Split>,
    ) -> Result<&mut Self> {
        let path = path.as_ref();
        let body = Body::from_file(path, encoding, split)?;

        if let Some(disposition) = disposition {
            let filename = path
                .file_name()
                .map_or_else(String::new, |name| name.to_string_lossy().into_owned());
            self.add_header(Header::with_value(
                "Content-Disposition",
                HeaderValue::new(disposition).with_parameter("filename", filename),
            ));
        }

        self.body = Some(body);
        Ok(self)
    }

    // --- Children ---

    /// Adds a child part.
    pub fn add_part(&mut self, part: Self) -> &mut Self {
        self.parts.push(part);
        self
    }

    /// Adds several child parts.
    pub fn add_parts(&mut self, parts: impl IntoIterator<Item = Self>) -> &mut Self {
        self.parts.extend(parts);
        self
    }

    /// Adds a group of parts wrapped in one composite child (see [`Part::group`]).
    pub fn add_group(&mut self, parts: impl IntoIterator<Item = Self>) -> &mut Self {
        self.parts.push(Self::group(parts));
        self
    }

    /// Wraps parts in a composite: `mixed` if any member is file-backed,
    /// otherwise `alternative`.
    #[must_use]
    pub fn group(parts: impl IntoIterator<Item = Self>) -> Self {
        let parts: Vec<Self> = parts.into_iter().collect();
        let has_file = parts
            .iter()
            .any(|part| part.body.as_ref().is_some_and(Body::is_file));
        let sub_type = if has_file { "mixed" } else { "alternative" };

        Self {
            parts,
            sub_type: Some(sub_type.to_string()),
            ..Self::default()
        }
    }

    /// Returns the child parts.
    #[must_use]
    pub fn parts(&self) -> &[Self] {
        &self.parts
    }

    /// Returns the child parts for modification.
    pub fn parts_mut(&mut self) -> &mut [Self] {
        &mut self.parts
    }

    /// Returns true if the part has children.
    #[must_use]
    pub fn has_parts(&self) -> bool {
        !self.parts.is_empty()
    }

    // --- Multipart metadata ---

    /// Sets the multipart subtype (`mixed`, `alternative`, `form-data`...).
    pub fn set_sub_type(&mut self, sub_type: impl Into<String>) -> &mut Self {
        self.sub_type = Some(sub_type.into());
        self
    }

    /// Returns the multipart subtype.
    #[must_use]
    pub fn sub_type(&self) -> Option<&str> {
        self.sub_type.as_deref()
    }

    /// Returns true if a multipart subtype is set.
    #[must_use]
    pub const fn has_sub_type(&self) -> bool {
        self.sub_type.is_some()
    }

    /// Sets the boundary.
    pub fn set_boundary(&mut self, boundary: impl Into<String>) -> &mut Self {
        self.boundary = Some(boundary.into());
        self
    }

    /// Returns the boundary, if one has been set or generated.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.boundary.as_deref()
    }

    /// Returns true if a boundary is set.
    #[must_use]
    pub const fn has_boundary(&self) -> bool {
        self.boundary.is_some()
    }

    /// Generates and stores a fresh random boundary.
    pub fn generate_boundary(&mut self) -> &str {
        let bytes: [u8; 20] = rand::thread_rng().r#gen();
        let mut boundary = String::with_capacity(40);
        for byte in bytes {
            let _ = write!(boundary, "{byte:02x}");
        }
        tracing::debug!(%boundary, "generated boundary");
        self.boundary.insert(boundary)
    }

    /// Returns the boundary, adopting the `Content-Type` boundary parameter
    /// or generating one if none is cached yet.
    pub fn ensure_boundary(&mut self) -> &str {
        if self.boundary.is_none() {
            let declared = self
                .header("Content-Type")
                .and_then(|h| h.parameter("boundary"))
                .map(ToString::to_string);
            match declared {
                Some(boundary) => self.boundary = Some(boundary),
                None => {
                    self.generate_boundary();
                }
            }
        }
        self.boundary.as_deref().unwrap_or_default()
    }

    // --- Queries ---

    /// Returns the bare `Content-Type` value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type").and_then(Header::first_value)
    }

    /// Returns the file name from `Content-Disposition` (`filename`, then
    /// `name`) or the `Content-Type` `name` parameter.
    ///
    /// RFC 2047 encoded words are decoded when possible.
    #[must_use]
    pub fn filename(&self) -> Option<String> {
        let raw = self
            .header("Content-Disposition")
            .and_then(|h| h.parameter("filename").or_else(|| h.parameter("name")))
            .or_else(|| self.header("Content-Type").and_then(|h| h.parameter("name")))?;

        if !raw.contains("=?") {
            return Some(raw.to_string());
        }
        Some(decode_rfc2047(raw).unwrap_or_else(|e| {
            tracing::warn!(?e, filename = raw, "Failed to decode filename");
            raw.to_string()
        }))
    }

    /// Returns true if this part is an attachment: an attachment/inline
    /// `Content-Disposition` or a file-backed body.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.header("Content-Disposition")
            .is_some_and(Header::is_attachment)
            || self.body.as_ref().is_some_and(Body::is_file)
    }

    /// Returns true if this part or any descendant is an attachment.
    #[must_use]
    pub fn has_attachment(&self) -> bool {
        self.is_attachment() || self.parts.iter().any(Self::has_attachment)
    }

    /// Returns all attachment leaves, depth-first.
    #[must_use]
    pub fn attachments(&self) -> Vec<&Self> {
        let mut found = Vec::new();
        self.collect_attachments(&mut found);
        found
    }

    fn collect_attachments<'a>(&'a self, found: &mut Vec<&'a Self>) {
        if self.has_parts() {
            for part in &self.parts {
                part.collect_attachments(found);
            }
        } else if self.is_attachment() {
            found.push(self);
        }
    }

    /// Returns the decoded body content (empty without a body).
    ///
    /// # Errors
    ///
    /// Returns an error if the stored content does not match its encoding.
    pub fn contents(&self) -> Result<Vec<u8>> {
        self.body
            .as_ref()
            .map_or_else(|| Ok(Vec::new()), Body::contents)
    }

    /// Returns the decoded body content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an error if decoding fails or the content is not UTF-8.
    pub fn contents_as_string(&self) -> Result<String> {
        String::from_utf8(self.contents()?).map_err(Into::into)
    }

    // --- Rendering ---

    /// Applies the lazy render-time mutations to this subtree: boundary
    /// selection, synthesized `Content-Type` and `Content-Transfer-Encoding`
    /// headers. Idempotent.
    pub fn prepare(&mut self) {
        if self.has_parts() {
            self.prepare_composite();
            for part in &mut self.parts {
                part.prepare();
            }
        } else if self.body.is_some() {
            self.prepare_leaf();
        }
    }

    fn prepare_composite(&mut self) -> String {
        let boundary = self.ensure_boundary().to_string();
        if !self.has_header("Content-Type") {
            if let Some(sub_type) = self.sub_type.clone() {
                tracing::debug!(%sub_type, "adding multipart Content-Type header");
                self.add_header(Header::with_value(
                    "Content-Type",
                    HeaderValue::new(format!("multipart/{sub_type}"))
                        .with_parameter("boundary", &boundary),
                ));
            }
        }
        boundary
    }

    fn prepare_leaf(&mut self) {
        if self.has_header("Content-Transfer-Encoding") {
            return;
        }
        let Some(body) = &self.body else {
            return;
        };

        let transfer_encoding = match body.encoding().and_then(Encoding::transfer_encoding) {
            Some(name) => Some(name),
            None if body.is_file() => Some("binary"),
            None => None,
        };
        if let Some(name) = transfer_encoding {
            tracing::debug!(transfer_encoding = name, "adding Content-Transfer-Encoding header");
            self.set_header("Content-Transfer-Encoding", name);
        }
    }

    /// Renders the part with the multipart preamble.
    ///
    /// Unencoded binary content is converted lossily; see
    /// [`Part::render_bytes`].
    ///
    /// # Errors
    ///
    /// Returns an error if a header value with parameters has no delimiter.
    pub fn render(&mut self) -> Result<String> {
        self.render_with_preamble(true)
    }

    /// Renders the part, optionally emitting the multipart preamble.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value with parameters has no delimiter.
    pub fn render_with_preamble(&mut self, preamble: bool) -> Result<String> {
        let rendered = self.render_bytes_with_preamble(preamble)?;
        Ok(String::from_utf8_lossy(&rendered).into_owned())
    }

    /// Renders the part as bytes, keeping unencoded binary content intact.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value with parameters has no delimiter.
    pub fn render_bytes(&mut self) -> Result<Vec<u8>> {
        self.render_bytes_with_preamble(true)
    }

    /// Renders the part as bytes, optionally emitting the multipart preamble.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value with parameters has no delimiter.
    pub fn render_bytes_with_preamble(&mut self, preamble: bool) -> Result<Vec<u8>> {
        if self.has_parts() {
            return self.render_parts(preamble, true);
        }

        let mut rendered = Vec::new();
        if self.body.is_some() {
            self.prepare_leaf();
        }
        if self.has_headers() {
            rendered.extend_from_slice(self.render_headers()?.as_bytes());
            rendered.extend_from_slice(b"\r\n\r\n");
        }
        if let Some(body) = self.body.as_mut() {
            rendered.extend(body.render_bytes());
        }
        Ok(rendered)
    }

    /// Renders only the boundary-delimited children (no headers, no
    /// preamble). A leaf renders its body.
    ///
    /// # Errors
    ///
    /// Returns an error if a header value with parameters has no delimiter.
    pub fn render_raw(&mut self) -> Result<String> {
        if !self.has_parts() {
            return Ok(self.body.as_mut().map(Body::render).unwrap_or_default());
        }
        let rendered = self.render_parts(false, false)?;
        Ok(String::from_utf8_lossy(&rendered).into_owned())
    }

    fn render_parts(&mut self, preamble: bool, with_headers: bool) -> Result<Vec<u8>> {
        let boundary = self.prepare_composite();
        let mut rendered = Vec::new();

        if with_headers && self.has_headers() {
            rendered.extend_from_slice(self.render_headers()?.as_bytes());
            rendered.extend_from_slice(b"\r\n\r\n");
        }
        if preamble {
            rendered.extend_from_slice(PREAMBLE.as_bytes());
            rendered.extend_from_slice(b"\r\n");
        }

        for part in &mut self.parts {
            rendered.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
            rendered.extend(part.render_bytes_with_preamble(false)?);
            rendered.extend_from_slice(b"\r\n");
        }
        rendered.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

        Ok(rendered)
    }

    fn render_headers(&self) -> Result<String> {
        let lines = self
            .headers
            .iter()
            .map(Header::render)
            .collect::<Result<Vec<_>>>()?;
        Ok(lines.join("\r\n"))
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
    use std::io::Write;

    fn text_part(content_type: &str, body: &str) -> Part {
        Part::new()
            .with_header(Header::with_value("Content-Type", content_type))
            .with_body(body)
    }

    #[test]
    fn test_builder() {
        let part = Part::new()
            .with_header(Header::with_value("Content-Type", "text/plain"))
            .with_body("Hello World!");
        assert!(part.has_header("Content-Type"));
        assert!(part.has_header("content-type"));
        assert!(part.has_body());
        assert_eq!(part.content_type(), Some("text/plain"));
    }

    #[test]
    fn test_add_header_replaces_in_place() {
        let mut part = Part::new();
        part.set_header("Subject", "one")
            .set_header("To", "a@example.com")
            .set_header("subject", "two");
        assert_eq!(part.headers().len(), 2);
        assert_eq!(part.headers()[0].first_value(), Some("two"));
        assert_eq!(part.headers()[1].name(), "To");
    }

    #[test]
    fn test_remove_header() {
        let mut part = Part::new();
        part.set_header("X-A", "1");
        assert!(part.remove_header("x-a").is_some());
        assert!(!part.has_headers());
        assert!(part.remove_header("x-a").is_none());
    }

    #[test]
    fn test_render_leaf() {
        let mut part = text_part("text/plain", "Hello World!");
        assert_eq!(
            part.render().unwrap(),
            "Content-Type: text/plain\r\n\r\nHello World!"
        );
    }

    #[test]
    fn test_render_leaf_without_headers() {
        let mut part = Part::new().with_body("just text");
        assert_eq!(part.render().unwrap(), "just text");
    }

    #[test]
    fn test_render_multipart() {
        let mut part = Part::new().with_sub_type("alternative");
        part.set_boundary("b1");
        part.add_parts([
            text_part("text/html", "<h1>Hi</h1>"),
            text_part("text/plain", "Hi"),
        ]);

        let expected = concat!(
            "Content-Type: multipart/alternative; boundary=b1\r\n\r\n",
            "This is a multi-part message in MIME format.\r\n",
            "--b1\r\n",
            "Content-Type: text/html\r\n\r\n<h1>Hi</h1>\r\n",
            "--b1\r\n",
            "Content-Type: text/plain\r\n\r\nHi\r\n",
            "--b1--\r\n"
        );
        assert_eq!(part.render().unwrap(), expected);
    }

    #[test]
    fn test_render_without_preamble() {
        let mut part = Part::new().with_sub_type("mixed").with_part(text_part("text/plain", "x"));
        let rendered = part.render_with_preamble(false).unwrap();
        assert!(!rendered.contains(PREAMBLE));
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut part = Part::new().with_sub_type("mixed");
        part.add_part(text_part("text/plain", "one"));
        part.add_part(
            Part::new()
                .with_header(Header::with_value("Content-Type", "text/plain"))
                .with_body(Body::new("two").with_encoding(Encoding::Base64)),
        );

        let first = part.render().unwrap();
        let second = part.render().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_boundary_generated_once() {
        let mut part = Part::new().with_sub_type("mixed").with_part(text_part("text/plain", "x"));
        assert!(!part.has_boundary());
        let rendered = part.render().unwrap();
        let boundary = part.boundary().unwrap().to_string();
        assert_eq!(boundary.len(), 40);
        assert!(boundary.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(rendered.matches(&format!("--{boundary}\r\n")).count(), 1);
        assert_eq!(rendered.matches(&format!("--{boundary}--\r\n")).count(), 1);
        part.render().unwrap();
        assert_eq!(part.boundary(), Some(boundary.as_str()));
    }

    #[test]
    fn test_boundary_adopted_from_header() {
        let mut part = Part::new().with_header(Header::with_value(
            "Content-Type",
            HeaderValue::new("multipart/mixed").with_parameter("boundary", "given"),
        ));
        assert_eq!(part.ensure_boundary(), "given");
    }

    #[test]
    fn test_no_content_type_without_sub_type() {
        let mut part = Part::new().with_part(text_part("text/plain", "x"));
        part.render().unwrap();
        assert!(!part.has_header("Content-Type"));
        assert!(part.has_boundary());
    }

    #[test]
    fn test_render_raw() {
        let mut part = Part::new().with_sub_type("mixed");
        part.set_header("Subject", "hidden");
        part.set_boundary("raw");
        part.add_part(text_part("text/plain", "x"));
        let raw = part.render_raw().unwrap();
        assert!(raw.starts_with("--raw\r\n"));
        assert!(!raw.contains("Subject"));
        assert!(!raw.contains(PREAMBLE));
        assert!(raw.ends_with("--raw--\r\n"));
    }

    #[test]
    fn test_prepare() {
        let mut part = Part::new().with_sub_type("mixed").with_part(
            Part::new().with_body(Body::new("q").with_encoding(Encoding::Quoted)),
        );
        part.prepare();
        assert!(part.has_boundary());
        assert!(part.has_header("Content-Type"));
        assert_eq!(
            part.parts()[0]
                .header("Content-Transfer-Encoding")
                .and_then(Header::first_value),
            Some("quoted-printable")
        );
        let snapshot = part.clone();
        part.prepare();
        assert_eq!(part, snapshot);
    }

    #[test]
    fn test_group_sub_type() {
        let mut part = Part::new();
        part.add_group([text_part("text/html", "h"), text_part("text/plain", "t")]);
        assert_eq!(part.parts()[0].sub_type(), Some("alternative"));
        assert_eq!(part.parts()[0].parts().len(), 2);

        let mut file_body = Body::new("data");
        file_body.set_as_file(true);
        part.add_group([text_part("text/plain", "t"), Part::new().with_body(file_body)]);
        assert_eq!(part.parts()[1].sub_type(), Some("mixed"));
    }

    #[test]
    fn test_attachment_detection() {
        let part = Part::new().with_header(Header::parse(
            "Content-Disposition: attachment; filename=x",
        ));
        assert!(part.has_attachment());

        let composite = Part::new()
            .with_part(text_part("text/plain", "a"))
            .with_part(Part::new().with_part(part.clone()));
        assert!(composite.has_attachment());
        assert_eq!(composite.attachments().len(), 1);

        let plain = Part::new().with_part(text_part("text/plain", "a"));
        assert!(!plain.has_attachment());
        assert!(plain.attachments().is_empty());
    }

    #[test]
    fn test_add_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"Hello World!\n")
            .unwrap();

        let mut sub_part = Part::new();
        sub_part.add_file(&path).unwrap();
        assert_eq!(sub_part.filename().as_deref(), Some("test.txt"));

        let mut part = Part::new();
        part.add_part(sub_part);
        assert!(part.has_attachment());

        let rendered = part.parts_mut()[0].render().unwrap();
        assert!(rendered.contains("Content-Disposition: attachment; filename=test.txt"));
        assert!(rendered.contains("Content-Transfer-Encoding: base64"));
        assert_eq!(
            part.parts()[0].contents_as_string().unwrap().trim(),
            "Hello World!"
        );
    }

    #[test]
    fn test_add_file_missing() {
        let mut part = Part::new();
        let err = part.add_file("/nonexistent/bad.txt").unwrap_err();
        assert!(err.is_not_found());
        assert!(!part.has_header("Content-Disposition"));
    }

    #[test]
    fn test_binary_transfer_encoding_for_raw_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();

        let mut part = Part::new();
        part.add_file_with(file.path(), None, None, None).unwrap();
        let rendered = part.render().unwrap();
        assert_eq!(rendered, "Content-Transfer-Encoding: binary\r\n\r\n%PDF-1.4");
    }

    #[test]
    fn test_render_bytes_keeps_raw_binary_file() {
        let bytes = [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00, 0x80];
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let mut part = Part::new();
        part.add_file_with(file.path(), None, None, None).unwrap();
        let rendered = part.render_bytes().unwrap();
        assert!(rendered.ends_with(&bytes));
        assert_eq!(part.contents().unwrap(), bytes.to_vec());
    }

    #[test]
    fn test_filename_from_name() {
        let mut part = Part::new().with_header(Header::parse(
            "Content-Disposition: attachment; name=file.txt",
        ));
        part.set_body("Hello");
        assert_eq!(part.filename().as_deref(), Some("file.txt"));
    }

    #[test]
    fn test_filename_encoded_word() {
        let part = Part::new().with_header(Header::parse(
            "Content-Disposition: attachment; filename=\"=?utf-8?B?SMOpbGxvLnR4dA==?=\"",
        ));
        assert_eq!(part.filename().as_deref(), Some("Héllo.txt"));
    }

    #[test]
    fn test_url_contents() {
        let mut part = Part::new()
            .with_body(Body::new("admin@something%testwhat/ever").with_encoding(Encoding::Url));
        assert!(part
            .render()
            .unwrap()
            .contains("admin%40something%25testwhat%2Fever"));
        assert_eq!(
            part.contents_as_string().unwrap(),
            "admin@something%testwhat/ever"
        );
    }
}
