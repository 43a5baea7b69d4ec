//! MIME part body: content bytes plus transfer-encoding state.

use crate::encoding::{
    DEFAULT_CHUNK_LENGTH, chunk_split, decode_base64, decode_quoted_printable, decode_raw_url,
    decode_url, encode_base64, encode_quoted_printable, encode_raw_url, encode_url,
};
use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::Path;

/// Content-transfer encodings a body can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// Base64 (RFC 2045).
    Base64,
    /// Quoted-Printable (RFC 2045).
    Quoted,
    /// Form-style percent-encoding (`+` for space).
    Url,
    /// RFC 3986 percent-encoding (`%20` for space).
    RawUrl,
}

impl Encoding {
    /// Maps a `Content-Transfer-Encoding` header value to an encoding.
    ///
    /// Only `base64` and `quoted-printable` transform content; `7bit`,
    /// `8bit` and `binary` return `None`.
    #[must_use]
    pub fn from_transfer_encoding(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" => Some(Self::Base64),
            "quoted-printable" => Some(Self::Quoted),
            _ => None,
        }
    }

    /// Returns the `Content-Transfer-Encoding` header value for this encoding.
    #[must_use]
    pub const fn transfer_encoding(self) -> Option<&'static str> {
        match self {
            Self::Base64 => Some("base64"),
            Self::Quoted => Some("quoted-printable"),
            Self::Url | Self::RawUrl => None,
        }
    }

    /// Encodes raw bytes.
    #[must_use]
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::Base64 => encode_base64(data),
            Self::Quoted => encode_quoted_printable(data),
            Self::Url => encode_url(data),
            Self::RawUrl => encode_raw_url(data),
        }
    }

    /// Decodes encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is not valid for this encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(data)),
            Self::Quoted => decode_quoted_printable(data),
            Self::Url => Ok(decode_url(data)),
            Self::RawUrl => Ok(decode_raw_url(data)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
            Self::Quoted => write!(f, "quoted-printable"),
            Self::Url => write!(f, "url"),
            Self::RawUrl => write!(f, "raw-url"),
        }
    }
}

/// Line chunking applied to rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Split {
    /// Chunks of [`DEFAULT_CHUNK_LENGTH`] bytes.
    Default,
    /// Chunks of the given length in bytes.
    Length(usize),
}

impl Split {
    /// Returns the chunk length.
    #[must_use]
    pub const fn length(self) -> usize {
        match self {
            Self::Default => DEFAULT_CHUNK_LENGTH,
            Self::Length(length) => length,
        }
    }
}

/// Body of a leaf part.
///
/// Rendering applies the encoding once and stores the encoded form, so
/// repeated renders produce the same output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Body {
    content: Option<Vec<u8>>,
    encoding: Option<Encoding>,
    split: Option<Split>,
    is_file: bool,
    is_encoded: bool,
}

impl Body {
    /// Creates a body from raw content.
    #[must_use]
    pub fn new(content: impl Into<Vec<u8>>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Sets the encoding.
    #[must_use]
    pub const fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    /// Sets the line chunking.
    #[must_use]
    pub const fn with_split(mut self, split: Split) -> Self {
        self.split = Some(split);
        self
    }

    /// Creates a file-backed body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the path does not exist, or an I/O
    /// error if reading fails.
    pub fn from_file(
        path: impl AsRef<Path>,
        encoding: Option<Encoding>,
        split: Option<Split>,
    ) -> Result<Self> {
        let mut body = Self::default();
        body.set_content_from_file(path, encoding, split)?;
        Ok(body)
    }

    /// Replaces the content.
    pub fn set_content(&mut self, content: impl Into<Vec<u8>>) -> &mut Self {
        self.content = Some(content.into());
        self
    }

    /// Loads the content from a file and marks the body as file-backed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileNotFound`] if the path does not exist, or an I/O
    /// error if reading fails.
    pub fn set_content_from_file(
        &mut self,
        path: impl AsRef<Path>,
        encoding: Option<Encoding>,
        split: Option<Split>,
    ) -> Result<&mut Self> {
        self.content = Some(read_file(path.as_ref())?);
        self.is_file = true;
        if encoding.is_some() {
            self.encoding = encoding;
        }
        if split.is_some() {
            self.split = split;
        }
        Ok(self)
    }

    /// Returns the stored content (encoded once rendered).
    #[must_use]
    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// Returns the stored content as text, replacing invalid UTF-8.
    #[must_use]
    pub fn content_as_string(&self) -> Option<String> {
        self.content
            .as_deref()
            .map(|content| String::from_utf8_lossy(content).into_owned())
    }

    /// Returns true if content is set.
    #[must_use]
    pub const fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Sets the encoding.
    pub const fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = Some(encoding);
        self
    }

    /// Returns the encoding.
    #[must_use]
    pub const fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Returns true if an encoding is set.
    #[must_use]
    pub const fn has_encoding(&self) -> bool {
        self.encoding.is_some()
    }

    /// Returns true for Base64 encoding.
    #[must_use]
    pub fn is_base64(&self) -> bool {
        self.encoding == Some(Encoding::Base64)
    }

    /// Returns true for Quoted-Printable encoding.
    #[must_use]
    pub fn is_quoted(&self) -> bool {
        self.encoding == Some(Encoding::Quoted)
    }

    /// Returns true for URL encoding.
    #[must_use]
    pub fn is_url(&self) -> bool {
        self.encoding == Some(Encoding::Url)
    }

    /// Returns true for raw URL encoding.
    #[must_use]
    pub fn is_raw_url(&self) -> bool {
        self.encoding == Some(Encoding::RawUrl)
    }

    /// Sets the line chunking.
    pub const fn set_split(&mut self, split: Split) -> &mut Self {
        self.split = Some(split);
        self
    }

    /// Returns the line chunking.
    #[must_use]
    pub const fn split(&self) -> Option<Split> {
        self.split
    }

    /// Returns true if line chunking is set.
    #[must_use]
    pub const fn has_split(&self) -> bool {
        self.split.is_some()
    }

    /// Marks the body as file-backed.
    pub const fn set_as_file(&mut self, is_file: bool) -> &mut Self {
        self.is_file = is_file;
        self
    }

    /// Returns true if the body is file-backed.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.is_file
    }

    /// Marks the stored content as already encoded.
    pub const fn set_as_encoded(&mut self, is_encoded: bool) -> &mut Self {
        self.is_encoded = is_encoded;
        self
    }

    /// Returns true if the stored content is already encoded.
    #[must_use]
    pub const fn is_encoded(&self) -> bool {
        self.is_encoded
    }

    /// Renders the body as bytes.
    ///
    /// The first render encodes the content in place; chunking is applied
    /// on every render to the stored content.
    pub fn render_bytes(&mut self) -> Vec<u8> {
        if !self.is_encoded {
            if let (Some(encoding), Some(content)) = (self.encoding, self.content.as_mut()) {
                *content = encoding.encode(content).into_bytes();
                self.is_encoded = true;
            }
        }

        let content = self.content.as_deref().unwrap_or_default();
        match self.split {
            Some(split) => chunk_split(content, split.length()),
            None => content.to_vec(),
        }
    }

    /// Renders the body as text, replacing invalid UTF-8.
    pub fn render(&mut self) -> String {
        String::from_utf8_lossy(&self.render_bytes()).into_owned()
    }

    /// Decodes the stored content with the declared encoding.
    ///
    /// Independent of render state: the stored content is always treated
    /// as encoded when an encoding is declared.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored content cannot be decoded.
    pub fn contents(&self) -> Result<Vec<u8>> {
        let content = self.content.as_deref().unwrap_or_default();
        match self.encoding {
            Some(encoding) => encoding.decode(content),
            None => Ok(content.to_vec()),
        }
    }
}

impl From<&str> for Body {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for Body {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl From<Vec<u8>> for Body {
    fn from(content: Vec<u8>) -> Self {
        Self::new(content)
    }
}

impl From<&[u8]> for Body {
    fn from(content: &[u8]) -> Self {
        Self::new(content)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    tracing::trace!(path = %path.display(), "reading body from file");
    Ok(fs::read(path)?)
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

    #[test]
    fn test_body_new() {
        let body = Body::new("Hello World!").with_split(Split::Length(76));
        assert!(body.has_split());
        assert_eq!(body.split(), Some(Split::Length(76)));
        assert!(body.has_content());
        assert_eq!(body.encoding(), None);
        assert!(!body.has_encoding());
    }

    #[test]
    fn test_render_plain() {
        let mut body = Body::from("Hello World!");
        assert_eq!(body.render(), "Hello World!");
        assert!(!body.is_encoded());
    }

    #[test]
    fn test_render_encodes_once() {
        let mut body = Body::new("Hello, World!").with_encoding(Encoding::Base64);
        assert_eq!(body.render(), "SGVsbG8sIFdvcmxkIQ==");
        assert!(body.is_encoded());
        assert_eq!(body.render(), "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(body.contents().unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_render_split_every_time() {
        let mut body = Body::new("abcdefgh")
            .with_encoding(Encoding::Base64)
            .with_split(Split::Length(4));
        let first = body.render();
        assert_eq!(first, "YWJj\r\nZGVm\r\nZ2g=\r\n");
        assert_eq!(body.render(), first);
    }

    #[test]
    fn test_url_contents() {
        let mut body = Body::new("admin@something%testwhat/ever").with_encoding(Encoding::Url);
        assert_eq!(body.render(), "admin%40something%25testwhat%2Fever");
        assert_eq!(body.contents().unwrap(), b"admin@something%testwhat/ever");
    }

    #[test]
    fn test_contents_decodes_declared_encoding() {
        let mut body = Body::new("a%20b");
        body.set_encoding(Encoding::RawUrl);
        assert!(!body.is_encoded());
        assert_eq!(body.contents().unwrap(), b"a b");
    }

    #[test]
    fn test_contents_invalid_base64() {
        let body = Body::new("not base64!").with_encoding(Encoding::Base64);
        assert!(body.contents().is_err());
    }

    #[test]
    fn test_pre_encoded_not_encoded_again() {
        let mut body = Body::new("SGk=").with_encoding(Encoding::Base64);
        body.set_as_encoded(true);
        assert_eq!(body.render(), "SGk=");
        assert_eq!(body.contents().unwrap(), b"Hi");
    }

    #[test]
    fn test_file_not_found() {
        let err = Body::from_file("bad.txt", None, None).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"Hello World!\n").unwrap();

        let body = Body::from_file(file.path(), Some(Encoding::Base64), Some(Split::Default)).unwrap();
        assert!(body.is_file());
        assert!(body.is_base64());
        assert_eq!(body.split(), Some(Split::Default));
        assert_eq!(body.content(), Some(&b"Hello World!\n"[..]));
    }

    #[test]
    fn test_transfer_encoding_mapping() {
        assert_eq!(Encoding::from_transfer_encoding("BASE64"), Some(Encoding::Base64));
        assert_eq!(
            Encoding::from_transfer_encoding("quoted-printable"),
            Some(Encoding::Quoted)
        );
        assert_eq!(Encoding::from_transfer_encoding("binary"), None);
        assert_eq!(Encoding::Quoted.transfer_encoding(), Some("quoted-printable"));
        assert_eq!(Encoding::Url.transfer_encoding(), None);
    }
}
