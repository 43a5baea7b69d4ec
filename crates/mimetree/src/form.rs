//! `multipart/form-data` helpers.
//!
//! [`Message::create_form`] builds a form submission from named fields and
//! [`Message::parse_form`] reads one back. Field names ending in `[]`
//! collect into lists.

use crate::body::{Body, Encoding, Split};
use crate::error::Result;
use crate::header::{Header, HeaderValue};
use crate::message::Message;
use crate::part::Part;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Suffix marking a list field.
const LIST_SUFFIX: &str = "[]";

/// A field to submit with [`Message::create_form`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormField {
    /// A single text value.
    Text(String),
    /// Several values sent under `name[]`.
    List(Vec<String>),
    /// A file upload.
    File(FormFile),
}

impl From<&str> for FormField {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormField {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FormField {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<FormFile> for FormField {
    fn from(file: FormFile) -> Self {
        Self::File(file)
    }
}

/// A file upload field.
///
/// Without inline contents the file is read from `filename` when the form
/// is created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormFile {
    filename: String,
    contents: Option<Vec<u8>>,
    content_type: Option<String>,
}

impl FormFile {
    /// Creates an upload read from disk at form creation.
    #[must_use]
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            filename: path.into(),
            contents: None,
            content_type: None,
        }
    }

    /// Creates an upload with inline contents.
    #[must_use]
    pub fn new(filename: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            contents: Some(contents.into()),
            content_type: None,
        }
    }

    /// Sets the declared `Content-Type`.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the file name or path.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the declared content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the inline contents.
    #[must_use]
    pub fn contents(&self) -> Option<&[u8]> {
        self.contents.as_deref()
    }

    fn into_part(self, name: &str) -> Result<Part> {
        let basename = Path::new(&self.filename).file_name().map_or_else(
            || self.filename.clone(),
            |base| base.to_string_lossy().into_owned(),
        );

        let mut part = Part::new().with_header(Header::with_value(
            "Content-Disposition",
            HeaderValue::new("form-data")
                .with_parameter("name", name)
                .with_parameter("filename", basename),
        ));
        if let Some(content_type) = self.content_type {
            part.set_header("Content-Type", content_type);
        }

        let mut body = match self.contents {
            Some(contents) => Body::new(contents)
                .with_encoding(Encoding::Base64)
                .with_split(Split::Default),
            None => Body::from_file(
                &self.filename,
                Some(Encoding::Base64),
                Some(Split::Default),
            )?,
        };
        body.set_as_file(true);
        part.set_body(body);

        Ok(part)
    }
}

/// A decoded form value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FormValue {
    /// A single text value.
    Text(String),
    /// Values collected from `name[]` fields.
    List(Vec<String>),
    /// An uploaded file.
    File {
        /// Client-supplied file name.
        filename: String,
        /// Declared content type.
        content_type: Option<String>,
        /// Decoded contents.
        contents: Vec<u8>,
    },
}

impl FormValue {
    /// Returns the text of a [`FormValue::Text`].
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the values of a [`FormValue::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Decoded form fields in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormData {
    fields: Vec<(String, FormValue)>,
}

impl FormData {
    /// Creates an empty set of fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Returns true if the field is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if there are no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over fields in submission order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Sets a field, replacing an earlier one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: FormValue) {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Appends to a list field, creating it if needed.
    pub fn push(&mut self, name: impl Into<String>, value: String) {
        let name = name.into();
        match self.fields.iter_mut().find(|(field, _)| *field == name) {
            Some((_, FormValue::List(values))) => values.push(value),
            Some((_, existing)) => *existing = FormValue::List(vec![value]),
            None => self.fields.push((name, FormValue::List(vec![value]))),
        }
    }
}

impl Message {
    /// Builds a `multipart/form-data` message from named fields.
    ///
    /// Text and list values are raw-URL encoded; files are Base64 encoded
    /// with their base name as `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file field without inline contents cannot be
    /// read.
    pub fn create_form<I, K>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FormField)>,
        K: Into<String>,
    {
        let mut message = Self::new();
        message.set_sub_type("form-data");
        let boundary = message.generate_boundary().to_string();
        message.add_header(Header::with_value(
            "Content-Type",
            HeaderValue::new("multipart/form-data").with_parameter("boundary", &boundary),
        ));

        for (name, field) in fields {
            let name = name.into();
            match field {
                FormField::Text(value) => {
                    message.add_part(field_part(&name, value));
                }
                FormField::List(values) => {
                    let list_name = format!("{name}{LIST_SUFFIX}");
                    for value in values {
                        message.add_part(field_part(&list_name, value));
                    }
                }
                FormField::File(file) => {
                    message.add_part(file.into_part(&name)?);
                }
            }
        }

        tracing::debug!(parts = message.parts().len(), "created form");
        Ok(message)
    }

    /// Parses a `multipart/form-data` message into its fields.
    ///
    /// Only parts whose `Content-Disposition` is exactly `form-data` with a
    /// `name` contribute. Content that fails to decode is kept raw.
    #[must_use]
    pub fn parse_form(text: &str) -> FormData {
        let message = Self::parse(text);
        let mut form = FormData::new();
        collect_fields(&message, &mut form);
        form
    }
}

fn field_part(name: &str, value: String) -> Part {
    Part::new()
        .with_header(Header::with_value(
            "Content-Disposition",
            HeaderValue::new("form-data").with_parameter("name", name),
        ))
        .with_body(Body::new(value).with_encoding(Encoding::RawUrl))
}

fn collect_fields(part: &Part, form: &mut FormData) {
    for child in part.parts() {
        if child.has_parts() {
            collect_fields(child, form);
            continue;
        }

        let Some(disposition) = child.header("Content-Disposition") else {
            continue;
        };
        if disposition.len() != 1
            || !disposition
                .first_value()
                .is_some_and(|value| value.eq_ignore_ascii_case("form-data"))
        {
            continue;
        }
        let Some(name) = disposition.parameter("name") else {
            continue;
        };

        let contents = child.contents().unwrap_or_else(|e| {
            tracing::warn!(?e, field = name, "Failed to decode form field");
            child
                .body()
                .and_then(Body::content)
                .map(<[u8]>::to_vec)
                .unwrap_or_default()
        });

        if let Some(list) = name.strip_suffix(LIST_SUFFIX) {
            form.push(list, String::from_utf8_lossy(&contents).into_owned());
        } else if let Some(filename) = disposition.parameter("filename") {
            form.insert(
                name,
                FormValue::File {
                    filename: filename.to_string(),
                    content_type: child.content_type().map(ToString::to_string),
                    contents,
                },
            );
        } else {
            form.insert(
                name,
                FormValue::Text(String::from_utf8_lossy(&contents).into_owned()),
            );
        }
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

    const FORM: &str = "Content-Type: multipart/form-data; boundary=----WebKitFormBoundary\r\n\
        \r\n\
        ------WebKitFormBoundary\r\n\
        Content-Disposition: form-data; name=username\r\n\
        \r\n\
        admin%40something%25test%2Bwhat%2Fever\r\n\
        ------WebKitFormBoundary\r\n\
        Content-Disposition: form-data; name=\"colors[]\"\r\n\
        \r\n\
        red\r\n\
        ------WebKitFormBoundary\r\n\
        Content-Disposition: form-data; name=\"colors[]\"\r\n\
        \r\n\
        dark%20blue\r\n\
        ------WebKitFormBoundary\r\n\
        Content-Disposition: form-data; name=upload; filename=\"notes.txt\"\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        line one\r\n\
        ------WebKitFormBoundary\r\n\
        Content-Disposition: attachment; filename=ignored.txt\r\n\
        \r\n\
        skip me\r\n\
        ------WebKitFormBoundary--\r\n";

    #[test]
    fn test_parse_form() {
        let form = Message::parse_form(FORM);
        assert_eq!(form.len(), 3);
        assert_eq!(
            form.get("username").and_then(FormValue::as_text),
            Some("admin@something%test+what/ever")
        );
        assert_eq!(
            form.get("colors").and_then(FormValue::as_list),
            Some(&["red".to_string(), "dark blue".to_string()][..])
        );
        assert_eq!(
            form.get("upload"),
            Some(&FormValue::File {
                filename: "notes.txt".to_string(),
                content_type: Some("text/plain".to_string()),
                contents: b"line one".to_vec(),
            })
        );
        assert!(!form.contains("ignored.txt"));
    }

    #[test]
    fn test_parse_form_keeps_undecodable_content() {
        let text = "Content-Type: multipart/form-data; boundary=b\r\n\r\n\
            --b\r\n\
            Content-Disposition: form-data; name=broken\r\n\
            Content-Transfer-Encoding: base64\r\n\
            \r\n\
            not*base64\r\n\
            --b--\r\n";
        let form = Message::parse_form(text);
        assert_eq!(
            form.get("broken").and_then(FormValue::as_text),
            Some("not*base64")
        );
    }

    #[test]
    fn test_form_data_order_and_replace() {
        let mut form = FormData::new();
        form.insert("a", FormValue::Text("1".to_string()));
        form.push("b", "x".to_string());
        form.push("b", "y".to_string());
        form.insert("a", FormValue::Text("2".to_string()));
        let names: Vec<_> = form.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(form.get("a").and_then(FormValue::as_text), Some("2"));
        assert_eq!(form.get("b").and_then(FormValue::as_list).unwrap().len(), 2);
    }

    #[test]
    fn test_create_form() {
        let fields = vec![
            ("username", FormField::from("admin@test/whatever%DUDE!")),
            (
                "colors",
                FormField::from(vec!["red".to_string(), "blue".to_string()]),
            ),
            (
                "file",
                FormField::from(
                    FormFile::new("/tmp/test.pdf", "%PDF-1.4").with_content_type("application/pdf"),
                ),
            ),
        ];
        let mut message = Message::create_form(fields).unwrap();
        assert_eq!(message.sub_type(), Some("form-data"));

        let rendered = message.render().unwrap();
        assert!(rendered.contains("Content-Type: multipart/form-data; boundary="));
        assert!(rendered.contains("Content-Disposition: form-data; name=username"));
        assert!(rendered.contains("admin%40test%2Fwhatever%25DUDE%21"));
        assert_eq!(
            rendered
                .matches("Content-Disposition: form-data; name=colors[]")
                .count(),
            2
        );
        assert!(rendered.contains("Content-Disposition: form-data; name=file; filename=test.pdf"));
        assert!(rendered.contains("Content-Type: application/pdf"));
        assert!(rendered.contains("Content-Transfer-Encoding: base64"));
        assert!(rendered.contains("JVBERi0xLjQ=\r\n"));
    }

    #[test]
    fn test_binary_file_survives_render() {
        let png = [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe, 0x00, 0x80];
        let mut message = Message::create_form([(
            "img",
            FormField::from(FormFile::new("a.png", png).with_content_type("image/png")),
        )])
        .unwrap();

        let form = Message::parse_form(&message.render().unwrap());
        assert_eq!(
            form.get("img"),
            Some(&FormValue::File {
                filename: "a.png".to_string(),
                content_type: Some("image/png".to_string()),
                contents: png.to_vec(),
            })
        );
    }

    #[test]
    fn test_create_form_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "from disk").unwrap();
        let path = file.path().to_string_lossy().into_owned();

        let mut message =
            Message::create_form([("doc", FormField::File(FormFile::from_path(path.clone())))])
                .unwrap();
        message.render().unwrap();
        let part = &message.parts()[0];
        assert!(part.body().unwrap().is_file());
        assert!(part.body().unwrap().is_base64());
        assert_eq!(part.contents_as_string().unwrap(), "from disk");
        let expected = Path::new(&path).file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(part.filename(), Some(expected));
    }

    #[test]
    fn test_create_form_missing_file() {
        let result = Message::create_form([(
            "doc",
            FormField::File(FormFile::from_path("/nonexistent/file.bin")),
        )]);
        assert!(result.unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_then_parse() {
        let mut message = Message::create_form([
            ("q", FormField::from("a b&c")),
            ("tags", FormField::from(vec!["x".to_string(), "y z".to_string()])),
        ])
        .unwrap();
        let form = Message::parse_form(&message.render().unwrap());
        assert_eq!(form.get("q").and_then(FormValue::as_text), Some("a b&c"));
        assert_eq!(
            form.get("tags").and_then(FormValue::as_list),
            Some(&["x".to_string(), "y z".to_string()][..])
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_form_data_serde() {
        let form = Message::parse_form(FORM);
        let json = serde_json::to_string(&form).unwrap();
        let restored: FormData = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, form);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_form_field_serde() {
        let field =
            FormField::from(FormFile::new("a.png", [0x89, 0x50]).with_content_type("image/png"));
        let json = serde_json::to_string(&field).unwrap();
        let restored: FormField = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, field);
    }
}
