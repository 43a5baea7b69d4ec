//! # mimetree
//!
//! Build, render and parse MIME messages as a tree of parts.
//!
//! ## Features
//!
//! - **Part tree**: headers plus either a body or nested parts, rendered
//!   with boundaries, preamble and synthesized `Content-Type` /
//!   `Content-Transfer-Encoding` headers
//! - **Header values**: scheme, value and ordered parameters with quoting
//! - **Bodies**: Base64, Quoted-Printable, URL and raw URL encodings with
//!   optional line chunking, from memory or from files
//! - **Parsing**: lenient parsing of raw messages, including nested multiparts
//! - **Forms**: `multipart/form-data` creation and parsing, with `name[]` lists
//!
//! ## Quick Start
//!
//! ### Building a Message
//!
//! ```
//! use mimetree::{Body, Encoding, Header, Message, Part};
//!
//! let mut message = Message::new();
//! message
//!     .set_header("Subject", "Hello")
//!     .set_sub_type("alternative")
//!     .add_part(
//!         Part::new()
//!             .with_header(Header::with_value("Content-Type", "text/plain"))
//!             .with_body(Body::new("Hello, World!").with_encoding(Encoding::Quoted)),
//!     );
//!
//! let rendered = message.render()?;
//! assert!(rendered.contains("Content-Type: multipart/alternative; boundary="));
//! assert!(rendered.contains("Content-Transfer-Encoding: quoted-printable"));
//! # Ok::<(), mimetree::Error>(())
//! ```
//!
//! ### Parsing a Message
//!
//! ```
//! use mimetree::Message;
//!
//! let raw = "Subject: Test\r\n\
//!            Content-Type: multipart/mixed; boundary=b\r\n\
//!            \r\n\
//!            --b\r\n\
//!            Content-Type: text/plain\r\n\
//!            \r\n\
//!            Hello\r\n\
//!            --b--\r\n";
//!
//! let message = Message::parse(raw);
//! assert_eq!(message.subject(), Some("Test"));
//! assert_eq!(message.parts()[0].contents_as_string()?, "Hello");
//! # Ok::<(), mimetree::Error>(())
//! ```
//!
//! ### Forms
//!
//! ```
//! use mimetree::{FormField, FormValue, Message};
//!
//! let mut form = Message::create_form([
//!     ("username", FormField::from("admin@example.com")),
//!     ("colors", FormField::from(vec!["red".to_string(), "blue".to_string()])),
//! ])?;
//!
//! let parsed = Message::parse_form(&form.render()?);
//! assert_eq!(
//!     parsed.get("username").and_then(FormValue::as_text),
//!     Some("admin@example.com")
//! );
//! # Ok::<(), mimetree::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod body;
mod error;
mod form;
mod header;
mod message;
mod part;

pub mod encoding;

pub use body::{Body, Encoding, Split};
pub use error::{Error, Result};
pub use form::{FormData, FormField, FormFile, FormValue};
pub use header::{DEFAULT_DELIMITER, DEFAULT_INDENT, Header, HeaderValue};
pub use message::{Message, ParsedPart};
pub use part::{PREAMBLE, Part};
