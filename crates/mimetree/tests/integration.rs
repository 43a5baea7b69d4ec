//! Integration tests for building, rendering and parsing MIME trees.

#![allow(clippy::unwrap_used)]

use std::io::Write;

use proptest::prelude::*;

use mimetree::{
    Body, Encoding, FormField, FormFile, FormValue, Header, HeaderValue, Message, Part, Split,
};

fn text_part(content_type: &str, body: &str) -> Part {
    Part::new()
        .with_header(Header::with_value("Content-Type", content_type))
        .with_body(body)
}

fn attachment_part(filename: &str, contents: &[u8]) -> Part {
    let mut body = Body::new(contents).with_encoding(Encoding::Base64);
    body.set_as_file(true);
    Part::new()
        .with_header(Header::with_value(
            "Content-Disposition",
            HeaderValue::new("attachment").with_parameter("filename", filename),
        ))
        .with_body(body)
}

fn encoding_strategy() -> impl Strategy<Value = Encoding> {
    prop_oneof![
        Just(Encoding::Base64),
        Just(Encoding::Quoted),
        Just(Encoding::Url),
        Just(Encoding::RawUrl),
    ]
}

proptest! {
    #[test]
    fn rendered_leaf_decodes_to_original(
        content in prop::collection::vec(any::<u8>(), 0..512),
        encoding in encoding_strategy(),
    ) {
        let mut part = Part::new().with_body(Body::new(content.clone()).with_encoding(encoding));
        part.render().unwrap();
        prop_assert_eq!(part.contents().unwrap(), content);
    }

    #[test]
    fn render_is_idempotent(
        text in "[ -~]{0,200}",
        encoding in encoding_strategy(),
        chunk in 1usize..100,
    ) {
        let mut message = Message::new();
        message.set_header("Subject", "idempotent").add_part(
            Part::new()
                .with_header(Header::with_value("Content-Type", "text/plain"))
                .with_body(
                    Body::new(text.as_str())
                        .with_encoding(encoding)
                        .with_split(Split::Length(chunk)),
                ),
        );
        message.set_sub_type("mixed");

        let first = message.render().unwrap();
        let second = message.render().unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn parsed_message_keeps_part_count(bodies in prop::collection::vec("[a-zA-Z0-9 ]{1,40}", 1..6)) {
        let mut message = Message::new();
        message.set_header("Subject", "count").set_sub_type("mixed");
        for body in &bodies {
            message.add_part(text_part("text/plain", body));
        }

        let rendered = message.render().unwrap();
        let parsed = Message::parse(&rendered);
        prop_assert_eq!(parsed.parts().len(), bodies.len());
    }
}

#[test]
fn test_boundary_delimits_every_child() {
    let mut message = Message::new();
    message
        .set_sub_type("mixed")
        .add_part(text_part("text/plain", "one"))
        .add_part(text_part("text/plain", "two"))
        .add_part(text_part("text/plain", "three"));

    let rendered = message.render().unwrap();
    let boundary = message.boundary().unwrap().to_string();
    assert_eq!(boundary.len(), 40);
    assert_eq!(rendered.matches(&format!("--{boundary}\r\n")).count(), 3);
    assert_eq!(rendered.matches(&format!("--{boundary}--\r\n")).count(), 1);
    assert!(rendered.ends_with(&format!("--{boundary}--\r\n")));
}

#[test]
fn test_nested_multipart_round_trip() {
    let mut message = Message::new();
    message
        .set_header("From", "sender@example.com")
        .set_header("Subject", "Nested")
        .set_sub_type("mixed")
        .add_part(
            Part::new()
                .with_sub_type("alternative")
                .with_part(text_part("text/plain", "Hello"))
                .with_part(text_part("text/html", "<p>Hello</p>")),
        )
        .add_part(attachment_part("data.bin", &[0, 1, 2, 254, 255]));

    let rendered = message.render().unwrap();
    let parsed = Message::parse(&rendered);

    assert_eq!(parsed.parts().len(), 2);
    assert_eq!(parsed.parts()[0].parts().len(), 2);
    assert_eq!(parsed.parts()[0].sub_type(), Some("alternative"));
    assert_eq!(parsed.parts()[0].parts()[1].content_type(), Some("text/html"));

    let attachments = parsed.attachments();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].filename().as_deref(), Some("data.bin"));
    assert_eq!(attachments[0].contents().unwrap(), vec![0, 1, 2, 254, 255]);
}

#[test]
fn test_single_group_with_three_children() {
    let mut message = Message::new();
    message.set_sub_type("mixed").add_group([
        text_part("text/plain", "a"),
        text_part("text/plain", "b"),
        attachment_part("c.txt", b"c"),
    ]);
    assert_eq!(message.parts()[0].sub_type(), Some("mixed"));

    let parsed = Message::parse(&message.render().unwrap());
    assert_eq!(parsed.parts().len(), 1);
    assert_eq!(parsed.parts()[0].parts().len(), 3);
}

#[test]
fn test_parsed_headers_survive_round_trip() {
    let mut message = Message::new();
    message
        .set_header("From", "sender@example.com")
        .set_header("To", "recipient@example.com")
        .set_header("Subject", "Round trip")
        .set_header("Date", "Mon, 1 Jan 2024 00:00:00 +0000")
        .set_header("MIME-Version", "1.0")
        .set_sub_type("alternative")
        .add_part(text_part("text/plain", "plain"))
        .add_part(text_part("text/html", "<b>html</b>"));

    let rendered = message.render().unwrap();
    let parsed = Message::parse(&rendered);

    assert_eq!(parsed.headers().len(), 6);
    assert_eq!(parsed.date(), Some("Mon, 1 Jan 2024 00:00:00 +0000"));
    assert_eq!(parsed.boundary(), message.boundary());
}

#[test]
fn test_attachment_detection() {
    let lone = Part::new().with_header(Header::parse("Content-Disposition: attachment; filename=x"));
    assert!(lone.has_attachment());

    let plain = Part::new()
        .with_part(text_part("text/plain", "a"))
        .with_part(Part::new().with_part(text_part("text/html", "b")));
    assert!(!plain.has_attachment());

    let nested = Part::new()
        .with_part(text_part("text/plain", "a"))
        .with_part(Part::new().with_part(lone));
    assert!(nested.has_attachment());
    assert_eq!(nested.attachments().len(), 1);
}

#[test]
fn test_header_value_parsing() {
    let header =
        Header::parse("Content-Disposition: form-data; name=file; filename=\"some file.pdf\"");
    let value = header.value(0).unwrap();
    assert_eq!(value.value(), Some("form-data"));
    assert_eq!(value.parameter("name"), Some("file"));
    assert_eq!(value.parameter("filename"), Some("some file.pdf"));

    let auth = HeaderValue::parse("Bearer abc123; foo=bar");
    assert_eq!(auth.scheme(), Some("Bearer "));
    assert_eq!(auth.value(), Some("abc123"));
    assert_eq!(auth.parameter("foo"), Some("bar"));
}

#[test]
fn test_form_list_round_trip() {
    let mut form = Message::create_form([(
        "colors",
        FormField::from(vec!["Red".to_string(), "Green".to_string()]),
    )])
    .unwrap();

    let parsed = Message::parse_form(&form.render().unwrap());
    assert_eq!(
        parsed.get("colors").and_then(FormValue::as_list),
        Some(&["Red".to_string(), "Green".to_string()][..])
    );
}

#[test]
fn test_form_file_round_trip() {
    let mut file = tempfile::Builder::new()
        .prefix("report")
        .suffix(".csv")
        .tempfile()
        .unwrap();
    write!(file, "a,b\r\n1,2").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let mut form = Message::create_form([
        ("title", FormField::from("Q1 report")),
        (
            "report",
            FormField::File(FormFile::from_path(path.clone()).with_content_type("text/csv")),
        ),
    ])
    .unwrap();

    let parsed = Message::parse_form(&form.render().unwrap());
    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed.get("title").and_then(FormValue::as_text), Some("Q1 report"));

    let Some(FormValue::File {
        filename,
        content_type,
        contents,
    }) = parsed.get("report")
    else {
        panic!("expected a file field");
    };
    assert!(filename.starts_with("report"));
    assert_eq!(content_type.as_deref(), Some("text/csv"));
    assert_eq!(contents, b"a,b\r\n1,2");
}

#[test]
fn test_add_file_attachment_round_trip() {
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .unwrap();
    let line = "The quick brown fox jumps over the lazy dog. ".repeat(4);
    write!(file, "{line}").unwrap();

    let mut attachment = Part::new();
    attachment.add_file(file.path()).unwrap();

    let mut message = Message::new();
    message
        .set_sub_type("mixed")
        .add_part(text_part("text/plain", "see attached"))
        .add_part(attachment);

    let rendered = message.render().unwrap();
    assert!(rendered.contains("Content-Transfer-Encoding: base64"));
    assert!(rendered.lines().all(|l| l.len() <= 998));

    let parsed = Message::parse(&rendered);
    let attachments = parsed.attachments();
    assert_eq!(attachments.len(), 1);
    assert!(attachments[0].body().unwrap().is_base64());
    assert_eq!(attachments[0].contents_as_string().unwrap(), line);
}

#[test]
fn test_missing_file_is_reported() {
    let mut part = Part::new();
    let error = part.add_file("/nonexistent/attachment.pdf").unwrap_err();
    assert!(error.is_not_found());
    assert!(error.to_string().contains("/nonexistent/attachment.pdf"));
}

#[test]
fn test_malformed_input_degrades() {
    let message = Message::parse("Content-Type: multipart/mixed; boundary=zzz\r\n\r\nno delimiters here");
    assert_eq!(message.parts().len(), 1);
    assert_eq!(
        message.parts()[0].contents_as_string().unwrap(),
        "no delimiters here"
    );

    let unterminated = Message::parse(
        "Content-Type: multipart/mixed; boundary=b\r\n\r\n--b\r\nContent-Type: text/plain\r\n\r\ndangling",
    );
    assert_eq!(unterminated.parts().len(), 1);
    assert_eq!(
        unterminated.parts()[0].contents_as_string().unwrap(),
        "dangling"
    );
}
