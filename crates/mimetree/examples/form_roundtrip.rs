//! Example: build a `multipart/form-data` request body and parse it back
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=mimetree=debug cargo run -p mimetree --example form_roundtrip
//! ```

use mimetree::{FormField, FormFile, FormValue, Message};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut form = Message::create_form([
        ("username", FormField::from("admin@example.com")),
        (
            "colors",
            FormField::from(vec!["Red".to_string(), "Green".to_string()]),
        ),
        (
            "avatar",
            FormField::from(
                FormFile::new("avatar.svg", "<svg xmlns=\"http://www.w3.org/2000/svg\"/>")
                    .with_content_type("image/svg+xml"),
            ),
        ),
    ])?;

    let rendered = form.render()?;
    println!("{rendered}");

    let parsed = Message::parse_form(&rendered);
    for (name, value) in parsed.iter() {
        match value {
            FormValue::Text(text) => println!("{name} = {text}"),
            FormValue::List(values) => println!("{name} = [{}]", values.join(", ")),
            FormValue::File {
                filename,
                content_type,
                contents,
            } => println!(
                "{name} = file {filename} ({}, {} bytes)",
                content_type.as_deref().unwrap_or("unknown type"),
                contents.len()
            ),
        }
    }

    Ok(())
}
