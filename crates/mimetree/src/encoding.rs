//! MIME encoding and decoding utilities.
//!
//! Supports Base64, Quoted-Printable, URL (form style, `+` for space),
//! raw URL (RFC 3986 percent-encoding), line chunking and RFC 2047
//! encoded-word decoding.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

/// Default chunk length for split bodies.
pub const DEFAULT_CHUNK_LENGTH: usize = 76;

/// Maximum line length for Quoted-Printable encoding.
const MAX_LINE_LENGTH: usize = 76;

#[allow(clippy::expect_used)]
static ENCODED_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"=\?([^?\s]+)\?([BbQq])\?([^?\s]*)\?=").expect("encoded-word pattern is valid")
});

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decodes Base64 data.
///
/// Whitespace (line breaks from chunked bodies) is ignored.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Encodes bytes using Quoted-Printable encoding (RFC 2045).
///
/// CRLF pairs are kept as hard line breaks, lines are soft-broken with
/// `=\r\n` before they exceed 76 characters, and whitespace that would end
/// up at the end of a line is escaped.
#[must_use]
pub fn encode_quoted_printable(data: &[u8]) -> String {
    let mut result = String::with_capacity(data.len());
    let mut line_length = 0;
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];

        if byte == b'\r' && data.get(i + 1) == Some(&b'\n') {
            result.push_str("\r\n");
            line_length = 0;
            i += 2;
            continue;
        }

        let at_line_end = matches!(data.get(i + 1), None | Some(b'\r'));
        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !at_line_end,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the trailing '=' of a soft break
        if line_length + width > MAX_LINE_LENGTH - 1 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            result.push(byte as char);
        } else {
            let _ = write!(result, "={byte:02X}");
        }
        line_length += width;
        i += 1;
    }

    result
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// # Errors
///
/// Returns an error if the input contains invalid escape sequences.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        if data[i] != b'=' {
            result.push(data[i]);
            i += 1;
            continue;
        }

        let rest = &data[i + 1..];
        if rest.starts_with(b"\r\n") {
            // Soft line break
            i += 3;
        } else if rest.starts_with(b"\n") {
            i += 2;
        } else if rest.len() >= 2 {
            let (hi, lo) = (rest[0], rest[1]);
            if !hi.is_ascii_hexdigit() || !lo.is_ascii_hexdigit() {
                return Err(Error::InvalidEncoding(format!(
                    "Invalid hex escape: ={}{}",
                    hi as char, lo as char
                )));
            }
            result.push((hex_value(hi) << 4) | hex_value(lo));
            i += 3;
        } else {
            return Err(Error::InvalidEncoding(
                "Incomplete escape sequence".to_string(),
            ));
        }
    }

    Ok(result)
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

/// Percent-encodes bytes the way HTML forms do: space becomes `+`.
#[must_use]
pub fn encode_url(data: &[u8]) -> String {
    encode_raw_url(data).replace("%20", "+")
}

/// Decodes form-style percent-encoding (`+` is a space).
#[must_use]
pub fn decode_url(data: &[u8]) -> Vec<u8> {
    let spaced: Vec<u8> = data
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    urlencoding::decode_binary(&spaced).into_owned()
}

/// Percent-encodes bytes per RFC 3986 (space becomes `%20`).
#[must_use]
pub fn encode_raw_url(data: &[u8]) -> String {
    urlencoding::encode_binary(data).into_owned()
}

/// Decodes RFC 3986 percent-encoding.
#[must_use]
pub fn decode_raw_url(data: &[u8]) -> Vec<u8> {
    urlencoding::decode_binary(data).into_owned()
}

/// Splits data into lines of `length` bytes, each followed by CRLF.
///
/// A `length` of zero falls back to [`DEFAULT_CHUNK_LENGTH`].
#[must_use]
pub fn chunk_split(data: &[u8], length: usize) -> Vec<u8> {
    let length = if length == 0 {
        DEFAULT_CHUNK_LENGTH
    } else {
        length
    };
    let mut result = Vec::with_capacity(data.len() + (data.len() / length + 1) * 2);
    for chunk in data.chunks(length) {
        result.extend_from_slice(chunk);
        result.extend_from_slice(b"\r\n");
    }
    result
}

/// Decodes RFC 2047 encoded words inside a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded words is dropped; the charset label is not used for
/// transcoding, the decoded bytes must be UTF-8.
///
/// # Errors
///
/// Returns an error if an encoded word cannot be decoded.
pub fn decode_rfc2047(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut last_end = 0;
    let mut previous_was_word = false;

    for caps in ENCODED_WORD.captures_iter(text) {
        let Some(word) = caps.get(0) else {
            continue;
        };

        let between = &text[last_end..word.start()];
        if !(previous_was_word && between.trim().is_empty()) {
            result.push_str(between);
        }

        let encoded = &caps[3];
        let decoded = if caps[2].eq_ignore_ascii_case("B") {
            decode_base64(encoded)?
        } else {
            // Q encoding: underscore stands for space
            decode_quoted_printable(encoded.replace('_', " ").as_bytes())?
        };
        result.push_str(&String::from_utf8(decoded)?);

        last_end = word.end();
        previous_was_word = true;
    }

    result.push_str(&text[last_end..]);
    Ok(result)
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
    fn test_base64_encode_decode() {
        let data = b"Hello, World!";
        let encoded = encode_base64(data);
        assert_eq!(encoded, "SGVsbG8sIFdvcmxkIQ==");

        let decoded = decode_base64(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_base64_decode_chunked() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxk\r\nIQ==\r\n").unwrap();
        assert_eq!(decoded, b"Hello, World!");
    }

    #[test]
    fn test_quoted_printable_encode() {
        let encoded = encode_quoted_printable(b"Hello, World!");
        assert_eq!(encoded, "Hello, World!");

        let encoded = encode_quoted_printable("Héllo, Wørld!".as_bytes());
        assert!(encoded.contains("=C3"));

        let encoded = encode_quoted_printable(b"a=b");
        assert_eq!(encoded, "a=3Db");
    }

    #[test]
    fn test_quoted_printable_trailing_space() {
        assert_eq!(encode_quoted_printable(b"end "), "end=20");
        assert_eq!(encode_quoted_printable(b"end \r\nnext"), "end=20\r\nnext");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "Hello World! What's up?! ".repeat(10);
        let encoded = encode_quoted_printable(text.as_bytes());
        assert!(encoded.contains("=\r\n"));
        for line in encoded.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert_eq!(decode_quoted_printable(encoded.as_bytes()).unwrap(), text.as_bytes());
    }

    #[test]
    fn test_quoted_printable_decode() {
        let decoded = decode_quoted_printable(b"H=C3=A9llo").unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), "Héllo");
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        let decoded = decode_quoted_printable(b"Hello=\r\nWorld").unwrap();
        assert_eq!(decoded, b"HelloWorld");
    }

    #[test]
    fn test_quoted_printable_invalid_escape() {
        assert!(decode_quoted_printable(b"bad=ZZ").is_err());
        assert!(decode_quoted_printable(b"bad=").is_err());
    }

    #[test]
    fn test_url_encoding() {
        assert_eq!(encode_url(b"a b&c"), "a+b%26c");
        assert_eq!(decode_url(b"a+b%26c"), b"a b&c");
        assert_eq!(encode_url(b"1+1"), "1%2B1");
    }

    #[test]
    fn test_raw_url_encoding() {
        assert_eq!(
            encode_raw_url(b"admin@test/whatever%DUDE!"),
            "admin%40test%2Fwhatever%25DUDE%21"
        );
        assert_eq!(encode_raw_url(b"a b"), "a%20b");
        assert_eq!(decode_raw_url(b"a+b%20c"), b"a+b c");
    }

    #[test]
    fn test_chunk_split() {
        assert_eq!(chunk_split(b"abcdefg", 3), b"abc\r\ndef\r\ng\r\n");
        assert_eq!(chunk_split(b"", 3), b"");
        assert_eq!(chunk_split(&[b'x'; 80], 0).len(), 80 + 4);
    }

    #[test]
    fn test_rfc2047_decode() {
        assert_eq!(decode_rfc2047("Hello").unwrap(), "Hello");
        assert_eq!(decode_rfc2047("=?utf-8?B?SMOpbGxv?=").unwrap(), "Héllo");
    }

    #[test]
    fn test_rfc2047_quoted_printable() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?H=C3=A9llo_there?=").unwrap(), "Héllo there");
    }

    #[test]
    fn test_rfc2047_adjacent_words() {
        let decoded = decode_rfc2047("=?utf-8?Q?r=C3=A9sum?= =?utf-8?Q?=C3=A9.pdf?=").unwrap();
        assert_eq!(decoded, "résumé.pdf");

        let decoded = decode_rfc2047("Re: =?utf-8?B?SMOpbGxv?= again").unwrap();
        assert_eq!(decoded, "Re: Héllo again");
    }

    proptest! {
        #[test]
        fn base64_round_trip(data in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode_base64(&encode_base64(&data)).unwrap(), data);
        }

        #[test]
        fn quoted_printable_round_trip(data in prop::collection::vec(any::<u8>(), 0..512)) {
            let encoded = encode_quoted_printable(&data);
            prop_assert_eq!(decode_quoted_printable(encoded.as_bytes()).unwrap(), data);
        }

        #[test]
        fn url_round_trip(data in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode_url(encode_url(&data).as_bytes()), data);
        }

        #[test]
        fn raw_url_round_trip(data in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode_raw_url(encode_raw_url(&data).as_bytes()), data);
        }
    }
}
