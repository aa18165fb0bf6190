//! Minimal character encoding detection
//!
//! Precedence, first hit wins:
//!
//! 1. A byte-order mark.
//! 2. The `encoding` pseudo-attribute of an XML declaration on the first line,
//!    read as UTF-8 (everything in a declaration is ASCII).
//! 3. The configured fallback, normally UTF-8.
//!
//! The BOM is not cross-checked against the declaration, and nothing past the
//! first line is inspected. Unrecognized labels fall through to the next step.

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use regex::Regex;
use schemadiag_core::config::EncodingConfig;
use std::sync::LazyLock;
use tracing::{debug, warn};

static ENCODING_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\sencoding\s*=\s*['"](.*?)['"]"#).expect("Valid encoding declaration regex")
});

/// `\r\n`, `\n`, or a lone `\r`
pub(crate) static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r\n|\n|\r").expect("Valid line break regex"));

/// Known byte-order marks, longest first
fn byte_order_marks() -> [(&'static [u8], &'static Encoding); 3] {
    [
        (&[0xEF, 0xBB, 0xBF], UTF_8),
        (&[0xFE, 0xFF], UTF_16BE),
        (&[0xFF, 0xFE], UTF_16LE),
    ]
}

/// The encoding named by a byte-order mark at the start of `bytes`
///
/// Each signature must match in full, so a two-byte UTF-16 mark can never be
/// confused with a prefix of the three-byte UTF-8 mark.
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<&'static Encoding> {
    byte_order_marks()
        .into_iter()
        .find(|(signature, _)| bytes.starts_with(signature))
        .map(|(_, encoding)| encoding)
}

/// The encoding declared by an XML declaration, if recognized
#[must_use]
pub fn detect_from_declaration(first_line: &str) -> Option<&'static Encoding> {
    let label = ENCODING_DECL.captures(first_line.trim())?.get(1)?.as_str();
    let encoding = Encoding::for_label(label.as_bytes());
    if encoding.is_none() {
        debug!(label, "ignoring unrecognized encoding declaration");
    }
    encoding
}

/// Pick the encoding for a raw document
#[must_use]
pub fn detect_charset(bytes: &[u8], config: &EncodingConfig) -> &'static Encoding {
    if config.detect_bom
        && let Some(encoding) = detect_bom(bytes)
    {
        debug!(encoding = encoding.name(), "encoding from byte-order mark");
        return encoding;
    }

    if config.detect_declaration {
        let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        if let Some(encoding) = detect_from_declaration(&String::from_utf8_lossy(first_line)) {
            debug!(encoding = encoding.name(), "encoding from XML declaration");
            return encoding;
        }
    }

    fallback(config)
}

fn fallback(config: &EncodingConfig) -> &'static Encoding {
    Encoding::for_label(config.fallback.as_bytes()).unwrap_or_else(|| {
        warn!(label = %config.fallback, "unrecognized fallback encoding, using UTF-8");
        UTF_8
    })
}

/// Decode `bytes`, dropping a byte-order mark that matches `encoding`
#[must_use]
pub fn decode(bytes: &[u8], encoding: &'static Encoding) -> String {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        debug!(
            encoding = encoding.name(),
            "malformed byte sequences replaced while decoding"
        );
    }
    text.into_owned()
}

/// Split decoded text into lines, without line terminators
///
/// `\r\n`, `\n` and a lone `\r` each end a line. A terminator at the very
/// end does not start another, empty line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    let body = LINE_BREAK
        .find_iter(text)
        .last()
        .filter(|found| found.end() == text.len())
        .map_or(text, |found| &text[..found.start()]);
    LINE_BREAK.split(body).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(bytes: &[u8]) -> &'static Encoding {
        detect_charset(bytes, &EncodingConfig::default())
    }

    #[test]
    fn test_utf16le_bom_is_not_mistaken_for_utf8() {
        assert_eq!(detect(&[0xFF, 0xFE, b'<', 0x00]), UTF_16LE);
        assert_eq!(detect(&[0xFE, 0xFF, 0x00, b'<']), UTF_16BE);
        assert_eq!(detect(&[0xEF, 0xBB, 0xBF, b'<']), UTF_8);
    }

    #[test]
    fn test_truncated_bom_does_not_match() {
        assert_eq!(detect_bom(&[0xEF, 0xBB]), None);
        assert_eq!(detect_bom(&[0xFF]), None);
        assert_eq!(detect_bom(b""), None);
    }

    #[test]
    fn test_declaration_encoding() {
        let doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<a>\xE9</a>\n";
        let encoding = detect(doc);
        assert_eq!(encoding, Encoding::for_label(b"ISO-8859-1").unwrap());
        assert!(decode(doc, encoding).contains("<a>\u{e9}</a>"));
    }

    #[test]
    fn test_latin1_declaration_decodes_as_windows_1252() {
        // 0x80..=0x9F are C1 controls in ISO-8859-1 but printable in windows-1252
        let doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<a>\x80\x9F\xE9</a>\n";
        let encoding = detect(doc);
        assert_eq!(encoding.name(), "windows-1252");
        assert!(decode(doc, encoding).contains("<a>\u{20ac}\u{178}\u{e9}</a>"));
    }

    #[test]
    fn test_split_lines_on_every_line_ending() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\r\rb\r"), vec!["a", "", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert_eq!(split_lines("\n"), vec![""]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_single_quoted_declaration() {
        let encoding = detect_from_declaration("<?xml version='1.0' encoding = 'UTF-16' ?>");
        assert_eq!(encoding, Encoding::for_label(b"utf-16"));
    }

    #[test]
    fn test_unknown_label_falls_back() {
        assert_eq!(detect(b"<?xml version=\"1.0\" encoding=\"no-such\"?><a/>"), UTF_8);
        assert_eq!(detect(b"<a/>"), UTF_8);
    }

    #[test]
    fn test_configured_fallback() {
        let config = EncodingConfig {
            fallback: "windows-1252".to_string(),
            ..EncodingConfig::default()
        };
        assert_eq!(detect_charset(b"<a/>", &config).name(), "windows-1252");

        let config = EncodingConfig {
            fallback: "bogus".to_string(),
            ..EncodingConfig::default()
        };
        assert_eq!(detect_charset(b"<a/>", &config), UTF_8);
    }

    #[test]
    fn test_bom_detection_can_be_disabled() {
        let config = EncodingConfig {
            detect_bom: false,
            ..EncodingConfig::default()
        };
        assert_eq!(detect_charset(&[0xFF, 0xFE, b'<', 0x00], &config), UTF_8);
    }

    #[test]
    fn test_decode_strips_bom_and_splits_lines() {
        let bytes = b"\xEF\xBB\xBF<a>\r\n  <b/>\n</a>";
        let text = decode(bytes, UTF_8);
        assert!(text.starts_with("<a>"));
        assert_eq!(split_lines(&text), vec!["<a>", "  <b/>", "</a>"]);
    }

    #[test]
    fn test_decode_utf16le() {
        let bytes: Vec<u8> = [0xFF, 0xFE]
            .into_iter()
            .chain("<a/>".encode_utf16().flat_map(u16::to_le_bytes))
            .collect();
        let encoding = detect(&bytes);
        assert_eq!(decode(&bytes, encoding), "<a/>");
    }
}
