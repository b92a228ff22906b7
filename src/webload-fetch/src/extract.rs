//! Body decoding and visible-text extraction.

use encoding_rs::{Encoding, UTF_8};
use scraper::Html;

use crate::filter::is_space;

/// Elements whose text content is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// How far into the body to look for a `<meta charset>` declaration.
const META_PRESCAN_BYTES: usize = 1024;

/// Decode a response body to text.
///
/// Encoding is taken from, in order: a byte order mark, the `charset`
/// parameter of `Content-Type`, a `charset=` declaration near the start of
/// the document, then UTF-8. Malformed sequences become U+FFFD.
pub fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .or_else(|| sniff_meta_charset(body))
        .unwrap_or(UTF_8);

    // `decode` gives a BOM precedence over the declared encoding.
    let (text, _, _) = encoding.decode(body);
    text.into_owned()
}

fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let label = value.trim().trim_matches(|c: char| c == '"' || c == '\'');
        Encoding::for_label(label.as_bytes())
    })
}

fn sniff_meta_charset(body: &[u8]) -> Option<&'static Encoding> {
    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();

    let label: String = head[start..]
        .trim_start_matches(|c: char| c == '"' || c == '\'')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(*c, '-' | '_' | ':' | '.'))
        .collect();
    Encoding::for_label(label.as_bytes())
}

/// Extract the visible text of an HTML document.
///
/// Every text node is taken in document order, stripped of surrounding
/// whitespace; empty ones are dropped and the rest joined with `\n`.
/// Comments and the content of `script`, `style`, `template` and
/// `noscript` elements are skipped.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut segments: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|element| HIDDEN_ELEMENTS.contains(&element.name()))
        });
        if hidden {
            continue;
        }

        let content: &str = &text.text;
        let trimmed = content.trim_matches(is_space);
        if !trimmed.is_empty() {
            segments.push(trimmed);
        }
    }

    segments.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_body() {
        let html = "<html><body>Some Public Content For Testing</body></html>";
        assert_eq!(html_to_text(html), "Some Public Content For Testing");
    }

    #[test]
    fn test_segments_are_joined_with_newlines() {
        let html = r#"
<html>
  <head><title>Example Domain</title></head>
  <body>
    <h1>  Heading  </h1>
    <p>First paragraph with <a href="/x">a link</a> inside.</p>
    <ul><li>one</li><li>two</li></ul>
    line<br>break
  </body>
</html>"#;

        assert_eq!(
            html_to_text(html),
            "Example Domain\nHeading\nFirst paragraph with\na link\ninside.\none\ntwo\nline\nbreak"
        );
    }

    #[test]
    fn test_hidden_content_is_skipped() {
        let html = r#"<html><head><style>body { color: red }</style>
<script>var secret = "do not show";</script></head>
<body><!-- a comment --><p>Visible</p>
<noscript><p>Enable JavaScript</p></noscript>
<template><p>Template body</p></template></body></html>"#;

        assert_eq!(html_to_text(html), "Visible");
    }

    #[test]
    fn test_entities_are_decoded() {
        let html = "<p>Fish &amp; chips &lt;today&gt; &eacute;t&eacute;</p>";
        assert_eq!(html_to_text(html), "Fish & chips <today> été");
    }

    #[test]
    fn test_multiline_text_node_is_kept_intact() {
        let html = "<pre>\n  first line\n  second line\n</pre>";
        assert_eq!(html_to_text(html), "first line\n  second line");
    }

    #[test]
    fn test_plain_text_body() {
        assert_eq!(html_to_text("just some text"), "just some text");
        assert_eq!(html_to_text(""), "");
    }

    #[test]
    fn test_decode_defaults_to_utf8() {
        assert_eq!(decode_body("héllo".as_bytes(), None), "héllo");
        assert_eq!(decode_body(b"caf\xff", None), "caf\u{fffd}");
    }

    #[test]
    fn test_decode_uses_content_type_charset() {
        // 0xE9 is 'é' in windows-1252 / latin1
        let body = b"caf\xe9";
        assert_eq!(
            decode_body(body, Some("text/html; charset=ISO-8859-1")),
            "café"
        );
        assert_eq!(
            decode_body(body, Some("text/html; charset=\"windows-1252\"")),
            "café"
        );
    }

    #[test]
    fn test_decode_sniffs_meta_charset() {
        let body = b"<html><head><meta charset=\"windows-1252\"></head><body>caf\xe9</body></html>";
        assert!(decode_body(body, Some("text/html")).contains("café"));

        let body = b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\">caf\xe9";
        assert!(decode_body(body, None).contains("café"));
    }

    #[test]
    fn test_decode_bom_wins() {
        let body = b"\xef\xbb\xbfcaf\xc3\xa9";
        assert_eq!(decode_body(body, Some("text/html; charset=windows-1252")), "café");
    }
}
