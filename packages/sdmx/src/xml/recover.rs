//! Best-effort repair of markup that strict parsing rejects.
//!
//! SDMX services occasionally emit unescaped ampersands in names, stray
//! control characters or a preamble in front of the XML declaration. These
//! are fixed textually before a second parse attempt. Structural damage
//! such as unclosed or mismatched tags is left to [`super::lenient`].

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Entity or character reference following an `&`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(?:[A-Za-z_][A-Za-z0-9_.-]*|#[0-9]+|#x[0-9A-Fa-f]+);").expect("valid regex")
});

/// Repair common defects in XML text.
///
/// - drops anything before the first `<` (BOMs, whitespace, log noise)
/// - removes characters that are not allowed in XML 1.0
/// - escapes `&` that does not start an entity or character reference
///
/// # Examples
/// ```
/// use sdmx_rest::xml::repair;
///
/// assert_eq!(repair("\u{feff}<a>R&D</a>"), "<a>R&amp;D</a>");
/// assert_eq!(repair("<a>&amp;</a>"), "<a>&amp;</a>");
/// ```
pub fn repair(text: &str) -> Cow<'_, str> {
    let start = text.find('<').unwrap_or(text.len());
    let body = &text[start..];

    if !body.contains('&') && body.chars().all(is_xml_char) {
        return Cow::Borrowed(body);
    }

    let mut out = String::with_capacity(body.len() + 16);
    for (i, c) in body.char_indices() {
        if c == '&' {
            if REFERENCE_PATTERN.is_match(&body[i..]) {
                out.push('&');
            } else {
                out.push_str("&amp;");
            }
        } else if is_xml_char(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Characters permitted by the XML 1.0 `Char` production.
fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
