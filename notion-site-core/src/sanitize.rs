//! Path sanitizer: turns a page title or slug into a path that is safe both as a URL path
//! and as a relative filesystem path.
//!
//! The pipeline is: pick slug or title, lowercase, spaces to hyphens, decode as a URL path
//! (rejecting malformed input), then strip everything a path segment should not contain.
//! The output is a fixed point: sanitizing it again returns it unchanged.

use std::borrow::Cow;

use crate::error::PathError;

/// Computes the access path for a page. A non-empty `slug` wins over `title`.
pub fn sanitize(title: &str, slug: Option<&str>) -> Result<String, PathError> {
    let chosen = slug
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| title.trim());
    if chosen.is_empty() {
        return Err(PathError::Empty);
    }

    let lowered = chosen.to_lowercase().replace(' ', "-");
    let decoded = parse_url_path(&lowered)?;
    let cleaned = sanitize_path(&decoded.to_lowercase());
    if cleaned.is_empty() {
        return Err(PathError::Empty);
    }
    Ok(cleaned)
}

/// Validates and percent-decodes a URL path.
fn parse_url_path(input: &str) -> Result<Cow<'_, str>, PathError> {
    if input.chars().any(char::is_control) {
        return Err(PathError::ControlCharacter {
            input: input.to_string(),
        });
    }

    let bytes = input.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'%' {
            continue;
        }
        let valid = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            let escape: String = input[i..].chars().take(3).collect();
            return Err(PathError::InvalidEscape {
                input: input.to_string(),
                escape,
            });
        }
    }

    urlencoding::decode(input).map_err(|_| PathError::InvalidUtf8 {
        input: input.to_string(),
    })
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || is_combining_mark(c) || matches!(c, '.' | '_' | '-' | '~' | '+' | '@')
}

/// Combining diacritics. Most other marks (Indic vowel signs and the like) are already
/// alphabetic.
fn is_combining_mark(c: char) -> bool {
    matches!(c,
        '\u{0300}'..='\u{036F}'
        | '\u{1AB0}'..='\u{1AFF}'
        | '\u{1DC0}'..='\u{1DFF}'
        | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}

/// Filesystem sanitation. Whitespace becomes a hyphen, backslashes count as separators,
/// other disallowed characters are dropped. Hyphen runs collapse, segment edges lose their
/// hyphens, and empty, `.` and `..` segments disappear.
fn sanitize_path(input: &str) -> String {
    input
        .split(['/', '\\'])
        .map(sanitize_segment)
        .filter(|seg| !seg.is_empty() && seg != "." && seg != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if !is_allowed(c) {
            continue;
        }
        if c == '-' && (out.is_empty() || out.ends_with('-')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}
