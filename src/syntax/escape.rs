//! C-style string escapes used by the PO format.

use thiserror::Error;

/// Defines errors that may occur while decoding a quoted PO string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// Error when a backslash is the last character of the string
    #[error("Trailing backslash in string")]
    TrailingBackslash,
    /// Error when an unknown escape sequence is encountered
    #[error("Unknown escape sequence '\\{0}'")]
    UnknownEscape(char),
}

/// Decodes the contents of a quoted PO string (without the surrounding quotes).
///
/// Supports the escape sequences `msgfmt` accepts: `\\`, `\"`, `\n`, `\t`,
/// `\r`, `\a`, `\b`, `\f`, `\v` and `\0`.
///
/// # Errors
/// Returns an error on a trailing backslash or an unknown escape sequence.
pub fn unescape(raw: &str) -> Result<String, EscapeError> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(esc) = chars.next() else {
            return Err(EscapeError::TrailingBackslash);
        };
        match esc {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'v' => out.push('\u{0B}'),
            '0' => out.push('\0'),
            other => return Err(EscapeError::UnknownEscape(other)),
        }
    }

    Ok(out)
}

/// Encodes a decoded string back into quoted-PO form (without surrounding quotes).
///
/// Inverse of [`unescape`] for every sequence it produces.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            '\u{0B}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }

    out
}
