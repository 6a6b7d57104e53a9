//! Line-oriented parser for the PO format.
//!
//! PO はトークンツリーではなく行指向フォーマットなので、字句解析も手書きで行う。
//! Comment lines, keyword lines and bare string continuation lines are the
//! only three shapes a line can take.

use std::collections::HashMap;

use thiserror::Error;

use crate::catalog::{Catalog, Entry, Header, HeaderComments};
use crate::syntax::escape::{self, EscapeError};
use crate::types::SourceRange;

/// Defines errors that may occur while parsing PO text.
///
/// Line numbers are 1-based, as reported by gettext tools.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Error when a string literal is missing its closing quote
    #[error("Line {line}: unterminated string")]
    UnterminatedString {
        /// 1-based line number.
        line: u32,
    },
    /// Error when a keyword is not followed by a quoted string
    #[error("Line {line}: expected quoted string after '{keyword}'")]
    ExpectedString {
        /// 1-based line number.
        line: u32,
        /// The keyword that was being parsed.
        keyword: String,
    },
    /// Error when a string contains an invalid escape sequence
    #[error("Line {line}: {source}")]
    Escape {
        /// 1-based line number.
        line: u32,
        /// The underlying escape error.
        source: EscapeError,
    },
    /// Error when a line is neither comment, keyword nor continuation
    #[error("Line {line}: unexpected content '{content}'")]
    UnexpectedLine {
        /// 1-based line number.
        line: u32,
        /// The offending line text.
        content: String,
    },
    /// Error when two entries share the same (msgctxt, msgid) key
    #[error("Line {line}: duplicate entry for msgid \"{msgid}\"")]
    DuplicateEntry {
        /// 1-based line number of the second occurrence.
        line: u32,
        /// The duplicated key.
        msgid: String,
    },
    /// Error when a keyword appears without the msgid it belongs to
    #[error("Line {line}: '{keyword}' without a preceding msgid")]
    StrayKeyword {
        /// 1-based line number.
        line: u32,
        /// The stray keyword.
        keyword: String,
    },
    /// Error when indexed msgstr variants are not consecutive from zero
    #[error("Line {line}: msgstr[{index}] out of order, expected msgstr[{expected}]")]
    PluralIndex {
        /// 1-based line number.
        line: u32,
        /// The index that appeared.
        index: usize,
        /// The index that was expected.
        expected: usize,
    },
    /// Error when singular and plural msgstr forms are mixed in one entry
    #[error("Line {line}: plural entries require msgstr[N], singular entries plain msgstr")]
    MixedPlural {
        /// 1-based line number.
        line: u32,
    },
    /// Error when an entry ends without any msgstr
    #[error("Line {line}: entry \"{msgid}\" has no msgstr")]
    MissingMsgstr {
        /// 1-based line number of the entry start.
        line: u32,
        /// The untranslatable key.
        msgid: String,
    },
}

/// Which string the next bare `"..."` continuation line appends to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    /// Appending to msgctxt.
    Msgctxt,
    /// Appending to msgid.
    Msgid,
    /// Appending to msgid_plural.
    MsgidPlural,
    /// Appending to the singular msgstr.
    Msgstr,
    /// Appending to the last msgstr[N] variant.
    MsgstrIndexed,
}

/// Accumulates one entry's lines until a boundary finalizes it.
#[derive(Debug, Default)]
struct EntryBuilder {
    /// 0-based line the entry started on.
    start_line: Option<u32>,
    /// 0-based line last consumed into this entry.
    last_line: u32,
    /// Collected msgctxt, if any.
    msgctxt: Option<String>,
    /// Collected msgid, if seen.
    msgid: Option<String>,
    /// Collected msgid_plural, if any.
    msgid_plural: Option<String>,
    /// Singular msgstr, if seen.
    msgstr: Option<String>,
    /// Indexed msgstr[N] variants, in index order.
    msgstr_plural: Vec<String>,
    /// Translator comments (`# `).
    translator_comments: Vec<String>,
    /// Extracted comments (`#.`).
    extracted_comments: Vec<String>,
    /// Source references (`#:`).
    references: Vec<String>,
    /// Flags (`#,`).
    flags: Vec<String>,
    /// Previous msgid lines (`#|`).
    previous: Vec<String>,
    /// Continuation target for bare string lines.
    target: Option<Target>,
}

impl EntryBuilder {
    /// True if nothing at all has been collected.
    fn is_blank(&self) -> bool {
        self.start_line.is_none()
    }

    /// True if the builder has reached the msgstr part of an entry.
    const fn in_msgstr(&self) -> bool {
        matches!(self.target, Some(Target::Msgstr | Target::MsgstrIndexed))
    }

    /// Marks a consumed line.
    fn touch(&mut self, line: u32) {
        if self.start_line.is_none() {
            self.start_line = Some(line);
        }
        self.last_line = line;
    }

    /// Appends a continuation chunk to the current target string.
    fn append(&mut self, chunk: &str, line: u32) -> Result<(), ParseError> {
        let slot = match self.target {
            Some(Target::Msgctxt) => self.msgctxt.as_mut(),
            Some(Target::Msgid) => self.msgid.as_mut(),
            Some(Target::MsgidPlural) => self.msgid_plural.as_mut(),
            Some(Target::Msgstr) => self.msgstr.as_mut(),
            Some(Target::MsgstrIndexed) => self.msgstr_plural.last_mut(),
            None => None,
        };
        match slot {
            Some(s) => {
                s.push_str(chunk);
                Ok(())
            }
            None => Err(ParseError::UnexpectedLine {
                line: line + 1,
                content: format!("\"{}\"", escape::escape(chunk)),
            }),
        }
    }

    /// Converts the collected lines into an [`Entry`].
    ///
    /// Returns `Ok(None)` for dangling comments with no msgid.
    fn finish(self) -> Result<Option<Entry>, ParseError> {
        let start = self.start_line.unwrap_or(0);

        let Some(msgid) = self.msgid else {
            if !self.translator_comments.is_empty() || !self.extracted_comments.is_empty() {
                tracing::debug!(line = start + 1, "Dropping dangling comments without msgid");
            }
            return Ok(None);
        };

        let msgstr = if self.msgid_plural.is_some() {
            if self.msgstr_plural.is_empty() {
                return Err(ParseError::MissingMsgstr { line: start + 1, msgid });
            }
            self.msgstr_plural
        } else {
            match self.msgstr {
                Some(s) => vec![s],
                None => return Err(ParseError::MissingMsgstr { line: start + 1, msgid }),
            }
        };

        Ok(Some(Entry {
            msgctxt: self.msgctxt,
            msgid,
            msgid_plural: self.msgid_plural,
            msgstr,
            translator_comments: self.translator_comments,
            extracted_comments: self.extracted_comments,
            references: self.references,
            flags: self.flags,
            previous: self.previous,
            range: SourceRange::lines(start, self.last_line),
        }))
    }
}

/// Parses PO text into a [`Catalog`].
///
/// The entry with an empty msgid becomes the catalog header; every other
/// entry must have a unique (msgctxt, msgid) key.
///
/// # Errors
/// Returns a [`ParseError`] locating the first malformed line.
pub fn parse(text: &str) -> Result<Catalog, ParseError> {
    let mut entries: Vec<Entry> = Vec::new();
    let mut builder = EntryBuilder::default();
    let mut header: Option<Header> = None;
    let mut header_comments = HeaderComments::default();

    for (i, raw_line) in text.lines().enumerate() {
        let lineno = line_no(i);
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            finalize(&mut builder, &mut entries, &mut header, &mut header_comments)?;
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            // Comments after an entry's msgstr open the next entry.
            if builder.in_msgstr() {
                finalize(&mut builder, &mut entries, &mut header, &mut header_comments)?;
            }
            consume_comment(&mut builder, comment, lineno);
            continue;
        }

        if line.starts_with('"') {
            let chunk = parse_string(line, lineno, "continuation")?;
            builder.append(&chunk, lineno)?;
            builder.touch(lineno);
            continue;
        }

        consume_keyword(
            &mut builder,
            &mut entries,
            &mut header,
            &mut header_comments,
            line,
            lineno,
        )?;
    }

    finalize(&mut builder, &mut entries, &mut header, &mut header_comments)?;

    if header.is_none() {
        tracing::warn!("Catalog has no header entry");
    }

    check_duplicates(&entries)?;

    Catalog::from_parts(header_comments, header.unwrap_or_default(), entries)
        // Uniqueness was verified above, so this arm is not reachable.
        .map_err(|msgid| ParseError::DuplicateEntry { line: 0, msgid })
}

/// Converts a 0-based usize line index into u32.
fn line_no(i: usize) -> u32 {
    u32::try_from(i).unwrap_or(u32::MAX)
}

/// Routes one keyword line into the builder.
fn consume_keyword(
    builder: &mut EntryBuilder,
    entries: &mut Vec<Entry>,
    header: &mut Option<Header>,
    header_comments: &mut HeaderComments,
    line: &str,
    lineno: u32,
) -> Result<(), ParseError> {
    // A new msgctxt/msgid after msgstr starts the next entry.
    if builder.in_msgstr() && (line.starts_with("msgctxt") || line.starts_with("msgid ")) {
        finalize(builder, entries, header, header_comments)?;
    }

    if let Some(rest) = line.strip_prefix("msgctxt") {
        if builder.msgctxt.is_some() || builder.msgid.is_some() {
            return Err(ParseError::UnexpectedLine {
                line: lineno + 1,
                content: line.to_string(),
            });
        }
        builder.msgctxt = Some(parse_string(rest, lineno, "msgctxt")?);
        builder.target = Some(Target::Msgctxt);
    } else if let Some(rest) = line.strip_prefix("msgid_plural") {
        if builder.msgid.is_none() || builder.in_msgstr() {
            return Err(ParseError::StrayKeyword {
                line: lineno + 1,
                keyword: "msgid_plural".to_string(),
            });
        }
        builder.msgid_plural = Some(parse_string(rest, lineno, "msgid_plural")?);
        builder.target = Some(Target::MsgidPlural);
    } else if let Some(rest) = line.strip_prefix("msgid") {
        if builder.msgid.is_some() {
            return Err(ParseError::UnexpectedLine {
                line: lineno + 1,
                content: line.to_string(),
            });
        }
        builder.msgid = Some(parse_string(rest, lineno, "msgid")?);
        builder.target = Some(Target::Msgid);
    } else if let Some(rest) = line.strip_prefix("msgstr[") {
        if builder.msgid.is_none() {
            return Err(ParseError::StrayKeyword {
                line: lineno + 1,
                keyword: "msgstr[N]".to_string(),
            });
        }
        if builder.msgid_plural.is_none() || builder.msgstr.is_some() {
            return Err(ParseError::MixedPlural { line: lineno + 1 });
        }
        let (index, rest) = parse_plural_index(rest, lineno)?;
        let expected = builder.msgstr_plural.len();
        if index != expected {
            return Err(ParseError::PluralIndex { line: lineno + 1, index, expected });
        }
        builder.msgstr_plural.push(parse_string(rest, lineno, "msgstr[N]")?);
        builder.target = Some(Target::MsgstrIndexed);
    } else if let Some(rest) = line.strip_prefix("msgstr") {
        if builder.msgid.is_none() {
            return Err(ParseError::StrayKeyword {
                line: lineno + 1,
                keyword: "msgstr".to_string(),
            });
        }
        if builder.msgid_plural.is_some() || builder.msgstr.is_some() {
            return Err(ParseError::MixedPlural { line: lineno + 1 });
        }
        builder.msgstr = Some(parse_string(rest, lineno, "msgstr")?);
        builder.target = Some(Target::Msgstr);
    } else {
        return Err(ParseError::UnexpectedLine { line: lineno + 1, content: line.to_string() });
    }

    builder.touch(lineno);
    Ok(())
}

/// Records one comment line into the builder.
fn consume_comment(builder: &mut EntryBuilder, comment: &str, lineno: u32) {
    match comment.chars().next() {
        // Obsolete entries are kept by merge tools but ignored by msgfmt.
        Some('~') => {
            tracing::debug!(line = lineno + 1, "Skipping obsolete entry line");
            return;
        }
        Some('.') => builder
            .extracted_comments
            .push(strip_marker(comment).to_string()),
        Some(':') => builder.references.push(strip_marker(comment).to_string()),
        Some(',') => builder.flags.extend(
            strip_marker(comment).split(',').map(str::trim).map(ToString::to_string),
        ),
        Some('|') => builder.previous.push(strip_marker(comment).to_string()),
        _ => builder
            .translator_comments
            .push(comment.strip_prefix(' ').unwrap_or(comment).to_string()),
    }
    builder.touch(lineno);
}

/// Drops the one-character comment marker and one following space.
fn strip_marker(comment: &str) -> &str {
    let rest = comment.get(1..).unwrap_or("");
    rest.strip_prefix(' ').unwrap_or(rest)
}

/// Parses the `N]` part of `msgstr[N]`, returning the index and the rest.
fn parse_plural_index(rest: &str, lineno: u32) -> Result<(usize, &str), ParseError> {
    let Some((digits, tail)) = rest.split_once(']') else {
        return Err(ParseError::UnexpectedLine {
            line: lineno + 1,
            content: format!("msgstr[{rest}"),
        });
    };
    let index = digits.parse::<usize>().map_err(|_| ParseError::UnexpectedLine {
        line: lineno + 1,
        content: format!("msgstr[{rest}"),
    })?;
    Ok((index, tail))
}

/// Parses one quoted string occupying the remainder of a line.
fn parse_string(rest: &str, lineno: u32, keyword: &str) -> Result<String, ParseError> {
    let rest = rest.trim();
    let Some(inner) = rest.strip_prefix('"') else {
        return Err(ParseError::ExpectedString {
            line: lineno + 1,
            keyword: keyword.to_string(),
        });
    };

    // Scan to the closing quote, honouring backslash escapes.
    let mut end = None;
    let mut escaped = false;
    for (pos, c) in inner.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            end = Some(pos);
            break;
        }
    }
    let Some(end) = end else {
        return Err(ParseError::UnterminatedString { line: lineno + 1 });
    };

    let tail = inner.get(end + 1..).unwrap_or("");
    if !tail.trim().is_empty() {
        return Err(ParseError::UnexpectedLine {
            line: lineno + 1,
            content: tail.trim().to_string(),
        });
    }

    let raw = inner.get(..end).unwrap_or("");
    escape::unescape(raw).map_err(|source| ParseError::Escape { line: lineno + 1, source })
}

/// Closes the current builder, routing the result to header or entries.
fn finalize(
    builder: &mut EntryBuilder,
    entries: &mut Vec<Entry>,
    header: &mut Option<Header>,
    header_comments: &mut HeaderComments,
) -> Result<(), ParseError> {
    if builder.is_blank() {
        return Ok(());
    }
    let start = builder.start_line.unwrap_or(0);
    let Some(entry) = std::mem::take(builder).finish()? else {
        return Ok(());
    };

    let is_header = entry.msgid.is_empty() && entry.msgctxt.is_none() && !entry.is_plural();
    if is_header {
        if header.is_some() {
            return Err(ParseError::DuplicateEntry { line: start + 1, msgid: String::new() });
        }
        *header = Some(Header::parse(entry.value()));
        *header_comments = HeaderComments {
            translator: entry.translator_comments,
            extracted: entry.extracted_comments,
            references: entry.references,
            flags: entry.flags,
            previous: entry.previous,
        };
        return Ok(());
    }

    entries.push(entry);
    Ok(())
}

/// Verifies the unique-key invariant, reporting the second occurrence.
fn check_duplicates(entries: &[Entry]) -> Result<(), ParseError> {
    let mut seen: HashMap<(Option<&str>, &str), u32> = HashMap::with_capacity(entries.len());
    for entry in entries {
        let key = (entry.msgctxt.as_deref(), entry.msgid.as_str());
        if seen.insert(key, entry.range.start.line).is_some() {
            return Err(ParseError::DuplicateEntry {
                line: entry.range.start.line + 1,
                msgid: entry.msgid.clone(),
            });
        }
    }
    Ok(())
}
