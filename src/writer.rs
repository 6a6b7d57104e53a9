//! Canonical PO serialization.
//!
//! Parsing a canonical file and writing it back is byte-identical, which
//! keeps catalogs diff-stable when tools rewrite them.

use std::fmt::Write as _;

use crate::catalog::{Catalog, Entry};
use crate::syntax::escape::escape;

/// Serializes a catalog to canonical PO text.
///
/// Canonical form: gettext comment order, one `Key: value\n` header segment
/// per line, single-line quoted strings for regular entries, one blank line
/// between entries.
#[must_use]
pub fn write(catalog: &Catalog) -> String {
    let mut out = String::new();

    let comments = &catalog.header_comments;
    push_comment_block(
        &mut out,
        &comments.translator,
        &comments.extracted,
        &comments.references,
        &comments.flags,
        &comments.previous,
    );
    out.push_str("msgid \"\"\n");
    out.push_str("msgstr \"\"\n");
    for (name, value) in catalog.header.fields() {
        let _ = writeln!(out, "\"{}: {}\\n\"", escape(name), escape(value));
    }

    for entry in catalog.entries() {
        out.push('\n');
        write_entry(&mut out, entry);
    }

    out
}

/// Appends one entry in canonical form.
fn write_entry(out: &mut String, entry: &Entry) {
    push_comment_block(
        out,
        &entry.translator_comments,
        &entry.extracted_comments,
        &entry.references,
        &entry.flags,
        &entry.previous,
    );

    if let Some(msgctxt) = &entry.msgctxt {
        let _ = writeln!(out, "msgctxt \"{}\"", escape(msgctxt));
    }
    let _ = writeln!(out, "msgid \"{}\"", escape(&entry.msgid));

    if let Some(plural) = &entry.msgid_plural {
        let _ = writeln!(out, "msgid_plural \"{}\"", escape(plural));
        for (i, variant) in entry.msgstr.iter().enumerate() {
            let _ = writeln!(out, "msgstr[{i}] \"{}\"", escape(variant));
        }
    } else {
        let _ = writeln!(out, "msgstr \"{}\"", escape(entry.value()));
    }
}

/// Appends a full comment block in gettext order.
fn push_comment_block(
    out: &mut String,
    translator: &[String],
    extracted: &[String],
    references: &[String],
    flags: &[String],
    previous: &[String],
) {
    for comment in translator {
        push_comment(out, ' ', comment);
    }
    for comment in extracted {
        push_comment(out, '.', comment);
    }
    for reference in references {
        push_comment(out, ':', reference);
    }
    if !flags.is_empty() {
        let _ = writeln!(out, "#, {}", flags.join(", "));
    }
    for line in previous {
        push_comment(out, '|', line);
    }
}

/// Appends one comment line with the given marker character.
fn push_comment(out: &mut String, marker: char, text: &str) {
    out.push('#');
    if marker != ' ' {
        out.push(marker);
    }
    if text.is_empty() {
        out.push('\n');
    } else {
        out.push(' ');
        out.push_str(text);
        out.push('\n');
    }
}
