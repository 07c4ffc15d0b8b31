//! Named placeholder scanning.
//!
//! Splits query text into raw SQL and `:name` placeholders. Quoted literals,
//! quoted identifiers, dollar-quoted bodies, comments and `::` casts are
//! copied through untouched.

use crate::error::{FragError, FragResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Raw(String),
    Named(String),
}

/// Query text split at its named placeholders.
#[derive(Debug, Clone, Default)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_ident_char(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

impl Template {
    pub(crate) fn parse(text: &str) -> FragResult<Self> {
        let bytes = text.as_bytes();
        let mut segments = Vec::new();
        let mut raw_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                quote @ (b'\'' | b'"') => {
                    let escape_string = quote == b'\''
                        && i > 0
                        && matches!(bytes[i - 1], b'E' | b'e')
                        && (i < 2 || !is_ident_char(bytes[i - 2]));
                    i = skip_quoted(text, i, quote, escape_string)?;
                }
                b'-' if bytes.get(i + 1) == Some(&b'-') => {
                    i = match text[i..].find('\n') {
                        Some(pos) => i + pos + 1,
                        None => bytes.len(),
                    };
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = match text[i + 2..].find("*/") {
                        Some(pos) => i + 2 + pos + 2,
                        None => {
                            return Err(FragError::compilation(format!(
                                "unterminated block comment at byte {i}"
                            )));
                        }
                    };
                }
                b'$' => i = skip_dollar(text, i)?,
                b':' if bytes.get(i + 1) == Some(&b':') => i += 2,
                b':' if bytes.get(i + 1).is_some_and(|b| is_ident_start(*b)) => {
                    let start = i + 1;
                    let mut end = start + 1;
                    while end < bytes.len() && is_ident_char(bytes[end]) {
                        end += 1;
                    }
                    if raw_start < i {
                        segments.push(Segment::Raw(text[raw_start..i].to_string()));
                    }
                    segments.push(Segment::Named(text[start..end].to_string()));
                    i = end;
                    raw_start = end;
                }
                _ => i += 1,
            }
        }

        if raw_start < bytes.len() {
            segments.push(Segment::Raw(text[raw_start..].to_string()));
        }
        Ok(Self { segments })
    }

    pub(crate) fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholder names, in order of first appearance.
    pub(crate) fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for seg in &self.segments {
            if let Segment::Named(name) = seg {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|seg| matches!(seg, Segment::Named(n) if n == name))
    }
}

/// Skip a `'...'` literal or `"..."` identifier starting at `start`.
/// A doubled quote inside is an escaped quote; in an `E'...'` escape string a
/// backslash also escapes the next byte.
fn skip_quoted(text: &str, start: usize, quote: u8, escape_string: bool) -> FragResult<usize> {
    let bytes = text.as_bytes();
    let mut j = start + 1;
    while j < bytes.len() {
        if escape_string && bytes[j] == b'\\' {
            j += 2;
            continue;
        }
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return Ok(j + 1);
        }
        j += 1;
    }
    Err(FragError::compilation(format!(
        "unterminated quoted {} at byte {start}",
        if quote == b'\'' { "literal" } else { "identifier" }
    )))
}

/// Handle a `$` at `start`: dollar-quoted bodies are skipped, positional
/// placeholders are rejected, and `$` inside an identifier is kept.
fn skip_dollar(text: &str, start: usize) -> FragResult<usize> {
    let bytes = text.as_bytes();

    if start > 0 && is_ident_char(bytes[start - 1]) {
        return Ok(start + 1);
    }

    match bytes.get(start + 1) {
        Some(b) if b.is_ascii_digit() => {
            let mut end = start + 1;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            Err(FragError::compilation(format!(
                "positional placeholder `{}` is not supported; use `:name` placeholders",
                &text[start..end]
            )))
        }
        Some(b) if *b == b'$' || is_ident_start(*b) => {
            let mut tag_end = start + 1;
            while tag_end < bytes.len() && is_ident_char(bytes[tag_end]) {
                tag_end += 1;
            }
            if bytes.get(tag_end) != Some(&b'$') {
                return Ok(start + 1);
            }
            let tag = &text[start..=tag_end];
            let body = tag_end + 1;
            match text[body..].find(tag) {
                Some(pos) => Ok(body + pos + tag.len()),
                None => Err(FragError::compilation(format!(
                    "unterminated dollar-quoted string {tag} at byte {start}"
                ))),
            }
        }
        _ => Ok(start + 1),
    }
}
