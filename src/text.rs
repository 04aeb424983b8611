//! Stateless text utilities for free-text catalog fields.
//!
//! Two operations:
//!
//! - [`split_lines`] / [`render_lines`]: break a field on any line-break form
//!   (CRLF, CR, LF, or a literal `<br/>` marker) for multi-line display.
//! - [`collapse_notice`]: squeeze a bibliographic notice onto a single line,
//!   using a middle dot as separator.

use crate::markup::escape;

/// Separator used by one-line notice renderings.
pub const NOTICE_SEPARATOR: &str = " · ";

/// Literal line-break markers that may appear inside field text. Checked
/// after CRLF, CR and LF.
const LINE_BREAK_MARKERS: &[&str] = &["<br/>", "<br />", "<br>"];

/// Length in bytes of the line break starting at the beginning of `rest`,
/// if any. Forms are tested in fixed priority: CRLF, CR, LF, markers.
fn line_break_at(rest: &str) -> Option<usize> {
    if rest.starts_with("\r\n") {
        return Some(2);
    }
    if rest.starts_with('\r') || rest.starts_with('\n') {
        return Some(1);
    }
    LINE_BREAK_MARKERS
        .iter()
        .find(|marker| rest.starts_with(**marker))
        .map(|marker| marker.len())
}

/// Split text into line segments. A CRLF pair is a single break.
///
/// Returns at least one segment; consecutive breaks yield empty segments.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while pos < text.len() {
        match line_break_at(&text[pos..]) {
            Some(len) => {
                segments.push(&text[start..pos]);
                pos += len;
                start = pos;
            }
            None => {
                // Advance by one whole character.
                let ch_len = text[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
                pos += ch_len;
            }
        }
    }
    segments.push(&text[start..]);
    segments
}

/// Escape each segment and join them with a visual line break.
pub fn render_lines(text: &str) -> String {
    split_lines(text)
        .into_iter()
        .map(escape)
        .collect::<Vec<_>>()
        .join("<br/>")
}

/// Rewrite every line-break form as a plain `\n`.
fn normalize_breaks(text: &str) -> String {
    split_lines(text).join("\n")
}

/// Collapse a notice onto one line.
///
/// 1. Cut at the first blank line (two or more consecutive breaks).
/// 2. Replace `" / "` with the middle-dot separator.
/// 3. Replace every remaining run of breaks with the separator.
/// 4. Fold repeated `"· "` sequences and trim.
pub fn collapse_notice(text: &str) -> String {
    let normalized = normalize_breaks(text);
    let head = match normalized.find("\n\n") {
        Some(idx) => &normalized[..idx],
        None => normalized.as_str(),
    };

    let slashed = head.replace(" / ", NOTICE_SEPARATOR);

    let mut joined = String::with_capacity(slashed.len());
    let mut in_break = false;
    for c in slashed.chars() {
        if c == '\n' {
            if !in_break {
                joined.push_str(NOTICE_SEPARATOR);
                in_break = true;
            }
        } else {
            joined.push(c);
            in_break = false;
        }
    }

    let mut folded = joined;
    while folded.contains("· · ") {
        folded = folded.replace("· · ", "· ");
    }
    folded.trim().to_string()
}
