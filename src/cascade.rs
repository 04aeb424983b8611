//! Field cascades: pick the first non-empty candidate among several fields.
//!
//! Each page kind has its own ordered candidate list for the display title.
//! A candidate is either used raw or passed through
//! [`collapse_notice`](crate::text::collapse_notice) first. When every
//! candidate is blank the title is a placeholder.

use crate::markup::escape;
use crate::models::Record;
use crate::text::collapse_notice;

/// Placeholder rendered when no title candidate is populated.
pub const TITLE_PLACEHOLDER: &str = "titre non précisé";

/// Placeholder for a missing genre in the main information block.
pub const GENRE_PLACEHOLDER: &str = "non précisé";

/// Which title cascade to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleCascade {
    /// Source page heading.
    SourcePage,
    /// Entry in a project's work catalog.
    WorkListing,
    /// Work page heading.
    WorkPage,
    /// Fragment page heading.
    FragmentPage,
}

#[derive(Debug, Clone, Copy)]
enum Candidate {
    Raw(&'static str),
    Notice(&'static str),
}

impl TitleCascade {
    fn candidates(self) -> &'static [Candidate] {
        match self {
            TitleCascade::SourcePage => &[
                Candidate::Raw("titre_cle_sre"),
                Candidate::Raw("titre_cle"),
                Candidate::Notice("notice_bibl"),
                Candidate::Notice("srce_notes"),
            ],
            TitleCascade::WorkListing => &[Candidate::Notice("oeuvre")],
            TitleCascade::WorkPage => &[Candidate::Raw("oeuvre")],
            TitleCascade::FragmentPage => &[Candidate::Raw("frag")],
        }
    }
}

/// Outcome of a title cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Title {
    Text(String),
    Placeholder,
}

impl Title {
    /// Plain text, used for `<title>` and link labels in plain contexts.
    pub fn plain(&self) -> &str {
        match self {
            Title::Text(s) => s,
            Title::Placeholder => TITLE_PLACEHOLDER,
        }
    }

    /// Markup: escaped text, or the emphasized placeholder.
    pub fn html(&self) -> String {
        match self {
            Title::Text(s) => escape(s),
            Title::Placeholder => format!("<em>{}</em>", TITLE_PLACEHOLDER),
        }
    }
}

/// Select a record's title through the given cascade.
pub fn select_title(record: &Record, cascade: TitleCascade) -> Title {
    for candidate in cascade.candidates() {
        let value = match *candidate {
            Candidate::Raw(name) => record.field(name).to_string(),
            Candidate::Notice(name) => collapse_notice(record.field(name)),
        };
        if !value.trim().is_empty() {
            return Title::Text(value);
        }
    }
    Title::Placeholder
}

/// First non-empty value among `fields`, or `None`.
pub fn first_non_empty<'r>(record: &'r Record, fields: &[&str]) -> Option<&'r str> {
    fields
        .iter()
        .map(|name| record.field(name))
        .find(|value| !value.trim().is_empty())
}

/// Field value or the genre placeholder, escaped.
pub fn genre_or_placeholder(record: &Record, field: &str) -> String {
    match first_non_empty(record, &[field]) {
        Some(value) => escape(value.trim()),
        None => GENRE_PLACEHOLDER.to_string(),
    }
}
