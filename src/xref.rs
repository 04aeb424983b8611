//! Cross-references between works and their fragments.
//!
//! Both directions go through the legacy `num_orig` suffix: a reference
//! number is zero-padded to [`SUFFIX_WIDTH`](crate::catalog::SUFFIX_WIDTH)
//! digits and compared as a string with the last characters of candidate
//! identifiers, within the same project. This is not a numeric comparison.
//! Unparseable tokens and unmatched numbers resolve to nothing.

use crate::catalog::{pad_token, Catalog};
use crate::models::{Nature, Record};

/// Separator used in `a_pour_fragments` and `fragment_de`.
pub const REFERENCE_SEPARATOR: &str = " - ";

/// Fragment numbers listed in `a_pour_fragments`. The first token is a
/// count/sentinel and is skipped.
pub fn fragment_tokens(a_pour_fragments: &str) -> Vec<&str> {
    a_pour_fragments
        .split(REFERENCE_SEPARATOR)
        .skip(1)
        .map(str::trim)
        .collect()
}

/// Parent work number from a `"<projet> - <number>"` back-reference.
pub fn parent_token(fragment_de: &str) -> Option<&str> {
    fragment_de
        .rsplit_once(REFERENCE_SEPARATOR)
        .map(|(_, number)| number.trim())
}

/// Fragment records of a work, in `a_pour_fragments` token order.
///
/// Every match for every token contributes; tokens without a match are
/// dropped silently.
pub fn work_fragments(catalog: &Catalog<'_>, work: &Record) -> Vec<usize> {
    let mut found = Vec::new();
    for token in fragment_tokens(work.field("a_pour_fragments")) {
        let Some(padded) = pad_token(token) else {
            log::debug!("ignoring non-numeric fragment token '{}'", token);
            continue;
        };
        found.extend_from_slice(catalog.by_suffix(work.projet(), &Nature::Fragment, &padded));
    }
    found
}

/// Number of `a_pour_fragments` tokens on a work that match no fragment
/// record of its project. Each token counts once, however many records it
/// matches.
pub fn unresolved_fragment_tokens(catalog: &Catalog<'_>, work: &Record) -> usize {
    fragment_tokens(work.field("a_pour_fragments"))
        .into_iter()
        .filter(|token| match pad_token(token) {
            Some(padded) => catalog
                .by_suffix(work.projet(), &Nature::Fragment, &padded)
                .is_empty(),
            None => true,
        })
        .count()
}

/// Parent work records of a fragment. Usually zero or one; all matches are
/// returned when several share the suffix.
pub fn fragment_parents(catalog: &Catalog<'_>, fragment: &Record) -> Vec<usize> {
    let Some(token) = parent_token(fragment.field("fragment_de")) else {
        return Vec::new();
    };
    match pad_token(token) {
        Some(padded) => catalog
            .by_suffix(fragment.projet(), &Nature::Oeuvre, &padded)
            .to_vec(),
        None => Vec::new(),
    }
}
