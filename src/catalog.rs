//! Catalog index: lookup structures built once per run.
//!
//! A single linear pass over the record sequence produces:
//!
//! - the distinct projects in first-occurrence order, with their records,
//! - a partition of record positions by [`Nature`],
//! - a suffix map keyed by `(projet, nature, suffix)` where `suffix` is the
//!   last [`SUFFIX_WIDTH`] characters of `num_orig`.
//!
//! Records are referenced by their position in the input slice. The index
//! is immutable after [`Catalog::build`] and is shared by reference with
//! every page builder.

use std::collections::HashMap;

use crate::models::{Nature, Record};

/// Width of the legacy-identifier suffix. Compatibility constant for the
/// `num_orig` scheme, where everything before the suffix is a non-numeric
/// project/source prefix.
pub const SUFFIX_WIDTH: usize = 5;

/// Last [`SUFFIX_WIDTH`] characters of a legacy identifier, or the whole
/// string when it is shorter.
pub fn legacy_suffix(num_orig: &str) -> &str {
    let count = num_orig.chars().count();
    if count <= SUFFIX_WIDTH {
        return num_orig;
    }
    let skip = count - SUFFIX_WIDTH;
    let start = num_orig
        .char_indices()
        .nth(skip)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &num_orig[start..]
}

/// Zero-pad a reference token to [`SUFFIX_WIDTH`] digits.
///
/// Returns `None` when the token is not a decimal number; callers treat
/// that as "no match".
pub fn pad_token(token: &str) -> Option<String> {
    let value: u64 = token.trim().parse().ok()?;
    Some(format!("{:0width$}", value, width = SUFFIX_WIDTH))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SuffixKey {
    projet: String,
    nature: Nature,
    suffix: String,
}

/// Lookup structures over one record collection.
pub struct Catalog<'a> {
    records: &'a [Record],
    project_order: Vec<&'a str>,
    by_project: HashMap<&'a str, Vec<usize>>,
    by_nature: HashMap<Nature, Vec<usize>>,
    by_suffix: HashMap<SuffixKey, Vec<usize>>,
}

impl<'a> Catalog<'a> {
    /// Index the record sequence in one pass. No field is assumed present.
    pub fn build(records: &'a [Record]) -> Self {
        let mut project_order = Vec::new();
        let mut by_project: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut by_nature: HashMap<Nature, Vec<usize>> = HashMap::new();
        let mut by_suffix: HashMap<SuffixKey, Vec<usize>> = HashMap::new();

        for (idx, record) in records.iter().enumerate() {
            let projet = record.projet();
            if !projet.trim().is_empty() {
                by_project
                    .entry(projet)
                    .or_insert_with(|| {
                        project_order.push(projet);
                        Vec::new()
                    })
                    .push(idx);
            }

            by_nature
                .entry(record.nature.clone())
                .or_default()
                .push(idx);

            let num_orig = record.num_orig();
            if !num_orig.is_empty() {
                let key = SuffixKey {
                    projet: projet.to_string(),
                    nature: record.nature.clone(),
                    suffix: legacy_suffix(num_orig).to_string(),
                };
                by_suffix.entry(key).or_default().push(idx);
            }
        }

        log::debug!(
            "indexed {} records across {} projects",
            records.len(),
            project_order.len()
        );

        Self {
            records,
            project_order,
            by_project,
            by_nature,
            by_suffix,
        }
    }

    pub fn record(&self, idx: usize) -> &'a Record {
        &self.records[idx]
    }

    /// Distinct `projet` values in first-occurrence order.
    pub fn projects(&self) -> &[&'a str] {
        &self.project_order
    }

    /// Positions of the records of a project, in traversal order.
    pub fn project_records(&self, projet: &str) -> &[usize] {
        self.by_project
            .get(projet)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of records sharing a `projet` value.
    pub fn project_count(&self, projet: &str) -> usize {
        self.project_records(projet).len()
    }

    /// Positions of the records of a kind, in traversal order.
    pub fn of_nature(&self, nature: &Nature) -> &[usize] {
        self.by_nature
            .get(nature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records of `nature` in `projet` whose legacy suffix equals `suffix`.
    pub fn by_suffix(&self, projet: &str, nature: &Nature, suffix: &str) -> &[usize] {
        let key = SuffixKey {
            projet: projet.to_string(),
            nature: nature.clone(),
            suffix: suffix.to_string(),
        };
        self.by_suffix
            .get(&key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
