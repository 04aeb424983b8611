//! Page identities and the routing rule from records to pages.
//!
//! Every output document is identified by a [`PageId`], a closed set of
//! variants. [`route`] decides which record-backed page, if any, a record
//! produces:
//!
//! | `nature` | condition | page |
//! |---|---|---|
//! | `Oeuvre` | `numero` set, `frag` blank | `works/<numero>.html` |
//! | `Source` | `numero` set | `sources/<numero>.html` |
//! | `Fragment` | `numero` set | `fragments/<numero>.html` |
//! | anything else | | none |
//!
//! Project summaries (`projects/<slug>.html`), the index and the editorial
//! pages (`a-propos.html`, `mentions-legales.html`) are not tied to a single
//! record.
//!
//! `numero` and `projet` come straight from the input, so both must be a
//! single plain path segment before they name a file. A value such as
//! `../x` or `12/3` gets no page. Links use [`PageId::href`], which
//! percent-encodes each segment.

use std::fmt;

use crate::models::{Nature, Record};

/// Kind of a record-backed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordPage {
    Work,
    Source,
    Fragment,
}

impl RecordPage {
    pub fn dir(self) -> &'static str {
        match self {
            RecordPage::Work => "works",
            RecordPage::Source => "sources",
            RecordPage::Fragment => "fragments",
        }
    }
}

/// Identity of one output document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageId {
    Index,
    About,
    LegalMentions,
    Project(String),
    Work(String),
    Source(String),
    Fragment(String),
}

impl PageId {
    pub fn record(kind: RecordPage, numero: &str) -> Self {
        match kind {
            RecordPage::Work => PageId::Work(numero.to_string()),
            RecordPage::Source => PageId::Source(numero.to_string()),
            RecordPage::Fragment => PageId::Fragment(numero.to_string()),
        }
    }

    /// Site-root relative path of the document.
    pub fn path(&self) -> String {
        match self {
            PageId::Index => "index.html".to_string(),
            PageId::About => "a-propos.html".to_string(),
            PageId::LegalMentions => "mentions-legales.html".to_string(),
            PageId::Project(id) => format!("projects/{}.html", project_slug(id)),
            PageId::Work(n) => format!("{}/{}.html", RecordPage::Work.dir(), n),
            PageId::Source(n) => format!("{}/{}.html", RecordPage::Source.dir(), n),
            PageId::Fragment(n) => format!("{}/{}.html", RecordPage::Fragment.dir(), n),
        }
    }

    /// Relative URL of the document, each segment percent-encoded.
    pub fn href(&self) -> String {
        self.path()
            .split('/')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Directory depth below the site root.
    pub fn depth(&self) -> usize {
        match self {
            PageId::Index | PageId::About | PageId::LegalMentions => 0,
            _ => 1,
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// File slug of a project: the raw identifier with spaces replaced by
/// underscores.
pub fn project_slug(projet: &str) -> String {
    projet.replace(' ', "_")
}

/// Page of a project, or `None` when its id cannot name a file.
pub fn project_page_id(projet: &str) -> Option<PageId> {
    if projet.trim().is_empty() || !is_safe_segment(&project_slug(projet)) {
        return None;
    }
    Some(PageId::Project(projet.to_string()))
}

/// True when `segment` can be used as one file name under a page directory.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Which record page a record produces, if any.
///
/// Blank `numero` never produces a page, nor does one that is not a plain
/// file name. An `Oeuvre` that carries a `frag`
/// value is treated as a fragment stub and produces no work page.
pub fn route(record: &Record) -> Option<RecordPage> {
    let numero = record.numero();
    if numero.is_empty() {
        return None;
    }
    if !is_safe_segment(numero) {
        log::debug!("numero {:?} is not a file name, no page", numero);
        return None;
    }
    match record.nature {
        Nature::Oeuvre if !record.has("frag") => Some(RecordPage::Work),
        Nature::Oeuvre => None,
        Nature::Source => Some(RecordPage::Source),
        Nature::Fragment => Some(RecordPage::Fragment),
        Nature::Personne | Nature::Evenement | Nature::Other(_) => None,
    }
}

/// The page id a record produces, if any.
pub fn record_page_id(record: &Record) -> Option<PageId> {
    route(record).map(|kind| PageId::record(kind, record.numero()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_by_nature() {
        let work = Record::new(Nature::Oeuvre).with("numero", "1");
        let source = Record::new(Nature::Source).with("numero", "2");
        let fragment = Record::new(Nature::Fragment).with("numero", "3");
        let person = Record::new(Nature::Personne).with("numero", "4");
        let event = Record::new(Nature::Evenement).with("numero", "5");
        assert_eq!(route(&work), Some(RecordPage::Work));
        assert_eq!(route(&source), Some(RecordPage::Source));
        assert_eq!(route(&fragment), Some(RecordPage::Fragment));
        assert_eq!(route(&person), None);
        assert_eq!(route(&event), None);
    }

    #[test]
    fn test_blank_numero_no_page() {
        let blank = Record::new(Nature::Source).with("numero", "  ");
        let missing = Record::new(Nature::Source);
        assert_eq!(route(&blank), None);
        assert_eq!(route(&missing), None);
    }

    #[test]
    fn test_work_with_frag_excluded() {
        let stub = Record::new(Nature::Oeuvre)
            .with("numero", "9")
            .with("frag", "Air");
        assert_eq!(route(&stub), None);
    }

    #[test]
    fn test_paths() {
        assert_eq!(PageId::Index.path(), "index.html");
        assert_eq!(
            PageId::Project("Grands Motets".into()).path(),
            "projects/Grands_Motets.html"
        );
        assert_eq!(PageId::Work("12".into()).path(), "works/12.html");
        assert_eq!(PageId::Source("7".into()).path(), "sources/7.html");
        assert_eq!(PageId::Fragment("3".into()).path(), "fragments/3.html");
        assert_eq!(PageId::About.path(), "a-propos.html");
        assert_eq!(PageId::LegalMentions.path(), "mentions-legales.html");
        assert_eq!(PageId::Index.depth(), 0);
        assert_eq!(PageId::LegalMentions.depth(), 0);
        assert_eq!(PageId::Work("12".into()).depth(), 1);
    }

    #[test]
    fn test_hostile_numero_gets_no_page() {
        for numero in ["../../../leak", "12/3", "..", ".", "a\\b", "x\u{0}y"] {
            let source = Record::new(Nature::Source).with("numero", numero);
            assert_eq!(route(&source), None, "numero {:?}", numero);
        }
        let odd = Record::new(Nature::Source).with("numero", "12#b?c");
        assert_eq!(route(&odd), Some(RecordPage::Source));
    }

    #[test]
    fn test_project_page_id_rejects_path_escapes() {
        assert_eq!(
            project_page_id("Grands Motets"),
            Some(PageId::Project("Grands Motets".into()))
        );
        assert_eq!(project_page_id("../../escaped"), None);
        assert_eq!(project_page_id(".."), None);
        assert_eq!(project_page_id("  "), None);
    }

    #[test]
    fn test_href_percent_encodes_segments() {
        assert_eq!(PageId::Source("12#b?c".into()).href(), "sources/12%23b%3Fc.html");
        assert_eq!(PageId::Work("100%".into()).href(), "works/100%25.html");
        assert_eq!(
            PageId::Project("Œuvres Lully".into()).href(),
            "projects/%C5%92uvres_Lully.html"
        );
        assert_eq!(PageId::Work("12".into()).href(), "works/12.html");
    }

    #[test]
    fn test_record_page_id_uses_trimmed_numero() {
        let work = Record::new(Nature::Oeuvre).with("numero", " 42 ");
        assert_eq!(record_page_id(&work), Some(PageId::Work("42".into())));
    }
}
