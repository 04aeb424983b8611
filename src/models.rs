//! Core data models used throughout the site compiler.
//!
//! These types represent the catalog records and the editorial project
//! metadata that flow from the loader into the page generator. Everything
//! here is read-only once loaded.

use std::collections::BTreeMap;
use std::fmt;

/// Kind of a catalog record (`nature` field).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nature {
    Oeuvre,
    Source,
    Fragment,
    Personne,
    Evenement,
    Other(String),
}

impl Nature {
    /// Parse a `nature` value. Matching ignores case and surrounding
    /// whitespace and accepts the accented spellings.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_lowercase().as_str() {
            "oeuvre" | "œuvre" => Nature::Oeuvre,
            "source" => Nature::Source,
            "fragment" => Nature::Fragment,
            "personne" => Nature::Personne,
            "evenement" | "événement" => Nature::Evenement,
            _ => Nature::Other(trimmed.to_string()),
        }
    }

    /// Human label used in the notice metadata block.
    pub fn label(&self) -> &str {
        match self {
            Nature::Oeuvre => "Œuvre",
            Nature::Source => "Source",
            Nature::Fragment => "Fragment",
            Nature::Personne => "Personne",
            Nature::Evenement => "Événement",
            Nature::Other(s) => s,
        }
    }
}

impl fmt::Display for Nature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `(person, function)` pair from `nomsFonctions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonFunction {
    pub name: String,
    pub function: String,
}

/// A catalog entry: a kind plus a flat mapping of named text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub nature: Nature,
    pub fields: BTreeMap<String, String>,
    pub people: Vec<PersonFunction>,
}

impl Record {
    pub fn new(nature: Nature) -> Self {
        Self {
            nature,
            fields: BTreeMap::new(),
            people: Vec::new(),
        }
    }

    /// Builder-style field setter. Used by the loader and by tests.
    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.push_field(name, value);
        self
    }

    /// Builder-style people setter.
    pub fn with_person(mut self, name: &str, function: &str) -> Self {
        self.people.push(PersonFunction {
            name: name.to_string(),
            function: function.to_string(),
        });
        self
    }

    /// Add a field value. A repeated field is joined to the previous value
    /// with a newline.
    pub fn push_field(&mut self, name: &str, value: &str) {
        match self.fields.get_mut(name) {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => {
                self.fields.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Raw field value, `""` when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    /// Whether a field is non-empty after trimming whitespace.
    pub fn has(&self, name: &str) -> bool {
        !self.field(name).trim().is_empty()
    }

    pub fn numero(&self) -> &str {
        self.field("numero").trim()
    }

    pub fn projet(&self) -> &str {
        self.field("projet")
    }

    pub fn num_orig(&self) -> &str {
        self.field("num_orig").trim()
    }
}

/// Number of characters kept when deriving a preview from a description.
pub const PREVIEW_MAX_CHARS: usize = 600;

/// Editorial metadata for one project.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub preview_html: String,
    pub description_html: String,
}

impl Project {
    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Preview markup, derived from the description when not supplied.
    pub fn preview(&self) -> String {
        if !self.preview_html.trim().is_empty() {
            return self.preview_html.clone();
        }
        text_preview(&self.description_html, PREVIEW_MAX_CHARS)
    }
}

/// Strip tags, collapse whitespace and truncate to `max_chars` characters
/// (ending in `...` when cut).
pub fn text_preview(html: &str, max_chars: usize) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let kept: String = collapsed.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

/// Read-only lookup of project metadata keyed by project identifier.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    projects: BTreeMap<String, Project>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a project. The first definition of an id is canonical; later
    /// ones are ignored and reported through the return value.
    pub fn insert(&mut self, project: Project) -> bool {
        if self.projects.contains_key(&project.id) {
            log::warn!("duplicate project metadata for '{}' ignored", project.id);
            return false;
        }
        self.projects.insert(project.id.clone(), project);
        true
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.get(id)
    }

    /// Display name for a project id; empty when no metadata exists.
    pub fn display_name(&self, id: &str) -> &str {
        self.get(id).map(Project::display_name).unwrap_or("")
    }

    /// Project ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Home page introduction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Presentation {
    pub title: String,
    pub subtitle: String,
    /// Trusted markup.
    pub content_html: String,
}

/// Site-level editorial documents published next to the catalog: the home
/// page presentation, the "about" page and the legal notice. All markup is
/// trusted; empty documents are not published.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Editorial {
    pub presentation: Option<Presentation>,
    pub about_html: String,
    pub legal_mentions_html: String,
}

impl Editorial {
    pub fn has_about(&self) -> bool {
        !self.about_html.trim().is_empty()
    }

    pub fn has_legal_mentions(&self) -> bool {
        !self.legal_mentions_html.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.presentation.is_none() && !self.has_about() && !self.has_legal_mentions()
    }
}

impl FromIterator<Project> for ProjectStore {
    fn from_iter<I: IntoIterator<Item = Project>>(iter: I) -> Self {
        let mut store = ProjectStore::new();
        for project in iter {
            store.insert(project);
        }
        store
    }
}
