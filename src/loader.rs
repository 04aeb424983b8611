//! XML input: catalog records and project metadata.
//!
//! Both documents are read with a single `quick_xml` event loop over a stack
//! of open elements. An element is a **record** when it has a direct
//! `<nature>` child; its leaf children become fields and its
//! `<nomsFonctions>` child becomes the people list. Records may sit at any
//! depth, so merged exports (`<merged_data><philidor4_data>…`) load as-is.
//!
//! The same file, or separate ones, may also carry project metadata and the
//! editorial documents (presentation, about, legal mentions).
//!
//! Field text goes through a second entity-decoding pass because the
//! catalog exports double-escape accented characters (`&amp;#xE9;`).

use std::borrow::Cow;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{SiteError, SiteResult};
use crate::models::{Editorial, Nature, PersonFunction, Presentation, Project, ProjectStore, Record};

const NATURE: &str = "nature";
const PEOPLE: &str = "nomsFonctions";

/// A leaf child element: name, optional `key` attribute, text.
#[derive(Debug)]
struct Leaf {
    name: String,
    key: Option<String>,
    text: String,
}

/// An element still open on the reader stack.
#[derive(Debug)]
struct Frame {
    name: String,
    key: Option<String>,
    text: String,
    has_children: bool,
    leaves: Vec<Leaf>,
    people: Vec<PersonFunction>,
}

impl Frame {
    fn open(start: &BytesStart<'_>, context: &str) -> SiteResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let key = attribute(start, "key", context)?;
        Ok(Self {
            name,
            key,
            text: String::new(),
            has_children: false,
            leaves: Vec::new(),
            people: Vec::new(),
        })
    }

    fn into_record(self) -> Option<Record> {
        let nature = self.leaves.iter().find(|leaf| leaf.name == NATURE)?;
        let mut record = Record::new(Nature::parse(&nature.text));
        for leaf in self.leaves.iter().filter(|leaf| leaf.name != NATURE) {
            record.push_field(&leaf.name, &leaf.text);
        }
        record.people = self.people;
        Some(record)
    }
}

fn xml_error(context: &str, err: impl std::fmt::Display) -> SiteError {
    SiteError::Xml {
        context: context.to_string(),
        message: err.to_string(),
    }
}

fn attribute(start: &BytesStart<'_>, name: &str, context: &str) -> SiteResult<Option<String>> {
    match start.try_get_attribute(name) {
        Ok(Some(attr)) => {
            let value = attr.unescape_value().map_err(|e| xml_error(context, e))?;
            Ok(Some(value.into_owned()))
        }
        Ok(None) => Ok(None),
        Err(e) => Err(xml_error(context, e)),
    }
}

/// Longest entity body (`eacute`, `#x1D11E`, ...) worth trying to decode.
const MAX_ENTITY_LEN: usize = 32;

/// Decode entities left over after XML unescaping, one at a time. Numeric
/// references and HTML named entities are resolved; a bare or unknown `&`
/// stays as written and does not stop the rest of the text from decoding.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let entity = tail[1..]
            .find(|c: char| c == ';' || c == '&' || c.is_whitespace())
            .filter(|&end| end > 0 && end <= MAX_ENTITY_LEN && tail[1 + end..].starts_with(';'))
            .map(|end| &tail[..end + 2]);
        match entity.and_then(|raw| quick_xml::escape::unescape(raw).ok()) {
            Some(decoded) => {
                out.push_str(&decoded);
                rest = &tail[entity.map_or(1, str::len)..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Close the top frame and fold it into its parent.
fn close_frame(stack: &mut Vec<Frame>, records: &mut Vec<Record>) {
    let Some(frame) = stack.pop() else {
        return;
    };

    if frame.name == PEOPLE {
        let people: Vec<PersonFunction> = frame
            .leaves
            .into_iter()
            .map(|leaf| PersonFunction {
                name: leaf.key.unwrap_or(leaf.name).trim().to_string(),
                function: leaf.text.trim().to_string(),
            })
            .filter(|p| !(p.name.is_empty() && p.function.is_empty()))
            .collect();
        if let Some(parent) = stack.last_mut() {
            parent.people.extend(people);
        }
        return;
    }

    if !frame.has_children {
        if let Some(parent) = stack.last_mut() {
            let text = decode_entities(&frame.text).into_owned();
            parent.leaves.push(Leaf {
                name: frame.name,
                key: frame.key,
                text,
            });
        }
        return;
    }

    if let Some(record) = frame.into_record() {
        records.push(record);
    }
}

/// Parse every record in a catalog document, in document order.
pub fn parse_records(xml: &str, context: &str) -> SiteResult<Vec<Record>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Frame> = Vec::new();
    let mut records = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame::open(&e, context)?);
            }
            Ok(Event::Empty(e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.has_children = true;
                }
                stack.push(Frame::open(&e, context)?);
                close_frame(&mut stack, &mut records);
            }
            Ok(Event::End(_)) => close_frame(&mut stack, &mut records),
            Ok(Event::Text(te)) => {
                if let Some(frame) = stack.last_mut() {
                    let text = te.unescape().map_err(|e| xml_error(context, e))?;
                    frame.text.push_str(&text);
                }
            }
            Ok(Event::CData(cd)) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&cd.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(context, e)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_error(context, "unexpected end of document"));
    }
    if records.is_empty() {
        return Err(SiteError::NoRecords);
    }
    log::debug!("{}: {} records", context, records.len());
    Ok(records)
}

/// Parse project metadata: every `<project id name>` element with optional
/// `<description_html>` and `<preview>` children.
pub fn parse_projects(xml: &str, context: &str) -> SiteResult<ProjectStore> {
    let mut reader = Reader::from_str(xml);
    let mut store = ProjectStore::new();
    let mut current: Option<Project> = None;
    let mut child: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"project" {
                    current = Some(Project {
                        id: attribute(&e, "id", context)?.unwrap_or_default(),
                        name: attribute(&e, "name", context)?.unwrap_or_default(),
                        ..Default::default()
                    });
                } else if current.is_some()
                    && matches!(name.as_ref(), b"description_html" | b"preview")
                {
                    child = Some(String::from_utf8_lossy(name.as_ref()).into_owned());
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"project" {
                    let project = Project {
                        id: attribute(&e, "id", context)?.unwrap_or_default(),
                        name: attribute(&e, "name", context)?.unwrap_or_default(),
                        ..Default::default()
                    };
                    insert_project(&mut store, project);
                }
            }
            Ok(Event::Text(te)) if child.is_some() => {
                text.push_str(&te.unescape().map_err(|e| xml_error(context, e))?);
            }
            Ok(Event::CData(cd)) if child.is_some() => {
                text.push_str(&String::from_utf8_lossy(&cd.into_inner()));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"project" {
                    if let Some(project) = current.take() {
                        insert_project(&mut store, project);
                    }
                } else if child.as_deref().map(str::as_bytes) == Some(name.as_ref()) {
                    if let Some(project) = current.as_mut() {
                        let value = text.trim().to_string();
                        match child.as_deref() {
                            Some("preview") => project.preview_html = value,
                            _ => project.description_html = value,
                        }
                    }
                    child = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(context, e)),
            _ => {}
        }
    }

    log::debug!("{}: {} projects", context, store.len());
    Ok(store)
}

/// Editorial document being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditorialDoc {
    Presentation,
    About,
    LegalMentions,
}

impl EditorialDoc {
    fn from_element(name: &[u8]) -> Option<Self> {
        match name {
            b"presentation" => Some(EditorialDoc::Presentation),
            b"about" => Some(EditorialDoc::About),
            b"legal_mentions" => Some(EditorialDoc::LegalMentions),
            _ => None,
        }
    }
}

/// Parse the editorial documents: `<presentation>` with `<title>`,
/// `<subtitle>` and `<content>` children, and `<about>` / `<legal_mentions>`
/// with a `<content>` child. They may share one file or sit inside a merged
/// export; the first definition of each wins.
pub fn parse_editorial(xml: &str, context: &str) -> SiteResult<Editorial> {
    let mut reader = Reader::from_str(xml);
    let mut editorial = Editorial::default();
    let mut current: Option<(EditorialDoc, Presentation)> = None;
    let mut seen: Vec<EditorialDoc> = Vec::new();
    let mut child: Option<String> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if current.is_none() {
                    current = EditorialDoc::from_element(name.as_ref())
                        .map(|doc| (doc, Presentation::default()));
                } else if matches!(name.as_ref(), b"title" | b"subtitle" | b"content") {
                    child = Some(String::from_utf8_lossy(name.as_ref()).into_owned());
                    text.clear();
                }
            }
            Ok(Event::Text(te)) if child.is_some() => {
                text.push_str(&te.unescape().map_err(|e| xml_error(context, e))?);
            }
            Ok(Event::CData(cd)) if child.is_some() => {
                text.push_str(&String::from_utf8_lossy(&cd.into_inner()));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                let closing = EditorialDoc::from_element(name.as_ref());
                let closes_doc = current
                    .as_ref()
                    .is_some_and(|(doc, _)| closing == Some(*doc));
                if closes_doc {
                    if let Some((doc, parts)) = current.take() {
                        if seen.contains(&doc) {
                            log::warn!("{}: duplicate {:?} document ignored", context, doc);
                            continue;
                        }
                        seen.push(doc);
                        match doc {
                            EditorialDoc::Presentation => editorial.presentation = Some(parts),
                            EditorialDoc::About => editorial.about_html = parts.content_html,
                            EditorialDoc::LegalMentions => {
                                editorial.legal_mentions_html = parts.content_html
                            }
                        }
                    }
                } else if child.as_deref().map(str::as_bytes) == Some(name.as_ref()) {
                    if let Some((_, parts)) = current.as_mut() {
                        let value = text.trim().to_string();
                        match child.as_deref() {
                            Some("title") => parts.title = value,
                            Some("subtitle") => parts.subtitle = value,
                            _ => parts.content_html = value,
                        }
                    }
                    child = None;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(context, e)),
            _ => {}
        }
    }

    Ok(editorial)
}

fn insert_project(store: &mut ProjectStore, project: Project) {
    if project.id.trim().is_empty() {
        log::warn!("project '{}' has no id, ignored", project.name);
        return;
    }
    store.insert(project);
}

async fn read_document(path: &Path) -> SiteResult<String> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SiteError::io(path, e))
}

/// Read and parse a catalog file.
pub async fn load_records(path: &Path) -> SiteResult<Vec<Record>> {
    let xml = read_document(path).await?;
    parse_records(&xml, &path.display().to_string())
}

/// Read and parse a project metadata file.
pub async fn load_projects(path: &Path) -> SiteResult<ProjectStore> {
    let xml = read_document(path).await?;
    parse_projects(&xml, &path.display().to_string())
}

/// Read and parse an editorial documents file.
pub async fn load_editorial(path: &Path) -> SiteResult<Editorial> {
    let xml = read_document(path).await?;
    parse_editorial(&xml, &path.display().to_string())
}

/// Everything a run reads.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub records: Vec<Record>,
    pub projects: ProjectStore,
    pub editorial: Editorial,
}

/// Load records, project metadata and editorial documents. Metadata or
/// editorial documents without a file of their own are read from the
/// records document.
pub async fn load_inputs(
    records_path: &Path,
    projects_path: Option<&Path>,
    editorial_path: Option<&Path>,
) -> SiteResult<Inputs> {
    let xml = read_document(records_path).await?;
    let context = records_path.display().to_string();
    let records = parse_records(&xml, &context)?;
    let projects = match projects_path {
        Some(path) => load_projects(path).await?,
        None => parse_projects(&xml, &context)?,
    };
    let editorial = match editorial_path {
        Some(path) => load_editorial(path).await?,
        None => parse_editorial(&xml, &context)?,
    };
    log::info!(
        "loaded {} records and {} projects",
        records.len(),
        projects.len()
    );
    Ok(Inputs {
        records,
        projects,
        editorial,
    })
}
