//! Page generation: from records and project metadata to HTML documents.
//!
//! [`generate_site`] is a pure function. It builds the [`Catalog`] once,
//! routes every record through [`route`](crate::router::route), renders the
//! record pages in parallel, then renders the project summaries and the
//! index, which aggregate across the whole catalog. The result is a
//! [`Site`]: documents keyed by site-relative path, ordered, so identical
//! inputs give byte-identical output.
//!
//! ```text
//! records ──▶ Catalog ──▶ route ──▶ record pages (rayon)
//!                │                       │
//!                └──▶ project pages ─────┼──▶ Site { path → html }
//!                └──▶ index ─────────────┘
//! ```

use std::collections::{btree_map, BTreeMap};
use std::sync::atomic::{AtomicU64, Ordering};

use rayon::prelude::*;
use serde::Deserialize;

use crate::cascade::{genre_or_placeholder, select_title, Title, TitleCascade};
use crate::catalog::Catalog;
use crate::error::{SiteError, SiteResult};
use crate::markup::{depth_prefix, escape, page_shell, NavLink, ShellParams};
use crate::models::{Editorial, Nature, ProjectStore, Record};
use crate::progress::{GenerationEvent, GenerationProgress, NoProgress};
use crate::router::{project_page_id, record_page_id, route, PageId, RecordPage};
use crate::sections::{render_people, render_sections};
use crate::xref::{fragment_parents, work_fragments};

/// What to do when two records map to the same output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Abort the run.
    #[default]
    Error,
    /// Keep the earliest record in input order.
    First,
    /// Keep the latest record in input order.
    Last,
}

/// Site-wide rendering options and editorial content.
#[derive(Debug, Clone)]
pub struct SiteOptions {
    pub title: String,
    /// Trusted markup inserted in every footer.
    pub footer_html: String,
    /// Site-root relative stylesheet paths.
    pub stylesheets: Vec<String>,
    /// Site-root relative script paths.
    pub scripts: Vec<String>,
    pub duplicate_policy: DuplicatePolicy,
    /// Presentation on the index, plus the about and legal mentions pages
    /// linked from every footer.
    pub editorial: Editorial,
}

impl Default for SiteOptions {
    fn default() -> Self {
        Self {
            title: "Catalogue".to_string(),
            footer_html: String::new(),
            stylesheets: vec!["statics/css/style.css".to_string()],
            scripts: vec!["statics/js/main.js".to_string()],
            duplicate_policy: DuplicatePolicy::Error,
            editorial: Editorial::default(),
        }
    }
}

/// Generated documents keyed by site-relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Site {
    pages: BTreeMap<String, String>,
}

impl Site {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.pages.get(path).map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Documents in path order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.pages.iter()
    }

    /// Number of documents under a top-level directory (`"works"`, …).
    pub fn count_in(&self, dir: &str) -> usize {
        let prefix = format!("{}/", dir);
        self.pages.keys().filter(|p| p.starts_with(&prefix)).count()
    }

    fn insert(&mut self, id: &PageId, html: String) {
        self.pages.insert(id.path(), html);
    }
}

impl FromIterator<(String, String)> for Site {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

/// Shared read-only state for every page builder.
struct PageContext<'a> {
    catalog: &'a Catalog<'a>,
    projects: &'a ProjectStore,
    options: &'a SiteOptions,
}

impl PageContext<'_> {
    /// Label for a project: metadata name, or the raw id as placeholder.
    fn project_label<'s>(&'s self, projet: &'s str) -> &'s str {
        let name = self.projects.display_name(projet);
        if name.trim().is_empty() {
            projet
        } else {
            name
        }
    }

    fn project_link(&self, projet: &str, prefix: &str) -> String {
        let label = escape(self.project_label(projet));
        match project_page_id(projet) {
            Some(id) => format!("<a href=\"{}{}\">{}</a>", prefix, escape(&id.href()), label),
            None => format!("<span class=\"unlinked\">{}</span>", label),
        }
    }

    /// Link to the page of record `idx`, or the bare title when it has none.
    fn record_link(&self, idx: usize, cascade: TitleCascade, prefix: &str) -> String {
        let record = self.catalog.record(idx);
        let title = select_title(record, cascade).html();
        match record_page_id(record) {
            Some(id) => format!(
                "<a href=\"{}{}\">{}</a>",
                prefix,
                escape(&id.href()),
                title
            ),
            None => format!("<span class=\"unlinked\">{}</span>", title),
        }
    }
}

/// Generate every page with progress reporting disabled.
pub fn generate_site(
    records: &[Record],
    projects: &ProjectStore,
    options: &SiteOptions,
) -> SiteResult<Site> {
    generate_site_with_progress(records, projects, options, &NoProgress)
}

/// Generate every page: record pages, project summaries, and the index.
pub fn generate_site_with_progress(
    records: &[Record],
    projects: &ProjectStore,
    options: &SiteOptions,
    progress: &dyn GenerationProgress,
) -> SiteResult<Site> {
    if records.is_empty() {
        return Err(SiteError::NoRecords);
    }

    progress.report(GenerationEvent::Indexing {
        records: records.len() as u64,
    });
    let catalog = Catalog::build(records);
    let ctx = PageContext {
        catalog: &catalog,
        projects,
        options,
    };

    let selected = select_record_pages(records, options.duplicate_policy)?;
    let total = selected.len() as u64;
    let done = AtomicU64::new(0);

    let rendered: Vec<(PageId, String)> = selected
        .par_iter()
        .map(|(id, kind, idx)| {
            let html = build_record_page(&ctx, *idx, *kind, id);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress.report(GenerationEvent::Rendering { n, total });
            (id.clone(), html)
        })
        .collect();

    let mut site = Site::default();
    for (id, html) in rendered {
        site.insert(&id, html);
    }

    for projet in catalog.projects() {
        let Some(id) = project_page_id(projet) else {
            log::debug!("project {:?} is not a file name, no page", projet);
            continue;
        };
        let html = build_project_page(&ctx, projet, &id);
        site.insert(&id, html);
    }

    site.insert(&PageId::Index, build_index_page(&ctx));

    let editorial = &options.editorial;
    if editorial.has_about() {
        let html = build_editorial_page(&ctx, &PageId::About, "À propos", &editorial.about_html);
        site.insert(&PageId::About, html);
    }
    if editorial.has_legal_mentions() {
        let html = build_editorial_page(
            &ctx,
            &PageId::LegalMentions,
            "Mentions légales",
            &editorial.legal_mentions_html,
        );
        site.insert(&PageId::LegalMentions, html);
    }

    log::info!(
        "generated {} pages ({} records, {} projects)",
        site.len(),
        records.len(),
        catalog.projects().len()
    );
    Ok(site)
}

/// Route every record and apply the duplicate policy. Records that produce
/// no page are skipped without error.
fn select_record_pages(
    records: &[Record],
    policy: DuplicatePolicy,
) -> SiteResult<Vec<(PageId, RecordPage, usize)>> {
    let mut chosen: BTreeMap<PageId, (RecordPage, usize)> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(kind) = route(record) else {
            if record.numero().is_empty() {
                log::debug!("record #{} ({}) has no numero, skipped", idx, record.nature);
            }
            continue;
        };
        let id = PageId::record(kind, record.numero());
        match chosen.entry(id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert((kind, idx));
            }
            btree_map::Entry::Occupied(mut slot) => match policy {
                DuplicatePolicy::Error => {
                    return Err(SiteError::DuplicatePage {
                        path: slot.key().path(),
                        first: slot.get().1,
                        second: idx,
                    });
                }
                DuplicatePolicy::First => {
                    log::warn!("duplicate {} from record #{} ignored", slot.key(), idx);
                }
                DuplicatePolicy::Last => {
                    log::warn!(
                        "duplicate {} from record #{} replaces record #{}",
                        slot.key(),
                        idx,
                        slot.get().1
                    );
                    slot.insert((kind, idx));
                }
            },
        }
    }

    Ok(chosen
        .into_iter()
        .map(|(id, (kind, idx))| (id, kind, idx))
        .collect())
}

fn title_cascade(kind: RecordPage) -> TitleCascade {
    match kind {
        RecordPage::Work => TitleCascade::WorkPage,
        RecordPage::Source => TitleCascade::SourcePage,
        RecordPage::Fragment => TitleCascade::FragmentPage,
    }
}

fn build_record_page(ctx: &PageContext<'_>, idx: usize, kind: RecordPage, id: &PageId) -> String {
    let record = ctx.catalog.record(idx);
    let depth = id.depth();
    let prefix = depth_prefix(depth);
    let title = select_title(record, title_cascade(kind));

    let mut body = format!(
        "<article class=\"notice notice-{}\">\n<h1 class=\"notice-title\">{}</h1>\n",
        kind.dir(),
        title.html()
    );
    body.push_str(&notice_metadata(record));
    body.push_str(&main_information(ctx, record, &prefix));
    body.push_str(&render_sections(record));

    match kind {
        RecordPage::Work => body.push_str(&fragments_block(ctx, record, &prefix)),
        RecordPage::Fragment => body.push_str(&parent_block(ctx, record, &prefix)),
        RecordPage::Source => {}
    }
    body.push_str("</article>");

    let mut nav = Vec::new();
    let projet = record.projet();
    if let Some(project_id) = project_page_id(projet) {
        nav.push(NavLink {
            href: project_id.href(),
            label: ctx.project_label(projet).to_string(),
        });
    }

    page_shell(
        ctx.options,
        &ShellParams {
            depth,
            title: title.plain(),
            nav: &nav,
        },
        &body,
    )
}

/// Kind label, page number, and the legacy identifier when present.
fn notice_metadata(record: &Record) -> String {
    let mut html = String::from("<div class=\"notice-meta\">\n<dl>\n");
    html.push_str(&format!(
        "<dt>Type de notice</dt><dd>{}</dd>\n",
        escape(record.nature.label())
    ));
    html.push_str(&format!(
        "<dt>Numéro</dt><dd>{}</dd>\n",
        escape(record.numero())
    ));
    if !record.num_orig().is_empty() {
        html.push_str(&format!(
            "<dt>Identifiant d'origine</dt><dd>{}</dd>\n",
            escape(record.num_orig())
        ));
    }
    html.push_str("</dl>\n</div>\n");
    html
}

fn main_information(ctx: &PageContext<'_>, record: &Record, prefix: &str) -> String {
    let mut html = String::from(
        "<div class=\"main-info\">\n<h2>Informations principales</h2>\n<dl class=\"fields\">\n",
    );
    if record.has("type_contenu") {
        html.push_str(&format!(
            "<dt>Type de contenu</dt><dd>{}</dd>\n",
            escape(record.field("type_contenu").trim())
        ));
    }
    let projet = record.projet();
    if !projet.trim().is_empty() {
        html.push_str(&format!(
            "<dt>Projet</dt><dd>{}</dd>\n",
            ctx.project_link(projet, prefix)
        ));
    }
    let people = render_people(&record.people);
    if !people.is_empty() {
        html.push_str(&format!(
            "<dt>Personnes et fonctions</dt><dd>\n{}</dd>\n",
            people
        ));
    }
    html.push_str(&format!(
        "<dt>Genre musical</dt><dd>{}</dd>\n",
        genre_or_placeholder(record, "genre_musical")
    ));
    html.push_str(&format!(
        "<dt>Genre textuel</dt><dd>{}</dd>\n",
        genre_or_placeholder(record, "genre_textuel")
    ));
    if record.has("cote_cmbv") {
        html.push_str(&format!(
            "<dt>Cote CMBV</dt><dd>{}</dd>\n",
            escape(record.field("cote_cmbv").trim())
        ));
    }
    html.push_str("</dl>\n</div>\n");
    html
}

fn related_block(class: &str, heading: &str, links: &[String]) -> String {
    if links.is_empty() {
        return String::new();
    }
    let items: String = links
        .iter()
        .map(|link| format!("<li>{}</li>\n", link))
        .collect();
    format!(
        "<section class=\"related {}\">\n<h2>{}</h2>\n<ul>\n{}</ul>\n</section>\n",
        class, heading, items
    )
}

fn fragments_block(ctx: &PageContext<'_>, work: &Record, prefix: &str) -> String {
    let links: Vec<String> = work_fragments(ctx.catalog, work)
        .into_iter()
        .map(|idx| ctx.record_link(idx, TitleCascade::FragmentPage, prefix))
        .collect();
    related_block("fragments", "Fragments", &links)
}

fn parent_block(ctx: &PageContext<'_>, fragment: &Record, prefix: &str) -> String {
    let links: Vec<String> = fragment_parents(ctx.catalog, fragment)
        .into_iter()
        .map(|idx| ctx.record_link(idx, TitleCascade::WorkPage, prefix))
        .collect();
    related_block("parent-work", "Fragment de", &links)
}

/// Projects sorted by display label, with record counts. `with_preview`
/// adds each project's preview markup; `current` marks the active entry.
fn project_list(
    ctx: &PageContext<'_>,
    prefix: &str,
    with_preview: bool,
    current: Option<&str>,
) -> String {
    let mut entries: Vec<(&str, &str, usize)> = ctx
        .catalog
        .projects()
        .iter()
        .map(|projet| {
            (
                *projet,
                ctx.project_label(projet),
                ctx.catalog.project_count(projet),
            )
        })
        .collect();
    entries.sort_by(|a, b| {
        a.1.to_lowercase()
            .cmp(&b.1.to_lowercase())
            .then_with(|| a.0.cmp(b.0))
    });

    let mut html = String::from("<ul class=\"project-list\">\n");
    for (projet, _, count) in entries {
        let class = if current == Some(projet) {
            " class=\"current\""
        } else {
            ""
        };
        html.push_str(&format!(
            "<li{}>{} <span class=\"count\">({})</span>",
            class,
            ctx.project_link(projet, prefix),
            count
        ));
        if with_preview {
            if let Some(project) = ctx.projects.get(projet) {
                let preview = project.preview();
                if !preview.trim().is_empty() {
                    html.push_str(&format!("\n<div class=\"preview\">{}</div>", preview));
                }
            }
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
    html
}

/// Records of a project matching `keep`, sorted by `code_srce` (stable).
fn catalog_entries(
    ctx: &PageContext<'_>,
    projet: &str,
    keep: impl Fn(&Record) -> bool,
) -> Vec<usize> {
    let mut entries: Vec<usize> = ctx
        .catalog
        .project_records(projet)
        .iter()
        .copied()
        .filter(|idx| keep(ctx.catalog.record(*idx)))
        .collect();
    entries.sort_by(|a, b| {
        let ka = ctx.catalog.record(*a).field("code_srce").trim();
        let kb = ctx.catalog.record(*b).field("code_srce").trim();
        ka.cmp(kb)
    });
    entries
}

fn catalog_section(
    ctx: &PageContext<'_>,
    class: &str,
    heading: &str,
    entries: &[usize],
    cascade: TitleCascade,
    prefix: &str,
) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let mut html = format!(
        "<section class=\"catalog {}\">\n<h2>{}</h2>\n<ul>\n",
        class, heading
    );
    for idx in entries {
        let record = ctx.catalog.record(*idx);
        let code = record.field("code_srce").trim();
        let code_html = if code.is_empty() {
            String::new()
        } else {
            format!("<span class=\"code\">{}</span> ", escape(code))
        };
        html.push_str(&format!(
            "<li>{}{}</li>\n",
            code_html,
            ctx.record_link(*idx, cascade, prefix)
        ));
    }
    html.push_str("</ul>\n</section>\n");
    html
}

fn build_project_page(ctx: &PageContext<'_>, projet: &str, id: &PageId) -> String {
    let depth = id.depth();
    let prefix = depth_prefix(depth);
    let label = ctx.project_label(projet);

    let sources = catalog_entries(ctx, projet, |r| r.nature == Nature::Source);
    let works = catalog_entries(ctx, projet, |r| {
        r.nature == Nature::Oeuvre && !r.has("frag")
    });

    let mut body = String::from("<div class=\"project-page\">\n");
    body.push_str("<aside class=\"project-nav\">\n<h2>Projets</h2>\n");
    body.push_str(&project_list(ctx, &prefix, false, Some(projet)));
    body.push_str("</aside>\n");

    body.push_str(&format!(
        "<article class=\"project\">\n<h1>{}</h1>\n",
        escape(label)
    ));
    if let Some(first) = ctx.catalog.project_records(projet).first() {
        let record = ctx.catalog.record(*first);
        body.push_str(&notice_metadata(record));
        body.push_str(&main_information(ctx, record, &prefix));
        body.push_str(&render_sections(record));
    }
    body.push_str(&catalog_section(
        ctx,
        "sources",
        "Recueils et sources",
        &sources,
        TitleCascade::SourcePage,
        &prefix,
    ));
    body.push_str(&catalog_section(
        ctx,
        "works",
        "Œuvres",
        &works,
        TitleCascade::WorkListing,
        &prefix,
    ));
    if let Some(project) = ctx.projects.get(projet) {
        if !project.description_html.trim().is_empty() {
            body.push_str(&format!(
                "<section class=\"project-description\">\n{}\n</section>\n",
                project.description_html
            ));
        }
    }
    body.push_str("</article>\n</div>");

    page_shell(
        ctx.options,
        &ShellParams {
            depth,
            title: label,
            nav: &[],
        },
        &body,
    )
}

fn build_index_page(ctx: &PageContext<'_>) -> String {
    let id = PageId::Index;
    let prefix = depth_prefix(id.depth());

    let mut body = String::new();
    match &ctx.options.editorial.presentation {
        Some(presentation) => {
            let title = if presentation.title.trim().is_empty() {
                &ctx.options.title
            } else {
                &presentation.title
            };
            body.push_str(&format!(
                "<section class=\"presentation\">\n<h1>{}</h1>\n",
                escape(title)
            ));
            if !presentation.subtitle.trim().is_empty() {
                body.push_str(&format!(
                    "<p class=\"subtitle\">{}</p>\n",
                    escape(&presentation.subtitle)
                ));
            }
            if !presentation.content_html.trim().is_empty() {
                body.push_str(&format!(
                    "<div class=\"presentation-content\">\n{}\n</div>\n",
                    presentation.content_html
                ));
            }
            body.push_str("</section>\n<section class=\"projects\">\n<h2>Projets</h2>\n");
        }
        None => body.push_str(&format!(
            "<section class=\"projects\">\n<h1>{}</h1>\n<h2>Projets</h2>\n",
            escape(&ctx.options.title)
        )),
    }
    body.push_str(&project_list(ctx, &prefix, true, None));
    body.push_str("</section>");

    page_shell(
        ctx.options,
        &ShellParams {
            depth: id.depth(),
            title: "",
            nav: &[],
        },
        &body,
    )
}

/// About or legal mentions page: a heading over trusted markup.
fn build_editorial_page(ctx: &PageContext<'_>, id: &PageId, heading: &str, html: &str) -> String {
    let body = format!(
        "<article class=\"editorial\">\n<h1>{}</h1>\n{}\n</article>",
        escape(heading),
        html.trim()
    );
    let nav = [NavLink {
        href: id.href(),
        label: heading.to_string(),
    }];
    page_shell(
        ctx.options,
        &ShellParams {
            depth: id.depth(),
            title: heading,
            nav: &nav,
        },
        &body,
    )
}

/// Title of a record as shown on its own page. Exposed for reporting.
pub fn record_title(record: &Record) -> Option<Title> {
    route(record).map(|kind| select_title(record, title_cascade(kind)))
}
