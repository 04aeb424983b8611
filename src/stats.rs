//! Catalog statistics.
//!
//! Gives a quick summary of what a build would produce: records per nature,
//! per-project counts, pages per kind, and the records or links that will
//! be silently skipped. Used by `pweb stats` to check an export before
//! publishing it.

use std::collections::BTreeMap;

use anyhow::Result;

use crate::cascade::Title;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::generate::record_title;
use crate::loader;
use crate::models::{Nature, ProjectStore, Record};
use crate::router::{route, RecordPage};
use crate::xref::{fragment_parents, parent_token, unresolved_fragment_tokens};

/// Per-project breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectStats {
    pub id: String,
    pub name: String,
    pub records: usize,
    pub has_metadata: bool,
}

/// Everything `pweb stats` reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub records: usize,
    pub by_nature: BTreeMap<String, usize>,
    pub projects: Vec<ProjectStats>,
    /// Metadata entries no record refers to.
    pub unused_projects: Vec<String>,
    pub works: usize,
    pub sources: usize,
    pub fragments: usize,
    pub blank_numero: usize,
    pub work_stubs: usize,
    pub untitled: usize,
    pub unresolved_fragments: usize,
    pub unresolved_parents: usize,
}

impl CatalogStats {
    pub fn pages(&self) -> usize {
        self.works + self.sources + self.fragments
    }
}

/// Compute statistics without rendering anything.
pub fn collect_stats(records: &[Record], projects: &ProjectStore) -> CatalogStats {
    let catalog = Catalog::build(records);
    let mut stats = CatalogStats {
        records: records.len(),
        ..Default::default()
    };

    for record in records {
        *stats.by_nature.entry(record.nature.to_string()).or_insert(0) += 1;

        let page_kind = matches!(
            record.nature,
            Nature::Oeuvre | Nature::Source | Nature::Fragment
        );
        if page_kind && record.numero().is_empty() {
            stats.blank_numero += 1;
        }

        match route(record) {
            Some(RecordPage::Work) => stats.works += 1,
            Some(RecordPage::Source) => stats.sources += 1,
            Some(RecordPage::Fragment) => stats.fragments += 1,
            None => {}
        }
        if record_title(record) == Some(Title::Placeholder) {
            stats.untitled += 1;
        }

        if record.nature == Nature::Oeuvre {
            stats.unresolved_fragments += unresolved_fragment_tokens(&catalog, record);
        }
        if record.nature == Nature::Fragment
            && parent_token(record.field("fragment_de")).is_some()
            && fragment_parents(&catalog, record).is_empty()
        {
            stats.unresolved_parents += 1;
        }
    }

    stats.work_stubs = catalog
        .of_nature(&Nature::Oeuvre)
        .iter()
        .filter(|idx| catalog.record(**idx).has("frag"))
        .count();

    stats.projects = catalog
        .projects()
        .iter()
        .map(|projet| ProjectStats {
            id: projet.to_string(),
            name: projects.display_name(projet).to_string(),
            records: catalog.project_count(projet),
            has_metadata: projects.get(projet).is_some(),
        })
        .collect();
    stats
        .projects
        .sort_by(|a, b| b.records.cmp(&a.records).then_with(|| a.id.cmp(&b.id)));

    stats.unused_projects = projects
        .ids()
        .filter(|id| catalog.project_count(id) == 0)
        .map(str::to_string)
        .collect();

    stats
}

/// Run the stats command: load the inputs and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let inputs = loader::load_inputs(
        &config.input.records,
        config.input.projects.as_deref(),
        config.input.editorial.as_deref(),
    )
    .await?;
    let stats = collect_stats(&inputs.records, &inputs.projects);

    let input_size = std::fs::metadata(&config.input.records)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Philidor Web — Catalog Stats");
    println!("============================");
    println!();
    println!("  Input:       {}", config.input.records.display());
    println!("  Size:        {}", format_bytes(input_size));
    println!();
    println!("  Records:     {}", stats.records);
    for (nature, count) in &stats.by_nature {
        println!("    {:<12} {:>6}", nature, count);
    }
    println!();
    println!("  Pages:       {}", stats.pages());
    println!("    {:<12} {:>6}", "works", stats.works);
    println!("    {:<12} {:>6}", "sources", stats.sources);
    println!("    {:<12} {:>6}", "fragments", stats.fragments);
    println!();
    println!("  Skipped:");
    println!("    {:<24} {:>6}", "blank numero", stats.blank_numero);
    println!("    {:<24} {:>6}", "works with frag", stats.work_stubs);
    println!("    {:<24} {:>6}", "untitled pages", stats.untitled);
    println!(
        "    {:<24} {:>6}",
        "unresolved fragments", stats.unresolved_fragments
    );
    println!("    {:<24} {:>6}", "unresolved parents", stats.unresolved_parents);

    if !stats.projects.is_empty() {
        println!();
        println!("  By project:");
        println!("  {:<24} {:>8}   {}", "PROJECT", "RECORDS", "NAME");
        println!("  {}", "-".repeat(60));
        for p in &stats.projects {
            let name = if p.has_metadata {
                p.name.as_str()
            } else {
                "(no metadata)"
            };
            println!("  {:<24} {:>8}   {}", p.id, p.records, name);
        }
    }

    if !stats.unused_projects.is_empty() {
        println!();
        println!("  Unused metadata (no records):");
        for id in &stats.unused_projects {
            println!("    {:<24} {}", id, inputs.projects.display_name(id));
        }
    }

    let editorial = &inputs.editorial;
    println!();
    println!("  Editorial:");
    println!("    {:<24} {:>6}", "presentation", yes_no(editorial.presentation.is_some()));
    println!("    {:<24} {:>6}", "about", yes_no(editorial.has_about()));
    println!("    {:<24} {:>6}", "legal mentions", yes_no(editorial.has_legal_mentions()));

    println!();
    Ok(())
}

fn yes_no(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        "no"
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
