//! Generation report written by `pweb build --report <path>`.
//!
//! Records what a run produced: a run id, timestamps, the input files, page
//! counts per kind, and a SHA-256 digest of the whole output tree. The
//! digest depends only on page paths and contents, so two runs over the same
//! inputs report the same digest.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::generate::Site;
use crate::router::RecordPage;

#[derive(Debug, Serialize)]
pub struct PageCounts {
    pub total: usize,
    pub works: usize,
    pub sources: usize,
    pub fragments: usize,
    pub projects: usize,
}

impl PageCounts {
    pub fn of(site: &Site) -> Self {
        Self {
            total: site.len(),
            works: site.count_in(RecordPage::Work.dir()),
            sources: site.count_in(RecordPage::Source.dir()),
            fragments: site.count_in(RecordPage::Fragment.dir()),
            projects: site.count_in("projects"),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub generated_at: String,
    pub duration_ms: u64,
    pub records_file: PathBuf,
    pub projects_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub records: usize,
    pub pages: PageCounts,
    pub assets: usize,
    pub digest: String,
}

impl GenerationReport {
    pub fn new(
        site: &Site,
        records: usize,
        assets: usize,
        records_file: &Path,
        projects_file: Option<&Path>,
        output_dir: &Path,
        duration: Duration,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            duration_ms: duration.as_millis() as u64,
            records_file: records_file.to_path_buf(),
            projects_file: projects_file.map(Path::to_path_buf),
            output_dir: output_dir.to_path_buf(),
            records,
            pages: PageCounts::of(site),
            assets,
            digest: site_digest(site),
        }
    }
}

/// SHA-256 over `(path, content)` pairs in path order.
pub fn site_digest(site: &Site) -> String {
    let mut hasher = Sha256::new();
    for (path, html) in site.iter() {
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update((html.len() as u64).to_le_bytes());
        hasher.update(html.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Write the report as pretty JSON, creating parent directories.
pub fn write_report(report: &GenerationReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    log::info!("wrote generation report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate_site, SiteOptions};
    use crate::models::{Nature, ProjectStore, Record};

    fn site(title: &str) -> Site {
        let records = vec![
            Record::new(Nature::Oeuvre)
                .with("numero", "1")
                .with("oeuvre", title),
            Record::new(Nature::Fragment).with("numero", "2"),
        ];
        generate_site(&records, &ProjectStore::new(), &SiteOptions::default()).unwrap()
    }

    #[test]
    fn test_digest_is_stable_and_content_sensitive() {
        assert_eq!(site_digest(&site("Atys")), site_digest(&site("Atys")));
        assert_ne!(site_digest(&site("Atys")), site_digest(&site("Armide")));
        assert_eq!(site_digest(&site("Atys")).len(), 64);
    }

    #[test]
    fn test_report_json() {
        let tmp = tempfile::TempDir::new().unwrap();
        let site = site("Atys");
        let report = GenerationReport::new(
            &site,
            2,
            0,
            Path::new("data/records.xml"),
            None,
            Path::new("site"),
            Duration::from_millis(12),
        );
        let path = tmp.path().join("reports/run.json");
        write_report(&report, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["pages"]["total"], 3);
        assert_eq!(value["pages"]["works"], 1);
        assert_eq!(value["pages"]["fragments"], 1);
        assert_eq!(value["pages"]["projects"], 0);
        assert_eq!(value["duration_ms"], 12);
        assert_eq!(value["records"], 2);
        assert!(value["projects_file"].is_null());
        assert_eq!(value["run_id"].as_str().unwrap().len(), 36);
    }
}
