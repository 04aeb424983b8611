//! Writing a generated [`Site`] to disk.
//!
//! The engine never touches the filesystem; this module does. Every page is
//! written to `<dir>/<path>`, parent directories are created as needed, and
//! the optional asset directory is mirrored to `<dir>/statics`. Page paths
//! are checked before anything is written: each must stay inside `<dir>`.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{SiteError, SiteResult};
use crate::generate::Site;
use crate::progress::{GenerationEvent, GenerationProgress};

/// Name of the asset directory inside the output tree.
pub const STATICS_DIR: &str = "statics";

/// Output location and behaviour.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub dir: PathBuf,
    /// Remove `dir` before writing.
    pub clean: bool,
    /// Directory copied verbatim to `<dir>/statics`.
    pub assets: Option<PathBuf>,
}

/// Counts from a completed write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub pages: usize,
    pub assets: usize,
}

/// Write every page, then copy static assets.
pub async fn write_site(
    site: &Site,
    options: &WriteOptions,
    progress: &dyn GenerationProgress,
) -> SiteResult<WriteSummary> {
    let targets = site
        .iter()
        .map(|(path, _)| page_target(&options.dir, path))
        .collect::<SiteResult<Vec<PathBuf>>>()?;

    if options.clean && tokio::fs::try_exists(&options.dir).await.unwrap_or(false) {
        log::info!("removing {}", options.dir.display());
        tokio::fs::remove_dir_all(&options.dir)
            .await
            .map_err(|e| SiteError::io(&options.dir, e))?;
    }
    tokio::fs::create_dir_all(&options.dir)
        .await
        .map_err(|e| SiteError::io(&options.dir, e))?;

    let total = site.len() as u64;
    for (n, ((_, html), target)) in site.iter().zip(&targets).enumerate() {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SiteError::io(parent, e))?;
        }
        tokio::fs::write(target, html)
            .await
            .map_err(|e| SiteError::io(target, e))?;
        progress.report(GenerationEvent::Writing {
            n: n as u64 + 1,
            total,
        });
    }

    let assets = match &options.assets {
        Some(src) => copy_assets(src, &options.dir.join(STATICS_DIR)).await?,
        None => 0,
    };

    Ok(WriteSummary {
        pages: site.len(),
        assets,
    })
}

/// `dir/path`, provided `path` is made only of plain relative components.
fn page_target(dir: &Path, path: &str) -> SiteResult<PathBuf> {
    let rel = Path::new(path);
    let plain = !path.is_empty()
        && !path.contains('\\')
        && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(SiteError::UnsafePath {
            path: path.to_string(),
        });
    }
    Ok(dir.join(rel))
}

/// Mirror `src` into `dest`. Returns the number of files copied.
pub async fn copy_assets(src: &Path, dest: &Path) -> SiteResult<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            SiteError::io(path, std::io::Error::other(e.to_string()))
        })?;
        let rel = match entry.path().strip_prefix(src) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| SiteError::io(&target, e))?;
        } else if entry.file_type().is_file() {
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(|e| SiteError::io(entry.path(), e))?;
            copied += 1;
        }
    }
    log::info!("copied {} asset files to {}", copied, dest.display());
    Ok(copied)
}
