//! The `build` and `check` commands.
//!
//! Both load the configured inputs and run the engine; only `build` writes
//! anything. Engine errors are wrapped with the input path so the CLI can
//! print one readable line.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::generate::{generate_site_with_progress, Site};
use crate::loader;
use crate::output::{write_site, WriteOptions};
use crate::progress::{GenerationProgress, NoProgress};
use crate::report::{write_report, GenerationReport};

async fn load_and_generate(
    config: &Config,
    progress: &dyn GenerationProgress,
) -> Result<(usize, Site)> {
    let records_path = &config.input.records;
    let inputs = loader::load_inputs(
        records_path,
        config.input.projects.as_deref(),
        config.input.editorial.as_deref(),
    )
    .await
    .with_context(|| format!("Failed to load {}", records_path.display()))?;

    let mut options = config.site.options();
    options.editorial = inputs.editorial;
    let site = generate_site_with_progress(&inputs.records, &inputs.projects, &options, progress)
        .with_context(|| format!("Failed to generate site from {}", records_path.display()))?;
    Ok((inputs.records.len(), site))
}

/// Load, generate, write the output tree and optionally a JSON report.
pub async fn run_build(
    config: &Config,
    report: Option<&Path>,
    progress: &dyn GenerationProgress,
) -> Result<()> {
    let started = Instant::now();
    let (record_count, site) = load_and_generate(config, progress).await?;

    let write_options = WriteOptions {
        dir: config.output.dir.clone(),
        clean: config.output.clean,
        assets: config.output.assets.clone(),
    };
    let summary = write_site(&site, &write_options, progress)
        .await
        .with_context(|| format!("Failed to write site to {}", write_options.dir.display()))?;

    if let Some(path) = report {
        let report = GenerationReport::new(
            &site,
            record_count,
            summary.assets,
            &config.input.records,
            config.input.projects.as_deref(),
            &write_options.dir,
            started.elapsed(),
        );
        write_report(&report, path)?;
    }

    println!(
        "generated {} pages in {}",
        summary.pages,
        write_options.dir.display()
    );
    Ok(())
}

/// Load and generate without writing; fails on the same errors as `build`.
pub async fn run_check(config: &Config) -> Result<()> {
    let (record_count, site) = load_and_generate(config, &NoProgress).await?;
    println!(
        "ok: {} records, {} pages ({} works, {} sources, {} fragments, {} projects)",
        record_count,
        site.len(),
        site.count_in("works"),
        site.count_in("sources"),
        site.count_in("fragments"),
        site.count_in("projects")
    );
    Ok(())
}
