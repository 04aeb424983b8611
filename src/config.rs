use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::generate::{DuplicatePolicy, SiteOptions};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub site: SiteConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub records: PathBuf,
    /// Project metadata file. When absent, `<project>` elements are read
    /// from the records file.
    #[serde(default)]
    pub projects: Option<PathBuf>,
    /// Presentation, about and legal mentions documents. When absent, they
    /// are read from the records file.
    #[serde(default)]
    pub editorial: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    #[serde(default)]
    pub clean: bool,
    /// Directory copied verbatim to `<dir>/statics`.
    #[serde(default)]
    pub assets: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub footer_html: String,
    #[serde(default = "default_stylesheets")]
    pub stylesheets: Vec<String>,
    #[serde(default = "default_scripts")]
    pub scripts: Vec<String>,
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

fn default_stylesheets() -> Vec<String> {
    vec!["statics/css/style.css".to_string()]
}
fn default_scripts() -> Vec<String> {
    vec!["statics/js/main.js".to_string()]
}

impl SiteConfig {
    pub fn options(&self) -> SiteOptions {
        SiteOptions {
            title: self.title.trim().to_string(),
            footer_html: self.footer_html.clone(),
            stylesheets: self.stylesheets.clone(),
            scripts: self.scripts.clone(),
            duplicate_policy: self.duplicate_policy,
            ..SiteOptions::default()
        }
    }
}

/// Resolve relative paths against the directory holding the config file.
fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.site.title.trim().is_empty() {
        anyhow::bail!("site.title must not be empty");
    }
    if config.input.records.as_os_str().is_empty() {
        anyhow::bail!("input.records must be set");
    }
    if config.output.dir.as_os_str().is_empty() {
        anyhow::bail!("output.dir must be set");
    }

    for asset in config.site.stylesheets.iter().chain(&config.site.scripts) {
        if asset.starts_with('/') || asset.contains("://") {
            anyhow::bail!(
                "site asset '{}' must be a site-relative path (it is prefixed per page depth)",
                asset
            );
        }
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.input.records = resolve(base, &config.input.records);
    config.input.projects = config.input.projects.map(|p| resolve(base, &p));
    config.input.editorial = config.input.editorial.map(|p| resolve(base, &p));
    config.output.dir = resolve(base, &config.output.dir);
    config.output.assets = config.output.assets.map(|p| resolve(base, &p));

    if let Some(assets) = &config.output.assets {
        if !assets.is_dir() {
            anyhow::bail!("output.assets is not a directory: {}", assets.display());
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("pweb.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "data/records.xml"

[output]
dir = "site"

[site]
title = "Philidor"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.input.records, tmp.path().join("data/records.xml"));
        assert!(config.input.projects.is_none());
        assert!(config.input.editorial.is_none());
        assert_eq!(config.output.dir, tmp.path().join("site"));
        assert!(!config.output.clean);
        assert_eq!(config.site.duplicate_policy, DuplicatePolicy::Error);
        assert_eq!(config.site.stylesheets, vec!["statics/css/style.css"]);
    }

    #[test]
    fn test_duplicate_policy_parsed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "r.xml"
[output]
dir = "out"
[site]
title = "T"
duplicate_policy = "last"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.site.options().duplicate_policy, DuplicatePolicy::Last);
    }

    #[test]
    fn test_empty_title_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "r.xml"
[output]
dir = "out"
[site]
title = "  "
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("site.title"));
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "r.xml"
[output]
dir = "out"
[site]
title = "T"
duplicate_policy = "merge"
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_absolute_asset_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "r.xml"
[output]
dir = "out"
[site]
title = "T"
stylesheets = ["/css/site.css"]
"#,
        );
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_editorial_path_resolved_against_config_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            r#"
[input]
records = "r.xml"
editorial = "data/editorial.xml"
[output]
dir = "out"
[site]
title = "T"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(
            config.input.editorial,
            Some(tmp.path().join("data/editorial.xml"))
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/pweb.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
