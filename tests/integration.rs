use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn pweb_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("pweb");
    path
}

const RECORDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<merged_data>
  <philidor4_data>
    <notice>
      <nature>Oeuvre</nature>
      <numero>100</numero>
      <projet>LULLY</projet>
      <num_orig>LUL000045</num_orig>
      <code_srce>LWV 53</code_srce>
      <oeuvre>Atys</oeuvre>
      <genre_musical>Tragédie en musique</genre_musical>
      <a_pour_fragments>1 - 46</a_pour_fragments>
      <incipit_litt>Allons, allons, accourez tous</incipit_litt>
      <nomsFonctions>
        <item key="Lully, Jean-Baptiste">compositeur</item>
        <item key="Quinault, Philippe">librettiste</item>
      </nomsFonctions>
    </notice>
    <notice>
      <nature>Fragment</nature>
      <numero>101</numero>
      <projet>LULLY</projet>
      <num_orig>LUL200046</num_orig>
      <frag>Air de Sangaride</frag>
      <fragment_de>LULLY - 45</fragment_de>
    </notice>
    <notice>
      <nature>Source</nature>
      <numero>200</numero>
      <projet>LULLY</projet>
      <code_srce>F-Pn Vm2 21</code_srce>
      <notice_bibl>Atys, tragédie / mise en musique par M. de Lully.

Paris, Ballard, 1676.</notice_bibl>
    </notice>
    <notice>
      <nature>Source</nature>
      <numero></numero>
      <projet>LULLY</projet>
      <titre_cle>Sans numéro</titre_cle>
    </notice>
    <notice>
      <nature>Personne</nature>
      <numero>300</numero>
      <projet>LULLY</projet>
    </notice>
  </philidor4_data>
</merged_data>
"#;

const PROJECTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<projects>
  <project id="LULLY" name="Œuvres de Lully">
    <description_html>&lt;p&gt;Catalogue des œuvres de Lully.&lt;/p&gt;</description_html>
  </project>
</projects>
"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    let assets_dir = root.join("assets/css");
    fs::create_dir_all(&assets_dir).unwrap();

    fs::write(data_dir.join("records.xml"), RECORDS).unwrap();
    fs::write(data_dir.join("projects.xml"), PROJECTS).unwrap();
    fs::write(assets_dir.join("style.css"), "body { margin: 0; }").unwrap();

    let config_content = format!(
        r#"[input]
records = "{root}/data/records.xml"
projects = "{root}/data/projects.xml"

[output]
dir = "{root}/site"
clean = true
assets = "{root}/assets"

[site]
title = "Philidor"
footer_html = "<p>CMBV</p>"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("pweb.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_pweb(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = pweb_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run pweb binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn site_dir(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().join("site")
}

fn read_tree(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect();
    files.sort();
    files
}

#[test]
fn test_build_writes_pages() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("generated 5 pages"), "stdout={}", stdout);

    let site = site_dir(&config_path);
    assert!(site.join("index.html").is_file());
    assert!(site.join("works/100.html").is_file());
    assert!(site.join("fragments/101.html").is_file());
    assert!(site.join("sources/200.html").is_file());
    assert!(site.join("projects/LULLY.html").is_file());
    assert!(!site.join("works/300.html").exists());
    assert!(site.join("statics/css/style.css").is_file());
}

#[test]
fn test_build_cross_links() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success, "build failed: {}", stderr);

    let site = site_dir(&config_path);
    let work = fs::read_to_string(site.join("works/100.html")).unwrap();
    assert!(work.contains(r#"<a href="../fragments/101.html">Air de Sangaride</a>"#));
    assert!(work.contains("Lully, Jean-Baptiste"));
    assert!(work.contains(r#"href="../statics/css/style.css""#));
    assert!(work.contains("<p>CMBV</p>"));

    let fragment = fs::read_to_string(site.join("fragments/101.html")).unwrap();
    assert!(fragment.contains(r#"<a href="../works/100.html">Atys</a>"#));

    let source = fs::read_to_string(site.join("sources/200.html")).unwrap();
    assert!(source.contains("Atys, tragédie · mise en musique par M. de Lully."));
    assert!(!source.contains("<h1 class=\"notice-title\">Paris"));

    let index = fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains(r#"<a href="projects/LULLY.html">Œuvres de Lully</a> <span class="count">(5)</span>"#));
    assert!(index.contains(r#"href="statics/css/style.css""#));
}

#[test]
fn test_build_is_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success1, "First build failed");
    let first = read_tree(&site_dir(&config_path));

    let (_, _, success2) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success2, "Second build failed");
    let second = read_tree(&site_dir(&config_path));

    assert_eq!(first, second);
}

#[test]
fn test_build_report() {
    let (tmp, config_path) = setup_test_env();
    let report_path = tmp.path().join("reports/run.json");

    let (_, stderr, success) = run_pweb(
        &config_path,
        &[
            "build",
            "--progress",
            "off",
            "--report",
            report_path.to_str().unwrap(),
        ],
    );
    assert!(success, "build failed: {}", stderr);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(report["pages"]["total"], 5);
    assert_eq!(report["pages"]["works"], 1);
    assert_eq!(report["records"], 5);
    assert_eq!(report["assets"], 1);
    assert_eq!(report["digest"].as_str().unwrap().len(), 64);
}

#[test]
fn test_build_json_progress() {
    let (_tmp, config_path) = setup_test_env();
    let (_, stderr, success) = run_pweb(&config_path, &["build", "--progress", "json"]);
    assert!(success, "build failed: {}", stderr);

    let phases: Vec<String> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter_map(|v| v["phase"].as_str().map(str::to_string))
        .collect();
    assert!(phases.contains(&"indexing".to_string()));
    assert!(phases.contains(&"rendering".to_string()));
    assert!(phases.contains(&"writing".to_string()));
}

#[test]
fn test_check_writes_nothing() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pweb(&config_path, &["check"]);
    assert!(success, "check failed: {}", stderr);
    assert!(stdout.contains("5 pages"), "stdout={}", stdout);
    assert!(!site_dir(&config_path).exists());
}

#[test]
fn test_check_duplicate_numero_fails() {
    let (tmp, config_path) = setup_test_env();
    let duplicated = RECORDS.replace("<numero>200</numero>", "<numero>100</numero>")
        .replace("<nature>Fragment</nature>\n      <numero>101</numero>", "<nature>Source</nature>\n      <numero>100</numero>");
    fs::write(tmp.path().join("data/records.xml"), duplicated).unwrap();

    let (_, stderr, success) = run_pweb(&config_path, &["check"]);
    assert!(!success, "check should fail on duplicate pages");
    assert!(stderr.contains("duplicate page sources/100.html"), "stderr={}", stderr);
}

#[test]
fn test_no_records_fails() {
    let (tmp, config_path) = setup_test_env();
    fs::write(tmp.path().join("data/records.xml"), "<root><empty/></root>").unwrap();

    let (_, stderr, success) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(!success);
    assert!(stderr.contains("no catalog records"), "stderr={}", stderr);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_pweb(&tmp.path().join("missing.toml"), &["check"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_stats() {
    let (_tmp, config_path) = setup_test_env();
    let (stdout, stderr, success) = run_pweb(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Records:     5"), "stdout={}", stdout);
    assert!(stdout.contains("LULLY"));
    assert!(stdout.contains("Œuvres de Lully"));
}

#[test]
fn test_build_with_editorial_file() {
    let (tmp, config_path) = setup_test_env();
    fs::write(
        tmp.path().join("data/editorial.xml"),
        r#"<editorial>
  <presentation><title>Philidor</title><subtitle>Catalogue</subtitle></presentation>
  <legal_mentions><content><![CDATA[<p>Éditeur : CMBV</p>]]></content></legal_mentions>
</editorial>"#,
    )
    .unwrap();
    let config = fs::read_to_string(&config_path).unwrap().replace(
        "[output]",
        &format!(
            "editorial = \"{}/data/editorial.xml\"\n\n[output]",
            tmp.path().display()
        ),
    );
    fs::write(&config_path, config).unwrap();

    let (stdout, stderr, success) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success, "build failed: {}", stderr);
    assert!(stdout.contains("generated 6 pages"), "stdout={}", stdout);

    let site = site_dir(&config_path);
    let legal = fs::read_to_string(site.join("mentions-legales.html")).unwrap();
    assert!(legal.contains("<p>Éditeur : CMBV</p>"));
    let index = fs::read_to_string(site.join("index.html")).unwrap();
    assert!(index.contains(r#"<p class="subtitle">Catalogue</p>"#));
    let work = fs::read_to_string(site.join("works/100.html")).unwrap();
    assert!(work.contains(r#"<a href="../mentions-legales.html">Mentions légales</a>"#));
}

#[test]
fn test_build_skips_hostile_numero() {
    let (tmp, config_path) = setup_test_env();
    let hostile = RECORDS.replace(
        "<numero>200</numero>",
        "<numero>../../../leak</numero>",
    );
    fs::write(tmp.path().join("data/records.xml"), hostile).unwrap();

    let (stdout, stderr, success) = run_pweb(&config_path, &["build", "--progress", "off"]);
    assert!(success, "build failed: {}", stderr);
    assert!(stdout.contains("generated 4 pages"), "stdout={}", stdout);
    assert!(!tmp.path().join("leak.html").exists());
    assert!(!tmp.path().parent().unwrap().join("leak.html").exists());
}

#[test]
fn test_stats_lists_unused_metadata() {
    let (tmp, config_path) = setup_test_env();
    let projects = PROJECTS.replace(
        "</projects>",
        "  <project id=\"MOTETS\" name=\"Grands motets\"/>\n</projects>",
    );
    fs::write(tmp.path().join("data/projects.xml"), projects).unwrap();

    let (stdout, stderr, success) = run_pweb(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Unused metadata"), "stdout={}", stdout);
    assert!(stdout.contains("MOTETS"));
    assert!(stdout.contains("Grands motets"));
}
