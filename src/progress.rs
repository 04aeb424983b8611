//! Generation progress reporting.
//!
//! Reports observable progress during `pweb build` so users see how far the
//! run has got on large catalogs. Progress is emitted on **stderr** so stdout
//! stays parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationEvent {
    /// Catalog index is being built from `records` records.
    Indexing { records: u64 },
    /// Record pages rendered so far.
    Rendering { n: u64, total: u64 },
    /// Pages written to disk so far.
    Writing { n: u64, total: u64 },
}

/// Reports generation progress. Called from worker threads, hence `Sync`.
pub trait GenerationProgress: Send + Sync {
    fn report(&self, event: GenerationEvent);
}

/// Human-friendly progress on stderr: "render  1,234 / 5,000 pages".
pub struct StderrProgress;

impl GenerationProgress for StderrProgress {
    fn report(&self, event: GenerationEvent) {
        let line = match &event {
            GenerationEvent::Indexing { records } => {
                format!("index  {} records\n", format_number(*records))
            }
            GenerationEvent::Rendering { n, total } => format!(
                "render  {} / {} pages\n",
                format_number(*n),
                format_number(*total)
            ),
            GenerationEvent::Writing { n, total } => format!(
                "write  {} / {} pages\n",
                format_number(*n),
                format_number(*total)
            ),
        };
        let mut stderr = std::io::stderr().lock();
        let _ = stderr.write_all(line.as_bytes());
        let _ = stderr.flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl GenerationProgress for JsonProgress {
    fn report(&self, event: GenerationEvent) {
        let obj = match &event {
            GenerationEvent::Indexing { records } => serde_json::json!({
                "event": "progress",
                "phase": "indexing",
                "records": records
            }),
            GenerationEvent::Rendering { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "rendering",
                "n": n,
                "total": total
            }),
            GenerationEvent::Writing { n, total } => serde_json::json!({
                "event": "progress",
                "phase": "writing",
                "n": n,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
            let _ = stderr.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl GenerationProgress for NoProgress {
    fn report(&self, _event: GenerationEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn GenerationProgress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
