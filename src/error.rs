//! Typed errors for loading and generation.
//!
//! Missing fields, blank `numero` values and unresolved cross-references
//! are not errors; they only change what gets rendered.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// The input holds no record at all.
    #[error("no catalog records found in input")]
    NoRecords,

    /// Two records map to the same output path under the `error` policy.
    #[error("duplicate page {path} (records #{first} and #{second})")]
    DuplicatePage {
        path: String,
        first: usize,
        second: usize,
    },

    /// A page path that would leave the output directory.
    #[error("page path {path:?} is not a plain relative path")]
    UnsafePath { path: String },

    #[error("invalid XML in {context}: {message}")]
    Xml { context: String, message: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SiteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SiteError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type SiteResult<T> = std::result::Result<T, SiteError>;
