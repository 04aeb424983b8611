//! # Philidor Web
//!
//! A static-site compiler for music catalog records.
//!
//! Philidor Web reads an XML export of catalog records (works, sources,
//! fragments, people, events) plus editorial project metadata, and produces
//! a cross-linked French-language HTML site: one page per work, source and
//! fragment, one summary page per project, and a home page listing the
//! projects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │   loader    │──▶│   catalog   │──▶│   generate   │──▶│  output  │
//! │ quick-xml   │   │  indexes    │   │ pages (rayon)│   │ tokio::fs│
//! └─────────────┘   └─────────────┘   └──────┬───────┘   └──────────┘
//!                                            │
//!                     router · cascade · xref · sections · markup
//! ```
//!
//! The engine ([`generate::generate_site`]) is pure: records and projects in,
//! a path → HTML map out. Reading and writing files is left to [`loader`] and
//! [`output`].
//!
//! ## Quick Start
//!
//! ```bash
//! pweb check                    # validate inputs
//! pweb stats                    # what would be generated
//! pweb build --report run.json  # write the site
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Records, projects, project store |
//! | [`loader`] | XML input |
//! | [`catalog`] | Lookup indexes over the records |
//! | [`text`] | Line splitting and notice collapsing |
//! | [`cascade`] | Title selection |
//! | [`xref`] | Work ↔ fragment cross-references |
//! | [`router`] | Page identities and routing |
//! | [`sections`] | Collapsible field sections, people lists |
//! | [`markup`] | Escaping and the page shell |
//! | [`generate`] | Page generation |
//! | [`output`] | Writing the site to disk |
//! | [`pipeline`] | `build` and `check` commands |
//! | [`stats`] | Catalog statistics |
//! | [`report`] | JSON generation report |
//! | [`progress`] | Progress reporting |
//! | [`error`] | Engine errors |

pub mod cascade;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generate;
pub mod loader;
pub mod markup;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod router;
pub mod sections;
pub mod stats;
pub mod text;
pub mod xref;
