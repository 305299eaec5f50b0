// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! # appbundle: per-tenant app bundle generation
//!
//! Fetches a site's settings and page content from the remote API, fills the
//! page and globals templates, writes them under
//! `<output_root>/app_<site>_<app>/` and packs that directory into
//! `<output_root>/app_<site>_<app>.tar.zst`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use appbundle::{ApiTransport, BuilderConfig, ContentClient, Orchestrator, SettingsClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> appbundle::Result<()> {
//! let config = BuilderConfig::default();
//! let transport = ApiTransport::new(config.api.clone())?;
//! let orchestrator = Orchestrator::new(
//!     config,
//!     Arc::new(SettingsClient::new(transport.clone())),
//!     Arc::new(ContentClient::new(transport)),
//! );
//! let report = orchestrator.run("acme", "42").await?;
//! println!("archive: {}", report.archive.path.display());
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod pages;
pub mod template;

pub use crate::archive::{ArchiveDescriptor, Archiver, list_archive};
pub use crate::client::{ApiTransport, ContentClient, ContentSource, SettingsClient, SettingsSource};
pub use crate::config::{ApiConfig, BuilderConfig, Scheme, load_config};
pub use crate::context::RunContext;
pub use crate::error::{BuildError, Result};
pub use crate::models::{MenuItem, PageContent, SiteSettings};
pub use crate::orchestrator::{
    GeneratedPage, Orchestrator, PageFailure, RunOutcome, RunReport, RunState,
};
pub use crate::template::{Pattern, Substitution, TemplateEngine, TemplateSpec};
pub use tokio_util::sync::CancellationToken;
