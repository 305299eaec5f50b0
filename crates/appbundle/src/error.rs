// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for bundle generation

use crate::orchestrator::PageFailure;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Missing or invalid parameter {name}: {reason}")]
    Param { name: &'static str, reason: String },

    #[error("Network error requesting {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No content found for page id {page_id}")]
    ContentNotFound { page_id: String },

    #[error("Template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Failed to read template {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid substitution pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive error for {}: {source}", path.display())]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request to {url} cancelled")]
    Cancelled { url: String },

    #[error("Run cancelled, {} pages abandoned", failures.len())]
    RunCancelled { failures: Vec<PageFailure> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Duplicate page id {0} in site settings")]
    DuplicatePageId(String),

    #[error("Invalid page id {0:?}")]
    InvalidPageId(String),

    #[error("None of the {expected} html pages could be generated")]
    NoPagesGenerated {
        expected: usize,
        failures: Vec<PageFailure>,
    },

    #[error("Invalid run state transition {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl BuildError {
    pub(crate) fn write(path: &Path, source: std::io::Error) -> Self {
        BuildError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn archive(path: &Path, source: std::io::Error) -> Self {
        BuildError::Archive {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Pages that failed in a run that produced no archive
    #[must_use]
    pub fn page_failures(&self) -> &[PageFailure] {
        match self {
            BuildError::RunCancelled { failures }
            | BuildError::NoPagesGenerated { failures, .. } => failures.as_slice(),
            _ => &[],
        }
    }

    /// True for failures of the remote API (transport, status, body shape)
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            BuildError::Network { .. }
                | BuildError::HttpStatus { .. }
                | BuildError::Parse { .. }
                | BuildError::ContentNotFound { .. }
        )
    }
}

impl From<serde_yaml_ng::Error> for BuildError {
    fn from(e: serde_yaml_ng::Error) -> Self {
        BuildError::Config(e.to_string())
    }
}

impl From<url::ParseError> for BuildError {
    fn from(e: url::ParseError) -> Self {
        BuildError::Config(format!("invalid API URL: {e}"))
    }
}
