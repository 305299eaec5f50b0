// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Per-invocation identifiers and the output paths derived from them.

use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};

/// Extension of the archive written next to the build directory
pub const ARCHIVE_EXTENSION: &str = "tar.zst";

/// Immutable identifiers for one run.
///
/// Every output path is a pure function of these three values, so running
/// twice with the same identifiers targets the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    site_name: String,
    app_id: String,
    output_root: PathBuf,
}

impl RunContext {
    /// Validate the identifiers and build a context. Performs no I/O.
    pub fn new(
        site_name: impl Into<String>,
        app_id: impl Into<String>,
        output_root: impl Into<PathBuf>,
    ) -> Result<Self> {
        let site_name = site_name.into();
        let app_id = app_id.into();
        validate_identifier("site_name", &site_name)?;
        validate_identifier("app_id", &app_id)?;
        Ok(Self {
            site_name,
            app_id,
            output_root: output_root.into(),
        })
    }

    #[must_use]
    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// `app_<site_name>_<app_id>`, also the archive basename
    #[must_use]
    pub fn build_dir_name(&self) -> String {
        format!("app_{}_{}", self.site_name, self.app_id)
    }

    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.output_root.join(self.build_dir_name())
    }

    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.output_root
            .join(format!("{}.{}", self.build_dir_name(), ARCHIVE_EXTENSION))
    }
}

/// Identifiers end up in paths and URLs, so they must be a single segment.
fn validate_identifier(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BuildError::Param {
            name,
            reason: "value is required".to_string(),
        });
    }
    if !is_path_segment(value) {
        return Err(BuildError::Param {
            name,
            reason: format!("{value:?} must not contain path separators or '..'"),
        });
    }
    Ok(())
}

/// True if `value` can be used as one path component without escaping it.
pub(crate) fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && !value.contains("..")
        && !value.contains(['/', '\\', '\0'])
}
