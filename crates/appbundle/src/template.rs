// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Template instantiation by ordered placeholder substitution.
//!
//! A template is read in one go, every [`Substitution`] is applied to the
//! result of the previous one, and the output is written to its destination
//! (parent directories are created). Literal tokens are matched exactly, so
//! callers never escape placeholders like `[[appp_app_id]]`.

use crate::error::{BuildError, Result};
use diagnostics::*;
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact text match
    Literal(String),
    /// Regular expression; the replacement may use `$name` captures
    Regex(Regex),
}

#[derive(Debug, Clone)]
pub struct Substitution {
    pub pattern: Pattern,
    pub replacement: String,
}

impl Substitution {
    pub fn literal(token: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: Pattern::Literal(token.into()),
            replacement: replacement.into(),
        }
    }

    pub fn regex(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            pattern: Pattern::Regex(Regex::new(pattern)?),
            replacement: replacement.into(),
        })
    }

    /// Replace every match in `text`
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            // An empty token would match between every character
            Pattern::Literal(token) if token.is_empty() => text.to_string(),
            Pattern::Literal(token) => text.replace(token.as_str(), &self.replacement),
            Pattern::Regex(re) => re.replace_all(text, self.replacement.as_str()).into_owned(),
        }
    }
}

/// Apply substitutions in order
#[must_use]
pub fn apply_all(text: &str, substitutions: &[Substitution]) -> String {
    substitutions
        .iter()
        .fold(text.to_string(), |acc, sub| sub.apply(&acc))
}

/// One template to instantiate
#[derive(Debug, Clone)]
pub struct TemplateSpec {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub substitutions: Vec<Substitution>,
}

/// Reads templates, substitutes, and writes the results
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    pub async fn build(&self, spec: &TemplateSpec) -> Result<()> {
        self.build_template(&spec.source, &spec.destination, &spec.substitutions)
            .await
    }

    /// Instantiate `template_path` into `destination_path`.
    ///
    /// Rerunning with the same inputs rewrites an identical file.
    pub async fn build_template(
        &self,
        template_path: &Path,
        destination_path: &Path,
        substitutions: &[Substitution],
    ) -> Result<()> {
        let template = tokio::fs::read_to_string(template_path)
            .await
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    BuildError::TemplateNotFound {
                        path: template_path.to_path_buf(),
                    }
                } else {
                    BuildError::TemplateRead {
                        path: template_path.to_path_buf(),
                        source,
                    }
                }
            })?;

        let output = apply_all(&template, substitutions);

        if let Some(parent) = destination_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::write(parent, e))?;
        }

        tokio::fs::write(destination_path, output.as_bytes())
            .await
            .map_err(|e| BuildError::write(destination_path, e))?;

        debug!(
            "Wrote {dest} ({bytes} bytes)",
            dest: destination_path.display().to_string(),
            bytes: output.len()
        );
        Ok(())
    }
}
