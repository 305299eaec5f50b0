// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Builder configuration, parsed from a YAML file.
//!
//! ```yaml
//! api:
//!   hostname: "{{ env(name='MKPAGES_API_HOST', default='myapppresser.com') }}"
//!   port: 443
//!   settings_path: "wp-json/myappp/v1/app/{app_id}"
//!   content_path: "wp-json/wp/v2/apppages/{page_id}"
//!   timeout_secs: 60
//! templates_dir: "templates"
//! output_root: "builds"
//! max_concurrent_pages: 8
//! ```
//!
//! The file is expanded with Tera before parsing, so values may read the
//! environment through the built-in `env` function.

use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tera::{Tera, Value};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "mkpages.yaml";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BuilderConfig {
    pub api: ApiConfig,
    pub templates_dir: PathBuf,
    pub output_root: PathBuf,
    pub max_concurrent_pages: usize,
    /// zstd level for the archive (0-21)
    pub compression_level: i32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            templates_dir: PathBuf::from("templates"),
            output_root: PathBuf::from("builds"),
            max_concurrent_pages: 8,
            compression_level: 3,
        }
    }
}

/// Where the site API lives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub hostname: String,
    pub port: u16,
    /// Overrides the port-based scheme selection when set
    pub scheme: Option<Scheme>,
    /// Path below `/<site_name>/`; `{app_id}` is replaced
    pub settings_path: String,
    /// Path below `/<site_name>/`; `{page_id}` is replaced
    pub content_path: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            hostname: "myapppresser.com".to_string(),
            port: 443,
            scheme: None,
            settings_path: "wp-json/myappp/v1/app/{app_id}".to_string(),
            content_path: "wp-json/wp/v2/apppages/{page_id}".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiConfig {
    /// Port 80 is plaintext, everything else is TLS unless `scheme` says otherwise.
    #[must_use]
    pub fn resolved_scheme(&self) -> Scheme {
        match (self.scheme, self.port) {
            (Some(scheme), _) => scheme,
            (None, 80) => Scheme::Http,
            (None, _) => Scheme::Https,
        }
    }

    /// `scheme://host[:port]` with the port omitted when it is the scheme default
    #[must_use]
    pub fn origin(&self) -> String {
        let scheme = self.resolved_scheme();
        if self.port == scheme.default_port() {
            format!("{}://{}", scheme, self.hostname)
        } else {
            format!("{}://{}:{}", scheme, self.hostname, self.port)
        }
    }

    /// Base URL of one tenant site, e.g. `https://myapppresser.com/acme/`
    #[must_use]
    pub fn site_url(&self, site_name: &str) -> String {
        format!("{}/{}/", self.origin(), site_name)
    }
}

impl BuilderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.api.hostname.trim().is_empty() {
            return Err(BuildError::Config("api.hostname cannot be empty".to_string()));
        }
        if self.api.port == 0 {
            return Err(BuildError::Config("api.port must be greater than 0".to_string()));
        }
        if self.api.settings_path.trim().is_empty() {
            return Err(BuildError::Config(
                "api.settings_path cannot be empty".to_string(),
            ));
        }
        if !self.api.content_path.contains("{page_id}") {
            return Err(BuildError::Config(
                "api.content_path must contain {page_id}".to_string(),
            ));
        }
        if self.max_concurrent_pages == 0 {
            return Err(BuildError::Config(
                "max_concurrent_pages must be greater than 0".to_string(),
            ));
        }
        if !(0..=21).contains(&self.compression_level) {
            return Err(BuildError::Config(format!(
                "compression_level must be between 0 and 21, got {}",
                self.compression_level
            )));
        }
        Ok(())
    }
}

/// Load, expand and validate a configuration file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BuilderConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        BuildError::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    parse_config(&content)
}

/// Parse configuration text (after Tera expansion) and validate it
pub fn parse_config(content: &str) -> Result<BuilderConfig> {
    let expanded = expand_config_template(content, &HashMap::new())?;
    let config: BuilderConfig = serde_yaml_ng::from_str(&expanded)?;
    config.validate()?;
    Ok(config)
}

/// Expand a YAML configuration with Tera, with an `env` function available.
pub fn expand_config_template(
    yaml_content: &str,
    variables: &HashMap<String, String>,
) -> Result<String> {
    let mut tera = Tera::default();
    tera.register_function("env", config_env);

    let mut context = tera::Context::new();
    for (key, value) in variables {
        context.insert(key, value);
    }

    tera.render_str(yaml_content, &context).map_err(|e| {
        let mut chain = vec![e.to_string()];
        let mut source = std::error::Error::source(&e);
        while let Some(err) = source {
            chain.push(err.to_string());
            source = std::error::Error::source(err);
        }
        BuildError::Config(format!("Template expansion failed: {}", chain.join(": ")))
    })
}

/// `env(name, default)` for config files. The default may be any value, so
/// `port: {{ env(name="API_PORT", default=443) }}` stays a number.
fn config_env(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let Some(Value::String(name)) = args.get("name") else {
        return Err(tera::Error::msg("env() needs a string `name` argument"));
    };
    std::env::var(name)
        .ok()
        .map(Value::String)
        .or_else(|| args.get("default").cloned())
        .ok_or_else(|| tera::Error::msg(format!("{name} is not set and env() has no default")))
}
