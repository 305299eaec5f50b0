// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Clients for the remote site API.
//!
//! Both clients share one [`ApiTransport`], which picks the scheme from the
//! configured port, issues a single GET per call, reads the whole body and
//! only then parses it. Every call takes a cancellation token.

use crate::config::ApiConfig;
use crate::context::RunContext;
use crate::error::{BuildError, Result};
use crate::models::{ContentResponse, PageContent, SiteSettings};
use async_trait::async_trait;
use diagnostics::*;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Source of the tenant's site settings
#[async_trait]
pub trait SettingsSource: Send + Sync {
    async fn fetch_settings(
        &self,
        ctx: &RunContext,
        cancel: &CancellationToken,
    ) -> Result<SiteSettings>;
}

/// Source of rendered content for a single page
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch_page_content(
        &self,
        ctx: &RunContext,
        page_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PageContent>;
}

/// HTTP plumbing shared by the settings and content clients
#[derive(Clone)]
pub struct ApiTransport {
    http_client: reqwest::Client,
    api: ApiConfig,
}

impl ApiTransport {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .map_err(|e| BuildError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { http_client, api })
    }

    #[must_use]
    pub fn api(&self) -> &ApiConfig {
        &self.api
    }

    /// `<origin>/<site_name>/<path>`, with `placeholder` in `path` replaced by `value`.
    ///
    /// The site name and every path segment are pushed one at a time, so `?`,
    /// `#`, `/` and `%` in an identifier are percent-encoded instead of changing
    /// the endpoint.
    pub fn site_endpoint(
        &self,
        site_name: &str,
        path: &str,
        placeholder: &str,
        value: &str,
    ) -> Result<Url> {
        let origin = self.api.origin();
        let mut url = Url::parse(&origin)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| BuildError::Config(format!("API origin {origin} cannot be a base")))?;
            segments.pop_if_empty().push(site_name);
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(&segment.replace(placeholder, value));
            }
        }
        Ok(url)
    }

    /// GET `url` and deserialize the complete body
    pub async fn fetch_json<T>(&self, url: Url, cancel: &CancellationToken) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url_text = url.to_string();
        debug!("GET {url}", url: url_text.as_str());

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(BuildError::Cancelled { url: url_text });
            }
            body = self.fetch_text(url) => body?,
        };

        serde_json::from_str(&body).map_err(|source| BuildError::Parse {
            url: url_text,
            source,
        })
    }

    async fn fetch_text(&self, url: Url) -> Result<String> {
        let url_text = url.to_string();
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|source| BuildError::Network {
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuildError::HttpStatus {
                url: url_text,
                status,
            });
        }

        response.text().await.map_err(|source| BuildError::Network {
            url: url_text,
            source,
        })
    }
}

/// Fetches the site settings document
#[derive(Clone)]
pub struct SettingsClient {
    transport: ApiTransport,
}

impl SettingsClient {
    #[must_use]
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }

    pub fn settings_url(&self, ctx: &RunContext) -> Result<Url> {
        self.transport.site_endpoint(
            ctx.site_name(),
            &self.transport.api().settings_path,
            "{app_id}",
            ctx.app_id(),
        )
    }
}

#[async_trait]
impl SettingsSource for SettingsClient {
    async fn fetch_settings(
        &self,
        ctx: &RunContext,
        cancel: &CancellationToken,
    ) -> Result<SiteSettings> {
        let url = self.settings_url(ctx)?;
        let settings: SiteSettings = self.transport.fetch_json(url, cancel).await?;
        debug!(
            "Fetched settings with {item_count} menu items",
            item_count: settings.menu.items.len()
        );
        Ok(settings)
    }
}

/// Fetches rendered page content
#[derive(Clone)]
pub struct ContentClient {
    transport: ApiTransport,
}

impl ContentClient {
    #[must_use]
    pub fn new(transport: ApiTransport) -> Self {
        Self { transport }
    }

    pub fn content_url(&self, ctx: &RunContext, page_id: &str) -> Result<Url> {
        self.transport.site_endpoint(
            ctx.site_name(),
            &self.transport.api().content_path,
            "{page_id}",
            page_id,
        )
    }
}

#[async_trait]
impl ContentSource for ContentClient {
    async fn fetch_page_content(
        &self,
        ctx: &RunContext,
        page_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PageContent> {
        let url = self.content_url(ctx, page_id)?;
        let response: ContentResponse = self.transport.fetch_json(url, cancel).await?;

        let rendered_html = response
            .into_rendered()
            .ok_or_else(|| BuildError::ContentNotFound {
                page_id: page_id.to_string(),
            })?;

        Ok(PageContent {
            page_id: page_id.to_string(),
            rendered_html,
        })
    }
}
