// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Deserializer, Serialize};

/// Menu items of this type are turned into generated pages
pub const HTML_PAGE_TYPE: &str = "html";

/// Site settings document returned by the settings endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SiteSettings {
    #[serde(alias = "menus")]
    pub menu: Menu,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Menu {
    #[serde(default)]
    pub items: Vec<MenuItem>,
}

/// One entry of the app menu
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MenuItem {
    #[serde(deserialize_with = "string_or_number")]
    pub page_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub page_type: Option<String>,
}

impl MenuItem {
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.page_type.as_deref() == Some(HTML_PAGE_TYPE)
    }
}

impl SiteSettings {
    /// Items that take part in generation, in menu order
    pub fn html_pages(&self) -> impl Iterator<Item = &MenuItem> {
        self.menu.items.iter().filter(|item| item.is_html())
    }
}

/// Rendered markup for one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageContent {
    pub page_id: String,
    pub rendered_html: String,
}

/// Body of the content endpoint; only `content.rendered` is used
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ContentResponse {
    #[serde(default)]
    pub content: Option<RenderedField>,
}

#[derive(Deserialize, Debug, Default)]
pub(crate) struct RenderedField {
    #[serde(default)]
    pub rendered: Option<String>,
}

impl ContentResponse {
    /// Rendered html, `None` when the field is missing or empty
    pub(crate) fn into_rendered(self) -> Option<String> {
        self.content
            .and_then(|c| c.rendered)
            .filter(|html| !html.is_empty())
    }
}

/// Page ids show up as both JSON strings and integers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Uint(u64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Uint(n) => n.to_string(),
    })
}
