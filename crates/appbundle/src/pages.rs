// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Template layout of a generated app: which template produces which file,
//! with which substitutions.

use crate::template::{Substitution, TemplateSpec};
use std::path::{Path, PathBuf};

const PAGE_TEMPLATE_DIR: &str = "custom-html-template";
const PAGE_TEMPLATE_STEM: &str = "custom-html-template";
const PAGE_CLASS_TOKEN: &str = "CustomHtmlTemplate";
const PAGE_CONTENT_TOKEN: &str = "Content goes here";

pub const GLOBALS_DIR: &str = "globalvars";
const GLOBALS_FILE: &str = "globalvars.ts";
const APP_ID_TOKEN: &str = "[[appp_app_id]]";
const API_URL_TOKEN: &str = "[[myappp_url]]";

/// `page-<id>`, the directory and file stem of a generated page
#[must_use]
pub fn page_slug(page_id: &str) -> String {
    format!("page-{page_id}")
}

/// Directory holding one page's files
#[must_use]
pub fn page_dir(build_dir: &Path, page_id: &str) -> PathBuf {
    build_dir.join(page_slug(page_id))
}

/// The three files of a page, in generation order: content, module, component
#[must_use]
pub fn page_templates(
    templates_dir: &Path,
    build_dir: &Path,
    page_id: &str,
    rendered_html: &str,
) -> [TemplateSpec; 3] {
    let slug = page_slug(page_id);
    let source_dir = templates_dir.join(PAGE_TEMPLATE_DIR);
    let dest_dir = page_dir(build_dir, page_id);

    let naming = || {
        vec![
            Substitution::literal(PAGE_CLASS_TOKEN, format!("Page{page_id}")),
            Substitution::literal(PAGE_TEMPLATE_STEM, slug.clone()),
        ]
    };

    [
        TemplateSpec {
            source: source_dir.join(format!("{PAGE_TEMPLATE_STEM}.html")),
            destination: dest_dir.join(format!("{slug}.html")),
            substitutions: vec![Substitution::literal(PAGE_CONTENT_TOKEN, rendered_html)],
        },
        TemplateSpec {
            source: source_dir.join(format!("{PAGE_TEMPLATE_STEM}.module.ts")),
            destination: dest_dir.join(format!("{slug}.module.ts")),
            substitutions: naming(),
        },
        TemplateSpec {
            source: source_dir.join(format!("{PAGE_TEMPLATE_STEM}.ts")),
            destination: dest_dir.join(format!("{slug}.ts")),
            substitutions: naming(),
        },
    ]
}

/// The shared global-variables file
#[must_use]
pub fn globals_template(
    templates_dir: &Path,
    build_dir: &Path,
    app_id: &str,
    api_url: &str,
) -> TemplateSpec {
    TemplateSpec {
        source: templates_dir.join(GLOBALS_FILE),
        destination: build_dir.join(GLOBALS_DIR).join(GLOBALS_FILE),
        substitutions: vec![
            Substitution::literal(APP_ID_TOKEN, app_id),
            Substitution::literal(API_URL_TOKEN, api_url),
        ],
    }
}
