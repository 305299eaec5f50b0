// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Run orchestration: settings, per-page fan-out, globals, archive.
//!
//! ```text
//! Init → ParamsResolved → BuildDirReady → SettingsFetched
//!      → PagesGenerated → GlobalsGenerated → Archived → Done
//! ```
//!
//! Any step may move the run to `Failed`. Page failures are not run
//! failures: they are collected and reported next to the archive.

use crate::archive::{ArchiveDescriptor, Archiver};
use crate::client::{ContentSource, SettingsSource};
use crate::config::BuilderConfig;
use crate::context::{RunContext, is_path_segment};
use crate::error::{BuildError, Result};
use crate::models::{MenuItem, SiteSettings};
use crate::pages::{globals_template, page_dir, page_templates};
use crate::template::TemplateEngine;
use diagnostics::*;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    ParamsResolved,
    BuildDirReady,
    SettingsFetched,
    PagesGenerated,
    GlobalsGenerated,
    Archived,
    Done,
    Failed,
}

impl RunState {
    /// The only state a successful step may move to
    #[must_use]
    pub fn successor(self) -> Option<RunState> {
        match self {
            RunState::Init => Some(RunState::ParamsResolved),
            RunState::ParamsResolved => Some(RunState::BuildDirReady),
            RunState::BuildDirReady => Some(RunState::SettingsFetched),
            RunState::SettingsFetched => Some(RunState::PagesGenerated),
            RunState::PagesGenerated => Some(RunState::GlobalsGenerated),
            RunState::GlobalsGenerated => Some(RunState::Archived),
            RunState::Archived => Some(RunState::Done),
            RunState::Done | RunState::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "INIT",
            RunState::ParamsResolved => "PARAMS_RESOLVED",
            RunState::BuildDirReady => "BUILD_DIR_READY",
            RunState::SettingsFetched => "SETTINGS_FETCHED",
            RunState::PagesGenerated => "PAGES_GENERATED",
            RunState::GlobalsGenerated => "GLOBALS_GENERATED",
            RunState::Archived => "ARCHIVED",
            RunState::Done => "DONE",
            RunState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Tracks the state of one run and rejects out-of-order steps
#[derive(Debug)]
pub struct RunTracker {
    state: RunState,
}

impl Default for RunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RunTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RunState::Init,
        }
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn advance(&mut self, next: RunState) -> Result<()> {
        if self.state.successor() != Some(next) {
            return Err(BuildError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!(
            "Run state {from} -> {to}",
            from: self.state.to_string(),
            to: next.to_string()
        );
        self.state = next;
        Ok(())
    }

    /// Move to `Failed` from any non-terminal state
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            debug!("Run state {from} -> FAILED", from: self.state.to_string());
            self.state = RunState::Failed;
        }
    }
}

/// A page whose three files were written
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedPage {
    pub page_id: String,
    pub title: String,
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
}

/// A page that was abandoned, with the reason
#[derive(Debug)]
pub struct PageFailure {
    pub page_id: String,
    pub title: String,
    pub error: BuildError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every html page was generated
    Complete,
    /// Archive written, some pages missing
    Partial,
}

/// Result of a run that produced an archive
#[derive(Debug)]
pub struct RunReport {
    pub context: RunContext,
    pub archive: ArchiveDescriptor,
    pub pages: Vec<GeneratedPage>,
    pub failures: Vec<PageFailure>,
    /// Menu items that are not html pages
    pub skipped: usize,
}

impl RunReport {
    #[must_use]
    pub fn outcome(&self) -> RunOutcome {
        if self.failures.is_empty() {
            RunOutcome::Complete
        } else {
            RunOutcome::Partial
        }
    }
}

/// Html pages to generate plus the items rejected before generation
struct PagePlan {
    pages: Vec<MenuItem>,
    rejected: Vec<PageFailure>,
    skipped: usize,
}

impl PagePlan {
    /// Keep html items with usable, unique ids, in menu order
    fn from_settings(settings: &SiteSettings) -> Self {
        let mut seen = HashSet::new();
        let mut pages = Vec::new();
        let mut rejected = Vec::new();
        let mut skipped = 0;

        for item in &settings.menu.items {
            if !item.is_html() {
                skipped += 1;
                continue;
            }
            let error = if !is_path_segment(&item.page_id) {
                Some(BuildError::InvalidPageId(item.page_id.clone()))
            } else if !seen.insert(item.page_id.clone()) {
                Some(BuildError::DuplicatePageId(item.page_id.clone()))
            } else {
                None
            };

            match error {
                Some(error) => rejected.push(PageFailure {
                    page_id: item.page_id.clone(),
                    title: item.title.clone(),
                    error,
                }),
                None => pages.push(item.clone()),
            }
        }

        Self {
            pages,
            rejected,
            skipped,
        }
    }

    fn expected(&self) -> usize {
        self.pages.len() + self.rejected.len()
    }
}

/// Drives one run from identifiers to archive
pub struct Orchestrator {
    config: Arc<BuilderConfig>,
    settings: Arc<dyn SettingsSource>,
    content: Arc<dyn ContentSource>,
    engine: TemplateEngine,
    archiver: Archiver,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        config: BuilderConfig,
        settings: Arc<dyn SettingsSource>,
        content: Arc<dyn ContentSource>,
    ) -> Self {
        let archiver = Archiver::new().compression_level(config.compression_level);
        Self {
            config: Arc::new(config),
            settings,
            content,
            engine: TemplateEngine::new(),
            archiver,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one cancelled on Ctrl-C
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run for the given identifiers.
    ///
    /// Invalid identifiers fail before any filesystem or network activity.
    pub async fn run(&self, site_name: &str, app_id: &str) -> Result<RunReport> {
        let mut tracker = RunTracker::new();
        let result = match RunContext::new(site_name, app_id, &self.config.output_root) {
            Ok(ctx) => self.drive(&ctx, &mut tracker).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            error!(
                "Run failed in {state}: {reason}",
                state: tracker.state().to_string(),
                reason: e.to_string()
            );
            tracker.fail();
        }
        result
    }

    async fn drive(&self, ctx: &RunContext, tracker: &mut RunTracker) -> Result<RunReport> {
        tracker.advance(RunState::ParamsResolved)?;

        self.prepare_build_dir(ctx).await?;
        tracker.advance(RunState::BuildDirReady)?;

        let settings = self.settings.fetch_settings(ctx, &self.cancel).await?;
        tracker.advance(RunState::SettingsFetched)?;

        let plan = PagePlan::from_settings(&settings);
        for failure in &plan.rejected {
            log_page_failure(failure);
        }

        // Globals don't depend on pages; both must finish before archiving
        let (page_results, globals) =
            tokio::join!(self.generate_pages(ctx, &plan.pages), self.generate_globals(ctx));

        let expected = plan.expected();
        let mut failures = plan.rejected;
        let mut pages = Vec::new();
        for result in page_results {
            match result {
                Ok(page) => pages.push(page),
                Err(failure) => failures.push(failure),
            }
        }
        tracker.advance(RunState::PagesGenerated)?;

        globals?;
        tracker.advance(RunState::GlobalsGenerated)?;

        if self.cancel.is_cancelled() {
            return Err(BuildError::RunCancelled { failures });
        }
        if expected > 0 && pages.is_empty() {
            return Err(BuildError::NoPagesGenerated { expected, failures });
        }

        self.remove_stale_archive(ctx).await?;
        let archive = self.archiver.archive(&ctx.build_dir()).await?;
        tracker.advance(RunState::Archived)?;

        tracker.advance(RunState::Done)?;
        info!(
            "Run finished: {generated} pages generated, {failed} failed",
            generated: pages.len(),
            failed: failures.len()
        );

        Ok(RunReport {
            context: ctx.clone(),
            archive,
            pages,
            failures,
            skipped: plan.skipped,
        })
    }

    /// Start from an empty build directory. The previous archive is kept
    /// until a replacement is ready to be written.
    async fn prepare_build_dir(&self, ctx: &RunContext) -> Result<()> {
        let build_dir = ctx.build_dir();
        match tokio::fs::remove_dir_all(&build_dir).await {
            Ok(()) => {
                warn!(
                    "Removed stale build directory {dir}",
                    dir: build_dir.display().to_string()
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(BuildError::write(&build_dir, e)),
        }

        tokio::fs::create_dir_all(&build_dir)
            .await
            .map_err(|e| BuildError::write(&build_dir, e))
    }

    async fn remove_stale_archive(&self, ctx: &RunContext) -> Result<()> {
        let archive_path = ctx.archive_path();
        match tokio::fs::remove_file(&archive_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BuildError::write(&archive_path, e)),
        }
    }

    async fn generate_pages(
        &self,
        ctx: &RunContext,
        pages: &[MenuItem],
    ) -> Vec<std::result::Result<GeneratedPage, PageFailure>> {
        stream::iter(pages)
            .map(|item| self.generate_page_isolated(ctx, item))
            .buffer_unordered(self.config.max_concurrent_pages)
            .collect()
            .await
    }

    /// Generate one page; on failure remove whatever it wrote
    async fn generate_page_isolated(
        &self,
        ctx: &RunContext,
        item: &MenuItem,
    ) -> std::result::Result<GeneratedPage, PageFailure> {
        match self.generate_page(ctx, item).await {
            Ok(page) => {
                info!("Generated page {page_id}", page_id: page.page_id.as_str());
                Ok(page)
            }
            Err(error) => {
                let dir = page_dir(&ctx.build_dir(), &item.page_id);
                if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(
                            "Could not remove partial page output {dir}: {reason}",
                            dir: dir.display().to_string(),
                            reason: e.to_string()
                        );
                    }
                }
                let failure = PageFailure {
                    page_id: item.page_id.clone(),
                    title: item.title.clone(),
                    error,
                };
                log_page_failure(&failure);
                Err(failure)
            }
        }
    }

    async fn generate_page(&self, ctx: &RunContext, item: &MenuItem) -> Result<GeneratedPage> {
        info!("processing page: {title}", title: item.title.as_str());

        let content = self
            .content
            .fetch_page_content(ctx, &item.page_id, &self.cancel)
            .await?;

        let build_dir = ctx.build_dir();
        let specs = page_templates(
            &self.config.templates_dir,
            &build_dir,
            &item.page_id,
            &content.rendered_html,
        );

        let mut files = Vec::with_capacity(specs.len());
        for spec in &specs {
            self.engine.build(spec).await?;
            files.push(spec.destination.clone());
        }

        Ok(GeneratedPage {
            page_id: item.page_id.clone(),
            title: item.title.clone(),
            directory: page_dir(&build_dir, &item.page_id),
            files,
        })
    }

    async fn generate_globals(&self, ctx: &RunContext) -> Result<()> {
        let api_url = self.config.api.site_url(ctx.site_name());
        let spec = globals_template(
            &self.config.templates_dir,
            &ctx.build_dir(),
            ctx.app_id(),
            &api_url,
        );
        self.engine.build(&spec).await
    }
}

fn log_page_failure(failure: &PageFailure) {
    error!(
        "Page {page_id} abandoned: {reason}",
        page_id: failure.page_id.as_str(),
        reason: failure.error.to_string()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::list_archive;
    use crate::models::{Menu, PageContent};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::TempDir;

    struct StaticSettings(Option<SiteSettings>);

    #[async_trait]
    impl SettingsSource for StaticSettings {
        async fn fetch_settings(
            &self,
            _ctx: &RunContext,
            _cancel: &CancellationToken,
        ) -> Result<SiteSettings> {
            self.0.clone().ok_or_else(|| BuildError::HttpStatus {
                url: "http://test/settings".to_string(),
                status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            })
        }
    }

    /// Serves content from a map; missing ids are ContentNotFound
    struct StaticContent(HashMap<String, String>);

    #[async_trait]
    impl ContentSource for StaticContent {
        async fn fetch_page_content(
            &self,
            _ctx: &RunContext,
            page_id: &str,
            _cancel: &CancellationToken,
        ) -> Result<PageContent> {
            let rendered_html =
                self.0
                    .get(page_id)
                    .cloned()
                    .ok_or_else(|| BuildError::ContentNotFound {
                        page_id: page_id.to_string(),
                    })?;
            Ok(PageContent {
                page_id: page_id.to_string(),
                rendered_html,
            })
        }
    }

    /// Never answers; only cancellation ends the call
    struct HangingContent;

    #[async_trait]
    impl ContentSource for HangingContent {
        async fn fetch_page_content(
            &self,
            _ctx: &RunContext,
            page_id: &str,
            cancel: &CancellationToken,
        ) -> Result<PageContent> {
            cancel.cancelled().await;
            Err(BuildError::Cancelled {
                url: format!("pages/{page_id}"),
            })
        }
    }

    fn templates_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../templates")
    }

    fn item(page_id: &str, page_type: &str) -> MenuItem {
        MenuItem {
            page_id: page_id.to_string(),
            title: format!("Title {page_id}"),
            page_type: Some(page_type.to_string()),
        }
    }

    fn settings(items: Vec<MenuItem>) -> SiteSettings {
        SiteSettings {
            menu: Menu { items },
        }
    }

    fn content(ids: &[&str]) -> HashMap<String, String> {
        ids.iter()
            .map(|id| (id.to_string(), format!("<p>page {id}</p>")))
            .collect()
    }

    fn orchestrator(
        output_root: &Path,
        settings: Option<SiteSettings>,
        content: impl ContentSource + 'static,
    ) -> Orchestrator {
        let config = BuilderConfig {
            templates_dir: templates_dir(),
            output_root: output_root.to_path_buf(),
            max_concurrent_pages: 2,
            ..BuilderConfig::default()
        };
        Orchestrator::new(
            config,
            Arc::new(StaticSettings(settings)),
            Arc::new(content),
        )
    }

    fn files_under(dir: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_tracker_enforces_order() {
        let mut tracker = RunTracker::new();
        assert!(tracker.advance(RunState::SettingsFetched).is_err());
        tracker.advance(RunState::ParamsResolved).unwrap();
        tracker.advance(RunState::BuildDirReady).unwrap();
        tracker.fail();
        assert_eq!(tracker.state(), RunState::Failed);
        assert!(tracker.advance(RunState::SettingsFetched).is_err());
    }

    #[tokio::test]
    async fn test_run_generates_three_files_per_html_page() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![
                item("7", "html"),
                item("8", "list"),
                item("9", "html"),
            ])),
            StaticContent(content(&["7", "9"])),
        );

        let report = orch.run("acme", "42").await.unwrap();
        assert_eq!(report.outcome(), RunOutcome::Complete);
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.skipped, 1);
        assert!(report.pages.iter().all(|p| p.files.len() == 3));

        let build_dir = temp.path().join("app_acme_42");
        assert_eq!(
            files_under(&build_dir),
            vec![
                "globalvars/globalvars.ts",
                "page-7/page-7.html",
                "page-7/page-7.module.ts",
                "page-7/page-7.ts",
                "page-9/page-9.html",
                "page-9/page-9.module.ts",
                "page-9/page-9.ts",
            ]
        );

        let html = std::fs::read_to_string(build_dir.join("page-7/page-7.html")).unwrap();
        assert!(html.contains("<p>page 7</p>"));
        assert!(!html.contains("Content goes here"));

        let component = std::fs::read_to_string(build_dir.join("page-9/page-9.ts")).unwrap();
        assert!(component.contains("Page9"));
        assert!(!component.contains("CustomHtmlTemplate"));

        let globals =
            std::fs::read_to_string(build_dir.join("globalvars/globalvars.ts")).unwrap();
        assert!(globals.contains("'42'"));
        assert!(globals.contains("https://myapppresser.com/acme/"));

        assert_eq!(report.archive.path, temp.path().join("app_acme_42.tar.zst"));
        assert_eq!(report.archive.file_count, 7);
    }

    #[tokio::test]
    async fn test_single_page_archive_contents() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("7", "html")])),
            StaticContent(content(&["7"])),
        );

        let report = orch.run("acme", "42").await.unwrap();
        let mut names = list_archive(&report.archive.path).await.unwrap();
        names.sort();
        assert_eq!(
            names,
            vec![
                "app_acme_42/globalvars/globalvars.ts",
                "app_acme_42/page-7/page-7.html",
                "app_acme_42/page-7/page-7.module.ts",
                "app_acme_42/page-7/page-7.ts",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_page_is_isolated() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("1", "html"), item("2", "html")])),
            StaticContent(content(&["1"])),
        );

        let report = orch.run("acme", "42").await.unwrap();
        assert_eq!(report.outcome(), RunOutcome::Partial);
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].page_id, "2");
        assert!(matches!(
            report.failures[0].error,
            BuildError::ContentNotFound { .. }
        ));

        let build_dir = temp.path().join("app_acme_42");
        assert!(build_dir.join("page-1").is_dir());
        assert!(!build_dir.join("page-2").exists());

        let names = list_archive(&report.archive.path).await.unwrap();
        assert!(names.iter().all(|n| !n.contains("page-2")));
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_all_pages_failing_fails_the_run() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("1", "html"), item("2", "html")])),
            StaticContent(HashMap::new()),
        );

        let err = orch.run("acme", "42").await.unwrap_err();
        assert!(matches!(err, BuildError::NoPagesGenerated { expected: 2, .. }));
        assert!(!temp.path().join("app_acme_42.tar.zst").exists());

        let mut failed: Vec<&str> = err
            .page_failures()
            .iter()
            .map(|f| f.page_id.as_str())
            .collect();
        failed.sort_unstable();
        assert_eq!(failed, vec!["1", "2"]);
        assert!(
            err.page_failures()
                .iter()
                .all(|f| matches!(f.error, BuildError::ContentNotFound { .. }))
        );
    }

    #[tokio::test]
    async fn test_no_html_pages_archives_globals_only() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("3", "list")])),
            StaticContent(HashMap::new()),
        );

        let report = orch.run("acme", "42").await.unwrap();
        assert_eq!(report.outcome(), RunOutcome::Complete);
        assert_eq!(
            list_archive(&report.archive.path).await.unwrap(),
            vec!["app_acme_42/globalvars/globalvars.ts"]
        );
    }

    #[tokio::test]
    async fn test_settings_failure_aborts_without_archive() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(temp.path(), None, StaticContent(HashMap::new()));

        let err = orch.run("acme", "42").await.unwrap_err();
        assert!(matches!(err, BuildError::HttpStatus { .. }));
        assert!(!temp.path().join("app_acme_42.tar.zst").exists());
        assert!(files_under(&temp.path().join("app_acme_42")).is_empty());
    }

    #[tokio::test]
    async fn test_missing_identifiers_touch_nothing() {
        let temp = TempDir::new().unwrap();
        let output_root = temp.path().join("builds");
        let orch = orchestrator(
            &output_root,
            Some(settings(vec![item("7", "html")])),
            StaticContent(content(&["7"])),
        );

        assert!(matches!(
            orch.run("", "42").await,
            Err(BuildError::Param { .. })
        ));
        assert!(matches!(
            orch.run("acme", "").await,
            Err(BuildError::Param { .. })
        ));
        assert!(!output_root.exists());
    }

    #[tokio::test]
    async fn test_duplicate_and_invalid_ids_are_rejected() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![
                item("7", "html"),
                item("7", "html"),
                item("../x", "html"),
            ])),
            StaticContent(content(&["7"])),
        );

        let report = orch.run("acme", "42").await.unwrap();
        assert_eq!(report.pages.len(), 1);
        assert_eq!(report.failures.len(), 2);
        assert!(matches!(
            report.failures[0].error,
            BuildError::DuplicatePageId(_)
        ));
        assert!(matches!(
            report.failures[1].error,
            BuildError::InvalidPageId(_)
        ));
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical_and_clears_stale_files() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("7", "html")])),
            StaticContent(content(&["7"])),
        );

        let first = orch.run("acme", "42").await.unwrap();
        let build_dir = temp.path().join("app_acme_42");
        let html_first = std::fs::read(build_dir.join("page-7/page-7.html")).unwrap();
        let archive_first = std::fs::read(&first.archive.path).unwrap();

        // Leftovers from an older run must not survive
        std::fs::create_dir_all(build_dir.join("page-99")).unwrap();
        std::fs::write(build_dir.join("page-99/page-99.html"), "old").unwrap();

        let second = orch.run("acme", "42").await.unwrap();
        let html_second = std::fs::read(build_dir.join("page-7/page-7.html")).unwrap();
        let archive_second = std::fs::read(&second.archive.path).unwrap();

        assert_eq!(html_first, html_second);
        assert_eq!(archive_first, archive_second);
        assert!(!build_dir.join("page-99").exists());
    }

    #[tokio::test]
    async fn test_cancellation_abandons_pages() {
        let temp = TempDir::new().unwrap();
        let orch = orchestrator(
            temp.path(),
            Some(settings(vec![item("1", "html"), item("2", "html")])),
            HangingContent,
        );

        let cancel = orch.cancellation();
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            cancel.cancel();
        });

        let err = orch.run("acme", "42").await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, BuildError::RunCancelled { .. }));
        assert!(!temp.path().join("app_acme_42.tar.zst").exists());

        let failures = err.page_failures();
        assert_eq!(failures.len(), 2);
        assert!(
            failures
                .iter()
                .all(|f| matches!(f.error, BuildError::Cancelled { .. }))
        );
    }

    #[tokio::test]
    async fn test_settings_outage_keeps_previous_archive() {
        let temp = TempDir::new().unwrap();
        let good = orchestrator(
            temp.path(),
            Some(settings(vec![item("7", "html")])),
            StaticContent(content(&["7"])),
        );
        let report = good.run("acme", "42").await.unwrap();
        let archive_before = std::fs::read(&report.archive.path).unwrap();

        let outage = orchestrator(temp.path(), None, StaticContent(HashMap::new()));
        assert!(outage.run("acme", "42").await.is_err());

        let archive_after = std::fs::read(temp.path().join("app_acme_42.tar.zst")).unwrap();
        assert_eq!(archive_before, archive_after);
    }
}
