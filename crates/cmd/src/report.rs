// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Human-readable run summary printed on stdout

use appbundle::{PageFailure, RunOutcome, RunReport};

/// One line per generated or failed page, then the archive line and a verdict
pub fn render_report(report: &RunReport) -> String {
    let ctx = &report.context;
    let mut out = format!(
        "Site {} app {}: {}\n",
        ctx.site_name(),
        ctx.app_id(),
        ctx.build_dir().display()
    );

    for page in &report.pages {
        out.push_str(&format!(
            "  ok    page {} ({}): {} files\n",
            page.page_id,
            page.title,
            page.files.len()
        ));
    }
    out.push_str(&render_failures(&report.failures));
    if report.skipped > 0 {
        out.push_str(&format!(
            "  {} non-html menu items skipped\n",
            report.skipped
        ));
    }

    let archive = &report.archive;
    out.push_str(&format!(
        "Archive: {} ({} files, {} bytes, {} compressed)\n",
        archive.path.display(),
        archive.file_count,
        archive.uncompressed_size,
        archive.compressed_size
    ));

    let verdict = match report.outcome() {
        RunOutcome::Complete => format!("Complete: {} pages\n", report.pages.len()),
        RunOutcome::Partial => format!(
            "Partial: {} of {} pages failed\n",
            report.failures.len(),
            report.pages.len() + report.failures.len()
        ),
    };
    out.push_str(&verdict);
    out
}

/// One line per failed page, with the reason
pub fn render_failures(failures: &[PageFailure]) -> String {
    failures
        .iter()
        .map(|failure| {
            format!(
                "  FAIL  page {} ({}): {}\n",
                failure.page_id, failure.title, failure.error
            )
        })
        .collect()
}

pub fn render_entries(entries: &[String]) -> String {
    let mut out = format!("Archive entries ({}):\n", entries.len());
    for entry in entries {
        out.push_str("  ");
        out.push_str(entry);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use appbundle::{ArchiveDescriptor, BuildError, GeneratedPage, RunContext};
    use std::path::PathBuf;

    fn report(failures: Vec<PageFailure>) -> RunReport {
        let context = RunContext::new("acme", "42", "builds").unwrap();
        RunReport {
            archive: ArchiveDescriptor {
                basename: context.build_dir_name(),
                path: context.archive_path(),
                file_count: 4,
                uncompressed_size: 2048,
                compressed_size: 512,
            },
            pages: vec![GeneratedPage {
                page_id: "7".to_string(),
                title: "About".to_string(),
                directory: context.build_dir().join("page-7"),
                files: vec![
                    PathBuf::from("page-7.html"),
                    PathBuf::from("page-7.module.ts"),
                    PathBuf::from("page-7.ts"),
                ],
            }],
            context,
            failures,
            skipped: 1,
        }
    }

    #[test]
    fn test_complete_summary() {
        let text = render_report(&report(vec![]));
        assert!(text.contains("page 7 (About): 3 files"));
        assert!(text.contains("1 non-html menu items skipped"));
        assert!(text.contains("app_acme_42.tar.zst"));
        assert!(text.ends_with("Complete: 1 pages\n"));
    }

    #[test]
    fn test_partial_summary_names_failures() {
        let text = render_report(&report(vec![PageFailure {
            page_id: "2".to_string(),
            title: "Two".to_string(),
            error: BuildError::ContentNotFound {
                page_id: "2".to_string(),
            },
        }]));
        assert!(text.contains("FAIL  page 2 (Two): No content found for page id 2"));
        assert!(text.ends_with("Partial: 1 of 2 pages failed\n"));
    }

    #[test]
    fn test_failures_of_a_run_without_archive() {
        let err = BuildError::NoPagesGenerated {
            expected: 1,
            failures: vec![PageFailure {
                page_id: "3".to_string(),
                title: "Three".to_string(),
                error: BuildError::ContentNotFound {
                    page_id: "3".to_string(),
                },
            }],
        };
        assert_eq!(
            render_failures(err.page_failures()),
            "  FAIL  page 3 (Three): No content found for page id 3\n"
        );

        let cancelled = BuildError::RunCancelled { failures: vec![] };
        assert_eq!(render_failures(cancelled.page_failures()), "");
    }

    #[test]
    fn test_render_entries() {
        let entries = vec!["app_acme_42/globalvars/globalvars.ts".to_string()];
        assert_eq!(
            render_entries(&entries),
            "Archive entries (1):\n  app_acme_42/globalvars/globalvars.ts\n"
        );
    }
}
