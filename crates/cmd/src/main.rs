// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use appbundle::config::DEFAULT_CONFIG_FILE;
use appbundle::{
    ApiTransport, BuilderConfig, CancellationToken, ContentClient, Orchestrator, RunOutcome,
    SettingsClient, list_archive, load_config,
};
use clap::Parser;

mod report;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "mkpages")]
/// Generate the page bundle for one tenant app and archive it
struct Cli {
    /// Site name, the first path segment of the site API
    site_name: String,

    /// App id, used in the settings URL and the globals file
    app_id: String,

    /// Configuration file (YAML). Defaults to ./mkpages.yaml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the build dir and archive
    #[arg(long)]
    output_root: Option<PathBuf>,

    /// Directory holding the page and globals templates
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// List the archive entries after a successful run
    #[arg(long)]
    verify: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Exit status for a partial build
const EXIT_PARTIAL: u8 = 3;

fn resolve_config(cli: &Cli) -> Result<BuilderConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => load_config(DEFAULT_CONFIG_FILE)
            .with_context(|| format!("Failed to load config {DEFAULT_CONFIG_FILE}"))?,
        None => BuilderConfig::default(),
    };

    if let Some(output_root) = &cli.output_root {
        config.output_root = output_root.clone();
    }
    if let Some(templates_dir) = &cli.templates_dir {
        config.templates_dir = templates_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> Result<RunOutcome> {
    let config = resolve_config(&cli)?;
    let transport = ApiTransport::new(config.api.clone())?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            diagnostics::warn!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(SettingsClient::new(transport.clone())),
        Arc::new(ContentClient::new(transport)),
    )
    .with_cancellation(cancel);

    let report = match orchestrator.run(&cli.site_name, &cli.app_id).await {
        Ok(report) => report,
        Err(e) => {
            print!("{}", report::render_failures(e.page_failures()));
            return Err(e.into());
        }
    };
    print!("{}", report::render_report(&report));

    if cli.verify {
        let entries = list_archive(&report.archive.path).await?;
        print!("{}", report::render_entries(&entries));
    }

    Ok(report.outcome())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    diagnostics::init_with_default(if cli.verbose { "debug" } else { "off" });

    match run(cli).await {
        Ok(outcome) => exit_code(outcome),
        Err(e) => {
            eprintln!("No archive produced: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn exit_code(outcome: RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Complete => ExitCode::SUCCESS,
        RunOutcome::Partial => ExitCode::from(EXIT_PARTIAL),
    }
}
