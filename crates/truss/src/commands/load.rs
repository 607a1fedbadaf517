use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use clap::Parser;
use truss_buildhost::BuildHost;
use truss_conf::Settings;
use truss_solution::HostEvaluator;
use truss_solution::JsonManifest;
use truss_solution::SolutionManifest;
use truss_workspace::NullEngine;
use truss_workspace::Workspace;

use crate::args::GlobalArgs;
use crate::commands::Command;

#[derive(Debug, Parser)]
pub struct Load {
    /// Solution manifest to load
    manifest: Utf8PathBuf,

    /// Evaluator command, overriding the configured one
    #[arg(long)]
    evaluator: Option<String>,
}

impl Command for Load {
    async fn execute(&self, args: &GlobalArgs) -> Result<ExitCode> {
        let root = self
            .manifest
            .parent()
            .unwrap_or_else(|| Utf8Path::new("."));
        let settings = Settings::new(root.as_std_path()).context("failed to load settings")?;
        let manifest = JsonManifest::load(&self.manifest)?;

        let command = self.evaluator.as_deref().unwrap_or_else(|| settings.evaluator());
        let mut host = BuildHost::start(
            command,
            settings.evaluator_args(),
            settings.connect_attempts(),
        )
        .await
        .context("failed to start the build-evaluation host")?;

        let mut workspace = Workspace::new(Arc::new(NullEngine));
        let mut evaluator = HostEvaluator::new(
            host.client(),
            settings.target_framework().map(str::to_string),
        );

        let report = truss_solution::load(
            &manifest,
            &mut evaluator,
            &mut workspace,
            settings.source_extension(),
        )
        .await;

        if !args.quiet {
            println!(
                "{}: {} projects, {} documents",
                manifest.name(),
                workspace.project_count(),
                workspace.document_count()
            );
            for failure in &report.failures {
                println!("error: {}: {}", failure.project, failure.error);
            }
            for reference in &report.reference_errors {
                println!(
                    "error: {}: reference `{}`: {}",
                    reference.project, reference.reference, reference.error
                );
            }
        }

        host.shutdown().await?;

        Ok(if report.is_clean() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
