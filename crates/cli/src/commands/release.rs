//! pokedata release commands

use crate::context::CliContext;
use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use console::style;
use dataset::summarize_dataset;
use release::{
    execute_workflow, init_workflow, lint_history, update_workflow, CommandRunner, DatasetName,
    DryRunRunner, FindingKind, InitRequest, ProcessRunner, ReleaseError, ReleaseNotes, Semver,
    UpdateRequest, Workflow,
};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReleaseCommand {
    #[command(subcommand)]
    pub command: ReleaseSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ReleaseSubcommand {
    /// Set up DVC, the remote and the first canonical version
    Init {
        /// Dataset version, e.g. 1.0.0
        #[arg(long)]
        version: Semver,
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
    },
    /// Publish a new version of the canonical dataset
    Update {
        #[arg(long)]
        version: Semver,
        #[arg(long)]
        dry_run: bool,
    },
    /// Draft Markdown release notes from the built dataset
    Notes {
        #[arg(long)]
        version: Semver,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check commit subjects and data/* tags against the conventions
    Lint {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl ReleaseCommand {
    pub fn run(&self, ctx: &CliContext) -> anyhow::Result<()> {
        match &self.command {
            ReleaseSubcommand::Init { version, dry_run } => {
                let dvc = &ctx.settings.dvc;
                let request = InitRequest {
                    dataset_name: dvc.dataset_name.parse::<DatasetName>()?,
                    version: version.clone(),
                    data_dir: dvc.data_dir.clone(),
                    remote_name: dvc.remote_name.clone(),
                    remote_url: dvc.remote_url.clone().ok_or(ReleaseError::MissingRemote)?,
                };
                run_workflow(ctx, &init_workflow(&request)?, *dry_run)
            }
            ReleaseSubcommand::Update { version, dry_run } => {
                let request = UpdateRequest {
                    data_dir: ctx.settings.dvc.data_dir.clone(),
                    version: version.clone(),
                };
                run_workflow(ctx, &update_workflow(&request)?, *dry_run)
            }
            ReleaseSubcommand::Notes { version, output } => notes(ctx, version, output.as_ref()),
            ReleaseSubcommand::Lint { json } => lint(ctx, *json),
        }
    }
}

fn run_workflow(ctx: &CliContext, workflow: &Workflow, dry_run: bool) -> anyhow::Result<()> {
    let cwd = ctx.layout.dataset_repo();
    let mut process = ProcessRunner;
    let mut dry = DryRunRunner::new();
    let runner: &mut dyn CommandRunner = if dry_run { &mut dry } else { &mut process };

    let outcome = execute_workflow(workflow, runner, cwd).context("Release error")?;

    for command in &outcome.executed {
        let marker = if dry_run { style("»").dim() } else { style("✓").green() };
        println!("{} {}", marker, command);
    }
    for instruction in &outcome.pending {
        println!("{} {}", style("→").yellow(), instruction);
    }
    if !dry_run {
        println!("{} {} workflow completed", style("✓").green(), workflow.kind);
    }
    Ok(())
}

fn notes(ctx: &CliContext, version: &Semver, output: Option<&PathBuf>) -> anyhow::Result<()> {
    let name: DatasetName = ctx.settings.dvc.dataset_name.parse()?;
    let summary = summarize_dataset(&ctx.layout).context("Dataset error")?;
    let today = chrono::Local::now().date_naive();

    let markdown = ReleaseNotes::draft(&name, version, &summary, today).to_markdown();
    match output {
        Some(path) => {
            fs::write(path, &markdown)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} Release notes written to: {}", style("✓").green(), path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

fn lint(ctx: &CliContext, json: bool) -> anyhow::Result<()> {
    let report =
        lint_history(&mut ProcessRunner, ctx.layout.dataset_repo()).context("Release error")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for finding in &report.findings {
            let label = match finding.kind {
                FindingKind::Commit => finding.commit.as_deref().map_or("commit", |c| &c[..c.len().min(8)]),
                FindingKind::Tag => "tag",
            };
            println!("{} {} {}: {}", style("✗").red(), label, finding.subject, finding.reason);
        }
        println!(
            "Checked {} commits ({} conventional) and {} tags",
            report.commits_checked, report.conventional_commits, report.tags_checked
        );
    }

    if !report.is_clean() {
        bail!("{} convention violation(s) found", report.findings.len());
    }
    if !json {
        println!("{} History follows the data conventions", style("✓").green());
    }
    Ok(())
}
