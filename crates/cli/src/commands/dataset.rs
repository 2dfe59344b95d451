//! pokedata dataset commands

use crate::context::CliContext;
use anyhow::{bail, Context};
use clap::{Args, Subcommand};
use console::style;
use dataset::{build_dataset, delete_dataset, splitter_from_settings, summarize_dataset, DatasetSplit};
use dialoguer::Confirm;
use tracing::info;

#[derive(Debug, Args)]
pub struct DatasetCommand {
    #[command(subcommand)]
    pub command: DatasetSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum DatasetSubcommand {
    /// Build the canonical dataset from cvat_raw/
    Build,
    /// Delete the canonical dataset and build it again
    Rebuild {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show task and split counts of the canonical dataset
    Summary {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl DatasetCommand {
    pub fn run(&self, ctx: &CliContext) -> anyhow::Result<()> {
        match &self.command {
            DatasetSubcommand::Build => build(ctx),
            DatasetSubcommand::Rebuild { yes } => {
                let canonical = ctx.layout.canonical();
                let confirmed = *yes
                    || Confirm::new()
                        .with_prompt(format!(
                            "Are you sure you want to delete the previous dataset at {}?",
                            canonical.display()
                        ))
                        .default(false)
                        .interact()?;
                if !confirmed {
                    bail!("Aborted");
                }

                info!("Deleting previous dataset {}", canonical.display());
                delete_dataset(&ctx.layout).context("Dataset error")?;
                build(ctx)
            }
            DatasetSubcommand::Summary { json } => summary(ctx, *json),
        }
    }
}

fn build(ctx: &CliContext) -> anyhow::Result<()> {
    let splits = &ctx.settings.datasets.splits;
    info!("Splitter seed: {}", splits.seed);
    let splitter = splitter_from_settings(splits).context("Dataset error")?;

    info!("Building dataset {}", ctx.layout.canonical().display());
    let canonical = build_dataset(&ctx.layout, splitter.as_ref()).context("Dataset error")?;

    println!("{} Dataset built at: {}", style("✓").green(), canonical.display());
    Ok(())
}

fn summary(ctx: &CliContext, json: bool) -> anyhow::Result<()> {
    let summary = summarize_dataset(&ctx.layout).context("Dataset error")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", style(ctx.layout.canonical().display()).bold());
    println!("  tasks: {}", summary.tasks.len());
    for split in DatasetSplit::ALL {
        println!("  {:<5}  {}", split.as_str(), summary.count(split));
    }
    println!("  total  {}", summary.total_records());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn context(tmp: &TempDir) -> CliContext {
        test_context(
            tmp.path(),
            &format!(
                "datasets:\n  dataset_repo: '{}'\n  splits:\n    strategy: stem\n",
                tmp.path().join("repo").display()
            ),
        )
    }

    fn write_pair(raw: &Path, task: &str, stem: &str) {
        let dir = raw.join(task).join("default");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.png", stem)), b"png").unwrap();
        fs::write(dir.join(format!("{}.xml", stem)), "<annotation/>").unwrap();
    }

    fn run(ctx: &CliContext, command: DatasetSubcommand) -> anyhow::Result<()> {
        DatasetCommand { command }.run(ctx)
    }

    #[test]
    fn test_build_then_summary() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        write_pair(&ctx.layout.cvat_raw(), "task_1", "test_image_0");
        write_pair(&ctx.layout.cvat_raw(), "task_2", "test_image_5");

        run(&ctx, DatasetSubcommand::Build).unwrap();
        run(&ctx, DatasetSubcommand::Summary { json: true }).unwrap();

        let summary = summarize_dataset(&ctx.layout).unwrap();
        assert_eq!(summary.tasks, ["task_1", "task_2"]);
        assert_eq!(summary.total_records(), 2);
    }

    #[test]
    fn test_build_twice_is_refused() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        write_pair(&ctx.layout.cvat_raw(), "task_1", "test_image_0");

        run(&ctx, DatasetSubcommand::Build).unwrap();
        let err = run(&ctx, DatasetSubcommand::Build).unwrap_err();

        assert!(format!("{:#}", err).starts_with("Dataset error: Directory is not empty"));
    }

    #[test]
    fn test_rebuild_with_yes_replaces_previous_dataset() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);
        write_pair(&ctx.layout.cvat_raw(), "task_1", "test_image_0");
        run(&ctx, DatasetSubcommand::Build).unwrap();

        let stale = ctx.layout.records().join("stale.png");
        fs::write(&stale, b"old").unwrap();
        write_pair(&ctx.layout.cvat_raw(), "task_1", "test_image_3");

        run(&ctx, DatasetSubcommand::Rebuild { yes: true }).unwrap();

        assert!(!stale.exists());
        assert!(ctx.layout.records().join("test_image_3.png").exists());
        assert_eq!(summarize_dataset(&ctx.layout).unwrap().total_records(), 2);
    }

    #[test]
    fn test_summary_before_build() {
        let tmp = TempDir::new().unwrap();
        let ctx = context(&tmp);

        let err = run(&ctx, DatasetSubcommand::Summary { json: false }).unwrap_err();
        assert!(format!("{:#}", err).starts_with("Dataset error: No canonical dataset"));
    }
}
