//! pokedata download-task command

use crate::context::CliContext;
use anyhow::Context;
use clap::Args;
use console::style;
use cvat::{CvatClient, DownloadOptions};
use std::fs;
use std::time::Duration;

#[derive(Debug, Args)]
pub struct DownloadTaskCommand {
    /// CVAT task id
    pub task_id: u64,

    /// Annotation format
    #[arg(long, default_value = "LabelMe 3.0")]
    pub format: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

impl DownloadTaskCommand {
    pub fn run(&self, ctx: &CliContext) -> anyhow::Result<()> {
        let cvat = ctx.settings.require_cvat().context("Configuration error")?;

        let output_dir = ctx.layout.cvat_raw();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        let client = CvatClient::new(&cvat.url, &cvat.auth).context("CVAT error")?;
        let options = DownloadOptions {
            format: self.format.clone(),
            timeout: Duration::from_secs(self.timeout),
        };
        let result_path = client
            .download_task(self.task_id, &output_dir, &options)
            .context("CVAT error")?;

        println!(
            "{} Task {} downloaded successfully to: {}",
            style("✓").green(),
            self.task_id,
            result_path.display()
        );
        Ok(())
    }
}
