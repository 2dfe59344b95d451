//! Global options and the state every command receives

use anyhow::Context;
use clap::Args;
use shared::{load_config, DatasetLayout, Settings};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Path to config file
    #[arg(long = "config", global = true, default_value = "config.yaml")]
    pub config_path: PathBuf,

    /// Path to secrets file
    #[arg(long = "secrets", global = true, default_value = "secrets.yaml")]
    pub secrets_path: PathBuf,

    /// Config stage to apply, e.g. dev or prod
    #[arg(long, global = true)]
    pub stage: Option<String>,

    /// Dataset repository directory (overrides config)
    #[arg(long, global = true)]
    pub dataset_repo: Option<PathBuf>,
}

/// Loaded settings and the dataset layout they point at
#[derive(Debug)]
pub struct CliContext {
    pub settings: Settings,
    pub layout: DatasetLayout,
}

impl CliContext {
    pub fn load(args: &GlobalArgs) -> anyhow::Result<Self> {
        let config = load_config(
            &args.config_path,
            Some(args.secrets_path.as_path()),
            args.stage.as_deref(),
        )
        .context("Configuration error")?;

        let mut settings = Settings::from_config(&config).context("Configuration error")?;
        if let Some(dataset_repo) = &args.dataset_repo {
            settings = settings.with_dataset_repo(dataset_repo);
        }
        debug!("Dataset repository: {}", settings.datasets.dataset_repo.display());

        let layout = DatasetLayout::new(settings.datasets.dataset_repo.clone());
        Ok(Self { settings, layout })
    }
}

/// Context loaded from a `config.yaml` written into `dir`
#[cfg(test)]
pub(crate) fn test_context(dir: &std::path::Path, config: &str) -> CliContext {
    let config_path = dir.join("config.yaml");
    std::fs::write(&config_path, config).unwrap();
    CliContext::load(&GlobalArgs {
        config_path,
        secrets_path: dir.join("secrets.yaml"),
        stage: None,
        dataset_repo: None,
    })
    .unwrap()
}
