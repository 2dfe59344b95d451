//! Configuration loading with variable substitution
//!
//! A config file is a YAML mapping. Strings may contain `${NAME}`
//! placeholders that are resolved from a flat credentials file and the
//! process environment, environment first. An optional `stages:` section
//! holds per-environment overlays (`dev`, `prod`, ...) that are deep merged
//! over the base mapping. With a stage selected, `${NAME}` prefers
//! `NAME_<STAGE>` over `NAME`.

use crate::error::{ConfigError, ConfigResult};
use regex::Regex;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Raw configuration mapping
pub type ConfigDict = Mapping;

const STAGES_KEY: &str = "stages";
const STAGE_MARKER_KEY: &str = "_stage";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid placeholder regex"));

/// Load a YAML file and return its top-level mapping as-is
pub fn load_config_structure(path: &Path) -> ConfigResult<ConfigDict> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Err(ConfigError::NotADictionary);
    }

    match serde_yaml::from_str::<Value>(&content)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(ConfigError::NotADictionary),
    }
}

/// Deep merge `override_config` over `base`
///
/// Nested mappings merge key by key; any other value replaces the base value.
pub fn merge_config(base: &ConfigDict, override_config: &ConfigDict) -> ConfigDict {
    let mut result = base.clone();

    for (key, value) in override_config {
        let merged = match (result.get(key), value) {
            (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
                Value::Mapping(merge_config(existing, incoming))
            }
            _ => value.clone(),
        };
        result.insert(key.clone(), merged);
    }

    result
}

/// Overlay `stages.<stage>` on the base config
///
/// The `stages` section is removed from the result and the selected stage is
/// recorded under `_stage`.
pub fn select_stage(config: ConfigDict, stage: &str) -> ConfigResult<ConfigDict> {
    let mut base = config;

    let stage_config = match base.remove(STAGES_KEY) {
        None => return Err(ConfigError::StageNotFound(stage.to_string())),
        Some(Value::Mapping(stages)) => match stages.get(stage) {
            None => return Err(ConfigError::StageNotFound(stage.to_string())),
            Some(Value::Mapping(stage_config)) => stage_config.clone(),
            Some(_) => return Err(ConfigError::StageNotADictionary(stage.to_string())),
        },
        Some(_) => return Err(ConfigError::StagesNotADictionary),
    };

    let mut merged = merge_config(&base, &stage_config);
    merged.insert(Value::from(STAGE_MARKER_KEY), Value::from(stage));
    Ok(merged)
}

/// Replace every `${NAME}` placeholder with `variables[NAME]`
///
/// Recurses through mappings and sequences; non-string scalars pass through.
pub fn substitute_variables(value: Value, variables: &HashMap<String, String>) -> ConfigResult<Value> {
    substitute_stage_variables(value, variables, None)
}

/// Like [`substitute_variables`], but with a stage `${NAME}` first tries
/// `NAME_<STAGE>` (stage upper-cased), then `NAME`
pub fn substitute_stage_variables(
    value: Value,
    variables: &HashMap<String, String>,
    stage: Option<&str>,
) -> ConfigResult<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_str(&s, variables, stage)?)),
        Value::Mapping(mapping) => {
            let mut out = Mapping::with_capacity(mapping.len());
            for (key, value) in mapping {
                out.insert(key, substitute_stage_variables(value, variables, stage)?);
            }
            Ok(Value::Mapping(out))
        }
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| substitute_stage_variables(item, variables, stage))
            .collect::<ConfigResult<Vec<_>>>()
            .map(Value::Sequence),
        Value::Tagged(mut tagged) => {
            tagged.value = substitute_stage_variables(tagged.value, variables, stage)?;
            Ok(Value::Tagged(tagged))
        }
        other => Ok(other),
    }
}

fn lookup<'a>(
    name: &str,
    variables: &'a HashMap<String, String>,
    stage: Option<&str>,
) -> ConfigResult<&'a str> {
    let Some(stage) = stage else {
        return variables
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingVariable(name.to_string()));
    };

    let staged = format!("{}_{}", name, stage.to_uppercase());
    variables
        .get(&staged)
        .or_else(|| variables.get(name))
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingStageVariable {
            name: name.to_string(),
            staged,
        })
}

fn substitute_str(
    input: &str,
    variables: &HashMap<String, String>,
    stage: Option<&str>,
) -> ConfigResult<String> {
    let mut out = String::with_capacity(input.len());
    let mut last = 0;

    for caps in PLACEHOLDER_RE.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let replacement = lookup(name.as_str(), variables, stage)?;
        out.push_str(&input[last..whole.start()]);
        out.push_str(replacement);
        last = whole.end();
    }

    out.push_str(&input[last..]);
    Ok(out)
}

fn key_name(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

/// Load a flat `NAME: value` credentials file
///
/// A missing or unparsable file is not fatal and yields no credentials, but
/// a non-string value is.
fn load_credentials(path: &Path) -> ConfigResult<HashMap<String, String>> {
    let mapping = match load_config_structure(path) {
        Ok(mapping) => mapping,
        Err(e) => {
            tracing::warn!(
                "Failed to load credentials file {}: {}, using only environment variables",
                path.display(),
                e
            );
            return Ok(HashMap::new());
        }
    };

    mapping
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key_name(&key), s)),
            _ => Err(ConfigError::CredentialNotString(key_name(&key))),
        })
        .collect()
}

/// Resolve `${NAME}` placeholders from the credentials file and environment
///
/// Environment variables take precedence over credentials file values. With a
/// stage, `NAME_<STAGE>` takes precedence over `NAME` from either source.
pub fn resolve_config_variables(
    config: ConfigDict,
    credentials_path: Option<&Path>,
    stage: Option<&str>,
) -> ConfigResult<ConfigDict> {
    let mut variables = match credentials_path {
        Some(path) => load_credentials(path)?,
        None => HashMap::new(),
    };
    variables.extend(std::env::vars());

    match substitute_stage_variables(Value::Mapping(config), &variables, stage)? {
        Value::Mapping(mapping) => Ok(mapping),
        _ => Err(ConfigError::NotADictionary),
    }
}

/// Load a config file, select an optional stage, then resolve variables
///
/// Stage selection happens first so placeholders in unused stages never
/// need a value.
pub fn load_config(
    config_path: &Path,
    credentials_path: Option<&Path>,
    stage: Option<&str>,
) -> ConfigResult<ConfigDict> {
    let mut config = load_config_structure(config_path)?;
    if let Some(stage) = stage {
        config = select_stage(config, stage)?;
    }
    resolve_config_variables(config, credentials_path, stage)
}

// ============================================================================
// Typed settings
// ============================================================================

/// Typed view over a resolved configuration mapping
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// CVAT server access, only needed for downloads
    #[serde(default)]
    pub cvat: Option<CvatSettings>,

    pub datasets: DatasetSettings,

    #[serde(default)]
    pub dvc: DvcSettings,
}

impl Settings {
    /// Deserialize settings from a resolved config mapping
    pub fn from_config(config: &ConfigDict) -> ConfigResult<Self> {
        serde_yaml::from_value(Value::Mapping(config.clone()))
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Replace the dataset repository directory
    pub fn with_dataset_repo(mut self, dataset_repo: impl Into<PathBuf>) -> Self {
        self.datasets.dataset_repo = dataset_repo.into();
        self
    }

    /// CVAT settings, or an error naming the missing section
    pub fn require_cvat(&self) -> ConfigResult<&CvatSettings> {
        self.cvat
            .as_ref()
            .ok_or_else(|| ConfigError::Invalid("missing 'cvat' section".to_string()))
    }
}

/// CVAT server settings
#[derive(Debug, Clone, Deserialize)]
pub struct CvatSettings {
    /// API base URL, e.g. `https://cvat.example.com/api/v1`
    pub url: String,
    /// Full `Authorization` header value
    pub auth: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    pub dataset_repo: PathBuf,

    #[serde(default)]
    pub splits: SplitSettings,
}

/// Which key a record is hashed on when assigning splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Hash the certificate id so both faces of a card share a split
    #[default]
    CertId,
    /// Hash the full file stem
    Stem,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    pub train: f64,
    pub val: f64,
    pub test: f64,
    pub seed: u64,
    pub strategy: SplitStrategy,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            train: 0.8,
            val: 0.1,
            test: 0.1,
            seed: 42,
            strategy: SplitStrategy::default(),
        }
    }
}

/// DVC tracking settings, paths relative to the dataset repository
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DvcSettings {
    pub dataset_name: String,
    pub data_dir: PathBuf,
    pub remote_name: String,
    pub remote_url: Option<String>,
}

impl Default for DvcSettings {
    fn default() -> Self {
        Self {
            dataset_name: "canonical".to_string(),
            data_dir: PathBuf::from("canonical"),
            remote_name: "storage".to_string(),
            remote_url: None,
        }
    }
}
