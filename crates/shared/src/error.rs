//! Error types for configuration loading and records

use std::path::PathBuf;
use thiserror::Error;

/// Raised when configuration loading or validation fails
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration file must contain a YAML dictionary")]
    NotADictionary,

    #[error("'stages' must be a dictionary")]
    StagesNotADictionary,

    #[error("Stage '{0}' not found")]
    StageNotFound(String),

    #[error("Stage '{0}' configuration must be a dictionary")]
    StageNotADictionary(String),

    #[error("Environment variable '{0}' not found in variables dict.")]
    MissingVariable(String),

    #[error("Environment variable '{name}' not found in variables dict (also tried '{staged}').")]
    MissingStageVariable { name: String, staged: String },

    #[error("Credentials value for {0} have to be a string")]
    CredentialNotString(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Raised when an image and annotation do not form a record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Image and annotation names do not match: {} vs {}", image.display(), annotation.display())]
    StemMismatch { image: PathBuf, annotation: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::NotFound(PathBuf::from("missing.yaml")).to_string(),
            "Configuration file not found: missing.yaml"
        );
        assert_eq!(
            ConfigError::StageNotFound("prod".into()).to_string(),
            "Stage 'prod' not found"
        );
        assert_eq!(
            ConfigError::MissingVariable("CVAT_AUTH".into()).to_string(),
            "Environment variable 'CVAT_AUTH' not found in variables dict."
        );
        assert_eq!(
            ConfigError::MissingStageVariable {
                name: "VAR_NAME".into(),
                staged: "VAR_NAME_DEV".into(),
            }
            .to_string(),
            "Environment variable 'VAR_NAME' not found in variables dict (also tried 'VAR_NAME_DEV')."
        );
        assert_eq!(
            RecordError::StemMismatch {
                image: PathBuf::from("a.png"),
                annotation: PathBuf::from("b.xml"),
            }
            .to_string(),
            "Image and annotation names do not match: a.png vs b.xml"
        );
    }
}
