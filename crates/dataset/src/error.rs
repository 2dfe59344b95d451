//! Error types for dataset builds

use std::path::PathBuf;
use thiserror::Error;

fn display_groups(groups: &[Vec<PathBuf>]) -> String {
    groups
        .iter()
        .map(|group| {
            let paths: Vec<String> = group.iter().map(|p| p.display().to_string()).collect();
            format!("[{}]", paths.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Raised when splitting or building a dataset fails
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Duplicate images found: {}", display_groups(.0))]
    DuplicateImages(Vec<Vec<PathBuf>>),

    #[error("Duplicate annotations found: {}", display_groups(.0))]
    DuplicateAnnotations(Vec<Vec<PathBuf>>),

    #[error("Mismatched images/annotations. Missing images: {missing_images:?}, Missing annotations: {missing_annotations:?}")]
    MismatchedPairs {
        missing_images: Vec<String>,
        missing_annotations: Vec<String>,
    },

    #[error("Invalid task name: {task_name} for {}", image_path.display())]
    InvalidTaskName { task_name: String, image_path: PathBuf },

    #[error("Directory is not empty: {}\nRefusing to build into a non-empty directory.\nDelete it explicitly or use a new dataset root.", .0.display())]
    DirectoryNotEmpty(PathBuf),

    #[error("Dataset plan writes {} more than once", .0.display())]
    DuplicateDestination(PathBuf),

    #[error("No canonical dataset at {}", .0.display())]
    NotBuilt(PathBuf),

    #[error("SplitScore must be in [0, 1), got {0}")]
    InvalidScore(f64),

    #[error("Split ratios must sum to 1.0, got {0}")]
    InvalidRatioSum(f64),

    #[error("Split ratios must be non-negative, got train={train} val={val} test={test}")]
    NegativeRatio { train: f64, val: f64, test: f64 },

    #[error("No split assigned for stem '{0}'")]
    MissingAssignment(String),

    #[error("Invalid card stem '{0}': expected RG<9 digits>[_part<N>]-+<8 digits>-+<front|back>_laser")]
    InvalidCardStem(String),

    #[error(transparent)]
    Record(#[from] shared::RecordError),

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to scan directory: {0}")]
    Scan(#[from] glob::GlobError),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
