//! On-disk layout of a dataset repository

use std::path::{Path, PathBuf};

/// Paths inside a dataset repository
///
/// ```text
/// <dataset_repo>/
///   cvat_raw/             downloaded CVAT exports, one task_<id>/ per task
///   canonical/            tracked by DVC
///     tasks.txt
///     records/            images + annotations, flat
///     splits/<split>.txt  one stem per line
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    dataset_repo: PathBuf,
}

impl DatasetLayout {
    pub fn new(dataset_repo: impl Into<PathBuf>) -> Self {
        Self {
            dataset_repo: dataset_repo.into(),
        }
    }

    pub fn dataset_repo(&self) -> &Path {
        &self.dataset_repo
    }

    pub fn cvat_raw(&self) -> PathBuf {
        self.dataset_repo.join("cvat_raw")
    }

    pub fn canonical(&self) -> PathBuf {
        self.dataset_repo.join("canonical")
    }

    pub fn records(&self) -> PathBuf {
        self.canonical().join("records")
    }

    pub fn splits(&self) -> PathBuf {
        self.canonical().join("splits")
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.canonical().join("tasks.txt")
    }

    /// Stem list for one split, e.g. `splits/train.txt`
    pub fn split_file(&self, split_name: &str) -> PathBuf {
        self.splits().join(format!("{}.txt", split_name))
    }
}
