//! Read a built canonical dataset back into counts

use crate::error::{DatasetError, Result};
use crate::splits::DatasetSplit;
use serde::Serialize;
use shared::DatasetLayout;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Task and per-split record counts of a canonical dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub tasks: Vec<String>,
    pub split_counts: BTreeMap<DatasetSplit, usize>,
}

impl DatasetSummary {
    pub fn total_records(&self) -> usize {
        self.split_counts.values().sum()
    }

    pub fn count(&self, split: DatasetSplit) -> usize {
        self.split_counts.get(&split).copied().unwrap_or(0)
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(DatasetError::io(path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Summarize `canonical/` from `tasks.txt` and the split files
pub fn summarize_dataset(layout: &DatasetLayout) -> Result<DatasetSummary> {
    let canonical = layout.canonical();
    if !canonical.is_dir() {
        return Err(DatasetError::NotBuilt(canonical));
    }

    let tasks = read_lines(&layout.tasks_file())?;
    let mut split_counts = BTreeMap::new();
    for split in DatasetSplit::ALL {
        let stems = read_lines(&layout.split_file(split.as_str()))?;
        split_counts.insert(split, stems.len());
    }

    Ok(DatasetSummary { tasks, split_counts })
}
