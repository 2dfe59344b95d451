//! Canonical dataset build
//!
//! Records are discovered in the raw CVAT area, turned into a `DatasetPlan`
//! (one `RecordPlan` per record) and the plan is executed into
//! `canonical/`. Planning touches no files; execution only ever writes into
//! an empty `canonical/` directory.

use crate::error::{DatasetError, Result};
use crate::splits::{DatasetSplit, Splitter};
use indicatif::{ProgressBar, ProgressStyle};
use shared::{DatasetLayout, Record};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const IMAGE_EXTENSION: &str = "png";
const ANNOTATION_EXTENSION: &str = "xml";
const TASK_PREFIX: &str = "task_";

/// How one record is copied into the canonical dataset
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordPlan {
    pub stem: String,
    pub src_image: PathBuf,
    pub src_annotation: PathBuf,
    pub dst_image: PathBuf,
    pub dst_annotation: PathBuf,
    pub split: DatasetSplit,
}

/// The full, immutable description of one canonical dataset build
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPlan {
    layout: DatasetLayout,
    tasks: Vec<String>,
    record_copies: Vec<RecordPlan>,
}

impl DatasetPlan {
    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// CVAT task directory names, sorted
    pub fn tasks(&self) -> &[String] {
        &self.tasks
    }

    pub fn record_copies(&self) -> &[RecordPlan] {
        &self.record_copies
    }

    /// Record plans grouped by split; every split is present
    pub fn by_split(&self) -> BTreeMap<DatasetSplit, Vec<&RecordPlan>> {
        let mut splits: BTreeMap<DatasetSplit, Vec<&RecordPlan>> =
            DatasetSplit::ALL.iter().map(|s| (*s, Vec::new())).collect();
        for record_copy in &self.record_copies {
            splits.entry(record_copy.split).or_default().push(record_copy);
        }
        splits
    }
}

/// Groups of paths that share a file name
pub fn find_duplicate_filenames(paths: &[PathBuf]) -> Vec<Vec<PathBuf>> {
    let mut by_name: BTreeMap<&std::ffi::OsStr, Vec<PathBuf>> = BTreeMap::new();

    for path in paths {
        if let Some(name) = path.file_name() {
            by_name.entry(name).or_default().push(path.clone());
        }
    }

    by_name
        .into_values()
        .filter(|group| group.len() > 1)
        .collect()
}

fn find_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Task directory that holds an image: `<raw>/task_<id>/<subset>/<image>`
fn task_name_of(image_path: &Path) -> Result<String> {
    let task_name = image_path
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if !task_name.starts_with(TASK_PREFIX) {
        return Err(DatasetError::InvalidTaskName {
            task_name,
            image_path: image_path.to_path_buf(),
        });
    }
    Ok(task_name)
}

/// Discover records in the raw CVAT export area
///
/// Every `.png` must have exactly one `.xml` with the same stem and vice
/// versa, file names must be unique across tasks, and every image must live
/// two levels below a `task_*` directory. Records come back sorted by stem.
pub fn records_from_cvat_raw(dataset_path: &Path) -> Result<(Vec<Record>, BTreeSet<String>)> {
    let image_paths = find_files(dataset_path, IMAGE_EXTENSION)?;
    let annotation_paths = find_files(dataset_path, ANNOTATION_EXTENSION)?;
    debug!(
        "Found {} images and {} annotations under {}",
        image_paths.len(),
        annotation_paths.len(),
        dataset_path.display()
    );

    let duplicates = find_duplicate_filenames(&image_paths);
    if !duplicates.is_empty() {
        return Err(DatasetError::DuplicateImages(duplicates));
    }
    let duplicates = find_duplicate_filenames(&annotation_paths);
    if !duplicates.is_empty() {
        return Err(DatasetError::DuplicateAnnotations(duplicates));
    }

    let stem2image: BTreeMap<String, PathBuf> =
        image_paths.into_iter().map(|p| (stem_of(&p), p)).collect();
    let mut stem2annotation: BTreeMap<String, PathBuf> =
        annotation_paths.into_iter().map(|p| (stem_of(&p), p)).collect();

    let missing_images: Vec<String> = stem2annotation
        .keys()
        .filter(|stem| !stem2image.contains_key(*stem))
        .cloned()
        .collect();
    let missing_annotations: Vec<String> = stem2image
        .keys()
        .filter(|stem| !stem2annotation.contains_key(*stem))
        .cloned()
        .collect();
    if !missing_images.is_empty() || !missing_annotations.is_empty() {
        return Err(DatasetError::MismatchedPairs {
            missing_images,
            missing_annotations,
        });
    }

    let mut tasks = BTreeSet::new();
    let mut records = Vec::with_capacity(stem2image.len());
    for (stem, image_path) in stem2image {
        let Some(annotation_path) = stem2annotation.remove(&stem) else {
            continue;
        };
        tasks.insert(task_name_of(&image_path)?);
        records.push(Record::new(image_path, annotation_path)?);
    }

    Ok((records, tasks))
}

/// Remove the canonical dataset; a missing directory is not an error
pub fn delete_dataset(layout: &DatasetLayout) -> Result<()> {
    let canonical = layout.canonical();
    match fs::remove_dir_all(&canonical) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DatasetError::io(canonical)(e)),
    }
}

fn ensure_empty_directory(directory: &Path) -> Result<()> {
    if !directory.exists() {
        return Ok(());
    }
    let mut entries = fs::read_dir(directory).map_err(DatasetError::io(directory))?;
    if entries.next().is_some() {
        return Err(DatasetError::DirectoryNotEmpty(directory.to_path_buf()));
    }
    Ok(())
}

/// Plan a dataset build without touching the filesystem
pub fn plan_dataset(
    records: &[Record],
    tasks: impl IntoIterator<Item = String>,
    layout: &DatasetLayout,
    splitter: &dyn Splitter,
) -> Result<DatasetPlan> {
    let records_dir = layout.records();
    let mut destinations = HashSet::new();
    let mut record_copies = Vec::with_capacity(records.len());

    for record in records {
        let dst_image = records_dir.join(record.image_path().file_name().unwrap_or_default());
        let dst_annotation =
            records_dir.join(record.annotation_path().file_name().unwrap_or_default());

        for dst in [&dst_image, &dst_annotation] {
            if !destinations.insert(dst.clone()) {
                return Err(DatasetError::DuplicateDestination(dst.clone()));
            }
        }

        record_copies.push(RecordPlan {
            stem: record.stem().to_string(),
            src_image: record.image_path().to_path_buf(),
            src_annotation: record.annotation_path().to_path_buf(),
            dst_image,
            dst_annotation,
            split: splitter.split(record)?,
        });
    }

    let mut tasks: Vec<String> = tasks.into_iter().collect();
    tasks.sort();
    tasks.dedup();

    Ok(DatasetPlan {
        layout: layout.clone(),
        tasks,
        record_copies,
    })
}

fn copy_progress(len: usize) -> ProgressBar {
    let progress = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
        progress.set_style(style);
    }
    progress
}

fn write_lines<'a>(path: &Path, lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let content = lines.into_iter().collect::<Vec<_>>().join("\n");
    fs::write(path, content).map_err(DatasetError::io(path))
}

/// Execute a plan into an empty or missing `canonical/` and return its path
pub fn execute_dataset_plan(plan: &DatasetPlan) -> Result<PathBuf> {
    let layout = plan.layout();
    let canonical = layout.canonical();
    ensure_empty_directory(&canonical)?;
    fs::create_dir_all(&canonical).map_err(DatasetError::io(&canonical))?;

    info!("Found {} tasks", plan.tasks().len());
    write_lines(&layout.tasks_file(), plan.tasks().iter().map(String::as_str))?;

    let records_dir = layout.records();
    info!(
        "Copying {} records to {}",
        plan.record_copies().len(),
        records_dir.display()
    );
    fs::create_dir_all(&records_dir).map_err(DatasetError::io(&records_dir))?;

    let progress = copy_progress(plan.record_copies().len());
    for record_copy in plan.record_copies() {
        progress.set_message(record_copy.stem.clone());
        fs::copy(&record_copy.src_image, &record_copy.dst_image)
            .map_err(DatasetError::io(&record_copy.src_image))?;
        fs::copy(&record_copy.src_annotation, &record_copy.dst_annotation)
            .map_err(DatasetError::io(&record_copy.src_annotation))?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    let splits_dir = layout.splits();
    fs::create_dir_all(&splits_dir).map_err(DatasetError::io(&splits_dir))?;
    for (split, split_records) in plan.by_split() {
        info!("{}: {} records", split, split_records.len());
        write_lines(
            &layout.split_file(split.as_str()),
            split_records.iter().map(|r| r.stem.as_str()),
        )?;
    }

    Ok(canonical)
}

/// Build the canonical dataset from the raw CVAT area
///
/// Refuses to run when `canonical/` already has content; delete it first
/// with [`delete_dataset`] to rebuild.
pub fn build_dataset(layout: &DatasetLayout, splitter: &dyn Splitter) -> Result<PathBuf> {
    ensure_empty_directory(&layout.canonical())?;

    let (records, tasks) = records_from_cvat_raw(&layout.cvat_raw())?;
    let plan = plan_dataset(&records, tasks, layout, splitter)?;
    execute_dataset_plan(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::splits::{HashSplitter, RatioSplitPolicy, StaticSplitter};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn splitter() -> HashSplitter {
        HashSplitter::new(RatioSplitPolicy::new(0.8, 0.1, 0.1).unwrap(), 42)
    }

    /// Write `<raw>/<task>/default/<stem>.{png,xml}`
    fn write_pair(raw: &Path, task: &str, stem: &str, image: bool, annotation: bool) {
        let dir = raw.join(task).join("default");
        fs::create_dir_all(&dir).unwrap();
        if image {
            fs::write(dir.join(format!("{}.png", stem)), b"fake image bytes").unwrap();
        }
        if annotation {
            fs::write(dir.join(format!("{}.xml", stem)), "<annotation/>").unwrap();
        }
    }

    // ============== Discovery Tests ==============

    #[test]
    fn test_records_from_cvat_raw() {
        let tmp = TempDir::new().unwrap();
        write_pair(tmp.path(), "task_2", "test_image_3", true, true);
        write_pair(tmp.path(), "task_1", "test_image_0", true, true);

        let (records, tasks) = records_from_cvat_raw(tmp.path()).unwrap();

        let stems: Vec<_> = records.iter().map(Record::stem).collect();
        assert_eq!(stems, ["test_image_0", "test_image_3"]);
        assert!(records[0].annotation_path().ends_with("task_1/default/test_image_0.xml"));
        assert_eq!(tasks.into_iter().collect::<Vec<_>>(), ["task_1", "task_2"]);
    }

    #[test]
    fn test_records_from_missing_directory_is_empty() {
        let tmp = TempDir::new().unwrap();
        let (records, tasks) = records_from_cvat_raw(&tmp.path().join("nothing")).unwrap();
        assert!(records.is_empty());
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_duplicate_images() {
        let tmp = TempDir::new().unwrap();
        write_pair(tmp.path(), "task_1", "test_image_0", true, true);
        write_pair(tmp.path(), "task_2", "test_image_0", true, false);

        let err = records_from_cvat_raw(tmp.path()).unwrap_err();
        assert!(err.to_string().starts_with("Duplicate images found"));
    }

    #[test]
    fn test_duplicate_annotations() {
        let tmp = TempDir::new().unwrap();
        write_pair(tmp.path(), "task_1", "test_image_0", true, true);
        write_pair(tmp.path(), "task_2", "test_image_0", false, true);

        let err = records_from_cvat_raw(tmp.path()).unwrap_err();
        assert!(err.to_string().starts_with("Duplicate annotations found"));
    }

    #[test]
    fn test_mismatched_pairs() {
        let tmp = TempDir::new().unwrap();
        write_pair(tmp.path(), "task_1", "test_image_0", true, true);
        write_pair(tmp.path(), "task_1", "test_image_3", true, false);
        write_pair(tmp.path(), "task_1", "test_image_4", false, true);

        match records_from_cvat_raw(tmp.path()).unwrap_err() {
            DatasetError::MismatchedPairs {
                missing_images,
                missing_annotations,
            } => {
                assert_eq!(missing_images, ["test_image_4"]);
                assert_eq!(missing_annotations, ["test_image_3"]);
            }
            other => panic!("Expected MismatchedPairs, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_task_name() {
        let tmp = TempDir::new().unwrap();
        write_pair(tmp.path(), "job_1", "test_image_0", true, true);

        let err = records_from_cvat_raw(tmp.path()).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidTaskName { ref task_name, .. } if task_name == "job_1"));
    }

    #[test]
    fn test_find_duplicate_filenames() {
        let paths = vec![
            PathBuf::from("a/x.png"),
            PathBuf::from("b/x.png"),
            PathBuf::from("a/y.png"),
        ];
        let groups = find_duplicate_filenames(&paths);
        assert_eq!(groups, vec![vec![PathBuf::from("a/x.png"), PathBuf::from("b/x.png")]]);
    }

    // ============== Plan Tests ==============

    #[test]
    fn test_plan_dataset() {
        let layout = DatasetLayout::new("repo");
        let records = vec![
            Record::new("raw/task_1/default/test_image_0.png", "raw/task_1/default/test_image_0.xml").unwrap(),
            Record::new("raw/task_1/default/test_image_7.png", "raw/task_1/default/test_image_7.xml").unwrap(),
        ];
        let tasks = vec!["task_1".to_string(), "task_1".to_string()];

        let plan = plan_dataset(&records, tasks, &layout, &splitter()).unwrap();

        assert_eq!(plan.tasks(), ["task_1"]);
        assert_eq!(plan.record_copies().len(), 2);

        let first = &plan.record_copies()[0];
        assert_eq!(first.stem, "test_image_0");
        assert_eq!(first.dst_image, PathBuf::from("repo/canonical/records/test_image_0.png"));
        assert_eq!(first.dst_annotation, PathBuf::from("repo/canonical/records/test_image_0.xml"));
        assert_eq!(first.split, DatasetSplit::Train);
        assert_eq!(plan.record_copies()[1].split, DatasetSplit::Test);

        let by_split = plan.by_split();
        assert_eq!(by_split[&DatasetSplit::Val].len(), 0);
    }

    #[test]
    fn test_plan_dataset_rejects_duplicate_destination() {
        let layout = DatasetLayout::new("repo");
        let records = vec![
            Record::new("a/task_1/d/x.png", "a/task_1/d/x.xml").unwrap(),
            Record::new("b/task_2/d/x.png", "b/task_2/d/x.xml").unwrap(),
        ];
        let err = plan_dataset(&records, Vec::new(), &layout, &splitter()).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateDestination(_)));
    }

    #[test]
    fn test_plan_dataset_propagates_splitter_errors() {
        let layout = DatasetLayout::new("repo");
        let records = vec![Record::new("x.png", "x.xml").unwrap()];
        let splitter = StaticSplitter::new(HashMap::new());
        assert!(plan_dataset(&records, Vec::new(), &layout, &splitter).is_err());
    }

    // ============== Build Tests ==============

    #[test]
    fn test_build_dataset_refuses_non_empty_canonical() {
        let tmp = TempDir::new().unwrap();
        let layout = DatasetLayout::new(tmp.path());
        fs::create_dir_all(layout.canonical()).unwrap();
        fs::write(layout.canonical().join("leftover.txt"), "x").unwrap();

        let err = build_dataset(&layout, &splitter()).unwrap_err();
        assert!(err.to_string().starts_with("Directory is not empty"));
    }

    #[test]
    fn test_build_dataset_into_existing_empty_canonical() {
        let tmp = TempDir::new().unwrap();
        let layout = DatasetLayout::new(tmp.path());
        write_pair(&layout.cvat_raw(), "task_1", "test_image_5", true, true);
        fs::create_dir_all(layout.canonical()).unwrap();

        build_dataset(&layout, &splitter()).unwrap();

        assert_eq!(fs::read_to_string(layout.split_file("val")).unwrap(), "test_image_5");
        assert_eq!(fs::read_to_string(layout.split_file("train")).unwrap(), "");
    }

    #[test]
    fn test_execute_plan_refuses_populated_canonical() {
        let tmp = TempDir::new().unwrap();
        let layout = DatasetLayout::new(tmp.path());
        write_pair(&layout.cvat_raw(), "task_1", "test_image_0", true, true);
        fs::create_dir_all(layout.records()).unwrap();
        fs::write(layout.records().join("stale.png"), b"old").unwrap();

        let (records, tasks) = records_from_cvat_raw(&layout.cvat_raw()).unwrap();
        let plan = plan_dataset(&records, tasks, &layout, &splitter()).unwrap();
        let err = execute_dataset_plan(&plan).unwrap_err();

        assert!(matches!(err, DatasetError::DirectoryNotEmpty(ref dir) if *dir == layout.canonical()));
        assert!(!layout.tasks_file().exists());
        assert!(!layout.records().join("test_image_0.png").exists());
    }

    #[test]
    fn test_delete_dataset() {
        let tmp = TempDir::new().unwrap();
        let layout = DatasetLayout::new(tmp.path());

        delete_dataset(&layout).unwrap();

        fs::create_dir_all(layout.records()).unwrap();
        delete_dataset(&layout).unwrap();
        assert!(!layout.canonical().exists());
    }
}
