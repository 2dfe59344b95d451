//! End-to-end canonical build from a raw CVAT area

use dataset::{
    build_dataset, delete_dataset, summarize_dataset, CertIdSplitter, DatasetError, DatasetSplit,
    RatioSplitPolicy,
};
use shared::DatasetLayout;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CERTIFICATES: [&str; 4] = ["00000005", "00000008", "00000026", "00000016"];

fn write_card(raw: &Path, task: &str, certificate: &str) {
    let dir = raw.join(task).join("default");
    fs::create_dir_all(&dir).unwrap();
    for face in ["front", "back"] {
        let stem = format!("RG123456789-+{}-+{}_laser", certificate, face);
        fs::write(dir.join(format!("{}.png", stem)), b"png").unwrap();
        fs::write(dir.join(format!("{}.xml", stem)), "<annotation/>").unwrap();
    }
}

fn splitter() -> CertIdSplitter {
    CertIdSplitter::new(RatioSplitPolicy::new(0.8, 0.1, 0.1).unwrap(), 42)
}

fn setup() -> (TempDir, DatasetLayout) {
    let tmp = TempDir::new().unwrap();
    let layout = DatasetLayout::new(tmp.path().join("repo"));
    write_card(&layout.cvat_raw(), "task_10", CERTIFICATES[0]);
    write_card(&layout.cvat_raw(), "task_10", CERTIFICATES[1]);
    write_card(&layout.cvat_raw(), "task_11", CERTIFICATES[2]);
    write_card(&layout.cvat_raw(), "task_11", CERTIFICATES[3]);
    (tmp, layout)
}

#[test]
fn test_build_writes_canonical_layout() {
    let (_tmp, layout) = setup();

    let canonical = build_dataset(&layout, &splitter()).unwrap();
    assert_eq!(canonical, layout.canonical());

    assert_eq!(fs::read_to_string(layout.tasks_file()).unwrap(), "task_10\ntask_11");
    assert_eq!(fs::read_dir(layout.records()).unwrap().count(), 16);

    let val = fs::read_to_string(layout.split_file("val")).unwrap();
    assert_eq!(
        val,
        "RG123456789-+00000008-+back_laser\nRG123456789-+00000008-+front_laser"
    );

    let summary = summarize_dataset(&layout).unwrap();
    assert_eq!(summary.tasks.len(), 2);
    assert_eq!(summary.count(DatasetSplit::Train), 4);
    assert_eq!(summary.count(DatasetSplit::Val), 2);
    assert_eq!(summary.count(DatasetSplit::Test), 2);
}

#[test]
fn test_second_build_is_refused_until_deleted() {
    let (_tmp, layout) = setup();
    build_dataset(&layout, &splitter()).unwrap();
    let first_train = fs::read_to_string(layout.split_file("train")).unwrap();

    let err = build_dataset(&layout, &splitter()).unwrap_err();
    assert!(matches!(err, DatasetError::DirectoryNotEmpty(_)));

    delete_dataset(&layout).unwrap();
    build_dataset(&layout, &splitter()).unwrap();
    assert_eq!(fs::read_to_string(layout.split_file("train")).unwrap(), first_train);
}
