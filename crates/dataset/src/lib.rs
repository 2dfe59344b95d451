//! # pokedata dataset
//!
//! Turns raw CVAT exports into the canonical dataset:
//!
//! ```text
//! cvat_raw/ --records_from_cvat_raw--> [Record]
//!           --plan_dataset-----------> DatasetPlan { [RecordPlan] }
//!           --execute_dataset_plan---> canonical/
//! ```

mod build;
mod error;
mod splits;
mod summary;

pub use build::{
    build_dataset, delete_dataset, execute_dataset_plan, find_duplicate_filenames, plan_dataset,
    records_from_cvat_raw, DatasetPlan, RecordPlan,
};
pub use error::{DatasetError, Result};
pub use splits::{
    compute_first_hash_byte, compute_hash_score, extract_card_identity, splitter_from_settings,
    CardIdentity, CertIdSplitter, DatasetSplit, HashSplitter, Orientation, RatioSplitPolicy,
    SplitPolicy, SplitScore, Splitter, StaticSplitter,
};
pub use summary::{summarize_dataset, DatasetSummary};
