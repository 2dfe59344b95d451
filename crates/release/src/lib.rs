//! # pokedata release
//!
//! The canonical dataset is versioned with DVC and referenced from git.
//! This crate owns the conventions that tie the two together and the
//! command sequences that apply them:
//!
//! - `convention`: semver, dataset names, commit subjects, `data/v<semver>` tags
//! - `workflow`:   the init and update command sequences as data
//! - `runner`:     executing those sequences against real `dvc`/`git`
//! - `lint`:       checking existing history against the conventions
//! - `notes`:      drafting release notes for the manual release step

mod convention;
mod error;
mod lint;
mod notes;
mod runner;
mod workflow;

pub use convention::{CommitConvention, DatasetName, ReleaseTag, Semver};
pub use error::{ReleaseError, Result};
pub use lint::{
    claims_convention, lint_commit_subject, lint_history, lint_log, lint_tag, Check, FindingKind,
    LintFinding, LintReport,
};
pub use notes::ReleaseNotes;
pub use runner::{
    execute_workflow, CommandOutput, CommandRunner, DryRunRunner, ProcessRunner, WorkflowOutcome,
};
pub use workflow::{
    init_workflow, update_workflow, ExternalCommand, InitRequest, StepAction, Tool, UpdateRequest,
    Workflow, WorkflowKind, WorkflowStep,
};
