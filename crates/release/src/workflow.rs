//! Init and update workflows as ordered command sequences
//!
//! A workflow is plain data. Nothing here spawns a process; see
//! [`crate::runner`] for that.

use crate::convention::{CommitConvention, DatasetName, ReleaseTag, Semver};
use crate::error::{ReleaseError, Result};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// External program a step invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Dvc,
    Git,
}

impl Tool {
    pub fn program(&self) -> &'static str {
        match self {
            Tool::Dvc => "dvc",
            Tool::Git => "git",
        }
    }
}

/// A single `dvc ...` or `git ...` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub tool: Tool,
    pub args: Vec<String>,
}

impl ExternalCommand {
    pub fn dvc<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool: Tool::Dvc,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tool: Tool::Git,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    fn git_commit(subject: &CommitConvention) -> Self {
        Self::git(["commit".to_string(), "-m".to_string(), subject.to_string()])
    }

    /// Value following `flag` in the arguments, e.g. the `-m` message
    pub fn arg_after(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ExternalCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool.program())?;
        for arg in &self.args {
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    Run(ExternalCommand),
    /// Instruction for a human, e.g. publishing the release
    Manual(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStep {
    /// 1-based position in the workflow
    pub number: usize,
    pub description: String,
    pub actions: Vec<StepAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Init,
    Update,
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowKind::Init => f.write_str("init"),
            WorkflowKind::Update => f.write_str("update"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub kind: WorkflowKind,
    pub steps: Vec<WorkflowStep>,
}

impl Workflow {
    fn new(kind: WorkflowKind, steps: Vec<(String, Vec<StepAction>)>) -> Self {
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(i, (description, actions))| WorkflowStep {
                number: i + 1,
                description,
                actions,
            })
            .collect();
        Self { kind, steps }
    }

    /// Every external command, in execution order
    pub fn commands(&self) -> impl Iterator<Item = &ExternalCommand> {
        self.steps.iter().flat_map(|s| &s.actions).filter_map(|a| match a {
            StepAction::Run(command) => Some(command),
            StepAction::Manual(_) => None,
        })
    }

    /// Messages passed to `git commit -m`
    pub fn commit_messages(&self) -> Vec<&str> {
        self.commands()
            .filter(|c| c.tool == Tool::Git && c.args.first().map(String::as_str) == Some("commit"))
            .filter_map(|c| c.arg_after("-m"))
            .collect()
    }

    /// Names of tags created with `git tag`
    pub fn tags(&self) -> Vec<&str> {
        self.commands()
            .filter(|c| c.tool == Tool::Git && c.args.first().map(String::as_str) == Some("tag"))
            .filter_map(|c| c.args.iter().skip(1).find(|a| !a.starts_with('-')))
            .map(String::as_str)
            .collect()
    }
}

/// Parameters for tracking a dataset in a repository for the first time
#[derive(Debug, Clone)]
pub struct InitRequest {
    pub dataset_name: DatasetName,
    pub version: Semver,
    /// Dataset directory relative to the repository root
    pub data_dir: PathBuf,
    pub remote_name: String,
    pub remote_url: String,
}

/// Parameters for publishing a new version of an already tracked dataset
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub data_dir: PathBuf,
    pub version: Semver,
}

/// Paths git needs to stage after `dvc add <data_dir>`
struct TrackedPaths {
    data_dir: String,
    pointer: String,
    gitignore: String,
}

impl TrackedPaths {
    fn new(data_dir: &Path) -> Result<Self> {
        let normal = data_dir
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        let has_name = data_dir.components().any(|c| matches!(c, Component::Normal(_)));
        if !normal || !has_name {
            return Err(ReleaseError::InvalidDataDir(data_dir.to_path_buf()));
        }

        let data_dir_str = data_dir.to_string_lossy().trim_end_matches('/').to_string();
        let gitignore = match data_dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                parent.join(".gitignore").to_string_lossy().into_owned()
            }
            _ => ".gitignore".to_string(),
        };

        Ok(Self {
            pointer: format!("{}.dvc", data_dir_str),
            data_dir: data_dir_str,
            gitignore,
        })
    }

    fn dvc_add(&self) -> StepAction {
        StepAction::Run(ExternalCommand::dvc(["add", self.data_dir.as_str()]))
    }

    fn git_add(&self) -> StepAction {
        StepAction::Run(ExternalCommand::git([
            "add",
            self.pointer.as_str(),
            self.gitignore.as_str(),
        ]))
    }
}

fn run(command: ExternalCommand) -> StepAction {
    StepAction::Run(command)
}

/// Steps to publish a new version of an already tracked dataset
pub fn update_workflow(request: &UpdateRequest) -> Result<Workflow> {
    let paths = TrackedPaths::new(&request.data_dir)?;
    let subject = CommitConvention::DataRelease {
        version: request.version.clone(),
    };

    Ok(Workflow::new(
        WorkflowKind::Update,
        vec![
            (
                format!("Stage {} with DVC", paths.data_dir),
                vec![paths.dvc_add()],
            ),
            (
                "Push data to the DVC remote".to_string(),
                vec![run(ExternalCommand::dvc(["push"]))],
            ),
            (
                "Commit the DVC pointer files".to_string(),
                vec![paths.git_add(), run(ExternalCommand::git_commit(&subject))],
            ),
            (
                "Push git history".to_string(),
                vec![run(ExternalCommand::git(["push"]))],
            ),
            (
                "Publish the release".to_string(),
                vec![StepAction::Manual(format!(
                    "Create release {} in the hosting UI and paste the release notes \
                     (pokedata release notes --version {})",
                    ReleaseTag::new(request.version.clone()),
                    request.version
                ))],
            ),
        ],
    ))
}

/// Steps to set up DVC, its remote and the first canonical version
pub fn init_workflow(request: &InitRequest) -> Result<Workflow> {
    let paths = TrackedPaths::new(&request.data_dir)?;
    if request.remote_url.trim().is_empty() {
        return Err(ReleaseError::MissingRemote);
    }

    let canonical = CommitConvention::Canonical {
        dataset: request.dataset_name.clone(),
        version: request.version.clone(),
    };
    let tag = ReleaseTag::new(request.version.clone());

    Ok(Workflow::new(
        WorkflowKind::Init,
        vec![
            (
                "Initialise DVC".to_string(),
                vec![
                    run(ExternalCommand::dvc(["init"])),
                    run(ExternalCommand::git(["add", ".dvc", ".dvcignore"])),
                    run(ExternalCommand::git_commit(&CommitConvention::DvcInit)),
                ],
            ),
            (
                format!("Configure remote '{}'", request.remote_name),
                vec![
                    run(ExternalCommand::dvc([
                        "remote",
                        "add",
                        "-d",
                        request.remote_name.as_str(),
                        request.remote_url.as_str(),
                    ])),
                    run(ExternalCommand::git(["add", ".dvc/config"])),
                    run(ExternalCommand::git_commit(&CommitConvention::DvcAddRemote)),
                ],
            ),
            (
                format!("Track {} as {}", paths.data_dir, request.dataset_name),
                vec![
                    paths.dvc_add(),
                    paths.git_add(),
                    run(ExternalCommand::git_commit(&canonical)),
                ],
            ),
            (
                "Push data to the DVC remote".to_string(),
                vec![run(ExternalCommand::dvc(["push"]))],
            ),
            (
                format!("Tag {}", tag),
                vec![run(ExternalCommand::git([
                    "tag".to_string(),
                    "-a".to_string(),
                    tag.name(),
                    "-m".to_string(),
                    tag.message(&request.dataset_name),
                ]))],
            ),
        ],
    ))
}
