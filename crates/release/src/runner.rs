//! Executing workflows against `dvc` and `git`

use crate::error::{ReleaseError, Result};
use crate::workflow::{ExternalCommand, StepAction, Workflow};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs external commands on behalf of a workflow
pub trait CommandRunner {
    /// Run `command` in `cwd`; a non-zero exit is an error
    fn run(&mut self, command: &ExternalCommand, cwd: &Path) -> Result<CommandOutput>;
}

/// Spawns the real programs from `PATH`
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&mut self, command: &ExternalCommand, cwd: &Path) -> Result<CommandOutput> {
        debug!("Running `{}` in {}", command, cwd.display());

        let output = Command::new(command.tool.program())
            .args(&command.args)
            .current_dir(cwd)
            .output()
            .map_err(|source| ReleaseError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(ReleaseError::CommandFailed {
                command: command.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

/// Records commands instead of running them
#[derive(Debug, Default)]
pub struct DryRunRunner {
    commands: Vec<ExternalCommand>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[ExternalCommand] {
        &self.commands
    }
}

impl CommandRunner for DryRunRunner {
    fn run(&mut self, command: &ExternalCommand, cwd: &Path) -> Result<CommandOutput> {
        info!("[dry-run] {} (in {})", command, cwd.display());
        self.commands.push(command.clone());
        Ok(CommandOutput::default())
    }
}

/// What a workflow run did and what is left for a human
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowOutcome {
    pub executed: Vec<ExternalCommand>,
    /// Manual instructions, in step order
    pub pending: Vec<String>,
}

/// Run every step of `workflow` in `cwd`, stopping at the first failure
pub fn execute_workflow(
    workflow: &Workflow,
    runner: &mut dyn CommandRunner,
    cwd: &Path,
) -> Result<WorkflowOutcome> {
    info!("Running {} workflow in {}", workflow.kind, cwd.display());
    let mut outcome = WorkflowOutcome::default();

    for step in &workflow.steps {
        info!("Step {}/{}: {}", step.number, workflow.steps.len(), step.description);

        for action in &step.actions {
            match action {
                StepAction::Run(command) => {
                    runner
                        .run(command, cwd)
                        .map_err(|source| ReleaseError::StepFailed {
                            step: step.number,
                            description: step.description.clone(),
                            source: Box::new(source),
                        })?;
                    outcome.executed.push(command.clone());
                }
                StepAction::Manual(instruction) => {
                    outcome.pending.push(instruction.clone());
                }
            }
        }
    }

    Ok(outcome)
}
