//! Checking commit subjects and tags against the data conventions

use crate::convention::{CommitConvention, ReleaseTag};
use crate::error::{ReleaseError, Result};
use crate::runner::CommandRunner;
use crate::workflow::ExternalCommand;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

const COMMIT_PREFIXES: [&str; 3] = ["data(", "data releases", "chore(dvc)"];
const TAG_PREFIX: &str = "data/";
const FIELD_SEPARATOR: char = '\u{1f}';

/// Result of checking one subject or tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check<T> {
    /// Not a data commit or tag; ignored
    OutOfScope,
    Conforms(T),
    /// Claims the convention but does not follow it
    Violates(String),
}

/// Whether a commit subject is meant to follow a data convention
pub fn claims_convention(subject: &str) -> bool {
    COMMIT_PREFIXES.iter().any(|p| subject.starts_with(p))
}

pub fn lint_commit_subject(subject: &str) -> Check<CommitConvention> {
    if !claims_convention(subject) {
        return Check::OutOfScope;
    }
    match subject.parse() {
        Ok(convention) => Check::Conforms(convention),
        Err(e) => Check::Violates(e.to_string()),
    }
}

pub fn lint_tag(tag: &str) -> Check<ReleaseTag> {
    if !tag.starts_with(TAG_PREFIX) {
        return Check::OutOfScope;
    }
    match tag.parse() {
        Ok(tag) => Check::Conforms(tag),
        Err(e) => Check::Violates(e.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingKind {
    Commit,
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    pub kind: FindingKind,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LintReport {
    pub commits_checked: usize,
    /// Commits that claim and follow a convention
    pub conventional_commits: usize,
    pub tags_checked: usize,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Lint `(hash, subject)` pairs and tag names
pub fn lint_log(commits: &[(String, String)], tags: &[String]) -> LintReport {
    let mut report = LintReport {
        commits_checked: commits.len(),
        tags_checked: tags.len(),
        ..LintReport::default()
    };

    for (hash, subject) in commits {
        match lint_commit_subject(subject) {
            Check::OutOfScope => {}
            Check::Conforms(_) => report.conventional_commits += 1,
            Check::Violates(reason) => report.findings.push(LintFinding {
                kind: FindingKind::Commit,
                subject: subject.clone(),
                commit: Some(hash.clone()),
                reason,
            }),
        }
    }

    for tag in tags {
        if let Check::Violates(reason) = lint_tag(tag) {
            report.findings.push(LintFinding {
                kind: FindingKind::Tag,
                subject: tag.clone(),
                commit: None,
                reason,
            });
        }
    }

    report
}

fn parse_log(stdout: &str) -> Vec<(String, String)> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(FIELD_SEPARATOR))
        .map(|(hash, subject)| (hash.to_string(), subject.to_string()))
        .collect()
}

/// Whether HEAD points at a commit; `git log` fails on an unborn branch
fn has_commits(runner: &mut dyn CommandRunner, cwd: &Path) -> Result<bool> {
    match runner.run(&ExternalCommand::git(["rev-parse", "--verify", "-q", "HEAD"]), cwd) {
        Ok(_) => Ok(true),
        Err(ReleaseError::CommandFailed { code: Some(1), .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Read commit subjects and `data/*` tags from the repository at `cwd` and lint them
pub fn lint_history(runner: &mut dyn CommandRunner, cwd: &Path) -> Result<LintReport> {
    let commits = if has_commits(runner, cwd)? {
        let log = runner.run(&ExternalCommand::git(["log", "--format=%H%x1f%s"]), cwd)?;
        parse_log(&log.stdout)
    } else {
        debug!("HEAD has no commits yet");
        Vec::new()
    };
    debug!("Read {} commits", commits.len());

    let tags = runner.run(&ExternalCommand::git(["tag", "--list", "data/*"]), cwd)?;
    let tags: Vec<String> = tags
        .stdout
        .lines()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    let report = lint_log(&commits, &tags);
    info!(
        "Checked {} commits and {} tags: {} finding(s)",
        report.commits_checked,
        report.tags_checked,
        report.findings.len()
    );
    Ok(report)
}
