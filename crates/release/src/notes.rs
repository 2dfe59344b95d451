//! Release notes drafted from a built dataset

use crate::convention::{DatasetName, ReleaseTag, Semver};
use chrono::NaiveDate;
use dataset::{DatasetSplit, DatasetSummary};
use std::fmt::{self, Write};

/// Markdown release notes for the manual publishing step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotes {
    pub title: String,
    pub body: String,
}

impl ReleaseNotes {
    pub fn draft(
        name: &DatasetName,
        version: &Semver,
        summary: &DatasetSummary,
        date: NaiveDate,
    ) -> Self {
        let tag = ReleaseTag::new(version.clone());
        let title = format!("{} canonical dataset v{}", name, version);

        let body = render_body(&tag, summary, date);
        Self { title, body }
    }

    /// Title as a level-one heading followed by the body
    pub fn to_markdown(&self) -> String {
        format!("# {}\n\n{}", self.title, self.body)
    }
}

fn render_body(tag: &ReleaseTag, summary: &DatasetSummary, date: NaiveDate) -> String {
    let mut body = String::new();
    write_body(&mut body, tag, summary, date).expect("writing to a String cannot fail");
    body
}

fn write_body(
    out: &mut String,
    tag: &ReleaseTag,
    summary: &DatasetSummary,
    date: NaiveDate,
) -> fmt::Result {
    writeln!(out, "- Tag: `{}`", tag)?;
    writeln!(out, "- Date: {}", date.format("%Y-%m-%d"))?;
    writeln!(out)?;

    writeln!(out, "## Splits")?;
    writeln!(out)?;
    writeln!(out, "| Split | Records |")?;
    writeln!(out, "|-------|--------:|")?;
    for split in DatasetSplit::ALL {
        writeln!(out, "| {} | {} |", split, summary.count(split))?;
    }
    writeln!(out, "| **total** | **{}** |", summary.total_records())?;
    writeln!(out)?;

    writeln!(out, "## Source tasks ({})", summary.tasks.len())?;
    writeln!(out)?;
    if summary.tasks.is_empty() {
        writeln!(out, "_none_")?;
    }
    for task in &summary.tasks {
        writeln!(out, "- {}", task)?;
    }
    writeln!(out)?;

    writeln!(out, "## Changes")?;
    writeln!(out)?;
    writeln!(out, "- _Describe what changed since the previous release._")?;
    Ok(())
}
