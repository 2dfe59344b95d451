//! Naming conventions shared by DVC commits and git tags
//!
//! | What                     | Form                                         |
//! |--------------------------|----------------------------------------------|
//! | DVC initialisation       | `chore(dvc): init`                           |
//! | Remote configuration     | `chore(dvc): add remote`                     |
//! | First canonical version  | `data(<dataset-name>): canonical v<semver>`  |
//! | Later dataset updates    | `data releases v<semver>`                    |
//! | Release tag              | `data/v<semver>`                             |

use crate::error::{ReleaseError, Result};
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static SEMVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)",
        r"(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?",
        r"(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
    ))
    .expect("valid semver regex")
});

static DATASET_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid dataset name regex"));

static CANONICAL_COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data\(([^)]*)\): canonical v(\S+)$").expect("valid commit regex"));

static RELEASE_COMMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data releases v(\S+)$").expect("valid commit regex"));

const DVC_INIT_SUBJECT: &str = "chore(dvc): init";
const DVC_ADD_REMOTE_SUBJECT: &str = "chore(dvc): add remote";
const TAG_PREFIX: &str = "data/v";

// ============================================================================
// Semver
// ============================================================================

/// A semantic version, `MAJOR.MINOR.PATCH[-pre][+build]`
///
/// Only parseable versions can be constructed, so `to_string` always parses
/// back to an equal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Semver {
    major: u64,
    minor: u64,
    patch: u64,
    pre: Option<String>,
    build: Option<String>,
}

impl Semver {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
            build: None,
        }
    }

    /// Replace the pre-release part, e.g. `rc.1`
    pub fn with_pre(self, pre: &str) -> Result<Self> {
        Self {
            pre: Some(pre.to_string()),
            ..self
        }
        .to_string()
        .parse()
    }

    /// Replace the build metadata, e.g. `20240517`
    pub fn with_build(self, build: &str) -> Result<Self> {
        Self {
            build: Some(build.to_string()),
            ..self
        }
        .to_string()
        .parse()
    }

    pub fn major(&self) -> u64 {
        self.major
    }

    pub fn minor(&self) -> u64 {
        self.minor
    }

    pub fn patch(&self) -> u64 {
        self.patch
    }

    pub fn pre(&self) -> Option<&str> {
        self.pre.as_deref()
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }
}

impl FromStr for Semver {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReleaseError::InvalidVersion(s.to_string());
        let caps = SEMVER_RE.captures(s).ok_or_else(invalid)?;
        let number = |i: usize| caps[i].parse::<u64>().map_err(|_| invalid());

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            pre: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }
}

impl fmt::Display for Semver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{}", pre)?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{}", build)?;
        }
        Ok(())
    }
}

// ============================================================================
// Dataset name
// ============================================================================

/// Name of a tracked dataset, as used in `data(<name>): ...` subjects
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DatasetName(String);

impl DatasetName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DatasetName {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        if DATASET_NAME_RE.is_match(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(ReleaseError::InvalidDatasetName(s.to_string()))
        }
    }
}

impl fmt::Display for DatasetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Commit subjects
// ============================================================================

/// Commit subjects used by the dataset workflows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommitConvention {
    /// `chore(dvc): init`
    DvcInit,
    /// `chore(dvc): add remote`
    DvcAddRemote,
    /// `data(<dataset>): canonical v<version>`
    Canonical { dataset: DatasetName, version: Semver },
    /// `data releases v<version>`
    DataRelease { version: Semver },
}

impl CommitConvention {
    /// Version carried by the subject, if any
    pub fn version(&self) -> Option<&Semver> {
        match self {
            CommitConvention::Canonical { version, .. } | CommitConvention::DataRelease { version } => {
                Some(version)
            }
            CommitConvention::DvcInit | CommitConvention::DvcAddRemote => None,
        }
    }
}

impl fmt::Display for CommitConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitConvention::DvcInit => f.write_str(DVC_INIT_SUBJECT),
            CommitConvention::DvcAddRemote => f.write_str(DVC_ADD_REMOTE_SUBJECT),
            CommitConvention::Canonical { dataset, version } => {
                write!(f, "data({}): canonical v{}", dataset, version)
            }
            CommitConvention::DataRelease { version } => write!(f, "data releases v{}", version),
        }
    }
}

impl FromStr for CommitConvention {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        if s == DVC_INIT_SUBJECT {
            return Ok(CommitConvention::DvcInit);
        }
        if s == DVC_ADD_REMOTE_SUBJECT {
            return Ok(CommitConvention::DvcAddRemote);
        }
        if let Some(caps) = CANONICAL_COMMIT_RE.captures(s) {
            return Ok(CommitConvention::Canonical {
                dataset: caps[1].parse()?,
                version: caps[2].parse()?,
            });
        }
        if let Some(caps) = RELEASE_COMMIT_RE.captures(s) {
            return Ok(CommitConvention::DataRelease {
                version: caps[1].parse()?,
            });
        }
        Err(ReleaseError::UnknownCommitMessage(s.to_string()))
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Annotated release tag `data/v<semver>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseTag {
    pub version: Semver,
}

impl ReleaseTag {
    pub fn new(version: Semver) -> Self {
        Self { version }
    }

    pub fn name(&self) -> String {
        format!("{}{}", TAG_PREFIX, self.version)
    }

    /// Annotation message describing the tagged dataset version
    pub fn message(&self, dataset: &DatasetName) -> String {
        format!("{} canonical dataset v{}", dataset, self.version)
    }
}

impl fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for ReleaseTag {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        let version = s
            .strip_prefix(TAG_PREFIX)
            .ok_or_else(|| ReleaseError::InvalidTag(s.to_string()))?;
        let version = version
            .parse()
            .map_err(|_| ReleaseError::InvalidTag(s.to_string()))?;
        Ok(Self { version })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Semver {
        s.parse().unwrap()
    }

    // ============== Semver Tests ==============

    #[test]
    fn test_semver_parse() {
        assert_eq!(v("1.2.3"), Semver::new(1, 2, 3));

        let version = v("2.0.0-rc.1+build.5");
        assert_eq!(version.pre(), Some("rc.1"));
        assert_eq!(version.build(), Some("build.5"));
        assert_eq!((version.major(), version.minor(), version.patch()), (2, 0, 0));
        assert_eq!(version.to_string(), "2.0.0-rc.1+build.5");
    }

    #[test]
    fn test_semver_rejects_malformed() {
        for s in ["1.2", "v1.2.3", "01.2.3", "1.2.3-", "1.2.x", "", "1.2.3 "] {
            assert!(
                matches!(s.parse::<Semver>(), Err(ReleaseError::InvalidVersion(_))),
                "{:?}",
                s
            );
        }
        assert!("99999999999999999999.0.0".parse::<Semver>().is_err());
    }

    #[test]
    fn test_constructed_semver_round_trips() {
        let version = Semver::new(1, 0, 0)
            .with_pre("rc.1")
            .unwrap()
            .with_build("exp.sha.5114f85")
            .unwrap();
        assert_eq!(version.to_string().parse::<Semver>().unwrap(), version);

        let subject = CommitConvention::DataRelease { version: version.clone() };
        assert_eq!(subject.to_string().parse::<CommitConvention>().unwrap(), subject);
    }

    #[test]
    fn test_constructed_semver_rejects_invalid_parts() {
        for pre in ["01", "", "rc..1", "rc 1"] {
            assert!(
                matches!(Semver::new(1, 0, 0).with_pre(pre), Err(ReleaseError::InvalidVersion(_))),
                "{:?}",
                pre
            );
        }
        assert!(Semver::new(1, 0, 0).with_build("a+b").is_err());
        assert!(Semver::new(1, 0, 0).with_build("").is_err());
    }

    // ============== Dataset Name Tests ==============

    #[test]
    fn test_dataset_name() {
        assert_eq!("cards-v2".parse::<DatasetName>().unwrap().as_str(), "cards-v2");
        assert!("pokemon_cards.laser".parse::<DatasetName>().is_ok());

        for s in ["", "-cards", "cards v2", "cards)"] {
            assert!(s.parse::<DatasetName>().is_err(), "{:?}", s);
        }
    }

    // ============== Commit Convention Tests ==============

    #[test]
    fn test_commit_render() {
        let name: DatasetName = "cards".parse().unwrap();
        assert_eq!(CommitConvention::DvcInit.to_string(), "chore(dvc): init");
        assert_eq!(CommitConvention::DvcAddRemote.to_string(), "chore(dvc): add remote");
        assert_eq!(
            CommitConvention::Canonical {
                dataset: name,
                version: v("1.0.0")
            }
            .to_string(),
            "data(cards): canonical v1.0.0"
        );
        assert_eq!(
            CommitConvention::DataRelease { version: v("1.1.0") }.to_string(),
            "data releases v1.1.0"
        );
    }

    #[test]
    fn test_commit_parse() {
        assert_eq!(
            "chore(dvc): init".parse::<CommitConvention>().unwrap(),
            CommitConvention::DvcInit
        );
        assert_eq!(
            "data releases v1.4.2".parse::<CommitConvention>().unwrap().version(),
            Some(&v("1.4.2"))
        );
        match "data(cards): canonical v1.0.0".parse::<CommitConvention>().unwrap() {
            CommitConvention::Canonical { dataset, version } => {
                assert_eq!(dataset.as_str(), "cards");
                assert_eq!(version, v("1.0.0"));
            }
            other => panic!("Expected Canonical, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_parse_rejects_near_misses() {
        assert!(matches!(
            "data release v1.0.0".parse::<CommitConvention>(),
            Err(ReleaseError::UnknownCommitMessage(_))
        ));
        assert!(matches!(
            "data releases v1.0".parse::<CommitConvention>(),
            Err(ReleaseError::InvalidVersion(_))
        ));
        assert!(matches!(
            "data(): canonical v1.0.0".parse::<CommitConvention>(),
            Err(ReleaseError::InvalidDatasetName(_))
        ));
        assert!("chore(dvc): init remote".parse::<CommitConvention>().is_err());
        assert!("data releases 1.0.0".parse::<CommitConvention>().is_err());
    }

    // ============== Tag Tests ==============

    #[test]
    fn test_release_tag() {
        let tag = ReleaseTag::new(v("1.2.0"));
        assert_eq!(tag.name(), "data/v1.2.0");
        assert_eq!(
            tag.message(&"cards".parse().unwrap()),
            "cards canonical dataset v1.2.0"
        );
        assert_eq!("data/v1.2.0".parse::<ReleaseTag>().unwrap(), tag);
    }

    #[test]
    fn test_release_tag_rejects_malformed() {
        for s in ["v1.2.0", "data/1.2.0", "data/v1.2", "data/v1.2.0/extra"] {
            assert!(
                matches!(s.parse::<ReleaseTag>(), Err(ReleaseError::InvalidTag(_))),
                "{:?}",
                s
            );
        }
    }
}
