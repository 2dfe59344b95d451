//! Split assignment - deterministic train/val/test membership
//!
//! A record's split is derived from a hash of a key (its stem, or the card's
//! certificate id) and a seed, so rebuilding the dataset from the same raw
//! data always reproduces the same splits.

use crate::error::{DatasetError, Result};
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::{Record, SplitSettings, SplitStrategy};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;

/// Which partition of the dataset a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetSplit {
    Train,
    Val,
    Test,
}

impl DatasetSplit {
    pub const ALL: [DatasetSplit; 3] = [DatasetSplit::Train, DatasetSplit::Val, DatasetSplit::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetSplit::Train => "train",
            DatasetSplit::Val => "val",
            DatasetSplit::Test => "test",
        }
    }
}

impl fmt::Display for DatasetSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A position in `[0, 1)` that a policy maps onto a split
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct SplitScore(f64);

impl SplitScore {
    pub fn new(score: f64) -> Result<Self> {
        if (0.0..1.0).contains(&score) {
            Ok(Self(score))
        } else {
            Err(DatasetError::InvalidScore(score))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Maps a score onto a split
pub trait SplitPolicy: Send + Sync {
    fn split(&self, score: SplitScore) -> DatasetSplit;
}

/// Cut `[0, 1)` into consecutive train, val and test ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatioSplitPolicy {
    train: f64,
    val: f64,
    test: f64,
}

impl RatioSplitPolicy {
    pub fn new(train: f64, val: f64, test: f64) -> Result<Self> {
        if train < 0.0 || val < 0.0 || test < 0.0 {
            return Err(DatasetError::NegativeRatio { train, val, test });
        }
        let total = train + val + test;
        if (total - 1.0).abs() >= 1e-9 {
            return Err(DatasetError::InvalidRatioSum(total));
        }
        Ok(Self { train, val, test })
    }

    pub fn ratios(&self) -> (f64, f64, f64) {
        (self.train, self.val, self.test)
    }
}

impl SplitPolicy for RatioSplitPolicy {
    fn split(&self, score: SplitScore) -> DatasetSplit {
        let score = score.value();
        if score < self.train {
            DatasetSplit::Train
        } else if score < self.train + self.val {
            DatasetSplit::Val
        } else {
            DatasetSplit::Test
        }
    }
}

/// First byte of `SHA-256("<seed>:<key>")`
pub fn compute_first_hash_byte(key: &str, seed: u64) -> u8 {
    let digest = Sha256::digest(format!("{}:{}", seed, key).as_bytes());
    digest[0]
}

/// Hash score of a key, `first_byte / 256`
pub fn compute_hash_score(key: &str, seed: u64) -> SplitScore {
    SplitScore(f64::from(compute_first_hash_byte(key, seed)) / 256.0)
}

/// Assigns records to splits
pub trait Splitter: Send + Sync {
    fn split(&self, record: &Record) -> Result<DatasetSplit>;

    /// Group records by split; every split is present in the result
    fn split_records(&self, records: &[Record]) -> Result<BTreeMap<DatasetSplit, Vec<Record>>> {
        let mut splits: BTreeMap<DatasetSplit, Vec<Record>> =
            DatasetSplit::ALL.iter().map(|s| (*s, Vec::new())).collect();

        for record in records {
            let split = self.split(record)?;
            splits.entry(split).or_default().push(record.clone());
        }

        Ok(splits)
    }
}

/// Splits on a hash of the record stem
pub struct HashSplitter {
    policy: Box<dyn SplitPolicy>,
    seed: u64,
}

impl HashSplitter {
    pub fn new(policy: impl SplitPolicy + 'static, seed: u64) -> Self {
        Self {
            policy: Box::new(policy),
            seed,
        }
    }
}

impl Splitter for HashSplitter {
    fn split(&self, record: &Record) -> Result<DatasetSplit> {
        Ok(self.policy.split(compute_hash_score(record.stem(), self.seed)))
    }
}

/// Splits on a hash of the card's certificate id
///
/// Front and back scans of the same card always share a split, which keeps
/// a card from leaking between train and evaluation data.
pub struct CertIdSplitter {
    policy: Box<dyn SplitPolicy>,
    seed: u64,
}

impl CertIdSplitter {
    pub fn new(policy: impl SplitPolicy + 'static, seed: u64) -> Self {
        Self {
            policy: Box::new(policy),
            seed,
        }
    }
}

impl Splitter for CertIdSplitter {
    fn split(&self, record: &Record) -> Result<DatasetSplit> {
        let identity = extract_card_identity(record.stem())?;
        Ok(self
            .policy
            .split(compute_hash_score(&identity.certificate_id, self.seed)))
    }
}

/// Explicit stem -> split assignment
#[derive(Debug, Clone, Default)]
pub struct StaticSplitter {
    mapping: HashMap<String, DatasetSplit>,
}

impl StaticSplitter {
    pub fn new(mapping: HashMap<String, DatasetSplit>) -> Self {
        Self { mapping }
    }
}

impl Splitter for StaticSplitter {
    fn split(&self, record: &Record) -> Result<DatasetSplit> {
        self.mapping
            .get(record.stem())
            .copied()
            .ok_or_else(|| DatasetError::MissingAssignment(record.stem().to_string()))
    }
}

/// Build the splitter described by the `datasets.splits` config section
pub fn splitter_from_settings(settings: &SplitSettings) -> Result<Box<dyn Splitter>> {
    let policy = RatioSplitPolicy::new(settings.train, settings.val, settings.test)?;
    Ok(match settings.strategy {
        SplitStrategy::CertId => Box::new(CertIdSplitter::new(policy, settings.seed)),
        SplitStrategy::Stem => Box::new(HashSplitter::new(policy, settings.seed)),
    })
}

// ============================================================================
// Card identity
// ============================================================================

/// Which face of the card was scanned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Front,
    Back,
}

/// Identity encoded in a card scan stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardIdentity {
    pub order_id: String,
    pub certificate_id: String,
    pub orientation: Orientation,
}

static CARD_STEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(RG\d{9})(?:_part\d+)?-\+(\d{8})-\+(front|back)_laser$")
        .expect("valid card stem regex")
});

/// Parse `RG<order>[_part<N>]-+<certificate>-+<front|back>_laser`
pub fn extract_card_identity(stem: &str) -> Result<CardIdentity> {
    let caps = CARD_STEM_RE
        .captures(stem)
        .ok_or_else(|| DatasetError::InvalidCardStem(stem.to_string()))?;

    let orientation = match &caps[3] {
        "front" => Orientation::Front,
        _ => Orientation::Back,
    };

    Ok(CardIdentity {
        order_id: caps[1].to_string(),
        certificate_id: caps[2].to_string(),
        orientation,
    })
}
