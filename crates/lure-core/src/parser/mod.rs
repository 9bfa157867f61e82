//! Parsers for Lustre counter files.
//!
//! Both parsers are best-effort: each line yields a [`LineOutcome`], and a
//! skipped line never affects its neighbours. Pure functions of their input.

pub mod flat;
pub mod jobs;

pub use flat::{parse_flat, parse_flat_line, parse_flat_report};
pub use jobs::{MIN_JOB_STATS_LEN, parse_job_line, parse_jobs, parse_jobs_report};

/// Timestamp keys Lustre interleaves with counters.
const METADATA_KEYS: &[&str] = &["snapshot_time", "start_time", "elapsed_time"];

fn is_metadata(name: &str) -> bool {
    METADATA_KEYS.contains(&name)
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Counter { name: String, value: u64 },
    Skip(SkipReason),
}

/// Why a line produced no counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Empty or whitespace-only line.
    Blank,
    /// Timestamp line, not a counter.
    Metadata,
    /// Job record line without a `name:` separator.
    MissingSeparator,
    /// The value field the counter's policy selects is not there.
    MissingField { wanted: usize, found: usize },
    /// Braced job record without the labelled field the policy selects.
    MissingLabel(&'static str),
    /// The selected field is not an unsigned integer.
    NotNumeric(String),
    /// Job group header without a job id.
    MissingJobId,
}

impl SkipReason {
    /// Blank and metadata lines are part of the format, not malformed input.
    pub fn is_expected(&self) -> bool {
        matches!(self, SkipReason::Blank | SkipReason::Metadata)
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Blank => write!(f, "blank line"),
            SkipReason::Metadata => write!(f, "metadata line"),
            SkipReason::MissingSeparator => write!(f, "missing ':' after counter name"),
            SkipReason::MissingField { wanted, found } => {
                write!(f, "needs field {} but line has {}", wanted, found)
            }
            SkipReason::MissingLabel(label) => write!(f, "record has no '{}' field", label),
            SkipReason::NotNumeric(token) => write!(f, "'{}' is not a counter value", token),
            SkipReason::MissingJobId => write!(f, "job header without job id"),
        }
    }
}

/// A malformed line that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    /// 1-based line number within the file.
    pub line: usize,
    pub reason: SkipReason,
}

/// Parsed value plus the malformed lines that were skipped to get it.
///
/// Blank and metadata lines are not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseReport<T> {
    pub parsed: T,
    pub skipped: Vec<Skipped>,
}

fn parse_value(token: &str) -> Result<u64, SkipReason> {
    token
        .parse()
        .map_err(|_| SkipReason::NotNumeric(token.to_string()))
}
