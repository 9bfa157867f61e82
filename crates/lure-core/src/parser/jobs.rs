//! Parser for per-job counter files (`job_stats`).
//!
//! ```text
//! job_stats:
//! - job_id:          dd.0
//!   snapshot_time:   1700000000
//!   read_bytes:      { samples: 0, unit: bytes, min: 0, max: 0, sum: 0 }
//!   punch:           { samples: 1, unit:  reqs }
//! ```
//!
//! Each group opens with a line starting with `-` carrying the job id.
//! Counter records come in two shapes:
//!
//! - braced, as the kernel prints them: the policy selects the labelled
//!   `samples` or `sum` field;
//! - positional, `name: v0, v1, v2, ...`: the policy selects `v2` (count) or
//!   `v11` (sum), after trimming the trailing comma.

use tracing::trace;

use super::{LineOutcome, ParseReport, SkipReason, Skipped, is_metadata, parse_value};
use crate::counters::{FieldPolicy, PolicyTable};
use crate::tables::{CounterSnapshot, JobSnapshot, merge_counters};

/// Files of at most this many bytes hold no job groups (`"job_stats:\n"`).
pub const MIN_JOB_STATS_LEN: usize = 11;

fn positional_index(policy: FieldPolicy) -> usize {
    match policy {
        FieldPolicy::Count => 2,
        FieldPolicy::Sum => 11,
    }
}

fn braced_label(policy: FieldPolicy) -> &'static str {
    match policy {
        FieldPolicy::Count => "samples",
        FieldPolicy::Sum => "sum",
    }
}

/// Returns the job id if `line` opens a job group.
///
/// `Some(None)` marks a group header without an id.
fn group_header(line: &str) -> Option<Option<String>> {
    let rest = line.trim_start().strip_prefix('-')?;
    let id = rest
        .split_whitespace()
        .nth(1)
        .map(|id| id.trim_matches('"').to_string())
        .filter(|id| !id.is_empty());
    Some(id)
}

fn braced_value(record: &str, label: &'static str) -> Result<u64, SkipReason> {
    let body = record
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}');
    let value = body
        .split(',')
        .filter_map(|pair| pair.split_once(':'))
        .find(|(key, _)| key.trim() == label)
        .map(|(_, value)| value.trim())
        .ok_or(SkipReason::MissingLabel(label))?;
    parse_value(value)
}

fn positional_value(record: &str, wanted: usize) -> Result<u64, SkipReason> {
    let values: Vec<&str> = record.split_whitespace().collect();
    let token = values.get(wanted).ok_or(SkipReason::MissingField {
        wanted,
        found: values.len(),
    })?;
    parse_value(token.trim_end_matches(','))
}

/// Parses one counter line inside a job group.
pub fn parse_job_line(line: &str, policies: &PolicyTable) -> LineOutcome {
    if line.trim().is_empty() {
        return LineOutcome::Skip(SkipReason::Blank);
    }
    let Some((name, record)) = line.split_once(':') else {
        return LineOutcome::Skip(SkipReason::MissingSeparator);
    };
    let name = name.trim();
    if is_metadata(name) {
        return LineOutcome::Skip(SkipReason::Metadata);
    }

    let policy = policies.policy(name);
    let value = if record.trim_start().starts_with('{') {
        braced_value(record, braced_label(policy))
    } else {
        positional_value(record, positional_index(policy))
    };

    match value {
        Ok(value) => LineOutcome::Counter {
            name: name.to_string(),
            value,
        },
        Err(reason) => LineOutcome::Skip(reason),
    }
}

/// Parses a `job_stats` file, listing the malformed lines it skipped.
pub fn parse_jobs_report(raw: &[u8], policies: &PolicyTable) -> ParseReport<JobSnapshot> {
    let mut report = ParseReport::<JobSnapshot>::default();
    if raw.len() <= MIN_JOB_STATS_LEN {
        return report;
    }

    let text = String::from_utf8_lossy(raw);
    // `None` before the first group and inside groups without an id.
    let mut current: Option<(String, CounterSnapshot)> = None;

    for (idx, line) in text.lines().enumerate() {
        if let Some(header) = group_header(line) {
            if let Some((job, counters)) = current.take() {
                flush_job(&mut report.parsed, job, counters);
            }
            match header {
                Some(job) => current = Some((job, CounterSnapshot::new())),
                None => {
                    trace!(line = idx + 1, "skipping job group without id");
                    report.skipped.push(Skipped {
                        line: idx + 1,
                        reason: SkipReason::MissingJobId,
                    });
                }
            }
            continue;
        }

        let Some((_, counters)) = current.as_mut() else {
            continue;
        };
        match parse_job_line(line, policies) {
            LineOutcome::Counter { name, value } => {
                counters.insert(name, value);
            }
            LineOutcome::Skip(reason) if reason.is_expected() => {}
            LineOutcome::Skip(reason) => {
                trace!(line = idx + 1, %reason, "skipping job counter line");
                report.skipped.push(Skipped {
                    line: idx + 1,
                    reason,
                });
            }
        }
    }

    if let Some((job, counters)) = current {
        flush_job(&mut report.parsed, job, counters);
    }

    report
}

fn flush_job(jobs: &mut JobSnapshot, job: String, counters: CounterSnapshot) {
    if counters.is_empty() {
        return;
    }
    merge_counters(jobs.entry(job).or_default(), counters);
}

/// Parses a `job_stats` file into `job id → counter name → cumulative value`.
pub fn parse_jobs(raw: &[u8], policies: &PolicyTable) -> JobSnapshot {
    parse_jobs_report(raw, policies).parsed
}
