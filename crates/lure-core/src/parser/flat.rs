//! Parser for flat per-device counter files (`md_stats`, `stats`).
//!
//! ```text
//! snapshot_time             1700000000.123456 secs.usecs
//! open                      1200 samples [reqs]
//! read_bytes                520 samples [bytes] 4096 1048576 268435456
//! ```
//!
//! The first line is a header. Operation counters hold their value in field 1;
//! byte counters print `count samples [unit] min max sum` and hold the sum in
//! field 6.

use tracing::trace;

use super::{LineOutcome, ParseReport, SkipReason, Skipped, is_metadata, parse_value};
use crate::counters::{FieldPolicy, PolicyTable};
use crate::tables::CounterSnapshot;

fn field_index(policy: FieldPolicy) -> usize {
    match policy {
        FieldPolicy::Count => 1,
        FieldPolicy::Sum => 6,
    }
}

/// Parses one interior line of a flat counter file.
pub fn parse_flat_line(line: &str, policies: &PolicyTable) -> LineOutcome {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let Some(&name) = fields.first() else {
        return LineOutcome::Skip(SkipReason::Blank);
    };
    if is_metadata(name) {
        return LineOutcome::Skip(SkipReason::Metadata);
    }

    let wanted = field_index(policies.policy(name));
    let Some(token) = fields.get(wanted) else {
        return LineOutcome::Skip(SkipReason::MissingField {
            wanted,
            found: fields.len(),
        });
    };

    match parse_value(token) {
        Ok(value) => LineOutcome::Counter {
            name: name.to_string(),
            value,
        },
        Err(reason) => LineOutcome::Skip(reason),
    }
}

/// Parses a flat counter file, listing the malformed lines it skipped.
pub fn parse_flat_report(raw: &[u8], policies: &PolicyTable) -> ParseReport<CounterSnapshot> {
    let text = String::from_utf8_lossy(raw);
    let mut report = ParseReport::<CounterSnapshot>::default();

    // Line 1 is the header.
    for (idx, line) in text.lines().enumerate().skip(1) {
        match parse_flat_line(line, policies) {
            LineOutcome::Counter { name, value } => {
                report.parsed.insert(name, value);
            }
            LineOutcome::Skip(reason) if reason.is_expected() => {}
            LineOutcome::Skip(reason) => {
                trace!(line = idx + 1, %reason, "skipping counter line");
                report.skipped.push(Skipped {
                    line: idx + 1,
                    reason,
                });
            }
        }
    }

    report
}

/// Parses a flat counter file into `counter name → cumulative value`.
pub fn parse_flat(raw: &[u8], policies: &PolicyTable) -> CounterSnapshot {
    parse_flat_report(raw, policies).parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MDT_MD_STATS, OST_STATS};
    use crate::counters::DeviceClass;

    fn mdt() -> PolicyTable {
        PolicyTable::for_class(DeviceClass::Mdt)
    }

    #[test]
    fn test_parse_flat_synthetic() {
        let raw = b"header v1\nopen 42\nread_bytes 1 2 3 4 5 6000 7\n\n";
        let snapshot = parse_flat(raw, &mdt());

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["open"], 42);
        assert_eq!(snapshot["read_bytes"], 6000);
    }

    #[test]
    fn test_parse_flat_ost_stats() {
        let snapshot = parse_flat(
            OST_STATS.as_bytes(),
            &PolicyTable::for_class(DeviceClass::Ost),
        );

        assert_eq!(snapshot["read_bytes"], 268435456);
        assert_eq!(snapshot["write_bytes"], 536870912);
        assert_eq!(snapshot["punch"], 5);
        assert_eq!(snapshot["set_info"], 2);
        assert!(!snapshot.contains_key("snapshot_time"));
        assert_eq!(snapshot.len(), 9);
    }

    #[test]
    fn test_parse_flat_md_stats() {
        let snapshot = parse_flat(MDT_MD_STATS.as_bytes(), &mdt());
        assert_eq!(snapshot["open"], 1200);
        assert_eq!(snapshot["getattr"], 5000);
        assert!(!snapshot.contains_key("link"));
    }

    #[test]
    fn test_header_line_is_discarded() {
        // Even a well-formed counter on line 1 is treated as the header.
        let snapshot = parse_flat(b"open 1\nclose 2\n", &mdt());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["close"], 2);
    }

    #[test]
    fn test_malformed_lines_do_not_abort() {
        let raw = b"snapshot_time 1.2 secs.usecs\n\
                    open\n\
                    read_bytes 3 samples [bytes] 4096 4096\n\
                    close abc samples [reqs]\n\
                    mkdir 7 samples [reqs]\n";
        let report = parse_flat_report(raw, &mdt());

        assert_eq!(report.parsed.len(), 1);
        assert_eq!(report.parsed["mkdir"], 7);
        assert_eq!(
            report.skipped,
            vec![
                Skipped {
                    line: 2,
                    reason: SkipReason::MissingField {
                        wanted: 1,
                        found: 1
                    }
                },
                Skipped {
                    line: 3,
                    reason: SkipReason::MissingField {
                        wanted: 6,
                        found: 6
                    }
                },
                Skipped {
                    line: 4,
                    reason: SkipReason::NotNumeric("abc".into())
                },
            ]
        );
    }

    #[test]
    fn test_parse_flat_line_outcomes() {
        let table = mdt();
        assert_eq!(
            parse_flat_line("   ", &table),
            LineOutcome::Skip(SkipReason::Blank)
        );
        assert_eq!(
            parse_flat_line("elapsed_time 1234.5 secs.usecs", &table),
            LineOutcome::Skip(SkipReason::Metadata)
        );
        assert_eq!(
            parse_flat_line("statfs -4 samples [reqs]", &table),
            LineOutcome::Skip(SkipReason::NotNumeric("-4".into()))
        );
        assert_eq!(
            parse_flat_line("write_bytes 2 samples [bytes] 10 20 30", &table),
            LineOutcome::Counter {
                name: "write_bytes".into(),
                value: 30
            }
        );
    }

    #[test]
    fn test_parse_flat_empty_and_non_utf8() {
        assert!(parse_flat(b"", &mdt()).is_empty());
        let raw = b"snapshot_time \xff\xfe\nopen 9 samples [reqs]\n";
        assert_eq!(parse_flat(raw, &mdt())["open"], 9);
    }
}
