//! InfluxDB line protocol rendering of published rate tables.
//!
//! ```text
//! lure,server=oss01,device=lustre-OST0000,type=stats write_bytes=4096i,punch=2i 1700000000
//! lure,server=oss01,device=lustre-OST0000,type=job_stats,job=dd.0 write_bytes=4096i 1700000000
//! ```
//!
//! Fields are emitted in vocabulary order and only for counters present in
//! the table; a row without any present counter produces no line.

use std::fmt::Write;

use crate::counters::DeviceClass;
use crate::tables::{CounterSnapshot, RateTables, sorted_devices, sorted_jobs};

/// Measurement name of every line.
pub const MEASUREMENT: &str = "lure";

/// Escapes a tag value: `,`, `=` and space are backslash-escaped.
pub fn escape_tag(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, ',' | '=' | ' ') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn field_set(values: &CounterSnapshot, counters: &[&str]) -> Option<String> {
    let fields: Vec<String> = counters
        .iter()
        .filter_map(|&name| values.get(name).map(|v| format!("{}={}i", name, v)))
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields.join(","))
    }
}

fn finish_line(mut line: String, fields: &str, timestamp: Option<i64>) -> String {
    line.push(' ');
    line.push_str(fields);
    if let Some(ts) = timestamp {
        let _ = write!(line, " {}", ts);
    }
    line
}

/// Renders every device and job row of `tables` as line protocol.
///
/// The timestamp is the sample time in whole seconds, when known.
pub fn to_line_protocol(tables: &RateTables, server: &str) -> Vec<String> {
    let timestamp = tables.sampled_at.map(|t| t.timestamp());
    let server = escape_tag(server);
    let mut lines = Vec::new();

    for class in DeviceClass::ALL {
        let table = tables.devices(class);
        for device in sorted_devices(table) {
            let Some(fields) = table.get(device).and_then(|v| field_set(v, class.counters()))
            else {
                continue;
            };
            let tags = format!(
                "{},server={},device={},type=stats",
                MEASUREMENT,
                server,
                escape_tag(device)
            );
            lines.push(finish_line(tags, &fields, timestamp));
        }
    }

    for class in DeviceClass::ALL {
        let table = tables.jobs(class);
        for key in sorted_jobs(table) {
            let Some(fields) = table
                .get(key.device)
                .and_then(|jobs| jobs.get(key.job))
                .and_then(|v| field_set(v, class.job_counters()))
            else {
                continue;
            };
            let tags = format!(
                "{},server={},device={},type=job_stats,job={}",
                MEASUREMENT,
                server,
                escape_tag(key.device),
                escape_tag(key.job)
            );
            lines.push(finish_line(tags, &fields, timestamp));
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::JobSnapshot;
    use chrono::{TimeZone, Utc};

    fn counters(pairs: &[(&str, u64)]) -> CounterSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_device_lines_in_vocabulary_order() {
        let mut tables = RateTables::default();
        tables.ost.insert(
            "lustre-OST0000".into(),
            counters(&[("punch", 2), ("write_bytes", 4096), ("unknown", 9)]),
        );
        tables.sampled_at = Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap());

        let lines = to_line_protocol(&tables, "oss01");
        assert_eq!(
            lines,
            ["lure,server=oss01,device=lustre-OST0000,type=stats write_bytes=4096i,punch=2i 1700000000"]
        );
    }

    #[test]
    fn test_job_lines_and_escaping() {
        let mut jobs = JobSnapshot::new();
        jobs.insert("my job,1".into(), counters(&[("open", 3)]));
        jobs.insert("idle".into(), counters(&[("not_a_counter", 1)]));
        let mut tables = RateTables::default();
        tables.mdt_jobs.insert("lustre-MDT0000".into(), jobs);

        let lines = to_line_protocol(&tables, "mds 01");
        assert_eq!(
            lines,
            ["lure,server=mds\\ 01,device=lustre-MDT0000,type=job_stats,job=my\\ job\\,1 open=3i"]
        );
    }

    #[test]
    fn test_empty_rows_produce_no_lines() {
        let mut tables = RateTables::default();
        tables.mdt.insert("lustre-MDT0000".into(), CounterSnapshot::new());
        assert!(to_line_protocol(&tables, "mds01").is_empty());
        assert_eq!(escape_tag("a=b"), "a\\=b");
    }
}
