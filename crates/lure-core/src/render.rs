//! Fixed-width text tables for the console view and the `/stats` page.
//!
//! Columns follow the counter vocabulary order; a counter missing from a row
//! prints as 0. Byte-volume counters print as sizes.

use std::fmt::Write;

use chrono::{DateTime, TimeZone};

use crate::counters::DeviceClass;
use crate::fmt::format_counter;
use crate::tables::{
    CounterSnapshot, JobRateTable, RateTable, RateTables, sorted_devices, sorted_jobs,
};

/// Width of the row label column.
pub const LABEL_WIDTH: usize = 20;
/// Width of every counter column.
pub const VALUE_WIDTH: usize = 13;

/// One line describing where the numbers come from.
pub fn render_header<Tz>(host: &str, time: &DateTime<Tz>, interval_secs: u64) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Server: {} | Time: {} | Sample Interval: {}s",
        host,
        time.format("%Y-%m-%d %H:%M:%S %:z"),
        interval_secs
    )
}

fn header_row(out: &mut String, label: &str, counters: &[&str]) {
    let _ = write!(out, "{:>w$}", label, w = LABEL_WIDTH);
    for counter in counters {
        let _ = write!(out, "{:>w$}", counter, w = VALUE_WIDTH);
    }
    out.push('\n');
}

fn value_row(out: &mut String, label: &str, counters: &[&str], values: Option<&CounterSnapshot>) {
    let _ = write!(out, "{:>w$}", label, w = LABEL_WIDTH);
    for &counter in counters {
        let cell = match values.and_then(|v| v.get(counter)) {
            Some(&v) => format_counter(counter, v),
            None => "0".to_string(),
        };
        let _ = write!(out, "{:>w$}", cell, w = VALUE_WIDTH);
    }
    out.push('\n');
}

/// One row per device, sorted by device id.
pub fn render_device_table(table: &RateTable, counters: &[&str]) -> String {
    let mut out = String::new();
    header_row(&mut out, "Device", counters);
    for device in sorted_devices(table) {
        value_row(&mut out, device, counters, table.get(device));
    }
    out
}

/// One row per (device, job), labelled `job@<device suffix>`.
pub fn render_job_table(table: &JobRateTable, counters: &[&str]) -> String {
    let mut out = String::new();
    header_row(&mut out, "Job @ Device", counters);
    for key in sorted_jobs(table) {
        let values = table.get(key.device).and_then(|jobs| jobs.get(key.job));
        value_row(&mut out, &key.label(), counters, values);
    }
    out
}

fn device_title(class: DeviceClass) -> &'static str {
    match class {
        DeviceClass::Mdt => "MDT Metadata Stats /s:",
        DeviceClass::Ost => "OST Operation Stats /s:",
    }
}

/// The four report sections, separated by blank lines.
///
/// Titles are returned apart from bodies so callers can style them.
pub fn report_sections(tables: &RateTables) -> Vec<(String, String)> {
    let mut sections = Vec::with_capacity(4);
    for class in DeviceClass::ALL {
        let table = tables.devices(class);
        let body = if table.is_empty() {
            format!("No {} stats available.\n", class.label())
        } else {
            render_device_table(table, class.counters())
        };
        sections.push((device_title(class).to_string(), body));
    }
    for class in DeviceClass::ALL {
        let table = tables.jobs(class);
        let body = if table.is_empty() {
            format!("No {} Jobstats available.\n", class.label())
        } else {
            render_job_table(table, class.job_counters())
        };
        sections.push((format!("{} Jobstats /s:", class.label()), body));
    }
    sections
}

/// Plain-text report of all four sections.
pub fn render_report(tables: &RateTables) -> String {
    report_sections(tables)
        .into_iter()
        .map(|(title, body)| format!("{}\n{}", title, body))
        .collect::<Vec<_>>()
        .join("\n")
}
