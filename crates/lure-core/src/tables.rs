//! Counter and rate table types shared by the parsers, the rate calculator
//! and every consumer of published rates.
//!
//! All maps are `BTreeMap`s: display and export iterate devices, jobs and
//! counters in sorted order without a separate sort step.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::counters::DeviceClass;

/// Counter name → cumulative value, from one read of one file.
pub type CounterSnapshot = BTreeMap<String, u64>;

/// Job id → counters, from one read of one `job_stats` file.
pub type JobSnapshot = BTreeMap<String, CounterSnapshot>;

/// Device id → counter name → per-second rate.
pub type RateTable = BTreeMap<String, CounterSnapshot>;

/// Device id → job id → counter name → per-second rate.
pub type JobRateTable = BTreeMap<String, JobSnapshot>;

/// Everything one polling cycle publishes.
///
/// Replaced as a whole each cycle; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateTables {
    pub mdt: RateTable,
    pub ost: RateTable,
    pub mdt_jobs: JobRateTable,
    pub ost_jobs: JobRateTable,
    /// Seconds between the two reads the rates were computed from.
    pub interval_secs: u64,
    /// When the current (second) read of the cycle happened.
    pub sampled_at: Option<DateTime<Utc>>,
}

impl RateTables {
    pub fn devices(&self, class: DeviceClass) -> &RateTable {
        match class {
            DeviceClass::Mdt => &self.mdt,
            DeviceClass::Ost => &self.ost,
        }
    }

    pub fn jobs(&self, class: DeviceClass) -> &JobRateTable {
        match class {
            DeviceClass::Mdt => &self.mdt_jobs,
            DeviceClass::Ost => &self.ost_jobs,
        }
    }

    pub fn devices_mut(&mut self, class: DeviceClass) -> &mut RateTable {
        match class {
            DeviceClass::Mdt => &mut self.mdt,
            DeviceClass::Ost => &mut self.ost,
        }
    }

    pub fn jobs_mut(&mut self, class: DeviceClass) -> &mut JobRateTable {
        match class {
            DeviceClass::Mdt => &mut self.mdt_jobs,
            DeviceClass::Ost => &mut self.ost_jobs,
        }
    }

    /// True when no class produced any device or job rates.
    pub fn is_empty(&self) -> bool {
        self.mdt.is_empty()
            && self.ost.is_empty()
            && self.mdt_jobs.is_empty()
            && self.ost_jobs.is_empty()
    }
}

/// Merges `from` into `into`; values from `from` win on conflicts.
pub fn merge_counters(into: &mut CounterSnapshot, from: CounterSnapshot) {
    into.extend(from);
}

/// Merges job counters, combining the counters of jobs present in both.
pub fn merge_jobs(into: &mut JobSnapshot, from: JobSnapshot) {
    for (job, counters) in from {
        merge_counters(into.entry(job).or_default(), counters);
    }
}

/// Device ids in display order.
pub fn sorted_devices<V>(table: &BTreeMap<String, V>) -> Vec<&str> {
    table.keys().map(String::as_str).collect()
}

/// A (device, job) row of a job rate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct JobKey<'a> {
    pub device: &'a str,
    pub job: &'a str,
}

impl JobKey<'_> {
    /// Row label `job@<device suffix>`, e.g. `dd.0@OST0001`.
    pub fn label(&self) -> String {
        format!("{}@{}", self.job, device_suffix(self.device))
    }
}

/// (device, job) pairs ordered by device, then job.
pub fn sorted_jobs(table: &JobRateTable) -> Vec<JobKey<'_>> {
    table
        .iter()
        .flat_map(|(device, jobs)| {
            jobs.keys().map(move |job| JobKey {
                device: device.as_str(),
                job: job.as_str(),
            })
        })
        .collect()
}

/// Target part of a device id: `lustre-OST0001` → `OST0001`.
pub fn device_suffix(device: &str) -> &str {
    device
        .rsplit_once('-')
        .map(|(_, suffix)| suffix)
        .filter(|suffix| !suffix.is_empty())
        .unwrap_or(device)
}
