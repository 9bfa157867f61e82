//! Per-second rate computation from two cumulative counter snapshots.
//!
//! Only keys present in both snapshots produce a rate, at every level
//! (device, job, counter). A counter that went backwards (reset, remount,
//! wraparound) rates as zero for that interval.

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::time::Duration;

use serde::Serialize;

use crate::tables::{CounterSnapshot, JobRateTable, JobSnapshot, RateTable};

/// Configuration rejected before the first polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The polling interval must be at least one second.
    ZeroInterval,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroInterval => write!(f, "sample interval must be at least 1 second"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Polling interval in whole seconds; never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Interval(NonZeroU64);

impl Interval {
    pub fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        NonZeroU64::new(secs)
            .map(Interval)
            .ok_or(ConfigError::ZeroInterval)
    }

    pub fn as_secs(self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(self) -> Duration {
        Duration::from_secs(self.as_secs())
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.as_secs())
    }
}

/// Compute counter delta, returning `None` on counter regression.
pub fn delta(curr: u64, prev: u64) -> Option<u64> {
    curr.checked_sub(prev)
}

/// Rate of one counter; zero when the counter went backwards.
pub fn counter_rate(prev: u64, curr: u64, interval: Interval) -> u64 {
    delta(curr, prev).map_or(0, |d| d / interval.as_secs())
}

/// Rates for every counter present in both snapshots.
pub fn rate(prev: &CounterSnapshot, curr: &CounterSnapshot, interval: Interval) -> CounterSnapshot {
    curr.iter()
        .filter_map(|(name, &now)| {
            let &before = prev.get(name)?;
            Some((name.clone(), counter_rate(before, now, interval)))
        })
        .collect()
}

/// Rates for every job present in both snapshots.
pub fn job_rate(prev: &JobSnapshot, curr: &JobSnapshot, interval: Interval) -> JobSnapshot {
    intersect(prev, curr, |p, c| rate(p, c, interval))
}

/// Device-level rates; devices missing from either side are dropped.
pub fn device_rates(
    prev: &BTreeMap<String, CounterSnapshot>,
    curr: &BTreeMap<String, CounterSnapshot>,
    interval: Interval,
) -> RateTable {
    intersect(prev, curr, |p, c| rate(p, c, interval))
}

/// Job-level rates for every (device, job) present on both sides.
pub fn device_job_rates(
    prev: &BTreeMap<String, JobSnapshot>,
    curr: &BTreeMap<String, JobSnapshot>,
    interval: Interval,
) -> JobRateTable {
    intersect(prev, curr, |p, c| job_rate(p, c, interval))
}

/// Names of counters present on both sides whose value went backwards.
pub fn regressions<'a>(prev: &CounterSnapshot, curr: &'a CounterSnapshot) -> Vec<&'a str> {
    curr.iter()
        .filter(|(name, now)| prev.get(*name).is_some_and(|before| *now < before))
        .map(|(name, _)| name.as_str())
        .collect()
}

fn intersect<V, R>(
    prev: &BTreeMap<String, V>,
    curr: &BTreeMap<String, V>,
    mut f: impl FnMut(&V, &V) -> R,
) -> BTreeMap<String, R> {
    curr.iter()
        .filter_map(|(key, c)| prev.get(key).map(|p| (key.clone(), f(p, c))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(pairs: &[(&str, u64)]) -> CounterSnapshot {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn secs(n: u64) -> Interval {
        Interval::from_secs(n).unwrap()
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert_eq!(Interval::from_secs(0), Err(ConfigError::ZeroInterval));
        assert_eq!(secs(5).as_duration(), Duration::from_secs(5));
        assert_eq!(secs(5).to_string(), "5s");
    }

    #[test]
    fn test_rate_is_delta_over_interval() {
        let prev = counters(&[("open", 100), ("read_bytes", 1_000)]);
        let curr = counters(&[("open", 130), ("read_bytes", 11_000)]);
        let r = rate(&prev, &curr, secs(5));

        assert_eq!(r["open"], 6);
        assert_eq!(r["read_bytes"], 2_000);
    }

    #[test]
    fn test_rate_truncates() {
        assert_eq!(counter_rate(0, 9, secs(2)), 4);
        assert_eq!(counter_rate(0, 1, secs(3)), 0);
    }

    #[test]
    fn test_counter_reset_rates_zero() {
        let prev = counters(&[("open", 5_000), ("close", 10)]);
        let curr = counters(&[("open", 12), ("close", 40)]);
        let r = rate(&prev, &curr, secs(1));

        assert_eq!(r["open"], 0);
        assert_eq!(r["close"], 30);
        assert_eq!(counter_rate(u64::MAX, 0, secs(1)), 0);
        assert_eq!(regressions(&prev, &curr), ["open"]);
    }

    #[test]
    fn test_same_snapshot_rates_zero() {
        let snap = counters(&[("open", 7), ("write_bytes", 1 << 40), ("sync", 0)]);
        for n in [1, 2, 60] {
            let r = rate(&snap, &snap, secs(n));
            assert_eq!(r.len(), 3);
            assert!(r.values().all(|&v| v == 0));
        }
    }

    #[test]
    fn test_key_set_is_intersection() {
        let prev = counters(&[("open", 1), ("close", 1), ("mkdir", 1)]);
        let curr = counters(&[("close", 2), ("mkdir", 2), ("rmdir", 2)]);
        let r = rate(&prev, &curr, secs(1));

        assert_eq!(r.keys().collect::<Vec<_>>(), ["close", "mkdir"]);
    }

    #[test]
    fn test_device_rates_drop_one_sided_devices() {
        let mut prev = BTreeMap::new();
        prev.insert("mdt0".to_string(), counters(&[("open", 100)]));
        prev.insert("mdt1".to_string(), counters(&[("open", 50)]));
        let mut curr = BTreeMap::new();
        curr.insert("mdt0".to_string(), counters(&[("open", 130)]));
        curr.insert("mdt2".to_string(), counters(&[("open", 1)]));

        let table = device_rates(&prev, &curr, secs(5));
        assert_eq!(table.len(), 1);
        assert_eq!(table["mdt0"]["open"], 6);
    }

    #[test]
    fn test_job_rates_drop_one_sided_jobs() {
        let mut prev_jobs = JobSnapshot::new();
        prev_jobs.insert("dd.0".into(), counters(&[("write_bytes", 0)]));
        prev_jobs.insert("gone.1".into(), counters(&[("punch", 3)]));
        let mut curr_jobs = JobSnapshot::new();
        curr_jobs.insert("dd.0".into(), counters(&[("write_bytes", 4_194_304)]));
        curr_jobs.insert("new.2".into(), counters(&[("punch", 1)]));

        let mut prev = BTreeMap::new();
        prev.insert("ost0".to_string(), prev_jobs);
        let mut curr = BTreeMap::new();
        curr.insert("ost0".to_string(), curr_jobs);

        let table = device_job_rates(&prev, &curr, secs(2));
        assert_eq!(table["ost0"].len(), 1);
        assert_eq!(table["ost0"]["dd.0"]["write_bytes"], 2_097_152);
    }
}
