//! One polling cycle: read every counter file, wait one interval, read them
//! again, parse both reads and turn them into per-second rates.
//!
//! ```text
//!   read previous ──► Armed ──wait(interval)──► read current ──► Sampled
//!                                                                  │
//!                      RateTables ◄── parse + rate ◄───────────────┘
//! ```
//!
//! Every cycle takes a fresh previous read; nothing is carried over from the
//! cycle before. A device whose file cannot be read in either read is left out
//! of that cycle's tables and is tried again next cycle.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::collector::FileSystem;
use crate::counters::{DeviceClass, PolicyTable};
use crate::discovery::DeviceMap;
use crate::parser::{parse_flat_report, parse_jobs_report};
use crate::rates::{Interval, device_job_rates, device_rates, regressions};
use crate::tables::{CounterSnapshot, JobSnapshot, RateTables};

/// What to sample and how often.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub interval: Interval,
    /// Metadata targets; empty disables MDT sampling.
    pub mdt: DeviceMap,
    /// Object storage targets; empty disables OST sampling.
    pub ost: DeviceMap,
    /// Also sample `job_stats` of every target.
    pub job_stats: bool,
}

impl SamplerConfig {
    pub fn new(interval: Interval) -> Self {
        Self {
            interval,
            mdt: DeviceMap::new(),
            ost: DeviceMap::new(),
            job_stats: false,
        }
    }

    pub fn devices(&self, class: DeviceClass) -> &DeviceMap {
        match class {
            DeviceClass::Mdt => &self.mdt,
            DeviceClass::Ost => &self.ost,
        }
    }
}

/// Diagnostics for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Counter files read successfully, over both reads.
    pub files_read: usize,
    /// Counter files that could not be read, over both reads.
    pub read_failures: usize,
    /// Malformed lines skipped while parsing.
    pub skipped_lines: usize,
    /// Counters that went backwards and were rated as zero.
    pub regressions: usize,
}

/// Output of one polling cycle.
#[derive(Debug, Clone)]
pub struct Cycle {
    pub tables: RateTables,
    pub stats: CycleStats,
}

/// Raw file contents of one class from one read.
#[derive(Debug, Default)]
struct ClassRead {
    flat: BTreeMap<String, Vec<u8>>,
    jobs: BTreeMap<String, Vec<u8>>,
}

/// Raw file contents of all classes from one read.
#[derive(Debug, Default)]
struct RawRead {
    mdt: ClassRead,
    ost: ClassRead,
}

impl RawRead {
    fn class(&self, class: DeviceClass) -> &ClassRead {
        match class {
            DeviceClass::Mdt => &self.mdt,
            DeviceClass::Ost => &self.ost,
        }
    }

    fn class_mut(&mut self, class: DeviceClass) -> &mut ClassRead {
        match class {
            DeviceClass::Mdt => &mut self.mdt,
            DeviceClass::Ost => &mut self.ost,
        }
    }
}

/// Previous read taken; waiting for the interval to pass.
struct Armed {
    previous: RawRead,
}

/// Both reads taken.
struct Sampled {
    previous: RawRead,
    current: RawRead,
    sampled_at: DateTime<Utc>,
}

/// Drives polling cycles over a fixed set of targets.
pub struct Sampler<F: FileSystem> {
    fs: F,
    config: SamplerConfig,
    mdt_policies: PolicyTable,
    ost_policies: PolicyTable,
}

impl<F: FileSystem> Sampler<F> {
    pub fn new(fs: F, config: SamplerConfig) -> Self {
        Self {
            fs,
            config,
            mdt_policies: PolicyTable::for_class(DeviceClass::Mdt),
            ost_policies: PolicyTable::for_class(DeviceClass::Ost),
        }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// False when discovery found nothing to sample in any class.
    pub fn has_devices(&self) -> bool {
        DeviceClass::ALL
            .iter()
            .any(|&class| !self.config.devices(class).is_empty())
    }

    fn policies(&self, class: DeviceClass) -> &PolicyTable {
        match class {
            DeviceClass::Mdt => &self.mdt_policies,
            DeviceClass::Ost => &self.ost_policies,
        }
    }

    /// Runs one cycle, sleeping the configured interval between reads.
    pub fn cycle(&self) -> Cycle {
        self.cycle_with(std::thread::sleep)
    }

    /// Runs one cycle; `wait` is called once with the interval between the
    /// previous and the current read.
    pub fn cycle_with(&self, wait: impl FnOnce(Duration)) -> Cycle {
        let mut stats = CycleStats::default();

        let armed = self.arm(&mut stats);
        wait(self.config.interval.as_duration());
        let sampled = self.sample(armed, &mut stats);

        let cycle = self.compute(sampled, stats);
        debug!(
            mdt = cycle.tables.mdt.len(),
            ost = cycle.tables.ost.len(),
            mdt_jobs = cycle.tables.mdt_jobs.values().map(|j| j.len()).sum::<usize>(),
            ost_jobs = cycle.tables.ost_jobs.values().map(|j| j.len()).sum::<usize>(),
            files_read = cycle.stats.files_read,
            read_failures = cycle.stats.read_failures,
            skipped_lines = cycle.stats.skipped_lines,
            regressions = cycle.stats.regressions,
            "cycle complete"
        );
        cycle
    }

    fn arm(&self, stats: &mut CycleStats) -> Armed {
        Armed {
            previous: self.read_all(stats),
        }
    }

    fn sample(&self, armed: Armed, stats: &mut CycleStats) -> Sampled {
        let current = self.read_all(stats);
        Sampled {
            previous: armed.previous,
            current,
            sampled_at: Utc::now(),
        }
    }

    fn read_all(&self, stats: &mut CycleStats) -> RawRead {
        let mut read = RawRead::default();
        for class in DeviceClass::ALL {
            let out = read.class_mut(class);
            for (device, source) in self.config.devices(class) {
                if let Some(raw) = self.read_file(device, &source.stats, stats) {
                    out.flat.insert(device.clone(), raw);
                }
                if self.config.job_stats
                    && let Some(raw) = self.read_file(device, &source.job_stats, stats)
                {
                    out.jobs.insert(device.clone(), raw);
                }
            }
        }
        read
    }

    fn read_file(&self, device: &str, path: &Path, stats: &mut CycleStats) -> Option<Vec<u8>> {
        match self.fs.read(path) {
            Ok(raw) => {
                stats.files_read += 1;
                Some(raw)
            }
            Err(e) => {
                stats.read_failures += 1;
                warn!(device, path = %path.display(), error = %e, "cannot read counters, skipping device this cycle");
                None
            }
        }
    }

    fn compute(&self, sampled: Sampled, mut stats: CycleStats) -> Cycle {
        let interval = self.config.interval;
        let mut tables = RateTables {
            interval_secs: interval.as_secs(),
            sampled_at: Some(sampled.sampled_at),
            ..Default::default()
        };

        for class in DeviceClass::ALL {
            let prev = sampled.previous.class(class);
            let curr = sampled.current.class(class);

            let prev_flat = self.parse_flat_all(class, &prev.flat, &mut stats);
            let curr_flat = self.parse_flat_all(class, &curr.flat, &mut stats);
            stats.regressions += count_regressions(class, &prev_flat, &curr_flat);
            *tables.devices_mut(class) = device_rates(&prev_flat, &curr_flat, interval);

            if self.config.job_stats {
                let prev_jobs = self.parse_jobs_all(class, &prev.jobs, &mut stats);
                let curr_jobs = self.parse_jobs_all(class, &curr.jobs, &mut stats);
                for (device, jobs) in &curr_jobs {
                    let Some(before) = prev_jobs.get(device) else {
                        continue;
                    };
                    for (job, counters) in jobs {
                        if let Some(job_before) = before.get(job) {
                            stats.regressions += regressions(job_before, counters).len();
                        }
                    }
                }
                *tables.jobs_mut(class) = device_job_rates(&prev_jobs, &curr_jobs, interval);
            }
        }

        Cycle { tables, stats }
    }

    fn parse_flat_all(
        &self,
        class: DeviceClass,
        raw: &BTreeMap<String, Vec<u8>>,
        stats: &mut CycleStats,
    ) -> BTreeMap<String, CounterSnapshot> {
        let policies = self.policies(class);
        let mut parsed = BTreeMap::new();
        for (device, bytes) in raw {
            let report = parse_flat_report(bytes, policies);
            stats.skipped_lines += report.skipped.len();
            if report.parsed.is_empty() {
                debug!(%class, device = %device, "no counters in stats file");
                continue;
            }
            parsed.insert(device.clone(), report.parsed);
        }
        parsed
    }

    fn parse_jobs_all(
        &self,
        class: DeviceClass,
        raw: &BTreeMap<String, Vec<u8>>,
        stats: &mut CycleStats,
    ) -> BTreeMap<String, JobSnapshot> {
        let policies = self.policies(class);
        let mut parsed = BTreeMap::new();
        for (device, bytes) in raw {
            let report = parse_jobs_report(bytes, policies);
            stats.skipped_lines += report.skipped.len();
            if report.parsed.is_empty() {
                continue;
            }
            parsed.insert(device.clone(), report.parsed);
        }
        parsed
    }
}

fn count_regressions(
    class: DeviceClass,
    prev: &BTreeMap<String, CounterSnapshot>,
    curr: &BTreeMap<String, CounterSnapshot>,
) -> usize {
    let mut total = 0;
    for (device, counters) in curr {
        let Some(before) = prev.get(device) else {
            continue;
        };
        let reset = regressions(before, counters);
        if !reset.is_empty() {
            debug!(%class, device = %device, counters = ?reset, "counter reset, rating as zero");
            total += reset.len();
        }
    }
    total
}
