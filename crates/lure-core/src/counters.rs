//! Counter vocabularies per device class and the field policy table.
//!
//! Lustre prints two kinds of counter records. Operation counters carry a
//! sample count; byte-volume counters (`read_bytes`, `write_bytes`) carry a
//! richer `count min max sum` record whose cumulative `sum` is the value we
//! want. [`PolicyTable`] maps each known counter name to the field it reads,
//! and parsers consult it instead of inspecting the name on every line.

use std::collections::HashMap;

use serde::Serialize;

/// Name of the per-job counter file inside every target directory.
pub const JOB_STATS_FILE: &str = "job_stats";

const MDT_COUNTERS: &[&str] = &[
    "open",
    "close",
    "mknod",
    "link",
    "unlink",
    "mkdir",
    "rmdir",
    "rename",
    "getattr",
    "setattr",
    "getxattr",
    "setxattr",
    "statfs",
    "sync",
    "read_bytes",
    "write_bytes",
];

const OST_COUNTERS: &[&str] = &[
    "write_bytes",
    "read_bytes",
    "setattr",
    "statfs",
    "create",
    "destroy",
    "punch",
    "sync",
    "get_info",
    "set_info",
];

const OST_JOB_COUNTERS: &[&str] = &[
    "read_bytes",
    "write_bytes",
    "getattr",
    "setattr",
    "punch",
    "sync",
    "destroy",
    "create",
    "statfs",
    "get_info",
    "set_info",
    "quotactl",
];

/// Kind of Lustre target a counter file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Metadata target.
    Mdt,
    /// Object storage target.
    Ost,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 2] = [DeviceClass::Mdt, DeviceClass::Ost];

    /// Directory under the Lustre proc root holding one entry per target.
    pub fn dir_name(self) -> &'static str {
        match self {
            DeviceClass::Mdt => "mdt",
            DeviceClass::Ost => "obdfilter",
        }
    }

    /// Flat counter file inside a target directory.
    pub fn stats_file(self) -> &'static str {
        match self {
            DeviceClass::Mdt => "md_stats",
            DeviceClass::Ost => "stats",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DeviceClass::Mdt => "MDT",
            DeviceClass::Ost => "OST",
        }
    }

    /// Display-ordered counters of the flat per-device file.
    pub fn counters(self) -> &'static [&'static str] {
        match self {
            DeviceClass::Mdt => MDT_COUNTERS,
            DeviceClass::Ost => OST_COUNTERS,
        }
    }

    /// Display-ordered counters of the per-job file.
    pub fn job_counters(self) -> &'static [&'static str] {
        match self {
            DeviceClass::Mdt => MDT_COUNTERS,
            DeviceClass::Ost => OST_JOB_COUNTERS,
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// True for counters measuring data volume in bytes.
///
/// Parsing (which field holds the value) and presentation (human-readable
/// sizes) both key off this predicate.
pub fn is_byte_volume(name: &str) -> bool {
    name.contains("bytes")
}

/// Which field of a counter record holds the cumulative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Number of samples (operation counters).
    Count,
    /// Cumulative sum of sample sizes (byte-volume counters).
    Sum,
}

impl FieldPolicy {
    /// Policy derived from the counter name alone.
    pub fn for_name(name: &str) -> Self {
        if is_byte_volume(name) {
            FieldPolicy::Sum
        } else {
            FieldPolicy::Count
        }
    }
}

/// Lookup table `counter name → FieldPolicy`, built once per device class.
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    policies: HashMap<&'static str, FieldPolicy>,
}

impl PolicyTable {
    pub fn from_names(names: impl IntoIterator<Item = &'static str>) -> Self {
        let policies = names
            .into_iter()
            .map(|name| (name, FieldPolicy::for_name(name)))
            .collect();
        Self { policies }
    }

    /// Covers both the flat and the per-job vocabulary of `class`.
    pub fn for_class(class: DeviceClass) -> Self {
        Self::from_names(
            class
                .counters()
                .iter()
                .chain(class.job_counters())
                .copied(),
        )
    }

    /// Policy for `name`; counters outside the vocabulary fall back to the
    /// name rule so newer kernels' extra counters still parse.
    pub fn policy(&self, name: &str) -> FieldPolicy {
        self.policies
            .get(name)
            .copied()
            .unwrap_or_else(|| FieldPolicy::for_name(name))
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.policies.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}
