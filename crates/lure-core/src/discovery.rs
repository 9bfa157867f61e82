//! Lustre target discovery.
//!
//! Every directory under `<root>/mdt` is a metadata target and every
//! directory under `<root>/obdfilter` an object storage target. Discovery
//! runs once at startup; the resulting maps are immutable for the run.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::collector::FileSystem;
use crate::counters::{DeviceClass, JOB_STATS_FILE};

/// Default location of the Lustre proc tree.
pub const DEFAULT_LUSTRE_ROOT: &str = "/proc/fs/lustre";

/// Counter files of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSource {
    /// Flat counter file (`md_stats` or `stats`).
    pub stats: PathBuf,
    /// Per-job counter file.
    pub job_stats: PathBuf,
}

impl DeviceSource {
    pub fn in_dir(dir: &Path, class: DeviceClass) -> Self {
        Self {
            stats: dir.join(class.stats_file()),
            job_stats: dir.join(JOB_STATS_FILE),
        }
    }
}

/// Device id → counter files, for one device class.
pub type DeviceMap = BTreeMap<String, DeviceSource>;

/// Lists the targets of `class` under `lustre_root`.
///
/// An unreadable class directory is logged and yields an empty map, which
/// disables that class for the run.
pub fn discover<F: FileSystem>(fs: &F, lustre_root: &Path, class: DeviceClass) -> DeviceMap {
    let class_dir = lustre_root.join(class.dir_name());
    let entries = match fs.read_dir(&class_dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(path = %class_dir.display(), error = %e, "cannot list {} targets", class);
            Vec::new()
        }
    };

    let devices: DeviceMap = entries
        .into_iter()
        .filter(|path| fs.is_dir(path))
        .filter_map(|path| {
            let id = path.file_name()?.to_string_lossy().into_owned();
            Some((id, DeviceSource::in_dir(&path, class)))
        })
        .collect();

    for device in devices.keys() {
        info!(%class, device = %device, "found target");
    }
    if devices.is_empty() {
        info!("No {}s found.", class);
    }

    devices
}
