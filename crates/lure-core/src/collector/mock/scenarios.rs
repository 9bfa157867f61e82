//! Pre-built Lustre server layouts for tests.
//!
//! Counter text follows what `lctl get_param` prints for the same files.

use std::path::Path;

use super::filesystem::MockFs;
use crate::counters::{DeviceClass, JOB_STATS_FILE};
use crate::discovery::DEFAULT_LUSTRE_ROOT;

/// `mdt/<dev>/md_stats` from a lightly loaded metadata target.
pub const MDT_MD_STATS: &str = "\
snapshot_time             1700000000.123456 secs.usecs
open                      1200 samples [reqs]
close                     1100 samples [reqs]
mknod                     3 samples [reqs]
unlink                    40 samples [reqs]
mkdir                     12 samples [reqs]
rmdir                     2 samples [reqs]
rename                    7 samples [reqs]
getattr                   5000 samples [reqs]
setattr                   80 samples [reqs]
getxattr                  25 samples [reqs]
statfs                    300 samples [reqs]
";

/// `obdfilter/<dev>/stats` from an object storage target.
pub const OST_STATS: &str = "\
snapshot_time             1700000000.123456 secs.usecs
read_bytes                520 samples [bytes] 4096 1048576 268435456
write_bytes               800 samples [bytes] 4096 1048576 536870912
setattr                   2 samples [reqs]
punch                     5 samples [reqs]
create                    10 samples [reqs]
destroy                   4 samples [reqs]
statfs                    600 samples [reqs]
get_info                  1 samples [reqs]
set_info                  2 samples [reqs]
";

/// `mdt/<dev>/job_stats` with two jobs.
pub const MDT_JOB_STATS: &str = "\
job_stats:
- job_id:          ls.0
  snapshot_time:   1700000000
  open:            { samples:          12, unit:  reqs }
  close:           { samples:          12, unit:  reqs }
  getattr:         { samples:          40, unit:  reqs }
- job_id:          cp.1000
  snapshot_time:   1700000000
  open:            { samples:           3, unit:  reqs }
  mkdir:           { samples:           1, unit:  reqs }
";

/// `obdfilter/<dev>/job_stats` with one job.
pub const OST_JOB_STATS: &str = "\
job_stats:
- job_id:          dd.0
  snapshot_time:   1700000000
  read_bytes:      { samples:           0, unit: bytes, min:       0, max:       0, sum:               0 }
  write_bytes:     { samples:           4, unit: bytes, min: 4194304, max: 4194304, sum:        16777216 }
  getattr:         { samples:           0, unit:  reqs }
  punch:           { samples:           1, unit:  reqs }
";

impl MockFs {
    /// Adds one target directory with its flat counter file and job stats.
    pub fn add_target(
        &self,
        lustre_root: impl AsRef<Path>,
        class: DeviceClass,
        device: &str,
        stats: &str,
        job_stats: &str,
    ) {
        let dir = lustre_root.as_ref().join(class.dir_name()).join(device);
        self.add_dir(&dir);
        self.add_file(dir.join(class.stats_file()), stats);
        self.add_file(dir.join(JOB_STATS_FILE), job_stats);
    }

    /// A combined MDS/OSS with one MDT and two OSTs under `/proc/fs/lustre`.
    pub fn lustre_server() -> Self {
        let fs = Self::new();
        fs.add_target(
            DEFAULT_LUSTRE_ROOT,
            DeviceClass::Mdt,
            "lustre-MDT0000",
            MDT_MD_STATS,
            MDT_JOB_STATS,
        );
        for ost in ["lustre-OST0000", "lustre-OST0001"] {
            fs.add_target(
                DEFAULT_LUSTRE_ROOT,
                DeviceClass::Ost,
                ost,
                OST_STATS,
                OST_JOB_STATS,
            );
        }
        // Non-directory entries live next to the targets in the real tree.
        fs.add_file(Path::new(DEFAULT_LUSTRE_ROOT).join("mdt/num_refs"), "1\n");
        fs
    }

    /// An OSS-only host: no `mdt` directory at all.
    pub fn oss_only() -> Self {
        let fs = Self::new();
        fs.add_target(
            DEFAULT_LUSTRE_ROOT,
            DeviceClass::Ost,
            "scratch-OST0004",
            OST_STATS,
            "job_stats:\n",
        );
        fs
    }
}
