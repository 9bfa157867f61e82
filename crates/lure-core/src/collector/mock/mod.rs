//! In-memory filesystem and Lustre fixtures for tests.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
pub use scenarios::{MDT_JOB_STATS, MDT_MD_STATS, OST_JOB_STATS, OST_STATS};
