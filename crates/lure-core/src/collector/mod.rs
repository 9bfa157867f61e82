//! Filesystem access for reading Lustre counter files.
//!
//! Every read the engine performs goes through the [`FileSystem`] trait so the
//! sampler can run against the live `/proc/fs/lustre` tree or an in-memory
//! fixture.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Sampler                           │
//! │  ┌────────────────────┐     ┌─────────────────────────┐  │
//! │  │  discovery         │     │  parser::{flat, jobs}   │  │
//! │  │  - mdt/<dev>/      │     │  - md_stats / stats     │  │
//! │  │  - obdfilter/<dev>/│     │  - job_stats            │  │
//! │  └─────────┬──────────┘     └────────────▲────────────┘  │
//! │            └──────────────┬──────────────┘               │
//! │                    ┌──────▼──────┐                       │
//! │                    │  FileSystem │ (trait)               │
//! │                    └──────┬──────┘                       │
//! └───────────────────────────┼──────────────────────────────┘
//!                    ┌────────┴────────┐
//!             ┌──────▼──────┐   ┌──────▼──────┐
//!             │   RealFs    │   │   MockFs    │
//!             │  (Linux)    │   │  (Testing)  │
//!             └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use std::path::Path;
//! use lure_core::collector::{FileSystem, MockFs};
//!
//! let fs = MockFs::lustre_server();
//! let raw = fs
//!     .read(Path::new("/proc/fs/lustre/mdt/lustre-MDT0000/md_stats"))
//!     .unwrap();
//! assert!(!raw.is_empty());
//! ```

pub mod mock;
pub mod traits;

pub use mock::MockFs;
pub use traits::{FileSystem, RealFs};
