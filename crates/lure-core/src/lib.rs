//! lure-core: sampling engine for Lustre MDT/OST performance counters.
//!
//! Provides:
//! - `collector`: filesystem seam (`FileSystem`, `RealFs`, `MockFs`)
//! - `counters`: counter vocabularies and the field policy table
//! - `parser`: flat `stats`/`md_stats` and nested `job_stats` parsers
//! - `rates`: per-second rate computation with counter-reset handling
//! - `tables`: rate table types, merge and display ordering helpers
//! - `sampler`: one polling cycle (read, wait, read, parse, compute)
//! - `board`: single-writer publish handle for the latest rate tables
//! - `discovery`: target enumeration under `/proc/fs/lustre`
//! - `fmt` / `render`: human-readable values and fixed-width text tables
//! - `export`: InfluxDB line protocol rendering

pub mod board;
pub mod collector;
pub mod counters;
pub mod discovery;
pub mod export;
pub mod fmt;
pub mod parser;
pub mod rates;
pub mod render;
pub mod sampler;
pub mod tables;

/// Crate version with the git revision it was built from.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_SHA"), ")");

/// Human-readable build provenance: build time, branch and revision.
pub fn build_info() -> String {
    let built_at = env!("BUILD_EPOCH")
        .parse::<i64>()
        .ok()
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!(
        "Built on: {} from branch: {} with sha1: {}",
        built_at,
        env!("GIT_BRANCH"),
        env!("GIT_SHA")
    )
}
