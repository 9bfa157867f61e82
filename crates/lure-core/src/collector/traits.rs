//! Abstractions for filesystem access to enable testing and mocking.

use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of the filesystem holding Lustre counter files.
///
/// Counter files are returned as raw bytes; decoding is the parsers' job.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Returns `true` if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the direct children of a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("md_stats");
        std::fs::write(&path, "snapshot_time 1.0 secs.usecs\nopen 3 samples [reqs]\n").unwrap();

        let fs = RealFs::new();
        let raw = fs.read(&path).unwrap();
        assert!(raw.starts_with(b"snapshot_time"));
    }

    #[test]
    fn test_real_fs_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        let err = fs.read(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_read_dir_and_is_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("lustre-OST0000")).unwrap();
        std::fs::write(dir.path().join("num_refs"), "1\n").unwrap();

        let fs = RealFs::new();
        let mut entries = fs.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
        assert!(fs.is_dir(&dir.path().join("lustre-OST0000")));
        assert!(!fs.is_dir(&dir.path().join("num_refs")));
    }
}
