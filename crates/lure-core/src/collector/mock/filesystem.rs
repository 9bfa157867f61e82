//! In-memory mock filesystem for testing without a Lustre server.
//!
//! Clones of a `MockFs` share one backing store, so a test can hand one clone
//! to the sampler and rewrite counter files through another between the
//! previous and current reads of a cycle.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tree {
    files: HashMap<PathBuf, Vec<u8>>,
    directories: HashSet<PathBuf>,
}

impl Tree {
    fn add_ancestors(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    tree: Arc<RwLock<Tree>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    fn tree(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn tree_mut(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or replaces a file. Parent directories are created.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree_mut();
        tree.add_ancestors(&path);
        tree.files.insert(path, content.into());
    }

    /// Adds an empty directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree_mut();
        tree.add_ancestors(&path);
        tree.directories.insert(path);
    }

    /// Removes a file, making subsequent reads fail with `NotFound`.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.tree_mut().files.remove(path.as_ref());
    }
}

impl FileSystem for MockFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.tree().files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.tree().directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree();
        if !tree.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let children = tree
            .files
            .keys()
            .chain(tree.directories.iter())
            .filter(|p| p.parent() == Some(path) && p.as_path() != path)
            .cloned()
            .collect::<HashSet<_>>();

        Ok(children.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let fs = MockFs::new();
        fs.add_file("/proc/fs/lustre/mdt/lustre-MDT0000/md_stats", "open 1\n");

        assert!(fs.is_dir(Path::new("/proc/fs/lustre/mdt")));
        let raw = fs
            .read(Path::new("/proc/fs/lustre/mdt/lustre-MDT0000/md_stats"))
            .unwrap();
        assert_eq!(raw, b"open 1\n");
    }

    #[test]
    fn test_mock_fs_clones_share_files() {
        let fs = MockFs::new();
        let view = fs.clone();
        fs.add_file("/a/stats", "1");
        fs.add_file("/a/stats", "2");
        assert_eq!(view.read(Path::new("/a/stats")).unwrap(), b"2");

        fs.remove_file("/a/stats");
        assert_eq!(
            view.read(Path::new("/a/stats")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let fs = MockFs::new();
        fs.add_file("/lustre/obdfilter/lustre-OST0000/stats", "");
        fs.add_file("/lustre/obdfilter/lustre-OST0001/stats", "");
        fs.add_file("/lustre/obdfilter/num_refs", "2\n");

        let entries = fs.read_dir(Path::new("/lustre/obdfilter")).unwrap();
        assert_eq!(entries.len(), 3);
        assert!(fs.read_dir(Path::new("/missing")).is_err());
    }
}
