// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::hash::{compute_file_hash, walk_files};

/// Last seen content hash per source file.
///
/// Used to drop modify events that did not change a file's bytes (editors
/// that rewrite on focus loss, `touch`, formatters that find nothing to do).
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    /// Hash every file beneath `root` so the first real edit is recognised
    /// as a change and the first no-op save is not.
    pub fn prime(&mut self, fs: &dyn FileSystem, root: &Path) -> Result<usize> {
        for path in walk_files(fs, root)? {
            let hash = compute_file_hash(fs, &path)?;
            self.hashes.insert(path, hash);
        }
        debug!(files = self.hashes.len(), "hash cache primed");
        Ok(self.hashes.len())
    }

    /// Re-hash `path` and report whether it differs from the last seen
    /// content. Unknown files count as changed.
    pub fn refresh(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<bool> {
        let hash = compute_file_hash(fs, path)?;
        let changed = self.hashes.get(path) != Some(&hash);
        if changed {
            self.hashes.insert(path.to_path_buf(), hash);
        } else {
            debug!("content unchanged for {:?}", path);
        }
        Ok(changed)
    }

    /// Forget a file (e.g. after removal).
    pub fn invalidate(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!("invalidated cache for {:?}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn refresh_detects_only_real_changes() {
        let fs = MockFileSystem::new();
        fs.add_file("app/sass/main.scss", "a{}");
        let mut cache = FileCache::new();
        assert_eq!(cache.prime(&fs, Path::new("app")).unwrap(), 1);

        let path = Path::new("app/sass/main.scss");
        assert!(!cache.refresh(&fs, path).unwrap());

        fs.add_file("app/sass/main.scss", "a{color:red}");
        assert!(cache.refresh(&fs, path).unwrap());
        assert!(!cache.refresh(&fs, path).unwrap());

        cache.invalidate(path);
        assert!(cache.refresh(&fs, path).unwrap());
    }
}
