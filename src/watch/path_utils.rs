// src/watch/path_utils.rs

use std::path::Path;

/// Convert an event path into a string relative to the source root, with
/// forward slashes, suitable for matching watch rules.
///
/// Tries a direct `strip_prefix` first; if that fails (symlinked temp dirs,
/// `/private/var` on macOS) both sides are canonicalized and compared again.
/// Returns `None` for paths outside the root and for the root itself.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = match path.strip_prefix(root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => {
            let root = root.canonicalize().ok()?;
            let path = path.canonicalize().ok()?;
            path.strip_prefix(&root).ok()?.to_path_buf()
        }
    };

    let s = rel.to_string_lossy().replace('\\', "/");
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_and_normalizes() {
        let root = Path::new("/site/app");
        assert_eq!(
            relative_str(root, Path::new("/site/app/sass/main.scss")).as_deref(),
            Some("sass/main.scss")
        );
        assert_eq!(relative_str(root, Path::new("/site/app")), None);
        assert_eq!(relative_str(root, Path::new("/elsewhere/x.js")), None);
    }
}
