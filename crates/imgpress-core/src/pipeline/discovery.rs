//! File discovery for building the work list from path arguments.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::validate::supported_extension;
use crate::types::WorkItem;

/// Expands paths into work items over the supported extensions.
pub struct FileDiscovery;

impl FileDiscovery {
    /// Discover all supported image files at a path.
    ///
    /// If path is a file, returns it if supported.
    /// If path is a directory, recursively finds all supported files,
    /// sorted by path for deterministic work-list order.
    pub fn discover(path: &Path) -> Vec<PathBuf> {
        if path.is_file() {
            if supported_extension(path).is_some() {
                return vec![path.to_path_buf()];
            }
            return vec![];
        }

        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file() && supported_extension(e.path()).is_some())
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// Build work items (no overrides) from a set of path arguments,
    /// expanding directories and deduplicating.
    pub fn work_items(paths: &[PathBuf]) -> Vec<WorkItem> {
        let mut seen = std::collections::HashSet::new();
        let mut items = Vec::new();
        for path in paths {
            for file in Self::discover(path) {
                if seen.insert(file.clone()) {
                    items.push(WorkItem::new(file));
                }
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(FileDiscovery::discover(&file), vec![file]);
    }

    #[test]
    fn test_discover_skips_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(FileDiscovery::discover(&file).is_empty());
    }

    #[test]
    fn test_discover_directory_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("b.png"), b"x").unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(sub.join("c.webp"), b"x").unwrap();
        std::fs::write(dir.path().join("skip.pdf"), b"x").unwrap();

        let found = FileDiscovery::discover(dir.path());
        assert_eq!(found.len(), 3);
        // Sorted order
        assert!(found[0].ends_with("a.jpg"));
        assert!(found[1].ends_with("b.png"));
        assert!(found[2].ends_with("sub/c.webp"));
    }

    #[test]
    fn test_work_items_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.jpg");
        std::fs::write(&file, b"x").unwrap();

        let items =
            FileDiscovery::work_items(&[file.clone(), file.clone(), dir.path().to_path_buf()]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source, file);
    }
}
